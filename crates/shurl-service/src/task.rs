use crate::Result;
use shurl_core::{LinkFilter, LinkStats, NewShortLink, ShortLink, Token, UserId};
use tokio::sync::oneshot;

/// Slot the worker answers a task through. A oneshot send never waits, so
/// the worker is never held up by a caller that stopped listening.
pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// A unit of work for the worker, paired with the slot for its result.
pub(crate) enum Task {
    Create {
        link: NewShortLink,
        reply: Reply<ShortLink>,
    },
    Get {
        token: Token,
        reply: Reply<ShortLink>,
    },
    Query {
        filter: LinkFilter,
        reply: Reply<Vec<ShortLink>>,
    },
    GetAll {
        reply: Reply<Vec<ShortLink>>,
    },
    Delete {
        tokens: Vec<Token>,
        caller: UserId,
        reply: Reply<()>,
    },
    Stats {
        reply: Reply<LinkStats>,
    },
    Ping {
        reply: Reply<bool>,
    },
}

impl Task {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Task::Create { .. } => "create",
            Task::Get { .. } => "get",
            Task::Query { .. } => "query",
            Task::GetAll { .. } => "get_all",
            Task::Delete { .. } => "delete",
            Task::Stats { .. } => "stats",
            Task::Ping { .. } => "ping",
        }
    }
}
