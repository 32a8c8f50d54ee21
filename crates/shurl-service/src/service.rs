use crate::config::ServiceConfig;
use crate::processor::TaskProcessor;
use crate::task::{Reply, Task};
use crate::Result;
use shurl_core::{LinkError, LinkFilter, LinkStats, NewShortLink, Repository, ShortLink, Token, UserId};
use shurl_generator::Generator;
use std::fmt::{Debug, Formatter};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle to the link lifecycle worker.
///
/// Cloning is cheap; every clone submits to the same queue. The worker
/// stops, and closes its repository, once the last handle is dropped and
/// the queue has drained.
///
/// Every operation takes a [`CancellationToken`] that only bounds how long
/// the caller waits. A task that already made it into the queue runs to
/// completion even if its caller gives up, so the side effects of a
/// cancelled `create` or `delete` may still land.
#[derive(Clone)]
pub struct LinkService {
    tasks: mpsc::Sender<Task>,
}

impl Debug for LinkService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkService")
            .field("queue_capacity", &self.tasks.max_capacity())
            .finish_non_exhaustive()
    }
}

impl LinkService {
    /// Starts the worker on the current tokio runtime.
    ///
    /// Returns the handle used to submit work and the worker's join handle,
    /// which completes after the repository has been closed.
    pub fn spawn<R, G>(repository: R, generator: G, config: ServiceConfig) -> (Self, JoinHandle<()>)
    where
        R: Repository,
        G: Generator,
    {
        let (tasks, queue) = mpsc::channel(config.queue_capacity.max(1));
        info!(queue_capacity = config.queue_capacity, "spawning link service worker");

        let worker = tokio::spawn(TaskProcessor::new(repository, generator).run(queue));
        (Self { tasks }, worker)
    }

    /// Shortens `link.long_url` for `link.created_by`.
    ///
    /// If an active link already points at the same URL, nothing is created
    /// and the error is [`LinkError::AlreadyExists`] carrying that link.
    pub async fn create(&self, link: NewShortLink, cancel: &CancellationToken) -> Result<ShortLink> {
        self.submit(cancel, |reply| Task::Create { link, reply }).await
    }

    /// Resolves an active token. Fails with `Gone` for a deleted token and
    /// `NotFound` for one that was never issued.
    pub async fn get(&self, token: Token, cancel: &CancellationToken) -> Result<ShortLink> {
        self.submit(cancel, |reply| Task::Get { token, reply }).await
    }

    /// Returns every active link matching `filter`, possibly none.
    pub async fn query(&self, filter: LinkFilter, cancel: &CancellationToken) -> Result<Vec<ShortLink>> {
        self.submit(cancel, |reply| Task::Query { filter, reply }).await
    }

    /// Like [`LinkService::query`], with the field given by name.
    /// An unrecognised field name matches nothing.
    pub async fn query_field(
        &self,
        field: &str,
        value: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ShortLink>> {
        match LinkFilter::from_field(field, value) {
            Some(filter) => self.query(filter, cancel).await,
            None => Ok(Vec::new()),
        }
    }

    /// Returns every active link.
    pub async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<ShortLink>> {
        self.submit(cancel, |reply| Task::GetAll { reply }).await
    }

    /// Soft-deletes the tokens among `tokens` that are active and owned by
    /// `caller`. Every other token is skipped, so success says nothing about
    /// how many links were actually deleted.
    pub async fn delete(
        &self,
        tokens: Vec<Token>,
        caller: UserId,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if caller.is_empty() {
            return Err(LinkError::Unauthenticated);
        }
        self.submit(cancel, |reply| Task::Delete {
            tokens,
            caller,
            reply,
        })
        .await
    }

    /// Counts active links and their distinct owners.
    pub async fn stats(&self, cancel: &CancellationToken) -> Result<LinkStats> {
        self.submit(cancel, |reply| Task::Stats { reply }).await
    }

    /// Reports whether the repository answers. A stopped worker or a
    /// cancelled wait counts as unhealthy.
    pub async fn ping(&self, cancel: &CancellationToken) -> bool {
        self.submit(cancel, |reply| Task::Ping { reply })
            .await
            .unwrap_or(false)
    }

    async fn submit<T>(
        &self,
        cancel: &CancellationToken,
        task: impl FnOnce(Reply<T>) -> Task,
    ) -> Result<T> {
        let (reply, result) = oneshot::channel();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LinkError::Cancelled),
            sent = self.tasks.send(task(reply)) => {
                sent.map_err(|_| worker_stopped())?;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LinkError::Cancelled),
            received = result => received.map_err(|_| worker_stopped())?,
        }
    }
}

fn worker_stopped() -> LinkError {
    LinkError::Unavailable("link service worker is not running".to_string())
}
