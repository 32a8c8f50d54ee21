use crate::task::{Reply, Task};
use crate::Result;
use shurl_core::{LinkError, LinkFilter, LinkStats, NewShortLink, Repository, ShortLink, Token, UserId};
use shurl_generator::Generator;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// The single consumer of the task queue.
///
/// Every repository call made on behalf of a [`LinkService`](crate::LinkService)
/// happens here, one task at a time and in submission order. That makes the
/// dedup check in `create` and the ownership check in `delete` atomic with
/// respect to each other without any locking in this crate.
pub(crate) struct TaskProcessor<R, G> {
    repository: R,
    generator: G,
}

impl<R: Repository, G: Generator> TaskProcessor<R, G> {
    pub(crate) fn new(repository: R, generator: G) -> Self {
        Self {
            repository,
            generator,
        }
    }

    /// Drains `tasks` until every sender is gone, then closes the repository.
    pub(crate) async fn run(self, mut tasks: mpsc::Receiver<Task>) {
        info!("link service worker started");

        while let Some(task) = tasks.recv().await {
            trace!(task = task.name(), "processing task");
            self.process(task).await;
        }

        self.repository.close().await;
        info!("link service worker stopped, repository closed");
    }

    async fn process(&self, task: Task) {
        match task {
            Task::Create { link, reply } => respond("create", reply, self.create(link).await),
            Task::Get { token, reply } => respond("get", reply, self.get(&token).await),
            Task::Query { filter, reply } => respond("query", reply, self.query(&filter).await),
            Task::GetAll { reply } => respond("get_all", reply, self.get_all().await),
            Task::Delete {
                tokens,
                caller,
                reply,
            } => respond("delete", reply, self.delete(&tokens, &caller).await),
            Task::Stats { reply } => respond("stats", reply, self.stats().await),
            Task::Ping { reply } => respond("ping", reply, Ok(self.repository.ping().await)),
        }
    }

    async fn create(&self, new: NewShortLink) -> Result<ShortLink> {
        let existing = self
            .repository
            .get_by_condition(&LinkFilter::LongUrl(new.long_url.clone()))
            .await?;
        if let Some(link) = existing.into_iter().next() {
            debug!(token = %link.token, "long url already shortened");
            return Err(LinkError::AlreadyExists(link));
        }

        let link = ShortLink {
            token: self.generator.generate().into(),
            long_url: new.long_url,
            created_by: new.created_by,
        };
        // A storage conflict here is a token collision, reported as internal.
        self.repository.create(link.clone()).await?;

        debug!(token = %link.token, created_by = %link.created_by, "short link created");
        Ok(link)
    }

    async fn get(&self, token: &Token) -> Result<ShortLink> {
        Ok(self.repository.get(token).await?)
    }

    async fn query(&self, filter: &LinkFilter) -> Result<Vec<ShortLink>> {
        Ok(self.repository.get_by_condition(filter).await?)
    }

    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        Ok(self.repository.get_all().await?)
    }

    async fn delete(&self, tokens: &[Token], caller: &UserId) -> Result<()> {
        self.repository.delete(tokens, caller).await?;
        debug!(requested = tokens.len(), caller = %caller, "delete processed");
        Ok(())
    }

    async fn stats(&self) -> Result<LinkStats> {
        let links = self.repository.get_all().await?;
        Ok(LinkStats::from_links(&links))
    }
}

fn respond<T>(task: &'static str, reply: Reply<T>, result: Result<T>) {
    if reply.send(result).is_err() {
        warn!(task, "caller stopped waiting, result discarded");
    }
}
