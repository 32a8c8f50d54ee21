use crate::error::Result;
use crate::link::{LinkFilter, ShortLink, UserId};
use crate::token::Token;
use async_trait::async_trait;

/// A read-only view of a repository.
///
/// Every read only ever returns active records; soft-deleted records are
/// visible solely through the `Gone` error of [`ReadRepository::get`].
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Returns all active records.
    async fn get_all(&self) -> Result<Vec<ShortLink>>;

    /// Retrieves the active record for a token.
    ///
    /// Returns `Err(Gone)` if the token belongs to a soft-deleted record and
    /// `Err(NotFound)` if it was never stored.
    async fn get(&self, token: &Token) -> Result<ShortLink>;

    /// Returns all active records matching `filter`.
    async fn get_by_condition(&self, filter: &LinkFilter) -> Result<Vec<ShortLink>>;

    /// Reports whether the backend is reachable.
    async fn ping(&self) -> bool;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record. Returns `Err(Conflict)` if an active record with
    /// the same token already exists.
    async fn create(&self, link: ShortLink) -> Result<()>;

    /// Replaces the active record with the same token.
    /// Returns `Err(NotFound)` if there is none.
    async fn update(&self, link: ShortLink) -> Result<()>;

    /// Soft-deletes every active record among `tokens` owned by `caller`.
    /// Tokens that are unknown, already deleted or owned by someone else
    /// are skipped without error.
    async fn delete(&self, tokens: &[Token], caller: &UserId) -> Result<()>;

    /// Releases the backend's resources. Called once, after the last use.
    async fn close(&self);
}
