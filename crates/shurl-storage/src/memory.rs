use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shurl_core::error::{Result, StorageError};
use shurl_core::{LinkFilter, ReadRepository, Repository, ShortLink, Token, UserId};
use tracing::trace;

/// In-memory implementation of the Repository trait using DashMap.
///
/// Active and soft-deleted records live in separate maps. Deleting moves a
/// record from `active` to `deleted`, which is all `get` needs to tell a
/// deleted token from one that never existed.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    active: DashMap<Token, ShortLink>,
    deleted: DashMap<Token, ShortLink>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        Ok(self
            .active
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get(&self, token: &Token) -> Result<ShortLink> {
        if let Some(link) = self.active.get(token) {
            return Ok(link.clone());
        }

        if self.deleted.contains_key(token) {
            return Err(StorageError::Gone(token.to_string()));
        }

        Err(StorageError::NotFound(token.to_string()))
    }

    async fn get_by_condition(&self, filter: &LinkFilter) -> Result<Vec<ShortLink>> {
        Ok(self
            .active
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create(&self, link: ShortLink) -> Result<()> {
        match self.active.entry(link.token.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.token.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(link);
                Ok(())
            }
        }
    }

    async fn update(&self, link: ShortLink) -> Result<()> {
        match self.active.get_mut(&link.token) {
            Some(mut existing) => {
                *existing = link;
                Ok(())
            }
            None => Err(StorageError::NotFound(link.token.to_string())),
        }
    }

    async fn delete(&self, tokens: &[Token], caller: &UserId) -> Result<()> {
        for token in tokens {
            if let Some((token, link)) = self
                .active
                .remove_if(token, |_, link| &link.created_by == caller)
            {
                trace!(token = %token, "moved short link to deleted set");
                self.deleted.insert(token, link);
            }
        }
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> Token {
        Token::new_unchecked(s)
    }

    fn link(t: &str, url: &str, user: &str) -> ShortLink {
        ShortLink {
            token: token(t),
            long_url: url.to_string(),
            created_by: UserId::from(user),
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let repo = InMemoryRepository::new();

        repo.create(link("abcdefgh", "https://example.com", "u1"))
            .await
            .unwrap();

        let result = repo.get(&token("abcdefgh")).await.unwrap();
        assert_eq!(result.long_url, "https://example.com");
        assert_eq!(result.created_by, UserId::from("u1"));
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();

        let err = repo.get(&token("nopenope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_conflict() {
        let repo = InMemoryRepository::new();

        repo.create(link("abcdefgh", "https://example.com", "u1"))
            .await
            .unwrap();

        let err = repo
            .create(link("abcdefgh", "https://other.com", "u2"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_by_owner_leaves_tombstone() {
        let repo = InMemoryRepository::new();
        repo.create(link("abcdefgh", "https://example.com", "u1"))
            .await
            .unwrap();

        repo.delete(&[token("abcdefgh")], &UserId::from("u1"))
            .await
            .unwrap();

        let err = repo.get(&token("abcdefgh")).await.unwrap_err();
        assert!(matches!(err, StorageError::Gone(_)));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_other_user_is_skipped() {
        let repo = InMemoryRepository::new();
        repo.create(link("abcdefgh", "https://example.com", "u1"))
            .await
            .unwrap();

        repo.delete(&[token("abcdefgh"), token("unknownx")], &UserId::from("u2"))
            .await
            .unwrap();

        assert!(repo.get(&token("abcdefgh")).await.is_ok());
    }

    #[tokio::test]
    async fn create_over_tombstone_reactivates_token() {
        let repo = InMemoryRepository::new();
        repo.create(link("abcdefgh", "https://old.com", "u1"))
            .await
            .unwrap();
        repo.delete(&[token("abcdefgh")], &UserId::from("u1"))
            .await
            .unwrap();

        repo.create(link("abcdefgh", "https://new.com", "u2"))
            .await
            .unwrap();

        let result = repo.get(&token("abcdefgh")).await.unwrap();
        assert_eq!(result.long_url, "https://new.com");
    }

    #[tokio::test]
    async fn update_replaces_active_record() {
        let repo = InMemoryRepository::new();
        repo.create(link("abcdefgh", "https://old.com", "u1"))
            .await
            .unwrap();

        repo.update(link("abcdefgh", "https://new.com", "u1"))
            .await
            .unwrap();
        assert_eq!(
            repo.get(&token("abcdefgh")).await.unwrap().long_url,
            "https://new.com"
        );

        let err = repo
            .update(link("missingx", "https://new.com", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_by_condition_filters_active_records() {
        let repo = InMemoryRepository::new();
        repo.create(link("aaaaaaaa", "https://a.com", "u1"))
            .await
            .unwrap();
        repo.create(link("bbbbbbbb", "https://b.com", "u1"))
            .await
            .unwrap();
        repo.create(link("cccccccc", "https://c.com", "u2"))
            .await
            .unwrap();
        repo.delete(&[token("bbbbbbbb")], &UserId::from("u1"))
            .await
            .unwrap();

        let mine = repo
            .get_by_condition(&LinkFilter::CreatedBy("u1".into()))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].token, token("aaaaaaaa"));

        let by_url = repo
            .get_by_condition(&LinkFilter::LongUrl("https://c.com".into()))
            .await
            .unwrap();
        assert_eq!(by_url.len(), 1);
        assert_eq!(by_url[0].created_by, UserId::from("u2"));
    }

    #[tokio::test]
    async fn concurrent_access() {
        use std::sync::Arc;

        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u8 {
            let repo = Arc::clone(&repo);
            let handle = tokio::spawn(async move {
                let t = format!("tokenab{}", (b'a' + i) as char);
                repo.create(link(&t, &format!("https://example{i}.com"), "u1"))
                    .await
                    .unwrap();
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.get_all().await.unwrap().len(), 10);
        assert!(repo.ping().await);
    }
}
