use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shurl_core::error::{Result, StorageError};
use shurl_core::{LinkFilter, ReadRepository, Repository, ShortLink, Token, UserId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// One persisted record: the link plus its tombstone flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    #[serde(flatten)]
    link: ShortLink,
    #[serde(default)]
    deleted: bool,
}

/// A repository persisted as a single JSON array.
///
/// The whole file is read on every operation and rewritten on every
/// mutation. Deleted records stay in the file with `deleted: true`.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles against the file.
    lock: Mutex<()>,
}

impl JsonFileRepository {
    /// Opens the repository at `path`, creating the parent directory and an
    /// empty collection file if they do not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        if !tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "creating empty json storage file");
            write_entries(&path, &[]).await?;
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Entry>> {
        read_entries(&self.path).await
    }

    async fn active(&self) -> Result<impl Iterator<Item = ShortLink>> {
        let _guard = self.lock.lock().await;
        let entries = self.read().await?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.deleted)
            .map(|entry| entry.link))
    }
}

async fn read_entries(path: &Path) -> Result<Vec<Entry>> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::InvalidData(format!("failed to parse {}: {e}", path.display()))
    })
}

async fn write_entries(path: &Path, entries: &[Entry]) -> Result<()> {
    let json = serde_json::to_vec_pretty(entries)
        .map_err(|e| StorageError::Operation(format!("failed to encode entries: {e}")))?;

    // Write a sibling file first so a crash never leaves a truncated store.
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    trace!(path = %path.display(), entries = entries.len(), "rewrote json storage file");
    Ok(())
}

#[async_trait]
impl ReadRepository for JsonFileRepository {
    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        Ok(self.active().await?.collect())
    }

    async fn get(&self, token: &Token) -> Result<ShortLink> {
        let _guard = self.lock.lock().await;
        let entries = self.read().await?;

        // An active record wins over an older tombstone with the same token.
        let mut tombstoned = false;
        for entry in entries.into_iter().filter(|entry| &entry.link.token == token) {
            if !entry.deleted {
                return Ok(entry.link);
            }
            tombstoned = true;
        }

        if tombstoned {
            Err(StorageError::Gone(token.to_string()))
        } else {
            Err(StorageError::NotFound(token.to_string()))
        }
    }

    async fn get_by_condition(&self, filter: &LinkFilter) -> Result<Vec<ShortLink>> {
        Ok(self
            .active()
            .await?
            .filter(|link| filter.matches(link))
            .collect())
    }

    async fn ping(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

#[async_trait]
impl Repository for JsonFileRepository {
    async fn create(&self, link: ShortLink) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;

        if entries
            .iter()
            .any(|entry| !entry.deleted && entry.link.token == link.token)
        {
            return Err(StorageError::Conflict(link.token.to_string()));
        }

        entries.push(Entry {
            link,
            deleted: false,
        });
        write_entries(&self.path, &entries).await
    }

    async fn update(&self, link: ShortLink) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;

        let Some(entry) = entries
            .iter_mut()
            .find(|entry| !entry.deleted && entry.link.token == link.token)
        else {
            return Err(StorageError::NotFound(link.token.to_string()));
        };

        entry.link = link;
        write_entries(&self.path, &entries).await
    }

    async fn delete(&self, tokens: &[Token], caller: &UserId) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;

        let mut changed = 0usize;
        for entry in entries.iter_mut() {
            if !entry.deleted && &entry.link.created_by == caller && tokens.contains(&entry.link.token)
            {
                entry.deleted = true;
                changed += 1;
            }
        }

        if changed == 0 {
            return Ok(());
        }
        trace!(changed, "soft-deleted short links");
        write_entries(&self.path, &entries).await
    }

    async fn close(&self) {}
}
