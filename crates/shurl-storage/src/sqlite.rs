use async_trait::async_trait;
use shurl_core::error::{Result, StorageError};
use shurl_core::{LinkFilter, ReadRepository, Repository, ShortLink, Token, UserId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, trace};

const SCHEMA: &str = include_str!("../ddl/sqlite/short_links.sql");

/// SQLite implementation of the repository contract.
///
/// Soft delete is implemented with the `deleted` flag. Reads only return
/// active rows. Creating a token that only exists as a tombstone reuses the
/// row, mirroring the other backends where an active record shadows a
/// deleted one.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing pool and ensures the schema.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    /// Creates a repository by opening a new pool for `database_url`,
    /// creating the database file and its directory if they are missing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true);
        if let Some(dir) = options
            .get_filename()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(dir).await?;
        }
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        debug!(database_url, "connected to sqlite");
        Self::new(pool).await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_link(row: &SqliteRow) -> Result<ShortLink> {
    let token: String = row.try_get("token").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let created_by: String = row.try_get("created_by").map_err(map_sqlx_error)?;

    Ok(ShortLink {
        token: Token::new_unchecked(token),
        long_url,
        created_by: UserId::from(created_by),
    })
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        let rows = sqlx::query(
            r#"
            SELECT token, long_url, created_by
            FROM short_links
            WHERE deleted = FALSE
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_link).collect()
    }

    async fn get(&self, token: &Token) -> Result<ShortLink> {
        let row = sqlx::query(
            r#"
            SELECT token, long_url, created_by, deleted
            FROM short_links
            WHERE token = ?
            LIMIT 1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(token.to_string()));
        };

        let deleted: bool = row.try_get("deleted").map_err(map_sqlx_error)?;
        if deleted {
            return Err(StorageError::Gone(token.to_string()));
        }

        row_to_link(&row)
    }

    async fn get_by_condition(&self, filter: &LinkFilter) -> Result<Vec<ShortLink>> {
        // `field()` only ever yields one of the fixed column names.
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT token, long_url, created_by FROM short_links WHERE deleted = FALSE AND ",
        );
        query
            .push(filter.field())
            .push(" = ")
            .push_bind(filter.value())
            .push(" ORDER BY rowid");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_link).collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create(&self, link: ShortLink) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_links (token, long_url, created_by, deleted)
            VALUES (?, ?, ?, FALSE)
            ON CONFLICT (token) DO UPDATE
              SET long_url = excluded.long_url,
                  created_by = excluded.created_by,
                  deleted = FALSE
              WHERE short_links.deleted = TRUE
            "#,
        )
        .bind(link.token.as_str())
        .bind(&link.long_url)
        .bind(link.created_by.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(StorageError::Conflict(link.token.to_string()))
            }
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(link.token.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn update(&self, link: ShortLink) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET long_url = ?, created_by = ?
            WHERE token = ?
              AND deleted = FALSE
            "#,
        )
        .bind(&link.long_url)
        .bind(link.created_by.as_str())
        .bind(link.token.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(link.token.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, tokens: &[Token], caller: &UserId) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE short_links SET deleted = TRUE WHERE deleted = FALSE AND created_by = ");
        query.push_bind(caller.as_str()).push(" AND token IN (");
        let mut separated = query.separated(", ");
        for token in tokens {
            separated.push_bind(token.as_str());
        }
        separated.push_unseparated(")");

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        trace!(changed = result.rows_affected(), "soft-deleted short links");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
