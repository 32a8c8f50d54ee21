use shurl_core::{LinkFilter, ShortLink, Token, UserId};
use shurl_storage::{ReadRepository, Repository, SqliteRepository, StorageError};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

struct Fixture {
    repo: SqliteRepository,
}

impl Fixture {
    async fn start() -> Self {
        // A single connection that never recycles keeps the in-memory
        // database alive for the whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory sqlite");

        Self {
            repo: SqliteRepository::new(pool).await.expect("create schema"),
        }
    }
}

fn token(value: &str) -> Token {
    Token::new_unchecked(value)
}

fn link(t: &str, url: &str, user: &str) -> ShortLink {
    ShortLink {
        token: token(t),
        long_url: url.to_string(),
        created_by: UserId::from(user),
    }
}

#[tokio::test]
async fn create_and_get_active_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://example.com", "u1"))
        .await
        .unwrap();

    let got = fixture.repo.get(&token("abcdefgh")).await.unwrap();
    assert_eq!(got, link("abcdefgh", "https://example.com", "u1"));
}

#[tokio::test]
async fn get_unknown_token_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture.repo.get(&token("missingx")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn create_conflicts_when_token_is_active() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://one.example", "u1"))
        .await
        .unwrap();

    let err = fixture
        .repo
        .create(link("abcdefgh", "https://two.example", "u2"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(
        fixture.repo.get(&token("abcdefgh")).await.unwrap().long_url,
        "https://one.example"
    );
}

#[tokio::test]
async fn delete_leaves_tombstone() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://example.com", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .delete(&[token("abcdefgh")], &UserId::from("u1"))
        .await
        .unwrap();

    let err = fixture.repo.get(&token("abcdefgh")).await.unwrap_err();
    assert!(matches!(err, StorageError::Gone(_)));
    assert!(fixture.repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_skips_tokens_owned_by_others() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://a.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(link("bcdefghi", "https://b.example", "u2"))
        .await
        .unwrap();

    fixture
        .repo
        .delete(
            &[token("abcdefgh"), token("bcdefghi"), token("unknownx")],
            &UserId::from("u2"),
        )
        .await
        .unwrap();

    assert!(fixture.repo.get(&token("abcdefgh")).await.is_ok());
    assert!(matches!(
        fixture.repo.get(&token("bcdefghi")).await.unwrap_err(),
        StorageError::Gone(_)
    ));
}

#[tokio::test]
async fn delete_with_no_tokens_is_noop() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://example.com", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .delete(&[], &UserId::from("u1"))
        .await
        .unwrap();

    assert_eq!(fixture.repo.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_over_tombstone_reactivates_token() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://old.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .delete(&[token("abcdefgh")], &UserId::from("u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(link("abcdefgh", "https://new.example", "u2"))
        .await
        .unwrap();

    let got = fixture.repo.get(&token("abcdefgh")).await.unwrap();
    assert_eq!(got, link("abcdefgh", "https://new.example", "u2"));
}

#[tokio::test]
async fn get_by_condition_filters_on_either_field() {
    let fixture = Fixture::start().await;

    for (t, url, user) in [
        ("aaaaaaaa", "https://a.example", "u1"),
        ("bbbbbbbb", "https://b.example", "u1"),
        ("cccccccc", "https://c.example", "u2"),
    ] {
        fixture.repo.create(link(t, url, user)).await.unwrap();
    }
    fixture
        .repo
        .delete(&[token("bbbbbbbb")], &UserId::from("u1"))
        .await
        .unwrap();

    let mine = fixture
        .repo
        .get_by_condition(&LinkFilter::CreatedBy("u1".into()))
        .await
        .unwrap();
    assert_eq!(mine, vec![link("aaaaaaaa", "https://a.example", "u1")]);

    let by_url = fixture
        .repo
        .get_by_condition(&LinkFilter::LongUrl("https://c.example".into()))
        .await
        .unwrap();
    assert_eq!(by_url, vec![link("cccccccc", "https://c.example", "u2")]);
}

#[tokio::test]
async fn update_only_touches_active_records() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(link("abcdefgh", "https://old.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .update(link("abcdefgh", "https://new.example", "u1"))
        .await
        .unwrap();
    assert_eq!(
        fixture.repo.get(&token("abcdefgh")).await.unwrap().long_url,
        "https://new.example"
    );

    fixture
        .repo
        .delete(&[token("abcdefgh")], &UserId::from("u1"))
        .await
        .unwrap();
    let err = fixture
        .repo
        .update(link("abcdefgh", "https://newer.example", "u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn ping_reports_closed_pool() {
    let fixture = Fixture::start().await;

    assert!(fixture.repo.ping().await);
    fixture.repo.close().await;
    assert!(!fixture.repo.ping().await);
}

#[tokio::test]
async fn connect_creates_database_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shortener.db");
    let url = format!("sqlite://{}", path.display());

    {
        let repo = SqliteRepository::connect(&url).await.unwrap();
        repo.create(link("abcdefgh", "https://example.com", "u1"))
            .await
            .unwrap();
        repo.close().await;
    }

    assert!(path.exists());
    let repo = SqliteRepository::connect(&url).await.unwrap();
    assert_eq!(
        repo.get(&token("abcdefgh")).await.unwrap().long_url,
        "https://example.com"
    );
}

#[tokio::test]
async fn connect_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("nested").join("shortener.db");
    let url = format!("sqlite://{}", path.display());

    let repo = SqliteRepository::connect(&url).await.unwrap();
    assert!(repo.ping().await);
    repo.close().await;

    assert!(path.exists());
}
