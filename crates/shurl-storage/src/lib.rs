//! Repository backends for short links.
//!
//! Every backend implements [`Repository`] with the same semantics: at most
//! one active record per token, soft deletion scoped to the owner, and a
//! `Gone` error that keeps deleted tokens distinguishable from unknown ones.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileRepository;
pub use memory::InMemoryRepository;
pub use shurl_core::{ReadRepository, Repository, StorageError};
pub use sqlite::SqliteRepository;
