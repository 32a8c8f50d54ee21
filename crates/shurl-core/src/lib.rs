//! Core types and traits for the shurl link shortener.
//!
//! This crate provides the domain model shared by the storage backends,
//! the link lifecycle service and the transport adapters: tokens, short
//! links, the repository contract and the error taxonomy.

pub mod error;
pub mod link;
pub mod repository;
pub mod token;

pub use error::{CoreError, ErrorKind, LinkError, StorageError};
pub use link::{LinkFilter, LinkStats, NewShortLink, ShortLink, UserId};
pub use repository::{ReadRepository, Repository};
pub use token::Token;
