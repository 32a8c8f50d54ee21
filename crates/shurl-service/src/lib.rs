//! The link lifecycle service.
//!
//! All operations against the repository are funnelled through a single
//! worker task. Callers hold a cheap [`LinkService`] handle, submit typed
//! tasks over a bounded queue and wait for the reply, or for their own
//! cancellation, whichever comes first.

pub mod config;
pub mod grpc;
pub mod service;

mod processor;
mod task;

pub use config::ServiceConfig;
pub use service::LinkService;
pub use shurl_core::{ErrorKind, LinkError};

/// Result type for link service operations.
pub type Result<T> = std::result::Result<T, LinkError>;
