//! Translation of service errors into gRPC statuses.

use shurl_core::LinkError;
use tonic::{Code, Status};

/// Returns the gRPC code a [`LinkError`] is reported with.
pub fn status_code(error: &LinkError) -> Code {
    match error {
        LinkError::AlreadyExists(_) => Code::AlreadyExists,
        LinkError::NotFound(_) => Code::NotFound,
        LinkError::Gone(_) => Code::FailedPrecondition,
        LinkError::NotAllowed(_) => Code::PermissionDenied,
        LinkError::Unauthenticated => Code::Unauthenticated,
        LinkError::Internal(_) => Code::Internal,
        LinkError::Unavailable(_) => Code::Unavailable,
        LinkError::Cancelled => Code::Cancelled,
    }
}

/// Converts a [`LinkError`] into the status a gRPC handler answers with.
pub fn to_status(error: LinkError) -> Status {
    Status::new(status_code(&error), error.to_string())
}
