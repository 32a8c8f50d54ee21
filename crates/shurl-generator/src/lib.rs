//! Token generators.
//!
//! Generators are pure: they never look at storage, so uniqueness of a
//! generated token is only probabilistic and is ultimately enforced by the
//! repository.

pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use shurl_core::Token;

/// Trait for generating tokens.
///
/// Implementations can vary from random draws to deterministic counters.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<Token>;
    /// Generates a value that can be converted into a token.
    fn generate(&self) -> Self::Output;
}
