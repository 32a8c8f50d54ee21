use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of symbols in every issued token.
pub const TOKEN_LENGTH: usize = 8;

/// The 52-symbol token alphabet: ASCII upper and lower case letters.
pub const TOKEN_ALPHABET: &[u8; 52] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The public identifier of a short link.
///
/// Issued tokens are exactly eight ASCII letters. The token doubles as the
/// primary key of a record and as the path segment of the short URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Creates a new `Token` after validating the input.
    ///
    /// Valid tokens are exactly eight characters from `[A-Za-z]`.
    pub fn new(token: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let token = token.into();
        Self::validate(&token)?;
        Ok(Self(token))
    }

    /// Creates a `Token` without validation.
    ///
    /// Use this only for values read back from trusted sources such as a
    /// repository row or a generator.
    pub fn new_unchecked(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Builds the full short URL for this token under `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(token: &str) -> std::result::Result<(), CoreError> {
        if token.len() != TOKEN_LENGTH {
            return Err(CoreError::InvalidToken(format!(
                "length must be {}, got {}",
                TOKEN_LENGTH,
                token.len()
            )));
        }

        if !token.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidToken(format!(
                "must contain only ASCII letters: '{}'",
                token
            )));
        }

        Ok(())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
