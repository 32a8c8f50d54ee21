use crate::Generator;
use shurl_core::token::{TOKEN_ALPHABET, TOKEN_LENGTH};
use shurl_core::Token;
use std::sync::atomic::{AtomicU64, Ordering};

/// A sequential token generator.
///
/// Renders an atomic counter in base 52 over the token alphabet, padded to
/// the token length: `AAAAAAAA`, `AAAAAAAB`, ... It never repeats within one
/// instance until the 52^8 space wraps around.
///
/// For several instances sharing a repository, give each one a disjoint
/// counter range with [`SeqGenerator::with_offset`].
#[derive(Debug, Default)]
pub struct SeqGenerator {
    counter: AtomicU64,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
        }
    }
}

impl SeqGenerator {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state or distributing
    /// counter ranges across nodes.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }

    fn encode(mut value: u64) -> String {
        let base = TOKEN_ALPHABET.len() as u64;
        let mut symbols = [TOKEN_ALPHABET[0]; TOKEN_LENGTH];
        for slot in symbols.iter_mut().rev() {
            *slot = TOKEN_ALPHABET[(value % base) as usize];
            value /= base;
        }
        symbols.iter().map(|&b| b as char).collect()
    }
}

impl Generator for SeqGenerator {
    type Output = Token;

    fn generate(&self) -> Token {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        Token::new_unchecked(Self::encode(count))
    }
}
