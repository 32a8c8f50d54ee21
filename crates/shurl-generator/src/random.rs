use crate::Generator;
use rand::Rng;
use shurl_core::token::{TOKEN_ALPHABET, TOKEN_LENGTH};
use shurl_core::Token;

/// Draws every symbol independently and uniformly from the 52-letter
/// alphabet.
///
/// Not cryptographically hardened. Collisions are possible and surface as a
/// storage conflict when the token is persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    type Output = Token;

    fn generate(&self) -> Token {
        let mut rng = rand::rng();
        let token: String = (0..TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect();
        Token::new_unchecked(token)
    }
}
