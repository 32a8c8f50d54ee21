//! Cookie based caller identity.
//!
//! Every caller carries a signed `jwt_token` cookie naming its user id.
//! Callers without a valid cookie get a freshly minted id and cookie; such
//! an id owns nothing yet, so routes that act on the caller's existing
//! links treat it as no identity at all.

use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shurl_core::{LinkError, UserId};
use tracing::debug;
use uuid::Uuid;

pub const JWT_COOKIE_NAME: &str = "jwt_token";
pub const TOKEN_LIFETIME: SignedDuration = SignedDuration::from_hours(3);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    exp: i64,
}

/// Signs and verifies identity tokens with a shared HS256 secret.
pub struct IdentityKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl IdentityKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Signs a token for `user` that expires after [`TOKEN_LIFETIME`].
    pub fn issue(&self, user: &UserId) -> Result<String> {
        let claims = Claims {
            user_id: user.to_string(),
            exp: (Timestamp::now() + TOKEN_LIFETIME).as_second(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Identity(e.to_string()))
    }

    /// Returns the user named by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<UserId> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(UserId::from(data.claims.user_id)),
            Err(err) => {
                debug!(error = %err, "rejected identity token");
                None
            }
        }
    }
}

/// The caller's identity, attached to every request by [`identify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Presented a valid cookie.
    Known(UserId),
    /// Minted for this request.
    Issued(UserId),
}

impl Identity {
    pub fn user_id(&self) -> &UserId {
        match self {
            Identity::Known(user) | Identity::Issued(user) => user,
        }
    }

    /// Returns the user id of a caller that proved an existing identity.
    pub fn require(&self) -> std::result::Result<&UserId, LinkError> {
        match self {
            Identity::Known(user) if !user.is_empty() => Ok(user),
            _ => Err(LinkError::Unauthenticated),
        }
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Middleware resolving the caller's identity, issuing one when needed.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let known = cookie_value(request.headers(), JWT_COOKIE_NAME)
        .and_then(|token| state.identity_keys().verify(token));

    if let Some(user) = known {
        request.extensions_mut().insert(Identity::Known(user));
        return Ok(next.run(request).await);
    }

    let user = UserId::new(Uuid::new_v4().to_string());
    let token = state.identity_keys().issue(&user)?;
    let cookie = HeaderValue::from_str(&format!(
        "{JWT_COOKIE_NAME}={token}; Path=/; Max-Age={}; HttpOnly",
        TOKEN_LIFETIME.as_secs()
    ))
    .map_err(|e| AppError::Identity(e.to_string()))?;

    debug!(user_id = %user, "issued new identity");
    request.extensions_mut().insert(Identity::Issued(user));

    let mut response = next.run(request).await;
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let keys = IdentityKeys::new("secret");
        let user = UserId::from("6f1c0b5e-4e0b-4a64-9a43-1f2d1b7b7a10");

        let token = keys.issue(&user).unwrap();
        assert_eq!(keys.verify(&token), Some(user));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = IdentityKeys::new("secret")
            .issue(&UserId::from("u1"))
            .unwrap();
        assert_eq!(IdentityKeys::new("other").verify(&token), None);
        assert_eq!(IdentityKeys::new("secret").verify("garbage"), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = IdentityKeys::new("secret");
        let claims = Claims {
            user_id: "u1".to_string(),
            exp: (Timestamp::now() - SignedDuration::from_hours(1)).as_second(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn only_known_identities_pass_require() {
        assert!(Identity::Known(UserId::from("u1")).require().is_ok());
        assert!(Identity::Issued(UserId::from("u1")).require().is_err());
        assert!(Identity::Known(UserId::default()).require().is_err());
    }

    #[test]
    fn cookie_lookup_finds_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; jwt_token=abc.def.ghi"));

        assert_eq!(cookie_value(&headers, JWT_COOKIE_NAME), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
