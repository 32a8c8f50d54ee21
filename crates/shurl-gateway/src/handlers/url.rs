use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::model::{BatchShortenItem, BatchShortenResult, ShortenRequest, ShortenResponse, UserUrl};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use shurl_core::{LinkError, LinkFilter, NewShortLink, Token};
use tracing::debug;

fn mentions_json(headers: &HeaderMap, name: axum::http::HeaderName) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn bad_request(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Shortens one URL. A URL that is already shortened is answered with the
/// existing short URL and `409 Conflict` instead of an error.
async fn shorten(state: &AppState, identity: &Identity, long_url: &str) -> Result<(StatusCode, String)> {
    let long_url = long_url.trim();
    if long_url.is_empty() {
        return Err(AppError::BadRequest("url must not be empty".to_string()));
    }

    let link = NewShortLink::new(long_url, identity.user_id().clone());
    match state
        .service()
        .create(link, &state.request_cancellation())
        .await
    {
        Ok(link) => Ok((StatusCode::CREATED, state.short_url(&link.token))),
        Err(LinkError::AlreadyExists(existing)) => {
            debug!(token = %existing.token, "answering with existing short url");
            Ok((StatusCode::CONFLICT, state.short_url(&existing.token)))
        }
        Err(err) => Err(err.into()),
    }
}

/// `POST /` with the long URL as the raw body, or as `{"url"}` when sent
/// as JSON. Answers in JSON when the client accepts it.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    body: String,
) -> Result<Response> {
    let long_url = if mentions_json(&headers, CONTENT_TYPE) {
        serde_json::from_str::<ShortenRequest>(&body)
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .url
    } else {
        body
    };

    let (status, short_url) = shorten(&state, &identity, &long_url).await?;
    if mentions_json(&headers, ACCEPT) {
        Ok((status, Json(ShortenResponse { result: short_url })).into_response())
    } else {
        Ok((status, short_url).into_response())
    }
}

pub async fn shorten_json_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>)> {
    let Json(request) = payload.map_err(bad_request)?;
    let (status, short_url) = shorten(&state, &identity, &request.url).await?;
    Ok((status, Json(ShortenResponse { result: short_url })))
}

/// Shortens every item in order. An already shortened URL resolves to its
/// existing short URL; any other failure aborts the rest of the batch.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: std::result::Result<Json<Vec<BatchShortenItem>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<BatchShortenResult>>)> {
    let Json(items) = payload.map_err(bad_request)?;
    if items.is_empty() {
        return Err(AppError::BadRequest("batch must not be empty".to_string()));
    }

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let (_, short_url) = shorten(&state, &identity, &item.original_url).await?;
        results.push(BatchShortenResult {
            correlation_id: item.correlation_id,
            short_url,
        });
    }

    Ok((StatusCode::CREATED, Json(results)))
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Redirect> {
    // A malformed token can never have been issued.
    let token = Token::new(token).map_err(|e| LinkError::NotFound(e.to_string()))?;
    let link = state
        .service()
        .get(token, &state.request_cancellation())
        .await?;
    Ok(Redirect::temporary(&link.long_url))
}

pub async fn user_urls_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response> {
    let user = identity.require()?.clone();
    let links = state
        .service()
        .query(LinkFilter::CreatedBy(user), &state.request_cancellation())
        .await?;

    if links.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<UserUrl> = links
        .into_iter()
        .map(|link| UserUrl {
            short_url: state.short_url(&link.token),
            original_url: link.long_url,
        })
        .collect();
    Ok(Json(urls).into_response())
}

/// Accepts a JSON array of tokens. Tokens the caller does not own, or that
/// are malformed, unknown or already deleted, are skipped.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: std::result::Result<Json<Vec<String>>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(raw) = payload.map_err(bad_request)?;
    let user = identity.require()?.clone();

    let tokens: Vec<Token> = raw.into_iter().filter_map(|t| Token::new(t).ok()).collect();
    state
        .service()
        .delete(tokens, user, &state.request_cancellation())
        .await?;

    Ok(StatusCode::ACCEPTED)
}
