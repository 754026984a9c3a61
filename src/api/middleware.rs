use axum::{
    body::{self, Body},
    extract::{Query, Request, State},
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::api::access::Caller;
use crate::api::state::AppState;
use crate::crypto::TokenService;
use crate::error::AppError;

/// Largest JSON body buffered while looking for a `_token` field.
pub const MAX_TOKEN_BODY_BYTES: usize = 64 * 1024;

/// `_token` as it may appear in a query string or a JSON body
#[derive(Debug, Default, Deserialize)]
struct TokenField {
    #[serde(rename = "_token")]
    token: Option<String>,
}

/// Where a request's token came from, or why there is none.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenSource {
    Header(String),
    Query(String),
    Body(String),
    Missing,
    MalformedHeader,
}

fn non_empty(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Look for a token in the Authorization header, then the query string.
fn find_token(request: &Request) -> TokenSource {
    if let Some(value) = request.headers().get(AUTHORIZATION) {
        return match value.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if !token.trim().is_empty() => TokenSource::Header(token.trim().to_string()),
            _ => TokenSource::MalformedHeader,
        };
    }

    let query = Query::<TokenField>::try_from_uri(request.uri())
        .map(|Query(field)| field)
        .unwrap_or_default();

    match non_empty(query.token) {
        Some(token) => TokenSource::Query(token),
        None => TokenSource::Missing,
    }
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Buffer a JSON body, pull `_token` out of it, and hand back a request
/// carrying the same bytes.
async fn token_from_body(request: Request) -> Result<(Request, Option<String>), AppError> {
    let (parts, body) = request.into_parts();
    let bytes = body::to_bytes(body, MAX_TOKEN_BODY_BYTES)
        .await
        .map_err(|e| AppError::Validation(format!("Unreadable request body: {}", e)))?;

    let token = serde_json::from_slice::<TokenField>(&bytes)
        .ok()
        .and_then(|field| non_empty(field.token));

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

/// Resolve the caller from the request's token.
///
/// Never rejects: a missing or bad token leaves the caller anonymous and
/// the outcome is only logged.
pub fn resolve_caller(tokens: &TokenService, source: TokenSource) -> Caller {
    let token = match source {
        TokenSource::Header(token) | TokenSource::Query(token) | TokenSource::Body(token) => token,
        TokenSource::Missing => {
            tracing::trace!(reason = "missing", "anonymous request");
            return Caller::Anonymous;
        }
        TokenSource::MalformedHeader => {
            tracing::warn!(reason = "malformed_header", "anonymous request");
            return Caller::Anonymous;
        }
    };

    match tokens.verify(&token) {
        Ok(claims) => {
            tracing::debug!(username = %claims.username, "caller resolved");
            Caller::User(claims.username)
        }
        Err(e) => {
            tracing::warn!(reason = "invalid_token", error = %e, "anonymous request");
            Caller::Anonymous
        }
    }
}

/// Authentication middleware - attaches a [`Caller`] to every request
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut request, source) = match find_token(&request) {
        TokenSource::Missing if is_json(&request) => match token_from_body(request).await {
            Ok((request, Some(token))) => (request, TokenSource::Body(token)),
            Ok((request, None)) => (request, TokenSource::Missing),
            Err(e) => return e.into_response(),
        },
        source => (request, source),
    };

    let caller = resolve_caller(&state.tokens, source);
    request.extensions_mut().insert(caller);

    next.run(request).await
}
