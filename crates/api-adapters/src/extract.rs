//! Request extractors: the authenticated caller and JSON bodies with
//! uniform error bodies.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use domains::VerifiedIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// The identity behind a valid `Authorization: Bearer` credential.
#[derive(Debug, Clone)]
pub struct Caller(pub VerifiedIdentity);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthenticated("missing authorization header"))?
            .to_str()
            .map_err(|_| ApiError::unauthenticated("malformed authorization header"))?;

        let token = bearer_token(header)
            .ok_or_else(|| ApiError::unauthenticated("expected a bearer token"))?;

        let identity = state.identity.verify(token).await?;
        Ok(Caller(identity))
    }
}

/// The credential after a `Bearer` scheme, which matches case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// `Json<T>` whose rejections use the API error body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
