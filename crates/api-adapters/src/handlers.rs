//! # Handlers
//!
//! Parse the request, authenticate, call the service, record the policy
//! outcome and map the result to a response.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use domains::{AppError, Donation, DonationDraft, DonationId, UserData, UserId};

use crate::error::ApiError;
use crate::extract::{Caller, JsonBody};
use crate::metrics::Action;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub id: DonationId,
    pub data: DonationDraft,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub donation_id: DonationId,
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    #[serde(rename = "userToBan")]
    pub user_to_ban: UserId,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub uid: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct UidQuery {
    pub uid: UserId,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: DonationId,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok((
        [(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    ))
}

// ── Donations ────────────────────────────────────────────────────────────────

pub async fn list_donations(State(state): State<AppState>) -> ApiResult<Json<Vec<Donation>>> {
    Ok(Json(state.donations.list_donations().await?))
}

pub async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
) -> ApiResult<Json<Donation>> {
    Ok(Json(state.donations.get_donation(&id).await?))
}

pub async fn create_donation(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(draft): JsonBody<DonationDraft>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let result = state.donations.create_donation(&caller.uid, draft).await;
    state.metrics.observe(Action::CreateDonation, &result);
    Ok((StatusCode::CREATED, Json(Created { id: result? })))
}

pub async fn edit_donation(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<EditRequest>,
) -> ApiResult<StatusCode> {
    let result = state
        .donations
        .edit_donation(&caller.uid, &req.id, req.data)
        .await;
    state.metrics.observe(Action::EditDonation, &result);
    result?;
    Ok(StatusCode::OK)
}

pub async fn report_donation(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<ReportRequest>,
) -> ApiResult<StatusCode> {
    let result = state
        .donations
        .report_donation(&caller.uid, &req.donation_id)
        .await;
    state.metrics.observe(Action::ReportDonation, &result);
    result?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_donation(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<DonationId>,
) -> ApiResult<StatusCode> {
    let result = state.donations.delete_donation(&caller.uid, &id).await;
    state.metrics.observe(Action::DeleteDonation, &result);
    result?;
    Ok(StatusCode::OK)
}

// ── Users ────────────────────────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<UserId>,
) -> ApiResult<Json<UserData>> {
    Ok(Json(state.users.get_user(&uid).await?))
}

pub async fn is_banned(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let banned = state.users.is_banned(&query.uid).await?;
    Ok(Json(json!({ "banned": banned })))
}

pub async fn is_admin(
    State(state): State<AppState>,
    Query(query): Query<UidQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = state.users.is_admin(&query.uid).await?;
    Ok(Json(json!({ "admin": admin })))
}

pub async fn create_account(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<(StatusCode, Json<UserData>)> {
    let result = state.users.create_account(&caller).await;
    state.metrics.observe(Action::CreateAccount, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

/// The body is optional; without one the caller deletes their own account.
pub async fn delete_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: DeleteUserRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteUserRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "invalid_body", e.to_string()))?
    };
    let target = req.uid.unwrap_or_else(|| caller.uid.clone());

    let result = state.users.delete_self(&caller.uid, &target).await;
    state.metrics.observe(Action::DeleteSelf, &result);
    result?;
    Ok(StatusCode::OK)
}

pub async fn ban_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<BanRequest>,
) -> ApiResult<StatusCode> {
    let result = state.users.ban_user(&caller.uid, &req.user_to_ban).await;
    state.metrics.observe(Action::BanUser, &result);
    result?;
    Ok(StatusCode::OK)
}
