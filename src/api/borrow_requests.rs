//! Borrow request endpoints
//!
//! Thin wrappers over the borrow service: the acting user id always comes
//! from the bearer token, never from the request body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, CreateBorrowRequest},
        enums::{BorrowAction, BorrowStatus},
    },
    repository::audit::AuditEntry,
    AppState,
};

use super::AuthenticatedUser;

/// Create borrow request body (the borrower is the authenticated user)
#[derive(Deserialize, ToSchema)]
pub struct CreateBorrowRequestBody {
    pub item_id: Uuid,
    /// Must be strictly in the future
    pub requested_return_date: DateTime<Utc>,
    pub request_message: Option<String>,
    pub video_url: Option<String>,
}

/// Body for lifecycle actions (all fields optional)
#[derive(Deserialize, Default, ToSchema)]
pub struct ActionBody {
    /// Lender message, borrower notes or cancellation reason,
    /// depending on the action
    pub message: Option<String>,
    /// Only honored by the return action
    pub actual_return_date: Option<DateTime<Utc>>,
}

/// Transition outcome
#[derive(Serialize, ToSchema)]
pub struct TransitionResponse {
    pub id: Uuid,
    pub status: BorrowStatus,
    pub previous_status: BorrowStatus,
}

/// Create a borrow request for an item
#[utoipa::path(
    post,
    path = "/borrow-requests",
    tag = "borrow",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRequestBody,
    responses(
        (status = 201, description = "Request created", body = BorrowRequestDetails),
        (status = 400, description = "Invalid return date or missing phone number"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item not available")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<CreateBorrowRequestBody>,
) -> AppResult<(StatusCode, Json<BorrowRequestDetails>)> {
    let details = state
        .services
        .borrow
        .create_request(CreateBorrowRequest {
            borrower_id: claims.user_id,
            item_id: body.item_id,
            requested_return_date: body.requested_return_date,
            request_message: body.request_message,
            video_url: body.video_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// Get a borrow request (parties only)
#[utoipa::path(
    get,
    path = "/borrow-requests/{id}",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow request ID")
    ),
    responses(
        (status = 200, description = "Borrow request", body = BorrowRequestDetails),
        (status = 403, description = "Not a party to this request"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<BorrowRequestDetails>> {
    let details = state
        .services
        .borrow
        .get_request(request_id, claims.user_id)
        .await?;
    Ok(Json(details))
}

/// Lifecycle history of a borrow request (parties only)
#[utoipa::path(
    get,
    path = "/borrow-requests/{id}/history",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow request ID")
    ),
    responses(
        (status = 200, description = "Audit entries, oldest first", body = Vec<AuditEntry>),
        (status = 403, description = "Not a party to this request"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request_history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let entries = state
        .services
        .borrow
        .get_history(request_id, claims.user_id)
        .await?;
    Ok(Json(entries))
}

/// List the current user's borrow requests (as borrower or lender)
#[utoipa::path(
    get,
    path = "/borrow-requests/mine",
    tag = "borrow",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests involving the current user", body = Vec<BorrowRequest>)
    )
)]
pub async fn list_my_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequest>>> {
    let requests = state.services.borrow.list_for_user(claims.user_id).await?;
    Ok(Json(requests))
}

/// Approve a pending request (lender only)
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/approve",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    request_body = ActionBody,
    responses(
        (status = 200, description = "Request approved", body = TransitionResponse),
        (status = 403, description = "Not the lender"),
        (status = 409, description = "Not pending, or item concurrently claimed")
    )
)]
pub async fn approve_request(
    state: State<AppState>,
    user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Option<Json<ActionBody>>,
) -> AppResult<Json<TransitionResponse>> {
    transition(state, user, path, body, BorrowAction::Approve).await
}

/// Decline a pending request (lender only)
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/decline",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    request_body = ActionBody,
    responses(
        (status = 200, description = "Request declined", body = TransitionResponse),
        (status = 403, description = "Not the lender"),
        (status = 409, description = "Not pending")
    )
)]
pub async fn decline_request(
    state: State<AppState>,
    user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Option<Json<ActionBody>>,
) -> AppResult<Json<TransitionResponse>> {
    transition(state, user, path, body, BorrowAction::Decline).await
}

/// Confirm pickup of an approved item (borrower only)
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/pickup",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Loan is now active", body = TransitionResponse),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Not approved")
    )
)]
pub async fn confirm_pickup(
    state: State<AppState>,
    user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Option<Json<ActionBody>>,
) -> AppResult<Json<TransitionResponse>> {
    transition(state, user, path, body, BorrowAction::ConfirmPickup).await
}

/// Return an active loan (borrower only)
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/return",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    request_body = ActionBody,
    responses(
        (status = 200, description = "Item returned", body = TransitionResponse),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Not active")
    )
)]
pub async fn return_request(
    state: State<AppState>,
    user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Option<Json<ActionBody>>,
) -> AppResult<Json<TransitionResponse>> {
    transition(state, user, path, body, BorrowAction::Return).await
}

/// Cancel a request (borrower, or lender while still pending)
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/cancel",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    request_body = ActionBody,
    responses(
        (status = 200, description = "Request cancelled", body = TransitionResponse),
        (status = 403, description = "Not allowed to cancel"),
        (status = 409, description = "Not cancellable from the current status")
    )
)]
pub async fn cancel_request(
    state: State<AppState>,
    user: AuthenticatedUser,
    path: Path<Uuid>,
    body: Option<Json<ActionBody>>,
) -> AppResult<Json<TransitionResponse>> {
    transition(state, user, path, body, BorrowAction::Cancel).await
}

async fn transition(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    body: Option<Json<ActionBody>>,
    action: BorrowAction,
) -> AppResult<Json<TransitionResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let (updated, previous_status) = state
        .services
        .borrow
        .apply_action(
            request_id,
            action,
            claims.user_id,
            body.message,
            body.actual_return_date,
        )
        .await?;

    Ok(Json(TransitionResponse {
        id: updated.id,
        status: updated.status,
        previous_status,
    }))
}
