//! User endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{item::ItemShort, user::UserShort},
};

use super::AuthenticatedUser;

/// Update phone request
#[derive(Deserialize, ToSchema)]
pub struct UpdatePhoneRequest {
    pub phone: String,
}

/// Get a user's public profile
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserShort),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserShort>> {
    let user = state.services.users.get(user_id).await?;
    Ok(Json(user.into()))
}

/// List items shared by a user
#[utoipa::path(
    get,
    path = "/users/{id}/items",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's items", body = Vec<ItemShort>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_items(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<ItemShort>>> {
    let items = state.services.items.list_by_owner(user_id).await?;
    Ok(Json(items))
}

/// Update the current user's phone number
#[utoipa::path(
    put,
    path = "/users/me/phone",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdatePhoneRequest,
    responses(
        (status = 200, description = "Phone updated", body = UserShort),
        (status = 400, description = "Invalid phone number")
    )
)]
pub async fn update_my_phone(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdatePhoneRequest>,
) -> AppResult<Json<UserShort>> {
    let user = state
        .services
        .users
        .update_phone(claims.user_id, &request.phone)
        .await?;
    Ok(Json(user.into()))
}
