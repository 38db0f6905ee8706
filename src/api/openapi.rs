//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, borrow_requests, health, items, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StuffLibrary API",
        version = "0.1.0",
        description = "Neighborhood item sharing REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "StuffLibrary Team", email = "contact@stufflibrary.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Users
        users::get_user,
        users::list_user_items,
        users::update_my_phone,
        // Borrow requests
        borrow_requests::create_request,
        borrow_requests::get_request,
        borrow_requests::get_request_history,
        borrow_requests::list_my_requests,
        borrow_requests::approve_request,
        borrow_requests::decline_request,
        borrow_requests::confirm_pickup,
        borrow_requests::return_request,
        borrow_requests::cancel_request,
    ),
    components(schemas(
        health::HealthResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        users::UpdatePhoneRequest,
        borrow_requests::CreateBorrowRequestBody,
        borrow_requests::ActionBody,
        borrow_requests::TransitionResponse,
        crate::error::ErrorResponse,
        crate::repository::audit::AuditEntry,
        crate::models::borrow_request::BorrowRequest,
        crate::models::borrow_request::BorrowRequestDetails,
        crate::models::enums::BorrowStatus,
        crate::models::enums::BorrowAction,
        crate::models::item::Item,
        crate::models::item::ItemShort,
        crate::models::item::CreateItem,
        crate::models::item::UpdateItem,
        crate::models::user::User,
        crate::models::user::UserShort,
        crate::models::user::CreateUser,
    ))
)]
pub struct ApiDoc;

/// Create the Swagger UI router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
