//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::BorrowStatus;
use super::item::ItemShort;
use super::user::UserShort;

/// Borrow request model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Uuid,
    pub status: BorrowStatus,
    pub request_message: Option<String>,
    pub lender_message: Option<String>,
    pub borrower_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub video_url: Option<String>,
    pub requested_return_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub declined_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Borrow request with borrower/lender/item relations for display
/// and notification content
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowRequestDetails {
    #[serde(flatten)]
    pub request: BorrowRequest,
    pub item: ItemShort,
    pub borrower: UserShort,
    pub lender: UserShort,
}

/// Effect a committed transition has on the item's availability marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEffect {
    /// Point the marker at this request; fails with a conflict if the
    /// item is already held
    Claim,
    /// Clear the marker held by this request
    Release,
    /// Clear the marker only if it points at this request
    ReleaseIfHeld,
    /// Leave the marker untouched
    Keep,
}

/// A validated status transition, ready to be committed atomically
///
/// Produced by the lifecycle planner; the repository applies the request
/// update and the marker effect in one database transaction.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub from: BorrowStatus,
    pub to: BorrowStatus,
    pub occurred_at: DateTime<Utc>,
    /// lender_message, borrower_notes or cancellation_reason,
    /// depending on the target status
    pub message: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub marker: MarkerEffect,
}

/// Create borrow request input (borrower id comes from the session)
#[derive(Debug, Clone)]
pub struct CreateBorrowRequest {
    pub borrower_id: Uuid,
    pub item_id: Uuid,
    pub requested_return_date: DateTime<Utc>,
    pub request_message: Option<String>,
    pub video_url: Option<String>,
}
