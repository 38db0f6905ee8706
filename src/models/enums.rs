//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// BorrowStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a borrow request
///
/// Stored as the Postgres enum `borrow_status`. Terminal statuses are
/// DECLINED, RETURNED and CANCELLED; ACTIVE is reachable only from APPROVED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "borrow_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BorrowStatus {
    Pending,
    Approved,
    Declined,
    Active,
    Returned,
    Cancelled,
}

impl BorrowStatus {
    /// A terminal request can never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BorrowStatus::Declined | BorrowStatus::Returned | BorrowStatus::Cancelled
        )
    }

    /// Whether a request in this status holds the item's availability marker
    pub fn holds_item(&self) -> bool {
        matches!(self, BorrowStatus::Approved | BorrowStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "PENDING",
            BorrowStatus::Approved => "APPROVED",
            BorrowStatus::Declined => "DECLINED",
            BorrowStatus::Active => "ACTIVE",
            BorrowStatus::Returned => "RETURNED",
            BorrowStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BorrowAction
// ---------------------------------------------------------------------------

/// User-requested action on a borrow request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BorrowAction {
    Approve,
    Decline,
    ConfirmPickup,
    Return,
    Cancel,
}

impl BorrowAction {
    /// The status this action drives a request into
    pub fn target_status(&self) -> BorrowStatus {
        match self {
            BorrowAction::Approve => BorrowStatus::Approved,
            BorrowAction::Decline => BorrowStatus::Declined,
            BorrowAction::ConfirmPickup => BorrowStatus::Active,
            BorrowAction::Return => BorrowStatus::Returned,
            BorrowAction::Cancel => BorrowStatus::Cancelled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowAction::Approve => "approve",
            BorrowAction::Decline => "decline",
            BorrowAction::ConfirmPickup => "confirm pickup of",
            BorrowAction::Return => "return",
            BorrowAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for BorrowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!BorrowStatus::Pending.is_terminal());
        assert!(!BorrowStatus::Approved.is_terminal());
        assert!(!BorrowStatus::Active.is_terminal());
        assert!(BorrowStatus::Declined.is_terminal());
        assert!(BorrowStatus::Returned.is_terminal());
        assert!(BorrowStatus::Cancelled.is_terminal());
    }

    #[test]
    fn availability_affecting_statuses() {
        assert!(BorrowStatus::Approved.holds_item());
        assert!(BorrowStatus::Active.holds_item());
        assert!(!BorrowStatus::Pending.holds_item());
        assert!(!BorrowStatus::Returned.holds_item());
    }
}
