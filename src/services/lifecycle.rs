//! Borrow lifecycle state machine
//!
//! Pure planning of status transitions: given the loaded request, the
//! requested action and the acting user, produce a [`TransitionPlan`] or
//! the precise error. No I/O happens here; the repository commits the
//! plan atomically afterwards.
//!
//! ```text
//! PENDING  --approve-->         APPROVED   [lender]
//! PENDING  --decline-->         DECLINED   [lender]
//! PENDING  --cancel-->          CANCELLED  [borrower or lender]
//! APPROVED --cancel-->          CANCELLED  [borrower only]
//! APPROVED --confirm_pickup-->  ACTIVE     [borrower]
//! ACTIVE   --return-->          RETURNED   [borrower]
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow_request::{BorrowRequest, MarkerEffect, TransitionPlan},
        enums::{BorrowAction, BorrowStatus},
    },
};

/// Validate and plan a transition
///
/// Authorization is checked before transition legality, so a stranger
/// always sees `Forbidden` and a legitimate party acting out of turn
/// sees `InvalidTransition`.
pub fn plan(
    request: &BorrowRequest,
    action: BorrowAction,
    acting_user_id: Uuid,
    now: DateTime<Utc>,
    message: Option<String>,
    actual_return_date: Option<DateTime<Utc>>,
) -> AppResult<TransitionPlan> {
    let is_borrower = acting_user_id == request.borrower_id;
    let is_lender = acting_user_id == request.lender_id;

    let illegal = || AppError::InvalidTransition {
        from: request.status,
        action,
    };

    let (occurred_at, message, cancelled_by, marker) = match action {
        BorrowAction::Approve => {
            if !is_lender {
                return Err(AppError::Forbidden(
                    "only the lender may approve a request".to_string(),
                ));
            }
            if request.status != BorrowStatus::Pending {
                return Err(illegal());
            }
            (now, message, None, MarkerEffect::Claim)
        }
        BorrowAction::Decline => {
            if !is_lender {
                return Err(AppError::Forbidden(
                    "only the lender may decline a request".to_string(),
                ));
            }
            if request.status != BorrowStatus::Pending {
                return Err(illegal());
            }
            // a PENDING request never set the marker, leave it alone
            (now, message, None, MarkerEffect::Keep)
        }
        BorrowAction::ConfirmPickup => {
            if !is_borrower {
                return Err(AppError::Forbidden(
                    "only the borrower may confirm pickup".to_string(),
                ));
            }
            if request.status != BorrowStatus::Approved {
                return Err(illegal());
            }
            // the marker already points at this request since approval
            (now, None, None, MarkerEffect::Keep)
        }
        BorrowAction::Return => {
            if !is_borrower {
                return Err(AppError::Forbidden(
                    "only the borrower may return an item".to_string(),
                ));
            }
            if request.status != BorrowStatus::Active {
                return Err(illegal());
            }
            (
                actual_return_date.unwrap_or(now),
                message,
                None,
                MarkerEffect::Release,
            )
        }
        BorrowAction::Cancel => {
            if is_borrower {
                if !matches!(
                    request.status,
                    BorrowStatus::Pending | BorrowStatus::Approved
                ) {
                    return Err(illegal());
                }
            } else if is_lender {
                match request.status {
                    BorrowStatus::Pending => {}
                    // an approved loan is a commitment the lender cannot walk back
                    BorrowStatus::Approved => {
                        return Err(AppError::Forbidden(
                            "the lender may not cancel an approved request".to_string(),
                        ))
                    }
                    _ => return Err(illegal()),
                }
            } else {
                return Err(AppError::Forbidden(
                    "only the borrower or the lender may cancel a request".to_string(),
                ));
            }
            (
                now,
                message,
                Some(acting_user_id),
                MarkerEffect::ReleaseIfHeld,
            )
        }
    };

    Ok(TransitionPlan {
        request_id: request.id,
        item_id: request.item_id,
        from: request.status,
        to: action.target_status(),
        occurred_at,
        message,
        cancelled_by,
        marker,
    })
}

/// Requested return dates must be strictly in the future
pub fn validate_return_date(requested: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if requested <= now {
        return Err(AppError::InvalidArgument(
            "return date must be in the future".to_string(),
        ));
    }
    Ok(())
}
