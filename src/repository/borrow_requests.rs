//! Borrow requests repository for database operations
//!
//! Owns the atomic transition commit: the request status update and the
//! item availability-marker update always land in one transaction, each
//! guarded by a compare-and-set WHERE clause. The partial unique index
//! on (item_id) for APPROVED/ACTIVE rows backs the same invariant at the
//! schema level, so the loser of a race sees a conflict, never a
//! double-booked item.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, CreateBorrowRequest, MarkerEffect, TransitionPlan},
        enums::BorrowStatus,
        item::ItemShort,
        user::UserShort,
    },
};

#[derive(Clone)]
pub struct BorrowRequestsRepository {
    pool: Pool<Postgres>,
}

impl BorrowRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request {} not found", id)))
    }

    /// Get borrow request with item/borrower/lender relations
    pub async fn get_details(&self, id: Uuid) -> AppResult<BorrowRequestDetails> {
        let request = self.get_by_id(id).await?;

        let item = sqlx::query_as::<_, ItemShort>(
            r#"
            SELECT id, owner_id, name, image_url,
                   (current_borrow_request_id IS NULL) as available
            FROM items WHERE id = $1
            "#,
        )
        .bind(request.item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", request.item_id)))?;

        let borrower = self.get_party(request.borrower_id).await?;
        let lender = self.get_party(request.lender_id).await?;

        Ok(BorrowRequestDetails {
            request,
            item,
            borrower,
            lender,
        })
    }

    async fn get_party(&self, user_id: Uuid) -> AppResult<UserShort> {
        sqlx::query_as::<_, UserShort>("SELECT id, name, email, phone FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Whether the item already has an APPROVED or ACTIVE request
    pub async fn item_has_open_request(&self, item_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_requests
                WHERE item_id = $1 AND status IN ('APPROVED', 'ACTIVE')
            )
            "#,
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new PENDING request
    pub async fn create(&self, req: &CreateBorrowRequest, lender_id: Uuid) -> AppResult<BorrowRequest> {
        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests
                (id, item_id, borrower_id, lender_id, status,
                 request_message, video_url, requested_return_date)
            VALUES ($1, $2, $3, $4, 'PENDING', $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.item_id)
        .bind(req.borrower_id)
        .bind(lender_id)
        .bind(&req.request_message)
        .bind(&req.video_url)
        .bind(req.requested_return_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(request)
    }

    /// List requests where the user is borrower or lender
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowRequest>> {
        let requests = sqlx::query_as::<_, BorrowRequest>(
            r#"
            SELECT * FROM borrow_requests
            WHERE borrower_id = $1 OR lender_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Commit a planned transition atomically
    ///
    /// The status update is guarded by `AND status = <from>`; the marker
    /// claim is guarded by `AND current_borrow_request_id IS NULL`. Zero
    /// rows affected on either means a concurrent transition won, and the
    /// whole unit rolls back with a conflict.
    pub async fn apply_transition(&self, plan: &TransitionPlan) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let query = match plan.to {
            BorrowStatus::Approved => sqlx::query_as::<_, BorrowRequest>(
                r#"
                UPDATE borrow_requests
                SET status = 'APPROVED', approved_at = $1, lender_message = $2
                WHERE id = $3 AND status = $4
                RETURNING *
                "#,
            )
            .bind(plan.occurred_at)
            .bind(&plan.message)
            .bind(plan.request_id)
            .bind(plan.from),
            BorrowStatus::Declined => sqlx::query_as::<_, BorrowRequest>(
                r#"
                UPDATE borrow_requests
                SET status = 'DECLINED', declined_at = $1, lender_message = $2
                WHERE id = $3 AND status = $4
                RETURNING *
                "#,
            )
            .bind(plan.occurred_at)
            .bind(&plan.message)
            .bind(plan.request_id)
            .bind(plan.from),
            BorrowStatus::Active => sqlx::query_as::<_, BorrowRequest>(
                r#"
                UPDATE borrow_requests
                SET status = 'ACTIVE'
                WHERE id = $1 AND status = $2
                RETURNING *
                "#,
            )
            .bind(plan.request_id)
            .bind(plan.from),
            BorrowStatus::Returned => sqlx::query_as::<_, BorrowRequest>(
                r#"
                UPDATE borrow_requests
                SET status = 'RETURNED', returned_at = $1, borrower_notes = $2
                WHERE id = $3 AND status = $4
                RETURNING *
                "#,
            )
            .bind(plan.occurred_at)
            .bind(&plan.message)
            .bind(plan.request_id)
            .bind(plan.from),
            BorrowStatus::Cancelled => sqlx::query_as::<_, BorrowRequest>(
                r#"
                UPDATE borrow_requests
                SET status = 'CANCELLED', cancelled_at = $1,
                    cancelled_by = $2, cancellation_reason = $3
                WHERE id = $4 AND status = $5
                RETURNING *
                "#,
            )
            .bind(plan.occurred_at)
            .bind(plan.cancelled_by)
            .bind(&plan.message)
            .bind(plan.request_id)
            .bind(plan.from),
            BorrowStatus::Pending => {
                return Err(AppError::Internal(
                    "transition back to PENDING is never planned".to_string(),
                ))
            }
        };

        let updated = query
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| {
                AppError::Conflict("request was modified by a concurrent transition".to_string())
            })?;

        match plan.marker {
            MarkerEffect::Claim => {
                let res = sqlx::query(
                    r#"
                    UPDATE items
                    SET current_borrow_request_id = $1, updated_at = NOW()
                    WHERE id = $2 AND current_borrow_request_id IS NULL
                    "#,
                )
                .bind(plan.request_id)
                .bind(plan.item_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;

                if res.rows_affected() == 0 {
                    // dropping the transaction rolls back the status update
                    return Err(AppError::Conflict("item is not available".to_string()));
                }
            }
            MarkerEffect::Release | MarkerEffect::ReleaseIfHeld => {
                sqlx::query(
                    r#"
                    UPDATE items
                    SET current_borrow_request_id = NULL, updated_at = NOW()
                    WHERE id = $1 AND current_borrow_request_id = $2
                    "#,
                )
                .bind(plan.item_id)
                .bind(plan.request_id)
                .execute(&mut *tx)
                .await?;
            }
            MarkerEffect::Keep => {}
        }

        tx.commit().await?;

        Ok(updated)
    }
}

/// Map a unique-constraint violation (the partial APPROVED/ACTIVE index)
/// to a conflict the caller can act on
fn map_db_err(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return AppError::Conflict("item is not available".to_string());
        }
    }
    AppError::Database(e)
}
