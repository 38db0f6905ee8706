//! Borrow lifecycle service
//!
//! The request factory and the transition engine. All validation happens
//! before any write; the repository commits each transition atomically;
//! the side-effect dispatcher runs strictly after commit.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, CreateBorrowRequest},
        enums::{BorrowAction, BorrowStatus},
        item::Item,
        user::User,
    },
    repository::{audit::AuditEntry, Repository},
    services::{dispatcher::SideEffectDispatcher, lifecycle},
};

#[derive(Clone)]
pub struct BorrowService {
    repository: Repository,
    dispatcher: SideEffectDispatcher,
}

impl BorrowService {
    pub fn new(repository: Repository, dispatcher: SideEffectDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Create a new borrow request (status PENDING)
    ///
    /// Validations run in order, first failure wins; nothing is persisted
    /// unless all of them pass. The "request received" notification to
    /// the lender is best-effort and cannot fail the creation.
    pub async fn create_request(
        &self,
        input: CreateBorrowRequest,
    ) -> AppResult<BorrowRequestDetails> {
        let borrower = self.repository.users.get_by_id(input.borrower_id).await?;
        let item = self.repository.items.get_by_id(input.item_id).await?;

        if item.owner_id == input.borrower_id {
            return Err(AppError::InvalidOperation(
                "cannot borrow your own item".to_string(),
            ));
        }

        if !borrower.has_phone() {
            return Err(AppError::PreconditionFailed(
                "a phone number is required to request a borrow".to_string(),
            ));
        }

        lifecycle::validate_return_date(input.requested_return_date, Utc::now())?;

        if self
            .repository
            .borrow_requests
            .item_has_open_request(item.id)
            .await?
        {
            return Err(AppError::Conflict("item is not available".to_string()));
        }

        let lender = self.repository.users.get_by_id(item.owner_id).await?;

        let request = self
            .repository
            .borrow_requests
            .create(&input, item.owner_id)
            .await?;

        tracing::info!(
            "borrow request {} created for item {} by user {}",
            request.id,
            request.item_id,
            request.borrower_id
        );

        // The insert is committed; a failed re-read must not surface as a
        // failed creation. Fall back to the rows already in hand and skip
        // the side effects.
        let details = match self.repository.borrow_requests.get_details(request.id).await {
            Ok(details) => {
                self.dispatcher.request_created(&details).await;
                details
            }
            Err(e) => {
                tracing::warn!(
                    "borrow request {} committed but re-read failed, skipping side effects: {}",
                    request.id,
                    e
                );
                assemble_details(request, item, borrower, lender)
            }
        };

        Ok(details)
    }

    /// Apply a lifecycle action to a request
    ///
    /// Returns the updated request together with the status it left.
    pub async fn apply_action(
        &self,
        request_id: Uuid,
        action: BorrowAction,
        acting_user_id: Uuid,
        message: Option<String>,
        actual_return_date: Option<DateTime<Utc>>,
    ) -> AppResult<(BorrowRequest, BorrowStatus)> {
        let request = self.repository.borrow_requests.get_by_id(request_id).await?;

        let plan = lifecycle::plan(
            &request,
            action,
            acting_user_id,
            Utc::now(),
            message,
            actual_return_date,
        )?;
        let previous = plan.from;

        let updated = self
            .repository
            .borrow_requests
            .apply_transition(&plan)
            .await?;

        tracing::info!(
            "borrow request {} transitioned {} -> {} by user {}",
            updated.id,
            previous,
            updated.status,
            acting_user_id
        );

        // details re-read post-commit so notifications carry the new state;
        // the transition is already durable, so a failed re-read only costs
        // the side effects, never the response
        match self.repository.borrow_requests.get_details(updated.id).await {
            Ok(details) => {
                self.dispatcher
                    .transitioned(&details, previous, acting_user_id)
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    "borrow request {} committed but re-read failed, skipping side effects: {}",
                    updated.id,
                    e
                );
            }
        }

        Ok((updated, previous))
    }

    /// Get a request with relations; only its parties may see it
    pub async fn get_request(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<BorrowRequestDetails> {
        let details = self.repository.borrow_requests.get_details(request_id).await?;

        if acting_user_id != details.request.borrower_id
            && acting_user_id != details.request.lender_id
        {
            return Err(AppError::Forbidden(
                "not a party to this borrow request".to_string(),
            ));
        }

        Ok(details)
    }

    /// List requests where the user is borrower or lender
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowRequest>> {
        self.repository.borrow_requests.list_for_user(user_id).await
    }

    /// Audit history of a request, oldest first; only its parties may see it
    pub async fn get_history(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<Vec<AuditEntry>> {
        let request = self.repository.borrow_requests.get_by_id(request_id).await?;

        if acting_user_id != request.borrower_id && acting_user_id != request.lender_id {
            return Err(AppError::Forbidden(
                "not a party to this borrow request".to_string(),
            ));
        }

        self.repository.audit.list_for_request(request_id).await
    }
}

/// Details payload from rows already in hand, for the path where the
/// post-commit re-read fails
fn assemble_details(
    request: BorrowRequest,
    item: Item,
    borrower: User,
    lender: User,
) -> BorrowRequestDetails {
    BorrowRequestDetails {
        request,
        item: item.into(),
        borrower: borrower.into(),
        lender: lender.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: u128, name: &str) -> User {
        User {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            email: format!("{}@example.org", name),
            phone: Some("+15555550100".to_string()),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn assembled_details_match_the_committed_rows() {
        let now = Utc::now();
        let borrower = user(1, "borrower");
        let lender = user(2, "lender");
        let item = Item {
            id: Uuid::from_u128(20),
            owner_id: lender.id,
            name: "Pressure washer".to_string(),
            description: None,
            condition: None,
            image_url: None,
            current_borrow_request_id: None,
            created_at: now,
            updated_at: now,
        };
        let request = BorrowRequest {
            id: Uuid::from_u128(10),
            item_id: item.id,
            borrower_id: borrower.id,
            lender_id: lender.id,
            status: BorrowStatus::Pending,
            request_message: Some("may I?".to_string()),
            lender_message: None,
            borrower_notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            video_url: None,
            requested_return_date: now + Duration::days(30),
            created_at: now,
            approved_at: None,
            declined_at: None,
            returned_at: None,
            cancelled_at: None,
        };

        let details = assemble_details(request, item, borrower, lender);

        assert_eq!(details.request.id, Uuid::from_u128(10));
        assert_eq!(details.request.status, BorrowStatus::Pending);
        assert_eq!(details.item.id, Uuid::from_u128(20));
        assert!(details.item.available);
        assert_eq!(details.borrower.id, Uuid::from_u128(1));
        assert_eq!(details.lender.id, Uuid::from_u128(2));
    }
}
