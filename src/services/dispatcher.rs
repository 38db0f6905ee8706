//! Side-effect dispatcher
//!
//! Runs after a creation or transition has already committed. Sequences
//! the audit entry and the outbound notification; each is individually
//! isolated so a failing SMS gateway or audit write can never surface to
//! the caller of the borrow service.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    models::{
        borrow_request::BorrowRequestDetails,
        enums::BorrowStatus,
        user::UserShort,
    },
    repository::audit::{AuditEntry, AuditSink},
    services::notifications::{Notifier, Recipient},
};

#[derive(Clone)]
pub struct SideEffectDispatcher {
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
}

impl SideEffectDispatcher {
    pub fn new(audit: Arc<dyn AuditSink>, notifier: Arc<dyn Notifier>) -> Self {
        Self { audit, notifier }
    }

    /// Side effects of a freshly created request: audit it and tell the
    /// lender someone wants their item
    pub async fn request_created(&self, details: &BorrowRequestDetails) {
        let req = &details.request;

        self.record(AuditEntry {
            request_id: req.id,
            item_id: req.item_id,
            actor_id: req.borrower_id,
            from_status: None,
            to_status: BorrowStatus::Pending,
            note: format!("{} requested to borrow \"{}\"", details.borrower.name, details.item.name),
            occurred_at: req.created_at,
        })
        .await;

        let body = format!(
            "Hi {}, {} would like to borrow your \"{}\" until {}. Open StuffLibrary to respond.",
            details.lender.name,
            details.borrower.name,
            details.item.name,
            req.requested_return_date.format("%Y-%m-%d"),
        );
        self.notify(&details.lender, "New borrow request", &body).await;
    }

    /// Side effects of a committed transition: audit it and notify the
    /// counterpart of the acting user
    pub async fn transitioned(
        &self,
        details: &BorrowRequestDetails,
        from: BorrowStatus,
        actor_id: Uuid,
    ) {
        let req = &details.request;

        self.record(AuditEntry {
            request_id: req.id,
            item_id: req.item_id,
            actor_id,
            from_status: Some(from),
            to_status: req.status,
            note: format!("status {} -> {}", from, req.status),
            occurred_at: Utc::now(),
        })
        .await;

        let item = &details.item.name;
        let (recipient, subject, body) = match req.status {
            BorrowStatus::Approved => (
                &details.borrower,
                "Borrow request approved",
                match req.lender_message.as_deref() {
                    Some(msg) => format!(
                        "{} approved your request for \"{}\": {}",
                        details.lender.name, item, msg
                    ),
                    None => format!(
                        "{} approved your request for \"{}\".",
                        details.lender.name, item
                    ),
                },
            ),
            BorrowStatus::Declined => (
                &details.borrower,
                "Borrow request declined",
                match req.lender_message.as_deref() {
                    Some(msg) => format!(
                        "{} declined your request for \"{}\": {}",
                        details.lender.name, item, msg
                    ),
                    None => format!(
                        "{} declined your request for \"{}\".",
                        details.lender.name, item
                    ),
                },
            ),
            BorrowStatus::Active => (
                &details.lender,
                "Item picked up",
                format!(
                    "{} confirmed pickup of \"{}\". Expected back by {}.",
                    details.borrower.name,
                    item,
                    req.requested_return_date.format("%Y-%m-%d"),
                ),
            ),
            BorrowStatus::Returned => (
                &details.lender,
                "Item returned",
                match req.borrower_notes.as_deref() {
                    Some(notes) => format!(
                        "{} returned your \"{}\": {}",
                        details.borrower.name, item, notes
                    ),
                    None => format!("{} returned your \"{}\".", details.borrower.name, item),
                },
            ),
            BorrowStatus::Cancelled => {
                // notify whichever party did not cancel
                let (who, counterpart) = if actor_id == req.borrower_id {
                    (&details.borrower, &details.lender)
                } else {
                    (&details.lender, &details.borrower)
                };
                (
                    counterpart,
                    "Borrow request cancelled",
                    match req.cancellation_reason.as_deref() {
                        Some(reason) => format!(
                            "{} cancelled the request for \"{}\": {}",
                            who.name, item, reason
                        ),
                        None => format!("{} cancelled the request for \"{}\".", who.name, item),
                    },
                )
            }
            BorrowStatus::Pending => return,
        };

        self.notify(recipient, subject, &body).await;
    }

    async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(&entry).await {
            tracing::warn!(
                "audit log write failed for request {}: {}",
                entry.request_id,
                e
            );
        }
    }

    async fn notify(&self, user: &UserShort, subject: &str, body: &str) {
        let recipient = Recipient {
            name: user.name.clone(),
            phone: user.phone.clone(),
            email: Some(user.email.clone()),
        };
        if let Err(e) = self.notifier.deliver(&recipient, subject, body).await {
            tracing::warn!("notification to {} failed: {}", user.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::borrow_request::BorrowRequest;
    use crate::models::item::ItemShort;
    use crate::repository::audit::MockAuditSink;
    use crate::services::notifications::MockNotifier;
    use chrono::Duration;

    fn details(status: BorrowStatus) -> BorrowRequestDetails {
        let now = Utc::now();
        let borrower_id = Uuid::from_u128(1);
        let lender_id = Uuid::from_u128(2);
        let item_id = Uuid::from_u128(20);
        BorrowRequestDetails {
            request: BorrowRequest {
                id: Uuid::from_u128(10),
                item_id,
                borrower_id,
                lender_id,
                status,
                request_message: None,
                lender_message: None,
                borrower_notes: None,
                cancellation_reason: None,
                cancelled_by: None,
                video_url: None,
                requested_return_date: now + Duration::days(14),
                created_at: now,
                approved_at: None,
                declined_at: None,
                returned_at: None,
                cancelled_at: None,
            },
            item: ItemShort {
                id: item_id,
                owner_id: lender_id,
                name: "Cordless drill".to_string(),
                image_url: None,
                available: true,
            },
            borrower: UserShort {
                id: borrower_id,
                name: "Billie".to_string(),
                email: "billie@example.org".to_string(),
                phone: Some("+15555550100".to_string()),
            },
            lender: UserShort {
                id: lender_id,
                name: "Lou".to_string(),
                email: "lou@example.org".to_string(),
                phone: None,
            },
        }
    }

    #[tokio::test]
    async fn notifier_failure_is_swallowed() {
        let mut audit = MockAuditSink::new();
        audit.expect_record().times(1).returning(|_| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_deliver()
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("gateway down".to_string())));

        let dispatcher = SideEffectDispatcher::new(Arc::new(audit), Arc::new(notifier));
        let d = details(BorrowStatus::Approved);

        // must complete without panicking or surfacing the error
        dispatcher
            .transitioned(&d, BorrowStatus::Pending, d.request.lender_id)
            .await;
    }

    #[tokio::test]
    async fn audit_failure_does_not_block_notification() {
        let mut audit = MockAuditSink::new();
        audit
            .expect_record()
            .times(1)
            .returning(|_| Err(AppError::Internal("log table gone".to_string())));

        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().times(1).returning(|_, _, _| Ok(()));

        let dispatcher = SideEffectDispatcher::new(Arc::new(audit), Arc::new(notifier));
        let d = details(BorrowStatus::Returned);

        dispatcher
            .transitioned(&d, BorrowStatus::Active, d.request.borrower_id)
            .await;
    }

    #[tokio::test]
    async fn cancellation_notifies_the_other_party() {
        let mut audit = MockAuditSink::new();
        audit.expect_record().returning(|_| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_deliver()
            .withf(|recipient, _, _| recipient.name == "Lou")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dispatcher = SideEffectDispatcher::new(Arc::new(audit), Arc::new(notifier));
        let d = details(BorrowStatus::Cancelled);

        // borrower cancelled, so the lender hears about it
        dispatcher
            .transitioned(&d, BorrowStatus::Pending, d.request.borrower_id)
            .await;
    }

    #[tokio::test]
    async fn creation_notifies_the_lender() {
        let mut audit = MockAuditSink::new();
        audit
            .expect_record()
            .withf(|entry| entry.from_status.is_none() && entry.to_status == BorrowStatus::Pending)
            .times(1)
            .returning(|_| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_deliver()
            .withf(|recipient, _, body| recipient.name == "Lou" && body.contains("Cordless drill"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dispatcher = SideEffectDispatcher::new(Arc::new(audit), Arc::new(notifier));
        let d = details(BorrowStatus::Pending);

        dispatcher.request_created(&d).await;
    }
}
