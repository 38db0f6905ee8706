//! Business logic services

pub mod borrow;
pub mod dispatcher;
pub mod items;
pub mod lifecycle;
pub mod notifications;
pub mod users;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig, SmsConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub items: items::ItemsService,
    pub borrow: borrow::BorrowService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        sms_config: SmsConfig,
    ) -> Self {
        let notifier = notifications::NotificationService::new(email_config, sms_config);
        let dispatcher = dispatcher::SideEffectDispatcher::new(
            Arc::new(repository.audit.clone()),
            Arc::new(notifier),
        );

        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            items: items::ItemsService::new(repository.clone()),
            borrow: borrow::BorrowService::new(repository, dispatcher),
        }
    }
}
