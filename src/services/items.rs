//! Item management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::item::{CreateItem, Item, ItemShort, UpdateItem},
    repository::Repository,
};

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
}

impl ItemsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all shared items
    pub async fn list(&self) -> AppResult<Vec<ItemShort>> {
        self.repository.items.list().await
    }

    /// List items owned by a user
    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ItemShort>> {
        self.repository.users.get_by_id(owner_id).await?;
        self.repository.items.list_by_owner(owner_id).await
    }

    /// Get a single item
    pub async fn get(&self, id: Uuid) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    /// Create a new item owned by the acting user
    pub async fn create(&self, owner_id: Uuid, item: CreateItem) -> AppResult<Item> {
        self.repository.items.create(owner_id, &item).await
    }

    /// Update an item; only the owner may
    pub async fn update(&self, id: Uuid, acting_user_id: Uuid, item: UpdateItem) -> AppResult<Item> {
        let existing = self.repository.items.get_by_id(id).await?;
        if existing.owner_id != acting_user_id {
            return Err(AppError::Forbidden(
                "only the owner may update an item".to_string(),
            ));
        }
        self.repository.items.update(id, &item).await
    }

    /// Delete an item; only the owner may, and not while it is borrowed
    pub async fn delete(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<()> {
        let existing = self.repository.items.get_by_id(id).await?;
        if existing.owner_id != acting_user_id {
            return Err(AppError::Forbidden(
                "only the owner may delete an item".to_string(),
            ));
        }
        self.repository.items.delete(id).await
    }
}
