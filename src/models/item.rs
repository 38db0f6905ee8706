//! Item (shared object) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Item model from database
///
/// `current_borrow_request_id` is the availability marker: null when the
/// item is free, otherwise the id of the APPROVED/ACTIVE request holding
/// it. Only the borrow transition engine writes it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub image_url: Option<String>,
    pub current_borrow_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_available(&self) -> bool {
        self.current_borrow_request_id.is_none()
    }
}

/// Short item representation for embedding in other payloads
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemShort {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub available: bool,
}

impl From<Item> for ItemShort {
    fn from(item: Item) -> Self {
        Self {
            available: item.is_available(),
            id: item.id,
            owner_id: item.owner_id,
            name: item.name,
            image_url: item.image_url,
        }
    }
}

/// Create item request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub condition: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Update item request (partial)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub condition: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}
