//! Items repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::item::{CreateItem, Item, ItemShort, UpdateItem},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// List all items, available ones first
    pub async fn list(&self) -> AppResult<Vec<ItemShort>> {
        let items = sqlx::query_as::<_, ItemShort>(
            r#"
            SELECT id, owner_id, name, image_url,
                   (current_borrow_request_id IS NULL) as available
            FROM items
            ORDER BY current_borrow_request_id IS NULL DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// List items owned by a user
    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ItemShort>> {
        let items = sqlx::query_as::<_, ItemShort>(
            r#"
            SELECT id, owner_id, name, image_url,
                   (current_borrow_request_id IS NULL) as available
            FROM items
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Create a new item
    pub async fn create(&self, owner_id: Uuid, item: &CreateItem) -> AppResult<Item> {
        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, owner_id, name, description, condition, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.condition)
        .bind(&item.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update item fields (partial)
    pub async fn update(&self, id: Uuid, item: &UpdateItem) -> AppResult<Item> {
        let updated = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                condition = COALESCE($3, condition),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.condition)
        .bind(&item.image_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete an item; refused while a request holds it
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let item = self.get_by_id(id).await?;

        if item.current_borrow_request_id.is_some() {
            return Err(AppError::Conflict(
                "item is currently borrowed and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
