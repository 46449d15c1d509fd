use super::{db, from_ts, to_ts, SqliteStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::models::{Collection, CollectionId, NewCollection, PostId};
use domains::traits::CollectionRepo;
use domains::{DomainError, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const COLLECTION_COLUMNS: &str = "id, title, slug, description, created_at, updated_at";

fn map_collection(row: &SqliteRow) -> Collection {
    Collection {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: from_ts(row.get("created_at")),
        updated_at: from_ts(row.get("updated_at")),
    }
}

#[async_trait]
impl CollectionRepo for SqliteStore {
    async fn insert_collection(&self, collection: NewCollection) -> Result<Collection> {
        let created = to_ts(collection.created_at);
        let id = sqlx::query(
            "INSERT INTO collections (title, slug, description, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&collection.title)
        .bind(&collection.slug)
        .bind(&collection.description)
        .bind(created)
        .bind(created)
        .execute(&self.pool)
        .await
        .map_err(db)?
        .last_insert_rowid();

        self.get_collection(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("collection {id} vanished after insert")))
    }

    async fn get_collection(&self, id: CollectionId) -> Result<Option<Collection>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.as_ref().map(map_collection))
    }

    async fn get_collection_by_slug(&self, slug: &str) -> Result<Option<Collection>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE slug = ?");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.as_ref().map(map_collection))
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY title ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        Ok(rows.iter().map(map_collection).collect())
    }

    async fn update_collection(&self, collection: &Collection) -> Result<()> {
        sqlx::query(
            "UPDATE collections SET title = ?, slug = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&collection.title)
        .bind(&collection.slug)
        .bind(&collection.description)
        .bind(to_ts(collection.updated_at))
        .bind(collection.id)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn delete_collection(&self, id: CollectionId) -> Result<bool> {
        // Memberships first so the delete does not depend on the foreign_keys pragma.
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query("DELETE FROM collection_posts WHERE collection_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_post(&self, id: CollectionId, post_id: PostId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO collection_posts (collection_id, post_id, added_at) VALUES (?, ?, ?) \
             ON CONFLICT (collection_id, post_id) DO NOTHING",
        )
        .bind(id)
        .bind(post_id)
        .bind(to_ts(at))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn remove_post(&self, id: CollectionId, post_id: PostId) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM collection_posts WHERE collection_id = ? AND post_id = ?")
                .bind(id)
                .bind(post_id)
                .execute(&self.pool)
                .await
                .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }
}
