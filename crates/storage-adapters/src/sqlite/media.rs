use super::{db, from_ts, to_ts, SqliteStore};
use async_trait::async_trait;
use domains::models::{Media, MediaId, NewMedia};
use domains::traits::MediaRepo;
use domains::{DomainError, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const MEDIA_COLUMNS: &str =
    "id, filename, original_name, mime_type, size, r2_key, width, height, alt, created_at";

fn map_media(row: &SqliteRow) -> Media {
    Media {
        id: row.get("id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        r2_key: row.get("r2_key"),
        width: row.get("width"),
        height: row.get("height"),
        alt: row.get("alt"),
        created_at: from_ts(row.get("created_at")),
    }
}

#[async_trait]
impl MediaRepo for SqliteStore {
    async fn insert_media(&self, media: NewMedia) -> Result<Media> {
        let id = sqlx::query(
            "INSERT INTO media (filename, original_name, mime_type, size, r2_key, width, height, \
             alt, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&media.filename)
        .bind(&media.original_name)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.r2_key)
        .bind(media.width)
        .bind(media.height)
        .bind(&media.alt)
        .bind(to_ts(media.created_at))
        .execute(&self.pool)
        .await
        .map_err(db)?
        .last_insert_rowid();

        self.get_media(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("media {id} vanished after insert")))
    }

    async fn get_media(&self, id: MediaId) -> Result<Option<Media>> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.as_ref().map(map_media))
    }

    async fn list_media(&self, limit: u32, offset: u32) -> Result<Vec<Media>> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        Ok(rows.iter().map(map_media).collect())
    }

    async fn delete_media(&self, id: MediaId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn new_media(key: &str, created: i64) -> NewMedia {
        NewMedia {
            filename: format!("{key}.png"),
            original_name: "photo.png".into(),
            mime_type: "image/png".into(),
            size: 42,
            r2_key: format!("media/2024/01/{key}.png"),
            width: Some(3),
            height: Some(2),
            alt: None,
            created_at: DateTime::from_timestamp(created, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first_with_offset() {
        let store = SqliteStore::in_memory().await.unwrap();
        let a = store.insert_media(new_media("a", 1)).await.unwrap();
        let b = store.insert_media(new_media("b", 2)).await.unwrap();
        let c = store.insert_media(new_media("c", 3)).await.unwrap();
        assert_eq!(c.width, Some(3));

        let page = store.list_media(2, 0).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![c.id, b.id]);
        let rest = store.list_media(2, 2).await.unwrap();
        assert_eq!(rest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![a.id]);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let store = SqliteStore::in_memory().await.unwrap();
        let m = store.insert_media(new_media("x", 1)).await.unwrap();
        assert!(store.delete_media(m.id).await.unwrap());
        assert!(!store.delete_media(m.id).await.unwrap());
        assert!(store.get_media(m.id).await.unwrap().is_none());
    }
}
