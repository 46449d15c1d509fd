use super::{db, from_ts, to_ts, SqliteStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::models::Setting;
use domains::traits::SettingsRepo;
use domains::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn map_setting(row: &SqliteRow) -> Setting {
    Setting {
        key: row.get("key"),
        value: row.get("value"),
        updated_at: from_ts(row.get("updated_at")),
    }
}

#[async_trait]
impl SettingsRepo for SqliteStore {
    async fn get_setting(&self, key: &str) -> Result<Option<Setting>> {
        let row = sqlx::query("SELECT key, value, updated_at FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.as_ref().map(map_setting))
    }

    async fn upsert_setting(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<Setting> {
        let row = sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at \
             RETURNING key, value, updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(to_ts(at))
        .fetch_one(&self.pool)
        .await
        .map_err(db)?;
        Ok(map_setting(&row))
    }

    async fn delete_setting(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn all_settings(&self) -> Result<Vec<Setting>> {
        let rows = sqlx::query("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        Ok(rows.iter().map(map_setting).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_overwrites() {
        let store = SqliteStore::in_memory().await.unwrap();
        let first = DateTime::from_timestamp(1, 0).unwrap();
        let later = DateTime::from_timestamp(2, 0).unwrap();

        store.upsert_setting("site_name", "One", first).await.unwrap();
        let s = store.upsert_setting("site_name", "Two", later).await.unwrap();
        assert_eq!(s.value, "Two");
        assert_eq!(s.updated_at, later);

        let all = store.all_settings().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(store.delete_setting("site_name").await.unwrap());
        assert!(store.get_setting("site_name").await.unwrap().is_none());
    }
}
