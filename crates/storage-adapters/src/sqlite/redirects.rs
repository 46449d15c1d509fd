use super::{db, from_ts, to_ts, SqliteStore};
use async_trait::async_trait;
use domains::models::{NewRedirect, Redirect, RedirectId, RedirectType};
use domains::traits::RedirectRepo;
use domains::{DomainError, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn map_redirect(row: &SqliteRow) -> Result<Redirect> {
    let code: i64 = row.get("redirect_type");
    let redirect_type = u16::try_from(code)
        .map_err(|_| DomainError::Internal(format!("bad redirect status {code}")))
        .and_then(RedirectType::try_from)?;
    Ok(Redirect {
        id: row.get("id"),
        from_path: row.get("from_path"),
        to_path: row.get("to_path"),
        redirect_type,
        created_at: from_ts(row.get("created_at")),
    })
}

#[async_trait]
impl RedirectRepo for SqliteStore {
    async fn replace_redirect(&self, redirect: NewRedirect) -> Result<Redirect> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query("DELETE FROM redirects WHERE from_path = ?")
            .bind(&redirect.from_path)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        let id = sqlx::query(
            "INSERT INTO redirects (from_path, to_path, redirect_type, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&redirect.from_path)
        .bind(&redirect.to_path)
        .bind(i64::from(redirect.redirect_type.status()))
        .bind(to_ts(redirect.created_at))
        .execute(&mut *tx)
        .await
        .map_err(db)?
        .last_insert_rowid();

        tx.commit().await.map_err(db)?;

        Ok(Redirect {
            id,
            from_path: redirect.from_path,
            to_path: redirect.to_path,
            redirect_type: redirect.redirect_type,
            created_at: redirect.created_at,
        })
    }

    async fn find_redirect(&self, from_path: &str) -> Result<Option<Redirect>> {
        let row = sqlx::query(
            "SELECT id, from_path, to_path, redirect_type, created_at FROM redirects WHERE from_path = ?",
        )
        .bind(from_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;
        row.as_ref().map(map_redirect).transpose()
    }

    async fn list_redirects(&self) -> Result<Vec<Redirect>> {
        sqlx::query(
            "SELECT id, from_path, to_path, redirect_type, created_at FROM redirects \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .iter()
        .map(map_redirect)
        .collect()
    }

    async fn delete_redirect(&self, id: RedirectId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM redirects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }
}
