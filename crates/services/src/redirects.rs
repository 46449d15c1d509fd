//! Path redirects (e.g. for posts whose slug changed).

use crate::paths::{normalize_redirect_path, normalize_redirect_target};
use chrono::Utc;
use domains::{DomainError, NewRedirect, Redirect, RedirectId, RedirectRepo, RedirectType, Result};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectInput {
    pub from_path: String,
    pub to_path: String,
    #[serde(rename = "type")]
    pub redirect_type: Option<RedirectType>,
}

pub struct RedirectService {
    redirects: Arc<dyn RedirectRepo>,
}

impl RedirectService {
    pub fn new(redirects: Arc<dyn RedirectRepo>) -> Self {
        Self { redirects }
    }

    /// Creates a redirect, replacing any existing one from the same path.
    pub async fn create(&self, input: RedirectInput) -> Result<Redirect> {
        let from_path = normalize_redirect_path(&input.from_path)?;
        let to_path = normalize_redirect_target(&input.to_path)?;
        if from_path == to_path {
            return Err(DomainError::validation(format!(
                "redirect from '{from_path}' points at itself"
            )));
        }

        let redirect = self
            .redirects
            .replace_redirect(NewRedirect {
                from_path,
                to_path,
                redirect_type: input.redirect_type.unwrap_or(RedirectType::Permanent),
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(from = %redirect.from_path, to = %redirect.to_path, "redirect saved");
        Ok(redirect)
    }

    /// Looks up the redirect for a request path; unparseable paths never match.
    pub async fn resolve(&self, path: &str) -> Result<Option<Redirect>> {
        match normalize_redirect_path(path) {
            Ok(from) => self.redirects.find_redirect(&from).await,
            Err(_) => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Redirect>> {
        self.redirects.list_redirects().await
    }

    pub async fn delete(&self, id: RedirectId) -> Result<()> {
        if !self.redirects.delete_redirect(id).await? {
            return Err(DomainError::not_found("redirect", id));
        }
        Ok(())
    }
}
