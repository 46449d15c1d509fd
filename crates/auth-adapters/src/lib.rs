//! # auth-adapters
//!
//! Argon2-based implementation of `AuthProvider` for the management API.
//! The server only ever stores the PHC hash of the API token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use domains::traits::AuthProvider;
use domains::{DomainError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

pub struct ApiTokenVerifier {
    /// PHC-format argon2 hash; `None` disables the management API.
    token_hash: Option<Arc<SecretString>>,
}

impl ApiTokenVerifier {
    pub fn new(token_hash: Option<SecretString>) -> Self {
        if token_hash.is_none() {
            tracing::warn!("no API token hash configured; management API will reject every request");
        }
        Self {
            token_hash: token_hash.map(Arc::new),
        }
    }
}

fn verify_against(hash: &SecretString, token: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash.expose_secret()) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "configured API token hash is not a valid PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(token.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hashes a plaintext token for storage in `auth.api_token_hash`.
pub fn hash_token(token: &str) -> Result<String> {
    if token.trim().is_empty() {
        return Err(DomainError::validation("API token must not be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(token.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(DomainError::internal)
}

#[async_trait]
impl AuthProvider for ApiTokenVerifier {
    /// Verifies a presented token against the stored Argon2 hash on the
    /// blocking pool.
    async fn verify_api_token(&self, token: &str) -> bool {
        let Some(hash) = self.token_hash.clone() else {
            return false;
        };
        let token = token.to_owned();
        match tokio::task::spawn_blocking(move || verify_against(&hash, &token)).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::error!(error = %e, "API token verification task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_only_the_hashed_token() {
        let hash = hash_token("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));

        let verifier = ApiTokenVerifier::new(Some(SecretString::from(hash)));
        assert!(verifier.verify_api_token("s3cret").await);
        assert!(!verifier.verify_api_token("S3cret").await);
        assert!(!verifier.verify_api_token("").await);
    }

    #[tokio::test]
    async fn missing_or_garbage_hash_rejects() {
        let none = ApiTokenVerifier::new(None);
        assert!(!none.verify_api_token("anything").await);

        let garbage = ApiTokenVerifier::new(Some(SecretString::from(String::from("not-a-hash"))));
        assert!(!garbage.verify_api_token("not-a-hash").await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn verification_runs_off_a_single_threaded_runtime() {
        let verifier = Arc::new(ApiTokenVerifier::new(Some(SecretString::from(
            hash_token("tok").unwrap(),
        ))));
        let checks: Vec<_> = ["tok", "bad", "tok", "bad"]
            .into_iter()
            .map(|token| {
                let verifier = Arc::clone(&verifier);
                tokio::spawn(async move { verifier.verify_api_token(token).await })
            })
            .collect();
        let mut results = Vec::new();
        for check in checks {
            results.push(check.await.unwrap());
        }
        assert_eq!(results, vec![true, false, true, false]);
    }

    #[test]
    fn empty_token_cannot_be_hashed() {
        assert!(matches!(hash_token("  "), Err(DomainError::ValidationError(_))));
    }
}
