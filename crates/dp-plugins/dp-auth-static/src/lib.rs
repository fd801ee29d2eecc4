//! # dp-auth-static
//!
//! `CredentialSource` implementations for a token obtained out of band from
//! the auth service: either configured directly or kept in a file.

use std::path::PathBuf;

use async_trait::async_trait;
use dp_core::{AppError, Credential, CredentialSource, Result};
use secrecy::{ExposeSecret, SecretString};
use tokio::fs;

/// A token fixed at startup (config value or environment variable).
pub struct StaticCredentialSource {
    token: Option<SecretString>,
}

impl StaticCredentialSource {
    pub fn new(token: Option<SecretString>) -> Self {
        // A blank token means "signed out", same as no token at all.
        let token = token.filter(|t| !t.expose_secret().trim().is_empty());
        Self { token }
    }

    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    async fn credential(&self) -> Result<Option<Credential>> {
        Ok(self
            .token
            .as_ref()
            .map(|t| Credential::new(t.expose_secret().trim())))
    }
}

/// Reads the token from a file on every call, so a refreshed token is picked
/// up without restarting.
pub struct TokenFileCredentialSource {
    path: PathBuf,
}

impl TokenFileCredentialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for TokenFileCredentialSource {
    async fn credential(&self) -> Result<Option<Credential>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    tracing::debug!(path = %self.path.display(), "token file is empty");
                    Ok(None)
                } else {
                    Ok(Some(Credential::new(token)))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no token file; signed out");
                Ok(None)
            }
            Err(err) => Err(AppError::Internal(format!(
                "reading token file {}: {err}",
                self.path.display()
            ))),
        }
    }
}
