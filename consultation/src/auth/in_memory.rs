use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Url;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{AuthProvider, link::parse_sign_in_link};
use crate::{error::AuthError, models::UserSession};

/// Local stand-in for the hosted provider.
///
/// Links are kept in memory instead of being emailed; [`Self::last_link`]
/// hands them to whoever plays the mailbox. Codes are single use.
pub struct InMemoryAuthProvider {
    pending: Arc<DashMap<String, String>>,
    outbox: Arc<DashMap<String, String>>,
    users: Arc<DashMap<String, String>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            outbox: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
        }
    }

    /// Most recent link sent to `email`.
    pub fn last_link(&self, email: &str) -> Option<String> {
        self.outbox
            .get(&email.to_lowercase())
            .map(|entry| entry.clone())
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn send_link(&self, email: &str, redirect_url: &str) -> Result<(), AuthError> {
        let mut link = Url::parse(redirect_url)
            .map_err(|e| AuthError::Rejected(format!("invalid redirect url: {e}")))?;
        let code = Uuid::new_v4().simple().to_string();
        link.query_pairs_mut()
            .append_pair("mode", "signIn")
            .append_pair("oobCode", &code)
            .append_pair("apiKey", "local");

        let email = email.to_lowercase();
        self.pending.insert(code, email.clone());
        self.outbox.insert(email, link.to_string());
        info!("Sign-in link issued by in-memory provider");
        Ok(())
    }

    fn is_sign_in_link(&self, url: &str) -> bool {
        parse_sign_in_link(url).is_some()
    }

    async fn complete_sign_in(&self, email: &str, url: &str) -> Result<UserSession, AuthError> {
        let link = parse_sign_in_link(url).ok_or(AuthError::InvalidLink)?;
        let email = email.trim().to_lowercase();

        let Some((_, expected)) = self.pending.remove(&link.oob_code) else {
            return Err(AuthError::Rejected("INVALID_OOB_CODE".to_string()));
        };
        if expected != email {
            return Err(AuthError::Rejected("INVALID_EMAIL".to_string()));
        }

        let uid = self
            .users
            .entry(email.clone())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        Ok(UserSession {
            uid,
            email: Some(email),
            id_token: None,
            refresh_token: None,
        })
    }
}
