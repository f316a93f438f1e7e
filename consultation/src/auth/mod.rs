//! Passwordless email-link sign-in.
//!
//! ```text
//! Unauthenticated --request_link--> LinkSent --verify--> PendingVerification --> Verified
//!                                                                            \-> Failed
//! ```
//! `Failed` is terminal until [`SignInFlow::reset`].

pub mod identity_toolkit;
pub mod in_memory;
pub mod link;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    error::{AuthError, SignInError},
    local::{DraftStash, LocalStore, keys},
    models::{ConsultationDraft, UserSession},
};

pub use identity_toolkit::IdentityToolkitAuthProvider;
pub use in_memory::InMemoryAuthProvider;
pub use link::{SignInLink, parse_sign_in_link};

/// Hosted passwordless sign-in provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Emails a one-time link that leads back to `redirect_url`.
    async fn send_link(&self, email: &str, redirect_url: &str) -> Result<(), AuthError>;

    fn is_sign_in_link(&self, url: &str) -> bool;

    async fn complete_sign_in(&self, email: &str, url: &str) -> Result<UserSession, AuthError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignInState {
    Unauthenticated,
    LinkSent { email: String },
    PendingVerification,
    Verified(UserSession),
    Failed(String),
}

/// Result of following a sign-in link.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub session: UserSession,
    /// Draft stashed at the offer step, if it survived the redirect
    pub draft: Option<ConsultationDraft>,
}

pub struct SignInFlow {
    auth: Arc<dyn AuthProvider>,
    local: Arc<dyn LocalStore>,
    drafts: DraftStash,
    redirect_url: String,
    state: SignInState,
}

impl SignInFlow {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        local: Arc<dyn LocalStore>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            drafts: DraftStash::new(local.clone()),
            local,
            redirect_url: redirect_url.into(),
            state: SignInState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SignInState {
        &self.state
    }

    pub fn session(&self) -> Option<&UserSession> {
        match &self.state {
            SignInState::Verified(session) => Some(session),
            _ => None,
        }
    }

    /// Stashes the draft and the email locally, then asks the provider to
    /// send the link. Errors leave the flow where it was.
    pub async fn request_link(
        &mut self,
        email: &str,
        draft: &ConsultationDraft,
    ) -> Result<(), SignInError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(SignInError::InvalidEmail);
        }

        self.drafts.stash(draft).await?;
        self.local
            .set(keys::EMAIL_FOR_SIGN_IN, email.to_string())
            .await?;

        if let Err(e) = self.auth.send_link(email, &self.redirect_url).await {
            error!(error = %e, "Error sending sign-in link to email");
            return Err(SignInError::SendFailed(e));
        }

        info!(category = draft.category.as_str(), "Sign-in link sent");
        self.state = SignInState::LinkSent {
            email: email.to_string(),
        };
        Ok(())
    }

    /// Completes sign-in from the link the user followed.
    ///
    /// `prompt_email` is asked only when no email was remembered on this
    /// device, e.g. when the link is opened elsewhere.
    pub async fn verify<F, Fut>(
        &mut self,
        url: &str,
        prompt_email: F,
    ) -> Result<Verification, SignInError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<String>> + Send,
    {
        self.state = SignInState::PendingVerification;

        match self.try_verify(url, prompt_email).await {
            Ok(verification) => {
                info!(uid = %verification.session.uid, "Email verified");
                self.state = SignInState::Verified(verification.session.clone());
                Ok(verification)
            }
            Err(e) => {
                warn!(error = %e, "Email verification failed");
                self.state = SignInState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn try_verify<F, Fut>(
        &self,
        url: &str,
        prompt_email: F,
    ) -> Result<Verification, SignInError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<String>> + Send,
    {
        if !self.auth.is_sign_in_link(url) {
            return Err(SignInError::InvalidLink);
        }

        let remembered = self.local.get(keys::EMAIL_FOR_SIGN_IN).await?;
        let email = match remembered {
            Some(email) => Some(email),
            None => prompt_email().await,
        }
        .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or(SignInError::MissingEmail)?;

        let session = self
            .auth
            .complete_sign_in(&email, url)
            .await
            .map_err(SignInError::VerificationFailed)?;

        if let Err(e) = self.local.remove(keys::EMAIL_FOR_SIGN_IN).await {
            warn!(error = %e, "Failed to clear remembered sign-in email");
        }

        Ok(Verification {
            session,
            draft: self.drafts.load().await,
        })
    }

    /// Back to the start, e.g. after a failed verification.
    pub fn reset(&mut self) {
        self.state = SignInState::Unauthenticated;
    }
}
