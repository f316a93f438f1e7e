use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    error::{FormError, SubmitError},
    local::{DraftStash, LocalStore},
    models::{
        ConsultationCategory, ConsultationDraft, ConsultationRequest, ConsultationStatus,
        ConsultationType, Urgency, UserSession,
    },
    store::{ConsultationStore, FallbackStore},
};

pub const CONFIRMATION_TITLE: &str = "Consultation Request Submitted!";
pub const CONFIRMATION_BODY: &str =
    "Thank you for your request. An expert will review your information and contact you soon.";

/// Intake form as the user fills it in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationForm {
    pub consultation_type: ConsultationType,
    pub category: ConsultationCategory,
    pub country: String,
    pub language: String,
    pub urgency: Urgency,
    pub address: String,
    pub summary: String,
}

impl ConsultationForm {
    /// Prefills category, language, urgency and summary from a stashed draft.
    pub fn from_draft(draft: Option<&ConsultationDraft>) -> Self {
        let mut form = Self::default();
        if let Some(draft) = draft {
            form.category = draft.category;
            form.language = if draft.language.trim().is_empty() {
                "English".to_string()
            } else {
                draft.language.clone()
            };
            form.urgency = draft.urgency;
            form.summary = draft.summary.clone();
        }
        form
    }

    pub fn validate(&self) -> Result<(), FormError> {
        let required = [
            ("Country", &self.country),
            ("Preferred language", &self.language),
            ("Request summary", &self.summary),
        ];
        if let Some((label, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(FormError::MissingField(*label));
        }

        if self.consultation_type == ConsultationType::AtHome && self.address.trim().is_empty() {
            return Err(FormError::AddressRequired);
        }
        Ok(())
    }

    fn into_request(self, session: &UserSession, created_at: DateTime<Utc>) -> ConsultationRequest {
        let address = match self.consultation_type {
            ConsultationType::AtHome => Some(self.address.trim().to_string()),
            ConsultationType::Video => None,
        };

        ConsultationRequest {
            id: None,
            user_id: session.uid.clone(),
            user_email: session.email.clone(),
            consultation_type: self.consultation_type,
            category: self.category,
            country: self.country.trim().to_string(),
            language: self.language.trim().to_string(),
            urgency: self.urgency,
            address,
            summary: self.summary.trim().to_string(),
            status: ConsultationStatus::Pending,
            created_at,
        }
    }
}

/// Where a submitted request ended up. Both count as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Stored { id: String },
    StoredLocally { id: String },
}

impl SubmissionOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Stored { id } | Self::StoredLocally { id } => id,
        }
    }
}

/// Loads and submits the consultation form.
pub struct ConsultationIntake {
    primary: Arc<dyn ConsultationStore>,
    fallback: Arc<dyn FallbackStore>,
    drafts: DraftStash,
}

impl ConsultationIntake {
    pub fn new(
        primary: Arc<dyn ConsultationStore>,
        fallback: Arc<dyn FallbackStore>,
        local: Arc<dyn LocalStore>,
    ) -> Self {
        Self {
            primary,
            fallback,
            drafts: DraftStash::new(local),
        }
    }

    /// A fresh form, prefilled from the draft stashed before sign-in.
    pub async fn load_form(&self) -> ConsultationForm {
        ConsultationForm::from_draft(self.drafts.load().await.as_ref())
    }

    /// Validates and persists the form.
    ///
    /// A failed primary write is retried once against the fallback store
    /// under a `local-<millis>` id. Either way the draft is cleared.
    pub async fn submit(
        &self,
        session: Option<&UserSession>,
        form: ConsultationForm,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let session = session.ok_or(SubmitError::NotAuthenticated)?;
        form.validate()?;

        let now = Utc::now();
        let mut request = form.into_request(session, now);

        let outcome = match self.primary.insert(&request).await {
            Ok(id) => {
                info!(id = %id, "Consultation request written to document store");
                SubmissionOutcome::Stored { id }
            }
            Err(e) => {
                error!(error = %e, "Document store write failed, saving locally");
                let id = format!("local-{}", now.timestamp_millis());
                request.id = Some(id.clone());
                self.fallback
                    .append(request)
                    .await
                    .map_err(SubmitError::Persistence)?;
                info!(id = %id, "Consultation request saved to local fallback");
                SubmissionOutcome::StoredLocally { id }
            }
        };

        if let Err(e) = self.drafts.clear().await {
            warn!(error = %e, "Failed to clear consultation draft");
        }

        Ok(outcome)
    }
}
