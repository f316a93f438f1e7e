use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationCategory {
    Medical,
    Legal,
    #[default]
    Other,
}

impl ConsultationCategory {
    /// Medical wins when a message is flagged as both.
    pub fn from_flags(is_medical: bool, is_legal: bool) -> Self {
        if is_medical {
            Self::Medical
        } else if is_legal {
            Self::Legal
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Legal => "legal",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    #[default]
    Video,
    AtHome,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::AtHome => "at_home",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    #[default]
    Pending,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }
}

/// What the chat knew about the request before the user signed in.
///
/// Written at the consultation offer, read back once the email link has been
/// followed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDraft {
    #[serde(default)]
    pub category: ConsultationCategory,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub summary: String,
    /// Unix millis at capture
    #[serde(default)]
    pub timestamp: i64,
}

impl ConsultationDraft {
    pub fn for_topic(
        is_medical: bool,
        is_legal: bool,
        language: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            category: ConsultationCategory::from_flags(is_medical, is_legal),
            language: language.into(),
            urgency: Urgency::Medium,
            summary: summary.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Identity handle handed out by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Intake record written once to the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub consultation_type: ConsultationType,
    pub category: ConsultationCategory,
    pub country: String,
    pub language: String,
    pub urgency: Urgency,
    #[serde(default)]
    pub address: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
}
