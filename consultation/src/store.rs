//! Two-tier persistence for consultation requests.
//!
//! Records go to the primary [`ConsultationStore`]. When that write fails the
//! form hands the record to a [`FallbackStore`] instead. Fallback entries are
//! not reconciled with the primary store later.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::StoreError,
    local::{LocalStore, keys},
    models::ConsultationRequest,
};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Insert-only document store.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    /// Persists the record and returns the id assigned by the store.
    async fn insert(&self, request: &ConsultationRequest) -> Result<String>;
}

/// Last-resort local copy of records the primary store refused.
#[async_trait]
pub trait FallbackStore: Send + Sync {
    async fn append(&self, request: ConsultationRequest) -> Result<()>;
    async fn records(&self) -> Result<Vec<ConsultationRequest>>;
}

pub struct InMemoryConsultationStore {
    requests: Arc<DashMap<String, ConsultationRequest>>,
}

impl InMemoryConsultationStore {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<ConsultationRequest> {
        self.requests.get(id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for InMemoryConsultationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsultationStore for InMemoryConsultationStore {
    async fn insert(&self, request: &ConsultationRequest) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut stored = request.clone();
        stored.id = Some(id.clone());
        self.requests.insert(id.clone(), stored);
        Ok(id)
    }
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS consultation_requests (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    user_email TEXT,
    consultation_type TEXT NOT NULL,
    category TEXT NOT NULL,
    country TEXT NOT NULL,
    language TEXT NOT NULL,
    urgency TEXT NOT NULL,
    address TEXT,
    summary TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)
"#;

const INSERT_REQUEST: &str = r#"
INSERT INTO consultation_requests (
    id, user_id, user_email, consultation_type, category, country,
    language, urgency, address, summary, status, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
"#;

/// PostgreSQL-backed document store, one row per request.
pub struct PostgresConsultationStore {
    pool: PgPool,
}

impl PostgresConsultationStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ConsultationStore for PostgresConsultationStore {
    async fn insert(&self, request: &ConsultationRequest) -> Result<String> {
        let id = Uuid::new_v4();

        sqlx::query(INSERT_REQUEST)
            .bind(id)
            .bind(&request.user_id)
            .bind(&request.user_email)
            .bind(request.consultation_type.as_str())
            .bind(request.category.as_str())
            .bind(&request.country)
            .bind(&request.language)
            .bind(request.urgency.as_str())
            .bind(&request.address)
            .bind(&request.summary)
            .bind(request.status.as_str())
            .bind(request.created_at)
            .execute(&self.pool)
            .await?;

        info!(id = %id, category = request.category.as_str(), "Consultation request stored");
        Ok(id.to_string())
    }
}

/// Keeps fallback records as a JSON list under one local-storage key.
pub struct LocalFallbackStore {
    store: Arc<dyn LocalStore>,
}

impl LocalFallbackStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FallbackStore for LocalFallbackStore {
    async fn append(&self, request: ConsultationRequest) -> Result<()> {
        let mut records = self.records().await?;
        records.push(request);
        let value = serde_json::to_string(&records)?;
        self.store.set(keys::FALLBACK_REQUESTS, value).await
    }

    async fn records(&self) -> Result<Vec<ConsultationRequest>> {
        match self.store.get(keys::FALLBACK_REQUESTS).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::InMemoryLocalStore;
    use crate::models::{ConsultationCategory, ConsultationStatus, ConsultationType, Urgency};
    use chrono::Utc;

    fn request(summary: &str) -> ConsultationRequest {
        ConsultationRequest {
            id: None,
            user_id: "uid-1".to_string(),
            user_email: Some("ana@example.com".to_string()),
            consultation_type: ConsultationType::Video,
            category: ConsultationCategory::Medical,
            country: "Spain".to_string(),
            language: "Spanish".to_string(),
            urgency: Urgency::High,
            address: None,
            summary: summary.to_string(),
            status: ConsultationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_insert_assigns_id() {
        let store = InMemoryConsultationStore::new();
        let id = store.insert(&request("chest pain")).await.unwrap();

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.id.as_deref(), Some(id.as_str()));
        assert_eq!(stored.summary, "chest pain");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_appends_in_order() {
        let fallback = LocalFallbackStore::new(Arc::new(InMemoryLocalStore::new()));
        assert!(fallback.records().await.unwrap().is_empty());

        fallback.append(request("first")).await.unwrap();
        fallback.append(request("second")).await.unwrap();

        let summaries: Vec<String> = fallback
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.summary)
            .collect();
        assert_eq!(summaries, vec!["first", "second"]);
    }
}
