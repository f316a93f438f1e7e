//! Client-local key-value storage that outlives a single process run.

use async_trait::async_trait;
use dashmap::DashMap;
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::{error::StoreError, models::ConsultationDraft};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Keys shared by the sign-in flow and the consultation form.
pub mod keys {
    pub const EMAIL_FOR_SIGN_IN: &str = "emailForSignIn";
    pub const CONSULTATION_DRAFT: &str = "consultationData";
    pub const FALLBACK_REQUESTS: &str = "consultationRequests";
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub struct InMemoryLocalStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for InMemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All entries live in one JSON object file, rewritten on every change.
pub struct FileLocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

/// The pending consultation draft, produced at the offer step and consumed
/// when the form loads after sign-in.
#[derive(Clone)]
pub struct DraftStash {
    store: Arc<dyn LocalStore>,
}

impl DraftStash {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub async fn stash(&self, draft: &ConsultationDraft) -> Result<()> {
        let value = serde_json::to_string(draft)?;
        self.store.set(keys::CONSULTATION_DRAFT, value).await
    }

    /// An unreadable draft is logged and treated as absent.
    pub async fn load(&self) -> Option<ConsultationDraft> {
        let raw = match self.store.get(keys::CONSULTATION_DRAFT).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!(error = %e, "Failed to read consultation draft");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!(error = %e, "Error parsing saved consultation data");
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(keys::CONSULTATION_DRAFT).await
    }
}
