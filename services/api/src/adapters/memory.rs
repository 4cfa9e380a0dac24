//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `CatalogStore` port, used when no
//! database is configured. Topics and users are seeded from a JSON file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use lecture_catalog_core::completion;
use lecture_catalog_core::domain::{Lecture, Topic, User};
use lecture_catalog_core::ports::{CatalogStore, PortError, PortResult};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::ConfigError;

/// The on-disk shape of a seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

impl CatalogSeed {
    /// Reads and checks a seed file. Malformed topics are refused up front.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Seed(path.to_path_buf(), e.to_string()))?;
        let seed: CatalogSeed = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Seed(path.to_path_buf(), e.to_string()))?;

        if let Some(topic) = seed.topics.iter().find(|topic| !topic.is_well_formed()) {
            return Err(ConfigError::Seed(
                path.to_path_buf(),
                format!("topic {} is malformed", topic.id),
            ));
        }
        Ok(seed)
    }
}

struct MemoryCatalog {
    /// Insertion order is the listing order.
    lectures: Vec<Lecture>,
    topics: Vec<Topic>,
    users: HashMap<Uuid, User>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct MemoryStore {
    inner: RwLock<MemoryCatalog>,
}

impl MemoryStore {
    pub fn new(seed: CatalogSeed) -> Self {
        info!(
            topics = seed.topics.len(),
            users = seed.users.len(),
            lectures = seed.lectures.len(),
            "Seeding in-memory catalog"
        );
        let catalog = MemoryCatalog {
            lectures: seed.lectures,
            topics: seed.topics,
            users: seed.users.into_iter().map(|user| (user.id, user)).collect(),
        };
        Self {
            inner: RwLock::new(catalog),
        }
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_lecture(&self, lecture: Lecture) -> PortResult<()> {
        let mut catalog = self.inner.write().await;
        if catalog.lectures.iter().any(|existing| existing.id == lecture.id) {
            return Err(PortError::Conflict(format!("Lecture {}", lecture.id)));
        }
        catalog.lectures.push(lecture);
        Ok(())
    }

    async fn delete_lecture(&self, lecture_id: &str) -> PortResult<()> {
        let mut catalog = self.inner.write().await;
        catalog.lectures.retain(|lecture| lecture.id != lecture_id);
        for user in catalog.users.values_mut() {
            user.completed_lecture_ids.remove(lecture_id);
        }
        Ok(())
    }

    async fn list_lectures(&self) -> PortResult<Vec<Lecture>> {
        Ok(self.inner.read().await.lectures.clone())
    }

    async fn list_topics(&self) -> PortResult<Vec<Topic>> {
        Ok(self.inner.read().await.topics.clone())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.inner
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn set_completion(&self, user_id: Uuid, lecture_id: &str, completed: bool) -> PortResult<()> {
        let mut catalog = self.inner.write().await;
        let lecture_exists = catalog.lectures.iter().any(|lecture| lecture.id == lecture_id);
        let user = catalog
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        if completed && !lecture_exists {
            return Err(PortError::NotFound(format!("Lecture {}", lecture_id)));
        }
        user.completed_lecture_ids =
            completion::set_completion(&user.completed_lecture_ids, lecture_id, completed);
        Ok(())
    }

    async fn toggle_completion(&self, user_id: Uuid, lecture_id: &str) -> PortResult<HashSet<String>> {
        // Read and write under one guard so concurrent toggles serialise.
        let mut catalog = self.inner.write().await;
        let lecture_exists = catalog.lectures.iter().any(|lecture| lecture.id == lecture_id);
        let user = catalog
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        let (next, now_completed) = completion::toggle_completion(&user.completed_lecture_ids, lecture_id);
        if now_completed && !lecture_exists {
            return Err(PortError::NotFound(format!("Lecture {}", lecture_id)));
        }
        user.completed_lecture_ids = next.clone();
        Ok(next)
    }
}
