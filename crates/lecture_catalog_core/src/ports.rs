//! crates/lecture_catalog_core/src/ports.rs
//!
//! Defines the service contract (trait) for the catalog's persistence collaborator.
//! This trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{Lecture, Topic, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The store holding lectures, topics and users.
///
/// The core assumes only that a completed write is visible to the next read
/// issued by the same actor.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Lectures ---
    async fn create_lecture(&self, lecture: Lecture) -> PortResult<()>;

    /// Removing an id that is not present succeeds.
    async fn delete_lecture(&self, lecture_id: &str) -> PortResult<()>;

    /// Lectures in insertion order.
    async fn list_lectures(&self) -> PortResult<Vec<Lecture>>;

    // --- Topics ---
    async fn list_topics(&self) -> PortResult<Vec<Topic>>;

    // --- Users & Completion ---
    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Idempotent in both directions.
    async fn set_completion(
        &self,
        user_id: Uuid,
        lecture_id: &str,
        completed: bool,
    ) -> PortResult<()>;

    /// Flips one completion against the stored state, not a caller's copy of
    /// it, and returns the user's completed set after the flip. Concurrent
    /// toggles of the same pair are applied one after the other.
    async fn toggle_completion(&self, user_id: Uuid, lecture_id: &str) -> PortResult<HashSet<String>>;
}
