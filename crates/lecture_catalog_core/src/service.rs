//! crates/lecture_catalog_core/src/service.rs
//!
//! Wires the encoder output, validator, query engine and completion tracker to
//! a `CatalogStore`. The service holds no mutable state of its own; every
//! mutation goes through the store and nothing is written unless all checks
//! before it passed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Grade, GradeProgress, Lecture, LectureDraft, Topic, TopicFilter, User};
use crate::error::{CatalogError, CatalogResult, RequiredField};
use crate::ports::CatalogStore;
use crate::query;
use crate::validator;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    fn require_editor(actor: &User) -> CatalogResult<()> {
        if actor.can_edit() {
            Ok(())
        } else {
            warn!(user_id = %actor.id, role = actor.role.as_str(), "Rejected catalog edit");
            Err(CatalogError::Forbidden)
        }
    }

    async fn snapshot(&self) -> CatalogResult<(Vec<Lecture>, Vec<Topic>)> {
        let lectures = self
            .store
            .list_lectures()
            .await
            .map_err(CatalogError::StoreReadError)?;
        let topics = self
            .store
            .list_topics()
            .await
            .map_err(CatalogError::StoreReadError)?;
        Ok((lectures, topics))
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    /// Admits a new lecture. The id is a random UUID assigned at submission time.
    pub async fn create_lecture(&self, actor: &User, draft: LectureDraft) -> CatalogResult<Lecture> {
        Self::require_editor(actor)?;
        validator::validate(&draft)?;

        let topics = self
            .store
            .list_topics()
            .await
            .map_err(CatalogError::StoreReadError)?;
        let topic_id = draft.topic_id.trim().to_string();
        validator::ensure_topic_exists(&topic_id, &topics)?;

        let file = draft
            .file
            .ok_or_else(|| CatalogError::MissingRequiredField(vec![RequiredField::File]))?;
        let lecture = Lecture {
            id: Uuid::new_v4().to_string(),
            topic_id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            file_url: file.encoded,
            file_name: file.name,
            file_type: file.kind,
            created_at: Utc::now(),
        };

        self.store
            .create_lecture(lecture.clone())
            .await
            .map_err(CatalogError::StoreWriteError)?;
        info!(lecture_id = %lecture.id, topic_id = %lecture.topic_id, "Lecture created");
        Ok(lecture)
    }

    /// Deleting an unknown id is a successful no-op.
    pub async fn delete_lecture(&self, actor: &User, lecture_id: &str) -> CatalogResult<()> {
        Self::require_editor(actor)?;
        self.store
            .delete_lecture(lecture_id)
            .await
            .map_err(CatalogError::StoreWriteError)?;
        info!(lecture_id, "Lecture deleted");
        Ok(())
    }

    /// Flips the actor's completion of a lecture and returns the new set.
    ///
    /// The flip is applied to the stored set, so a stale `actor` snapshot
    /// cannot undo a concurrent toggle. On failure nothing changes.
    pub async fn toggle_completion(
        &self,
        actor: &User,
        lecture_id: &str,
    ) -> CatalogResult<HashSet<String>> {
        let next = self
            .store
            .toggle_completion(actor.id, lecture_id)
            .await
            .map_err(CatalogError::StoreWriteError)?;
        let now_completed = next.contains(lecture_id);
        info!(user_id = %actor.id, lecture_id, now_completed, "Completion toggled");
        Ok(next)
    }

    //=====================================================================================
    // Queries
    //=====================================================================================

    pub async fn topics(&self, grade: Grade) -> CatalogResult<Vec<Topic>> {
        let topics = self
            .store
            .list_topics()
            .await
            .map_err(CatalogError::StoreReadError)?;
        Ok(topics.into_iter().filter(|topic| topic.grade == grade).collect())
    }

    pub async fn lecture(&self, lecture_id: &str) -> CatalogResult<Option<Lecture>> {
        let lectures = self
            .store
            .list_lectures()
            .await
            .map_err(CatalogError::StoreReadError)?;
        Ok(lectures.into_iter().find(|lecture| lecture.id == lecture_id))
    }

    pub async fn lectures(&self, grade: Grade, filter: &TopicFilter) -> CatalogResult<Vec<Lecture>> {
        let (lectures, topics) = self.snapshot().await?;
        Ok(query::filter_lectures(&lectures, &topics, grade, filter))
    }

    pub async fn progress(&self, actor: &User, grade: Grade) -> CatalogResult<GradeProgress> {
        let (lectures, topics) = self.snapshot().await?;
        Ok(query::compute_progress(
            &lectures,
            &topics,
            grade,
            &actor.completed_lecture_ids,
        ))
    }

    pub async fn overview(&self, actor: &User) -> CatalogResult<Vec<GradeProgress>> {
        let (lectures, topics) = self.snapshot().await?;
        Ok(query::grade_overview(&lectures, &topics, &actor.completed_lecture_ids))
    }
}
