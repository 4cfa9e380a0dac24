//! crates/lecture_catalog_core/src/validator.rs
//!
//! Admission rules for new lectures. A draft either passes every rule or is
//! rejected as a whole; the validator never inspects which grade a view is
//! currently showing.

use crate::domain::{LectureDraft, Topic};
use crate::error::{CatalogError, CatalogResult, RequiredField};

/// Checks that the title, topic and encoded file are all present.
pub fn validate(draft: &LectureDraft) -> CatalogResult<()> {
    let mut missing = Vec::new();

    if draft.title.trim().is_empty() {
        missing.push(RequiredField::Title);
    }
    if draft.topic_id.trim().is_empty() {
        missing.push(RequiredField::Topic);
    }
    let has_file = draft
        .file
        .as_ref()
        .is_some_and(|file| !file.encoded.is_empty());
    if !has_file {
        missing.push(RequiredField::File);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::MissingRequiredField(missing))
    }
}

/// Referential integrity at creation time: the topic must exist, in any grade.
pub fn ensure_topic_exists(topic_id: &str, topics: &[Topic]) -> CatalogResult<()> {
    if topics.iter().any(|topic| topic.id == topic_id) {
        Ok(())
    } else {
        Err(CatalogError::UnknownTopic(topic_id.to_string()))
    }
}
