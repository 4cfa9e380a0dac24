//! crates/lecture_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the lecture catalog.
//! These structs are independent of any database; they derive `serde` so the
//! adapters can move them across JSON-compatible boundaries unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Grade
//=========================================================================================

/// One of the three supported grade levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    Tenth,
    Eleventh,
    Twelfth,
}

impl Grade {
    /// Every supported grade, in ascending order.
    pub const ALL: [Grade; 3] = [Grade::Tenth, Grade::Eleventh, Grade::Twelfth];

    pub fn level(self) -> u8 {
        match self {
            Grade::Tenth => 10,
            Grade::Eleventh => 11,
            Grade::Twelfth => 12,
        }
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            10 => Ok(Grade::Tenth),
            11 => Ok(Grade::Eleventh),
            12 => Ok(Grade::Twelfth),
            other => Err(format!("unsupported grade level {}", other)),
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.level()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

//=========================================================================================
// Topic & Lecture
//=========================================================================================

/// A monthly topic lectures are filed under. Owned by an external editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub grade: Grade,
    pub month: u8,
    pub name: String,
    pub icon: String,
}

impl Topic {
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && (1..=12).contains(&self.month) && !self.name.trim().is_empty()
    }
}

/// Coarse content kind of an uploaded lecture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "IMAGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PDF" => Some(FileKind::Pdf),
            "IMAGE" => Some(FileKind::Image),
            _ => None,
        }
    }
}

/// A catalog entry wrapping one uploaded file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub file_name: String,
    pub file_type: FileKind,
    pub created_at: DateTime<Utc>,
}

/// The output of the file encoder: a self-contained data URI plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFile {
    pub encoded: String,
    pub kind: FileKind,
    pub name: String,
}

/// A lecture candidate as submitted by an editor, before validation.
#[derive(Debug, Clone, Default)]
pub struct LectureDraft {
    pub title: String,
    pub description: String,
    pub topic_id: String,
    pub file: Option<EncodedFile>,
}

//=========================================================================================
// Users & Capabilities
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    /// Any role this core has no special meaning for.
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
            Role::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ADMIN" => Role::Admin,
            "TEACHER" => Role::Teacher,
            "STUDENT" => Role::Student,
            _ => Role::Other,
        }
    }
}

/// The single place that decides who may add or remove lectures.
pub fn can_edit(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Teacher)
}

// The resolved current user, passed explicitly into every operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    #[serde(default)]
    pub completed_lecture_ids: HashSet<String>,
}

impl User {
    pub fn can_edit(&self) -> bool {
        can_edit(self.role)
    }
}

//=========================================================================================
// Query Types
//=========================================================================================

/// Narrows a grade-scoped lecture list to one topic, or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    /// Parses the `ALL` sentinel (any case) or a topic id. Blank input means `All`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("ALL") {
            TopicFilter::All
        } else {
            TopicFilter::Topic(value.to_string())
        }
    }

    pub fn admits(&self, topic_id: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Topic(id) => id == topic_id,
        }
    }
}

/// Completion statistics for a single grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeProgress {
    pub grade: Grade,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_rejects_unsupported_levels() {
        assert_eq!(Grade::try_from(11), Ok(Grade::Eleventh));
        assert!(Grade::try_from(9).is_err());
        assert!(serde_json::from_str::<Grade>("13").is_err());
        assert_eq!(serde_json::to_string(&Grade::Twelfth).unwrap(), "12");
    }

    #[test]
    fn test_only_admins_and_teachers_can_edit() {
        assert!(can_edit(Role::Admin));
        assert!(can_edit(Role::Teacher));
        assert!(!can_edit(Role::Student));
        assert!(!can_edit(Role::Other));
    }

    #[test]
    fn test_unknown_role_deserializes_to_other() {
        let user: User = serde_json::from_str(
            r#"{"id":"6f1c1f7e-2c5b-4d8a-9d43-0a8f3c2b1e11","role":"PARENT"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Other);
        assert!(user.completed_lecture_ids.is_empty());
        assert!(!user.can_edit());
    }

    #[test]
    fn test_topic_filter_parsing() {
        assert_eq!(TopicFilter::parse("ALL"), TopicFilter::All);
        assert_eq!(TopicFilter::parse("all"), TopicFilter::All);
        assert_eq!(TopicFilter::parse(""), TopicFilter::All);
        assert_eq!(TopicFilter::parse("t1"), TopicFilter::Topic("t1".to_string()));
        assert!(TopicFilter::All.admits("anything"));
        assert!(!TopicFilter::parse("t1").admits("t2"));
    }

    #[test]
    fn test_topic_month_must_be_in_range() {
        let mut topic = Topic {
            id: "t1".to_string(),
            grade: Grade::Tenth,
            month: 12,
            name: "Mechanics".to_string(),
            icon: "atom".to_string(),
        };
        assert!(topic.is_well_formed());
        topic.month = 13;
        assert!(!topic.is_well_formed());
        topic.month = 0;
        assert!(!topic.is_well_formed());
    }
}
