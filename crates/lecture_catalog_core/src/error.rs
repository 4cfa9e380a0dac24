//! crates/lecture_catalog_core/src/error.rs
//!
//! The error taxonomy surfaced by the catalog core. Every variant is
//! recoverable at the caller's boundary.

use crate::ports::PortError;
use std::fmt;

/// A field the validator requires on a lecture draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Title,
    Topic,
    File,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredField::Title => "title",
            RequiredField::Topic => "topic",
            RequiredField::File => "file",
        };
        f.write_str(name)
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The selected file is neither a PDF nor an image.
    #[error("Unsupported file kind: {0}")]
    UnsupportedFileKind(String),

    #[error("Failed to read file: {0}")]
    FileReadError(#[source] std::io::Error),

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("Missing required field(s): {}", join_fields(.0))]
    MissingRequiredField(Vec<RequiredField>),

    #[error("Topic {0} does not exist")]
    UnknownTopic(String),

    #[error("This action requires an admin or teacher role")]
    Forbidden,

    /// The store rejected a mutation; no state was changed on this side.
    #[error("Store write failed: {0}")]
    StoreWriteError(#[source] PortError),

    #[error("Store read failed: {0}")]
    StoreReadError(#[source] PortError),
}

/// A convenience type alias for `Result<T, CatalogError>`.
pub type CatalogResult<T> = Result<T, CatalogError>;
