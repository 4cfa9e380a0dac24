//! crates/lecture_catalog_core/src/completion.rs
//!
//! The completion relation between a user and a lecture, as a pure state
//! transition over the user's completion set.

use std::collections::HashSet;

/// Flips membership of `lecture_id`.
///
/// Returns the new set and whether the lecture is now completed. Applying it
/// twice yields a set equal to the original.
pub fn toggle_completion(completed: &HashSet<String>, lecture_id: &str) -> (HashSet<String>, bool) {
    let mut next = completed.clone();
    let now_completed = if next.remove(lecture_id) {
        false
    } else {
        next.insert(lecture_id.to_string());
        true
    };
    (next, now_completed)
}

/// Sets membership explicitly. Idempotent.
pub fn set_completion(completed: &HashSet<String>, lecture_id: &str, done: bool) -> HashSet<String> {
    let mut next = completed.clone();
    if done {
        next.insert(lecture_id.to_string());
    } else {
        next.remove(lecture_id);
    }
    next
}
