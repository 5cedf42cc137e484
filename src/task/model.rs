use serde::{Deserialize, Serialize};
use std::num::ParseIntError;

/// Status given to freshly created tasks.
pub const STATUS_NEW: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found")]
    NotFound,

    #[error("invalid task ID format: {0}")]
    InvalidId(#[from] ParseIntError),
}
