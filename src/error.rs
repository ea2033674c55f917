use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradeBookError {
    #[error("student {0} does not exist")]
    NotFound(String),

    #[error("student {0} already exists")]
    AlreadyExists(String),

    #[error("grade {grade} not found for student {id}")]
    GradeNotFound { id: String, grade: f64 },

    #[error("student record is missing an ID")]
    MissingId,

    #[error("invalid student record: {0}")]
    InvalidRecord(#[source] serde_json::Error),

    #[error("failed to access {}: {source}", path.to_string_lossy())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid gradebook: {source}", path.to_string_lossy())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GradeBookError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            GradeBookError::NotFound(_) => "not_found",
            GradeBookError::AlreadyExists(_) => "already_exists",
            GradeBookError::GradeNotFound { .. } => "grade_not_found",
            GradeBookError::MissingId | GradeBookError::InvalidRecord(_) => "bad_params",
            GradeBookError::Storage { .. } => "storage_failed",
            GradeBookError::Malformed { .. } => "malformed_data",
        }
    }
}
