//! Errors for the few fallible entry points: loading projects and settings.
//! Script defects never surface here; they degrade to defaults at compile time.

use thiserror::Error;

use crate::api::types::ObjectId;

pub type Result<T> = std::result::Result<T, ProgramError>;

#[derive(Error, Debug)]
pub enum ProgramError {
    /// Project, script or settings JSON did not match the persistence shape.
    #[error("malformed program json: {0}")]
    Json(#[from] serde_json::Error),

    /// The editor referenced an object the scene does not hold.
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),
}
