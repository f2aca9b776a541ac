use thiserror::Error;

use crate::types::{Slot, TaskId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("Slot '{slot}' is busy with another task")]
    Busy { slot: Slot },

    #[error("Task {task} already completed")]
    AlreadyCompleted { task: TaskId },

    #[error("Remote service error: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, Error>;
