//! Domain types shared by the task runner, retrieval and pages.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

/// A logical "at most one in-flight task" scope, usually one per page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(Cow<'static, str>);

impl Slot {
    pub const fn named(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one submitted task. Monotonic per runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Completion state of a task, carrying the payload or the error message.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState<O> {
    Pending,
    Succeeded(O),
    Failed(String),
}

impl<O> TaskState<O> {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::Succeeded(_) => TaskStatus::Succeeded,
            Self::Failed(_) => TaskStatus::Failed,
        }
    }
}

/// Bookkeeping for one task. Leaves `Pending` at most once.
#[derive(Debug)]
pub struct TaskRecord<O> {
    pub id: TaskId,
    pub slot: Slot,
    state: TaskState<O>,
}

impl<O> TaskRecord<O> {
    pub fn new(id: TaskId, slot: Slot) -> Self {
        Self {
            id,
            slot,
            state: TaskState::Pending,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.state.status()
    }

    /// Move out of `Pending`. A second call fails with `AlreadyCompleted`
    /// and leaves the first outcome untouched.
    pub fn resolve(&mut self, outcome: std::result::Result<O, String>) -> Result<()> {
        if !matches!(self.state, TaskState::Pending) {
            return Err(Error::AlreadyCompleted { task: self.id });
        }
        self.state = match outcome {
            Ok(value) => TaskState::Succeeded(value),
            Err(message) => TaskState::Failed(message),
        };
        Ok(())
    }

    /// Consume the record, yielding its outcome if it has one.
    pub fn into_outcome(self) -> Option<std::result::Result<O, String>> {
        match self.state {
            TaskState::Pending => None,
            TaskState::Succeeded(value) => Some(Ok(value)),
            TaskState::Failed(message) => Some(Err(message)),
        }
    }
}

/// A contiguous slice of extracted document text and its embedding.
///
/// - `index`: position of the chunk within the source text
/// - `text`: at most `chunk_size` characters
/// - `embedding`: vector from the embedding collaborator (empty until embedded)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk with its similarity to the query. Higher is better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub score: f32,
    pub index: usize,
    pub text: String,
}
