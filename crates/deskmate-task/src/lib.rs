//! Background task offloading.
//!
//! A [`WorkerTask`] wraps one blocking remote call with its captured input.
//! A [`TaskRunner`] lives on the owning (UI) thread, runs each task on its own
//! worker thread, and hands the outcome back through a channel that only the
//! owner drains. Callbacks therefore always run on the owner's thread.

pub mod runner;
pub mod task;

pub use runner::{Completion, TaskRunner};
pub use task::{describe_error, WorkerTask};
