use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use deskmate_core::types::Slot;

type Work<I, O> = Box<dyn FnOnce(I) -> anyhow::Result<O> + Send + 'static>;

/// One unit of background work: a slot, the captured input, and the call to
/// make with it.
pub struct WorkerTask<I, O> {
    slot: Slot,
    input: I,
    work: Work<I, O>,
}

impl<I, O> WorkerTask<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new<F>(slot: Slot, input: I, work: F) -> Self
    where
        F: FnOnce(I) -> anyhow::Result<O> + Send + 'static,
    {
        Self {
            slot,
            input,
            work: Box::new(work),
        }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Run the work on the current thread. Errors and panics both come back
    /// as a non-empty message; nothing unwinds past this call.
    pub fn run(self) -> Result<O, String> {
        let Self { input, work, .. } = self;
        match panic::catch_unwind(AssertUnwindSafe(move || work(input))) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(describe_error(&err)),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

/// Render an error and its causes on one line, never returning an empty string.
pub fn describe_error(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    if message.trim().is_empty() {
        "task failed without an error message".to_string()
    } else {
        message
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}
