use std::any::Any;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use deskmate_core::config::ShutdownPolicy;
use deskmate_core::types::{Slot, TaskId, TaskRecord, TaskStatus};
use deskmate_core::{Error, Result};

use crate::task::WorkerTask;

type Payload = Box<dyn Any + Send>;
type Deliver = Box<dyn FnOnce(std::result::Result<Payload, String>)>;

/// Message a worker thread sends back to the owner when its task finishes.
pub struct Completion {
    pub id: TaskId,
    pub slot: Slot,
    outcome: std::result::Result<Payload, String>,
}

struct InFlight {
    record: TaskRecord<Payload>,
    handle: Option<JoinHandle<()>>,
    deliver: Deliver,
}

/// Runs [`WorkerTask`]s on dedicated threads and delivers their outcomes on
/// the thread that owns the runner.
///
/// The runner is deliberately `!Send`: callbacks may capture UI state that is
/// not thread-safe, and they only ever run inside [`poll`](Self::poll),
/// [`wait_next`](Self::wait_next) or [`run_until_idle`](Self::run_until_idle).
pub struct TaskRunner {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: HashMap<Slot, InFlight>,
    // Workers whose task was cancelled; joined only under `ShutdownPolicy::Block`.
    detached: Vec<JoinHandle<()>>,
    next_id: u64,
    policy: ShutdownPolicy,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::with_policy(ShutdownPolicy::default())
    }

    pub fn with_policy(policy: ShutdownPolicy) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: HashMap::new(),
            detached: Vec::new(),
            next_id: 1,
            policy,
        }
    }

    /// Start `task` on a new worker thread.
    ///
    /// Returns immediately. Fails with [`Error::Busy`] if the task's slot
    /// already has a task in flight; nothing is queued in that case.
    pub fn submit<I, O, S, F>(
        &mut self,
        task: WorkerTask<I, O>,
        on_success: S,
        on_failure: F,
    ) -> Result<TaskId>
    where
        I: Send + 'static,
        O: Send + 'static,
        S: FnOnce(O) + 'static,
        F: FnOnce(String) + 'static,
    {
        let slot = task.slot().clone();
        if self.in_flight.contains_key(&slot) {
            tracing::debug!(%slot, "rejecting submission, slot busy");
            return Err(Error::Busy { slot });
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let tx = self.tx.clone();
        let worker_slot = slot.clone();
        let handle = thread::Builder::new()
            .name(format!("deskmate-{slot}"))
            .spawn(move || {
                let outcome = task.run().map(|output| Box::new(output) as Payload);
                // A closed channel means the runner is gone; the outcome has nowhere to go.
                let _ = tx.send(Completion {
                    id,
                    slot: worker_slot,
                    outcome,
                });
            })
            .map_err(|e| Error::Operation(format!("failed to spawn worker thread: {e}")))?;

        let deliver: Deliver = Box::new(move |outcome| match outcome {
            Ok(payload) => match payload.downcast::<O>() {
                Ok(output) => on_success(*output),
                Err(_) => on_failure("task produced an unexpected result type".to_string()),
            },
            Err(message) => on_failure(message),
        });

        tracing::debug!(%slot, task = %id, "task submitted");
        self.in_flight.insert(
            slot.clone(),
            InFlight {
                record: TaskRecord::new(id, slot),
                handle: Some(handle),
                deliver,
            },
        );
        Ok(id)
    }

    pub fn is_busy(&self, slot: &Slot) -> bool {
        self.in_flight.contains_key(slot)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn status(&self, slot: &Slot) -> Option<(TaskId, TaskStatus)> {
        self.in_flight.get(slot).map(|f| (f.record.id, f.record.status()))
    }

    /// Best-effort cancellation. The worker keeps running, but its outcome is
    /// discarded and no callback fires. Frees the slot immediately.
    pub fn cancel(&mut self, slot: &Slot) -> bool {
        let Some(mut entry) = self.in_flight.remove(slot) else {
            return false;
        };
        tracing::debug!(%slot, task = %entry.record.id, "task cancelled");
        if let Some(handle) = entry.handle.take() {
            self.detached.push(handle);
        }
        true
    }

    /// Deliver every completion that has already arrived. Never blocks.
    /// Returns the number of callbacks run.
    pub fn poll(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            match self.rx.try_recv() {
                Ok(completion) => {
                    if self.dispatch(completion) {
                        delivered += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.reap_detached();
        delivered
    }

    /// Block until one callback has run or `timeout` elapses.
    pub fn wait_next(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if self.dispatch(completion) {
                        self.reap_detached();
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    /// Deliver completions until nothing is in flight. Returns `false` if
    /// `timeout` elapsed first.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.wait_next(remaining) {
                return self.in_flight.is_empty();
            }
        }
        true
    }

    /// Stop the runner according to its [`ShutdownPolicy`]. In-flight
    /// outcomes are discarded either way. Returns how many tasks were abandoned.
    pub fn shutdown(mut self) -> usize {
        self.close()
    }

    fn dispatch(&mut self, completion: Completion) -> bool {
        let current = self.in_flight.get(&completion.slot).map(|f| f.record.id);
        if current != Some(completion.id) {
            tracing::debug!(
                slot = %completion.slot,
                task = %completion.id,
                "discarding outcome of cancelled task"
            );
            return false;
        }
        let Some(mut entry) = self.in_flight.remove(&completion.slot) else {
            return false;
        };

        if let Err(e) = entry.record.resolve(completion.outcome) {
            tracing::warn!(error = %e, "ignoring duplicate completion");
            return false;
        }
        if let Some(handle) = entry.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(slot = %entry.record.slot, "worker thread exited abnormally");
            }
        }
        let task = entry.record.id;
        let outcome = entry
            .record
            .into_outcome()
            .unwrap_or_else(|| Err("task finished without an outcome".to_string()));
        if let Err(message) = &outcome {
            tracing::warn!(slot = %completion.slot, %task, error = %message, "task failed");
        } else {
            tracing::debug!(slot = %completion.slot, %task, "task succeeded");
        }
        (entry.deliver)(outcome);
        true
    }

    fn reap_detached(&mut self) {
        self.detached.retain(|h| !h.is_finished());
    }

    fn close(&mut self) -> usize {
        let abandoned = self.in_flight.len();
        let mut handles: Vec<JoinHandle<()>> = self.detached.drain(..).collect();
        handles.extend(self.in_flight.drain().filter_map(|(_, mut f)| f.handle.take()));
        if abandoned > 0 {
            tracing::info!(abandoned, policy = ?self.policy, "shutting down with tasks in flight");
        }
        if self.policy == ShutdownPolicy::Block {
            for handle in handles {
                let _ = handle.join();
            }
        }
        abandoned
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.close();
    }
}
