//! # Task System Core Types
//!
//! This module defines the building blocks of the task system: the unit of work sent
//! to a worker, and the handles the publishing thread keeps to collect results.
//!
//! ## Task Lifecycle
//! 1. A closure is wrapped into a [`Task`] by `TaskManager::publish()`
//! 2. The task's `process()` method runs on a worker thread
//! 3. The closure's output (or its panic) travels back over a one-shot channel
//! 4. The owner of the [`TaskHandle`] polls or blocks on that channel
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - Results must be `Send` to be transferred back to the publishing thread
//! - A panicking job is caught on the worker and reported as an error, so the worker
//!   keeps serving later tasks

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use crate::error::{VoxelError, VoxelResult};

/// A unit of work that can be executed on a worker thread.
///
/// Tasks own all the data they need. Processing consumes the task.
pub trait Task: Send {
    /// Runs the task to completion on the current thread.
    fn process(self: Box<Self>);
}

/// Outcome sent back by a worker: the job's value or the panic message.
pub(crate) type TaskOutcome<T> = Result<T, String>;

/// A [`Task`] running a closure and reporting its output through a channel.
pub(crate) struct ClosureTask<F, T> {
    job: F,
    result_sender: Sender<TaskOutcome<T>>,
}

impl<F, T> ClosureTask<F, T> {
    pub(crate) fn new(job: F, result_sender: Sender<TaskOutcome<T>>) -> Self {
        ClosureTask { job, result_sender }
    }
}

impl<F, T> Task for ClosureTask<F, T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    fn process(self: Box<Self>) {
        let ClosureTask { job, result_sender } = *self;
        let outcome = panic::catch_unwind(AssertUnwindSafe(job)).map_err(panic_message);
        // The handle may have been dropped; nobody is waiting then.
        let _ = result_sender.send(outcome);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Completion handle for one published task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    result_receiver: Receiver<TaskOutcome<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(result_receiver: Receiver<TaskOutcome<T>>) -> Self {
        TaskHandle { result_receiver }
    }

    /// Returns the task's result if it has finished, without blocking.
    ///
    /// Yields `Some` exactly once per task. A job that panicked resolves to
    /// `TaskPanicked`; a task whose worker went away resolves to `WorkerDisconnected`.
    pub fn try_complete(&self) -> Option<VoxelResult<T>> {
        match self.result_receiver.try_recv() {
            Ok(outcome) => Some(outcome.map_err(VoxelError::TaskPanicked)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(VoxelError::WorkerDisconnected)),
        }
    }

    /// Blocks until the task has finished and returns its result.
    pub fn complete(self) -> VoxelResult<T> {
        match self.result_receiver.recv() {
            Ok(outcome) => outcome.map_err(VoxelError::TaskPanicked),
            Err(_) => Err(VoxelError::WorkerDisconnected),
        }
    }
}

/// An ordered group of tasks that completes only when all of its members have.
#[derive(Debug)]
pub struct TaskSet<T> {
    handles: Vec<Option<TaskHandle<T>>>,
    results: Vec<Option<VoxelResult<T>>>,
}

impl<T> TaskSet<T> {
    /// Groups `handles`, keeping their order for the results.
    pub fn new(handles: Vec<TaskHandle<T>>) -> Self {
        let results = handles.iter().map(|_| None).collect();
        TaskSet {
            handles: handles.into_iter().map(Some).collect(),
            results,
        }
    }

    /// Number of tasks in the set.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the set holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Collects whatever has finished. Returns `true` once every member has resolved.
    pub fn try_complete_all(&mut self) -> bool {
        for (slot, result) in self.handles.iter_mut().zip(self.results.iter_mut()) {
            if let Some(handle) = slot {
                if let Some(outcome) = handle.try_complete() {
                    *result = Some(outcome);
                    *slot = None;
                }
            }
        }
        self.handles.iter().all(Option::is_none)
    }

    /// Blocks until every member has resolved and returns the results in order.
    pub fn wait_all(mut self) -> Vec<VoxelResult<T>> {
        for (slot, result) in self.handles.iter_mut().zip(self.results.iter_mut()) {
            if let Some(handle) = slot.take() {
                *result = Some(handle.complete());
            }
        }
        self.into_results()
    }

    /// Results in publish order.
    ///
    /// Only meaningful after [`TaskSet::try_complete_all`] returned `true`; members that
    /// have not resolved yet are reported as `WorkerDisconnected`.
    pub fn into_results(self) -> Vec<VoxelResult<T>> {
        self.results
            .into_iter()
            .map(|result| result.unwrap_or(Err(VoxelError::WorkerDisconnected)))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    fn run<T: Send + 'static>(job: impl FnOnce() -> T + Send + 'static) -> TaskHandle<T> {
        let (sender, receiver) = channel();
        Box::new(ClosureTask::new(job, sender)).process();
        TaskHandle::new(receiver)
    }

    #[test]
    fn closure_result_is_delivered() {
        let handle = run(|| 6 * 7);
        assert_eq!(handle.try_complete().unwrap().unwrap(), 42);
    }

    #[test]
    fn panic_is_reported_not_propagated() {
        let handle = run(|| -> u32 { panic!("chunk exploded") });
        match handle.complete() {
            Err(VoxelError::TaskPanicked(message)) => assert!(message.contains("chunk exploded")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn pending_handle_stays_pending() {
        let (_sender, receiver) = channel::<TaskOutcome<u8>>();
        let handle = TaskHandle::new(receiver);
        assert!(handle.try_complete().is_none());
    }

    #[test]
    fn set_keeps_publish_order() {
        let mut set = TaskSet::new(vec![run(|| 1), run(|| 2), run(|| 3)]);
        assert!(set.try_complete_all());
        let values: Vec<i32> = set.into_results().into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn set_waits_for_every_member() {
        let (sender, receiver) = channel();
        let mut set = TaskSet::new(vec![run(|| 1), TaskHandle::new(receiver)]);
        assert!(!set.try_complete_all());
        sender.send(Ok(2)).unwrap();
        assert!(set.try_complete_all());
        assert_eq!(set.len(), 2);
    }
}
