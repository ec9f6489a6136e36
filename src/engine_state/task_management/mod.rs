//! # Task Management System
//!
//! This module provides a small worker pool for running CPU-bound work off the
//! scheduling thread. The mesher publishes a single generation job per batch, then one
//! task per chunk for packing and baking, and polls the returned handles from its tick.
//!
//! ## Architecture Overview
//! - [`TaskManager`]: owns the worker threads and distributes tasks
//! - [`Task`]: a unit of work executed on a worker
//! - [`TaskHandle`]: the publisher's side of one task's result
//! - [`TaskSet`]: an ordered group of handles that completes as a whole
//!
//! ## Implementation
//! - Uses `std::thread` for true multi-threading
//! - Each worker has a dedicated channel for task distribution
//! - Tasks are handed out round-robin across the channels
//! - Each task carries its own result channel, so results never mix across batches
//!
//! ## Example Usage
//! ```
//! use voxel_chunk_mesher::engine_state::task_management::{TaskManager, TaskSet};
//!
//! let mut task_manager = TaskManager::new(2).unwrap();
//! let handles = (0..4).map(|i| task_manager.publish(move || i * i)).collect();
//! let results = TaskSet::new(handles).wait_all();
//! assert_eq!(results.into_iter().map(Result::unwrap).collect::<Vec<_>>(), vec![0, 1, 4, 9]);
//! ```

pub mod task;

use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::error::{VoxelError, VoxelResult};

pub use task::{Task, TaskHandle, TaskSet};
use task::ClosureTask;

/// A communication channel between the publishing thread and one worker thread.
#[derive(Debug)]
struct TaskChannel {
    task_sender: Option<Sender<Box<dyn Task>>>,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and distributes tasks to them.
///
/// Dropping the manager closes every channel and joins the workers after they have
/// drained the tasks already sent to them.
#[derive(Debug)]
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    current_channel: usize,
    tasks_published: u64,
}

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` threads (at least one).
    ///
    /// # Errors
    /// `WorkerSpawn` if the operating system refuses to start a thread.
    pub fn new(num_workers: usize) -> VoxelResult<Self> {
        let num_workers = num_workers.max(1);
        info!(
            "Available parallelism: {:?}, starting {} mesh workers",
            thread::available_parallelism(),
            num_workers
        );

        let mut channels = Vec::with_capacity(num_workers);
        for worker_index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    task.process();
                }
            };

            let worker = thread::Builder::new()
                .name(format!("mesh-worker-{}", worker_index))
                .spawn(task_closure)
                .map_err(VoxelError::WorkerSpawn)?;

            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                worker: Some(worker),
            });
        }

        Ok(TaskManager {
            channels,
            current_channel: 0,
            tasks_published: 0,
        })
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Total number of tasks handed to workers so far.
    pub fn tasks_published(&self) -> u64 {
        self.tasks_published
    }

    /// Publishes `job` for execution on the next worker in round-robin order.
    ///
    /// Never blocks. If the chosen worker is gone, the returned handle resolves to
    /// `WorkerDisconnected`.
    pub fn publish<F, T>(&mut self, job: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = channel();
        let task: Box<dyn Task> = Box::new(ClosureTask::new(job, result_tx));

        let channel_idx = self.current_channel;
        self.current_channel = (channel_idx + 1) % self.channels.len();
        self.tasks_published += 1;

        match &self.channels[channel_idx].task_sender {
            Some(sender) => {
                if sender.send(task).is_err() {
                    warn!("Mesh worker {} is disconnected, dropping task", channel_idx);
                }
            }
            None => warn!("Mesh worker {} is shut down, dropping task", channel_idx),
        }

        TaskHandle::new(result_rx)
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in &mut self.channels {
            channel.task_sender.take();
        }
        for (worker_index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    warn!("Mesh worker {} terminated abnormally", worker_index);
                }
            }
        }
        debug!(
            "Task manager shut down after {} tasks",
            self.tasks_published
        );
    }
}
