//! # Chunk Meshing
//!
//! This module turns dirty chunks into committed meshes. The [`MeshManager`] drains the
//! shared update queue in bounded batches and pushes each batch through the pipeline:
//!
//! 1. **Snapshot**: every selected chunk's voxels are copied into one contiguous batch
//!    buffer, so later writes to those chunks cannot race the workers
//! 2. **Generate**: a single worker job takes the shared vertex and index pools and runs
//!    culled face extraction for every chunk of the batch straight into them, recording
//!    each chunk's counts
//! 3. **Pack**: one worker task per chunk copies its slice of the pools into a
//!    destination mesh
//! 4. **Commit**: the packed meshes go to the [`MeshBackend`] in one call
//! 5. **Bake**: one worker task per chunk asks the backend to bake its collider, after
//!    which the chunk's collider state is refreshed
//!
//! Only one batch is in flight at a time. The manager never blocks inside
//! [`MeshManager::tick`]; it polls the outstanding stage and moves on when every task of
//! that stage has reported.

pub mod backend;
pub mod mesh;
pub mod update_queue;
pub mod vertex;

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use log::{debug, error, info, warn};
use web_time::Instant;

use crate::config::MesherConfig;
use crate::engine_state::task_management::{TaskManager, TaskSet};
use crate::engine_state::voxels::{addressing::CHUNK_VOLUME, chunk::ChunkRef, voxel::Voxel};
use crate::error::{VoxelError, VoxelResult};

pub use backend::{BakeRecord, ChunkFactory, InMemoryBackend, MeshBackend, MeshCommit, MeshId};
pub use mesh::{
    compute_slice_ranges, generate_chunk_mesh, CountPair, MeshBounds, MeshPools, MeshSection,
    PackedMesh, SliceRange,
};
pub use update_queue::{SharedUpdateQueue, UniqueQueue};
pub use vertex::{Vertex, VertexAttribute, VertexAttributeDescriptor};

/// Counters describing the scheduler's work so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshingStats {
    /// Drain cycles started.
    pub drain_cycles: u64,
    /// Batches that went through every stage.
    pub batches_completed: u64,
    /// Batches that failed at some stage.
    pub batches_failed: u64,
    /// Chunks whose mesh and collider were refreshed.
    pub chunks_meshed: u64,
    /// Chunks given up on after exhausting their retries.
    pub chunks_dropped: u64,
}

/// Pipeline stage the scheduler is currently waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainStage {
    /// No batch in flight.
    Idle,
    /// Waiting for face extraction.
    Generating,
    /// Waiting for slices to be copied into destination meshes.
    Packing,
    /// Waiting for collider bakes.
    Baking,
}

/// Chunks of the batch in flight, in dequeue order.
struct Batch {
    chunks: Vec<ChunkRef>,
    started: Instant,
}

enum DrainState {
    Idle,
    Generating {
        batch: Batch,
        tasks: TaskSet<GeneratedPools>,
    },
    Packing {
        batch: Batch,
        tasks: TaskSet<VoxelResult<PackedMesh>>,
    },
    Baking {
        batch: Batch,
        tasks: TaskSet<VoxelResult<()>>,
    },
}

/// The pools handed back by the generation job, with the job's outcome. The pools come
/// back even on failure so their allocations survive.
type GeneratedPools = (MeshPools, VoxelResult<()>);

enum Progress<T> {
    Ready(Vec<VoxelResult<T>>),
    Pending(TaskSet<T>),
}

fn poll_stage<T>(mut tasks: TaskSet<T>, block: bool) -> Progress<T> {
    if block {
        Progress::Ready(tasks.wait_all())
    } else if tasks.try_complete_all() {
        Progress::Ready(tasks.into_results())
    } else {
        Progress::Pending(tasks)
    }
}

/// Collapses worker-level and job-level failures, keeping the first error.
fn flatten_results<T>(results: Vec<VoxelResult<VoxelResult<T>>>) -> VoxelResult<Vec<T>> {
    results.into_iter().map(|result| result.and_then(|inner| inner)).collect()
}

/// The batch scheduler.
///
/// Owns the worker pool and the long-lived scratch buffers (batch voxel buffer, vertex
/// and index pools, per-slot mesh ids). Scratch shared with workers is reclaimed only
/// once every task of the stage has reported, and dropping the manager completes the
/// batch in flight before anything is released.
pub struct MeshManager {
    config: MesherConfig,
    updates: SharedUpdateQueue,
    task_manager: TaskManager,
    backend: Arc<dyn MeshBackend>,
    batch_voxels: Arc<Vec<Voxel>>,
    pools: Arc<MeshPools>,
    mesh_ids: Vec<MeshId>,
    state: DrainState,
    draining: bool,
    retries: HashMap<ChunkRef, u32>,
    stats: MeshingStats,
}

impl MeshManager {
    /// Creates a scheduler with its own update queue and worker pool.
    ///
    /// # Errors
    /// `InvalidConfig` for a rejected configuration, `WorkerSpawn` if the pool cannot start.
    pub fn new(config: MesherConfig, backend: Arc<dyn MeshBackend>) -> VoxelResult<Self> {
        config.validate()?;
        let task_manager = TaskManager::new(config.resolved_worker_threads())?;
        info!(
            "Mesh manager ready: batch size {}, {} workers, {} retries",
            config.batch_size,
            task_manager.num_workers(),
            config.max_batch_retries
        );

        Ok(MeshManager {
            batch_voxels: Arc::new(Vec::with_capacity(config.batch_size * CHUNK_VOLUME)),
            pools: Arc::new(MeshPools::new()),
            mesh_ids: Vec::with_capacity(config.batch_size),
            config,
            updates: SharedUpdateQueue::new(),
            task_manager,
            backend,
            state: DrainState::Idle,
            draining: false,
            retries: HashMap::new(),
            stats: MeshingStats::default(),
        })
    }

    /// A handle to the queue this manager drains. Worlds submit dirty chunks through it.
    pub fn update_sender(&self) -> SharedUpdateQueue {
        self.updates.clone()
    }

    /// The active configuration.
    pub fn config(&self) -> &MesherConfig {
        &self.config
    }

    /// Counters so far.
    pub fn stats(&self) -> MeshingStats {
        self.stats
    }

    /// Number of chunks waiting in the update queue.
    pub fn pending(&self) -> usize {
        self.updates.len()
    }

    /// Stage of the batch in flight.
    pub fn stage(&self) -> DrainStage {
        match self.state {
            DrainState::Idle => DrainStage::Idle,
            DrainState::Generating { .. } => DrainStage::Generating,
            DrainState::Packing { .. } => DrainStage::Packing,
            DrainState::Baking { .. } => DrainStage::Baking,
        }
    }

    /// Returns `true` while a drain cycle is active.
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// One fixed-step scheduling tick.
    ///
    /// Starts a drain cycle if idle and the queue is non-empty, and advances the batch in
    /// flight as far as finished work allows. Never blocks on workers.
    pub fn tick(&mut self) {
        self.drive(false);
    }

    /// Runs the drain cycle until the queue is empty and no batch is in flight.
    pub fn flush(&mut self) {
        self.drive(true);
    }

    fn drive(&mut self, block: bool) {
        loop {
            let state = mem::replace(&mut self.state, DrainState::Idle);
            let (next, progressed) = self.advance(state, block);
            self.state = next;
            if !progressed {
                break;
            }
        }
    }

    /// Moves the state machine by at most one stage. Returns the new state and whether
    /// anything changed.
    fn advance(&mut self, state: DrainState, block: bool) -> (DrainState, bool) {
        match state {
            DrainState::Idle => {
                if self.updates.is_empty() {
                    if self.draining {
                        self.draining = false;
                        info!("Drain cycle finished: {:?}", self.stats);
                    }
                    return (DrainState::Idle, false);
                }
                if !self.draining {
                    self.draining = true;
                    self.stats.drain_cycles += 1;
                    info!("Drain cycle started with {} dirty chunks", self.updates.len());
                }
                (self.start_batch(), true)
            }
            DrainState::Generating { batch, tasks } => match poll_stage(tasks, block) {
                Progress::Pending(tasks) => (DrainState::Generating { batch, tasks }, false),
                Progress::Ready(results) => (self.finish_generation(batch, results), true),
            },
            DrainState::Packing { batch, tasks } => match poll_stage(tasks, block) {
                Progress::Pending(tasks) => (DrainState::Packing { batch, tasks }, false),
                Progress::Ready(results) => (self.finish_packing(batch, results), true),
            },
            DrainState::Baking { batch, tasks } => match poll_stage(tasks, block) {
                Progress::Pending(tasks) => (DrainState::Baking { batch, tasks }, false),
                Progress::Ready(results) => (self.finish_baking(batch, results), true),
            },
        }
    }

    fn start_batch(&mut self) -> DrainState {
        let batch = Batch {
            chunks: self.updates.take_batch(self.config.batch_size),
            started: Instant::now(),
        };
        debug!("Batch of {} chunks: generating", batch.chunks.len());
        match self.spawn_generation(&batch) {
            Ok(tasks) => DrainState::Generating { batch, tasks },
            Err(err) => self.fail_batch(batch, err),
        }
    }

    fn spawn_generation(&mut self, batch: &Batch) -> VoxelResult<TaskSet<GeneratedPools>> {
        let scratch = Arc::get_mut(&mut self.batch_voxels).ok_or(VoxelError::ScratchInUse)?;
        scratch.clear();
        scratch.resize(batch.chunks.len() * CHUNK_VOLUME, Voxel::EMPTY);
        self.mesh_ids.clear();

        for (slot, chunk) in batch.chunks.iter().enumerate() {
            let chunk = chunk.get();
            chunk.copy_voxels_into(&mut scratch[slot * CHUNK_VOLUME..(slot + 1) * CHUNK_VOLUME])?;
            self.mesh_ids.push(chunk.mesh_id());
        }

        let mut pools = mem::take(Arc::get_mut(&mut self.pools).ok_or(VoxelError::ScratchInUse)?);
        let voxels = Arc::clone(&self.batch_voxels);
        let handle = self.task_manager.publish(move || {
            let generated = pools.generate_batch(&voxels);
            (pools, generated)
        });
        Ok(TaskSet::new(vec![handle]))
    }

    fn finish_generation(
        &mut self,
        batch: Batch,
        results: Vec<VoxelResult<GeneratedPools>>,
    ) -> DrainState {
        let generated = match results.into_iter().next() {
            Some(Ok((pools, generated))) => {
                self.restore_pools(pools);
                generated
            }
            Some(Err(err)) => Err(err),
            None => Err(VoxelError::WorkerDisconnected),
        };
        match generated.and_then(|()| self.spawn_packing()) {
            Ok(tasks) => {
                debug!("Batch of {} chunks: packing", batch.chunks.len());
                DrainState::Packing { batch, tasks }
            }
            Err(err) => self.fail_batch(batch, err),
        }
    }

    /// Puts the pools returned by the generation job back into the shared slot.
    fn restore_pools(&mut self, pools: MeshPools) {
        if let Some(slot) = Arc::get_mut(&mut self.pools) {
            *slot = pools;
            return;
        }
        self.pools = Arc::new(pools);
    }

    fn spawn_packing(&mut self) -> VoxelResult<TaskSet<VoxelResult<PackedMesh>>> {
        let ranges = self.pools.slice_ranges();
        debug!(
            "Pools hold {} vertices and {} indices",
            self.pools.vertices().len(),
            self.pools.indices().len()
        );

        let mut handles = Vec::with_capacity(ranges.len());
        for (range, mesh_id) in ranges.into_iter().zip(self.mesh_ids.iter().copied()) {
            let pools = Arc::clone(&self.pools);
            handles.push(
                self.task_manager
                    .publish(move || pools.pack(mesh_id.0, &range)),
            );
        }
        Ok(TaskSet::new(handles))
    }

    fn finish_packing(
        &mut self,
        batch: Batch,
        results: Vec<VoxelResult<VoxelResult<PackedMesh>>>,
    ) -> DrainState {
        let spawned = flatten_results(results)
            .and_then(|meshes| self.commit(&batch, meshes))
            .map(|()| self.spawn_bakes());
        match spawned {
            Ok(tasks) => {
                debug!("Batch of {} chunks: baking colliders", batch.chunks.len());
                DrainState::Baking { batch, tasks }
            }
            Err(err) => self.fail_batch(batch, err),
        }
    }

    fn commit(&mut self, batch: &Batch, meshes: Vec<PackedMesh>) -> VoxelResult<()> {
        {
            let commits: Vec<MeshCommit<'_>> = batch
                .chunks
                .iter()
                .zip(self.mesh_ids.iter())
                .zip(meshes.iter())
                .map(|((chunk, mesh_id), mesh)| MeshCommit {
                    mesh_id: *mesh_id,
                    chunk_position: chunk.get().position(),
                    bounds: mesh.bounds(),
                    mesh,
                })
                .collect();
            self.backend.commit_meshes(&commits)?;
        }

        for (chunk, mesh) in batch.chunks.iter().zip(meshes) {
            chunk.get_mut().set_mesh(mesh);
        }
        Ok(())
    }

    fn spawn_bakes(&mut self) -> TaskSet<VoxelResult<()>> {
        let convex = self.config.convex_colliders;
        let mut handles = Vec::with_capacity(self.mesh_ids.len());
        for mesh_id in self.mesh_ids.iter().copied() {
            let backend = Arc::clone(&self.backend);
            handles.push(
                self.task_manager
                    .publish(move || backend.bake_collider(mesh_id, convex)),
            );
        }
        TaskSet::new(handles)
    }

    fn finish_baking(&mut self, batch: Batch, results: Vec<VoxelResult<VoxelResult<()>>>) -> DrainState {
        if let Err(err) = flatten_results(results) {
            return self.fail_batch(batch, err);
        }

        for chunk in &batch.chunks {
            chunk.get_mut().update_collider();
            self.retries.remove(chunk);
        }
        self.stats.batches_completed += 1;
        self.stats.chunks_meshed += batch.chunks.len() as u64;
        debug!(
            "Batch of {} chunks completed in {:?}",
            batch.chunks.len(),
            batch.started.elapsed()
        );
        DrainState::Idle
    }

    /// Re-enqueues the batch's chunks, dropping those out of retries.
    fn fail_batch(&mut self, batch: Batch, err: VoxelError) -> DrainState {
        self.stats.batches_failed += 1;
        warn!(
            "Batch of {} chunks failed after {:?}: {}",
            batch.chunks.len(),
            batch.started.elapsed(),
            err
        );

        for chunk in batch.chunks {
            let attempts = self.retries.entry(chunk.clone()).or_insert(0);
            *attempts += 1;
            if *attempts > self.config.max_batch_retries {
                self.retries.remove(&chunk);
                self.stats.chunks_dropped += 1;
                error!(
                    "Dropping chunk {:?} after {} failed batches",
                    chunk.get().position(),
                    self.config.max_batch_retries + 1
                );
            } else {
                self.updates.submit(chunk);
            }
        }
        DrainState::Idle
    }
}

impl Drop for MeshManager {
    fn drop(&mut self) {
        if !matches!(self.state, DrainState::Idle) {
            debug!("Mesh manager dropped mid-batch, completing {:?}", self.stage());
        }
        while !matches!(self.state, DrainState::Idle) {
            let state = mem::replace(&mut self.state, DrainState::Idle);
            self.state = self.advance(state, true).0;
        }
    }
}
