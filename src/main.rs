//! # Voxel Chunk Mesher Demo
//!
//! Builds a small Perlin-noise terrain, then carves and fills random voxels while a
//! fixed-step loop ticks the mesher, the way a game host would.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{error, info};
use noise::{NoiseFn, Perlin};
use web_time::Instant;

use voxel_chunk_mesher::{
    init_logger, InMemoryBackend, MeshManager, MesherConfig, Voxel, VoxelResult, World,
    CHUNK_SIZE,
};

/// Chunks generated along X and Z on each side of the origin.
const TERRAIN_RADIUS: i32 = 2;
const PERLIN_SCALE_FACTOR: f64 = 0.03;
const TERRAIN_BASE_HEIGHT: f64 = 12.0;
const TERRAIN_AMPLITUDE: f64 = 10.0;

const FIXED_STEP: Duration = Duration::from_millis(16);
const SIMULATED_STEPS: u32 = 120;
const EDITS_PER_STEP: u32 = 8;

fn main() {
    init_logger();
    if let Err(err) = run() {
        error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}

fn run() -> VoxelResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => MesherConfig::load(path)?,
        None => MesherConfig::default(),
    };

    let backend = Arc::new(InMemoryBackend::new());
    let mut mesher = MeshManager::new(config, backend.clone())?;
    let mut world = World::new(mesher.update_sender(), backend.clone());

    let start = Instant::now();
    let written = generate_terrain(&mut world)?;
    info!(
        "Generated {} voxels in {} chunks in {:?}",
        written,
        world.chunk_count(),
        start.elapsed()
    );

    let extent = (TERRAIN_RADIUS * CHUNK_SIZE) as f32;
    let mut rng = fastrand::Rng::with_seed(7);
    let mut next_step = Instant::now();
    for _ in 0..SIMULATED_STEPS {
        for _ in 0..EDITS_PER_STEP {
            let position = Point3::new(
                (rng.f32() * 2.0 - 1.0) * extent,
                rng.f32() * (TERRAIN_BASE_HEIGHT + TERRAIN_AMPLITUDE) as f32,
                (rng.f32() * 2.0 - 1.0) * extent,
            );
            let voxel = if rng.bool() {
                Voxel::EMPTY
            } else {
                Voxel::new(rng.u8(1..=3))
            };
            world.set_voxel(position, voxel)?;
        }

        mesher.tick();

        next_step += FIXED_STEP;
        let now = Instant::now();
        if next_step > now {
            std::thread::sleep(next_step - now);
        }
    }

    mesher.flush();
    let stats = mesher.stats();
    info!(
        "Meshed {} chunks in {} batches ({} failed, {} dropped), {} commits",
        stats.chunks_meshed,
        stats.batches_completed,
        stats.batches_failed,
        stats.chunks_dropped,
        backend.commit_calls()
    );

    let vertices: usize = world
        .chunk_positions()
        .filter_map(|position| world.chunk_at(position))
        .map(|chunk| chunk.get().mesh().vertex_count())
        .sum();
    info!("World surface holds {} vertices", vertices);
    Ok(())
}

/// Fills columns up to a noise-driven height and returns the number of voxels written.
fn generate_terrain(world: &mut World) -> VoxelResult<usize> {
    let perlin = Perlin::new(0);
    let extent = TERRAIN_RADIUS * CHUNK_SIZE;
    let mut written = 0;

    for z in -extent..extent {
        for x in -extent..extent {
            let sample = perlin.get([x as f64 * PERLIN_SCALE_FACTOR, z as f64 * PERLIN_SCALE_FACTOR]);
            let height = (TERRAIN_BASE_HEIGHT + sample * TERRAIN_AMPLITUDE) as i32;
            for y in 0..height.max(1) {
                let voxel = if y + 3 >= height {
                    Voxel::new(1)
                } else {
                    Voxel::new(2)
                };
                if world.set_voxel(Point3::new(x as f32, y as f32, z as f32), voxel)? {
                    written += 1;
                }
            }
        }
    }
    Ok(written)
}
