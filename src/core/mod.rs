//! # Core Module
//!
//! Shared concurrency primitives used throughout the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking and
//!   identity-based equality, used as the chunk handle type
//!
//! ## Usage
//! ```rust
//! use voxel_chunk_mesher::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;
