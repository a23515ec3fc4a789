//! Overmap generation library
//!
//! Re-exports modules for use by the binary and by tools that read save
//! directories.

pub mod buffer;
pub mod config;
pub mod dice;
pub mod error;
pub mod export;
pub mod generation;
pub mod monsters;
pub mod overmap;
pub mod persistence;
pub mod seeds;
pub mod terrain;
pub mod tilemap;

pub use buffer::OvermapBuffer;
pub use config::GenerationConfig;
pub use error::{OvermapError, Result};
pub use overmap::Overmap;
pub use seeds::WorldSeed;
