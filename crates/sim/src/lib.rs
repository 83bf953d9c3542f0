//! Ferrofluid Simulation Library
//!
//! 2D PIC/FLIP fluid simulation with:
//! - Particle-based fluid pulled toward a gravity point
//! - MAC grid for pressure solving
//! - Foam and bump shading attributes
//! - Display positions lifted onto a height field
//!
//! This crate is framework-agnostic - it handles simulation only and exposes
//! flat render buffers for whatever draws the particles.

pub mod config;
pub mod error;
pub mod flip;
pub mod grid;
pub mod heightfield;
pub mod particle;
pub mod physics;
pub mod schedule;
pub mod simulation;
pub mod spatial_hash;

pub use config::{ColorScheme, Palette, Rgba, Seeding, SimulationOptions, SolverParams};
pub use error::SimError;
pub use flip::{Diagnostics, FlipSolver};
pub use grid::{CellType, FluidGrid};
pub use heightfield::{FlatHeightField, HeightField, PyramidHeightField};
pub use particle::ParticleSet;
pub use schedule::FrameScheduler;
pub use simulation::{create_simulation, Attractor, Obstacle, Simulation};
pub use spatial_hash::SpatialHash;
