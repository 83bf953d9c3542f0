//! Fluid particles for the FLIP simulation
//!
//! Structure-of-arrays storage. Physics state (position, velocity, density,
//! foam, bump) has one entry per active particle. The render buffers
//! (smoothed display position, normal, color) are sized to the capacity with
//! a fixed stride of four floats per particle, which is the layout the
//! renderer uploads as-is.

use glam::Vec2;

use crate::error::{Result, SimError};

/// Floats per particle in every render buffer.
pub const RENDER_STRIDE: usize = 4;

/// Offsets inside a display position entry.
pub const DISPLAY_X: usize = 0;
pub const DISPLAY_Y: usize = 1;
pub const DISPLAY_Z: usize = 2;
pub const DISPLAY_ACTIVITY: usize = 3;

/// Particle state for the FLIP solver.
#[derive(Clone, Debug)]
pub struct ParticleSet {
    max_particles: usize,
    /// Particle radius in simulation units
    pub radius: f32,
    /// Mean FLUID-cell density from the first step, 0.0 until then
    pub rest_density: f32,

    /// Positions in simulation units
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    /// Grid density interpolated at each particle
    pub density: Vec<f32>,
    /// 0..=1, set when the particle sits in a sparse region
    pub foam: Vec<f32>,
    /// 0..=5, grows with speed
    pub bump: Vec<f32>,

    /// Smoothed display position (x, height, z, activity)
    pub display_positions: Vec<[f32; RENDER_STRIDE]>,
    /// Height field normal (nx, ny, nz, 0)
    pub normals: Vec<[f32; RENDER_STRIDE]>,
    /// RGBA
    pub colors: Vec<[f32; RENDER_STRIDE]>,
}

impl ParticleSet {
    /// Empty set with room for `max_particles`.
    pub fn new(max_particles: usize, radius: f32) -> Self {
        Self {
            max_particles,
            radius,
            rest_density: 0.0,
            positions: Vec::with_capacity(max_particles),
            velocities: Vec::with_capacity(max_particles),
            density: Vec::with_capacity(max_particles),
            foam: Vec::with_capacity(max_particles),
            bump: Vec::with_capacity(max_particles),
            display_positions: vec![[0.0; RENDER_STRIDE]; max_particles],
            normals: vec![[0.0; RENDER_STRIDE]; max_particles],
            colors: vec![[0.0; RENDER_STRIDE]; max_particles],
        }
    }

    /// Add a particle at rest. Fails once the capacity is reached.
    pub fn spawn(&mut self, position: Vec2) -> Result<usize> {
        if self.positions.len() >= self.max_particles {
            return Err(SimError::config(format!(
                "particle capacity {} exhausted",
                self.max_particles
            )));
        }
        self.positions.push(position);
        self.velocities.push(Vec2::ZERO);
        self.density.push(0.0);
        self.foam.push(0.0);
        self.bump.push(0.0);
        Ok(self.positions.len() - 1)
    }

    /// Active particle count.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_particles
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(SimError::ParticleIndex {
                index,
                count: self.len(),
            })
        }
    }

    pub fn position(&self, index: usize) -> Result<Vec2> {
        self.check_index(index)?;
        Ok(self.positions[index])
    }

    pub fn velocity(&self, index: usize) -> Result<Vec2> {
        self.check_index(index)?;
        Ok(self.velocities[index])
    }

    pub fn set_position(&mut self, index: usize, position: Vec2) -> Result<()> {
        self.check_index(index)?;
        self.positions[index] = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, index: usize, velocity: Vec2) -> Result<()> {
        self.check_index(index)?;
        self.velocities[index] = velocity;
        Ok(())
    }

    /// Display positions as a flat `[x, y, z, activity, ...]` slice.
    pub fn display_position_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.display_positions)
    }

    /// Normals as a flat `[nx, ny, nz, 0, ...]` slice.
    pub fn normal_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Colors as a flat `[r, g, b, a, ...]` slice.
    pub fn color_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Total kinetic energy, unit mass per particle.
    pub fn kinetic_energy(&self) -> f32 {
        self.velocities
            .iter()
            .map(|v| 0.5 * v.length_squared())
            .sum()
    }

    /// Largest particle speed.
    pub fn max_speed(&self) -> f32 {
        self.velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0f32, f32::max)
    }
}
