//! Simulation configuration.
//!
//! [`SolverParams`] holds the per-step tunables, [`SimulationOptions`] the scene
//! setup. Both round-trip through serde so a driver can load them from JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// RGBA color as consumed by the render layer.
pub type Rgba = [f32; 4];

/// Solver tunables read every step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Point the particles are pulled toward (not a direction).
    pub gravity: Vec2,
    /// Strength of the inverse-square pull toward `gravity`.
    pub gravity_strength: f32,
    /// 0.0 = pure PIC, 1.0 = pure FLIP.
    pub flip_ratio: f32,
    pub num_pressure_iters: usize,
    pub num_particle_iters: usize,
    /// SOR factor for the pressure relaxation.
    pub over_relaxation: f32,
    /// Push back against volume gain in compressed cells.
    pub compensate_drift: bool,
    pub separate_particles: bool,
    pub obstacle_radius: f32,
    pub num_sub_steps: usize,
    /// Fluid density, only scales the accumulated pressure.
    pub fluid_density: f32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.5, 0.6),
            gravity_strength: 0.14,
            flip_ratio: 0.9,
            num_pressure_iters: 50,
            num_particle_iters: 2,
            over_relaxation: 1.9,
            compensate_drift: true,
            separate_particles: true,
            obstacle_radius: 0.15,
            num_sub_steps: 1,
            fluid_density: 10.0,
        }
    }
}

impl SolverParams {
    /// Reject values that would make a step meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() || !self.gravity_strength.is_finite() {
            return Err(SimError::config("gravity must be finite"));
        }
        if !(0.0..=1.0).contains(&self.flip_ratio) {
            return Err(SimError::config(format!(
                "flip_ratio must be in [0, 1], got {}",
                self.flip_ratio
            )));
        }
        if !(self.over_relaxation > 0.0 && self.over_relaxation.is_finite()) {
            return Err(SimError::config(format!(
                "over_relaxation must be positive, got {}",
                self.over_relaxation
            )));
        }
        if self.num_sub_steps == 0 {
            return Err(SimError::config("num_sub_steps must be at least 1"));
        }
        if !(self.obstacle_radius >= 0.0 && self.obstacle_radius.is_finite()) {
            return Err(SimError::config("obstacle_radius must be non-negative"));
        }
        if !(self.fluid_density > 0.0 && self.fluid_density.is_finite()) {
            return Err(SimError::config("fluid_density must be positive"));
        }
        Ok(())
    }
}

/// Light or dark page theme. Only affects colors and foam diffusion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// Cosmetic constants resolved once from a [`ColorScheme`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub base_color: Rgba,
    pub foam_color: Rgba,
    pub bump_color: Rgba,
    /// How fast foam evens out between touching particles.
    pub foam_diffusion: f32,
}

impl Palette {
    pub fn for_scheme(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Dark => Self {
                base_color: [0.1, 0.1, 0.1, 0.0],
                foam_color: [0.1, 0.1, 0.1, 1.0],
                bump_color: [0.2, 0.4, 2.0, 1.0],
                foam_diffusion: 0.1,
            },
            ColorScheme::Light => Self {
                base_color: [0.1, 0.1, 0.1, 0.0],
                foam_color: [0.1, 0.1, 0.1, 1.0],
                bump_color: [0.1, 0.1, 4.0, 1.0],
                foam_diffusion: 0.01,
            },
        }
    }
}

impl From<ColorScheme> for Palette {
    fn from(scheme: ColorScheme) -> Self {
        Self::for_scheme(scheme)
    }
}

/// Initial particle placement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// `particles_x * particles_y` particles evenly spaced on a circle.
    #[default]
    Vogel,
    /// Exact positions in simulation units.
    Explicit(Vec<[f32; 2]>),
}

/// Scene setup options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    pub color_scheme: ColorScheme,
    /// Domain width in simulation units.
    pub width: f32,
    /// Domain height in simulation units.
    pub height: f32,
    /// Grid cells per domain unit of height.
    pub resolution: usize,
    /// Particle radius as a multiple of the requested cell spacing.
    pub radius_scale: f32,
    pub particles_x: usize,
    pub particles_y: usize,
    pub max_particles: usize,
    pub seed_radius: f32,
    pub seed_center: Vec2,
    /// Simulation-to-display scale for the smoothed positions.
    pub display_scale: f32,
    pub seeding: Seeding,
    pub params: SolverParams,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Light,
            width: 1.0,
            height: 1.0,
            resolution: 35,
            radius_scale: 1.9,
            particles_x: 16,
            particles_y: 16,
            max_particles: 256,
            seed_radius: 0.1,
            seed_center: Vec2::splat(0.5),
            display_scale: 1.2,
            seeding: Seeding::Vogel,
            params: SolverParams::default(),
        }
    }
}

impl SimulationOptions {
    /// Default options with the given color scheme.
    pub fn with_color_scheme(color_scheme: ColorScheme) -> Self {
        Self {
            color_scheme,
            ..Default::default()
        }
    }

    /// Number of particles the seeding will produce.
    pub fn num_particles(&self) -> usize {
        match &self.seeding {
            Seeding::Vogel => self.particles_x * self.particles_y,
            Seeding::Explicit(points) => points.len(),
        }
    }

    /// Requested grid spacing derived from height and resolution.
    pub fn spacing(&self) -> f32 {
        self.height / self.resolution as f32
    }

    /// Fail fast on anything that cannot be simulated.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.width.is_finite())
            || !(self.height > 0.0 && self.height.is_finite())
        {
            return Err(SimError::config(format!(
                "domain size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.resolution == 0 {
            return Err(SimError::config("resolution must be at least 1"));
        }
        if !(self.radius_scale > 0.0 && self.radius_scale.is_finite()) {
            return Err(SimError::config("radius_scale must be positive"));
        }
        if self.max_particles == 0 {
            return Err(SimError::config("max_particles must be at least 1"));
        }
        let count = self.num_particles();
        if count > self.max_particles {
            return Err(SimError::config(format!(
                "{} particles requested but max_particles is {}",
                count, self.max_particles
            )));
        }
        if let Seeding::Explicit(points) = &self.seeding {
            if points.iter().flatten().any(|c| !c.is_finite()) {
                return Err(SimError::config("seed positions must be finite"));
            }
        }
        if !self.seed_center.is_finite() || !self.seed_radius.is_finite() {
            return Err(SimError::config("seed circle must be finite"));
        }
        if !self.display_scale.is_finite() {
            return Err(SimError::config("display_scale must be finite"));
        }
        self.params.validate()
    }
}
