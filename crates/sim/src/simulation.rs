//! Simulation handle
//!
//! Owns the solver, its tunables and the obstacle. This is the entry point a
//! render loop talks to: build it once, call [`Simulation::step`] every frame
//! and upload the render buffers.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{Palette, Seeding, SimulationOptions, SolverParams};
use crate::error::Result;
use crate::flip::{Diagnostics, FlipSolver};
use crate::grid::FluidGrid;
use crate::heightfield::{HeightField, PyramidHeightField};
use crate::particle::ParticleSet;
use crate::physics::{clamp_dt, HASH_SPACING_SCALE, MIN_DT};
use crate::spatial_hash::SpatialHash;

/// Point force supplied by the caller for a single step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    pub position: Vec2,
    /// Added (scaled) to every particle inside `radius`.
    pub velocity: Vec2,
    pub radius: f32,
}

impl Attractor {
    pub fn new(position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }

    fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.radius.is_finite()
    }
}

/// Moving circular obstacle. Particles touching it take its velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Obstacle {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Obstacle {
    /// Resting position outside the domain, where it touches nothing.
    pub const PARKED: Vec2 = Vec2::new(3.0, 2.0);

    pub fn far_away() -> Self {
        Self {
            position: Self::PARKED,
            velocity: Vec2::ZERO,
        }
    }
}

/// A running fluid simulation.
pub struct Simulation {
    solver: FlipSolver,
    params: SolverParams,
    obstacle: Obstacle,
    /// Clamped dt of the last step, used to derive the obstacle velocity
    last_dt: f32,
}

/// Build a simulation with the default pyramid height field.
pub fn create_simulation(options: &SimulationOptions) -> Result<Simulation> {
    Simulation::new(options)
}

/// Particle positions produced by the seeding mode.
fn seed_positions(options: &SimulationOptions) -> Vec<Vec2> {
    match &options.seeding {
        Seeding::Vogel => {
            let total = options.num_particles();
            (0..total)
                .map(|p| {
                    let angle = p as f32 / total as f32 * TAU;
                    options.seed_center + Vec2::from_angle(angle) * options.seed_radius
                })
                .collect()
        }
        Seeding::Explicit(points) => points.iter().map(|&p| Vec2::from(p)).collect(),
    }
}

impl Simulation {
    pub fn new(options: &SimulationOptions) -> Result<Self> {
        Self::with_height_field(options, PyramidHeightField::default())
    }

    /// Build a simulation that places particles on a custom display surface.
    pub fn with_height_field<H>(options: &SimulationOptions, height_field: H) -> Result<Self>
    where
        H: HeightField + 'static,
    {
        options.validate()?;
        let params = options.params.clone();

        let spacing = options.spacing();
        let mut grid = FluidGrid::new(options.width, options.height, spacing, params.fluid_density);
        grid.mark_walls_solid();

        let radius = options.radius_scale * spacing;
        let mut particles = ParticleSet::new(options.max_particles, radius);
        for pos in seed_positions(options) {
            particles.spawn(pos)?;
        }

        let hash = SpatialHash::new(options.width, options.height, HASH_SPACING_SCALE * radius);

        log::info!(
            "fluid grid {}x{} (h = {:.4}), {} particles of radius {:.4}, hash {:?}",
            grid.num_x,
            grid.num_y,
            grid.cell_size,
            particles.len(),
            radius,
            hash.dimensions()
        );

        let solver = FlipSolver::new(
            grid,
            particles,
            hash,
            Palette::from(options.color_scheme),
            options.display_scale,
            Box::new(height_field),
        );

        let mut sim = Self {
            solver,
            params,
            obstacle: Obstacle::default(),
            last_dt: MIN_DT,
        };
        sim.set_obstacle(Obstacle::PARKED.x, Obstacle::PARKED.y, true);
        Ok(sim)
    }

    /// Advance one frame.
    ///
    /// `dt` is clamped to `[1/60, 1/25]` s; a NaN `dt` counts as the minimum.
    /// An attractor with non-finite fields is ignored.
    pub fn step(&mut self, dt: f32, attractor: Option<&Attractor>) {
        let clamped = clamp_dt(dt);
        if clamped != dt {
            log::trace!("dt {} clamped to {}", dt, clamped);
        }

        let attractor = attractor.filter(|a| a.is_finite());
        self.solver.step(clamped, &self.params, &self.obstacle, attractor);
        self.last_dt = clamped;
    }

    /// Move the obstacle. Its velocity is the displacement over the last
    /// step's dt, or zero when `reset` is set.
    pub fn set_obstacle(&mut self, x: f32, y: f32, reset: bool) {
        let position = Vec2::new(x, y);
        if !position.is_finite() {
            log::warn!("ignoring obstacle move to non-finite position ({}, {})", x, y);
            return;
        }
        let velocity = if reset {
            Vec2::ZERO
        } else {
            (position - self.obstacle.position) / self.last_dt
        };
        self.obstacle = Obstacle { position, velocity };
    }

    /// Display-space point that raises the activity of nearby particles.
    pub fn set_pointer(&mut self, pointer: Vec3) {
        self.solver.set_pointer(pointer);
    }

    pub fn obstacle(&self) -> &Obstacle {
        &self.obstacle
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Replace the tunables. Rejected values leave the current ones in place.
    pub fn set_params(&mut self, params: SolverParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn solver(&self) -> &FlipSolver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut FlipSolver {
        &mut self.solver
    }

    pub fn frame(&self) -> u64 {
        self.solver.frame()
    }

    pub fn num_particles(&self) -> usize {
        self.solver.particles.len()
    }

    pub fn particle_position(&self, index: usize) -> Result<Vec2> {
        self.solver.particles.position(index)
    }

    pub fn particle_velocity(&self, index: usize) -> Result<Vec2> {
        self.solver.particles.velocity(index)
    }

    /// `[x, y, z, activity]` per particle slot, display space.
    pub fn positions(&self) -> &[f32] {
        self.solver.particles.display_position_data()
    }

    /// `[nx, ny, nz, 0]` per particle slot.
    pub fn normals(&self) -> &[f32] {
        self.solver.particles.normal_data()
    }

    /// `[r, g, b, a]` per particle slot.
    pub fn colors(&self) -> &[f32] {
        self.solver.particles.color_data()
    }

    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions())
    }

    pub fn normals_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.normals())
    }

    pub fn colors_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.colors())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.solver.diagnostics(self.last_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorScheme;
    use crate::error::SimError;

    #[test]
    fn test_vogel_seeding_on_circle() {
        let sim = create_simulation(&SimulationOptions::default()).unwrap();
        assert_eq!(sim.num_particles(), 256);
        for i in 0..sim.num_particles() {
            let p = sim.particle_position(i).unwrap();
            assert!((p.distance(Vec2::splat(0.5)) - 0.1).abs() < 1e-5);
        }
        let first = sim.particle_position(0).unwrap();
        assert!((first - Vec2::new(0.6, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_render_buffers_sized_to_capacity() {
        let options = SimulationOptions {
            max_particles: 300,
            ..Default::default()
        };
        let sim = create_simulation(&options).unwrap();
        assert_eq!(sim.positions().len(), 4 * 300);
        assert_eq!(sim.normals().len(), 4 * 300);
        assert_eq!(sim.colors_bytes().len(), 4 * 4 * 300);
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        let options = SimulationOptions {
            resolution: 0,
            ..Default::default()
        };
        assert!(matches!(
            create_simulation(&options),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_obstacle_velocity_from_displacement() {
        let mut sim = create_simulation(&SimulationOptions::default()).unwrap();
        assert_eq!(*sim.obstacle(), Obstacle::far_away());

        sim.set_obstacle(0.5, 0.5, true);
        sim.set_obstacle(0.6, 0.5, false);
        // Before any step the velocity uses dt = 1/60
        assert!((sim.obstacle().velocity.x - 6.0).abs() < 1e-3);

        sim.step(1.0 / 30.0, None);
        sim.set_obstacle(0.7, 0.5, false);
        assert!((sim.obstacle().velocity.x - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_obstacle_is_ignored() {
        let mut sim = create_simulation(&SimulationOptions::default()).unwrap();
        sim.set_obstacle(0.4, 0.4, true);
        sim.set_obstacle(f32::NAN, 0.4, false);
        assert_eq!(sim.obstacle().position, Vec2::splat(0.4));
        assert_eq!(sim.obstacle().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_set_params_validates() {
        let mut sim = create_simulation(&SimulationOptions::default()).unwrap();
        let bad = SolverParams {
            num_sub_steps: 0,
            ..Default::default()
        };
        assert!(sim.set_params(bad).is_err());
        assert_eq!(sim.params().num_sub_steps, 1);
    }

    #[test]
    fn test_dark_scheme_palette() {
        let options = SimulationOptions::with_color_scheme(ColorScheme::Dark);
        let sim = create_simulation(&options).unwrap();
        assert_eq!(sim.solver().palette().foam_diffusion, 0.1);
    }

    #[test]
    fn test_custom_height_field_drives_display() {
        let options = SimulationOptions::default();
        let mut sim =
            Simulation::with_height_field(&options, |_x: f32, _z: f32| (0.25f32, Vec3::Y)).unwrap();
        sim.step(1.0 / 60.0, None);
        assert!(sim.positions().chunks(4).take(256).all(|p| p[1] == 0.25));
        assert!(sim.normals().chunks(4).take(256).all(|n| n[1] == 1.0));
    }
}
