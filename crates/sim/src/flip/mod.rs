//! FLIP (Fluid-Implicit-Particle) solver
//!
//! Particles carry the fluid; the MAC grid only exists for the duration of a
//! step to make the velocity field divergence-free.
//!
//! Algorithm, per sub-step:
//! 1. Integrate particles (point gravity, damping, attractor impulse)
//! 2. Push overlapping particles apart
//! 3. Collide with the walls and the obstacle
//! 4. Transfer particle velocities to grid (P2G)
//! 5. Estimate particle density
//! 6. Pressure projection
//! 7. Transfer grid velocities back to particles (G2P, FLIP/PIC blend)
//!
//! Foam, bump and colors are updated once after the last sub-step.

mod advection;
mod color;
mod diagnostics;
mod transfer;

pub use diagnostics::Diagnostics;

use glam::{Vec2, Vec3};

use crate::config::{Palette, SolverParams};
use crate::grid::FluidGrid;
use crate::heightfield::HeightField;
use crate::particle::ParticleSet;
use crate::physics::clamp_dt;
use crate::simulation::{Attractor, Obstacle};
use crate::spatial_hash::SpatialHash;

/// FLIP simulation state
pub struct FlipSolver {
    pub grid: FluidGrid,
    pub particles: ParticleSet,
    // Rebuilt every step, kept to avoid reallocating the linked lists
    hash: SpatialHash,
    palette: Palette,
    /// Simulation-to-display scale for the smoothed positions
    display_scale: f32,
    /// Display-space point that lights up nearby particles
    pointer: Vec3,
    height_field: Box<dyn HeightField>,
    frame: u64,
}

impl FlipSolver {
    pub fn new(
        grid: FluidGrid,
        particles: ParticleSet,
        hash: SpatialHash,
        palette: Palette,
        display_scale: f32,
        height_field: Box<dyn HeightField>,
    ) -> Self {
        Self {
            grid,
            particles,
            hash,
            palette,
            display_scale,
            pointer: Vec3::ZERO,
            height_field,
            frame: 0,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn pointer(&self) -> Vec3 {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: Vec3) {
        self.pointer = pointer;
    }

    /// Number of completed steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Range a particle center may occupy: one cell plus one radius inside the domain.
    pub fn particle_bounds(&self) -> (Vec2, Vec2) {
        let h = self.grid.cell_size;
        let r = self.particles.radius;
        let min = Vec2::splat(h + r);
        let max = Vec2::new(
            (self.grid.num_x - 1) as f32 * h - r,
            (self.grid.num_y - 1) as f32 * h - r,
        );
        (min, max)
    }

    /// Advance the simulation by `dt`, split into `params.num_sub_steps` sub-steps.
    ///
    /// `dt` is clamped to `[MIN_DT, MAX_DT]` before it is split.
    pub fn step(
        &mut self,
        dt: f32,
        params: &SolverParams,
        obstacle: &Obstacle,
        attractor: Option<&Attractor>,
    ) {
        let num_sub_steps = params.num_sub_steps.max(1);
        let sdt = clamp_dt(dt) / num_sub_steps as f32;

        for _ in 0..num_sub_steps {
            // 1. Forces and advection
            self.integrate_particles(sdt, params, attractor);

            // 2. Particle-particle separation
            if params.separate_particles {
                self.push_particles_apart(params.num_particle_iters);
            }

            // 3. Walls and obstacle
            self.handle_particle_collisions(obstacle, params.obstacle_radius);

            // 4. P2G
            self.transfer_to_grid();

            // 5. Density (freezes rest density on first use)
            self.update_particle_density();

            // 6. Pressure projection
            let rest_density = self.particles.rest_density;
            let drift = (params.compensate_drift && rest_density > 0.0).then_some(rest_density);
            self.grid.solve_incompressibility(
                params.num_pressure_iters,
                sdt,
                params.over_relaxation,
                drift,
            );

            // 7. G2P
            self.transfer_from_grid(params.flip_ratio);
        }

        self.update_particle_colors();
        self.frame += 1;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::solver_with;
    use super::*;
    use crate::grid::CellType;
    use crate::physics::{MAX_DT, MIN_DT};

    /// Summed divergence over FLUID cells, signed.
    fn fluid_divergence(grid: &FluidGrid) -> f32 {
        let mut sum = 0.0;
        for i in 1..grid.num_x - 1 {
            for j in 1..grid.num_y - 1 {
                if grid.cell_type[grid.cell_index(i, j)] == CellType::Fluid {
                    sum += grid.divergence(i, j);
                }
            }
        }
        sum
    }

    /// 15x8 block packed tighter than the grid spacing. Middle cells end up
    /// denser than the edge cells, so some cells sit above the rest density.
    fn dense_block() -> Vec<Vec2> {
        (0..120)
            .map(|k| Vec2::new(0.41 + 0.01 * (k % 15) as f32, 0.42 + 0.01 * (k / 15) as f32))
            .collect()
    }

    #[test]
    fn test_step_keeps_particles_in_bounds() {
        let positions: Vec<Vec2> = (0..50)
            .map(|i| Vec2::new(0.3 + 0.008 * (i % 10) as f32, 0.3 + 0.008 * (i / 10) as f32))
            .collect();
        let mut solver = solver_with(&positions);
        let params = SolverParams::default();
        let obstacle = Obstacle::default();
        for _ in 0..60 {
            solver.step(1.0 / 60.0, &params, &obstacle, None);
        }
        let (min, max) = solver.particle_bounds();
        for &p in &solver.particles.positions {
            assert!(p.cmpge(min).all() && p.cmple(max).all(), "particle escaped: {:?}", p);
        }
        assert_eq!(solver.frame(), 60);
    }

    #[test]
    fn test_sub_steps_split_dt() {
        let mut one = solver_with(&[Vec2::new(0.3, 0.3)]);
        let mut two = solver_with(&[Vec2::new(0.3, 0.3)]);
        let mut params = SolverParams::default();
        let obstacle = Obstacle::default();

        one.step(1.0 / 30.0, &params, &obstacle, None);
        params.num_sub_steps = 2;
        two.step(1.0 / 30.0, &params, &obstacle, None);

        // Both move toward the gravity point, by a similar amount
        let d1 = one.particles.positions[0] - Vec2::new(0.3, 0.3);
        let d2 = two.particles.positions[0] - Vec2::new(0.3, 0.3);
        assert!(d1.length() > 0.0 && d2.length() > 0.0);
        assert!(d1.dot(d2) > 0.0);
        assert_eq!(two.frame(), 1);
    }

    #[test]
    fn test_step_clamps_dt() {
        let params = SolverParams::default();
        let obstacle = Obstacle::default();
        let start = [Vec2::new(0.3, 0.3), Vec2::new(0.31, 0.3)];

        let mut huge = solver_with(&start);
        let mut max = solver_with(&start);
        huge.step(10.0, &params, &obstacle, None);
        max.step(MAX_DT, &params, &obstacle, None);
        assert_eq!(huge.particles.positions, max.particles.positions);
        assert_eq!(huge.particles.velocities, max.particles.velocities);

        let mut nan = solver_with(&start);
        let mut min = solver_with(&start);
        nan.step(f32::NAN, &params, &obstacle, None);
        min.step(MIN_DT, &params, &obstacle, None);
        assert_eq!(nan.particles.positions, min.particles.positions);
        assert!(nan.particles.positions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_separation_toggle() {
        let start = [Vec2::new(0.3, 0.3), Vec2::new(0.304, 0.3)];
        let obstacle = Obstacle::default();

        let mut params = SolverParams::default();
        let mut separated = solver_with(&start);
        separated.step(1.0 / 60.0, &params, &obstacle, None);

        params.separate_particles = false;
        let mut overlapping = solver_with(&start);
        overlapping.step(1.0 / 60.0, &params, &obstacle, None);

        let gap = |s: &FlipSolver| s.particles.positions[0].distance(s.particles.positions[1]);
        assert!(gap(&separated) > 0.01, "pair not pushed apart: {}", gap(&separated));
        assert!(
            (gap(&overlapping) - 0.004).abs() < 1e-3,
            "pair moved apart without separation: {}",
            gap(&overlapping)
        );
    }

    #[test]
    fn test_drift_compensation_toggle() {
        let obstacle = Obstacle::default();

        let mut params = SolverParams::default();
        let mut compensated = solver_with(&dense_block());
        compensated.step(1.0 / 60.0, &params, &obstacle, None);

        params.compensate_drift = false;
        let mut plain = solver_with(&dense_block());
        plain.step(1.0 / 60.0, &params, &obstacle, None);

        // Same rest density, only the pressure target differs
        assert_eq!(compensated.particles.rest_density, plain.particles.rest_density);
        let with_drift = fluid_divergence(&compensated.grid);
        let without = fluid_divergence(&plain.grid);
        assert!(
            with_drift > without.abs() + 0.01,
            "compressed cells should keep an outflow: {} vs {}",
            with_drift,
            without
        );
    }
}
