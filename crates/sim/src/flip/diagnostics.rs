//! Diagnostic measurements.
//!
//! Cheap enough to call every frame from a driver or a test.

use serde::Serialize;

use super::FlipSolver;

/// Snapshot of solver health after a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub frame: u64,
    pub kinetic_energy: f32,
    pub max_speed: f32,
    /// v_max * dt / h
    pub cfl: f32,
    pub fluid_cells: usize,
    pub mean_abs_divergence: f32,
    pub rest_density: f32,
}

impl FlipSolver {
    /// Compute total kinetic energy of particles: KE = 1/2 * sum(|v|^2)
    /// Each particle is assumed to have unit mass.
    pub fn compute_kinetic_energy(&self) -> f32 {
        self.particles.kinetic_energy()
    }

    /// Get maximum particle velocity (for CFL checking)
    pub fn max_velocity(&self) -> f32 {
        self.particles.max_speed()
    }

    /// Compute CFL number: CFL = v_max * dt / dx
    /// Should stay below 1 for the explicit advection to be stable
    pub fn compute_cfl(&self, dt: f32) -> f32 {
        self.max_velocity() * dt / self.grid.cell_size
    }

    pub fn diagnostics(&self, dt: f32) -> Diagnostics {
        Diagnostics {
            frame: self.frame,
            kinetic_energy: self.compute_kinetic_energy(),
            max_speed: self.max_velocity(),
            cfl: self.compute_cfl(dt),
            fluid_cells: self.grid.fluid_cell_count(),
            mean_abs_divergence: self.grid.mean_abs_divergence(),
            rest_density: self.particles.rest_density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::solver_with;
    use glam::Vec2;

    #[test]
    fn test_cfl_scales_with_speed_and_dt() {
        let mut solver = solver_with(&[Vec2::new(0.3, 0.3), Vec2::new(0.6, 0.6)]);
        solver.particles.velocities[0] = Vec2::new(3.0, 4.0);
        solver.particles.velocities[1] = Vec2::new(1.0, 0.0);

        assert_eq!(solver.max_velocity(), 5.0);
        assert!((solver.compute_kinetic_energy() - 13.0).abs() < 1e-5);
        // h = 0.05
        assert!((solver.compute_cfl(0.01) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_diagnostics_snapshot() {
        let solver = solver_with(&[Vec2::new(0.3, 0.3)]);
        let diag = solver.diagnostics(1.0 / 60.0);
        assert_eq!(diag.frame, 0);
        assert_eq!(diag.kinetic_energy, 0.0);
        assert_eq!(diag.fluid_cells, 0);
        assert_eq!(diag.rest_density, 0.0);
    }
}
