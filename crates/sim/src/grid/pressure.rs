//! Pressure projection.
//!
//! Enforces incompressibility with Gauss-Seidel relaxation directly on the
//! face velocities. Pressure itself is only accumulated for inspection.

use super::{CellType, FluidGrid};

impl FluidGrid {
    /// Net outflow of an interior cell: u(i+1) - u(i) + v(j+1) - v(j).
    #[inline]
    pub fn divergence(&self, i: usize, j: usize) -> f32 {
        let center = self.cell_index(i, j);
        let right = self.cell_index(i + 1, j);
        let top = center + 1;
        self.u[right] - self.u[center] + self.v[top] - self.v[center]
    }

    /// Mean |divergence| over interior FLUID cells (0.0 if there are none).
    pub fn mean_abs_divergence(&self) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 1..self.num_x - 1 {
            for j in 1..self.num_y - 1 {
                if self.cell_type[self.cell_index(i, j)] == CellType::Fluid {
                    sum += self.divergence(i, j).abs();
                    count += 1;
                }
            }
        }
        if count > 0 {
            sum / count as f32
        } else {
            0.0
        }
    }

    /// Relax face velocities toward zero divergence in every FLUID cell.
    ///
    /// `drift_rest_density` enables drift compensation: cells denser than the
    /// rest density get an extra outflow target proportional to the excess.
    /// The post-transfer velocities are snapshotted into `prev_u`/`prev_v`
    /// first so G2P can apply the FLIP delta.
    pub fn solve_incompressibility(
        &mut self,
        num_iters: usize,
        dt: f32,
        over_relaxation: f32,
        drift_rest_density: Option<f32>,
    ) {
        self.pressure.fill(0.0);
        self.store_old_velocities();

        let n = self.num_y;
        let cp = if dt > 0.0 {
            self.fluid_density * self.cell_size / dt
        } else {
            0.0
        };

        for _ in 0..num_iters {
            for i in 1..self.num_x - 1 {
                for j in 1..self.num_y - 1 {
                    let center = i * n + j;
                    if self.cell_type[center] != CellType::Fluid {
                        continue;
                    }

                    let left = center - n;
                    let right = center + n;
                    let bottom = center - 1;
                    let top = center + 1;

                    let sx0 = self.solidity[left];
                    let sx1 = self.solidity[right];
                    let sy0 = self.solidity[bottom];
                    let sy1 = self.solidity[top];
                    let s = sx0 + sx1 + sy0 + sy1;
                    // Enclosed by walls on all sides
                    if s == 0.0 {
                        continue;
                    }

                    let mut div = self.u[right] - self.u[center] + self.v[top] - self.v[center];

                    if let Some(rest) = drift_rest_density {
                        let compression = self.particle_density[center] - rest;
                        if compression > 0.0 {
                            div -= crate::physics::DRIFT_STIFFNESS * compression;
                        }
                    }

                    let p = -div / s * over_relaxation;
                    self.pressure[center] += cp * p;

                    self.u[center] -= sx0 * p;
                    self.u[right] += sx1 * p;
                    self.v[center] -= sy0 * p;
                    self.v[top] += sy1 * p;
                }
            }
        }
    }
}
