//! Particle-grid transfers (P2G, G2P) and density estimation.
//!
//! All three use the bilinear stencil from [`crate::grid::Lattice`]; they only
//! differ in the sample offset and in what is accumulated.

use glam::Vec2;

use super::FlipSolver;
use crate::grid::{Axis, CellType};

impl FlipSolver {
    /// Step 4: Transfer particle velocities to grid (P2G)
    ///
    /// Step 4a: Snapshot the grid velocity and classify cells
    /// Step 4b: Splat each velocity component onto its staggered faces
    /// Step 4c: Normalize by the accumulated weights
    /// Step 4d: Faces touching a solid keep their snapshot value
    pub(super) fn transfer_to_grid(&mut self) {
        let grid = &mut self.grid;
        let particles = &self.particles;

        grid.store_old_velocities();
        grid.u.fill(0.0);
        grid.v.fill(0.0);
        grid.du.fill(0.0);
        grid.dv.fill(0.0);

        grid.classify_cells(&particles.positions);

        let lattice = grid.lattice();
        for axis in Axis::BOTH {
            let offset = axis.sample_offset(lattice.h);
            let (field, weights) = match axis {
                Axis::X => (&mut grid.u, &mut grid.du),
                Axis::Y => (&mut grid.v, &mut grid.dv),
            };

            for (&pos, &vel) in particles.positions.iter().zip(&particles.velocities) {
                let stencil = lattice.stencil(pos, offset);
                let pv = axis.component(vel);
                for (&node, &w) in stencil.nodes.iter().zip(&stencil.weights) {
                    field[node] += pv * w;
                    weights[node] += w;
                }
            }

            for (f, &w) in field.iter_mut().zip(weights.iter()) {
                if w > 0.0 {
                    *f /= w;
                }
            }
        }

        grid.restore_solid_faces();
    }

    /// Step 5: Splat particle density to cell centers
    ///
    /// The first call that sees FLUID cells freezes the rest density to their
    /// mean. Each particle then reads back the interpolated density.
    pub(super) fn update_particle_density(&mut self) {
        let grid = &mut self.grid;
        let particles = &mut self.particles;

        let lattice = grid.lattice();
        let offset = Vec2::splat(0.5 * lattice.h);

        grid.particle_density.fill(0.0);
        for &pos in &particles.positions {
            let stencil = lattice.stencil(pos, offset);
            for (&node, &w) in stencil.nodes.iter().zip(&stencil.weights) {
                grid.particle_density[node] += w;
            }
        }

        if particles.rest_density == 0.0 {
            let mut sum = 0.0;
            let mut fluid_cells = 0usize;
            for (&density, &cell) in grid.particle_density.iter().zip(&grid.cell_type) {
                if cell == CellType::Fluid {
                    sum += density;
                    fluid_cells += 1;
                }
            }
            if fluid_cells > 0 {
                particles.rest_density = sum / fluid_cells as f32;
                log::debug!(
                    "rest density frozen at {:.4} over {} fluid cells",
                    particles.rest_density,
                    fluid_cells
                );
            }
        }

        for (density, &pos) in particles.density.iter_mut().zip(&particles.positions) {
            *density = lattice.stencil(pos, offset).gather(&grid.particle_density);
        }
    }

    /// Step 7: Transfer grid velocities back to particles (G2P)
    ///
    /// Only faces next to a non-AIR cell are sampled. PIC takes the grid value,
    /// FLIP adds the grid change since P2G to the particle's own velocity.
    /// A particle with no valid face around it keeps its velocity.
    pub(super) fn transfer_from_grid(&mut self, flip_ratio: f32) {
        let grid = &self.grid;
        let particles = &mut self.particles;
        let lattice = grid.lattice();

        for axis in Axis::BOTH {
            let offset = axis.sample_offset(lattice.h);
            let field = grid.velocity(axis);
            let prev = grid.prev_velocity(axis);

            for (&pos, vel) in particles.positions.iter().zip(particles.velocities.iter_mut()) {
                let stencil = lattice.stencil(pos, offset);

                let mut total = 0.0;
                let mut pic = 0.0;
                let mut correction = 0.0;
                for k in 0..4 {
                    let (ci, cj) = stencil.cells[k];
                    if !grid.face_is_valid(ci, cj, axis) {
                        continue;
                    }
                    let w = stencil.weights[k];
                    let node = stencil.nodes[k];
                    total += w;
                    pic += w * field[node];
                    correction += w * (field[node] - prev[node]);
                }

                if total > 0.0 {
                    let pic_v = pic / total;
                    let flip_v = axis.component(*vel) + correction / total;
                    axis.set_component(vel, (1.0 - flip_ratio) * pic_v + flip_ratio * flip_v);
                }
            }
        }
    }
}
