//! MAC (Marker-and-Cell) grid for the FLIP solver
//!
//! Uses staggered grid layout:
//! - u (horizontal velocity) stored on left edges of cells
//! - v (vertical velocity) stored on bottom edges of cells
//! - pressure and particle density stored at cell centers
//!
//! Every field is a flat array of `num_x * num_y` entries indexed x-major
//! (`i * num_y + j`), so a face array has the same length as a cell array.

mod interp;
mod pressure;

pub use interp::{Axis, Lattice, Stencil};

use glam::Vec2;

/// Cell type for boundary conditions
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellType {
    /// Contains at least one particle
    Fluid,
    /// Empty, pressure is implicitly zero
    Air,
    /// Wall - blocks flow
    Solid,
}

/// Staggered MAC grid for pressure-velocity simulation
#[derive(Clone, Debug)]
pub struct FluidGrid {
    pub num_x: usize,
    pub num_y: usize,
    pub cell_size: f32,
    inv_spacing: f32,
    /// Fluid density, only scales the accumulated pressure
    pub fluid_density: f32,

    /// Horizontal velocity (staggered on left edges)
    pub u: Vec<f32>,
    /// Vertical velocity (staggered on bottom edges)
    pub v: Vec<f32>,
    /// Grid velocity before the last transfer/projection (FLIP delta)
    pub prev_u: Vec<f32>,
    pub prev_v: Vec<f32>,
    /// P2G weight accumulators
    pub du: Vec<f32>,
    pub dv: Vec<f32>,

    /// Pressure at cell centers, rebuilt every solve
    pub pressure: Vec<f32>,
    /// 0.0 = solid, 1.0 = fluid-eligible. Fixed after setup.
    pub solidity: Vec<f32>,
    /// Recomputed every step from solidity and particle occupancy
    pub cell_type: Vec<CellType>,
    /// Particle density splatted to cell centers
    pub particle_density: Vec<f32>,
}

impl FluidGrid {
    /// Build a grid covering `width x height` with roughly `spacing` sized cells.
    ///
    /// One extra cell is added per axis so the walls sit outside the domain.
    pub fn new(width: f32, height: f32, spacing: f32, fluid_density: f32) -> Self {
        let num_x = (width / spacing).floor() as usize + 1;
        let num_y = (height / spacing).floor() as usize + 1;
        let cell_size = (width / num_x as f32).max(height / num_y as f32);
        Self::with_dimensions(num_x, num_y, cell_size, fluid_density)
    }

    /// Build a grid with explicit dimensions.
    pub fn with_dimensions(num_x: usize, num_y: usize, cell_size: f32, fluid_density: f32) -> Self {
        let num_x = num_x.max(3);
        let num_y = num_y.max(3);
        let cell_count = num_x * num_y;
        Self {
            num_x,
            num_y,
            cell_size,
            inv_spacing: 1.0 / cell_size,
            fluid_density,
            u: vec![0.0; cell_count],
            v: vec![0.0; cell_count],
            prev_u: vec![0.0; cell_count],
            prev_v: vec![0.0; cell_count],
            du: vec![0.0; cell_count],
            dv: vec![0.0; cell_count],
            pressure: vec![0.0; cell_count],
            solidity: vec![1.0; cell_count],
            cell_type: vec![CellType::Air; cell_count],
            particle_density: vec![0.0; cell_count],
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.num_x * self.num_y
    }

    #[inline]
    pub fn inv_spacing(&self) -> f32 {
        self.inv_spacing
    }

    #[inline]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        i * self.num_y + j
    }

    /// Geometry-only view used by the transfer stencils.
    #[inline]
    pub fn lattice(&self) -> Lattice {
        Lattice {
            num_x: self.num_x,
            num_y: self.num_y,
            h: self.cell_size,
            inv_h: self.inv_spacing,
        }
    }

    /// Cell containing `pos`, clamped to the grid.
    #[inline]
    pub fn pos_to_cell(&self, pos: Vec2) -> (usize, usize) {
        let i = (pos.x * self.inv_spacing).floor().max(0.0) as usize;
        let j = (pos.y * self.inv_spacing).floor().max(0.0) as usize;
        (i.min(self.num_x - 1), j.min(self.num_y - 1))
    }

    #[inline]
    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.solidity[self.cell_index(i, j)] == 0.0
    }

    pub fn set_solid(&mut self, i: usize, j: usize) {
        let idx = self.cell_index(i, j);
        self.solidity[idx] = 0.0;
    }

    /// Make the outermost ring of cells solid.
    pub fn mark_walls_solid(&mut self) {
        for i in 0..self.num_x {
            for j in 0..self.num_y {
                if i == 0 || i == self.num_x - 1 || j == 0 || j == self.num_y - 1 {
                    self.set_solid(i, j);
                }
            }
        }
    }

    /// Step 1 of the P2G transfer: classify cells as solid, fluid, or air.
    pub fn classify_cells(&mut self, positions: &[Vec2]) {
        for (cell, &s) in self.cell_type.iter_mut().zip(&self.solidity) {
            *cell = if s == 0.0 { CellType::Solid } else { CellType::Air };
        }

        for &pos in positions {
            let (i, j) = self.pos_to_cell(pos);
            let idx = self.cell_index(i, j);
            if self.cell_type[idx] == CellType::Air {
                self.cell_type[idx] = CellType::Fluid;
            }
        }
    }

    /// Snapshot the current face velocities into `prev_u`/`prev_v`.
    pub fn store_old_velocities(&mut self) {
        self.prev_u.copy_from_slice(&self.u);
        self.prev_v.copy_from_slice(&self.v);
    }

    /// Faces touching a solid cell keep their pre-transfer velocity so walls
    /// do not pick up velocity from nearby particles.
    pub fn restore_solid_faces(&mut self) {
        let n = self.num_y;
        for i in 0..self.num_x {
            for j in 0..self.num_y {
                let idx = i * n + j;
                let solid = self.cell_type[idx] == CellType::Solid;
                if solid || (i > 0 && self.cell_type[idx - n] == CellType::Solid) {
                    self.u[idx] = self.prev_u[idx];
                }
                if solid || (j > 0 && self.cell_type[idx - 1] == CellType::Solid) {
                    self.v[idx] = self.prev_v[idx];
                }
            }
        }
    }

    /// A face sample is usable if either cell sharing the face is not air.
    #[inline]
    pub fn face_is_valid(&self, i: usize, j: usize, axis: Axis) -> bool {
        let own = self.cell_type[self.cell_index(i, j)] != CellType::Air;
        let neighbor = match axis {
            Axis::X => i.checked_sub(1).map(|pi| (pi, j)),
            Axis::Y => j.checked_sub(1).map(|pj| (i, pj)),
        };
        own || neighbor.is_some_and(|(ni, nj)| {
            self.cell_type[self.cell_index(ni, nj)] != CellType::Air
        })
    }

    /// Face velocity array for an axis.
    #[inline]
    pub fn velocity(&self, axis: Axis) -> &[f32] {
        match axis {
            Axis::X => &self.u,
            Axis::Y => &self.v,
        }
    }

    /// Face velocity snapshot for an axis.
    #[inline]
    pub fn prev_velocity(&self, axis: Axis) -> &[f32] {
        match axis {
            Axis::X => &self.prev_u,
            Axis::Y => &self.prev_v,
        }
    }

    pub fn fluid_cell_count(&self) -> usize {
        self.cell_type.iter().filter(|&&c| c == CellType::Fluid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_sizing_adds_wall_cell() {
        let grid = FluidGrid::new(1.0, 1.0, 1.0 / 35.0, 10.0);
        assert!(grid.num_x == 35 || grid.num_x == 36);
        assert_eq!(grid.num_x, grid.num_y);
        assert!((grid.cell_size - 1.0 / grid.num_x as f32).abs() < 1e-6);
        assert_eq!(grid.u.len(), grid.cell_count());
    }

    #[test]
    fn test_walls_are_solid() {
        let mut grid = FluidGrid::with_dimensions(8, 6, 0.1, 1.0);
        grid.mark_walls_solid();
        assert!(grid.is_solid(0, 3));
        assert!(grid.is_solid(7, 3));
        assert!(grid.is_solid(4, 0));
        assert!(grid.is_solid(4, 5));
        assert!(!grid.is_solid(4, 3));
    }

    #[test]
    fn test_classify_never_overrides_solid() {
        let mut grid = FluidGrid::with_dimensions(8, 8, 0.1, 1.0);
        grid.mark_walls_solid();
        // One particle in a wall cell, one in the interior
        grid.classify_cells(&[Vec2::new(0.05, 0.35), Vec2::new(0.35, 0.35)]);

        assert_eq!(grid.cell_type[grid.cell_index(0, 3)], CellType::Solid);
        assert_eq!(grid.cell_type[grid.cell_index(3, 3)], CellType::Fluid);
        assert_eq!(grid.cell_type[grid.cell_index(4, 4)], CellType::Air);
        assert_eq!(grid.fluid_cell_count(), 1);

        for (idx, &s) in grid.solidity.iter().enumerate() {
            if s == 0.0 {
                assert_eq!(grid.cell_type[idx], CellType::Solid);
            }
        }
    }

    #[test]
    fn test_restore_solid_faces() {
        let mut grid = FluidGrid::with_dimensions(6, 6, 0.1, 1.0);
        grid.mark_walls_solid();
        grid.classify_cells(&[]);
        grid.store_old_velocities();
        grid.u.fill(3.0);
        grid.v.fill(3.0);
        grid.restore_solid_faces();

        // Face between the left wall and the first interior cell
        assert_eq!(grid.u[grid.cell_index(1, 2)], 0.0);
        // Interior face
        assert_eq!(grid.u[grid.cell_index(2, 2)], 3.0);
        // Face between the floor and the first interior cell
        assert_eq!(grid.v[grid.cell_index(2, 1)], 0.0);
        assert_eq!(grid.v[grid.cell_index(2, 2)], 3.0);
    }

    #[test]
    fn test_face_validity_uses_both_sides() {
        let mut grid = FluidGrid::with_dimensions(6, 6, 0.1, 1.0);
        grid.classify_cells(&[Vec2::new(0.25, 0.25)]);
        // Cell (2,2) is fluid: its own faces and the faces of (3,2)/(2,3) that it shares
        assert!(grid.face_is_valid(2, 2, Axis::X));
        assert!(grid.face_is_valid(3, 2, Axis::X));
        assert!(grid.face_is_valid(2, 3, Axis::Y));
        assert!(!grid.face_is_valid(4, 2, Axis::X));
        assert!(!grid.face_is_valid(0, 0, Axis::Y));
    }
}
