//! Bilinear interpolation helpers for the FLIP transfers.
//!
//! P2G, G2P and the density splat all use the same 2x2 tent stencil; they
//! only differ in where the sample points sit inside a cell.

use glam::Vec2;

/// Velocity component / face orientation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    /// u, stored on left faces
    X,
    /// v, stored on bottom faces
    Y,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    /// Offset from a cell corner to where this component is stored.
    #[inline]
    pub fn sample_offset(self, h: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(0.0, 0.5 * h),
            Axis::Y => Vec2::new(0.5 * h, 0.0),
        }
    }

    #[inline]
    pub fn component(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub fn set_component(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }
}

/// Grid geometry without the field storage, so stencils can be built while
/// the fields themselves are mutably borrowed.
#[derive(Clone, Copy, Debug)]
pub struct Lattice {
    pub num_x: usize,
    pub num_y: usize,
    pub h: f32,
    pub inv_h: f32,
}

/// Four grid nodes around a sample point and their bilinear weights.
///
/// Node order: (x0,y0), (x1,y0), (x1,y1), (x0,y1). Weights sum to 1.
#[derive(Clone, Copy, Debug)]
pub struct Stencil {
    pub cells: [(usize, usize); 4],
    pub nodes: [usize; 4],
    pub weights: [f32; 4],
}

impl Stencil {
    /// Weighted sum of `field` over the stencil nodes.
    #[inline]
    pub fn gather(&self, field: &[f32]) -> f32 {
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&n, &w)| field[n] * w)
            .sum()
    }
}

impl Lattice {
    /// Stencil for `pos` on the sample lattice shifted by `offset`.
    ///
    /// The position is clamped to the interior `[h, (n-1)h]` first, and the
    /// node range to `[0, n-2]`, so every index is valid.
    pub fn stencil(&self, pos: Vec2, offset: Vec2) -> Stencil {
        let h = self.h;
        let x = pos.x.clamp(h, (self.num_x - 1) as f32 * h);
        let y = pos.y.clamp(h, (self.num_y - 1) as f32 * h);

        let (x0, tx, x1) = Self::axis_span(x - offset.x, h, self.inv_h, self.num_x);
        let (y0, ty, y1) = Self::axis_span(y - offset.y, h, self.inv_h, self.num_y);

        let sx = 1.0 - tx;
        let sy = 1.0 - ty;

        let n = self.num_y;
        Stencil {
            cells: [(x0, y0), (x1, y0), (x1, y1), (x0, y1)],
            nodes: [x0 * n + y0, x1 * n + y0, x1 * n + y1, x0 * n + y1],
            weights: [sx * sy, tx * sy, tx * ty, sx * ty],
        }
    }

    /// Lower node, fractional offset and upper node along one axis.
    #[inline]
    fn axis_span(coord: f32, h: f32, inv_h: f32, count: usize) -> (usize, f32, usize) {
        let max_node = count.saturating_sub(2);
        let i0 = ((coord * inv_h).floor().max(0.0) as usize).min(max_node);
        let t = ((coord - i0 as f32 * h) * inv_h).clamp(0.0, 1.0);
        let i1 = (i0 + 1).min(max_node);
        (i0, t, i1)
    }
}
