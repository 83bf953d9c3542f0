//! Uniform-grid spatial hash for particle-particle queries.
//!
//! Linked-cell list: `cell_head[c]` is the first particle in cell `c`,
//! `particle_next[p]` the next particle in the same cell (-1 = end).
//! Rebuilt from scratch every step, no allocation after the first build.

use glam::Vec2;

#[derive(Clone, Debug)]
pub struct SpatialHash {
    num_x: usize,
    num_y: usize,
    inv_spacing: f32,
    cell_head: Vec<i32>,
    particle_next: Vec<i32>,
}

impl SpatialHash {
    /// Hash covering `width x height` with cells of `spacing`.
    pub fn new(width: f32, height: f32, spacing: f32) -> Self {
        let inv_spacing = 1.0 / spacing;
        let num_x = (width * inv_spacing).floor() as usize + 1;
        let num_y = (height * inv_spacing).floor() as usize + 1;
        Self {
            num_x,
            num_y,
            inv_spacing,
            cell_head: vec![-1; num_x * num_y],
            particle_next: Vec::new(),
        }
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.num_x, self.num_y)
    }

    /// Hash cell containing `pos`, clamped to the table.
    #[inline]
    pub fn cell_coords(&self, pos: Vec2) -> (usize, usize) {
        let xi = (pos.x * self.inv_spacing).floor().max(0.0) as usize;
        let yi = (pos.y * self.inv_spacing).floor().max(0.0) as usize;
        (xi.min(self.num_x - 1), yi.min(self.num_y - 1))
    }

    /// Bucket every particle by position.
    pub fn build(&mut self, positions: &[Vec2]) {
        self.cell_head.fill(-1);
        self.particle_next.clear();
        self.particle_next.resize(positions.len(), -1);

        for (idx, &pos) in positions.iter().enumerate() {
            let (xi, yi) = self.cell_coords(pos);
            let cell = xi * self.num_y + yi;
            // Insert at head of list
            self.particle_next[idx] = self.cell_head[cell];
            self.cell_head[cell] = idx as i32;
        }
    }

    /// Particles in the 3x3 block of cells around `pos`, including any
    /// particle at `pos` itself.
    pub fn neighbors(&self, pos: Vec2) -> Neighbors<'_> {
        let (xi, yi) = self.cell_coords(pos);
        let x0 = xi.saturating_sub(1);
        let y0 = yi.saturating_sub(1);
        let x1 = (xi + 1).min(self.num_x - 1);
        let y1 = (yi + 1).min(self.num_y - 1);
        let mut iter = Neighbors {
            hash: self,
            x1,
            y0,
            y1,
            cx: x0,
            cy: y0,
            current: -1,
            done: false,
        };
        iter.current = iter.head(x0, y0);
        iter
    }
}

/// Iterator returned by [`SpatialHash::neighbors`].
pub struct Neighbors<'a> {
    hash: &'a SpatialHash,
    x1: usize,
    y0: usize,
    y1: usize,
    cx: usize,
    cy: usize,
    current: i32,
    done: bool,
}

impl Neighbors<'_> {
    #[inline]
    fn head(&self, xi: usize, yi: usize) -> i32 {
        self.hash.cell_head[xi * self.hash.num_y + yi]
    }

    /// Move to the next cell of the block. Returns false when exhausted.
    fn advance_cell(&mut self) -> bool {
        if self.cy < self.y1 {
            self.cy += 1;
        } else if self.cx < self.x1 {
            self.cx += 1;
            self.cy = self.y0;
        } else {
            self.done = true;
            return false;
        }
        self.current = self.head(self.cx, self.cy);
        true
    }
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while !self.done {
            if self.current >= 0 {
                let idx = self.current as usize;
                self.current = self.hash.particle_next[idx];
                return Some(idx);
            }
            if !self.advance_cell() {
                break;
            }
        }
        None
    }
}
