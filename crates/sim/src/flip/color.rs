//! Cosmetic per-particle attributes: foam, bump and the final RGBA.

use super::FlipSolver;
use crate::config::Rgba;
use crate::physics::{
    BUMP_DECAY, BUMP_VELOCITY_SCALE, FOAM_DECAY, FOAM_DENSITY_THRESHOLD, MAX_BUMP,
};

/// Componentwise `a + (b - a) * t`. `t` is not clamped.
#[inline]
pub fn mix4(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

impl FlipSolver {
    /// Step 8: Update foam, bump and color for every particle
    pub(super) fn update_particle_colors(&mut self) {
        let palette = self.palette;
        for i in 0..self.particles.len() {
            self.update_particle_foam(i);
            self.update_particle_bump(i);

            let foam = self.particles.foam[i];
            let bump = self.particles.bump[i];
            let mut color = mix4(palette.base_color, palette.foam_color, foam);
            color = mix4(color, palette.bump_color, bump);
            color[3] = color[3].clamp(0.0, 1.0);
            self.particles.colors[i] = color;
        }
    }

    /// Particles in sparse cells turn to foam, which then fades.
    fn update_particle_foam(&mut self, i: usize) {
        let grid = &self.grid;
        let particles = &mut self.particles;

        let rest = particles.rest_density;
        if rest > 0.0 {
            let (ci, cj) = grid.pos_to_cell(particles.positions[i]);
            let cell = grid.cell_index(ci.max(1), cj.max(1));
            if grid.particle_density[cell] / rest < FOAM_DENSITY_THRESHOLD {
                particles.foam[i] = 1.0;
            }
        }

        particles.foam[i] = (particles.foam[i] - FOAM_DECAY).clamp(0.0, 1.0);
    }

    /// Fast particles build up bump, which then fades.
    fn update_particle_bump(&mut self, i: usize) {
        let speed = self.particles.velocities[i].length();
        let bump = self.particles.bump[i] + speed * BUMP_VELOCITY_SCALE;
        self.particles.bump[i] = (bump - BUMP_DECAY).max(0.0).clamp(0.0, MAX_BUMP);
    }
}
