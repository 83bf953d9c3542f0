//! Particle-side stages of the step: forces, advection, separation, collisions.

use glam::{Vec2, Vec3};

use super::FlipSolver;
use crate::config::SolverParams;
use crate::particle::{DISPLAY_ACTIVITY, DISPLAY_X, DISPLAY_Y, DISPLAY_Z};
use crate::physics::{
    ACTIVITY_DISTANCE_SCALE, ACTIVITY_RADIUS, ATTRACTOR_IMPULSE_SCALE, ATTRACTOR_MIN_DIST,
    DISPLAY_SMOOTHING, GRAVITY_FALLOFF_CLAMP, GRAVITY_MIN_DIST_SQ, ORBIT_DAMPING,
    SEPARATION_DIST_SCALE, SEPARATION_STIFFNESS, VELOCITY_DAMPING, WALL_RESTITUTION,
};
use crate::simulation::{Attractor, Obstacle};

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl FlipSolver {
    /// Step 1: Apply forces and move particles
    ///
    /// - Inverse-square pull toward the gravity point (falloff clamped near it)
    /// - General damping, then extra damping of the orbital component
    /// - Attractor impulse for particles inside its radius
    /// - Explicit Euler position update, then display smoothing
    pub(super) fn integrate_particles(
        &mut self,
        dt: f32,
        params: &SolverParams,
        attractor: Option<&Attractor>,
    ) {
        for i in 0..self.particles.len() {
            let mut pos = self.particles.positions[i];
            let mut vel = self.particles.velocities[i];

            let to_gravity = params.gravity - pos;
            let dist_sq = to_gravity.length_squared();
            if dist_sq >= GRAVITY_MIN_DIST_SQ {
                let dir = to_gravity / dist_sq.sqrt();
                let force = params.gravity_strength / dist_sq.max(GRAVITY_FALLOFF_CLAMP);
                vel += dir * force * dt;
                vel *= VELOCITY_DAMPING;

                let radial = vel.dot(dir);
                let tangential = vel - dir * radial;
                vel = dir * radial + tangential * ORBIT_DAMPING;
            } else {
                // Sitting on the gravity point: no direction to pull along
                vel *= VELOCITY_DAMPING;
            }

            if let Some(attractor) = attractor {
                let dist = pos.distance(attractor.position);
                if dist >= ATTRACTOR_MIN_DIST && dist < attractor.radius {
                    vel += attractor.velocity * ATTRACTOR_IMPULSE_SCALE;
                }
            }

            pos += vel * dt;
            self.particles.positions[i] = pos;
            self.particles.velocities[i] = vel;

            self.update_display(i);
        }
    }

    /// Smooth particle `i` toward its display-space position on the height field.
    ///
    /// The activity channel fades in near the pointer and out away from it.
    pub(super) fn update_display(&mut self, i: usize) {
        let s = self.display_scale;
        let target = self.particles.positions[i] * s - Vec2::splat(0.5 * s);

        let entry = &mut self.particles.display_positions[i];
        entry[DISPLAY_X] = lerp(entry[DISPLAY_X], target.x, DISPLAY_SMOOTHING);
        entry[DISPLAY_Z] = lerp(entry[DISPLAY_Z], target.y, DISPLAY_SMOOTHING);

        let (height, normal) = self.height_field.sample(entry[DISPLAY_X], entry[DISPLAY_Z]);
        entry[DISPLAY_Y] = height;

        let display = Vec3::new(entry[DISPLAY_X], height, entry[DISPLAY_Z]);
        let dist = display.distance(self.pointer);
        let active =
            (1.0 - (dist * ACTIVITY_DISTANCE_SCALE - ACTIVITY_RADIUS).clamp(0.0, 1.0)).sqrt();
        entry[DISPLAY_ACTIVITY] = lerp(entry[DISPLAY_ACTIVITY], active, DISPLAY_SMOOTHING);

        self.particles.normals[i] = [normal.x, normal.y, normal.z, 0.0];
    }

    /// Step 2: Push overlapping particles apart
    ///
    /// Every pair closer than `0.8 * radius` moves apart by a fifth of the
    /// overlap and evens out its foam. The hash is built once; positions move
    /// during the passes but stay in (or next to) their bucket.
    pub(super) fn push_particles_apart(&mut self, iterations: usize) {
        let min_dist = SEPARATION_DIST_SCALE * self.particles.radius;
        let min_dist_sq = min_dist * min_dist;
        let diffusion = self.palette.foam_diffusion;

        self.hash.build(&self.particles.positions);

        let particles = &mut self.particles;
        for _ in 0..iterations {
            for i in 0..particles.len() {
                let p = particles.positions[i];

                for j in self.hash.neighbors(p) {
                    if j == i {
                        continue;
                    }
                    let delta = particles.positions[j] - p;
                    let d2 = delta.length_squared();
                    if d2 > min_dist_sq || d2 == 0.0 {
                        continue;
                    }
                    let d = d2.sqrt();
                    let shift = delta * (SEPARATION_STIFFNESS * (min_dist - d) / d);
                    particles.positions[i] -= shift;
                    particles.positions[j] += shift;

                    let foam_i = particles.foam[i];
                    let foam_j = particles.foam[j];
                    let mean = 0.5 * (foam_i + foam_j);
                    particles.foam[i] = foam_i + (mean - foam_i) * diffusion;
                    particles.foam[j] = foam_j + (mean - foam_j) * diffusion;
                }
            }
        }
    }

    /// Step 3: Clamp particles to the walls and let the obstacle carry them
    ///
    /// Wall contact reflects the normal velocity at half magnitude. Obstacle
    /// contact is sticky: the particle takes the obstacle velocity.
    pub(super) fn handle_particle_collisions(&mut self, obstacle: &Obstacle, obstacle_radius: f32) {
        let (min, max) = self.particle_bounds();
        let min_dist = obstacle_radius + self.particles.radius;
        let min_dist_sq = min_dist * min_dist;

        let particles = &mut self.particles;
        for (pos, vel) in particles.positions.iter_mut().zip(particles.velocities.iter_mut()) {
            if pos.distance_squared(obstacle.position) < min_dist_sq {
                *vel = obstacle.velocity;
            }

            if pos.x < min.x {
                pos.x = min.x;
                vel.x = -vel.x * WALL_RESTITUTION;
            }
            if pos.x > max.x {
                pos.x = max.x;
                vel.x = -vel.x * WALL_RESTITUTION;
            }
            if pos.y < min.y {
                pos.y = min.y;
                vel.y = -vel.y * WALL_RESTITUTION;
            }
            if pos.y > max.y {
                pos.y = max.y;
                vel.y = -vel.y * WALL_RESTITUTION;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::solver_with;
    use super::*;

    fn still_params() -> SolverParams {
        SolverParams {
            gravity_strength: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_gravity_pulls_toward_point() {
        let mut solver = solver_with(&[Vec2::new(0.2, 0.6)]);
        let params = SolverParams::default();
        solver.integrate_particles(1.0 / 60.0, &params, None);
        let vel = solver.particles.velocities[0];
        assert!(vel.x > 0.0, "expected pull toward +x, got {:?}", vel);
        assert!(vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_orbit_damped_harder_than_radial() {
        let mut solver = solver_with(&[Vec2::new(0.2, 0.6)]);
        // Pure tangential motion around the gravity point at (0.5, 0.6)
        solver.particles.velocities[0] = Vec2::new(0.0, 1.0);
        let params = SolverParams {
            gravity_strength: 0.0,
            ..Default::default()
        };
        solver.integrate_particles(1.0 / 60.0, &params, None);
        let vel = solver.particles.velocities[0];
        assert!((vel.y - 0.9 * 0.99).abs() < 1e-5, "tangential speed {}", vel.y);
    }

    #[test]
    fn test_particle_on_gravity_point_stays_finite() {
        let mut solver = solver_with(&[Vec2::new(0.5, 0.6)]);
        solver.particles.velocities[0] = Vec2::new(1.0, 0.0);
        solver.integrate_particles(1.0 / 60.0, &SolverParams::default(), None);
        let vel = solver.particles.velocities[0];
        assert!(vel.is_finite());
        assert!((vel.x - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_attractor_impulse_only_inside_radius() {
        let mut solver = solver_with(&[Vec2::new(0.3, 0.3), Vec2::new(0.7, 0.7)]);
        let attractor = Attractor {
            position: Vec2::new(0.31, 0.3),
            velocity: Vec2::new(0.0, 0.1),
            radius: 0.05,
        };
        solver.integrate_particles(1.0 / 60.0, &still_params(), Some(&attractor));
        assert!((solver.particles.velocities[0].y - 2.0).abs() < 1e-5);
        assert_eq!(solver.particles.velocities[1], Vec2::ZERO);
    }

    #[test]
    fn test_attractor_on_top_of_particle_is_skipped() {
        let mut solver = solver_with(&[Vec2::new(0.3, 0.3)]);
        let attractor = Attractor {
            position: Vec2::new(0.3, 0.3),
            velocity: Vec2::new(1.0, 0.0),
            radius: 0.05,
        };
        solver.integrate_particles(1.0 / 60.0, &still_params(), Some(&attractor));
        assert_eq!(solver.particles.velocities[0], Vec2::ZERO);
    }

    #[test]
    fn test_display_smoothing_lerps_toward_target() {
        let mut solver = solver_with(&[Vec2::new(1.0, 0.5)]);
        solver.update_display(0);
        let entry = solver.particles.display_positions[0];
        // target x = 1.0 * 1.2 - 0.6 = 0.6, one tenth of the way from 0
        assert!((entry[DISPLAY_X] - 0.06).abs() < 1e-6);
        assert!(entry[DISPLAY_Z].abs() < 1e-6);
        assert_eq!(solver.particles.normals[0], [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_activity_rises_near_pointer() {
        let mut solver = solver_with(&[Vec2::new(0.5, 0.5), Vec2::new(0.9, 0.9)]);
        solver.set_pointer(Vec3::ZERO);
        solver.update_display(0);
        solver.update_display(1);
        let near = solver.particles.display_positions[0][DISPLAY_ACTIVITY];
        let far = solver.particles.display_positions[1][DISPLAY_ACTIVITY];
        assert!((near - 0.1).abs() < 1e-6, "near activity {}", near);
        assert!(far < near);
    }

    #[test]
    fn test_separation_pushes_pair_apart_symmetrically() {
        let a = Vec2::new(0.5, 0.5);
        let b = Vec2::new(0.505, 0.5);
        let mut solver = solver_with(&[a, b]);
        solver.particles.foam[0] = 1.0;
        solver.push_particles_apart(1);

        let pa = solver.particles.positions[0];
        let pb = solver.particles.positions[1];
        assert!(pb.x - pa.x > 0.005);
        assert!(((pa.x + pb.x) * 0.5 - 0.5025).abs() < 1e-6);
        // Foam leaks from the foamy particle to its neighbour
        assert!(solver.particles.foam[0] < 1.0);
        assert!(solver.particles.foam[1] > 0.0);
    }

    #[test]
    fn test_coincident_particles_are_left_alone() {
        let p = Vec2::new(0.5, 0.5);
        let mut solver = solver_with(&[p, p]);
        solver.push_particles_apart(2);
        assert_eq!(solver.particles.positions[0], p);
        assert_eq!(solver.particles.positions[1], p);
    }

    #[test]
    fn test_wall_collision_clamps_and_reflects() {
        let mut solver = solver_with(&[Vec2::new(0.01, 0.99)]);
        solver.particles.velocities[0] = Vec2::new(-2.0, 4.0);
        solver.handle_particle_collisions(&Obstacle::far_away(), 0.15);

        let (min, max) = solver.particle_bounds();
        assert_eq!(solver.particles.positions[0], Vec2::new(min.x, max.y));
        assert_eq!(solver.particles.velocities[0], Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_obstacle_contact_is_sticky() {
        let mut solver = solver_with(&[Vec2::new(0.5, 0.5), Vec2::new(0.8, 0.8)]);
        let obstacle = Obstacle {
            position: Vec2::new(0.55, 0.5),
            velocity: Vec2::new(0.0, -3.0),
        };
        solver.handle_particle_collisions(&obstacle, 0.1);
        assert_eq!(solver.particles.velocities[0], Vec2::new(0.0, -3.0));
        assert_eq!(solver.particles.velocities[1], Vec2::ZERO);
    }
}
