//! Unified physics constants for the FLIP solver.
//!
//! All simulation modules should use these constants instead of defining their own.
//! Tunables that a caller may want to change live in [`crate::config::SolverParams`];
//! the values here are the fixed shape of the model.

/// Smallest step the solver will integrate (seconds).
pub const MIN_DT: f32 = 1.0 / 60.0;

/// Largest step the solver will integrate (seconds).
///
/// Anything bigger makes the explicit particle integration blow up.
pub const MAX_DT: f32 = 1.0 / 25.0;

/// Clamp a caller-supplied step to `[MIN_DT, MAX_DT]`. NaN maps to `MIN_DT`.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_nan() {
        MIN_DT
    } else {
        dt.clamp(MIN_DT, MAX_DT)
    }
}

/// Frame delta above which the caller should step twice per frame.
pub const DOUBLE_STEP_THRESHOLD: f32 = 1.0 / 75.0;

/// General per-substep velocity damping (air resistance).
pub const VELOCITY_DAMPING: f32 = 0.9;

/// Extra damping applied to the tangential (orbital) velocity around the gravity point.
pub const ORBIT_DAMPING: f32 = 0.99;

/// Squared distance below which the gravity point exerts no pull.
pub const GRAVITY_MIN_DIST_SQ: f32 = 0.0001;

/// Inverse-square falloff is clamped to this squared distance.
pub const GRAVITY_FALLOFF_CLAMP: f32 = 0.1;

/// Attractor velocity is added to particle velocity scaled by this factor.
pub const ATTRACTOR_IMPULSE_SCALE: f32 = 20.0;

/// Distance below which the attractor is ignored for a particle.
pub const ATTRACTOR_MIN_DIST: f32 = 0.0001;

/// Spatial hash cell size as a multiple of the particle radius.
pub const HASH_SPACING_SCALE: f32 = 2.2;

/// Particles closer than this multiple of the radius are pushed apart.
pub const SEPARATION_DIST_SCALE: f32 = 0.8;

/// Fraction of the overlap resolved per separation contact.
pub const SEPARATION_STIFFNESS: f32 = 0.2;

/// Velocity retained (and reflected) on wall contact.
pub const WALL_RESTITUTION: f32 = 0.5;

/// Drift compensation stiffness in the pressure solve.
pub const DRIFT_STIFFNESS: f32 = 1.0;

/// Relative density below which a particle turns to foam.
pub const FOAM_DENSITY_THRESHOLD: f32 = 0.7;

/// Foam lost per step.
pub const FOAM_DECAY: f32 = 0.01;

/// Upper bound of the bump attribute.
pub const MAX_BUMP: f32 = 5.0;

/// Bump lost per step.
pub const BUMP_DECAY: f32 = 0.1;

/// Bump gained per unit of particle speed.
pub const BUMP_VELOCITY_SCALE: f32 = 0.02;

/// Lerp factor for the smoothed display position and activity.
pub const DISPLAY_SMOOTHING: f32 = 0.1;

/// Pointer distance scale for the activity falloff.
pub const ACTIVITY_DISTANCE_SCALE: f32 = 10.0;

/// Pointer distance offset for the activity falloff.
pub const ACTIVITY_RADIUS: f32 = 0.1;
