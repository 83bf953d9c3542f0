//! Per-frame stepping policy.
//!
//! The solver takes one step per call and never decides how often it runs.
//! Render loops that drop below 75 fps step twice per frame so the fluid
//! keeps its pace; [`FrameScheduler`] packages that rule.

use crate::physics::DOUBLE_STEP_THRESHOLD;
use crate::simulation::{Attractor, Simulation};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameScheduler {
    /// Frame delta (seconds) above which a frame gets two steps.
    pub double_step_threshold: f32,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self {
            double_step_threshold: DOUBLE_STEP_THRESHOLD,
        }
    }
}

impl FrameScheduler {
    /// Steps to take for a frame that lasted `delta` seconds.
    pub fn steps_for(&self, delta: f32) -> usize {
        if delta > self.double_step_threshold {
            2
        } else {
            1
        }
    }

    /// Step `sim` for one frame. Returns the number of steps taken.
    pub fn advance(&self, sim: &mut Simulation, delta: f32, attractor: Option<&Attractor>) -> usize {
        let steps = self.steps_for(delta);
        for _ in 0..steps {
            sim.step(delta, attractor);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationOptions;
    use crate::simulation::create_simulation;

    #[test]
    fn test_slow_frames_step_twice() {
        let scheduler = FrameScheduler::default();
        assert_eq!(scheduler.steps_for(1.0 / 144.0), 1);
        assert_eq!(scheduler.steps_for(1.0 / 75.0), 1);
        assert_eq!(scheduler.steps_for(1.0 / 60.0), 2);
        assert_eq!(scheduler.steps_for(0.5), 2);
    }

    #[test]
    fn test_advance_counts_frames() {
        let mut sim = create_simulation(&SimulationOptions::default()).unwrap();
        let scheduler = FrameScheduler::default();
        assert_eq!(scheduler.advance(&mut sim, 1.0 / 120.0, None), 1);
        assert_eq!(scheduler.advance(&mut sim, 1.0 / 30.0, None), 2);
        assert_eq!(sim.frame(), 3);
    }
}
