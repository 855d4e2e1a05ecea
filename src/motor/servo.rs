// Pan servo interpolation
//
// The servo is never commanded straight to a new target: each eligible tick
// moves it `step_deg` closer, which keeps the camera from jerking.

use std::time::{Duration, Instant};

use super::driver::ServoLine;
use crate::config::ServoConfig;

pub const MIN_ANGLE: i32 = 0;
pub const MAX_ANGLE: i32 = 180;

/// Operator-side range for camera drag input
pub const INPUT_RANGE: (i32, i32) = (-100, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseState {
    pub current_angle: i32,
    pub target_angle: i32,
    pub step_deg: i32,
    pub update_interval: Duration,
    pub last_update: Option<Instant>,
}

pub struct PoseInterpolator {
    state: PoseState,
    line: Box<dyn ServoLine>,
}

impl PoseInterpolator {
    /// Create the interpolator and park the servo at its home angle
    pub fn new(config: &ServoConfig, mut line: Box<dyn ServoLine>) -> Self {
        let home = config.home_deg.clamp(MIN_ANGLE, MAX_ANGLE);
        line.write(home);

        Self {
            state: PoseState {
                current_angle: home,
                target_angle: home,
                step_deg: config.step_deg.max(1),
                update_interval: Duration::from_millis(config.interval_ms as u64),
                last_update: None,
            },
            line,
        }
    }

    pub fn state(&self) -> PoseState {
        self.state
    }

    /// Set the target from operator input in `INPUT_RANGE`
    pub fn set_target(&mut self, input: i32) {
        self.state.target_angle = input_to_angle(input);
    }

    pub fn tick(&mut self, now: Instant) {
        let state = &mut self.state;

        if let Some(last) = state.last_update {
            if now.saturating_duration_since(last) < state.update_interval {
                return;
            }
        }
        state.last_update = Some(now);

        if state.current_angle == state.target_angle {
            return;
        }

        state.current_angle = if state.current_angle < state.target_angle {
            (state.current_angle + state.step_deg).min(state.target_angle)
        } else {
            (state.current_angle - state.step_deg).max(state.target_angle)
        };

        self.line.write(state.current_angle);
    }
}

/// Linear map from `INPUT_RANGE` onto servo degrees, clamped at both ends
fn input_to_angle(input: i32) -> i32 {
    let (lo, hi) = INPUT_RANGE;
    let input = input.clamp(lo, hi);
    (input - lo) * (MAX_ANGLE - MIN_ANGLE) / (hi - lo) + MIN_ANGLE
}
