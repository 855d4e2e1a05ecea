// Ramp-limited drive motor
//
// Commands only set intent (direction + target power). The actual power
// moves toward the target on `tick`, at most `ramp_step` per ramp interval,
// so any burst of commands between two ticks collapses into one transition.

use std::time::{Duration, Instant};

use tracing::trace;

use super::driver::DriveLines;
use crate::config::MotorConfig;

/// Ramp step limits accepted by `set_ramp`
const RAMP_STEP_RANGE: (u8, u8) = (1, 50);
const RAMP_INTERVAL_RANGE_MS: (u16, u16) = (5, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Stopped,
    Forward,
    Backward,
}

/// Snapshot of one motor's ramp state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub direction: Direction,
    pub current_power: u8,
    pub target_power: u8,
    pub min_power: u8,
    pub ramp_step: u8,
    pub ramp_interval: Duration,
    pub last_update: Option<Instant>,
}

pub struct Actuator {
    state: ActuatorState,
    lines: Box<dyn DriveLines>,
}

impl Actuator {
    pub fn new(config: &MotorConfig, lines: Box<dyn DriveLines>) -> Self {
        let mut actuator = Self {
            state: ActuatorState {
                direction: Direction::Stopped,
                current_power: 0,
                target_power: 0,
                min_power: 0,
                ramp_step: 0,
                ramp_interval: Duration::ZERO,
                last_update: None,
            },
            lines,
        };
        actuator.set_min_power(config.min_power);
        actuator.set_ramp(config.ramp_step, config.ramp_interval_ms);
        actuator.lines.write(0, 0);
        actuator
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Power floor below which the motor stalls
    pub fn set_min_power(&mut self, min_power: u8) {
        self.state.min_power = min_power;
    }

    /// Ramp rate: `step` power units every `interval_ms`
    pub fn set_ramp(&mut self, step: u8, interval_ms: u16) {
        self.state.ramp_step = step.clamp(RAMP_STEP_RANGE.0, RAMP_STEP_RANGE.1);
        let interval_ms = interval_ms.clamp(RAMP_INTERVAL_RANGE_MS.0, RAMP_INTERVAL_RANGE_MS.1);
        self.state.ramp_interval = Duration::from_millis(interval_ms as u64);
    }

    pub fn set_forward(&mut self, power: u8) {
        self.set_intent(Direction::Forward, power);
    }

    pub fn set_backward(&mut self, power: u8) {
        self.set_intent(Direction::Backward, power);
    }

    fn set_intent(&mut self, direction: Direction, power: u8) {
        self.state.direction = direction;
        self.state.target_power = power.max(self.state.min_power);
    }

    /// Immediate stop, not ramped
    pub fn stop(&mut self) {
        self.state.direction = Direction::Stopped;
        self.state.target_power = 0;
        self.state.current_power = 0;
    }

    /// Advance the ramp if a full ramp interval has passed
    pub fn tick(&mut self, now: Instant) {
        let state = &mut self.state;

        if let Some(last) = state.last_update {
            if now.saturating_duration_since(last) < state.ramp_interval {
                return;
            }
        }
        state.last_update = Some(now);

        if state.direction == Direction::Stopped {
            state.current_power = 0;
            self.lines.write(0, 0);
            return;
        }

        // Leaving zero: jump straight to the stall floor
        if state.current_power == 0 && state.target_power > 0 {
            state.current_power = state.min_power;
        }
        state.current_power = step_toward(state.current_power, state.target_power, state.ramp_step);

        trace!(
            "Actuator {:?}: power {} -> target {}",
            state.direction, state.current_power, state.target_power
        );

        let power = state.current_power;
        let (forward, backward) = match state.direction {
            Direction::Forward => (power, 0),
            Direction::Backward => (0, power),
            Direction::Stopped => (0, 0),
        };
        self.lines.write(forward, backward);
    }
}

fn step_toward(current: u8, target: u8, step: u8) -> u8 {
    if current < target {
        current.saturating_add(step).min(target)
    } else {
        current.saturating_sub(step).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::driver::testing::RecordingLines;

    fn actuator() -> (Actuator, RecordingLines) {
        let lines = RecordingLines::default();
        let config = MotorConfig {
            min_power: 200,
            ramp_step: 5,
            ramp_interval_ms: 30,
        };
        (Actuator::new(&config, Box::new(lines.clone())), lines)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_set_forward_does_not_move_until_tick() {
        let (mut motor, lines) = actuator();
        motor.set_forward(255);

        let state = motor.state();
        assert_eq!(state.direction, Direction::Forward);
        assert_eq!(state.target_power, 255);
        assert_eq!(state.current_power, 0);
        assert_eq!(lines.writes(), vec![(0, 0)]);
    }

    #[test]
    fn test_target_is_clamped_to_min_power() {
        let (mut motor, _) = actuator();
        motor.set_backward(10);
        assert_eq!(motor.state().target_power, 200);
    }

    #[test]
    fn test_first_tick_jumps_to_floor_then_ramps() {
        let (mut motor, lines) = actuator();
        let t0 = Instant::now();
        motor.set_forward(255);

        motor.tick(t0);
        assert_eq!(motor.state().current_power, 205);
        assert_eq!(lines.last(), Some((205, 0)));

        // Too early: no change
        motor.tick(t0 + ms(10));
        assert_eq!(motor.state().current_power, 205);

        motor.tick(t0 + ms(30));
        assert_eq!(motor.state().current_power, 210);
    }

    #[test]
    fn test_ramp_converges_without_overshoot() {
        let (mut motor, _) = actuator();
        let t0 = Instant::now();
        motor.set_backward(233);

        let mut previous = 0u8;
        for i in 0..20 {
            motor.tick(t0 + ms(30 * i));
            let power = motor.state().current_power;
            if previous != 0 {
                assert!(power.abs_diff(previous) <= 5);
            }
            assert!(power <= 233);
            previous = power;
        }
        assert_eq!(motor.state().current_power, 233);
    }

    #[test]
    fn test_ramp_down_to_lower_target() {
        let (mut motor, _) = actuator();
        let t0 = Instant::now();
        motor.set_forward(255);
        for i in 0..20 {
            motor.tick(t0 + ms(30 * i));
        }
        assert_eq!(motor.state().current_power, 255);

        motor.set_forward(201);
        motor.tick(t0 + ms(30 * 20));
        assert_eq!(motor.state().current_power, 250);
        for i in 21..40 {
            motor.tick(t0 + ms(30 * i));
        }
        assert_eq!(motor.state().current_power, 201);
    }

    #[test]
    fn test_backward_uses_second_line() {
        let (mut motor, lines) = actuator();
        motor.set_backward(255);
        motor.tick(Instant::now());
        assert_eq!(lines.last(), Some((0, 205)));
    }

    #[test]
    fn test_stop_is_immediate() {
        let (mut motor, lines) = actuator();
        let t0 = Instant::now();
        motor.set_forward(255);
        motor.tick(t0);
        motor.tick(t0 + ms(30));

        motor.stop();
        assert_eq!(motor.state().current_power, 0);
        motor.tick(t0 + ms(60));
        assert_eq!(motor.state().current_power, 0);
        assert_eq!(motor.state().direction, Direction::Stopped);
        assert_eq!(lines.last(), Some((0, 0)));
    }

    #[test]
    fn test_set_ramp_is_clamped() {
        let (mut motor, _) = actuator();
        motor.set_ramp(0, 1000);
        assert_eq!(motor.state().ramp_step, 1);
        assert_eq!(motor.state().ramp_interval, ms(100));

        motor.set_ramp(200, 0);
        assert_eq!(motor.state().ramp_step, 50);
        assert_eq!(motor.state().ramp_interval, ms(5));
    }

    #[test]
    fn test_step_toward() {
        assert_eq!(step_toward(250, 255, 10), 255);
        assert_eq!(step_toward(205, 200, 10), 200);
        assert_eq!(step_toward(3, 0, 10), 0);
        assert_eq!(step_toward(100, 100, 5), 100);
    }
}
