// Vehicle controller: differential drive, pan servo and the command watchdog
// Note: the watchdog is what keeps the car from driving off on its own when
// the operator's browser freezes or the WiFi drops mid-command.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{CMD_TIMEOUT, VehicleConfig};
use crate::motor::{Actuator, ActuatorState, DriveLines, PoseInterpolator, PoseState, ServoLine};

/// The eight directional commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Forward,
    Backward,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
}

/// Stops the car when commands stop arriving
#[derive(Debug, Clone)]
pub struct CommandWatchdog {
    last_command: Instant,
    stopped: bool,
    timeout: Duration,
    trips: u32,
}

impl CommandWatchdog {
    pub fn new(now: Instant) -> Self {
        Self {
            last_command: now,
            stopped: true, // Start stopped until first command
            timeout: CMD_TIMEOUT,
            trips: 0,
        }
    }

    /// Record an accepted directional command
    pub fn feed(&mut self, now: Instant) {
        self.last_command = now;
        self.stopped = false;
    }

    /// Returns true exactly once per silence window: when the car is moving
    /// and the last command is older than the timeout.
    pub fn check(&mut self, now: Instant) -> bool {
        if self.stopped {
            return false;
        }
        let age = now.saturating_duration_since(self.last_command);
        if age > self.timeout {
            self.trips += 1;
            return true;
        }
        false
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn trips(&self) -> u32 {
        self.trips
    }
}

pub struct Vehicle {
    left: Actuator,
    right: Actuator,
    pan: PoseInterpolator,
    watchdog: CommandWatchdog,
    max_power: u8,
}

impl Vehicle {
    pub fn new(
        config: &VehicleConfig,
        left: Box<dyn DriveLines>,
        right: Box<dyn DriveLines>,
        pan: Box<dyn ServoLine>,
        now: Instant,
    ) -> Self {
        Self {
            left: Actuator::new(&config.motor, left),
            right: Actuator::new(&config.motor, right),
            pan: PoseInterpolator::new(&config.servo, pan),
            watchdog: CommandWatchdog::new(now),
            max_power: config.max_power,
        }
    }

    pub fn forward(&mut self, now: Instant) {
        self.drive(Motion::Forward, now);
    }

    pub fn backward(&mut self, now: Instant) {
        self.drive(Motion::Backward, now);
    }

    pub fn left(&mut self, now: Instant) {
        self.drive(Motion::Left, now);
    }

    pub fn right(&mut self, now: Instant) {
        self.drive(Motion::Right, now);
    }

    pub fn forward_left(&mut self, now: Instant) {
        self.drive(Motion::ForwardLeft, now);
    }

    pub fn forward_right(&mut self, now: Instant) {
        self.drive(Motion::ForwardRight, now);
    }

    pub fn backward_left(&mut self, now: Instant) {
        self.drive(Motion::BackwardLeft, now);
    }

    pub fn backward_right(&mut self, now: Instant) {
        self.drive(Motion::BackwardRight, now);
    }

    /// Feed the watchdog and set both wheel intents for `motion`.
    ///
    /// Turns spin the wheels against each other at full power. Diagonals
    /// keep both wheels turning the same way with the inner wheel at two
    /// thirds power, which gives a wide arc instead of a pivot.
    pub fn drive(&mut self, motion: Motion, now: Instant) {
        debug!("Drive command: {:?}", motion);
        self.watchdog.feed(now);

        let full = self.max_power;
        let reduced = reduced_power(full);

        match motion {
            Motion::Forward => {
                self.left.set_forward(full);
                self.right.set_forward(full);
            }
            Motion::Backward => {
                self.left.set_backward(full);
                self.right.set_backward(full);
            }
            Motion::Left => {
                self.left.set_backward(full);
                self.right.set_forward(full);
            }
            Motion::Right => {
                self.left.set_forward(full);
                self.right.set_backward(full);
            }
            Motion::ForwardLeft => {
                self.left.set_forward(reduced);
                self.right.set_forward(full);
            }
            Motion::ForwardRight => {
                self.left.set_forward(full);
                self.right.set_forward(reduced);
            }
            Motion::BackwardLeft => {
                self.left.set_backward(reduced);
                self.right.set_backward(full);
            }
            Motion::BackwardRight => {
                self.left.set_backward(full);
                self.right.set_backward(reduced);
            }
        }
    }

    /// Stop both motors immediately. Does not touch the watchdog timer.
    pub fn stop(&mut self) {
        self.left.stop();
        self.right.stop();
        self.watchdog.stopped = true;
    }

    /// Point the camera. `x` pans; the car has no tilt servo so `y` is unused.
    pub fn set_camera_angle(&mut self, x: i32, y: i32) {
        debug!("Camera drag: x={}, y={} (tilt ignored)", x, y);
        self.pan.set_target(x);
    }

    /// One control step: servo, then watchdog, then motors.
    /// The watchdog runs before the motors so a stale target never gets
    /// another ramp step after the timeout.
    pub fn tick(&mut self, now: Instant) {
        self.pan.tick(now);

        if self.watchdog.check(now) {
            warn!(
                "No command for {}ms, stopping motors (trip #{})",
                self.watchdog.timeout.as_millis(),
                self.watchdog.trips()
            );
            self.stop();
        }

        self.left.tick(now);
        self.right.tick(now);
    }

    pub fn left_state(&self) -> ActuatorState {
        self.left.state()
    }

    pub fn right_state(&self) -> ActuatorState {
        self.right.state()
    }

    pub fn pan_state(&self) -> PoseState {
        self.pan.state()
    }

    pub fn watchdog(&self) -> &CommandWatchdog {
        &self.watchdog
    }
}

/// Inner-wheel power for diagonal moves: two thirds of `full`, truncated
fn reduced_power(full: u8) -> u8 {
    (full as u16 * 2 / 3) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::Direction;
    use crate::motor::testing::{RecordingLines, RecordingServo};

    struct Rig {
        vehicle: Vehicle,
        left: RecordingLines,
        right: RecordingLines,
        t0: Instant,
    }

    fn rig() -> Rig {
        let left = RecordingLines::default();
        let right = RecordingLines::default();
        let t0 = Instant::now();
        let vehicle = Vehicle::new(
            &VehicleConfig::default(),
            Box::new(left.clone()),
            Box::new(right.clone()),
            Box::new(RecordingServo::default()),
            t0,
        );
        Rig {
            vehicle,
            left,
            right,
            t0,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_reduced_power_rounding() {
        assert_eq!(reduced_power(255), 170);
        assert_eq!(reduced_power(200), 133);
        assert_eq!(reduced_power(1), 0);
        assert_eq!(reduced_power(0), 0);
    }

    #[test]
    fn test_turns_are_differential() {
        let mut rig = rig();
        rig.vehicle.left(rig.t0);
        assert_eq!(rig.vehicle.left_state().direction, Direction::Backward);
        assert_eq!(rig.vehicle.right_state().direction, Direction::Forward);
        assert_eq!(rig.vehicle.left_state().target_power, 255);
        assert_eq!(rig.vehicle.right_state().target_power, 255);

        rig.vehicle.right(rig.t0);
        assert_eq!(rig.vehicle.left_state().direction, Direction::Forward);
        assert_eq!(rig.vehicle.right_state().direction, Direction::Backward);
    }

    #[test]
    fn test_diagonal_slows_inner_wheel() {
        let mut rig = rig();
        let mut config = VehicleConfig::default();
        config.motor.min_power = 100;
        rig.vehicle = Vehicle::new(
            &config,
            Box::new(rig.left.clone()),
            Box::new(rig.right.clone()),
            Box::new(RecordingServo::default()),
            rig.t0,
        );

        rig.vehicle.forward_left(rig.t0);
        assert_eq!(rig.vehicle.left_state().target_power, 170);
        assert_eq!(rig.vehicle.right_state().target_power, 255);
        assert_eq!(rig.vehicle.left_state().direction, Direction::Forward);

        rig.vehicle.backward_right(rig.t0);
        assert_eq!(rig.vehicle.left_state().target_power, 255);
        assert_eq!(rig.vehicle.right_state().target_power, 170);
        assert_eq!(rig.vehicle.right_state().direction, Direction::Backward);
    }

    #[test]
    fn test_diagonal_respects_stall_floor() {
        let mut rig = rig();
        rig.vehicle.forward_right(rig.t0);
        // 170 is below the default 200 floor
        assert_eq!(rig.vehicle.right_state().target_power, 200);
    }

    #[test]
    fn test_forward_then_left_within_timeout() {
        let mut rig = rig();
        rig.vehicle.forward(rig.t0);
        rig.vehicle.tick(rig.t0);

        rig.vehicle.left(rig.t0 + ms(300));
        rig.vehicle.tick(rig.t0 + ms(300));

        assert_eq!(rig.vehicle.left_state().direction, Direction::Backward);
        assert_eq!(rig.vehicle.right_state().direction, Direction::Forward);
        assert!(!rig.vehicle.watchdog().is_stopped());
        assert_eq!(rig.vehicle.watchdog().trips(), 0);
        assert_eq!(rig.left.last().map(|(_, b)| b > 0), Some(true));
    }

    #[test]
    fn test_watchdog_stops_after_silence() {
        let mut rig = rig();
        rig.vehicle.forward(rig.t0);
        for i in 0..10 {
            rig.vehicle.tick(rig.t0 + ms(30 * i));
        }
        assert!(rig.vehicle.left_state().current_power > 0);

        rig.vehicle.tick(rig.t0 + ms(600));
        assert_eq!(rig.vehicle.left_state().current_power, 0);
        assert_eq!(rig.vehicle.right_state().current_power, 0);
        assert_eq!(rig.left.last(), Some((0, 0)));
        assert_eq!(rig.right.last(), Some((0, 0)));
    }

    #[test]
    fn test_watchdog_trips_once() {
        let mut rig = rig();
        rig.vehicle.forward(rig.t0);

        // Exactly at the timeout is still fine
        rig.vehicle.tick(rig.t0 + ms(500));
        assert_eq!(rig.vehicle.watchdog().trips(), 0);

        rig.vehicle.tick(rig.t0 + ms(501));
        assert_eq!(rig.vehicle.watchdog().trips(), 1);
        assert!(rig.vehicle.watchdog().is_stopped());

        for i in 1..20 {
            rig.vehicle.tick(rig.t0 + ms(501 + 30 * i));
        }
        assert_eq!(rig.vehicle.watchdog().trips(), 1);
        assert_eq!(rig.vehicle.left_state().direction, Direction::Stopped);
    }

    #[test]
    fn test_new_command_rearms_watchdog() {
        let mut rig = rig();
        rig.vehicle.forward(rig.t0);
        rig.vehicle.tick(rig.t0 + ms(600));
        assert_eq!(rig.vehicle.watchdog().trips(), 1);

        rig.vehicle.backward(rig.t0 + ms(700));
        rig.vehicle.tick(rig.t0 + ms(700));
        assert_eq!(rig.vehicle.left_state().direction, Direction::Backward);
        assert!(rig.vehicle.left_state().current_power > 0);

        rig.vehicle.tick(rig.t0 + ms(1300));
        assert_eq!(rig.vehicle.watchdog().trips(), 2);
    }

    #[test]
    fn test_explicit_stop_does_not_reset_timer() {
        let mut rig = rig();
        rig.vehicle.forward(rig.t0);
        rig.vehicle.stop();
        assert!(rig.vehicle.watchdog().is_stopped());

        rig.vehicle.tick(rig.t0 + ms(1000));
        assert_eq!(rig.vehicle.watchdog().trips(), 0);
        assert_eq!(rig.vehicle.left_state().current_power, 0);
    }

    #[test]
    fn test_camera_angle_pans_only() {
        let mut rig = rig();
        rig.vehicle.set_camera_angle(-50, 20);
        assert_eq!(rig.vehicle.pan_state().target_angle, 45);
        // Camera drag is not a drive command
        assert!(rig.vehicle.watchdog().is_stopped());
    }
}
