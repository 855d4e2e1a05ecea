// Hardware signal lines for the drive motors and the pan servo
//
// The runtime only produces abstract levels: 0-255 power on one of two
// lines per motor, and 0-180 degrees for the servo. Turning those into PWM
// duty is up to whichever backend implements these traits.

use tracing::debug;

/// Two-line H-bridge input for one drive motor
pub trait DriveLines: Send {
    /// Drive the forward and backward lines. At most one is non-zero.
    fn write(&mut self, forward: u8, backward: u8);
}

/// Position input for one hobby servo
pub trait ServoLine: Send {
    fn write(&mut self, angle: i32);
}

/// Drive lines that only log what they would output
pub struct SimDriveLines {
    name: &'static str,
    last: (u8, u8),
}

impl SimDriveLines {
    pub fn new(name: &'static str) -> Self {
        Self { name, last: (0, 0) }
    }
}

impl DriveLines for SimDriveLines {
    fn write(&mut self, forward: u8, backward: u8) {
        if self.last != (forward, backward) {
            debug!(
                "Motor {} lines: forward={}, backward={}",
                self.name, forward, backward
            );
        }
        self.last = (forward, backward);
    }
}

/// Servo line that only logs what it would output
pub struct SimServoLine {
    name: &'static str,
}

impl SimServoLine {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ServoLine for SimServoLine {
    fn write(&mut self, angle: i32) {
        debug!("Servo {} -> {} deg", self.name, angle);
    }
}
