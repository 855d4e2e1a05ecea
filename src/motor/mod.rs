// Actuation for the car: two ramp-limited drive motors and the camera pan servo
//
// Provides:
// - Ramp-limited drive motor state machine
// - Pan servo interpolation
// - Hardware line traits plus simulated (logging) backends

pub mod actuator;
mod driver;
pub mod servo;

pub use actuator::{Actuator, ActuatorState, Direction};
pub use driver::{DriveLines, ServoLine, SimDriveLines, SimServoLine};
pub use servo::{PoseInterpolator, PoseState};

#[cfg(test)]
pub(crate) use driver::testing;
