// Timeouts, ports, actuator tuning
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 100;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(500);

// Network surfaces
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const CONTROL_PORT: u16 = 82; // /ws and /capture_photo
pub const STREAM_PORT: u16 = 81; // /stream

// Drive motors
pub const MAX_POWER: u8 = 255;
pub const MIN_POWER: u8 = 200; // below this the gearmotors stall
pub const RAMP_STEP: u8 = 5;
pub const RAMP_INTERVAL_MS: u16 = 30;

// Pan servo
pub const SERVO_HOME_DEG: i32 = 90;
pub const SERVO_STEP_DEG: i32 = 2;
pub const SERVO_INTERVAL_MS: u16 = 40;

// Gateway pacing
pub const STATUS_LINE_SPACING: Duration = Duration::from_millis(300);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);
pub const FRAME_RETRY_DELAY: Duration = Duration::from_millis(100);
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Drive tuning for one ramp-limited motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub min_power: u8,
    pub ramp_step: u8,
    pub ramp_interval_ms: u16,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            min_power: MIN_POWER,
            ramp_step: RAMP_STEP,
            ramp_interval_ms: RAMP_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub home_deg: i32,
    pub step_deg: i32,
    pub interval_ms: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            home_deg: SERVO_HOME_DEG,
            step_deg: SERVO_STEP_DEG,
            interval_ms: SERVO_INTERVAL_MS,
        }
    }
}

/// Vehicle tunables. Every field falls back to the constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub max_power: u8,
    pub motor: MotorConfig,
    pub servo: ServoConfig,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_power: MAX_POWER,
            motor: MotorConfig::default(),
            servo: ServoConfig::default(),
        }
    }
}

impl VehicleConfig {
    /// Load tunables from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }
}
