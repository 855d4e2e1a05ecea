// Board peripherals the gateway talks to: flash lamp and WiFi link

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

/// Output pin driving the flash LED
pub trait LampLine: Send {
    fn write(&mut self, on: bool);
}

/// WiFi link diagnostics and provisioning hooks
pub trait Network: Send + Sync {
    /// Signal strength in dBm of the link the operator is on
    fn rssi(&self) -> i32;

    /// True when joined to an access point (station mode)
    fn is_connected(&self) -> bool;

    /// Forget stored credentials and fall back to provisioning on next boot
    fn reset_settings(&self);
}

pub struct Lamp {
    on: bool,
    line: Box<dyn LampLine>,
}

impl Lamp {
    pub fn new(mut line: Box<dyn LampLine>) -> Self {
        line.write(false);
        Self { on: false, line }
    }

    /// Flip the lamp and return the new state
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.line.write(self.on);
        self.on
    }

    pub fn turn_off(&mut self) {
        self.on = false;
        self.line.write(false);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

pub struct SimLampLine;

impl LampLine for SimLampLine {
    fn write(&mut self, on: bool) {
        debug!("Flash lamp {}", if on { "on" } else { "off" });
    }
}

/// Network stand-in for running off the board
pub struct SimNetwork {
    rssi: i32,
    connected: AtomicBool,
    resets: Mutex<u32>,
}

impl SimNetwork {
    pub fn new(rssi: i32, connected: bool) -> Self {
        Self {
            rssi,
            connected: AtomicBool::new(connected),
            resets: Mutex::new(0),
        }
    }

    #[cfg(test)]
    pub fn resets(&self) -> u32 {
        *crate::lock(&self.resets)
    }
}

impl Network for SimNetwork {
    fn rssi(&self) -> i32 {
        self.rssi
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn reset_settings(&self) {
        let mut resets = crate::lock(&self.resets);
        *resets += 1;
        info!("Clearing stored WiFi credentials (reset #{})", *resets);
        self.connected.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct RecordingLamp(pub Arc<Mutex<Vec<bool>>>);

    impl RecordingLamp {
        pub fn writes(&self) -> Vec<bool> {
            self.0.lock().unwrap().clone()
        }
    }

    impl LampLine for RecordingLamp {
        fn write(&mut self, on: bool) {
            self.0.lock().unwrap().push(on);
        }
    }
}
