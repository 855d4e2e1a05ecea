// Network surfaces of the car
//
// Two routers share one `AppState`:
// - control: `/ws` command channel and `/capture_photo` stills
// - stream:  `/stream` MJPEG, at most one viewer at a time

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::sync::watch;

use crate::camera::Camera;
use crate::config::{FRAME_INTERVAL, FRAME_RETRY_DELAY, JPEG_QUALITY, STATUS_LINE_SPACING};
use crate::peripherals::{Lamp, Network};
use crate::vehicle::Vehicle;

mod capture;
pub mod command;
pub mod stream;

pub use stream::{StreamGuard, StreamLock};

/// Delays and encoder settings for the gateway's handlers
#[derive(Debug, Clone, Copy)]
pub struct GatewayTiming {
    pub status_line_spacing: Duration,
    pub frame_interval: Duration,
    pub frame_retry_delay: Duration,
    pub jpeg_quality: u8,
}

impl Default for GatewayTiming {
    fn default() -> Self {
        Self {
            status_line_spacing: STATUS_LINE_SPACING,
            frame_interval: FRAME_INTERVAL,
            frame_retry_delay: FRAME_RETRY_DELAY,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub vehicle: Arc<Mutex<Vehicle>>,
    pub lamp: Arc<Mutex<Lamp>>,
    pub camera: Arc<dyn Camera>,
    pub network: Arc<dyn Network>,
    pub stream_lock: Arc<StreamLock>,
    pub timing: GatewayTiming,
    /// Flips to true when the runtime is shutting down
    pub shutdown: watch::Receiver<bool>,
}

pub fn control_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(command::ws_handler))
        .route("/capture_photo", get(capture::capture_photo))
        .with_state(state)
}

pub fn stream_router(state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream::stream_handler))
        .with_state(state)
}

/// Resolves once `shutdown` reads true (or its sender is gone)
pub async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
