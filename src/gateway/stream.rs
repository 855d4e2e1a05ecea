// MJPEG stream with a single-viewer lock
//
// Only one viewer may hold the camera. The slot is taken with an atomic
// test-and-set and handed back by `Drop`, so every way a session can end
// (viewer gone, shutdown, camera lost, task cancelled) releases it and
// leaves the car stopped with the lamp off.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use super::capture::capture_frame;
use super::{AppState, GatewayTiming, shutdown_signal};
use crate::camera::jpeg::to_jpeg;
use crate::camera::{Camera, CameraError};
use crate::lock;
use crate::peripherals::Lamp;
use crate::vehicle::Vehicle;

pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=frame";

/// Frames buffered between the capture task and the socket
const PART_BUFFER: usize = 1;

/// Process-wide "a viewer is attached" flag
#[derive(Debug, Default)]
pub struct StreamLock {
    attached: AtomicBool,
}

impl StreamLock {
    /// Take the slot if it is free
    pub fn try_acquire(self: &Arc<Self>) -> Option<StreamGuard> {
        self.attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(StreamGuard {
            lock: Arc::clone(self),
        })
    }

    pub fn is_held(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// Holds the stream slot until dropped
#[derive(Debug)]
pub struct StreamGuard {
    lock: Arc<StreamLock>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.lock.attached.store(false, Ordering::Release);
    }
}

/// How a stream session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Writing a part failed: the viewer went away
    Disconnected,
    /// The runtime is shutting down
    Shutdown,
    /// The camera stopped delivering
    CameraLost,
}

/// An attached viewer. Dropping it releases the slot, stops the car and
/// turns the lamp off: the viewer may have been the only one driving.
pub struct StreamSession {
    guard: Option<StreamGuard>,
    vehicle: Arc<Mutex<Vehicle>>,
    lamp: Arc<Mutex<Lamp>>,
}

impl StreamSession {
    pub fn attach(state: &AppState) -> Option<Self> {
        let guard = state.stream_lock.try_acquire()?;
        Some(Self {
            guard: Some(guard),
            vehicle: state.vehicle.clone(),
            lamp: state.lamp.clone(),
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        drop(self.guard.take());
        lock(&self.vehicle).stop();
        lock(&self.lamp).turn_off();
        info!("Stream ended - client unlocked");
    }
}

pub async fn stream_handler(State(state): State<AppState>) -> Response {
    if let Err(e) = state.camera.frame_size() {
        warn!("Stream refused: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let Some(session) = StreamSession::attach(&state) else {
        info!("Stream rejected - client already active");
        return StatusCode::NOT_FOUND.into_response();
    };
    info!("Stream started - client locked");

    let (tx, rx) = mpsc::channel::<Bytes>(PART_BUFFER);
    tokio::spawn(pump_frames(
        session,
        state.camera.clone(),
        state.timing,
        tx,
        state.shutdown.clone(),
    ));

    // The body ends when the pump drops its sender; hyper drops the body
    // (and with it the receiver) when the viewer disconnects.
    let parts = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|part| (Ok::<_, Infallible>(part), rx))
    });

    ([(header::CONTENT_TYPE, CONTENT_TYPE)], Body::from_stream(parts)).into_response()
}

/// Capture, encode and send frames until the viewer goes away, the
/// runtime shuts down, or the camera is lost. Owns `session` so its
/// cleanup runs however this future finishes, including being dropped.
pub async fn pump_frames(
    session: StreamSession,
    camera: Arc<dyn Camera>,
    timing: GatewayTiming,
    parts: mpsc::Sender<Bytes>,
    shutdown: watch::Receiver<bool>,
) -> StreamEnd {
    let _session = session;

    loop {
        if *shutdown.borrow() {
            return StreamEnd::Shutdown;
        }

        let frame = match capture_frame(camera.clone()).await {
            Ok(frame) => frame,
            Err(CameraError::NoFrame) => {
                tokio::time::sleep(timing.frame_retry_delay).await;
                continue;
            }
            Err(e) => {
                warn!("Camera lost during stream: {}", e);
                return StreamEnd::CameraLost;
            }
        };

        let jpeg = match to_jpeg(frame, timing.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                tokio::time::sleep(timing.frame_retry_delay).await;
                continue;
            }
        };

        // A viewer that stops reading must not hold up shutdown
        tokio::select! {
            sent = parts.send(multipart_part(&jpeg)) => {
                if sent.is_err() {
                    return StreamEnd::Disconnected;
                }
            }
            _ = shutdown_signal(shutdown.clone()) => return StreamEnd::Shutdown,
        }

        tokio::time::sleep(timing.frame_interval).await;
    }
}

/// One `--frame` part with explicit length
fn multipart_part(jpeg: &[u8]) -> Bytes {
    let head = format!(
        "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );
    let mut part = Vec::with_capacity(head.len() + jpeg.len());
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    Bytes::from(part)
}
