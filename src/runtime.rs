// Control loop + network surfaces
// Note: the loop only ticks the vehicle. Commands arrive on the gateway's
// own tasks and land in the shared vehicle state between ticks.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

// local imports
use crate::camera::{Camera, FrameSize, TestPatternCamera};
use crate::config::{CMD_TIMEOUT, ConfigError, VehicleConfig};
use crate::gateway::{self, AppState, GatewayTiming, StreamLock};
use crate::lock;
use crate::motor::{DriveLines, ServoLine, SimDriveLines, SimServoLine};
use crate::peripherals::{Lamp, LampLine, Network, SimLampLine, SimNetwork};
use crate::vehicle::Vehicle;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the runtime drives or reads from
pub struct Hardware {
    pub left_motor: Box<dyn DriveLines>,
    pub right_motor: Box<dyn DriveLines>,
    pub pan_servo: Box<dyn ServoLine>,
    pub lamp: Box<dyn LampLine>,
    pub camera: Arc<dyn Camera>,
    pub network: Arc<dyn Network>,
}

impl Hardware {
    /// Logging outputs, a test-pattern camera and a fixed-signal network
    pub fn simulated() -> Self {
        Self {
            left_motor: Box::new(SimDriveLines::new("left")),
            right_motor: Box::new(SimDriveLines::new("right")),
            pan_servo: Box::new(SimServoLine::new("pan")),
            lamp: Box::new(SimLampLine),
            camera: Arc::new(TestPatternCamera::new(FrameSize::Vga)),
            network: Arc::new(SimNetwork::new(-55, true)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub bind: IpAddr,
    pub control_port: u16,
    pub stream_port: u16,
    pub loop_hz: u64,
    /// Optional JSON file with vehicle tunables
    pub config_path: Option<PathBuf>,
}

pub async fn run(options: RuntimeOptions, hardware: Hardware) -> Result<(), RuntimeError> {
    let vehicle_config = match &options.config_path {
        Some(path) => {
            info!("Loading vehicle config from {}", path.display());
            VehicleConfig::load(path)?
        }
        None => VehicleConfig::default(),
    };

    let vehicle = Arc::new(Mutex::new(Vehicle::new(
        &vehicle_config,
        hardware.left_motor,
        hardware.right_motor,
        hardware.pan_servo,
        Instant::now(),
    )));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        vehicle: vehicle.clone(),
        lamp: Arc::new(Mutex::new(Lamp::new(hardware.lamp))),
        camera: hardware.camera,
        network: hardware.network,
        stream_lock: Arc::new(StreamLock::default()),
        timing: GatewayTiming::default(),
        shutdown: shutdown_rx.clone(),
    };

    info!("Starting servers...");
    let control_addr = SocketAddr::new(options.bind, options.control_port);
    let stream_addr = SocketAddr::new(options.bind, options.stream_port);
    let control_listener = tokio::net::TcpListener::bind(control_addr).await?;
    let stream_listener = tokio::net::TcpListener::bind(stream_addr).await?;

    let control_app = gateway::control_router(state.clone());
    let control_stop = gateway::shutdown_signal(shutdown_rx.clone());
    let control_server = tokio::spawn(async move {
        axum::serve(control_listener, control_app)
            .with_graceful_shutdown(control_stop)
            .await
    });
    let stream_app = gateway::stream_router(state);
    let stream_stop = gateway::shutdown_signal(shutdown_rx);
    let stream_server = tokio::spawn(async move {
        axum::serve(stream_listener, stream_app)
            .with_graceful_shutdown(stream_stop)
            .await
    });

    let loop_hz = options.loop_hz.max(1);
    let mut tick = interval(tick_period(loop_hz));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        loop_hz,
        CMD_TIMEOUT.as_millis()
    );
    info!("Command channel: ws://{}/ws", control_addr);
    info!("Video stream: http://{}/stream", stream_addr);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                lock(&vehicle).tick(Instant::now());
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down...");
    let _ = shutdown_tx.send(true);
    lock(&vehicle).stop();

    for (name, server) in [("control", control_server), ("stream", stream_server)] {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("{} server error: {}", name, e),
            Err(e) => warn!("{} server task failed: {}", name, e),
        }
    }

    Ok(())
}

/// Loop period for `loop_hz`, never shorter than one microsecond
fn tick_period(loop_hz: u64) -> Duration {
    Duration::from_micros((1_000_000 / loop_hz.max(1)).max(1))
}
