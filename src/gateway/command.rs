// WebSocket command channel
//
// On connect the UI gets three status lines (lamp, WiFi, resolution) so it
// can render without polling. After that every text frame is one command.
// Handling never blocks beyond a short lock and an already-built reply.

use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use super::{AppState, shutdown_signal};
use crate::lock;
use crate::messages::{Command, Reply};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| command_socket(socket, state))
}

async fn command_socket<S, E>(mut socket: S, state: AppState)
where
    S: Sink<Message, Error = E> + Stream<Item = Result<Message, E>> + Unpin,
{
    info!("Command channel connected");

    for (i, line) in status_lines(&state).into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(state.timing.status_line_spacing).await;
        }
        if socket.send(Message::Text(line.to_string())).await.is_err() {
            return;
        }
    }

    let stopping = shutdown_signal(state.shutdown.clone());
    tokio::pin!(stopping);

    loop {
        tokio::select! {
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = handle_message(&state, &text) else {
                            continue;
                        };
                        debug!("Send: {}", reply);
                        if socket.send(Message::Text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by the socket layer; binary frames are not commands
                    Some(Ok(_)) => {}
                }
            }
            _ = &mut stopping => break,
        }
    }

    info!("Command channel closed");
}

/// Lines sent to a freshly attached controller
pub fn status_lines(state: &AppState) -> Vec<Reply> {
    let mut lines = vec![
        Reply::Flash(lock(&state.lamp).is_on()),
        Reply::Wifi(state.network.is_connected()),
    ];

    match state.camera.frame_size() {
        Ok(size) => lines.push(Reply::FrameSize(size)),
        Err(e) => warn!("Cannot report frame size: {}", e),
    }

    lines
}

/// Parse one text frame and act on it. Unknown or malformed commands are
/// logged and dropped.
pub fn handle_message(state: &AppState, text: &str) -> Option<Reply> {
    match text.parse::<Command>() {
        Ok(command) => {
            debug!("Command: {:?}", command);
            dispatch(state, command, Instant::now())
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

pub fn dispatch(state: &AppState, command: Command, now: Instant) -> Option<Reply> {
    match command {
        Command::ToggleFlash => Some(Reply::Flash(lock(&state.lamp).toggle())),
        Command::Ping => Some(Reply::Pong {
            rssi: state.network.rssi(),
            flash: lock(&state.lamp).is_on(),
        }),
        Command::Reset => {
            info!("Factory reset requested");
            state.network.reset_settings();
            None
        }
        Command::Drive(motion) => {
            lock(&state.vehicle).drive(motion, now);
            None
        }
        Command::Stop => {
            lock(&state.vehicle).stop();
            None
        }
        Command::CameraDrag { x, y } => {
            lock(&state.vehicle).set_camera_angle(x, y);
            None
        }
        Command::FrameSize(size) => {
            if let Err(e) = state.camera.set_frame_size(size) {
                warn!("Frame size change rejected: {}", e);
            }
            None
        }
    }
}
