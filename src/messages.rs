// Command channel message types
//
// Inbound text frames are parsed once into `Command`; everything past the
// socket works on the enum. Outbound replies are plain text lines.

use std::fmt;
use std::str::FromStr;

use crate::camera::FrameSize;
use crate::vehicle::Motion;

const CAMERA_DRAG_PREFIX: &str = "cameraDrag_";
const FRAME_SIZE_PREFIX: &str = "frameSize_";

/// Command from the operator UI -> runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleFlash,
    Ping,
    Reset,
    Drive(Motion),
    Stop,
    CameraDrag { x: i32, y: i32 },
    FrameSize(FrameSize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command: {0:?}")]
    Unknown(String),

    #[error("Bad arguments for {command}: {args:?}")]
    BadArguments { command: &'static str, args: String },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let command = match text {
            "toggleFlash" => Command::ToggleFlash,
            "ping" => Command::Ping,
            "reset" => Command::Reset,
            "stop" => Command::Stop,
            "forward" => Command::Drive(Motion::Forward),
            "backward" => Command::Drive(Motion::Backward),
            "left" => Command::Drive(Motion::Left),
            "right" => Command::Drive(Motion::Right),
            "forward-left" => Command::Drive(Motion::ForwardLeft),
            "forward-right" => Command::Drive(Motion::ForwardRight),
            "backward-left" => Command::Drive(Motion::BackwardLeft),
            "backward-right" => Command::Drive(Motion::BackwardRight),
            _ => {
                if let Some(args) = text.strip_prefix(CAMERA_DRAG_PREFIX) {
                    return parse_camera_drag(args);
                }
                if let Some(name) = text.strip_prefix(FRAME_SIZE_PREFIX) {
                    return Ok(Command::FrameSize(FrameSize::from_name(name)));
                }
                return Err(ParseError::Unknown(text.to_string()));
            }
        };
        Ok(command)
    }
}

/// `<int>_<int>`. Out-of-range integers saturate to i32 bounds.
fn parse_camera_drag(args: &str) -> Result<Command, ParseError> {
    let bad = || ParseError::BadArguments {
        command: "cameraDrag",
        args: args.to_string(),
    };

    let (x, y) = args.split_once('_').ok_or_else(bad)?;
    let x = parse_saturating(x).ok_or_else(bad)?;
    let y = parse_saturating(y).ok_or_else(bad)?;
    Ok(Command::CameraDrag { x, y })
}

fn parse_saturating(text: &str) -> Option<i32> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only overflow is left to fail here
    match text.parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) if text.starts_with('-') => Some(i32::MIN),
        Err(_) => Some(i32::MAX),
    }
}

/// Reply from runtime -> operator UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Flash(bool),
    Wifi(bool),
    FrameSize(FrameSize),
    Pong { rssi: i32, flash: bool },
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Flash(on) => write!(f, "Flash-{}", on_off(*on)),
            Reply::Wifi(connected) => write!(f, "WIFI-{}", u8::from(*connected)),
            Reply::FrameSize(size) => write!(f, "FRAMESIZE-{}", size),
            Reply::Pong { rssi, flash } => {
                write!(f, "pong-{}-{}", rssi.unsigned_abs(), on_off(*flash))
            }
        }
    }
}
