use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wificar_runtime::config::{CONTROL_PORT, DEFAULT_BIND, LOOP_HZ, STREAM_PORT};
use wificar_runtime::runtime::{self, Hardware, RuntimeOptions};

/// Drive, pan and stream from a WiFi camera car
#[derive(Parser, Debug)]
#[command(name = "wificar-runtime")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address both servers listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: IpAddr,

    /// Port for the `/ws` command channel and `/capture_photo`
    #[arg(long, default_value_t = CONTROL_PORT)]
    control_port: u16,

    /// Port for the `/stream` MJPEG feed
    #[arg(long, default_value_t = STREAM_PORT)]
    stream_port: u16,

    /// Vehicle tunables (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = LOOP_HZ)]
    loop_hz: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let options = RuntimeOptions {
        bind: args.bind,
        control_port: args.control_port,
        stream_port: args.stream_port,
        loop_hz: args.loop_hz,
        config_path: args.config,
    };

    if let Err(e) = runtime::run(options, Hardware::simulated()).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::parse_from(["wificar-runtime", "-c", "car.json", "--loop-hz", "50"]);
        assert_eq!(args.config, Some(PathBuf::from("car.json")));
        assert_eq!(args.loop_hz, 50);
        assert_eq!(args.control_port, CONTROL_PORT);
        assert_eq!(args.stream_port, STREAM_PORT);
        assert_eq!(args.bind.to_string(), DEFAULT_BIND);
    }
}
