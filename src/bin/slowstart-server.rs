//! Serve the acceptance oracle over TCP.
//!
//! Every connection is answered on its own task, set `RUST_LOG` to control verbosity.

use std::io;
use std::time::Duration;

use clap::Parser;
use slowstart_rs::server::{Config, MakeOracle};
use tokio::net::TcpListener;

/// Answer every payload with ACK when it fits in the threshold and NAK otherwise.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Host to listen on
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value_t = 8888)]
    port: u16,
    /// Largest accepted payload in bytes
    #[arg(short, long, default_value_t = 256)]
    threshold: u64,
    /// Delay before every verdict in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::new()
        .threshold(args.threshold)
        .processing_delay(Duration::from_millis(args.delay_ms));
    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    listener.serve(config).await
}
