//! Discover the capacity of an oracle server.

#![allow(clippy::print_stdout)]

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use slowstart_rs::client::{probe, Config};
use slowstart_rs::window::Policy;

/// Probe an oracle server with growing payloads until its threshold is found.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Host of the oracle server
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Port of the oracle server
    #[arg(short, long, default_value_t = 8888)]
    port: u16,
    /// Window adjustment policy: doubling, lazy-caterer or binary-search
    #[arg(long, default_value_t = Policy::Doubling)]
    policy: Policy,
    /// Size of the first probe in bytes
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    initial_window: u64,
    /// Largest probe in bytes, growth past it is clamped
    #[arg(long, default_value_t = 64 * 1024 * 1024, value_parser = clap::value_parser!(u64).range(1..))]
    max_window: u64,
    /// Bound of a single round trip in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::new()
        .policy(args.policy)
        .initial_window(args.initial_window)
        .max_window(args.max_window)
        .round_trip_timeout(Duration::from_millis(args.timeout_ms));
    match probe((args.host.as_str(), args.port), &config).await {
        Ok(report) => {
            println!("policy:      {}", report.policy);
            println!("capacity:    {} bytes", report.capacity);
            println!("bytes sent:  {}", report.summary.bytes_sent);
            println!("round trips: {}", report.summary.round_trips);
            println!("elapsed:     {:.3}s", report.summary.elapsed.as_secs_f64());
            println!("throughput:  {:.1} bytes/s", report.summary.throughput());
            ExitCode::SUCCESS
        }
        Err(aborted) => {
            println!("{aborted}");
            println!("partial: {}", aborted.summary);
            ExitCode::FAILURE
        }
    }
}
