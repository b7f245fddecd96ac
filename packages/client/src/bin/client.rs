//! Interactive client for a Converger conversation.
//!
//! Connects to the Phoenix socket, joins `conversation:<id>`, prints inbound
//! activity and sends every line typed at the prompt as a `new_activity`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin converger-client -- --token secret --conversation abc123
//! cargo run --bin converger-client -- -t secret -c 42 -u ws://chat.example.com/socket
//! ```

use std::time::Duration;

use clap::Parser;

use converger_client::{ClientConfig, config::DEFAULT_BASE_URL, runner::run_client};
use converger_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "converger-client")]
#[command(about = "Join a Converger conversation and chat over Phoenix channels", long_about = None)]
struct Args {
    /// Authentication token passed as the `token` connection parameter
    #[arg(short = 't', long)]
    token: String,

    /// Conversation to join
    #[arg(short = 'c', long)]
    conversation: String,

    /// Phoenix socket URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Seconds between heartbeats
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = ClientConfig::new(args.url)
        .with_heartbeat_interval(Duration::from_secs(args.heartbeat_secs));

    if let Err(e) = run_client(config, args.token, args.conversation.into()).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
