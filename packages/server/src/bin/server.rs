//! Sajiki watch party relay server.
//!
//! Keeps the playback of everyone in a room in step and relays chat between them.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sajiki-server
//! cargo run --bin sajiki-server -- --host 0.0.0.0 --port 3000 --seed seed.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use sajiki_server::{
    config::RelayConfig,
    infrastructure::{
        dto::{conversion::seed_into_domain, http::RegistrySeed},
        repository::InMemoryRoomRegistry,
    },
    ui::{AppState, Server},
};
use sajiki_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "sajiki-server")]
#[command(about = "Watch party synchronization relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds an empty room stays open before it is closed
    #[arg(long, default_value = "120")]
    grace_period_secs: u64,

    /// Window in milliseconds for coalescing playback checkpoint writes
    #[arg(long, default_value = "200")]
    checkpoint_window_ms: u64,

    /// JSON file with users and rooms to preload into the registry
    #[arg(long)]
    seed: Option<PathBuf>,
}

fn load_registry(
    seed: Option<PathBuf>,
) -> Result<InMemoryRoomRegistry, Box<dyn std::error::Error>> {
    let Some(path) = seed else {
        return Ok(InMemoryRoomRegistry::new());
    };
    let raw = std::fs::read_to_string(&path)?;
    let seed: RegistrySeed = serde_json::from_str(&raw)?;
    let (users, rooms, infos) = seed_into_domain(seed)?;
    tracing::info!(
        "Loaded {} user(s) and {} room(s) from {}",
        users.len(),
        rooms.len(),
        path.display()
    );
    Ok(InMemoryRoomRegistry::with_data(users, rooms, infos))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_BIN_NAME")], "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry
    // 2. AppState (session store, pusher, timers, usecases)
    // 3. Server

    // 1. Create Registry (in-memory, optionally seeded)
    let registry = match load_registry(args.seed) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!("Failed to load seed: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Create AppState
    let config = RelayConfig {
        grace_period: Duration::from_secs(args.grace_period_secs),
        checkpoint_window: Duration::from_millis(args.checkpoint_window_ms),
    };
    let state = Arc::new(AppState::new(registry, config));

    // 3. Create and run Server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
