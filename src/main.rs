//! Jarvis Relay server.
//!
//! Entry point for the voice-assistant completion relay.

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;

use jarvis_relay::{config::AppConfig, logging, server};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading configuration
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(2);
        }
    };

    logging::init(&config.log);

    server::start_server(Arc::new(config)).await
}
