// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stagecraft player - headless host for the demo choreography
//!
//! Loads an optional RON config from the first argument, plays the
//! choreography at a fixed frame rate and logs every sound cue.

use stagecraft_player::{LogSink, PlayerApp, PlayerConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "stagecraft_player=debug".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stagecraft player v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match PlayerConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let mut app = PlayerApp::new(config, LogSink::default());
    match app.run() {
        Ok(summary) => tracing::info!(
            played = app.sink().played,
            reloads = summary.reloads,
            "Player exited"
        ),
        Err(e) => {
            tracing::error!("Player crashed: {e}");
            std::process::exit(1);
        }
    }
}
