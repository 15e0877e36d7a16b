//! Quizduel - timed multiple-choice quiz, solo or head-to-head over TCP
//!
//! Terminal front end. Logs go to stderr so they never interleave with the
//! game screen; set `RUST_LOG` to see them.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod menu;
mod screen;
mod session;
mod terminal;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Quizduel");

    let config = config::AppConfig::load();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    runtime.block_on(menu::run(config));

    tracing::info!("Goodbye");
}
