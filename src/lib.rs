//! Cough Recorder - local storage for recorded audio clips.
//!
//! This is the main library crate for the cough recorder app backend.
//! It copies captured clips into a durable recordings directory, keeps a
//! JSON ledger of their metadata in a key-value store, and reports device
//! capacity.

pub mod commands;
pub mod config;
pub mod recordings;
pub mod storage;
pub mod utils;

pub use config::StorageConfig;
pub use recordings::{RecordingManager, RecordingMetadata};
pub use utils::{AppError, AppResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cough_recorder=debug,cough_recorder_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    tracing::info!("Starting Cough Recorder v{}", env!("CARGO_PKG_VERSION"));
}
