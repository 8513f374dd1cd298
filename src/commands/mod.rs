//! Command handlers
//!
//! This module contains the entry points the mobile frontend (or the CLI)
//! calls into. Each returns `Result<T, String>` so it can cross an IPC
//! boundary unchanged.

pub mod recording;

pub use recording::RecorderState;
