//! Cough Recorder CLI
//!
//! Drives the recording store from a shell.
//!
//! ```bash
//! cough-recorder save /tmp/capture.m4a --duration 3.2 --size 48213
//! cough-recorder list
//! cough-recorder update <id> '{"analysisResult": {"cough": true}}'
//! cough-recorder delete <id>
//! cough-recorder storage
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use cough_recorder_lib::commands::{self, RecorderState};
use cough_recorder_lib::recordings::MetadataFields;
use cough_recorder_lib::StorageConfig;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cough-recorder")]
#[command(about = "Local storage for recorded audio clips")]
struct Args {
    /// Data directory (ledger and default recordings location)
    #[arg(long, env = "COUGH_RECORDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Recordings directory, overrides `<data-dir>/recordings`
    #[arg(long, env = "COUGH_RECORDER_RECORDINGS_DIR")]
    recordings_dir: Option<PathBuf>,

    /// Delete unreferenced audio files on startup
    #[arg(long)]
    sweep_orphans: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a captured clip into the store
    Save {
        /// Path or file:// URI of the clip
        source: String,
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        size: Option<u64>,
        /// Extra metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },
    /// List recordings, newest first
    List,
    /// Show one recording
    Show { id: String },
    /// Merge a JSON object into a recording's metadata
    Update { id: String, fields: String },
    /// Delete a recording and its audio file
    Delete { id: String },
    /// Show device storage capacity
    Storage,
    /// Delete audio files with no metadata entry
    Sweep,
}

fn parse_fields(raw: &str) -> Result<MetadataFields> {
    match serde_json::from_str::<serde_json::Value>(raw).context("metadata must be valid JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow!("metadata must be a JSON object")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    cough_recorder_lib::init_tracing();
    // Loads .env before clap reads its env fallbacks
    let mut config = StorageConfig::from_env()?;
    let args = Args::parse();

    if let Some(dir) = args.data_dir {
        if config.recordings_dir == config.data_dir.join("recordings") {
            config.recordings_dir = dir.join("recordings");
        }
        config.data_dir = dir;
    }
    if let Some(dir) = args.recordings_dir {
        config.recordings_dir = dir;
    }
    config.sweep_orphans_on_start |= args.sweep_orphans;

    let state = RecorderState::open(&config)
        .await
        .with_context(|| format!("failed to open storage at {:?}", config.data_dir))?;

    match args.command {
        Command::Save {
            source,
            duration,
            size,
            meta,
        } => {
            let mut fields = match meta {
                Some(raw) => parse_fields(&raw)?,
                None => MetadataFields::new(),
            };
            if let Some(duration) = duration {
                fields.insert("duration".to_string(), duration.into());
            }
            if let Some(size) = size {
                fields.insert("size".to_string(), size.into());
            }
            let saved = commands::recording::save_recording(&state, source, Some(fields))
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&saved)?;
        }
        Command::List => {
            let recordings = commands::recording::get_recordings(&state)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&recordings)?;
        }
        Command::Show { id } => {
            match commands::recording::get_recording(&state, id.clone())
                .await
                .map_err(|e| anyhow!(e))?
            {
                Some(recording) => print_json(&recording)?,
                None => return Err(anyhow!("no recording with id {id}")),
            }
        }
        Command::Update { id, fields } => {
            let fields = parse_fields(&fields)?;
            match commands::recording::update_recording(&state, id.clone(), fields)
                .await
                .map_err(|e| anyhow!(e))?
            {
                Some(recording) => print_json(&recording)?,
                None => tracing::warn!("No recording with id {}, nothing updated", id),
            }
        }
        Command::Delete { id } => {
            commands::recording::delete_recording(&state, id.clone())
                .await
                .map_err(|e| anyhow!(e))?;
            tracing::info!("Deleted {}", id);
        }
        Command::Storage => {
            match commands::recording::get_available_storage(&state)
                .await
                .map_err(|e| anyhow!(e))?
            {
                Some(capacity) => print_json(&capacity)?,
                None => return Err(anyhow!("storage capacity is unavailable on this device")),
            }
        }
        Command::Sweep => {
            let removed = commands::recording::sweep_orphaned_recordings(&state)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&removed)?;
        }
    }

    Ok(())
}
