use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and edit the local draft store.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Draft directory (overrides DRAFTS_DIR)
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Record lifetime in hours for writes (overrides DRAFTS_TTL_HOURS)
    #[arg(long)]
    pub ttl_hours: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Commands {
    /// Show what could be recovered
    Status,
    /// Save a JSON draft for a form
    SaveDraft { form_id: String, json: String },
    /// Print the draft saved for a form
    ShowDraft { form_id: String },
    /// Remove the draft saved for a form
    RemoveDraft { form_id: String },
    /// Save registration progress at a step
    Progress {
        current_step: u32,
        total_steps: u32,
        json: String,
    },
    /// Print the registration state a recovery would restore
    Recover,
    /// Remove everything staged for recovery
    Discard,
}
