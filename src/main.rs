mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use serde_json::{json, Value};

use draft_recovery::{DraftConfig, DraftKeeper, FileStorage, Ttl, WizardStep};

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = DraftConfig::from_env()?;
    if let Some(dir) = args.dir {
        config.storage_dir = dir;
    }
    if let Some(hours) = args.ttl_hours {
        config.ttl = Ttl::from_hours(hours)?;
    }

    let storage = FileStorage::open(&config.storage_dir)
        .await
        .with_context(|| format!("Failed to open {}", config.storage_dir.display()))?;
    info!("Using draft directory {}", storage.root().display());
    let keeper = DraftKeeper::new(Arc::new(storage), &config);

    match args.command {
        Commands::Status => {
            let summary = keeper.recovery().reconcile().await;
            print_json(&serde_json::to_value(summary)?)?;
        }
        Commands::SaveDraft { form_id, json } => {
            let data = parse_json(&json)?;
            if !keeper.drafts().save_draft(&form_id, data).await {
                anyhow::bail!("Draft {form_id} was not saved");
            }
            info!("Saved draft {form_id}");
        }
        Commands::ShowDraft { form_id } => match keeper.drafts().get_draft_entry(&form_id).await {
            Some(entry) => print_json(&serde_json::to_value(entry)?)?,
            None => info!("No draft for {form_id}"),
        },
        Commands::RemoveDraft { form_id } => {
            keeper.drafts().remove_draft(&form_id).await;
        }
        Commands::Progress {
            current_step,
            total_steps,
            json,
        } => {
            let step = WizardStep::new(current_step, total_steps)?;
            let data = parse_json(&json)?;
            if !keeper.progress().save_progress(data, step).await {
                anyhow::bail!("Progress was not saved");
            }
            info!("Saved progress at step {current_step}/{total_steps}");
        }
        Commands::Recover => match keeper.recovery().recover().await {
            Some(recovered) => print_json(&json!({
                "formData": recovered.form_data,
                "currentStep": recovered.step.current(),
                "totalSteps": recovered.step.total(),
                "lastUpdated": recovered.last_updated,
            }))?,
            None => info!("Nothing to recover"),
        },
        Commands::Discard => keeper.recovery().discard().await,
    }

    Ok(())
}

fn parse_json(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON: {raw}"))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
