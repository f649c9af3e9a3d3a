//! Publish CLI command
//!
//! Opens the publish control for an app, reconciles visibility against the
//! catalog, stages the requested toggle, and publishes.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;

use atrium_core::api::console::{ConsoleApi, ModelVariant};
use atrium_core::app::AppMode;
use atrium_core::publish::{AppDraft, EditorHooks, PublishOutcome, Publisher};

use crate::config::CliConfig;
use crate::StderrNotifier;

#[derive(Parser, Debug)]
pub struct PublishCommand {
    /// App to publish
    pub app_id: String,

    /// App mode; decides the catalog category on registration
    #[clap(long, default_value = "chat")]
    pub mode: String,

    /// Make the app visible in the shared catalog
    #[clap(long, conflicts_with = "hidden")]
    pub visible: bool,

    /// Remove the app from the shared catalog
    #[clap(long)]
    pub hidden: bool,

    /// Description used when registering the catalog record
    #[clap(long)]
    pub description: Option<String>,

    /// Model variant to publish with, as provider/model
    #[clap(long)]
    pub variant: Option<String>,
}

/// The CLI drives no editor, so a restore has nothing to roll back
struct DetachedEditor;

#[async_trait::async_trait]
impl EditorHooks for DetachedEditor {
    async fn restore_draft(&self) -> Result<()> {
        Ok(())
    }
}

fn parse_variant(raw: &str) -> Result<ModelVariant> {
    let (provider, model) = raw
        .split_once('/')
        .context("--variant must be provider/model")?;
    Ok(ModelVariant {
        provider: provider.to_string(),
        model: model.to_string(),
        parameters: serde_json::Value::Null,
    })
}

pub async fn run(command: PublishCommand, config: &CliConfig) -> Result<()> {
    let api: Arc<dyn ConsoleApi> = Arc::new(config.console_api()?);

    let mode: AppMode =
        serde_json::from_value(serde_json::Value::String(command.mode.clone()))
            .map_err(|_| anyhow::anyhow!("Unknown app mode: {}", command.mode))?;

    let draft = AppDraft {
        id: command.app_id.clone(),
        mode,
        description: command.description.clone(),
        published_at: None,
        draft_updated_at: Utc::now(),
    };

    let publisher = Publisher::new(api, draft, Arc::new(DetachedEditor), Arc::new(StderrNotifier));

    publisher.open().await;
    println!("currently visible: {}", publisher.posted());

    if command.visible {
        publisher.set_posted(true);
    }
    if command.hidden {
        publisher.set_posted(false);
    }

    let variant = command.variant.as_deref().map(parse_variant).transpose()?;

    match publisher.publish(variant).await? {
        PublishOutcome::Published => {
            println!(
                "published {} (visible: {})",
                command.app_id,
                publisher.posted()
            );
        }
        PublishOutcome::AlreadyInFlight => {
            println!("a publish is already in flight; nothing done");
        }
    }
    Ok(())
}
