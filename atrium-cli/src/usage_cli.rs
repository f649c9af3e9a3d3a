//! Billing ledger CLI commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use atrium_core::ledger::{CreditLedger, UsageEvent};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
pub struct CreditsCommand {
    #[clap(subcommand)]
    pub command: CreditsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CreditsSubcommand {
    /// Show the authoritative balance
    Balance,

    /// Price a completed usage event from a JSON file and deduct its cost
    Report {
        /// Path to a tagged usage-event JSON file (kind: agent_tool,
        /// workflow_run, or knowledge)
        event_file: PathBuf,
    },
}

pub async fn run(command: CreditsCommand, config: &CliConfig) -> Result<()> {
    let billing = Arc::new(config.billing_api()?);
    let ledger = CreditLedger::new(billing);

    match command.command {
        CreditsSubcommand::Balance => {
            let profile = ledger
                .refresh()
                .await
                .context("Failed to fetch the billing profile")?;

            println!("{} <{}>", profile.name, profile.email);
            println!("subscription: {:>10.2}", profile.subscription_credits);
            println!("extra:        {:>10.2}", profile.extra_credits);
            println!("purchased:    {:>10.2}", profile.subscription_purchased_credits);
            println!("balance:      {:>10.2}", profile.balance());
        }
        CreditsSubcommand::Report { event_file } => {
            let content = std::fs::read_to_string(&event_file)
                .with_context(|| format!("Failed to read event file: {}", event_file.display()))?;
            let event: UsageEvent = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse event file: {}", event_file.display()))?;

            ledger
                .refresh()
                .await
                .context("Failed to fetch the billing profile")?;
            let before = ledger.displayed_balance();

            match ledger.record_usage(event).await {
                Some(cost) => println!(
                    "billed {:.2} credits ({:.2} -> {:.2})",
                    cost,
                    before,
                    ledger.displayed_balance()
                ),
                None => println!("billing unavailable; balance left at {before:.2}"),
            }
        }
    }
    Ok(())
}
