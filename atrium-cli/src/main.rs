//! Atrium - operator CLI for the app workspace
//!
//! Thin front end over atrium-core: browse and clone catalog apps, drive
//! the publish control, and talk to the billing ledger.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use atrium_core::app::AppRoute;
use atrium_core::cloning::Navigator;
use atrium_core::notify::Notifier;

mod catalog_cli;
mod config;
mod publish_cli;
mod usage_cli;

#[derive(Parser, Debug)]
#[clap(
    name = "atrium",
    about = "Client for the Atrium app workspace - publish, browse, clone, and billing",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Log filter, e.g. "info" or "atrium_core=debug"
    #[clap(long, global = true)]
    log: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse and manage the shared catalog
    Catalog(catalog_cli::CatalogCommand),

    /// Publish an app, committing any staged visibility change
    Publish(publish_cli::PublishCommand),

    /// Billing ledger operations
    Credits(usage_cli::CreditsCommand),
}

/// Prints navigation targets; the CLI has no browser to drive
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn open(&self, route: &AppRoute) {
        println!("open: {}", route.path());
    }
}

/// Notifications go to stderr so they never mix with table output
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn success(&self, message: &str) {
        eprintln!("ok: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli.log.as_deref().unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = config::CliConfig::load()?;
    tracing::debug!(
        console_url = %config.console_url,
        billing_url = %config.billing_url,
        "configuration resolved"
    );

    match cli.command {
        Command::Catalog(command) => catalog_cli::run(command, &config).await,
        Command::Publish(command) => publish_cli::run(command, &config).await,
        Command::Credits(command) => usage_cli::run(command, &config).await,
    }
}
