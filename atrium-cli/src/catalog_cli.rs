//! Catalog CLI commands
//!
//! Browse the shared catalog, inspect records, clone apps into the
//! workspace, and manage installed instances.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use atrium_core::api::console::ConsoleApi;
use atrium_core::app::AppMode;
use atrium_core::catalog::{
    AppIcon, CatalogEntry, CatalogPager, Category, ExploreFilter, LoadOutcome, PagerConfig,
    RefreshSignal,
};
use atrium_core::cloning::{ClonePipeline, CloneRequest, DependencyResolver};

use crate::config::CliConfig;
use crate::PrintNavigator;

/// Catalog subcommand for browsing and cloning apps
#[derive(Parser, Debug)]
pub struct CatalogCommand {
    #[clap(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// Browse the catalog
    Browse {
        /// Category: favorite, recommended, or an app mode
        #[clap(long, default_value = "recommended")]
        category: String,

        /// Search keywords
        #[clap(long, default_value = "")]
        search: String,

        /// Number of pages to fetch
        #[clap(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one catalog record
    Show {
        /// App id
        app_id: String,
    },

    /// Show the unpaged catalog overview
    Overview,

    /// Clone a catalog app into the workspace
    Clone {
        /// Source app id
        app_id: String,

        /// Name for the new app
        #[clap(long)]
        name: String,

        #[clap(long, default_value = "🤖")]
        icon: String,

        #[clap(long)]
        icon_background: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },

    /// Manage installed instances
    Installed {
        #[clap(subcommand)]
        command: InstalledCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstalledCommand {
    /// List installed apps
    List {
        /// Narrow to one source app
        #[clap(long)]
        app_id: Option<String>,
    },

    /// Remove an installed app
    Uninstall {
        installed_app_id: String,
    },

    /// Pin or unpin an installed app
    Pin {
        installed_app_id: String,

        /// Unpin instead of pinning
        #[clap(long)]
        off: bool,
    },
}

/// The plugin resolver runs inside the console; from the CLI it is a no-op
struct DetachedResolver;

#[async_trait::async_trait]
impl DependencyResolver for DetachedResolver {
    async fn resolve(&self, _app_id: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Position")]
    position: i64,
}

impl From<&CatalogEntry> for EntryRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            mode: entry.mode.to_string(),
            author: entry.author_name.clone().unwrap_or_default(),
            position: entry.position,
        }
    }
}

fn parse_category(raw: &str) -> Result<Category> {
    match raw {
        "favorite" | "favourite" => Ok(Category::Favorite),
        "recommended" => Ok(Category::Explore(ExploreFilter::Recommended)),
        other => {
            let mode: AppMode =
                serde_json::from_value(serde_json::Value::String(other.to_string()))
                    .map_err(|_| anyhow::anyhow!("Unknown category: {other}"))?;
            Ok(Category::Explore(ExploreFilter::Mode(mode)))
        }
    }
}

pub async fn run(command: CatalogCommand, config: &CliConfig) -> Result<()> {
    let api: Arc<dyn ConsoleApi> = Arc::new(config.console_api()?);

    match command.command {
        CatalogSubcommand::Browse {
            category,
            search,
            pages,
        } => browse(api, config, &category, &search, pages).await,
        CatalogSubcommand::Show { app_id } => show(api, &app_id).await,
        CatalogSubcommand::Overview => overview(api).await,
        CatalogSubcommand::Clone {
            app_id,
            name,
            icon,
            icon_background,
            description,
        } => {
            clone_app(api, app_id, name, icon, icon_background, description).await
        }
        CatalogSubcommand::Installed { command } => installed(api, command).await,
    }
}

async fn browse(
    api: Arc<dyn ConsoleApi>,
    config: &CliConfig,
    category: &str,
    search: &str,
    pages: u32,
) -> Result<()> {
    let pager = CatalogPager::new(api, PagerConfig::new(config.favorite_tag_id.clone()));
    pager.set_category(parse_category(category)?);
    if !search.is_empty() {
        pager.set_keywords(search);
    }

    for _ in 0..pages {
        if pager.load_more().await? == LoadOutcome::Exhausted {
            break;
        }
    }

    let entries = pager.entries();
    if entries.is_empty() {
        println!("No apps found.");
        return Ok(());
    }

    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");

    if pager.is_exhausted() {
        println!("({} apps, end of listing)", entries.len());
    } else {
        println!("({} apps, more available)", entries.len());
    }
    Ok(())
}

async fn show(api: Arc<dyn ConsoleApi>, app_id: &str) -> Result<()> {
    let record = api
        .catalog_record(app_id)
        .await?
        .with_context(|| format!("App '{app_id}' is not in the catalog"))?;

    println!("{} ({})", record.name, record.mode);
    if let Some(description) = &record.description {
        println!("{description}");
    }
    println!("definition: {} bytes", record.export_data.len());
    Ok(())
}

async fn overview(api: Arc<dyn ConsoleApi>) -> Result<()> {
    let overview = api.catalog_overview().await?;

    if !overview.categories.is_empty() {
        println!("categories: {}", overview.categories.join(", "));
    }

    let merged = overview.merged();
    if merged.is_empty() {
        println!("No published apps.");
        return Ok(());
    }

    let rows: Vec<EntryRow> = merged.iter().map(EntryRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
    Ok(())
}

async fn clone_app(
    api: Arc<dyn ConsoleApi>,
    app_id: String,
    name: String,
    icon: String,
    icon_background: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let workspace = api
        .current_workspace()
        .await
        .context("Failed to read the current workspace")?;

    let pipeline = ClonePipeline::new(
        api,
        Arc::new(DetachedResolver),
        Arc::new(PrintNavigator),
        RefreshSignal::new(),
    );

    let cloned = pipeline
        .clone_app(
            CloneRequest {
                source_app_id: app_id,
                name,
                icon: AppIcon {
                    icon_type: "emoji".to_string(),
                    icon,
                    icon_background,
                    icon_url: None,
                },
                description,
            },
            workspace.role.can_edit(),
        )
        .await?;

    println!("Created app {} ({})", cloned.app_id, cloned.mode);
    Ok(())
}

async fn installed(api: Arc<dyn ConsoleApi>, command: InstalledCommand) -> Result<()> {
    match command {
        InstalledCommand::List { app_id } => {
            let installed = api.installed_apps(app_id.as_deref()).await?;
            if installed.is_empty() {
                println!("No installed apps.");
                return Ok(());
            }
            for app in installed {
                let pin = if app.is_pinned { " (pinned)" } else { "" };
                println!("{}  app={}{}", app.id, app.app_id, pin);
            }
        }
        InstalledCommand::Uninstall { installed_app_id } => {
            api.uninstall_app(&installed_app_id).await?;
            println!("Uninstalled {installed_app_id}");
        }
        InstalledCommand::Pin {
            installed_app_id,
            off,
        } => {
            api.set_pin_status(&installed_app_id, !off).await?;
            println!(
                "{} {}",
                if off { "Unpinned" } else { "Pinned" },
                installed_app_id
            );
        }
    }
    Ok(())
}
