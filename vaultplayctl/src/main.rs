use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaultplay_config::{ConfigLoader, StorageBackend};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "vaultplayctl",
    version,
    about = "Inspect Vaultplay entitlements and progress, simulate gated playback"
)]
struct Cli {
    /// Config file (TOML or JSON); overrides $VAULTPLAY_CONFIG_PATH
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of the configured one
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or change the local entitlement record
    Entitlement {
        #[command(subcommand)]
        action: EntitlementAction,
    },
    /// Print the gate decision for a title
    Access {
        series: String,
        episode: String,
        /// Treat the title as premium
        #[arg(long)]
        premium: bool,
        /// Preview time already consumed (e.g. 20s)
        #[arg(long, value_parser = humantime::parse_duration, default_value = "0s")]
        elapsed: Duration,
    },
    /// Show saved resume positions
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
    /// Run headless playback on a virtual clock and print each transition
    Simulate {
        series: String,
        episode: String,
        /// Treat the title as premium
        #[arg(long)]
        premium: bool,
        /// Content duration in seconds
        #[arg(long, default_value_t = 600.0)]
        duration: f64,
        /// How long the viewer keeps pressing play (e.g. 45s, 2m)
        #[arg(long, value_parser = humantime::parse_duration, default_value = "45s")]
        watch: Duration,
        /// Purchase this plan as soon as the gate appears
        #[arg(long)]
        buy: Option<String>,
        /// Write entitlement and progress to the configured store
        #[arg(long)]
        persist: bool,
    },
}

#[derive(Subcommand)]
enum EntitlementAction {
    /// Print the entitlement record as JSON
    Show,
    /// Activate the subscription from a plan in the catalog
    Grant {
        #[arg(long)]
        plan: String,
        /// Billing proof recorded with the subscription
        #[arg(long, default_value = "vaultplayctl")]
        proof: String,
    },
    /// Unlock a single title
    Unlock { series: String, episode: String },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Saved offset for one title
    Show { series: String, episode: String },
    /// Every saved offset
    List,
    /// Forget the saved offset so the title starts from the beginning
    Clear { series: String, episode: String },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,vaultplay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("failed to load configuration")?.config;
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    let ctx = Context::new(config)?;

    match cli.command {
        Command::Entitlement { action } => match action {
            EntitlementAction::Show => commands::entitlement::show(&ctx),
            EntitlementAction::Grant { plan, proof } => {
                commands::entitlement::grant(&ctx, &plan, &proof)
            }
            EntitlementAction::Unlock { series, episode } => {
                commands::entitlement::unlock(&ctx, &series, &episode)
            }
        },
        Command::Access {
            series,
            episode,
            premium,
            elapsed,
        } => commands::access::run(&ctx, &series, &episode, premium, elapsed),
        Command::Progress { action } => match action {
            ProgressAction::Show { series, episode } => {
                commands::progress::show(&ctx, &series, &episode)
            }
            ProgressAction::List => commands::progress::list(&ctx),
            ProgressAction::Clear { series, episode } => {
                commands::progress::clear(&ctx, &series, &episode)
            }
        },
        Command::Simulate {
            series,
            episode,
            premium,
            duration,
            watch,
            buy,
            persist,
        } => commands::simulate::run(
            &ctx,
            commands::simulate::SimulateOptions {
                series,
                episode,
                premium,
                duration,
                watch,
                buy,
                persist,
            },
        ),
    }
}
