mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kunai_core::config::load_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kunai")]
#[command(about = "Expand recurring events, diff versions and compose iTip messages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the occurrences of one series
    Expand {
        /// iCalendar file holding the series
        file: PathBuf,

        /// UID of the series
        #[arg(short, long)]
        uid: String,

        /// First occurrence to print (RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// Stop before this instant (RFC 3339)
        #[arg(long)]
        until: Option<String>,

        /// Maximum number of occurrences to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Present occurrences in this zone instead of the event's own
        #[arg(short, long)]
        zone: Option<String>,
    },
    /// Report instances that differ between two versions of a calendar object
    Diff {
        /// Current version
        new: PathBuf,

        /// Previous version
        #[arg(long)]
        old: Option<PathBuf>,
    },
    /// Compose the iTip messages an organizer change requires
    Notify {
        /// Calendar user address of whoever made the change
        #[arg(long)]
        user: String,

        /// Current version, omitted when the object was deleted
        #[arg(long)]
        new: Option<PathBuf>,

        /// Previous version, omitted when the object was created
        #[arg(long)]
        old: Option<PathBuf>,

        /// Print each message payload after its summary
        #[arg(long)]
        payload: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping warn");
    }

    match cli.command {
        Commands::Expand {
            file,
            uid,
            from,
            until,
            limit,
            zone,
        } => commands::expand(
            &config.expansion,
            &commands::ExpandArgs {
                file,
                uid,
                from,
                until,
                limit,
                zone,
            },
        ),
        Commands::Diff { new, old } => commands::diff(&new, old.as_deref()),
        Commands::Notify {
            user,
            new,
            old,
            payload,
        } => commands::notify(
            &config.scheduling,
            &user,
            new.as_deref(),
            old.as_deref(),
            payload,
        ),
    }
}
