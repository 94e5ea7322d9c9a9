//! CLI for the dlq download queue.

mod commands;
mod console;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dlq_core::config;
use dlq_core::item::{ContentKind, ItemId, ItemStatus};
use dlq_core::store::SqliteItemStore;

use commands::{
    run_add, run_bulk, run_completions, run_info, run_item_control, run_scheduler,
    run_set_concurrency, run_status, AddArgs, BulkOp, ItemOp,
};

/// Top-level CLI for the dlq download queue.
#[derive(Debug, Parser)]
#[command(name = "dlq")]
#[command(about = "dlq: durable download queue with bounded concurrency", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Queue a URL for download.
    Add {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
        /// Logical resource id used for duplicate detection (defaults to the URL).
        #[arg(long)]
        source_ref: Option<String>,
        /// Higher runs first.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
        #[arg(long)]
        title: Option<String>,
        /// video, audio, thumbnail, document or other.
        #[arg(long, default_value = "other")]
        kind: ContentKind,
        /// File name inside the download directory (derived from the URL if omitted).
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Run the scheduler until the queue is idle (or Ctrl-C).
    Run {
        /// Run up to N transfers concurrently (defaults to `max_concurrency` from the config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Keep serving the control socket after the queue drains.
        #[arg(long)]
        keep_alive: bool,
    },

    /// Show all items.
    Status {
        /// Only show items with this status.
        #[arg(long)]
        status: Option<ItemStatus>,
        /// Print items as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Pause an active or pending item by its ID.
    Pause {
        /// Item identifier.
        id: ItemId,
    },

    /// Resume a paused item by its ID.
    Resume {
        /// Item identifier.
        id: ItemId,
    },

    /// Cancel an unfinished item and delete its partial data.
    Cancel {
        /// Item identifier.
        id: ItemId,
    },

    /// Queue a failed item again.
    Retry {
        /// Item identifier.
        id: ItemId,
    },

    /// Remove an item in any state.
    Remove {
        /// Item identifier.
        id: ItemId,
        /// Also delete the downloaded file of a completed item.
        #[arg(long)]
        delete_file: bool,
    },

    /// Remove all completed items.
    ClearCompleted {
        /// Also delete their downloaded files.
        #[arg(long)]
        delete_files: bool,
    },

    /// Pause every active and pending item.
    PauseAll,

    /// Resume every paused item.
    ResumeAll,

    /// Change the concurrency bound of a running `dlq run`.
    SetConcurrency {
        /// New bound; 0 holds admission.
        max_concurrency: usize,
    },

    /// Show queue counts, disk usage and file locations.
    Info,

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = SqliteItemStore::open_default().await?;

        match cli.command {
            CliCommand::Add {
                url,
                source_ref,
                priority,
                title,
                kind,
                file_name,
            } => {
                let args = AddArgs {
                    url,
                    source_ref,
                    priority,
                    title,
                    kind,
                    file_name,
                };
                run_add(&cfg, &store, args).await?
            }
            CliCommand::Run { jobs, keep_alive } => {
                run_scheduler(store, &cfg, jobs, keep_alive).await?
            }
            CliCommand::Status { status, json } => run_status(&store, status, json).await?,
            CliCommand::Pause { id } => run_item_control(&cfg, &store, ItemOp::Pause, id).await?,
            CliCommand::Resume { id } => run_item_control(&cfg, &store, ItemOp::Resume, id).await?,
            CliCommand::Cancel { id } => run_item_control(&cfg, &store, ItemOp::Cancel, id).await?,
            CliCommand::Retry { id } => run_item_control(&cfg, &store, ItemOp::Retry, id).await?,
            CliCommand::Remove { id, delete_file } => {
                run_item_control(&cfg, &store, ItemOp::Remove { delete_file }, id).await?
            }
            CliCommand::ClearCompleted { delete_files } => {
                run_bulk(&cfg, &store, BulkOp::ClearCompleted { delete_files }).await?
            }
            CliCommand::PauseAll => run_bulk(&cfg, &store, BulkOp::PauseAll).await?,
            CliCommand::ResumeAll => run_bulk(&cfg, &store, BulkOp::ResumeAll).await?,
            CliCommand::SetConcurrency { max_concurrency } => {
                run_set_concurrency(max_concurrency).await?
            }
            CliCommand::Info => run_info(&cfg, &store).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
