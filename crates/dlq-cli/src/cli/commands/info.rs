//! `dlq info` – queue counts, disk usage and file locations.

use anyhow::Result;
use dlq_core::config::{self, DlqConfig};
use dlq_core::scheduler::{QueueCounts, StorageInfo};
use dlq_core::store::{default_db_path, ItemStore, SqliteItemStore};
use dlq_core::{control, logging};

pub async fn run_info(cfg: &DlqConfig, store: &SqliteItemStore) -> Result<()> {
    let items = store.list_all().await?;
    let counts = QueueCounts::tally(&items);
    let storage = StorageInfo::tally(&items);

    println!(
        "Items:      {} ({} pending, {} active, {} paused, {} completed, {} failed)",
        counts.total, counts.pending, counts.active, counts.paused, counts.completed, counts.failed
    );
    println!(
        "Storage:    {:.1} MiB in {} completed file(s), {:.1} MiB queued",
        mib(storage.completed_bytes),
        storage.completed_files,
        mib(storage.queued_bytes)
    );
    println!("Downloads:  {}", cfg.download_dir()?.display());
    println!("Concurrency: {}", cfg.max_concurrency);
    println!("Config:     {}", config::config_path()?.display());
    println!("Database:   {}", default_db_path()?.display());
    println!("Log:        {}", logging::log_file_path()?.display());
    println!("Socket:     {}", control::default_control_socket_path()?.display());
    Ok(())
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}
