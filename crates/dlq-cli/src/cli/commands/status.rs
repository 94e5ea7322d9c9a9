//! `dlq status` – show items, read straight from the item store.

use anyhow::Result;
use dlq_core::item::{DownloadItem, ItemStatus};
use dlq_core::store::{ItemStore, SqliteItemStore};

pub async fn run_status(store: &SqliteItemStore, status: Option<ItemStatus>, json: bool) -> Result<()> {
    let items: Vec<DownloadItem> = store
        .list_all()
        .await?
        .into_iter()
        .filter(|item| status.map_or(true, |s| item.status == s))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No items in database.");
        return Ok(());
    }
    println!(
        "{:<6} {:<10} {:>4} {:<18} {:<32} {}",
        "ID", "STATUS", "PRIO", "PROGRESS", "FILE", "URL"
    );
    for item in items {
        println!(
            "{:<6} {:<10} {:>4} {:<18} {:<32} {}",
            item.id,
            status_label(&item),
            item.priority,
            progress_cell(&item),
            item.file_name,
            item.url
        );
    }
    Ok(())
}

fn status_label(item: &DownloadItem) -> String {
    match &item.error {
        Some(err) if item.status == ItemStatus::Failed => format!("failed:{}", err.kind),
        _ => item.status.to_string(),
    }
}

fn progress_cell(item: &DownloadItem) -> String {
    if item.total_bytes == 0 {
        if item.transferred_bytes == 0 {
            return "-".to_string();
        }
        return format!("{}", item.transferred_bytes);
    }
    format!(
        "{}/{} {:.0}%",
        item.transferred_bytes,
        item.total_bytes,
        item.progress() * 100.0
    )
}
