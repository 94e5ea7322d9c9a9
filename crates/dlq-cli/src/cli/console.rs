//! Observer that prints item transitions and throttled progress to stdout.

use dlq_core::item::{DownloadItem, ItemId, ItemStatus};
use dlq_core::observer::{Alert, Observer};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Default)]
pub struct ConsoleObserver {
    /// Last progress print per active item.
    last_print: Mutex<HashMap<ItemId, Instant>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a progress line for `id` is due; also records the print time.
    fn progress_due(&self, id: ItemId, now: Instant) -> bool {
        let Ok(mut last_print) = self.last_print.lock() else {
            return false;
        };
        match last_print.get(&id) {
            Some(at) if now.duration_since(*at) < PROGRESS_INTERVAL => false,
            _ => {
                last_print.insert(id, now);
                true
            }
        }
    }

    /// Returns true if `id` was being tracked.
    fn forget(&self, id: ItemId) -> bool {
        self.last_print
            .lock()
            .map(|mut last_print| last_print.remove(&id).is_some())
            .unwrap_or(false)
    }
}

impl Observer for ConsoleObserver {
    fn item_changed(&self, item: &DownloadItem) {
        match item.status {
            ItemStatus::Active => {
                if self.progress_due(item.id, Instant::now()) {
                    println!("  [{}] {}  {}", item.id, item.file_name, progress_line(item));
                }
            }
            ItemStatus::Completed => {
                self.forget(item.id);
                println!(
                    "  [{}] {}  done ({:.1} MiB)",
                    item.id,
                    item.file_name,
                    mib(item.total_bytes)
                );
            }
            ItemStatus::Failed => {
                self.forget(item.id);
                let reason = item
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                println!("  [{}] {}  failed: {}", item.id, item.file_name, reason);
            }
            ItemStatus::Paused => {
                if self.forget(item.id) {
                    println!("  [{}] {}  paused", item.id, item.file_name);
                }
            }
            ItemStatus::Pending => {
                self.forget(item.id);
            }
        }
    }

    fn item_removed(&self, id: ItemId) {
        self.forget(id);
        tracing::debug!("item {} removed", id);
    }

    fn counts_changed(&self, total: usize, active: usize) {
        tracing::debug!("queue: {} item(s), {} active", total, active);
    }

    fn alert(&self, alert: &Alert) {
        eprintln!("dlq warning: {}", alert);
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}

fn progress_line(item: &DownloadItem) -> String {
    if item.total_bytes == 0 {
        return format!("{:.1} MiB", mib(item.transferred_bytes));
    }
    format!(
        "{:.1} / {:.1} MiB ({:.1}%)",
        mib(item.transferred_bytes),
        mib(item.total_bytes),
        item.progress() * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_throttled_per_item() {
        let observer = ConsoleObserver::new();
        let start = Instant::now();
        assert!(observer.progress_due(1, start));
        assert!(!observer.progress_due(1, start + Duration::from_millis(100)));
        assert!(observer.progress_due(2, start + Duration::from_millis(100)));
        assert!(observer.progress_due(1, start + PROGRESS_INTERVAL));
    }

    #[test]
    fn forget_reports_tracked_items() {
        let observer = ConsoleObserver::new();
        assert!(!observer.forget(7));
        observer.progress_due(7, Instant::now());
        assert!(observer.forget(7));
        assert!(!observer.forget(7));
    }
}
