//! `dlq pause-all|resume-all|clear-completed|set-concurrency` – queue-wide controls.

use anyhow::{bail, Result};
use dlq_core::config::{self, DlqConfig};
use dlq_core::control::ControlRequest;
use dlq_core::store::SqliteItemStore;

use super::apply::{expect_count, expect_done, send_or_apply, send_to_runner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    PauseAll,
    ResumeAll,
    ClearCompleted { delete_files: bool },
}

impl BulkOp {
    fn request(self) -> ControlRequest {
        match self {
            BulkOp::PauseAll => ControlRequest::PauseAll,
            BulkOp::ResumeAll => ControlRequest::ResumeAll,
            BulkOp::ClearCompleted { delete_files } => ControlRequest::ClearCompleted { delete_files },
        }
    }
}

pub async fn run_bulk(cfg: &DlqConfig, store: &SqliteItemStore, op: BulkOp) -> Result<()> {
    let count = expect_count(send_or_apply(cfg, store, op.request()).await?)?;
    match op {
        BulkOp::PauseAll => println!("Paused {count} item(s)"),
        BulkOp::ResumeAll => println!("Resumed {count} item(s)"),
        BulkOp::ClearCompleted { .. } => println!("Cleared {count} completed item(s)"),
    }
    Ok(())
}

/// Only meaningful for a live runner; the next `dlq run` reads the config file again.
pub async fn run_set_concurrency(max_concurrency: usize) -> Result<()> {
    let request = ControlRequest::SetMaxConcurrency { max_concurrency };
    match send_to_runner(&request).await? {
        Some(reply) => {
            expect_done(reply)?;
            println!("Concurrency set to {max_concurrency}");
            Ok(())
        }
        None => {
            let path = config::config_path()?;
            bail!(
                "no `dlq run` is active; set max_concurrency in {} or pass --jobs",
                path.display()
            )
        }
    }
}
