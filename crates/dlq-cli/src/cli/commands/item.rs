//! `dlq pause|resume|cancel|retry|remove <id>` – per-item controls.
//! If `dlq run` is active the request goes through its control socket.

use anyhow::Result;
use dlq_core::config::DlqConfig;
use dlq_core::control::ControlRequest;
use dlq_core::item::ItemId;
use dlq_core::store::SqliteItemStore;

use super::apply::{expect_changed, send_or_apply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOp {
    Pause,
    Resume,
    Cancel,
    Retry,
    Remove { delete_file: bool },
}

impl ItemOp {
    fn request(self, id: ItemId) -> ControlRequest {
        match self {
            ItemOp::Pause => ControlRequest::Pause { id },
            ItemOp::Resume => ControlRequest::Resume { id },
            ItemOp::Cancel => ControlRequest::Cancel { id },
            ItemOp::Retry => ControlRequest::Retry { id },
            ItemOp::Remove { delete_file } => ControlRequest::Remove { id, delete_file },
        }
    }

    fn done(self) -> &'static str {
        match self {
            ItemOp::Pause => "Paused",
            ItemOp::Resume => "Resumed",
            ItemOp::Cancel => "Cancelled",
            ItemOp::Retry => "Requeued",
            ItemOp::Remove { .. } => "Removed",
        }
    }

    fn unchanged(self) -> &'static str {
        match self {
            ItemOp::Pause => "is not active or pending",
            ItemOp::Resume => "is not paused",
            ItemOp::Cancel => "is already finished or gone",
            ItemOp::Retry => "has not failed",
            ItemOp::Remove { .. } => "does not exist",
        }
    }
}

pub async fn run_item_control(
    cfg: &DlqConfig,
    store: &SqliteItemStore,
    op: ItemOp,
    id: ItemId,
) -> Result<()> {
    let changed = expect_changed(send_or_apply(cfg, store, op.request(id)).await?)?;
    if changed {
        println!("{} item {id}", op.done());
    } else {
        println!("Item {id} {}; nothing to do", op.unchanged());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_map_to_requests() {
        assert_eq!(ItemOp::Pause.request(3), ControlRequest::Pause { id: 3 });
        assert_eq!(ItemOp::Retry.request(3), ControlRequest::Retry { id: 3 });
        assert_eq!(
            ItemOp::Remove { delete_file: true }.request(3),
            ControlRequest::Remove {
                id: 3,
                delete_file: true
            }
        );
    }
}
