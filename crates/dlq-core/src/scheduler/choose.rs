//! Pick the next pending item to admit.

use crate::item::{DownloadItem, ItemId, ItemStatus};
use crate::store::admission_order;

/// Highest-priority pending item; ties go to the earliest `created_at`, then the lowest id.
pub(super) fn next_pending<'a>(items: impl IntoIterator<Item = &'a DownloadItem>) -> Option<ItemId> {
    items
        .into_iter()
        .filter(|item| item.status == ItemStatus::Pending)
        .min_by(|a, b| admission_order(a, b))
        .map(|item| item.id)
}

pub(super) fn in_admission_order<'a>(
    items: impl IntoIterator<Item = &'a DownloadItem>,
) -> Vec<&'a DownloadItem> {
    let mut sorted: Vec<&DownloadItem> = items.into_iter().collect();
    sorted.sort_by(|a, b| admission_order(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ContentKind, ItemDraft};

    fn item(id: ItemId, priority: i32, created_at: i64, status: ItemStatus) -> DownloadItem {
        let draft = ItemDraft {
            source_ref: format!("r{id}"),
            url: format!("https://x.com/{id}"),
            title: String::new(),
            kind: ContentKind::Other,
            file_name: format!("{id}.bin"),
            priority,
            created_at,
        };
        let mut item = DownloadItem::from_draft(id, &draft);
        item.status = status;
        item
    }

    #[test]
    fn empty_or_nothing_pending() {
        assert_eq!(next_pending(&[]), None);
        let items = [item(1, 0, 1, ItemStatus::Active), item(2, 0, 2, ItemStatus::Paused)];
        assert_eq!(next_pending(&items), None);
    }

    #[test]
    fn priority_then_fifo() {
        // A(p0,t1) B(p0,t2) C(p5,t3) run as C, A, B.
        let mut items = vec![
            item(1, 0, 1, ItemStatus::Pending),
            item(2, 0, 2, ItemStatus::Pending),
            item(3, 5, 3, ItemStatus::Pending),
        ];
        let mut order = Vec::new();
        while let Some(id) = next_pending(&items) {
            order.push(id);
            items.iter_mut().find(|i| i.id == id).unwrap().status = ItemStatus::Active;
        }
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn same_timestamp_breaks_on_id() {
        let items = [item(9, 0, 5, ItemStatus::Pending), item(4, 0, 5, ItemStatus::Pending)];
        assert_eq!(next_pending(&items), Some(4));
    }

    #[test]
    fn sorted_listing() {
        let items = [
            item(1, 0, 10, ItemStatus::Completed),
            item(2, 1, 20, ItemStatus::Pending),
            item(3, 0, 5, ItemStatus::Failed),
        ];
        let ids: Vec<_> = in_admission_order(&items).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
