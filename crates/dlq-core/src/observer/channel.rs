use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{Alert, Observer};
use crate::item::{DownloadItem, ItemId};

/// Observer callbacks as values.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    ItemChanged(DownloadItem),
    ItemRemoved(ItemId),
    CountsChanged { total: usize, active: usize },
    Alert(Alert),
}

/// Forwards every callback into an unbounded channel. Events are dropped once
/// the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<ObserverEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, UnboundedReceiver<ObserverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: ObserverEvent) {
        let _ = self.tx.send(event);
    }
}

impl Observer for ChannelObserver {
    fn item_changed(&self, item: &DownloadItem) {
        self.emit(ObserverEvent::ItemChanged(item.clone()));
    }

    fn item_removed(&self, id: ItemId) {
        self.emit(ObserverEvent::ItemRemoved(id));
    }

    fn counts_changed(&self, total: usize, active: usize) {
        self.emit(ObserverEvent::CountsChanged { total, active });
    }

    fn alert(&self, alert: &Alert) {
        self.emit(ObserverEvent::Alert(alert.clone()));
    }
}
