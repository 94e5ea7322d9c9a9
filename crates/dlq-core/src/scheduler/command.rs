use tokio::sync::oneshot;

use super::{EnqueueRequest, ItemFilter, QueueCounts, SchedulerError, StorageInfo};
use crate::executor::TransferEvent;
use crate::item::{DownloadItem, ItemId};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, SchedulerError>>;

pub(crate) enum Command {
    Enqueue(EnqueueRequest, Reply<ItemId>),
    Pause(ItemId, Reply<bool>),
    Resume(ItemId, Reply<bool>),
    Cancel(ItemId, Reply<bool>),
    Retry(ItemId, Reply<bool>),
    Remove {
        id: ItemId,
        delete_file: bool,
        reply: Reply<bool>,
    },
    PauseAll(Reply<usize>),
    ResumeAll(Reply<usize>),
    ClearCompleted {
        delete_files: bool,
        reply: Reply<usize>,
    },
    Status(ItemId, oneshot::Sender<Option<DownloadItem>>),
    List(ItemFilter, oneshot::Sender<Vec<DownloadItem>>),
    Counts(oneshot::Sender<QueueCounts>),
    StorageInfo(oneshot::Sender<StorageInfo>),
    SetMaxConcurrency(usize, oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// A report from one activation of an item.
pub(crate) struct TransferUpdate {
    pub item_id: ItemId,
    pub activation: u64,
    pub event: TransferEvent,
}

/// Everything the scheduler task consumes, in one FIFO.
pub(crate) enum Inbox {
    Command(Command),
    Transfer(TransferUpdate),
}
