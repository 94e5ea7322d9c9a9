//! `dlq add <url>` – queue a new item.

use anyhow::Result;
use dlq_core::config::DlqConfig;
use dlq_core::control::ControlRequest;
use dlq_core::item::ContentKind;
use dlq_core::scheduler::EnqueueRequest;
use dlq_core::store::SqliteItemStore;

use super::apply::{expect_enqueued, send_or_apply};

#[derive(Debug, Clone)]
pub struct AddArgs {
    pub url: String,
    pub source_ref: Option<String>,
    pub priority: i32,
    pub title: Option<String>,
    pub kind: ContentKind,
    pub file_name: Option<String>,
}

impl AddArgs {
    fn into_request(self) -> EnqueueRequest {
        let source_ref = self.source_ref.unwrap_or_else(|| self.url.clone());
        let mut request = EnqueueRequest::new(source_ref, self.url)
            .with_priority(self.priority)
            .with_kind(self.kind);
        if let Some(title) = self.title {
            request = request.with_title(title);
        }
        if let Some(file_name) = self.file_name {
            request = request.with_file_name(file_name);
        }
        request
    }
}

pub async fn run_add(cfg: &DlqConfig, store: &SqliteItemStore, args: AddArgs) -> Result<()> {
    let url = args.url.clone();
    let request = args.into_request();
    let id = expect_enqueued(send_or_apply(cfg, store, ControlRequest::Enqueue { request }).await?)?;
    println!("Added item {id} for URL: {url}");
    Ok(())
}
