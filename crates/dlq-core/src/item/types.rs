//! Enumerations stored as lowercase strings in the item database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item identifier, assigned by the store at insert time.
pub type ItemId = i64;

/// Lifecycle state of a download item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Active => "active",
            ItemStatus::Paused => "paused",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }

    /// Completed and failed items never move without a user command.
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ItemStatus::Pending),
            "active" => Ok(ItemStatus::Active),
            "paused" => Ok(ItemStatus::Paused),
            "completed" => Ok(ItemStatus::Completed),
            "failed" => Ok(ItemStatus::Failed),
            other => Err(format!("unknown item status {other:?}")),
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of content an item carries. Drives the fallback file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Audio,
    Thumbnail,
    Document,
    #[default]
    Other,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
            ContentKind::Thumbnail => "thumbnail",
            ContentKind::Document => "document",
            ContentKind::Other => "other",
        }
    }

    /// Extension used when neither a suggested name nor the URL path provides one.
    pub fn default_extension(self) -> &'static str {
        match self {
            ContentKind::Video => "mp4",
            ContentKind::Audio => "mp3",
            ContentKind::Thumbnail => "jpg",
            ContentKind::Document => "pdf",
            ContentKind::Other => "bin",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ContentKind::Video),
            "audio" => Ok(ContentKind::Audio),
            "thumbnail" => Ok(ContentKind::Thumbnail),
            "document" => Ok(ContentKind::Document),
            "other" => Ok(ContentKind::Other),
            other => Err(format!("unknown content kind {other:?}")),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
