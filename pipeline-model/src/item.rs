use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MediaItemId;
use crate::safe_name::safe_name;
use crate::stage::Stage;
use crate::status::{ItemStatus, StageStatus};

/// A movie or a TV show. One row per title, never per season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaItemId,
    pub kind: MediaKind,
    pub name: String,
    pub safe_name: String,
    pub tmdb_id: Option<i64>,
    pub tvdb_id: Option<i64>,
    pub item_status: ItemStatus,
    pub current_stage: Stage,
    pub stage_status: StageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl MediaItem {
    /// Build a fresh item for first-time dispatch. `id` is assigned by the store.
    pub fn new_draft(kind: MediaKind, name: impl Into<String>) -> NewMediaItem {
        let name = name.into();
        let safe = safe_name(&name);
        NewMediaItem {
            kind,
            name,
            safe_name: safe,
            tmdb_id: None,
            tvdb_id: None,
        }
    }

    /// The external catalog id relevant to this item's kind, if any.
    pub fn catalog_id(&self) -> Option<i64> {
        match self.kind {
            MediaKind::Movie => self.tmdb_id,
            MediaKind::Tv => self.tvdb_id,
        }
    }
}

/// Fields needed to insert a new MediaItem; the store assigns id/timestamps.
#[derive(Debug, Clone)]
pub struct NewMediaItem {
    pub kind: MediaKind,
    pub name: String,
    pub safe_name: String,
    pub tmdb_id: Option<i64>,
    pub tvdb_id: Option<i64>,
}
