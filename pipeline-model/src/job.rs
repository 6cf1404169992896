use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{JobId, MediaItemId, SeasonId};
use crate::stage::Stage;
use crate::status::JobStatus;

/// One execution attempt of a stage, optionally scoped to a season and/or disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub media_item_id: MediaItemId,
    pub season_id: Option<SeasonId>,
    pub stage: Stage,
    pub status: JobStatus,
    pub disc: Option<u32>,
    pub worker_id: Option<String>,
    pub pid: Option<u32>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub log_path: Option<String>,
    pub error_message: Option<String>,
    pub progress: u8,
    pub options: Option<Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Pending/in_progress jobs are "active".
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The dedupe/uniqueness tuple used by the partial unique index.
    pub fn active_key(&self) -> ActiveJobKey {
        ActiveJobKey {
            media_item_id: self.media_item_id,
            season_id: self.season_id,
            stage: self.stage,
            disc: self.disc,
        }
    }

    /// Merge per-job JSON option overrides onto stage defaults. Unknown keys
    /// in `options` are ignored by whoever reads `defaults` back out; this
    /// merge is a plain JSON object union with `options` taking precedence.
    pub fn merged_options(&self, defaults: &Value) -> Value {
        let mut merged = defaults.clone();
        if let (Some(merged_obj), Some(Value::Object(overrides))) =
            (merged.as_object_mut(), self.options.as_ref())
        {
            for (k, v) in overrides {
                merged_obj.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveJobKey {
    pub media_item_id: MediaItemId,
    pub season_id: Option<SeasonId>,
    pub stage: Stage,
    pub disc: Option<u32>,
}

/// Fields needed to insert a new pending Job; the store assigns id/created_at.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub media_item_id: MediaItemId,
    pub season_id: Option<SeasonId>,
    pub stage: Stage,
    pub disc: Option<u32>,
    pub options: Option<Value>,
}

impl NewJob {
    pub fn new(media_item_id: MediaItemId, stage: Stage) -> Self {
        Self {
            media_item_id,
            season_id: None,
            stage,
            disc: None,
            options: None,
        }
    }

    pub fn with_season(mut self, season_id: SeasonId) -> Self {
        self.season_id = Some(season_id);
        self
    }

    pub fn with_disc(mut self, disc: u32) -> Self {
        self.disc = Some(disc);
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}
