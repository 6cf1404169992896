use serde::{Deserialize, Serialize};

/// Overall lifecycle of a MediaItem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    NotStarted,
    Active,
    Completed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::NotStarted => "not_started",
            ItemStatus::Active => "active",
            ItemStatus::Completed => "completed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(ItemStatus::NotStarted),
            "active" => Some(ItemStatus::Active),
            "completed" => Some(ItemStatus::Completed),
            _ => None,
        }
    }
}

/// Terminal state of the most recently attempted stage for an item/season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(StageStatus::Pending),
            "in_progress" => Some(StageStatus::InProgress),
            "completed" => Some(StageStatus::Completed),
            "failed" => Some(StageStatus::Failed),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, StageStatus::Pending | StageStatus::InProgress)
    }
}

/// Status of one execution attempt of a stage (a `Job` row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Pending/in_progress jobs are "active".
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::InProgress)
    }

    /// `completed_at` is set iff the job reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_stage_status(self) -> StageStatus {
        match self {
            JobStatus::Pending => StageStatus::Pending,
            JobStatus::InProgress => StageStatus::InProgress,
            JobStatus::Completed => StageStatus::Completed,
            JobStatus::Failed => StageStatus::Failed,
        }
    }
}

/// Status of one input file within a transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeFileStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl TranscodeFileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscodeFileStatus::Pending => "pending",
            TranscodeFileStatus::InProgress => "in_progress",
            TranscodeFileStatus::Completed => "completed",
            TranscodeFileStatus::Failed => "failed",
            TranscodeFileStatus::Skipped => "skipped",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TranscodeFileStatus::Pending),
            "in_progress" => Some(TranscodeFileStatus::InProgress),
            "completed" => Some(TranscodeFileStatus::Completed),
            "failed" => Some(TranscodeFileStatus::Failed),
            "skipped" => Some(TranscodeFileStatus::Skipped),
            _ => None,
        }
    }

    /// A file row counts toward job completion once it's done one way or another.
    pub fn is_done(self) -> bool {
        matches!(self, TranscodeFileStatus::Completed | TranscodeFileStatus::Skipped)
    }
}
