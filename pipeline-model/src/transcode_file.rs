use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, TranscodeFileId};
use crate::status::TranscodeFileStatus;

/// One input file tracked under a transcode job, keyed by its path relative
/// to the job's `input_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeFile {
    pub id: TranscodeFileId,
    pub job_id: JobId,
    pub relative_path: String,
    pub status: TranscodeFileStatus,
    pub input_size: u64,
    pub output_size: u64,
    pub progress: u8,
    pub duration_secs: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTranscodeFile {
    pub job_id: JobId,
    pub relative_path: String,
    pub input_size: u64,
    pub duration_secs: Option<f64>,
}
