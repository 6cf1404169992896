//! Raw row shapes as they come back from `sqlx::query_as`, and the
//! fallible conversions into the pure `pipeline-model` entities.
//!
//! Kept separate from the entities themselves because the wire shape of a
//! SQLite row (nullable TEXT-encoded enums, foreign keys as bare `i64`) is a
//! storage concern, not a domain one.

use chrono::{DateTime, Utc};

use pipeline_model::{
    ItemStatus, Job, JobId, JobStatus, LogEvent, LogEventId, LogLevel, MediaItem, MediaItemId,
    MediaKind, Season, SeasonId, Stage, StageStatus, TranscodeFile, TranscodeFileId,
    TranscodeFileStatus,
};

use crate::error::{Result, StoreError};

fn column<T>(column: &'static str, value: &str, parsed: Option<T>) -> Result<T> {
    parsed.ok_or_else(|| StoreError::InvalidColumn {
        column,
        value: value.to_string(),
    })
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MediaItemRow {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub safe_name: String,
    pub tmdb_id: Option<i64>,
    pub tvdb_id: Option<i64>,
    pub item_status: String,
    pub current_stage: String,
    pub stage_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MediaItemRow> for MediaItem {
    type Error = StoreError;

    fn try_from(row: MediaItemRow) -> Result<Self> {
        Ok(MediaItem {
            id: MediaItemId(row.id),
            kind: column("kind", &row.kind, MediaKind::from_str_opt(&row.kind))?,
            name: row.name,
            safe_name: row.safe_name,
            tmdb_id: row.tmdb_id,
            tvdb_id: row.tvdb_id,
            item_status: column(
                "item_status",
                &row.item_status,
                ItemStatus::from_str_opt(&row.item_status),
            )?,
            current_stage: column(
                "current_stage",
                &row.current_stage,
                Stage::from_str_opt(&row.current_stage),
            )?,
            stage_status: column(
                "stage_status",
                &row.stage_status,
                StageStatus::from_str_opt(&row.stage_status),
            )?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SeasonRow {
    pub id: i64,
    pub item_id: i64,
    pub number: i64,
    pub current_stage: String,
    pub stage_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SeasonRow> for Season {
    type Error = StoreError;

    fn try_from(row: SeasonRow) -> Result<Self> {
        Ok(Season {
            id: SeasonId(row.id),
            item_id: MediaItemId(row.item_id),
            number: row.number as u32,
            current_stage: column(
                "current_stage",
                &row.current_stage,
                Stage::from_str_opt(&row.current_stage),
            )?,
            stage_status: column(
                "stage_status",
                &row.stage_status,
                StageStatus::from_str_opt(&row.stage_status),
            )?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: i64,
    pub media_item_id: i64,
    pub season_id: Option<i64>,
    pub stage: String,
    pub status: String,
    pub disc: Option<i64>,
    pub worker_id: Option<String>,
    pub pid: Option<i64>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub log_path: Option<String>,
    pub error_message: Option<String>,
    pub progress: i64,
    pub options: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self> {
        let options = match row.options {
            Some(text) => Some(
                serde_json::from_str(&text)
                    .map_err(|_| StoreError::InvalidColumn { column: "options", value: text })?,
            ),
            None => None,
        };
        Ok(Job {
            id: JobId(row.id),
            media_item_id: MediaItemId(row.media_item_id),
            season_id: row.season_id.map(SeasonId),
            stage: column("stage", &row.stage, Stage::from_str_opt(&row.stage))?,
            status: column("status", &row.status, JobStatus::from_str_opt(&row.status))?,
            disc: row.disc.map(|d| d as u32),
            worker_id: row.worker_id,
            pid: row.pid.map(|p| p as u32),
            input_dir: row.input_dir,
            output_dir: row.output_dir,
            log_path: row.log_path,
            error_message: row.error_message,
            progress: row.progress as u8,
            options,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TranscodeFileRow {
    pub id: i64,
    pub job_id: i64,
    pub relative_path: String,
    pub status: String,
    pub input_size: i64,
    pub output_size: i64,
    pub progress: i64,
    pub duration_secs: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TranscodeFileRow> for TranscodeFile {
    type Error = StoreError;

    fn try_from(row: TranscodeFileRow) -> Result<Self> {
        Ok(TranscodeFile {
            id: TranscodeFileId(row.id),
            job_id: JobId(row.job_id),
            relative_path: row.relative_path,
            status: column(
                "status",
                &row.status,
                TranscodeFileStatus::from_str_opt(&row.status),
            )?,
            input_size: row.input_size as u64,
            output_size: row.output_size as u64,
            progress: row.progress as u8,
            duration_secs: row.duration_secs,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LogEventRow {
    pub id: i64,
    pub job_id: i64,
    pub level: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<LogEventRow> for LogEvent {
    type Error = StoreError;

    fn try_from(row: LogEventRow) -> Result<Self> {
        Ok(LogEvent {
            id: LogEventId(row.id),
            job_id: JobId(row.job_id),
            level: column("level", &row.level, LogLevel::from_str_opt(&row.level))?,
            message: row.message,
            timestamp: row.timestamp,
        })
    }
}
