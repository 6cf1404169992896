//! The filesystem half of the dual-write state writer (C3). Authoritative
//! state always lives in the store; these files exist for human inspection
//! and are advisory — a write failure here never fails the worker.

use std::io;
use std::path::{Path, PathBuf};

use pipeline_model::{Job, Stage};
use serde::Serialize;

/// One job's `.{stage}/` directory inside its own output tree.
#[derive(Debug, Clone)]
pub struct Sidecar {
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct Metadata {
    job_id: i64,
    media_item_id: i64,
    season_id: Option<i64>,
    stage: &'static str,
    disc: Option<u32>,
}

impl Sidecar {
    pub fn new(output_dir: &Path, stage: Stage) -> Self {
        Self { dir: output_dir.join(format!(".{}", stage.as_str())) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_status(&self, status: &str) -> io::Result<()> {
        self.atomic_write("status", status)
    }

    pub fn write_started_at(&self, rfc3339: &str) -> io::Result<()> {
        self.atomic_write("started_at", rfc3339)
    }

    pub fn write_completed_at(&self, rfc3339: &str) -> io::Result<()> {
        self.atomic_write("completed_at", rfc3339)
    }

    pub fn write_error(&self, message: &str) -> io::Result<()> {
        self.atomic_write("error", message)
    }

    pub fn write_pid(&self, pid: u32) -> io::Result<()> {
        self.atomic_write("pid", &pid.to_string())
    }

    pub fn write_metadata(&self, job: &Job) -> io::Result<()> {
        let metadata = Metadata {
            job_id: job.id.as_i64(),
            media_item_id: job.media_item_id.as_i64(),
            season_id: job.season_id.map(|s| s.as_i64()),
            stage: job.stage.as_str(),
            disc: job.disc,
        };
        let json = serde_json::to_string_pretty(&metadata)
            .expect("Metadata serializes without error: plain scalar fields only");
        self.atomic_write("metadata.json", &json)
    }

    /// Write `filename` by writing to a temp file in the same directory and
    /// renaming over the target, so a concurrent reader never observes a
    /// half-written file.
    fn atomic_write(&self, filename: &str, contents: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(filename);
        let tmp = self.dir.join(format!(".{filename}.tmp"));
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &target)
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{JobId, MediaItemId};

    use super::*;

    #[test]
    fn status_and_metadata_land_in_the_dot_stage_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sidecar = Sidecar::new(dir.path(), Stage::Remux);

        sidecar.write_status("in_progress").unwrap();
        sidecar.write_pid(4242).unwrap();

        assert_eq!(sidecar.dir(), dir.path().join(".remux"));
        assert_eq!(std::fs::read_to_string(dir.path().join(".remux/status")).unwrap(), "in_progress");
        assert_eq!(std::fs::read_to_string(dir.path().join(".remux/pid")).unwrap(), "4242");
    }

    #[test]
    fn rewriting_status_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let sidecar = Sidecar::new(dir.path(), Stage::Rip);
        sidecar.write_status("in_progress").unwrap();
        sidecar.write_status("completed").unwrap();

        let entries: Vec<_> = std::fs::read_dir(sidecar.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["status"]);
    }

    #[test]
    fn metadata_json_carries_job_identity() {
        let dir = tempfile::tempdir().unwrap();
        let sidecar = Sidecar::new(dir.path(), Stage::Transcode);
        let job = Job {
            id: JobId(7),
            media_item_id: MediaItemId(3),
            season_id: None,
            stage: Stage::Transcode,
            status: pipeline_model::JobStatus::InProgress,
            disc: None,
            worker_id: None,
            pid: None,
            input_dir: None,
            output_dir: None,
            log_path: None,
            error_message: None,
            progress: 0,
            options: None,
            started_at: None,
            completed_at: None,
            created_at: chrono::Utc::now(),
        };
        sidecar.write_metadata(&job).unwrap();
        let text = std::fs::read_to_string(sidecar.dir().join("metadata.json")).unwrap();
        assert!(text.contains("\"job_id\": 7"));
        assert!(text.contains("\"stage\": \"transcode\""));
    }
}
