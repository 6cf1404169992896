//! The two ways a stage attempt comes into being (C3): a standalone
//! invocation that creates its own item and job in one step, or the normal
//! dispatcher-driven path that resumes a job the dispatcher already created
//! pending. Both end with the job `in_progress`, stamped, and sidecar'd.

use chrono::Utc;
use pipeline_model::{Job, JobId, MediaItem, MediaKind, NewJob, Season, SeasonId, Stage};
use pipeline_store::SqliteStore;

use crate::error::{PipelineError, Result};
use crate::sidecar::Sidecar;

/// Find-or-create the `MediaItem` by `safe_name`, then create a fresh job
/// already `in_progress`. Used by standalone worker invocations that are
/// not going through the dispatcher's pending-job flow.
pub async fn create_new(
    store: &SqliteStore,
    kind: MediaKind,
    name: &str,
    stage: Stage,
    season_number: Option<u32>,
    disc: Option<u32>,
    worker_id: &str,
    pid: u32,
    output_dir: &str,
    log_path: &str,
) -> Result<(Job, Option<Season>, Sidecar)> {
    let draft = MediaItem::new_draft(kind, name);
    let item = match store.find_media_item_by_safe_name(&draft.safe_name).await? {
        Some(existing) => existing,
        None => store.create_media_item(draft).await?,
    };

    let season = match (kind, season_number) {
        (MediaKind::Tv, Some(number)) => {
            let existing = store
                .list_seasons_for_item(item.id)
                .await?
                .into_iter()
                .find(|s| s.number == number);
            Some(match existing {
                Some(s) => s,
                None => store.create_season(pipeline_model::NewSeason { item_id: item.id, number }).await?,
            })
        }
        (MediaKind::Tv, None) => {
            return Err(PipelineError::Validation("TV item requires a season number".into()))
        }
        (MediaKind::Movie, _) => None,
    };

    let mut new_job = NewJob::new(item.id, stage);
    if let Some(s) = &season {
        new_job = new_job.with_season(s.id);
    }
    if let Some(d) = disc {
        new_job = new_job.with_disc(d);
    }
    let job = store.create_job(new_job).await?;

    let sidecar = stamp_in_progress(store, job.id, worker_id, pid, output_dir, output_dir, log_path).await?;
    Ok((job, season, sidecar))
}

/// Load a pending job the dispatcher already created, flip it to
/// `in_progress`, and stamp worker identity — the normal path a stage
/// worker binary takes on startup.
pub async fn resume_existing(
    store: &SqliteStore,
    job_id: JobId,
    worker_id: &str,
    pid: u32,
    input_dir: &str,
    output_dir: &str,
    log_path: &str,
) -> Result<(Job, Sidecar)> {
    let job = store.get_job(job_id).await?;
    if job.status != pipeline_model::JobStatus::Pending {
        return Err(PipelineError::Validation(format!(
            "job {job_id} is not pending (status: {:?})",
            job.status
        )));
    }
    let sidecar = stamp_in_progress(store, job_id, worker_id, pid, input_dir, output_dir, log_path).await?;
    let job = store.get_job(job_id).await?;
    Ok((job, sidecar))
}

async fn stamp_in_progress(
    store: &SqliteStore,
    job_id: JobId,
    worker_id: &str,
    pid: u32,
    input_dir: &str,
    output_dir: &str,
    log_path: &str,
) -> Result<Sidecar> {
    store.start_job(job_id, worker_id, pid, input_dir, output_dir, log_path).await?;
    let job = store.get_job(job_id).await?;

    let sidecar = Sidecar::new(std::path::Path::new(output_dir), job.stage);
    // Sidecar writes are advisory: never fail the job over them.
    if let Err(err) = sidecar.write_status("in_progress") {
        tracing::warn!(?err, "failed to write sidecar status");
    }
    if let Err(err) = sidecar.write_started_at(&Utc::now().to_rfc3339()) {
        tracing::warn!(?err, "failed to write sidecar started_at");
    }
    if let Err(err) = sidecar.write_pid(pid) {
        tracing::warn!(?err, "failed to write sidecar pid");
    }
    if let Err(err) = sidecar.write_metadata(&job) {
        tracing::warn!(?err, "failed to write sidecar metadata");
    }

    Ok(sidecar)
}

/// Mark the job `completed`, flip the owning item/season to the same stage
/// at `completed`, and best-effort mirror to the sidecar.
pub async fn complete(store: &SqliteStore, job: &Job, output_dir: Option<&str>, sidecar: &Sidecar) -> Result<()> {
    store.complete_job(job.id, output_dir).await?;
    match job.season_id {
        Some(season_id) => {
            store.update_season_stage(season_id, job.stage, pipeline_model::StageStatus::Completed).await?
        }
        None => store.update_item_stage(job.media_item_id, job.stage, pipeline_model::StageStatus::Completed).await?,
    }
    let _ = sidecar.write_status("completed");
    let _ = sidecar.write_completed_at(&Utc::now().to_rfc3339());
    Ok(())
}

/// Mark the job `failed` with `message`, flip the owning item/season's
/// `stage_status` to `failed`, and best-effort mirror to the sidecar.
pub async fn fail(store: &SqliteStore, job: &Job, message: &str, sidecar: &Sidecar) -> Result<()> {
    store.fail_job(job.id, message).await?;
    match job.season_id {
        Some(season_id) => {
            store.update_season_stage(season_id, job.stage, pipeline_model::StageStatus::Failed).await?
        }
        None => store.update_item_stage(job.media_item_id, job.stage, pipeline_model::StageStatus::Failed).await?,
    }
    let _ = sidecar.write_status("failed");
    let _ = sidecar.write_completed_at(&Utc::now().to_rfc3339());
    let _ = sidecar.write_error(message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pipeline_model::JobStatus;

    use super::*;

    #[tokio::test]
    async fn resume_existing_flips_pending_to_in_progress() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();
        let job = store.create_job(NewJob::new(item.id, Stage::Rip)).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("output");
        let (resumed, _sidecar) = resume_existing(
            &store,
            job.id,
            "host-a",
            1234,
            "disc:0",
            output_dir.to_str().unwrap(),
            "worker.log",
        )
        .await
        .unwrap();

        assert_eq!(resumed.status, JobStatus::InProgress);
        assert_eq!(resumed.worker_id.as_deref(), Some("host-a"));
        assert!(resumed.started_at.is_some());
    }

    #[tokio::test]
    async fn resuming_a_non_pending_job_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();
        let job = store.create_job(NewJob::new(item.id, Stage::Rip)).await.unwrap();
        store.start_job(job.id, "host-a", 1, "a", "b", "c").await.unwrap();

        let err = resume_existing(&store, job.id, "host-b", 2, "a", "b", "c").await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn create_new_finds_existing_item_instead_of_duplicating() {
        let store = SqliteStore::in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (first, _, _) = create_new(
            &store,
            MediaKind::Movie,
            "Heat",
            Stage::Rip,
            None,
            None,
            "host-a",
            1,
            dir.path().to_str().unwrap(),
            "worker.log",
        )
        .await
        .unwrap();
        store.complete_job(first.id, None).await.unwrap();

        let (second, _, _) = create_new(
            &store,
            MediaKind::Movie,
            "Heat",
            Stage::Organize,
            None,
            None,
            "host-a",
            2,
            dir.path().to_str().unwrap(),
            "worker.log",
        )
        .await
        .unwrap();

        assert_eq!(first.media_item_id, second.media_item_id);
    }
}
