//! Turns operator intent (from the control plane) and completed jobs into
//! new `Job` rows and launched worker processes (C8).

use std::path::{Path, PathBuf};

use pipeline_config::PipelineConfig;
use pipeline_model::{Job, JobId, MediaItemId, NewJob, NewSeason, Season, SeasonId, Stage, StageStatus};
use pipeline_store::SqliteStore;

use crate::error::{PipelineError, Result};

/// Binaries named after their stage (`rip`, `remux`, `transcode`, `publish`);
/// `organize` has no worker binary — it's validated, not executed.
fn binary_name(stage: Stage) -> Option<&'static str> {
    match stage {
        Stage::Rip => Some("rip"),
        Stage::Remux => Some("remux"),
        Stage::Transcode => Some("transcode"),
        Stage::Publish => Some("publish"),
        Stage::Organize => None,
    }
}

pub struct Dispatcher {
    store: SqliteStore,
    config: PipelineConfig,
    db_path: PathBuf,
    /// Sibling directory of the running control-plane binary, searched
    /// before `PATH` when resolving a stage binary.
    binaries_dir: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(store: SqliteStore, config: PipelineConfig, db_path: PathBuf) -> Self {
        Self { store, config, db_path, binaries_dir: None }
    }

    pub fn with_binaries_dir(mut self, dir: PathBuf) -> Self {
        self.binaries_dir = Some(dir);
        self
    }

    fn resolve_binary(&self, stage: Stage) -> Result<PathBuf> {
        let name = binary_name(stage)
            .ok_or_else(|| PipelineError::Validation(format!("{stage} has no worker binary")))?;

        if let Some(dir) = &self.binaries_dir {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        which::which(name).map_err(|_| PipelineError::Environment(format!("{name} binary not found on PATH")))
    }

    /// Launch `stage` locally or, if a non-empty dispatch target is
    /// configured for it, via a remote shell (`<shell> <target> <binary> <args…>`).
    async fn launch(&self, stage: Stage, job_id: JobId) -> Result<()> {
        let binary = self.resolve_binary(stage)?;
        let job_id_arg = job_id.to_string();
        let db_arg = self.db_path.display().to_string();

        let target = self.config.dispatch.get(stage.as_str()).map(String::as_str).unwrap_or("");
        let mut command = if target.is_empty() {
            let mut cmd = tokio::process::Command::new(&binary);
            cmd.args(["--job-id", &job_id_arg, "--db", &db_arg]);
            cmd
        } else {
            let shell = std::env::var("PIPELINE_REMOTE_SHELL").unwrap_or_else(|_| "ssh".to_string());
            let mut cmd = tokio::process::Command::new(shell);
            cmd.arg(target).arg(&binary).args(["--job-id", &job_id_arg, "--db", &db_arg]);
            cmd
        };

        command
            .spawn()
            .map_err(|err| PipelineError::Environment(format!("failed to launch {stage} worker: {err}")))?;
        Ok(())
    }

    pub async fn start_stage_for_movie(&self, media_item_id: MediaItemId, stage: Stage) -> Result<Job> {
        let job = self.store.create_job(NewJob::new(media_item_id, stage)).await?;
        self.store.update_item_stage(media_item_id, stage, StageStatus::InProgress).await?;
        self.launch(stage, job.id).await?;
        Ok(job)
    }

    pub async fn start_stage_for_season(
        &self,
        media_item_id: MediaItemId,
        season_id: SeasonId,
        stage: Stage,
    ) -> Result<Job> {
        let mut new_job = NewJob::new(media_item_id, stage).with_season(season_id);
        if stage == Stage::Rip {
            let next_disc = self.store.max_rip_disc_for_season(season_id).await?.map(|d| d + 1).unwrap_or(1);
            new_job = new_job.with_disc(next_disc);
        }
        let job = self.store.create_job(new_job).await?;
        self.store.update_season_stage(season_id, stage, StageStatus::InProgress).await?;
        self.launch(stage, job.id).await?;
        Ok(job)
    }

    pub async fn add_season(&self, item_id: MediaItemId) -> Result<Season> {
        let number = self.store.next_season_number(item_id).await?;
        Ok(self.store.create_season(NewSeason { item_id, number }).await?)
    }

    /// Precondition: at least one completed rip job exists for the season.
    pub async fn mark_season_rip_complete(&self, season_id: SeasonId) -> Result<()> {
        let jobs = self.store.list_jobs_for_season(season_id).await?;
        let has_completed_rip =
            jobs.iter().any(|j| j.stage == Stage::Rip && j.status == pipeline_model::JobStatus::Completed);
        if !has_completed_rip {
            return Err(PipelineError::Validation(
                "season has no completed rip job; rip at least one disc first".into(),
            ));
        }
        self.store.update_season_stage(season_id, Stage::Rip, StageStatus::Completed).await?;
        Ok(())
    }

    /// Record a synthetic, already-completed `organize` job pointing at the
    /// directory the operator just validated, for a movie.
    pub async fn mark_item_organization_completed(&self, item_id: MediaItemId, validated_dir: &Path) -> Result<Job> {
        let job = self.store.create_job(NewJob::new(item_id, Stage::Organize)).await?;
        self.store.complete_job(job.id, Some(&validated_dir.display().to_string())).await?;
        self.store.update_item_stage(item_id, Stage::Organize, StageStatus::Completed).await?;
        Ok(self.store.get_job(job.id).await?)
    }

    /// Record a synthetic, already-completed `organize` job pointing at the
    /// directory the operator just validated, for a TV season.
    pub async fn mark_season_organization_completed(
        &self,
        item_id: MediaItemId,
        season_id: SeasonId,
        validated_dir: &Path,
    ) -> Result<Job> {
        let job = self.store.create_job(NewJob::new(item_id, Stage::Organize).with_season(season_id)).await?;
        self.store.complete_job(job.id, Some(&validated_dir.display().to_string())).await?;
        self.store.update_season_stage(season_id, Stage::Organize, StageStatus::Completed).await?;
        Ok(self.store.get_job(job.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{MediaItem, MediaKind};

    use super::*;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            staging_base: "/mnt/media/staging".into(),
            library_base: pipeline_config::LibraryBase {
                movies: "/mnt/media/library/movies".into(),
                tv: "/mnt/media/library/tv".into(),
            },
            dispatch: Default::default(),
            remux: Default::default(),
            transcode: Default::default(),
            external_tools: Default::default(),
        }
    }

    #[tokio::test]
    async fn add_season_assigns_sequential_numbers() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad")).await.unwrap();
        let dispatcher = Dispatcher::new(store, test_config(), PathBuf::from("pipeline.db"));

        let s1 = dispatcher.add_season(item.id).await.unwrap();
        let s2 = dispatcher.add_season(item.id).await.unwrap();
        assert_eq!(s1.number, 1);
        assert_eq!(s2.number, 2);
    }

    #[tokio::test]
    async fn mark_rip_complete_requires_a_completed_rip_job() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad")).await.unwrap();
        let season = store.create_season(NewSeason { item_id: item.id, number: 1 }).await.unwrap();
        let dispatcher = Dispatcher::new(store, test_config(), PathBuf::from("pipeline.db"));

        let err = dispatcher.mark_season_rip_complete(season.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn organize_completion_records_a_synthetic_completed_job() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();
        let dispatcher = Dispatcher::new(store, test_config(), PathBuf::from("pipeline.db"));

        let job = dispatcher
            .mark_item_organization_completed(item.id, Path::new("/mnt/media/staging/1-ripped/movies/Heat"))
            .await
            .unwrap();

        assert_eq!(job.stage, Stage::Organize);
        assert_eq!(job.status, pipeline_model::JobStatus::Completed);
        assert!(job.output_dir.as_deref().unwrap().ends_with("Heat"));
    }

    #[tokio::test]
    async fn rip_disc_auto_assignment_increments_per_season() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad")).await.unwrap();
        let season = store.create_season(NewSeason { item_id: item.id, number: 2 }).await.unwrap();

        // Dispatcher::launch requires an actual binary on PATH; exercise the
        // disc-assignment logic directly against the store instead.
        assert_eq!(store.max_rip_disc_for_season(season.id).await.unwrap(), None);
        let job1 = store.create_job(NewJob::new(item.id, Stage::Rip).with_season(season.id).with_disc(1)).await.unwrap();
        store.complete_job(job1.id, None).await.unwrap();
        assert_eq!(store.max_rip_disc_for_season(season.id).await.unwrap(), Some(1));
    }
}
