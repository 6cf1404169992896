use std::path::PathBuf;

use anyhow::{anyhow, bail, Context as _, Result};
use pipeline_config::paths::{self, StagingLayout};
use pipeline_config::PipelineConfig;
use pipeline_core::sidecar::Sidecar;
use pipeline_core::state_writer;
use pipeline_core::telemetry;
use pipeline_model::{Job, JobId, MediaItem, MediaKind, Season, Stage};
use pipeline_store::SqliteStore;
use tracing_appender::non_blocking::WorkerGuard;

/// Everything a stage body needs once the shared bootstrap (steps 1–6 of the
/// worker algorithm) has run: the loaded job and its item/season, the
/// directories it should read from and write to, and the handles that keep
/// the sidecar and file log alive for the rest of the process.
pub struct StageContext {
    pub store: SqliteStore,
    pub config: PipelineConfig,
    pub job: Job,
    pub item: MediaItem,
    pub season: Option<Season>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sidecar: Sidecar,
    _log_guard: WorkerGuard,
}

impl StageContext {
    /// `explicit_input_dir` is `Some` only for the rip worker, whose "input"
    /// is a disc-path argument rather than a directory the prior stage wrote.
    pub async fn bootstrap(stage: Stage, job_id: JobId, db_path: &std::path::Path, explicit_input_dir: Option<PathBuf>) -> Result<Self> {
        let store = SqliteStore::connect(db_path).await?;
        let job = store.get_job(job_id).await.context("loading job")?;
        if job.stage != stage {
            bail!("job {job_id} is a {} job, not a {stage} job", job.stage);
        }

        let item = store.get_media_item(job.media_item_id).await.context("loading media item")?;
        let season = match (item.kind, job.season_id) {
            (MediaKind::Tv, Some(season_id)) => Some(store.get_season(season_id).await.context("loading season")?),
            (MediaKind::Tv, None) => {
                let message = "TV job is missing a season_id".to_string();
                store.fail_job(job.id, &message).await?;
                bail!(message);
            }
            (MediaKind::Movie, _) => None,
        };

        let config = PipelineConfig::load().context("loading pipeline config")?;
        let layout = StagingLayout::new(config.staging_base.clone());

        let input_dir = match explicit_input_dir {
            Some(dir) => dir,
            None => match Self::derive_input_dir(&store, &job, &item, &season, &layout).await {
                Ok(dir) => dir,
                Err(err) => {
                    store.fail_job(job.id, &err.to_string()).await?;
                    return Err(err);
                }
            },
        };
        let output_dir = Self::derive_output_dir(stage, &item, &season, job.disc, &input_dir, &layout);

        let media_base = paths::media_base();
        let log_dir = paths::job_log_dir(&media_base, job_id.as_i64());
        let log_guard = telemetry::init_worker(&log_dir)?;
        let log_path = log_dir.join("worker.log");

        let worker_id = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let pid = std::process::id();

        let (job, sidecar) = state_writer::resume_existing(
            &store,
            job_id,
            &worker_id,
            pid,
            input_dir.to_str().ok_or_else(|| anyhow!("input_dir is not valid UTF-8"))?,
            output_dir.to_str().ok_or_else(|| anyhow!("output_dir is not valid UTF-8"))?,
            log_path.to_str().ok_or_else(|| anyhow!("log_path is not valid UTF-8"))?,
        )
        .await?;

        Ok(Self { store, config, job, item, season, input_dir, output_dir, sidecar, _log_guard: log_guard })
    }

    /// Mark the job `completed`, optionally overriding `output_dir` with the
    /// directory the stage body actually produced (the publish worker only
    /// learns its real destination after the renaming tool runs).
    pub async fn complete(&self, output_dir_override: Option<&str>) -> Result<()> {
        state_writer::complete(&self.store, &self.job, output_dir_override, &self.sidecar).await?;
        Ok(())
    }

    pub async fn fail(&self, message: &str) -> Result<()> {
        state_writer::fail(&self.store, &self.job, message, &self.sidecar).await?;
        Ok(())
    }

    async fn derive_input_dir(
        store: &SqliteStore,
        job: &Job,
        item: &MediaItem,
        season: &Option<Season>,
        layout: &StagingLayout,
    ) -> Result<PathBuf> {
        let prior_stage =
            job.stage.previous().ok_or_else(|| anyhow!("{} has no prior stage to read input from", job.stage))?;
        let prior_job = store
            .latest_completed_job(item.id, job.season_id, prior_stage)
            .await?
            .ok_or_else(|| anyhow!("no completed {prior_stage} job found; finish that stage first"))?;

        // Organize has no worker binary, so it has no entry in
        // `stage_output_template`; its completed job's `output_dir` is the
        // operator-validated directory and is always set by
        // `mark_*_organization_completed`, so read it directly instead.
        if prior_stage == Stage::Organize {
            let output_dir = prior_job
                .output_dir
                .ok_or_else(|| anyhow!("completed organize job {} has no output_dir recorded", prior_job.id))?;
            return Ok(PathBuf::from(output_dir));
        }

        let season_number = season.as_ref().map(|s| s.number);
        Ok(Self::stage_output_template(prior_stage, item.kind, &item.safe_name, season_number, layout))
    }

    fn derive_output_dir(
        stage: Stage,
        item: &MediaItem,
        season: &Option<Season>,
        disc: Option<u32>,
        input_dir: &std::path::Path,
        layout: &StagingLayout,
    ) -> PathBuf {
        if stage == Stage::Publish {
            // The real destination is only known after the renaming tool
            // runs; `complete()` overrides this with the actual directory.
            return input_dir.to_path_buf();
        }
        let season_number = season.as_ref().map(|s| s.number);
        match (item.kind, stage) {
            (MediaKind::Tv, Stage::Rip) => {
                layout.ripped_tv_disc_dir(&item.safe_name, season_number.expect("TV rip job has a season"), disc.unwrap_or(1))
            }
            _ => Self::stage_output_template(stage, item.kind, &item.safe_name, season_number, layout),
        }
    }

    /// The directory convention for `stage`'s completed output. For
    /// `Stage::Rip` on TV this is the season root (the parent of every
    /// `Disc<k>/` directory), since the remux worker
    /// reads and merges across all of a season's discs, not just the one
    /// its own job happened to rip.
    fn stage_output_template(
        stage: Stage,
        kind: MediaKind,
        safe_name: &str,
        season_number: Option<u32>,
        layout: &StagingLayout,
    ) -> PathBuf {
        match (kind, stage) {
            (MediaKind::Movie, Stage::Rip) => layout.ripped_movie_dir(safe_name),
            (MediaKind::Tv, Stage::Rip) => {
                layout.ripped_tv_season_dir(safe_name, season_number.expect("TV rip job has a season"))
            }
            (MediaKind::Movie, Stage::Remux) => layout.remuxed_movie_dir(safe_name),
            (MediaKind::Tv, Stage::Remux) => {
                layout.remuxed_tv_season_dir(safe_name, season_number.expect("TV remux job has a season"))
            }
            (MediaKind::Movie, Stage::Transcode) => layout.transcoded_movie_dir(safe_name),
            (MediaKind::Tv, Stage::Transcode) => {
                layout.transcoded_tv_season_dir(safe_name, season_number.expect("TV transcode job has a season"))
            }
            (_, Stage::Organize) => unreachable!("organize has no worker binary"),
            (_, Stage::Publish) => unreachable!("publish has no fixed staging template"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{NewJob, NewSeason};
    use pipeline_store::SqliteStore;

    use super::*;

    #[tokio::test]
    async fn derive_input_dir_for_remux_reads_the_organize_jobs_output_dir_directly() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();

        let organize_job = store.create_job(NewJob::new(item.id, Stage::Organize)).await.unwrap();
        store
            .complete_job(organize_job.id, Some("/mnt/media/staging/1-ripped/movies/Heat-validated"))
            .await
            .unwrap();

        let remux_job = store.create_job(NewJob::new(item.id, Stage::Remux)).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");

        let input_dir = StageContext::derive_input_dir(&store, &remux_job, &item, &None, &layout).await.unwrap();
        assert_eq!(input_dir, PathBuf::from("/mnt/media/staging/1-ripped/movies/Heat-validated"));
    }

    #[tokio::test]
    async fn derive_input_dir_for_remux_errors_when_the_organize_job_has_no_output_dir() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();

        let organize_job = store.create_job(NewJob::new(item.id, Stage::Organize)).await.unwrap();
        store.complete_job(organize_job.id, None).await.unwrap();

        let remux_job = store.create_job(NewJob::new(item.id, Stage::Remux)).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");

        let err = StageContext::derive_input_dir(&store, &remux_job, &item, &None, &layout).await.unwrap_err();
        assert!(err.to_string().contains("no output_dir"), "{err}");
    }

    #[tokio::test]
    async fn derive_input_dir_for_transcode_uses_the_remux_staging_template() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();

        let remux_job = store.create_job(NewJob::new(item.id, Stage::Remux)).await.unwrap();
        store.complete_job(remux_job.id, None).await.unwrap();

        let transcode_job = store.create_job(NewJob::new(item.id, Stage::Transcode)).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");

        let input_dir =
            StageContext::derive_input_dir(&store, &transcode_job, &item, &None, &layout).await.unwrap();
        assert_eq!(input_dir, layout.remuxed_movie_dir(&item.safe_name));
    }

    #[tokio::test]
    async fn derive_input_dir_errors_when_the_prior_stage_has_no_completed_job() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();
        let remux_job = store.create_job(NewJob::new(item.id, Stage::Remux)).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");

        let err = StageContext::derive_input_dir(&store, &remux_job, &item, &None, &layout).await.unwrap_err();
        assert!(err.to_string().contains("no completed organize job"), "{err}");
    }

    #[tokio::test]
    async fn derive_output_dir_for_publish_returns_the_input_dir_unchanged() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat")).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");
        let input = PathBuf::from("/mnt/media/staging/3-transcoded/movies/Heat");

        let output = StageContext::derive_output_dir(Stage::Publish, &item, &None, None, &input, &layout);
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn derive_output_dir_for_tv_rip_is_the_disc_subdirectory() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad")).await.unwrap();
        let season = store.create_season(NewSeason { item_id: item.id, number: 2 }).await.unwrap();
        let layout = StagingLayout::new("/mnt/media/staging");

        let output = StageContext::derive_output_dir(
            Stage::Rip,
            &item,
            &Some(season),
            Some(3),
            std::path::Path::new("/irrelevant"),
            &layout,
        );
        assert_eq!(output, layout.ripped_tv_disc_dir(&item.safe_name, 2, 3));
    }
}
