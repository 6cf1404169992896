use chrono::Utc;
use pipeline_model::{Job, JobId, JobStatus, MediaItemId, NewJob, SeasonId, Stage};
use serde_json::Value;

use crate::error::{map_insert_job_error, Result, StoreError};
use crate::rows::JobRow;
use crate::store::SqliteStore;

impl SqliteStore {
    /// Insert a pending job. Fails with `StoreError::DuplicateActiveJob` if
    /// an active job already occupies this item/season/stage/disc slot.
    pub async fn create_job(&self, new: NewJob) -> Result<Job> {
        let options = new.options.as_ref().map(|v| v.to_string());
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO jobs (media_item_id, season_id, stage, status, disc, progress, options, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.media_item_id.as_i64())
        .bind(new.season_id.map(|s| s.as_i64()))
        .bind(new.stage.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(new.disc.map(|d| d as i64))
        .bind(options)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_job_error)?;

        self.get_job(JobId(id)).await
    }

    pub async fn get_job(&self, id: JobId) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "job", id: id.as_i64() })?;
        row.try_into()
    }

    pub async fn list_jobs_for_item(&self, media_item_id: MediaItemId) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE media_item_id = ? ORDER BY created_at",
        )
        .bind(media_item_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn list_jobs_for_season(&self, season_id: SeasonId) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE season_id = ? ORDER BY created_at",
        )
        .bind(season_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Mirrors the partial unique index's key, so callers can check for an
    /// in-flight job before attempting an insert that would just fail.
    pub async fn find_active_job(
        &self,
        media_item_id: MediaItemId,
        season_id: Option<SeasonId>,
        stage: Stage,
        disc: Option<u32>,
    ) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE media_item_id = ?
              AND season_key = ?
              AND stage = ?
              AND disc_key = ?
              AND status IN ('pending', 'in_progress')
            "#,
        )
        .bind(media_item_id.as_i64())
        .bind(season_id.map(|s| s.as_i64()).unwrap_or(0))
        .bind(stage.as_str())
        .bind(disc.map(|d| d as i64).unwrap_or(0))
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// The most recent completed job for this item/season/stage, used to
    /// derive the next stage's `input_dir` from the prior stage's `output_dir`.
    pub async fn latest_completed_job(
        &self,
        media_item_id: MediaItemId,
        season_id: Option<SeasonId>,
        stage: Stage,
    ) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE media_item_id = ?
              AND season_key = ?
              AND stage = ?
              AND status = 'completed'
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(media_item_id.as_i64())
        .bind(season_id.map(|s| s.as_i64()).unwrap_or(0))
        .bind(stage.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Highest disc number ripped so far for a season, for auto-assigning
    /// the next disc when an operator chooses "rip another disc".
    pub async fn max_rip_disc_for_season(&self, season_id: SeasonId) -> Result<Option<u32>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(disc) FROM jobs WHERE season_id = ? AND stage = 'rip'",
        )
        .bind(season_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(max.map(|d| d as u32))
    }

    /// All rip jobs for an item/season, ordered by disc, for rendering a
    /// per-disc progress rollup.
    pub async fn disc_progress_rollup(
        &self,
        media_item_id: MediaItemId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE media_item_id = ?
              AND season_key = ?
              AND stage = 'rip'
            ORDER BY disc
            "#,
        )
        .bind(media_item_id.as_i64())
        .bind(season_id.map(|s| s.as_i64()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Flip a pending job to in-progress and stamp its worker identity.
    pub async fn start_job(
        &self,
        id: JobId,
        worker_id: &str,
        pid: u32,
        input_dir: &str,
        output_dir: &str,
        log_path: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, worker_id = ?, pid = ?, input_dir = ?, output_dir = ?,
                log_path = ?, error_message = NULL, started_at = ?
            WHERE id = ?
            "#,
        )
        .bind(JobStatus::InProgress.as_str())
        .bind(worker_id)
        .bind(pid as i64)
        .bind(input_dir)
        .bind(output_dir)
        .bind(log_path)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_job_progress(&self, id: JobId, progress: u8) -> Result<()> {
        sqlx::query("UPDATE jobs SET progress = ? WHERE id = ?")
            .bind(progress as i64)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn complete_job(&self, id: JobId, output_dir: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, progress = 100, completed_at = ?, output_dir = COALESCE(?, output_dir)
            WHERE id = ?
            "#,
        )
        .bind(JobStatus::Completed.as_str())
        .bind(Utc::now())
        .bind(output_dir)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fail_job(&self, id: JobId, error_message: &str) -> Result<()> {
        sqlx::query("UPDATE jobs SET status = ?, error_message = ?, completed_at = ? WHERE id = ?")
            .bind(JobStatus::Failed.as_str())
            .bind(error_message)
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_job_options(&self, id: JobId, options: &Value) -> Result<()> {
        sqlx::query("UPDATE jobs SET options = ? WHERE id = ?")
            .bind(options.to_string())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_job_options(&self, id: JobId) -> Result<Option<Value>> {
        Ok(self.get_job(id).await?.options)
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{MediaItem, MediaKind};

    use super::*;

    async fn new_movie(store: &SqliteStore, name: &str) -> MediaItemId {
        store.create_media_item(MediaItem::new_draft(MediaKind::Movie, name)).await.unwrap().id
    }

    #[tokio::test]
    async fn second_active_job_for_same_slot_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item_id = new_movie(&store, "Heat").await;

        store
            .create_job(NewJob::new(item_id, Stage::Rip))
            .await
            .unwrap();
        let err = store
            .create_job(NewJob::new(item_id, Stage::Rip))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateActiveJob));
    }

    #[tokio::test]
    async fn completed_job_frees_the_slot_for_a_new_one() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item_id = new_movie(&store, "Heat").await;

        let first = store.create_job(NewJob::new(item_id, Stage::Rip)).await.unwrap();
        store.complete_job(first.id, Some("/staging/1-ripped/movies/Heat")).await.unwrap();

        let second = store.create_job(NewJob::new(item_id, Stage::Rip)).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn distinct_discs_can_be_active_simultaneously() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item_id = new_movie(&store, "Heat").await;

        store
            .create_job(NewJob::new(item_id, Stage::Rip).with_disc(1))
            .await
            .unwrap();
        store
            .create_job(NewJob::new(item_id, Stage::Rip).with_disc(2))
            .await
            .unwrap();

        let jobs = store.list_jobs_for_item(item_id).await.unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn disc_rollup_is_ordered_by_disc_number() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item_id = new_movie(&store, "Heat").await;

        let d2 = store.create_job(NewJob::new(item_id, Stage::Rip).with_disc(2)).await.unwrap();
        store.complete_job(d2.id, None).await.unwrap();
        store.create_job(NewJob::new(item_id, Stage::Rip).with_disc(1)).await.unwrap();

        let rollup = store.disc_progress_rollup(item_id, None).await.unwrap();
        assert_eq!(rollup.iter().map(|j| j.disc).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn options_round_trip_through_set_and_get() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item_id = new_movie(&store, "Heat").await;
        let job = store.create_job(NewJob::new(item_id, Stage::Transcode)).await.unwrap();

        store.set_job_options(job.id, &serde_json::json!({"crf": 18})).await.unwrap();
        let options = store.get_job_options(job.id).await.unwrap().unwrap();
        assert_eq!(options["crf"], 18);
    }
}
