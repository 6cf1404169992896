use chrono::Utc;
use pipeline_model::{JobId, NewTranscodeFile, TranscodeFile, TranscodeFileId, TranscodeFileStatus};

use crate::error::{Result, StoreError};
use crate::rows::TranscodeFileRow;
use crate::store::SqliteStore;

impl SqliteStore {
    pub async fn create_transcode_file(&self, new: NewTranscodeFile) -> Result<TranscodeFile> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO transcode_files
                (job_id, relative_path, status, input_size, duration_secs, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.job_id.as_i64())
        .bind(&new.relative_path)
        .bind(TranscodeFileStatus::Pending.as_str())
        .bind(new.input_size as i64)
        .bind(new.duration_secs)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_transcode_file(TranscodeFileId(id)).await
    }

    pub async fn get_transcode_file(&self, id: TranscodeFileId) -> Result<TranscodeFile> {
        let row = sqlx::query_as::<_, TranscodeFileRow>("SELECT * FROM transcode_files WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "transcode_file", id: id.as_i64() })?;
        row.try_into()
    }

    pub async fn find_transcode_file_by_path(
        &self,
        job_id: JobId,
        relative_path: &str,
    ) -> Result<Option<TranscodeFile>> {
        let row = sqlx::query_as::<_, TranscodeFileRow>(
            "SELECT * FROM transcode_files WHERE job_id = ? AND relative_path = ?",
        )
        .bind(job_id.as_i64())
        .bind(relative_path)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn list_transcode_files(&self, job_id: JobId) -> Result<Vec<TranscodeFile>> {
        let rows = sqlx::query_as::<_, TranscodeFileRow>(
            "SELECT * FROM transcode_files WHERE job_id = ? ORDER BY relative_path",
        )
        .bind(job_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn update_transcode_file_progress(
        &self,
        id: TranscodeFileId,
        status: TranscodeFileStatus,
        progress: u8,
    ) -> Result<()> {
        sqlx::query("UPDATE transcode_files SET status = ?, progress = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(progress as i64)
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn complete_transcode_file(&self, id: TranscodeFileId, output_size: u64) -> Result<()> {
        sqlx::query(
            "UPDATE transcode_files SET status = ?, progress = 100, output_size = ?, updated_at = ? WHERE id = ?",
        )
        .bind(TranscodeFileStatus::Completed.as_str())
        .bind(output_size as i64)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fail_transcode_file(&self, id: TranscodeFileId, error_message: &str) -> Result<()> {
        sqlx::query("UPDATE transcode_files SET status = ?, error_message = ?, updated_at = ? WHERE id = ?")
            .bind(TranscodeFileStatus::Failed.as_str())
            .bind(error_message)
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A failed file retried from scratch: clears the error and size so the
    /// resumption algorithm treats it as never having started.
    pub async fn reset_transcode_file_to_pending(&self, id: TranscodeFileId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transcode_files
            SET status = ?, progress = 0, output_size = 0, error_message = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(TranscodeFileStatus::Pending.as_str())
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{MediaItem, MediaKind, NewJob, Stage};

    use super::*;

    async fn new_job(store: &SqliteStore) -> JobId {
        let item = store
            .create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat"))
            .await
            .unwrap();
        store.create_job(NewJob::new(item.id, Stage::Transcode)).await.unwrap().id
    }

    #[tokio::test]
    async fn progress_and_completion_update_the_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        let job_id = new_job(&store).await;
        let file = store
            .create_transcode_file(NewTranscodeFile {
                job_id,
                relative_path: "main/movie.mkv".into(),
                input_size: 4_000_000_000,
                duration_secs: Some(7200.0),
            })
            .await
            .unwrap();

        store
            .update_transcode_file_progress(file.id, TranscodeFileStatus::InProgress, 42)
            .await
            .unwrap();
        store.complete_transcode_file(file.id, 1_200_000_000).await.unwrap();

        let reloaded = store.get_transcode_file(file.id).await.unwrap();
        assert_eq!(reloaded.status, TranscodeFileStatus::Completed);
        assert_eq!(reloaded.progress, 100);
        assert_eq!(reloaded.output_size, 1_200_000_000);
    }

    #[tokio::test]
    async fn reset_clears_failure_state() {
        let store = SqliteStore::in_memory().await.unwrap();
        let job_id = new_job(&store).await;
        let file = store
            .create_transcode_file(NewTranscodeFile {
                job_id,
                relative_path: "main/movie.mkv".into(),
                input_size: 100,
                duration_secs: None,
            })
            .await
            .unwrap();
        store.fail_transcode_file(file.id, "ffmpeg exited 1").await.unwrap();

        store.reset_transcode_file_to_pending(file.id).await.unwrap();
        let reloaded = store.get_transcode_file(file.id).await.unwrap();
        assert_eq!(reloaded.status, TranscodeFileStatus::Pending);
        assert!(reloaded.error_message.is_none());
    }
}
