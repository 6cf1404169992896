use chrono::Utc;
use pipeline_model::{JobId, LogEvent, NewLogEvent};

use crate::error::Result;
use crate::rows::LogEventRow;
use crate::store::SqliteStore;

impl SqliteStore {
    pub async fn create_log_event(&self, new: NewLogEvent) -> Result<LogEvent> {
        let row = sqlx::query_as::<_, LogEventRow>(
            r#"
            INSERT INTO log_events (job_id, level, message, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.job_id.as_i64())
        .bind(new.level.as_str())
        .bind(&new.message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    pub async fn list_log_events(&self, job_id: JobId) -> Result<Vec<LogEvent>> {
        let rows = sqlx::query_as::<_, LogEventRow>(
            "SELECT * FROM log_events WHERE job_id = ? ORDER BY timestamp",
        )
        .bind(job_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{LogLevel, MediaItem, MediaKind, NewJob, Stage};

    use super::*;

    #[tokio::test]
    async fn log_events_list_in_timestamp_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store
            .create_media_item(MediaItem::new_draft(MediaKind::Movie, "Heat"))
            .await
            .unwrap();
        let job = store.create_job(NewJob::new(item.id, Stage::Rip)).await.unwrap();

        store
            .create_log_event(NewLogEvent { job_id: job.id, level: LogLevel::Info, message: "started".into() })
            .await
            .unwrap();
        store
            .create_log_event(NewLogEvent { job_id: job.id, level: LogLevel::Error, message: "disc read error".into() })
            .await
            .unwrap();

        let events = store.list_log_events(job.id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, LogLevel::Error);
    }
}
