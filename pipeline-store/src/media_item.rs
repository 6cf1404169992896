use chrono::Utc;
use pipeline_model::{ItemStatus, MediaItem, MediaItemId, NewMediaItem, Stage, StageStatus};

use crate::error::{Result, StoreError};
use crate::rows::MediaItemRow;
use crate::store::SqliteStore;

impl SqliteStore {
    pub async fn create_media_item(&self, new: NewMediaItem) -> Result<MediaItem> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO media_items
                (kind, name, safe_name, tmdb_id, tvdb_id, item_status, current_stage, stage_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.kind.as_str())
        .bind(&new.name)
        .bind(&new.safe_name)
        .bind(new.tmdb_id)
        .bind(new.tvdb_id)
        .bind(ItemStatus::NotStarted.as_str())
        .bind(Stage::Rip.as_str())
        .bind(StageStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_media_item(MediaItemId(id)).await
    }

    pub async fn get_media_item(&self, id: MediaItemId) -> Result<MediaItem> {
        let row = sqlx::query_as::<_, MediaItemRow>("SELECT * FROM media_items WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "media_item", id: id.as_i64() })?;
        row.try_into()
    }

    pub async fn find_media_item_by_safe_name(&self, safe_name: &str) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaItemRow>("SELECT * FROM media_items WHERE safe_name = ?")
            .bind(safe_name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn list_media_items(&self) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query_as::<_, MediaItemRow>("SELECT * FROM media_items ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn update_item_stage(&self, id: MediaItemId, stage: Stage, stage_status: StageStatus) -> Result<()> {
        sqlx::query("UPDATE media_items SET current_stage = ?, stage_status = ?, updated_at = ? WHERE id = ?")
            .bind(stage.as_str())
            .bind(stage_status.as_str())
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_item_status(&self, id: MediaItemId, item_status: ItemStatus) -> Result<()> {
        sqlx::query("UPDATE media_items SET item_status = ?, updated_at = ? WHERE id = ?")
            .bind(item_status.as_str())
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
