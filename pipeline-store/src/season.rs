use chrono::Utc;
use pipeline_model::{MediaItemId, NewSeason, Season, SeasonId, Stage, StageStatus};

use crate::error::{Result, StoreError};
use crate::rows::SeasonRow;
use crate::store::SqliteStore;

impl SqliteStore {
    pub async fn create_season(&self, new: NewSeason) -> Result<Season> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO seasons (item_id, number, current_stage, stage_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.item_id.as_i64())
        .bind(new.number as i64)
        .bind(Stage::Rip.as_str())
        .bind(StageStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_season(SeasonId(id)).await
    }

    pub async fn get_season(&self, id: SeasonId) -> Result<Season> {
        let row = sqlx::query_as::<_, SeasonRow>("SELECT * FROM seasons WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "season", id: id.as_i64() })?;
        row.try_into()
    }

    pub async fn list_seasons_for_item(&self, item_id: MediaItemId) -> Result<Vec<Season>> {
        let rows = sqlx::query_as::<_, SeasonRow>("SELECT * FROM seasons WHERE item_id = ? ORDER BY number")
            .bind(item_id.as_i64())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The next unused season number for `item_id`, i.e. `max(number) + 1`,
    /// or `1` if the item has no seasons yet.
    pub async fn next_season_number(&self, item_id: MediaItemId) -> Result<u32> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(number) FROM seasons WHERE item_id = ?")
            .bind(item_id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(max.unwrap_or(0) as u32 + 1)
    }

    pub async fn update_season_stage(&self, id: SeasonId, stage: Stage, stage_status: StageStatus) -> Result<()> {
        sqlx::query("UPDATE seasons SET current_stage = ?, stage_status = ?, updated_at = ? WHERE id = ?")
            .bind(stage.as_str())
            .bind(stage_status.as_str())
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pipeline_model::{MediaItem, MediaKind};

    use super::*;

    #[tokio::test]
    async fn season_numbers_increment_from_one() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store
            .create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad"))
            .await
            .unwrap();

        assert_eq!(store.next_season_number(item.id).await.unwrap(), 1);
        store.create_season(NewSeason { item_id: item.id, number: 1 }).await.unwrap();
        assert_eq!(store.next_season_number(item.id).await.unwrap(), 2);
        store.create_season(NewSeason { item_id: item.id, number: 2 }).await.unwrap();
        assert_eq!(store.next_season_number(item.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn list_seasons_is_ordered_by_number() {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store
            .create_media_item(MediaItem::new_draft(MediaKind::Tv, "Breaking Bad"))
            .await
            .unwrap();
        store.create_season(NewSeason { item_id: item.id, number: 2 }).await.unwrap();
        store.create_season(NewSeason { item_id: item.id, number: 1 }).await.unwrap();

        let seasons = store.list_seasons_for_item(item.id).await.unwrap();
        assert_eq!(seasons.iter().map(|s| s.number).collect::<Vec<_>>(), vec![1, 2]);
    }
}
