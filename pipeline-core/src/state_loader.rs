//! Reads the store and rolls TV season state up into a display model (C9).
//! No caching: every call re-reads, trading a little redundant I/O for
//! always-fresh results at the library sizes this system targets.

use pipeline_model::{MediaItem, MediaKind, Season, Stage, StageStatus};
use pipeline_store::SqliteStore;

use crate::error::Result;

/// The show-level category a multi-season TV item rolls up to, per the
/// roll-up table: failed seasons dominate, then any in-progress or a mix of
/// completed-and-pending, then needs_action/done/not_started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupCategory {
    Failed,
    InProgress,
    NeedsAction,
    Done,
    NotStarted,
}

pub fn rollup_category(seasons: &[Season]) -> RollupCategory {
    if seasons.is_empty() {
        return RollupCategory::NotStarted;
    }
    if seasons.iter().any(|s| s.stage_status == StageStatus::Failed) {
        return RollupCategory::Failed;
    }
    if seasons.iter().any(|s| s.stage_status == StageStatus::InProgress) {
        return RollupCategory::InProgress;
    }
    let any_completed_non_publish =
        seasons.iter().any(|s| s.stage_status == StageStatus::Completed && s.current_stage != Stage::Publish);
    let any_pending = seasons.iter().any(|s| s.stage_status == StageStatus::Pending);
    if any_completed_non_publish && any_pending {
        return RollupCategory::InProgress;
    }
    if seasons.iter().all(|s| s.stage_status == StageStatus::Completed && s.current_stage != Stage::Publish) {
        return RollupCategory::NeedsAction;
    }
    if seasons.iter().all(|s| s.stage_status == StageStatus::Completed && s.current_stage == Stage::Publish) {
        return RollupCategory::Done;
    }
    RollupCategory::NotStarted
}

/// A movie's own `(current_stage, stage_status)` already is its display
/// state; a TV show additionally carries its seasons and their roll-up.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: MediaItem,
    pub seasons: Vec<Season>,
    pub rollup: Option<RollupCategory>,
}

pub struct StateLoader<'a> {
    store: &'a SqliteStore,
}

impl<'a> StateLoader<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    pub async fn load_items(&self) -> Result<Vec<ItemView>> {
        let items = self.store.list_media_items().await?;
        let mut views = Vec::with_capacity(items.len());
        for item in items {
            let (seasons, rollup) = match item.kind {
                MediaKind::Movie => (Vec::new(), None),
                MediaKind::Tv => {
                    let seasons = self.store.list_seasons_for_item(item.id).await?;
                    let rollup = Some(rollup_category(&seasons));
                    (seasons, rollup)
                }
            };
            views.push(ItemView { item, seasons, rollup });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pipeline_model::SeasonId;

    use super::*;

    fn season(current_stage: Stage, stage_status: StageStatus) -> Season {
        Season {
            id: SeasonId(1),
            item_id: pipeline_model::MediaItemId(1),
            number: 1,
            current_stage,
            stage_status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn mixed_completed_and_pending_rolls_up_to_in_progress() {
        let seasons = vec![
            season(Stage::Remux, StageStatus::Completed),
            season(Stage::Rip, StageStatus::Pending),
        ];
        assert!(matches!(rollup_category(&seasons), RollupCategory::InProgress));
    }

    #[test]
    fn all_published_rolls_up_to_done() {
        let seasons = vec![
            season(Stage::Publish, StageStatus::Completed),
            season(Stage::Publish, StageStatus::Completed),
        ];
        assert!(matches!(rollup_category(&seasons), RollupCategory::Done));
    }

    #[test]
    fn any_failed_season_dominates() {
        let seasons = vec![
            season(Stage::Publish, StageStatus::Completed),
            season(Stage::Remux, StageStatus::Failed),
        ];
        assert!(matches!(rollup_category(&seasons), RollupCategory::Failed));
    }

    #[test]
    fn all_completed_before_publish_needs_action() {
        let seasons = vec![season(Stage::Transcode, StageStatus::Completed)];
        assert!(matches!(rollup_category(&seasons), RollupCategory::NeedsAction));
    }
}
