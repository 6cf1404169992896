//! Wires operator keystrokes to the single Dispatcher operation each one
//! maps to (C10's action list), plus the read-side refresh that follows.
//! Every action here is synchronous to the caller: the TUI's draw loop is
//! not async, so each call blocks on the shared Tokio runtime handle.

use std::path::PathBuf;

use anyhow::Result;
use pipeline_config::paths::StagingLayout;
use pipeline_config::PipelineConfig;
use pipeline_core::organize_validator::{self, ValidationResult};
use pipeline_core::{Dispatcher, StateLoader};
use pipeline_model::{MediaItem, MediaItemId, MediaKind, NewSeason, SeasonId, Stage};
use pipeline_store::SqliteStore;
use tokio::runtime::Handle;

/// Result of deciding what a "start next stage" keypress should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    NothingActionable,
    NeedsOrganizeValidation,
    Dispatch(Stage),
}

pub struct ActionContext {
    pub store: SqliteStore,
    pub dispatcher: Dispatcher,
    pub config: PipelineConfig,
    pub handle: Handle,
}

impl ActionContext {
    pub fn refresh(&self) -> Result<Vec<pipeline_core::ItemView>> {
        self.handle.block_on(async { StateLoader::new(&self.store).load_items().await }).map_err(Into::into)
    }

    /// The stage a "start next stage" press should launch for `(current_stage,
    /// stage_status)`: retry on failure, otherwise advance past a completed
    /// stage. Returns `None` when nothing is actionable (already active, or
    /// already terminal).
    pub fn next_actionable_stage(current_stage: Stage, stage_status: pipeline_model::StageStatus) -> Option<Stage> {
        use pipeline_model::StageStatus;
        match stage_status {
            StageStatus::Failed => Some(current_stage),
            StageStatus::Completed => current_stage.next(),
            StageStatus::Pending | StageStatus::InProgress => None,
        }
    }

    /// What a "start next stage" press should do, folding in the rule that
    /// Organize has no worker binary ([`Dispatcher::binary_name`]) and must be
    /// driven through the validation screen instead of dispatched directly.
    pub fn next_action(current_stage: Stage, stage_status: pipeline_model::StageStatus) -> NextAction {
        match Self::next_actionable_stage(current_stage, stage_status) {
            None => NextAction::NothingActionable,
            Some(Stage::Organize) => NextAction::NeedsOrganizeValidation,
            Some(stage) => NextAction::Dispatch(stage),
        }
    }

    pub fn start_movie_stage(&self, item_id: MediaItemId, stage: Stage) -> Result<()> {
        self.handle.block_on(async { self.dispatcher.start_stage_for_movie(item_id, stage).await })?;
        Ok(())
    }

    pub fn start_season_stage(&self, item_id: MediaItemId, season_id: SeasonId, stage: Stage) -> Result<()> {
        self.handle.block_on(async { self.dispatcher.start_stage_for_season(item_id, season_id, stage).await })?;
        Ok(())
    }

    pub fn add_season(&self, item_id: MediaItemId) -> Result<u32> {
        let season = self.handle.block_on(async { self.dispatcher.add_season(item_id).await })?;
        Ok(season.number)
    }

    pub fn mark_season_rip_complete(&self, season_id: SeasonId) -> Result<()> {
        self.handle.block_on(async { self.dispatcher.mark_season_rip_complete(season_id).await })?;
        Ok(())
    }

    pub fn mark_item_organization_completed(&self, item_id: MediaItemId, dir: &str) -> Result<()> {
        self.handle.block_on(async {
            self.dispatcher.mark_item_organization_completed(item_id, std::path::Path::new(dir)).await
        })?;
        Ok(())
    }

    pub fn mark_season_organization_completed(&self, item_id: MediaItemId, season_id: SeasonId, dir: &str) -> Result<()> {
        self.handle.block_on(async {
            self.dispatcher.mark_season_organization_completed(item_id, season_id, std::path::Path::new(dir)).await
        })?;
        Ok(())
    }

    /// Validate a movie's ripped directory, defaulting `directory` to the
    /// staging convention's path when the operator leaves it blank.
    pub fn validate_movie_directory(&self, safe_name: &str, directory: &str) -> (String, ValidationResult) {
        let dir = self.resolve_directory(directory, || {
            StagingLayout::new(self.config.staging_base.clone()).ripped_movie_dir(safe_name)
        });
        let (result, _numbers) = organize_validator::validate_disc(std::path::Path::new(&dir), MediaKind::Movie);
        (dir, result)
    }

    /// Validate a TV season across every `Disc<k>/` directory the rip stage
    /// has produced so far, unioning episode numbers per §4.5.
    pub fn validate_season_directory(&self, safe_name: &str, season_number: u32, directory: &str) -> (String, ValidationResult) {
        let dir = self.resolve_directory(directory, || {
            StagingLayout::new(self.config.staging_base.clone()).ripped_tv_season_dir(safe_name, season_number)
        });
        let result = match list_disc_dirs(std::path::Path::new(&dir)) {
            Ok(disc_roots) => organize_validator::validate_season(&disc_roots),
            Err(err) => ValidationResult { valid: false, errors: vec![format!("cannot read {dir}: {err}")], warnings: Vec::new() },
        };
        (dir, result)
    }

    fn resolve_directory(&self, directory: &str, default: impl FnOnce() -> PathBuf) -> String {
        if directory.trim().is_empty() {
            default().display().to_string()
        } else {
            directory.to_string()
        }
    }

    /// Create (or find) the `MediaItem` for the new-rip form, plus season 1
    /// for a fresh TV show, then dispatch the first rip job.
    pub fn submit_new_rip(&self, is_tv: bool, name: &str, season_number: u32) -> Result<()> {
        let kind = if is_tv { MediaKind::Tv } else { MediaKind::Movie };
        let item = self.handle.block_on(async {
            let draft = MediaItem::new_draft(kind, name);
            match self.store.find_media_item_by_safe_name(&draft.safe_name).await? {
                Some(existing) if existing.kind == kind => Ok::<_, anyhow::Error>(existing),
                Some(existing) => anyhow::bail!(
                    "\"{}\" already exists as a {:?}; pick a different name for this {:?}",
                    name,
                    existing.kind,
                    kind
                ),
                None => Ok(self.store.create_media_item(draft).await?),
            }
        })?;

        if is_tv {
            let season = self.handle.block_on(async {
                let existing = self
                    .store
                    .list_seasons_for_item(item.id)
                    .await?
                    .into_iter()
                    .find(|s| s.number == season_number);
                match existing {
                    Some(s) => Ok::<_, pipeline_store::StoreError>(s),
                    None => self.store.create_season(NewSeason { item_id: item.id, number: season_number }).await,
                }
            })?;
            self.start_season_stage(item.id, season.id, Stage::Rip)
        } else {
            self.start_movie_stage(item.id, Stage::Rip)
        }
    }
}

fn list_disc_dirs(season_root: &std::path::Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(season_root)?
        .filter_map(|entry| entry.ok())
        .filter(|e| e.path().is_dir() && e.file_name().to_string_lossy().starts_with("Disc"))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_model::StageStatus;

    #[test]
    fn failed_stage_is_retried_in_place() {
        assert_eq!(
            ActionContext::next_actionable_stage(Stage::Remux, StageStatus::Failed),
            Some(Stage::Remux)
        );
    }

    #[test]
    fn completed_stage_advances_to_the_next_one() {
        assert_eq!(
            ActionContext::next_actionable_stage(Stage::Rip, StageStatus::Completed),
            Some(Stage::Organize)
        );
    }

    #[test]
    fn completed_publish_has_nothing_left_to_do() {
        assert_eq!(ActionContext::next_actionable_stage(Stage::Publish, StageStatus::Completed), None);
    }

    #[test]
    fn in_progress_or_pending_stage_is_not_actionable() {
        assert_eq!(ActionContext::next_actionable_stage(Stage::Rip, StageStatus::InProgress), None);
        assert_eq!(ActionContext::next_actionable_stage(Stage::Rip, StageStatus::Pending), None);
    }

    #[test]
    fn next_action_routes_organize_to_validation_instead_of_dispatch() {
        assert_eq!(ActionContext::next_action(Stage::Rip, StageStatus::Completed), NextAction::NeedsOrganizeValidation);
    }

    #[test]
    fn next_action_dispatches_other_stages_directly() {
        assert_eq!(ActionContext::next_action(Stage::Organize, StageStatus::Completed), NextAction::Dispatch(Stage::Remux));
        assert_eq!(ActionContext::next_action(Stage::Remux, StageStatus::Failed), NextAction::Dispatch(Stage::Remux));
    }

    #[test]
    fn list_disc_dirs_sorts_and_filters_non_disc_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Disc2")).unwrap();
        std::fs::create_dir(dir.path().join("Disc1")).unwrap();
        std::fs::create_dir(dir.path().join("_REVIEW")).unwrap();
        std::fs::write(dir.path().join("Disc3.txt"), "not a dir").unwrap();

        let dirs = list_disc_dirs(dir.path()).unwrap();
        let names: Vec<_> = dirs.iter().map(|p| p.file_name().unwrap().to_str().unwrap().to_string()).collect();
        assert_eq!(names, vec!["Disc1", "Disc2"]);
    }

    #[test]
    fn list_disc_dirs_reports_an_unreadable_directory_instead_of_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(list_disc_dirs(&missing).is_err());
    }
}
