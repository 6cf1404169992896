//! In-memory application state for the control plane: the cached item list,
//! which screen is active, and the current status line. Nothing here does
//! I/O directly — refresh and dispatch happen in `actions`.

use pipeline_core::{ItemView, RollupCategory};
use pipeline_model::{MediaItemId, SeasonId};

/// A movie's own `(current_stage, stage_status)` mapped onto the same
/// five-bucket vocabulary TV roll-up uses, so the item list can group both
/// kinds under one set of headers.
pub fn display_category(view: &ItemView) -> RollupCategory {
    use pipeline_model::{Stage, StageStatus};

    if let Some(rollup) = view.rollup {
        return rollup;
    }

    let item = &view.item;
    match item.stage_status {
        StageStatus::Failed => RollupCategory::Failed,
        StageStatus::InProgress => RollupCategory::InProgress,
        StageStatus::Pending if item.current_stage == Stage::Rip => RollupCategory::NotStarted,
        StageStatus::Pending => RollupCategory::InProgress,
        StageStatus::Completed if item.current_stage == Stage::Publish => RollupCategory::Done,
        StageStatus::Completed => RollupCategory::NeedsAction,
    }
}

pub fn category_label(category: RollupCategory) -> &'static str {
    match category {
        RollupCategory::Failed => "Failed",
        RollupCategory::InProgress => "In progress",
        RollupCategory::NeedsAction => "Needs action",
        RollupCategory::Done => "Done",
        RollupCategory::NotStarted => "Not started",
    }
}

/// Stable grouping order: the operator's attention should land on failures
/// first, then live work, then the stage that's waiting on them.
pub const CATEGORY_ORDER: [RollupCategory; 5] = [
    RollupCategory::Failed,
    RollupCategory::InProgress,
    RollupCategory::NeedsAction,
    RollupCategory::Done,
    RollupCategory::NotStarted,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewRipFormState {
    pub is_tv: bool,
    pub name: String,
    pub season_number: String,
    pub field: NewRipField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewRipField {
    #[default]
    Kind,
    Name,
    Season,
    Submit,
}

impl NewRipFormState {
    pub fn fields(&self) -> Vec<NewRipField> {
        if self.is_tv {
            vec![NewRipField::Kind, NewRipField::Name, NewRipField::Season, NewRipField::Submit]
        } else {
            vec![NewRipField::Kind, NewRipField::Name, NewRipField::Submit]
        }
    }
}

#[derive(Debug, Clone)]
pub enum Screen {
    /// Flat, grouped list of every item. `selected` indexes into the
    /// flattened (header-skipping) row list built at render time.
    ItemList { selected: usize },
    ItemDetail { item_id: MediaItemId, selected_job: usize },
    SeasonDetail { item_id: MediaItemId, season_id: SeasonId, selected_job: usize },
    OrganizeValidation {
        item_id: MediaItemId,
        season_id: Option<SeasonId>,
        directory: String,
        result: Option<pipeline_core::organize_validator::ValidationResult>,
    },
    NewRipForm(NewRipFormState),
}

pub struct AppState {
    pub items: Vec<ItemView>,
    pub screen: Screen,
    pub message: Option<StatusMessage>,
    pub quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self { items: Vec::new(), screen: Screen::ItemList { selected: 0 }, message: None, quit: false }
    }

    pub fn set_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message = Some(StatusMessage { kind, text: text.into() });
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn find_item(&self, id: MediaItemId) -> Option<&ItemView> {
        self.items.iter().find(|v| v.item.id == id)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pipeline_model::{ItemStatus, MediaItem, MediaKind, Stage, StageStatus};

    fn movie(stage: Stage, stage_status: StageStatus) -> ItemView {
        let now = Utc::now();
        ItemView {
            item: MediaItem {
                id: MediaItemId::from(1),
                kind: MediaKind::Movie,
                name: "The Wire".to_string(),
                safe_name: "The_Wire".to_string(),
                tmdb_id: None,
                tvdb_id: None,
                item_status: ItemStatus::Active,
                current_stage: stage,
                stage_status,
                created_at: now,
                updated_at: now,
            },
            seasons: Vec::new(),
            rollup: None,
        }
    }

    #[test]
    fn failed_movie_groups_under_failed_regardless_of_stage() {
        assert_eq!(display_category(&movie(Stage::Transcode, StageStatus::Failed)), RollupCategory::Failed);
    }

    #[test]
    fn fresh_movie_is_not_started() {
        assert_eq!(display_category(&movie(Stage::Rip, StageStatus::Pending)), RollupCategory::NotStarted);
    }

    #[test]
    fn movie_pending_past_rip_is_in_progress() {
        assert_eq!(display_category(&movie(Stage::Remux, StageStatus::Pending)), RollupCategory::InProgress);
    }

    #[test]
    fn movie_completed_through_publish_is_done() {
        assert_eq!(display_category(&movie(Stage::Publish, StageStatus::Completed)), RollupCategory::Done);
    }

    #[test]
    fn movie_completed_before_publish_needs_action() {
        assert_eq!(display_category(&movie(Stage::Remux, StageStatus::Completed)), RollupCategory::NeedsAction);
    }

    #[test]
    fn tv_item_defers_to_its_season_rollup() {
        let mut view = movie(Stage::Rip, StageStatus::Pending);
        view.rollup = Some(RollupCategory::Done);
        assert_eq!(display_category(&view), RollupCategory::Done);
    }

    #[test]
    fn new_rip_form_fields_include_season_only_for_tv() {
        let movie_form = NewRipFormState { is_tv: false, ..Default::default() };
        assert_eq!(movie_form.fields(), vec![NewRipField::Kind, NewRipField::Name, NewRipField::Submit]);

        let tv_form = NewRipFormState { is_tv: true, ..Default::default() };
        assert_eq!(tv_form.fields(), vec![NewRipField::Kind, NewRipField::Name, NewRipField::Season, NewRipField::Submit]);
    }
}
