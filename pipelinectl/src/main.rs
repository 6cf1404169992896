//! Interactive control plane: loads the pipeline database and config, then
//! drives an operator through the roll-up view, stage dispatch, organize
//! validation, and new-rip creation described by the control plane design.

mod actions;
mod app;
mod event;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use actions::{ActionContext, NextAction};
use anyhow::{Context, Result};
use app::{AppState, MessageKind, NewRipField, Screen};
use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use pipeline_config::{paths, PipelineConfig};
use pipeline_core::Dispatcher;
use pipeline_model::Stage;
use pipeline_store::SqliteStore;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

#[derive(Parser, Debug)]
#[command(name = "pipelinectl", about = "Control plane for the disc processing pipeline")]
struct Cli {
    /// Override the sqlite database path (defaults to $MEDIA_BASE/pipeline/state.db).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override the pipeline config path (defaults to $MEDIA_BASE/pipeline/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the rip/remux/transcode/publish worker binaries.
    #[arg(long)]
    binaries_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    pipeline_core::telemetry::init();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("build tokio runtime")?;
    let handle = runtime.handle().clone();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load()?,
    };

    let db_path = cli.db.unwrap_or_else(|| paths::store_path(&paths::media_base()));
    let store = handle.block_on(SqliteStore::connect(&db_path))?;

    let mut dispatcher = Dispatcher::new(store.clone(), config.clone(), db_path);
    if let Some(dir) = cli.binaries_dir {
        dispatcher = dispatcher.with_binaries_dir(dir);
    }

    let ctx = ActionContext { store, dispatcher, config, handle };

    let mut source = event::event_source_from_env()?;
    let scripted = source.is_scripted();

    let mut stdout = io::stdout();
    if !scripted {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = AppState::new();
    state.items = ctx.refresh().context("load initial pipeline state")?;

    let result = run_app(&mut terminal, &mut state, &ctx, &mut *source);

    if !scripted {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    ctx: &ActionContext,
    source: &mut dyn event::EventSource,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, state))?;

        if state.quit {
            return Ok(());
        }

        if let Some(ev) = source.next(Duration::from_millis(150))? {
            if let Event::Key(key) = ev {
                handle_key(key, state, ctx);
            }
        }
    }
}

fn handle_key(key: KeyEvent, state: &mut AppState, ctx: &ActionContext) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.quit = true;
        return;
    }

    match state.screen.clone() {
        Screen::ItemList { selected } => handle_item_list_key(key, state, ctx, selected),
        Screen::ItemDetail { item_id, selected_job } => handle_item_detail_key(key, state, ctx, item_id, selected_job),
        Screen::SeasonDetail { item_id, season_id, selected_job } => {
            handle_season_detail_key(key, state, ctx, item_id, season_id, selected_job)
        }
        Screen::OrganizeValidation { item_id, season_id, directory, result } => {
            handle_organize_validation_key(key, state, ctx, item_id, season_id, directory, result)
        }
        Screen::NewRipForm(form) => handle_new_rip_form_key(key, state, ctx, form),
    }
}

fn handle_item_list_key(key: KeyEvent, state: &mut AppState, ctx: &ActionContext, selected: usize) {
    let row_count = ui::build_rows(&state.items)
        .into_iter()
        .filter(|r| matches!(r, ui::ListRow::Item(_)))
        .count();

    match key.code {
        KeyCode::Char('q') => state.quit = true,
        KeyCode::Down => {
            let next = if row_count == 0 { 0 } else { (selected + 1).min(row_count - 1) };
            state.screen = Screen::ItemList { selected: next };
        }
        KeyCode::Up => {
            let next = selected.saturating_sub(1);
            state.screen = Screen::ItemList { selected: next };
        }
        KeyCode::Char('n') => {
            state.screen = Screen::NewRipForm(Default::default());
        }
        KeyCode::Char('r') => match ctx.refresh() {
            Ok(items) => {
                state.items = items;
                state.set_message(MessageKind::Info, "Refreshed");
            }
            Err(err) => state.set_message(MessageKind::Error, err.to_string()),
        },
        KeyCode::Enter => {
            if let Some(view) = ui::selected_item(&state.items, selected) {
                state.screen = Screen::ItemDetail { item_id: view.item.id, selected_job: 0 };
            }
        }
        _ => {}
    }
}

/// For a TV item, `selected_job` doubles as the cursor into `view.seasons`
/// (the screen never shows per-job detail yet, so there's nothing else for
/// it to index).
fn handle_item_detail_key(key: KeyEvent, state: &mut AppState, ctx: &ActionContext, item_id: pipeline_model::MediaItemId, selected_job: usize) {
    let Some(view) = state.find_item(item_id) else { return };
    let is_tv = view.item.kind == pipeline_model::MediaKind::Tv;
    let season_count = view.seasons.len();
    let season_at_cursor = view.seasons.get(selected_job).map(|s| s.id);
    let (current_stage, stage_status) = (view.item.current_stage, view.item.stage_status);

    match key.code {
        KeyCode::Esc => state.screen = Screen::ItemList { selected: 0 },
        KeyCode::Down if is_tv => {
            let next = if season_count == 0 { 0 } else { (selected_job + 1).min(season_count - 1) };
            state.screen = Screen::ItemDetail { item_id, selected_job: next };
        }
        KeyCode::Up if is_tv => {
            state.screen = Screen::ItemDetail { item_id, selected_job: selected_job.saturating_sub(1) };
        }
        KeyCode::Char('a') if is_tv => match ctx.add_season(item_id) {
            Ok(number) => {
                state.set_message(MessageKind::Success, format!("Added season {number}"));
                refresh_items(state, ctx);
            }
            Err(err) => state.set_message(MessageKind::Error, err.to_string()),
        },
        KeyCode::Enter if is_tv => {
            if let Some(season_id) = season_at_cursor {
                state.screen = Screen::SeasonDetail { item_id, season_id, selected_job: 0 };
            }
        }
        KeyCode::Char('s') => {
            if is_tv {
                if let Some(season_id) = season_at_cursor {
                    state.screen = Screen::SeasonDetail { item_id, season_id, selected_job: 0 };
                }
                return;
            }
            start_movie_next_stage(state, ctx, item_id, current_stage, stage_status);
        }
        _ => {}
    }
}

fn start_movie_next_stage(
    state: &mut AppState,
    ctx: &ActionContext,
    item_id: pipeline_model::MediaItemId,
    current_stage: Stage,
    stage_status: pipeline_model::StageStatus,
) {
    match ActionContext::next_action(current_stage, stage_status) {
        NextAction::NothingActionable => {
            state.set_message(MessageKind::Info, "Nothing actionable for this stage yet");
        }
        NextAction::NeedsOrganizeValidation => {
            let Some(view) = state.find_item(item_id) else { return };
            let (directory, _) = ctx.validate_movie_directory(&view.item.safe_name, "");
            state.screen = Screen::OrganizeValidation { item_id, season_id: None, directory, result: None };
        }
        NextAction::Dispatch(stage) => match ctx.start_movie_stage(item_id, stage) {
            Ok(()) => {
                state.set_message(MessageKind::Success, format!("Started {}", stage.display_name()));
                refresh_items(state, ctx);
            }
            Err(err) => state.set_message(MessageKind::Error, err.to_string()),
        },
    }
}

fn handle_season_detail_key(
    key: KeyEvent,
    state: &mut AppState,
    ctx: &ActionContext,
    item_id: pipeline_model::MediaItemId,
    season_id: pipeline_model::SeasonId,
    selected_job: usize,
) {
    match key.code {
        KeyCode::Esc => state.screen = Screen::ItemList { selected: 0 },
        KeyCode::Char('r') => match ctx.start_season_stage(item_id, season_id, Stage::Rip) {
            Ok(()) => {
                state.set_message(MessageKind::Success, "Started another rip disc");
                refresh_items(state, ctx);
            }
            Err(err) => state.set_message(MessageKind::Error, err.to_string()),
        },
        KeyCode::Char('c') => match ctx.mark_season_rip_complete(season_id) {
            Ok(()) => {
                state.set_message(MessageKind::Success, "Rip marked complete");
                refresh_items(state, ctx);
            }
            Err(err) => state.set_message(MessageKind::Error, err.to_string()),
        },
        KeyCode::Char('v') => {
            let Some(view) = state.find_item(item_id) else { return };
            let Some(season) = view.seasons.iter().find(|s| s.id == season_id) else { return };
            let (directory, _) = ctx.validate_season_directory(&view.item.safe_name, season.number, "");
            state.screen = Screen::OrganizeValidation { item_id, season_id: Some(season_id), directory, result: None };
        }
        KeyCode::Char('s') => {
            let Some(view) = state.find_item(item_id) else { return };
            let Some(season) = view.seasons.iter().find(|s| s.id == season_id) else { return };
            match ActionContext::next_action(season.current_stage, season.stage_status) {
                NextAction::NothingActionable => {
                    state.set_message(MessageKind::Info, "Nothing actionable for this season yet");
                }
                NextAction::NeedsOrganizeValidation => {
                    let (directory, _) = ctx.validate_season_directory(&view.item.safe_name, season.number, "");
                    state.screen = Screen::OrganizeValidation { item_id, season_id: Some(season_id), directory, result: None };
                }
                NextAction::Dispatch(stage) => match ctx.start_season_stage(item_id, season_id, stage) {
                    Ok(()) => {
                        state.set_message(MessageKind::Success, format!("Started {}", stage.display_name()));
                        refresh_items(state, ctx);
                    }
                    Err(err) => state.set_message(MessageKind::Error, err.to_string()),
                },
            }
        }
        _ => {
            let _ = selected_job;
        }
    }
}

fn handle_organize_validation_key(
    key: KeyEvent,
    state: &mut AppState,
    ctx: &ActionContext,
    item_id: pipeline_model::MediaItemId,
    season_id: Option<pipeline_model::SeasonId>,
    directory: String,
    result: Option<pipeline_core::organize_validator::ValidationResult>,
) {
    match key.code {
        KeyCode::Esc => {
            state.screen = match season_id {
                Some(season_id) => Screen::SeasonDetail { item_id, season_id, selected_job: 0 },
                None => Screen::ItemDetail { item_id, selected_job: 0 },
            };
        }
        KeyCode::Char('v') => {
            let Some(view) = state.find_item(item_id) else { return };
            let (_, new_result) = match season_id {
                Some(season_id) => {
                    let Some(season) = view.seasons.iter().find(|s| s.id == season_id) else { return };
                    ctx.validate_season_directory(&view.item.safe_name, season.number, &directory)
                }
                None => ctx.validate_movie_directory(&view.item.safe_name, &directory),
            };
            state.screen = Screen::OrganizeValidation { item_id, season_id, directory, result: Some(new_result) };
        }
        KeyCode::Char('c') => {
            let Some(result) = &result else {
                state.set_message(MessageKind::Error, "Run validation first");
                return;
            };
            if !result.valid {
                state.set_message(MessageKind::Error, "Cannot complete organization with validation errors");
                return;
            }
            let outcome = match season_id {
                Some(season_id) => ctx.mark_season_organization_completed(item_id, season_id, &directory),
                None => ctx.mark_item_organization_completed(item_id, &directory),
            };
            match outcome {
                Ok(()) => {
                    state.set_message(MessageKind::Success, "Organization marked complete");
                    refresh_items(state, ctx);
                    state.screen = match season_id {
                        Some(season_id) => Screen::SeasonDetail { item_id, season_id, selected_job: 0 },
                        None => Screen::ItemDetail { item_id, selected_job: 0 },
                    };
                }
                Err(err) => state.set_message(MessageKind::Error, err.to_string()),
            }
        }
        _ => {}
    }
}

fn handle_new_rip_form_key(key: KeyEvent, state: &mut AppState, ctx: &ActionContext, mut form: app::NewRipFormState) {
    match key.code {
        KeyCode::Esc => state.screen = Screen::ItemList { selected: 0 },
        KeyCode::Tab => {
            let fields = form.fields();
            let idx = fields.iter().position(|f| *f == form.field).unwrap_or(0);
            form.field = fields[(idx + 1) % fields.len()];
            state.screen = Screen::NewRipForm(form);
        }
        KeyCode::Char(' ') if form.field == NewRipField::Kind => {
            form.is_tv = !form.is_tv;
            state.screen = Screen::NewRipForm(form);
        }
        KeyCode::Backspace => {
            match form.field {
                NewRipField::Name => {
                    form.name.pop();
                }
                NewRipField::Season => {
                    form.season_number.pop();
                }
                _ => {}
            }
            state.screen = Screen::NewRipForm(form);
        }
        KeyCode::Char(c) => {
            match form.field {
                NewRipField::Name => form.name.push(c),
                NewRipField::Season if c.is_ascii_digit() => form.season_number.push(c),
                _ => {}
            }
            state.screen = Screen::NewRipForm(form);
        }
        KeyCode::Enter => {
            if form.field != NewRipField::Submit {
                let fields = form.fields();
                let idx = fields.iter().position(|f| *f == form.field).unwrap_or(0);
                form.field = fields[(idx + 1) % fields.len()];
                state.screen = Screen::NewRipForm(form);
                return;
            }
            submit_new_rip(state, ctx, form);
        }
        _ => {}
    }
}

fn submit_new_rip(state: &mut AppState, ctx: &ActionContext, form: app::NewRipFormState) {
    if form.name.trim().is_empty() {
        state.set_message(MessageKind::Error, "Name is required");
        state.screen = Screen::NewRipForm(form);
        return;
    }
    let season_number: u32 = if form.is_tv {
        match form.season_number.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                state.set_message(MessageKind::Error, "Season must be a number");
                state.screen = Screen::NewRipForm(form);
                return;
            }
        }
    } else {
        0
    };

    match ctx.submit_new_rip(form.is_tv, form.name.trim(), season_number) {
        Ok(()) => {
            state.set_message(MessageKind::Success, "Rip job started");
            refresh_items(state, ctx);
            state.screen = Screen::ItemList { selected: 0 };
        }
        Err(err) => {
            state.set_message(MessageKind::Error, err.to_string());
            state.screen = Screen::NewRipForm(form);
        }
    }
}

fn refresh_items(state: &mut AppState, ctx: &ActionContext) {
    if let Ok(items) = ctx.refresh() {
        state.items = items;
    }
}
