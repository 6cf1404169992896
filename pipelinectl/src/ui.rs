//! Rendering for every screen. Pure function of `AppState`; no I/O, no
//! mutation — `main`'s event loop is the only thing allowed to change state.

use pipeline_core::organize_validator::ValidationResult;
use pipeline_core::{ItemView, RollupCategory};
use pipeline_model::MediaKind;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{category_label, display_category, AppState, MessageKind, NewRipField, Screen, CATEGORY_ORDER};

/// One navigable row in the item list: either a category header or an item.
pub enum ListRow<'a> {
    Header(RollupCategory),
    Item(&'a ItemView),
}

/// Flatten items into header+item rows, grouped and ordered by
/// `CATEGORY_ORDER`. `selected` is an index into the `Item` rows only so
/// callers don't need to special-case header skipping when moving the
/// cursor.
pub fn build_rows(items: &[ItemView]) -> Vec<ListRow<'_>> {
    let mut rows = Vec::new();
    for category in CATEGORY_ORDER {
        let group: Vec<&ItemView> = items.iter().filter(|v| display_category(v) == category).collect();
        if group.is_empty() {
            continue;
        }
        rows.push(ListRow::Header(category));
        rows.extend(group.into_iter().map(ListRow::Item));
    }
    rows
}

pub fn selected_item<'a>(items: &'a [ItemView], selected: usize) -> Option<&'a ItemView> {
    build_rows(items)
        .into_iter()
        .filter_map(|row| match row {
            ListRow::Item(v) => Some(v),
            ListRow::Header(_) => None,
        })
        .nth(selected)
}

pub fn render(f: &mut Frame, app: &AppState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(f.size());

    match &app.screen {
        Screen::ItemList { selected } => render_item_list(f, vertical[0], &app.items, *selected),
        Screen::ItemDetail { item_id, selected_job } => {
            render_item_detail(f, vertical[0], app.find_item(*item_id), *selected_job)
        }
        Screen::SeasonDetail { item_id, season_id, selected_job } => {
            render_season_detail(f, vertical[0], app.find_item(*item_id), *season_id, *selected_job)
        }
        Screen::OrganizeValidation { directory, result, .. } => render_organize_validation(f, vertical[0], directory, result.as_ref()),
        Screen::NewRipForm(form) => render_new_rip_form(f, vertical[0], form),
    }

    render_status_bar(f, vertical[1], app);
}

fn render_item_list(f: &mut Frame, area: ratatui::layout::Rect, items: &[ItemView], selected: usize) {
    let mut list_items: Vec<ListItem> = Vec::new();
    let mut highlight_row = None;
    let mut item_rows_seen = 0usize;

    for row in build_rows(items) {
        match row {
            ListRow::Header(category) => {
                list_items.push(ListItem::new(Line::from(Span::styled(
                    category_label(category),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))));
            }
            ListRow::Item(view) => {
                if item_rows_seen == selected {
                    highlight_row = Some(list_items.len());
                }
                item_rows_seen += 1;

                let kind = match view.item.kind {
                    MediaKind::Movie => "movie",
                    MediaKind::Tv => "tv",
                };
                let stage = match view.rollup {
                    Some(_) => format!("{} seasons", view.seasons.len()),
                    None => format!("{} / {:?}", view.item.current_stage.display_name(), view.item.stage_status),
                };
                let text = format!("  [{kind}] {:<40} {stage}", view.item.name);
                list_items.push(ListItem::new(text));
            }
        }
    }

    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title("Items — Enter: open, n: new rip, q: quit"))
        .highlight_style(Style::new().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(highlight_row);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_item_detail(f: &mut Frame, area: ratatui::layout::Rect, view: Option<&ItemView>, selected_job: usize) {
    let Some(view) = view else {
        f.render_widget(Paragraph::new("Item not found").block(Block::default().borders(Borders::ALL)), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(view.item.name.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        Line::from(format!("safe name: {}", view.item.safe_name)),
    ];

    if view.item.kind == MediaKind::Tv {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Seasons (a: add, Enter: open):", Style::default().add_modifier(Modifier::BOLD))));
        if view.seasons.is_empty() {
            lines.push(Line::from("  (none yet — press a)"));
        }
        for (idx, season) in view.seasons.iter().enumerate() {
            let marker = if idx == selected_job { "> " } else { "  " };
            lines.push(Line::from(format!(
                "{marker}S{:02}  {} ({:?})",
                season.number,
                season.current_stage.display_name(),
                season.stage_status
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from("Esc: back"));
    } else {
        lines.push(Line::from(format!("stage: {} ({:?})", view.item.current_stage.display_name(), view.item.stage_status)));
        lines.push(Line::default());
        lines.push(Line::from("s: start/retry stage  Esc: back"));
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Item detail")).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_season_detail(
    f: &mut Frame,
    area: ratatui::layout::Rect,
    view: Option<&ItemView>,
    season_id: pipeline_model::SeasonId,
    _selected_job: usize,
) {
    let Some(view) = view else {
        f.render_widget(Paragraph::new("Item not found").block(Block::default().borders(Borders::ALL)), area);
        return;
    };
    let Some(season) = view.seasons.iter().find(|s| s.id == season_id) else {
        f.render_widget(Paragraph::new("Season not found").block(Block::default().borders(Borders::ALL)), area);
        return;
    };

    let lines = vec![
        Line::from(Span::styled(format!("{} — Season {}", view.item.name, season.number), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        Line::from(format!("stage: {} ({:?})", season.current_stage.display_name(), season.stage_status)),
        Line::default(),
        Line::from("r: rip another disc  c: mark rip complete  v: validate organization  s: start/retry stage  Esc: back"),
    ];

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Season detail")).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_organize_validation(f: &mut Frame, area: ratatui::layout::Rect, directory: &str, result: Option<&ValidationResult>) {
    let mut lines = vec![
        Line::from(Span::styled("Directory:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(directory.to_string()),
        Line::default(),
    ];

    match result {
        None => lines.push(Line::from("Press v to run validation.")),
        Some(result) => {
            let verdict = if result.valid {
                Span::styled("VALID", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::styled("INVALID", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            };
            lines.push(Line::from(verdict));
            lines.push(Line::default());
            if !result.errors.is_empty() {
                lines.push(Line::from(Span::styled("Errors:", Style::default().fg(Color::Red))));
                for err in &result.errors {
                    lines.push(Line::from(format!("  - {err}")));
                }
            }
            if !result.warnings.is_empty() {
                lines.push(Line::from(Span::styled("Warnings:", Style::default().fg(Color::Yellow))));
                for warn in &result.warnings {
                    lines.push(Line::from(format!("  - {warn}")));
                }
            }
            if result.valid {
                lines.push(Line::default());
                lines.push(Line::from("Press c to mark organization complete."));
            }
        }
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Organize validation — v: run, c: mark complete, Esc: back")).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_new_rip_form(f: &mut Frame, area: ratatui::layout::Rect, form: &crate::app::NewRipFormState) {
    let field_style = |field: NewRipField| {
        if field == form.field {
            Style::default().bg(Color::Cyan).fg(Color::Black)
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(Span::styled("New rip", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        Line::default(),
        Line::from(vec![
            Span::raw("Kind:    "),
            Span::styled(if form.is_tv { "tv" } else { "movie" }, field_style(NewRipField::Kind)),
            Span::raw("  (space to toggle)"),
        ]),
        Line::from(vec![Span::raw("Name:    "), Span::styled(form.name.clone(), field_style(NewRipField::Name))]),
    ];
    if form.is_tv {
        lines.push(Line::from(vec![Span::raw("Season:  "), Span::styled(form.season_number.clone(), field_style(NewRipField::Season))]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("[ Submit ]", field_style(NewRipField::Submit))));
    lines.push(Line::default());
    lines.push(Line::from("Tab: next field  Enter: submit on Submit, else advance  Esc: cancel"));

    f.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Start a new rip")).wrap(Wrap { trim: true }), area);
}

fn render_status_bar(f: &mut Frame, area: ratatui::layout::Rect, app: &AppState) {
    let (text, style) = match &app.message {
        Some(msg) => {
            let style = match msg.kind {
                MessageKind::Info => Style::default().fg(Color::Gray),
                MessageKind::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                MessageKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            (msg.text.clone(), style)
        }
        None => ("q: quit  Esc: back  Enter: open/confirm".to_string(), Style::default().fg(Color::DarkGray)),
    };

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(text, style))).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
