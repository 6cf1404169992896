//! Source of key/input events so the TUI can be driven headlessly in tests.
//! Mirrors the line-oriented scripted-input pattern used elsewhere in this
//! ecosystem for TUI integration tests: a `PIPELINECTL_TUI_SCRIPT` env var
//! points at a file of tokens, one per line, that stand in for keystrokes.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

pub trait EventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<Event>>;
    fn is_scripted(&self) -> bool {
        false
    }
}

pub struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Scripted event source driven by a simple line-oriented DSL:
///   down|up|left|right|enter|esc|q|tab|space|type:<text>|char:<c>
/// Lines beginning with `#` are ignored; blank lines are skipped. Once
/// events run out we fail after a short grace period rather than hang.
#[derive(Debug)]
pub struct ScriptEventSource {
    events: Vec<Event>,
    cursor: usize,
    exhausted_at: Option<Instant>,
    trace: Option<File>,
}

impl ScriptEventSource {
    pub fn from_path(path: PathBuf, trace_path: Option<PathBuf>) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).context("read scripted TUI input")?;
        let mut events = Vec::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut push_key = |code: KeyCode, modifiers: KeyModifiers| {
                events.push(Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    state: KeyEventState::NONE,
                }));
            };

            match line {
                "down" | "j" => push_key(KeyCode::Down, KeyModifiers::NONE),
                "up" | "k" => push_key(KeyCode::Up, KeyModifiers::NONE),
                "left" | "h" => push_key(KeyCode::Left, KeyModifiers::NONE),
                "right" | "l" => push_key(KeyCode::Right, KeyModifiers::NONE),
                "enter" => push_key(KeyCode::Enter, KeyModifiers::NONE),
                "esc" => push_key(KeyCode::Esc, KeyModifiers::NONE),
                "tab" => push_key(KeyCode::Tab, KeyModifiers::NONE),
                "space" => push_key(KeyCode::Char(' '), KeyModifiers::NONE),
                "backspace" => push_key(KeyCode::Backspace, KeyModifiers::NONE),
                "q" | "quit" => push_key(KeyCode::Char('q'), KeyModifiers::NONE),
                _ => {
                    if let Some(rest) = line.strip_prefix("type:") {
                        for ch in rest.chars() {
                            push_key(KeyCode::Char(ch), KeyModifiers::NONE);
                        }
                    } else if let Some(rest) = line.strip_prefix("char:") {
                        let ch = rest.chars().next().ok_or_else(|| {
                            anyhow!("empty char: token at line {}", idx + 1)
                        })?;
                        push_key(KeyCode::Char(ch), KeyModifiers::NONE);
                    } else {
                        return Err(anyhow!(
                            "unrecognized TUI script token at line {}: {}",
                            idx + 1,
                            line
                        ));
                    }
                }
            }
        }

        let trace = trace_path.map(|p| File::create(p).context("create tui trace file")).transpose()?;
        Ok(Self { events, cursor: 0, exhausted_at: None, trace })
    }
}

impl EventSource for ScriptEventSource {
    fn next(&mut self, _timeout: Duration) -> Result<Option<Event>> {
        if self.cursor >= self.events.len() {
            match self.exhausted_at {
                Some(start) if start.elapsed() > Duration::from_secs(1) => {
                    return Err(anyhow!("scripted TUI input exhausted before the app exited"));
                }
                Some(_) => {}
                None => self.exhausted_at = Some(Instant::now()),
            }
            std::thread::sleep(Duration::from_millis(25));
            return Ok(None);
        }

        let ev = self.events[self.cursor].clone();
        self.cursor += 1;
        if let Some(trace) = self.trace.as_mut() {
            let _ = writeln!(trace, "{ev:?}");
        }
        Ok(Some(ev))
    }

    fn is_scripted(&self) -> bool {
        true
    }
}

pub fn event_source_from_env() -> Result<Box<dyn EventSource>> {
    if let Ok(path) = std::env::var("PIPELINECTL_TUI_SCRIPT") {
        let trace = std::env::var("PIPELINECTL_TUI_TRACE").ok();
        let src = ScriptEventSource::from_path(PathBuf::from(path), trace.map(PathBuf::from))?;
        Ok(Box::new(src))
    } else {
        Ok(Box::new(CrosstermEventSource))
    }
}
