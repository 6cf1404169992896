//! Structural checks on an operator-organized ripped directory (C5), run
//! before the remux stage is permitted to start.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pipeline_model::MediaKind;
use regex::Regex;

pub const EXTRA_CATEGORIES: &[&str] = &[
    "behind the scenes",
    "deleted scenes",
    "featurettes",
    "interviews",
    "scenes",
    "shorts",
    "trailers",
    "other",
];

fn episode_filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{2})(?:-(\d{2}))?(?:_.*)?\.mkv$").expect("static pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate one disc's organized output tree. Returns the result plus any
/// episode ordinals found, so season-level validation can union them.
pub fn validate_disc(root: &Path, kind: MediaKind) -> (ValidationResult, Vec<u32>) {
    let mut errors = Vec::new();
    let warnings = Vec::new();
    let mut episode_numbers = Vec::new();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            errors.push(format!("cannot read {}: {err}", root.display()));
            return (ValidationResult { valid: false, errors, warnings }, episode_numbers);
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        errors.push(format!("unexpected entry at root: {name}"));
    }

    let content_dir_name = match kind {
        MediaKind::Movie => "_main",
        MediaKind::Tv => "_episodes",
    };
    let content_dir = root.join(content_dir_name);
    if !content_dir.is_dir() {
        errors.push(format!("missing required directory {content_dir_name}/"));
    } else {
        let mkvs = list_mkv_filenames(&content_dir);
        if mkvs.is_empty() {
            errors.push(format!("{content_dir_name}/ contains no .mkv files"));
        }
        if kind == MediaKind::Tv {
            for filename in &mkvs {
                match episode_filename_pattern().captures(filename) {
                    Some(caps) => {
                        if let Some(first) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                            episode_numbers.push(first);
                        }
                        if let Some(second) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
                            episode_numbers.push(second);
                        }
                    }
                    None => errors.push(format!(
                        "{content_dir_name}/{filename} does not match the NN[-MM]_....mkv naming convention"
                    )),
                }
            }
        }
    }

    let extras_dir = root.join("_extras");
    if extras_dir.is_dir() {
        for entry in std::fs::read_dir(&extras_dir).into_iter().flatten().flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let category = entry.file_name().to_string_lossy().into_owned();
            if !EXTRA_CATEGORIES.contains(&category.as_str()) {
                errors.push(format!("_extras/{category} is not a recognized category"));
            }
        }
    }

    let valid = errors.is_empty();
    (ValidationResult { valid, errors, warnings }, episode_numbers)
}

/// Validate a TV season spanning one or more disc directories: each disc is
/// checked individually, then episode numbers are unioned across discs.
/// Gaps in the union are warnings; duplicate numbers across discs (e.g. an
/// alternate cut on a bonus disc) are permitted and produce nothing.
pub fn validate_season(disc_roots: &[PathBuf]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut all_numbers = BTreeSet::new();

    for disc_root in disc_roots {
        let (result, numbers) = validate_disc(disc_root, MediaKind::Tv);
        errors.extend(result.errors);
        warnings.extend(result.warnings);
        all_numbers.extend(numbers);
    }

    if errors.is_empty() {
        if let (Some(&min), Some(&max)) = (all_numbers.iter().next(), all_numbers.iter().next_back()) {
            for n in min..=max {
                if !all_numbers.contains(&n) {
                    warnings.push(format!("season is missing episode {n:02}"));
                }
            }
        }
    }

    ValidationResult { valid: errors.is_empty(), errors, warnings }
}

/// Lay down the empty directory scaffolding a fresh rip leaves for the
/// operator to organize into: `_discarded/`, one `_extras/<category>/` per
/// fixed category, the content directory for `kind`, and a `_REVIEW.txt`
/// naming the title for manual reference.
pub fn emit_rip_scaffolding(
    root: &Path,
    kind: MediaKind,
    title: &str,
    season: Option<u32>,
    disc: u32,
) -> std::io::Result<()> {
    std::fs::create_dir_all(root.join("_discarded"))?;
    for category in EXTRA_CATEGORIES {
        std::fs::create_dir_all(root.join("_extras").join(category))?;
    }
    let content_dir = match kind {
        MediaKind::Movie => "_main",
        MediaKind::Tv => "_episodes",
    };
    std::fs::create_dir_all(root.join(content_dir))?;

    let mut review = format!("{title}\n");
    if let Some(season) = season {
        review.push_str(&format!("Season {season:02}\n"));
    }
    review.push_str(&format!("Disc {disc}\n"));
    std::fs::write(root.join("_REVIEW.txt"), review)?;
    Ok(())
}

fn list_mkv_filenames(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("mkv"))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
