use std::io;
use std::path::{Path, PathBuf};

use pipeline_model::MediaKind;

fn content_dir_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "_main",
        MediaKind::Tv => "_episodes",
    }
}

/// `.mkv` files under a single `_main/` or `_episodes/` directory, as paths
/// relative to `root`. Used by the transcode and publish workers, whose
/// input has already been merged into one tree by the prior stage.
pub fn discover_organized_mkvs(root: &Path, kind: MediaKind) -> io::Result<Vec<String>> {
    let content_dir = content_dir_name(kind);
    let dir = root.join(content_dir);
    let mut out = Vec::new();
    if dir.is_dir() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("mkv") {
                out.push(format!("{content_dir}/{}", entry.file_name().to_string_lossy()));
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Remux's input discovery. For a movie this is just `_main/`; for a TV
/// season it walks every `Disc<k>/` directory under the season root and
/// merges their `_episodes/` contents, treating a season's discs as one
/// logical input. Returns the relative output path (mirroring the merged
/// single-tree output layout) paired with the absolute source file it came
/// from.
pub fn discover_remux_sources(input_dir: &Path, kind: MediaKind) -> io::Result<Vec<(String, PathBuf)>> {
    let content_dir = content_dir_name(kind);
    let mut out = Vec::new();

    match kind {
        MediaKind::Movie => {
            let dir = input_dir.join(content_dir);
            if dir.is_dir() {
                for entry in std::fs::read_dir(&dir)? {
                    let entry = entry?;
                    if entry.path().extension().and_then(|e| e.to_str()) == Some("mkv") {
                        let name = entry.file_name().to_string_lossy().into_owned();
                        out.push((format!("{content_dir}/{name}"), entry.path()));
                    }
                }
            }
        }
        MediaKind::Tv => {
            for entry in std::fs::read_dir(input_dir)? {
                let entry = entry?;
                if !entry.path().is_dir() || !entry.file_name().to_string_lossy().starts_with("Disc") {
                    continue;
                }
                let episodes_dir = entry.path().join(content_dir);
                if !episodes_dir.is_dir() {
                    continue;
                }
                for file in std::fs::read_dir(&episodes_dir)? {
                    let file = file?;
                    if file.path().extension().and_then(|e| e.to_str()) == Some("mkv") {
                        let name = file.file_name().to_string_lossy().into_owned();
                        out.push((format!("{content_dir}/{name}"), file.path()));
                    }
                }
            }
        }
    }

    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}
