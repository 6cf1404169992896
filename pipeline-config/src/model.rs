use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_crf() -> u8 {
    20
}

fn default_mode() -> TranscodeMode {
    TranscodeMode::Software
}

fn default_preset() -> String {
    "slow".to_string()
}

fn default_hw_preset() -> String {
    "medium".to_string()
}

/// `staging_base`, `library_base`, `dispatch`, `remux`, and `transcode` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub staging_base: String,
    pub library_base: LibraryBase,
    #[serde(default)]
    pub dispatch: HashMap<String, String>,
    #[serde(default)]
    pub remux: RemuxConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub external_tools: ExternalTools,
}

/// Separate library roots for movies and TV, both referenced by the publish stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryBase {
    pub movies: String,
    pub tv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemuxConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}

impl RemuxConfig {
    /// ISO-639 language codes to keep, normalized to lowercase for
    /// case-insensitive matching against probed track metadata.
    pub fn keep_set_lowercase(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.to_lowercase()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    Software,
    Hardware,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscodeConfig {
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_mode")]
    pub mode: TranscodeMode,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_hw_preset")]
    pub hw_preset: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            crf: default_crf(),
            mode: default_mode(),
            preset: default_preset(),
            hw_preset: default_hw_preset(),
        }
    }
}

/// Paths to external collaborator binaries, each overridable by an env var
/// of the same name. These are never linked as libraries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalTools {
    #[serde(default = "default_makemkvcon")]
    pub makemkvcon_path: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    #[serde(default = "default_mkvmerge")]
    pub mkvmerge_path: String,
    #[serde(default = "default_mkvpropedit")]
    pub mkvpropedit_path: String,
    #[serde(default = "default_filebot")]
    pub filebot_path: String,
}

fn default_makemkvcon() -> String {
    "makemkvcon".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_ffprobe() -> String {
    "ffprobe".to_string()
}
fn default_mkvmerge() -> String {
    "mkvmerge".to_string()
}
fn default_mkvpropedit() -> String {
    "mkvpropedit".to_string()
}
fn default_filebot() -> String {
    "filebot".to_string()
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            makemkvcon_path: default_makemkvcon(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            mkvmerge_path: default_mkvmerge(),
            mkvpropedit_path: default_mkvpropedit(),
            filebot_path: default_filebot(),
        }
    }
}

impl ExternalTools {
    /// Apply env-var overrides on top of whatever the YAML specified.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MAKEMKVCON_PATH") {
            self.makemkvcon_path = v;
        }
        if let Ok(v) = std::env::var("FFMPEG_PATH") {
            self.ffmpeg_path = v;
        }
        if let Ok(v) = std::env::var("FFPROBE_PATH") {
            self.ffprobe_path = v;
        }
        if let Ok(v) = std::env::var("MKVMERGE_PATH") {
            self.mkvmerge_path = v;
        }
        if let Ok(v) = std::env::var("MKVPROPEDIT_PATH") {
            self.mkvpropedit_path = v;
        }
        if let Ok(v) = std::env::var("FILEBOT_PATH") {
            self.filebot_path = v;
        }
    }
}
