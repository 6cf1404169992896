use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::model::PipelineConfig;

impl PipelineConfig {
    /// Load from `$MEDIA_BASE/pipeline/config.yaml`, then layer environment
    /// overrides for external tool paths on top.
    pub fn load() -> Result<Self> {
        let media_base = crate::paths::media_base();
        let path = crate::paths::config_path(&media_base);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: PipelineConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.external_tools.apply_env_overrides();
        debug!(?path, "loaded pipeline config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_yaml_with_defaults_filled_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
staging_base: /mnt/media/staging
library_base:
  movies: /mnt/media/library/movies
  tv: /mnt/media/library/tv
"#,
        )
        .unwrap();

        let config = PipelineConfig::load_from(&path).unwrap();
        assert_eq!(config.staging_base, "/mnt/media/staging");
        assert_eq!(config.remux.languages, vec!["eng".to_string()]);
        assert_eq!(config.transcode.crf, 20);
        assert_eq!(config.external_tools.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn env_override_takes_precedence_over_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
staging_base: /mnt/media/staging
library_base:
  movies: /mnt/media/library/movies
  tv: /mnt/media/library/tv
external_tools:
  ffmpeg_path: /usr/bin/ffmpeg
"#,
        )
        .unwrap();

        // SAFETY: test is single-threaded with respect to this env var and
        // restores it before returning.
        unsafe {
            std::env::set_var("FFMPEG_PATH", "/opt/custom/ffmpeg");
        }
        let config = PipelineConfig::load_from(&path).unwrap();
        unsafe {
            std::env::remove_var("FFMPEG_PATH");
        }
        assert_eq!(config.external_tools.ffmpeg_path, "/opt/custom/ffmpeg");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PipelineConfig::load_from(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
