use std::path::{Path, PathBuf};

/// Root of the media tree. `$MEDIA_BASE`, default `/mnt/media`.
pub fn media_base() -> PathBuf {
    std::env::var_os("MEDIA_BASE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/mnt/media"))
}

pub fn config_path(media_base: &Path) -> PathBuf {
    media_base.join("pipeline").join("config.yaml")
}

pub fn store_path(media_base: &Path) -> PathBuf {
    media_base.join("pipeline").join("pipeline.db")
}

pub fn job_log_dir(media_base: &Path, job_id: i64) -> PathBuf {
    media_base
        .join("pipeline")
        .join("logs")
        .join("jobs")
        .join(job_id.to_string())
}

/// Staging root directories for the per-stage filesystem layout convention.
pub struct StagingLayout {
    root: PathBuf,
}

impl StagingLayout {
    pub fn new(staging_base: impl Into<PathBuf>) -> Self {
        Self {
            root: staging_base.into(),
        }
    }

    fn stage_dir(&self, numbered: &str) -> PathBuf {
        self.root.join(numbered)
    }

    pub fn ripped_movie_dir(&self, safe_name: &str) -> PathBuf {
        self.stage_dir("1-ripped").join("movies").join(safe_name)
    }

    pub fn ripped_tv_disc_dir(&self, safe_name: &str, season: u32, disc: u32) -> PathBuf {
        self.ripped_tv_season_dir(safe_name, season).join(format!("Disc{disc}"))
    }

    /// Parent of all `Disc<k>/` directories for a season's rip output; the
    /// remux worker merges `_episodes/` across every disc found here.
    pub fn ripped_tv_season_dir(&self, safe_name: &str, season: u32) -> PathBuf {
        self.stage_dir("1-ripped").join("tv").join(safe_name).join(format!("S{season:02}"))
    }

    pub fn remuxed_movie_dir(&self, safe_name: &str) -> PathBuf {
        self.stage_dir("2-remuxed").join("movies").join(safe_name)
    }

    pub fn remuxed_tv_season_dir(&self, safe_name: &str, season: u32) -> PathBuf {
        self.stage_dir("2-remuxed")
            .join("tv")
            .join(safe_name)
            .join(format!("Season_{season:02}"))
    }

    pub fn transcoded_movie_dir(&self, safe_name: &str) -> PathBuf {
        self.stage_dir("3-transcoded").join("movies").join(safe_name)
    }

    pub fn transcoded_tv_season_dir(&self, safe_name: &str, season: u32) -> PathBuf {
        self.stage_dir("3-transcoded")
            .join("tv")
            .join(safe_name)
            .join(format!("Season_{season:02}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tv_disc_layout_matches_convention() {
        let layout = StagingLayout::new("/mnt/media/staging");
        let dir = layout.ripped_tv_disc_dir("Breaking_Bad", 2, 1);
        assert_eq!(
            dir,
            PathBuf::from("/mnt/media/staging/1-ripped/tv/Breaking_Bad/S02/Disc1")
        );
    }

    #[test]
    fn movie_layout_has_no_season_segment() {
        let layout = StagingLayout::new("/mnt/media/staging");
        let dir = layout.remuxed_movie_dir("The_Matrix");
        assert_eq!(
            dir,
            PathBuf::from("/mnt/media/staging/2-remuxed/movies/The_Matrix")
        );
    }
}
