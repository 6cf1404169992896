//! YAML configuration loading for the disc processing pipeline.
//!
//! The config file's own format is an external-collaborator concern (any
//! reasonable YAML layer suffices); this crate owns only the concrete shape
//! and its defaults.

pub mod error;
pub mod loader;
pub mod model;
pub mod paths;

pub use error::{ConfigError, Result};
pub use model::{ExternalTools, LibraryBase, PipelineConfig, RemuxConfig, TranscodeConfig, TranscodeMode};
