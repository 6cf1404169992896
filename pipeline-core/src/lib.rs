//! Orchestration core: everything that sits between the pure data model
//! (`pipeline-model`), the store (`pipeline-store`), and the stage worker
//! binaries (`pipeline-workers`) or the control plane (`pipelinectl`).

pub mod dispatcher;
pub mod error;
pub mod organize_validator;
pub mod sidecar;
pub mod state_loader;
pub mod state_writer;
pub mod telemetry;
pub mod transcode_resume;

pub use dispatcher::Dispatcher;
pub use error::{PipelineError, Result};
pub use state_loader::{ItemView, RollupCategory, StateLoader};
