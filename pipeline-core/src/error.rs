use thiserror::Error;

/// The five error kinds named in the error-handling design: validation,
/// environment, I/O, tool, and internal (store) failures.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("environment error: {0}")]
    Environment(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external tool failed: {0}")]
    Tool(String),

    #[error(transparent)]
    Store(#[from] pipeline_store::StoreError),

    #[error(transparent)]
    Model(#[from] pipeline_model::ModelError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
