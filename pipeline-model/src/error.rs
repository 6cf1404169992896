use thiserror::Error;

use crate::Stage;

/// Errors raised by pure model operations (construction, validation of
/// in-memory values). Store and I/O errors live in their owning crates.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid stage transition: {from} -> {to}")]
    InvalidStageTransition { from: Stage, to: Stage },

    #[error("invalid progress value: {0} (must be 0..=100)")]
    InvalidProgress(u8),

    #[error("empty name cannot be canonicalized")]
    EmptyName,
}

pub type Result<T> = std::result::Result<T, ModelError>;
