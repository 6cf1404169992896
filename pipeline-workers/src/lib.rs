//! Shared harness for the four stage worker binaries (`rip`, `remux`,
//! `transcode`, `publish`). Each binary's `main` owns only its stage-specific
//! body; everything else — opening the store, loading the job, deriving
//! input/output directories, flipping status, logging — is the identical
//! skeleton implemented here.

pub mod args;
pub mod context;
pub mod fs_scan;
pub mod tool;

pub use args::WorkerArgs;
pub use context::StageContext;
