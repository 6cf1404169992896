//! SQLite persistence for the disc processing pipeline.
//!
//! `SqliteStore` is the single writer and reader every stage worker,
//! `pipelinectl`, and the dispatcher go through; there is no separate
//! repository trait because there is exactly one backend and no need to
//! mock it in tests (an in-memory SQLite database is already fast and
//! faithful enough).

mod error;
mod job;
mod log_event;
mod media_item;
mod rows;
mod season;
mod store;
mod transcode_file;

pub use error::{Result, StoreError};
pub use store::SqliteStore;
