use std::path::PathBuf;

use clap::Args;

/// Flags every stage worker accepts: `<stage> --job-id <N> --db <path>`.
#[derive(Debug, Args)]
pub struct WorkerArgs {
    #[arg(long = "job-id")]
    pub job_id: i64,

    #[arg(long = "db")]
    pub db: PathBuf,
}
