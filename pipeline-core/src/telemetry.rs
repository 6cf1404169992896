//! Logging setup shared by every binary. Stderr is always on; stage workers
//! additionally layer a per-job file sink so a killed/relaunched job keeps a
//! durable transcript independent of whatever captured its console output.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    std::env::var("PIPELINE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Stderr-only logging, for `pipelinectl` and anything that isn't a stage worker.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Stderr plus a non-blocking file sink at `<job_log_dir>/worker.log`. The
/// returned guard must stay alive for the process lifetime or buffered log
/// lines are dropped on exit.
pub fn init_worker(job_log_dir: &Path) -> std::io::Result<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    std::fs::create_dir_all(job_log_dir)?;
    let file_appender = tracing_appender::rolling::never(job_log_dir, "worker.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
