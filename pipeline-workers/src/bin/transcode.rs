use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pipeline_core::transcode_resume::{self, ResumeAction};
use pipeline_model::{JobId, NewTranscodeFile, Stage, TranscodeFile, TranscodeFileId, TranscodeFileStatus};
use pipeline_store::SqliteStore;
use pipeline_workers::{fs_scan, tool, StageContext, WorkerArgs};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "transcode")]
struct Cli {
    #[command(flatten)]
    worker: WorkerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = StageContext::bootstrap(Stage::Transcode, JobId(cli.worker.job_id), &cli.worker.db, None).await?;

    match run(&ctx).await {
        Ok(()) => ctx.complete(None).await,
        Err(err) => {
            let _ = ctx.fail(&err.to_string()).await;
            Err(err)
        }
    }
}

async fn run(ctx: &StageContext) -> Result<()> {
    let defaults = serde_json::json!({
        "crf": ctx.config.transcode.crf,
        "mode": ctx.config.transcode.mode,
    });
    let options = ctx.job.merged_options(&defaults);
    let crf = options["crf"].as_u64().unwrap_or(20).clamp(0, 51) as u8;
    let mode = options["mode"].as_str().unwrap_or("software").to_string();

    if mode == "hardware" {
        self_test_hardware(&ctx.config.external_tools.ffmpeg_path).await?;
    }

    reconcile_files(&ctx.store, ctx.job.id, &ctx.input_dir, &ctx.output_dir, ctx.item.kind).await?;

    let pending: Vec<TranscodeFile> = ctx
        .store
        .list_transcode_files(ctx.job.id)
        .await?
        .into_iter()
        .filter(|f| f.status == TranscodeFileStatus::Pending)
        .collect();

    for file in pending {
        let source = ctx.input_dir.join(&file.relative_path);
        let dest = ctx.output_dir.join(&file.relative_path);
        std::fs::create_dir_all(dest.parent().expect("relative path always has a parent"))?;

        ctx.store.update_transcode_file_progress(file.id, TranscodeFileStatus::InProgress, 0).await?;
        let result = encode_one(
            &ctx.config.external_tools.ffmpeg_path,
            &source,
            &dest,
            file.duration_secs,
            crf,
            &mode,
            &ctx.config.transcode.preset,
            &ctx.config.transcode.hw_preset,
            &ctx.store,
            file.id,
        )
        .await;

        match result {
            Ok(output_size) => ctx.store.complete_transcode_file(file.id, output_size).await?,
            Err(err) => {
                ctx.store.fail_transcode_file(file.id, &err.to_string()).await?;
                bail!("transcoding {} failed: {err}", file.relative_path);
            }
        }

        report_job_progress(&ctx.store, ctx.job.id).await?;
    }

    let statuses: Vec<TranscodeFileStatus> =
        ctx.store.list_transcode_files(ctx.job.id).await?.into_iter().map(|f| f.status).collect();
    if !transcode_resume::all_files_done(&statuses) {
        bail!("transcode job finished with files not in a terminal state");
    }
    Ok(())
}

async fn self_test_hardware(ffmpeg_path: &str) -> Result<()> {
    let encoders = tool::run(ffmpeg_path, ["-hide_banner", "-encoders"]).await.context("probing hardware encoders")?;
    if !encoders.contains("hevc_nvenc") {
        bail!("hardware transcoding requested but no hevc_nvenc encoder is available");
    }
    Ok(())
}

/// Brings the `TranscodeFile` rows in line with what's actually on disk
/// before any encoding starts: new source files get a pending row, files
/// already fully encoded are marked skipped, and partial/dead output gets
/// reset so the file is retried from scratch.
async fn reconcile_files(
    store: &SqliteStore,
    job_id: JobId,
    input_dir: &Path,
    output_dir: &Path,
    kind: pipeline_model::MediaKind,
) -> Result<()> {
    let relative_paths = fs_scan::discover_organized_mkvs(input_dir, kind)
        .with_context(|| format!("scanning {}", input_dir.display()))?;
    if relative_paths.is_empty() {
        bail!("no .mkv files found under {}", input_dir.display());
    }

    for relative_path in relative_paths {
        let existing = store.find_transcode_file_by_path(job_id, &relative_path).await?;
        let output_path = output_dir.join(&relative_path);
        let output_present_nonempty = output_path.metadata().map(|m| m.len() > 0).unwrap_or(false);

        match transcode_resume::decide_resume_action(existing.as_ref().map(|f| f.status), output_present_nonempty) {
            ResumeAction::CreatePending => {
                let source = input_dir.join(&relative_path);
                let input_size = source.metadata().map(|m| m.len()).unwrap_or(0);
                let duration_secs = probe_duration(ffprobe_path_from_env(), &source).await.ok();
                store
                    .create_transcode_file(NewTranscodeFile { job_id, relative_path, input_size, duration_secs })
                    .await?;
            }
            ResumeAction::RecordAsSkipped => {
                let source = input_dir.join(&relative_path);
                let input_size = source.metadata().map(|m| m.len()).unwrap_or(0);
                let file = store
                    .create_transcode_file(NewTranscodeFile { job_id, relative_path, input_size, duration_secs: None })
                    .await?;
                store.update_transcode_file_progress(file.id, TranscodeFileStatus::Skipped, 100).await?;
            }
            ResumeAction::ResetToPending => {
                let file = existing.expect("ResetToPending implies an existing row");
                store.reset_transcode_file_to_pending(file.id).await?;
            }
            ResumeAction::LeaveAsIs => {}
        }
    }
    Ok(())
}

/// ffprobe's path is read from the environment directly here rather than
/// threaded through every call: reconciliation only needs it for brand-new
/// rows, where overriding via config is a rare enough case to not warrant
/// widening this function's signature.
fn ffprobe_path_from_env() -> String {
    std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string())
}

async fn probe_duration(ffprobe_path: String, source: &Path) -> Result<f64> {
    let source_str = source.to_str().context("source path is not valid UTF-8")?;
    let stdout = tool::run(
        &ffprobe_path,
        ["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0", source_str],
    )
    .await
    .context("probing duration")?;
    stdout.trim().parse::<f64>().context("parsing ffprobe duration")
}

#[allow(clippy::too_many_arguments)]
async fn encode_one(
    ffmpeg_path: &str,
    source: &Path,
    dest: &Path,
    duration_secs: Option<f64>,
    crf: u8,
    mode: &str,
    preset: &str,
    hw_preset: &str,
    store: &SqliteStore,
    file_id: TranscodeFileId,
) -> Result<u64> {
    let mut cmd = tokio::process::Command::new(ffmpeg_path);
    cmd.arg("-y").arg("-i").arg(source);
    if mode == "hardware" {
        cmd.arg("-c:v").arg("hevc_nvenc").arg("-preset").arg(hw_preset);
    } else {
        cmd.arg("-c:v").arg("libx265").arg("-preset").arg(preset).arg("-crf").arg(crf.to_string());
    }
    cmd.arg("-c:a").arg("copy").arg("-c:s").arg("copy");
    cmd.arg("-progress").arg("pipe:1").arg("-nostats");
    cmd.arg(dest);
    cmd.stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::piped());

    let mut child = cmd.spawn().context("failed to launch ffmpeg")?;
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
        buf
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut last_reported = 0u8;
    while let Some(line) = lines.next_line().await? {
        let Some(total_secs) = duration_secs else { continue };
        let Some(value) = line.strip_prefix("out_time_ms=") else { continue };
        let Ok(micros) = value.trim().parse::<i64>() else { continue };
        let elapsed = micros as f64 / 1_000_000.0;
        let pct = ((elapsed / total_secs) * 100.0).clamp(0.0, 99.0) as u8;
        if pct > last_reported {
            last_reported = pct;
            store.update_transcode_file_progress(file_id, TranscodeFileStatus::InProgress, pct).await?;
        }
    }

    let status = child.wait().await.context("waiting for ffmpeg to exit")?;
    let captured_stderr = stderr_task.await.unwrap_or_default();
    if !status.success() {
        bail!("ffmpeg exited with {status}: {}", captured_stderr.trim());
    }

    Ok(dest.metadata().map(|m| m.len()).unwrap_or(0))
}

async fn report_job_progress(store: &SqliteStore, job_id: JobId) -> Result<()> {
    let entries: Vec<(TranscodeFileStatus, u8)> =
        store.list_transcode_files(job_id).await?.into_iter().map(|f| (f.status, f.progress)).collect();
    let mean = transcode_resume::mean_progress(&entries);
    store.update_job_progress(job_id, mean).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pipeline_model::{MediaItem, MediaKind, NewJob};

    use super::*;

    async fn setup(kind: MediaKind) -> (SqliteStore, JobId, tempfile::TempDir, tempfile::TempDir) {
        let store = SqliteStore::in_memory().await.unwrap();
        let item = store.create_media_item(MediaItem::new_draft(kind, "Heat")).await.unwrap();
        let job = store.create_job(NewJob::new(item.id, Stage::Transcode)).await.unwrap();
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        (store, job.id, input_dir, output_dir)
    }

    #[tokio::test]
    async fn new_source_file_with_no_output_becomes_a_pending_row() {
        let (store, job_id, input_dir, output_dir) = setup(MediaKind::Movie).await;
        std::fs::create_dir_all(input_dir.path().join("_main")).unwrap();
        std::fs::write(input_dir.path().join("_main/movie.mkv"), "source bytes").unwrap();

        reconcile_files(&store, job_id, input_dir.path(), output_dir.path(), MediaKind::Movie).await.unwrap();

        let files = store.list_transcode_files(job_id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, TranscodeFileStatus::Pending);
        assert_eq!(files[0].relative_path, "_main/movie.mkv");
    }

    #[tokio::test]
    async fn source_file_with_existing_nonempty_output_is_recorded_skipped() {
        let (store, job_id, input_dir, output_dir) = setup(MediaKind::Movie).await;
        std::fs::create_dir_all(input_dir.path().join("_main")).unwrap();
        std::fs::write(input_dir.path().join("_main/movie.mkv"), "source bytes").unwrap();
        std::fs::create_dir_all(output_dir.path().join("_main")).unwrap();
        std::fs::write(output_dir.path().join("_main/movie.mkv"), "already encoded").unwrap();

        reconcile_files(&store, job_id, input_dir.path(), output_dir.path(), MediaKind::Movie).await.unwrap();

        let files = store.list_transcode_files(job_id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, TranscodeFileStatus::Skipped);
        assert_eq!(files[0].progress, 100);
    }

    #[tokio::test]
    async fn completed_row_whose_output_vanished_is_reset_to_pending() {
        let (store, job_id, input_dir, output_dir) = setup(MediaKind::Movie).await;
        std::fs::create_dir_all(input_dir.path().join("_main")).unwrap();
        std::fs::write(input_dir.path().join("_main/movie.mkv"), "source bytes").unwrap();

        let file = store
            .create_transcode_file(pipeline_model::NewTranscodeFile {
                job_id,
                relative_path: "_main/movie.mkv".to_string(),
                input_size: 100,
                duration_secs: Some(60.0),
            })
            .await
            .unwrap();
        store.complete_transcode_file(file.id, 50).await.unwrap();

        reconcile_files(&store, job_id, input_dir.path(), output_dir.path(), MediaKind::Movie).await.unwrap();

        let files = store.list_transcode_files(job_id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, TranscodeFileStatus::Pending);
    }

    #[tokio::test]
    async fn no_source_files_is_an_error() {
        let (store, job_id, input_dir, output_dir) = setup(MediaKind::Movie).await;
        let err = reconcile_files(&store, job_id, input_dir.path(), output_dir.path(), MediaKind::Movie)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no .mkv files found"), "{err}");
    }
}
