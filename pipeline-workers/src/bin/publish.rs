use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use pipeline_model::{ItemStatus, JobId, MediaKind, Stage};
use pipeline_workers::{fs_scan, tool, StageContext, WorkerArgs};

#[derive(Parser, Debug)]
#[command(name = "publish")]
struct Cli {
    #[command(flatten)]
    worker: WorkerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = StageContext::bootstrap(Stage::Publish, JobId(cli.worker.job_id), &cli.worker.db, None).await?;

    match run(&ctx).await {
        Ok(dest_dir) => {
            ctx.complete(Some(&dest_dir.to_string_lossy())).await?;
            ctx.store.update_item_status(ctx.item.id, ItemStatus::Completed).await?;
            Ok(())
        }
        Err(err) => {
            let _ = ctx.fail(&err.to_string()).await;
            Err(err)
        }
    }
}

async fn run(ctx: &StageContext) -> Result<PathBuf> {
    let catalog_id = ctx
        .item
        .catalog_id()
        .filter(|id| *id != 0)
        .ok_or_else(|| anyhow!("{} has no catalog id; publish requires one before it can run", ctx.item.kind.as_str()))?;

    let (destination_base, format_template, db) = match ctx.item.kind {
        MediaKind::Movie => (ctx.config.library_base.movies.as_str(), "{n} ({y})/{n} ({y})", "TheMovieDB"),
        MediaKind::Tv => (ctx.config.library_base.tv.as_str(), "{n}/Season {s.pad(2)}/{n} - {s00e00} - {t}", "TheTVDB"),
    };

    let relative_paths = fs_scan::discover_organized_mkvs(&ctx.input_dir, ctx.item.kind)?;
    if relative_paths.is_empty() {
        bail!("no .mkv files found under {}", ctx.input_dir.display());
    }
    let content_dir = match ctx.item.kind {
        MediaKind::Movie => "_main",
        MediaKind::Tv => "_episodes",
    };
    let source = ctx.input_dir.join(content_dir);

    let stdout = tool::run(
        &ctx.config.external_tools.filebot_path,
        [
            "-rename",
            "-r",
            source.to_str().context("source path is not valid UTF-8")?,
            "--db",
            db,
            "--format",
            format_template,
            "--output",
            destination_base,
            "--action",
            "copy",
            "--def",
            &format!("id={catalog_id}"),
        ],
    )
    .await
    .context("renaming tool failed")?;

    let dest_dir = parse_destination_dir(&stdout)
        .ok_or_else(|| anyhow!("could not determine a destination directory from the renaming tool's output"))?;

    copy_extras(&ctx.input_dir, &dest_dir)?;
    verify_destination(&dest_dir)?;

    Ok(dest_dir)
}

/// Filebot-style CLI output reports each copied file as `[COPY] from X to Y`;
/// the destination directory is the parent of the first such `Y`.
fn parse_destination_dir(tool_output: &str) -> Option<PathBuf> {
    for line in tool_output.lines() {
        let line = line.trim();
        if !line.starts_with("[COPY]") {
            continue;
        }
        let dest = line.rsplit(" to ").next()?.trim();
        let path = PathBuf::from(dest);
        return path.parent().map(Path::to_path_buf);
    }
    None
}

fn copy_extras(input_dir: &Path, dest_dir: &Path) -> Result<()> {
    let extras_dir = input_dir.join("_extras");
    if !extras_dir.is_dir() {
        return Ok(());
    }
    for category_entry in std::fs::read_dir(&extras_dir)? {
        let category_entry = category_entry?;
        if !category_entry.path().is_dir() {
            continue;
        }
        let category = category_entry.file_name();
        let dest_category_dir = dest_dir.join(&category);
        for file_entry in std::fs::read_dir(category_entry.path())? {
            let file_entry = file_entry?;
            if file_entry.path().extension().and_then(|e| e.to_str()) != Some("mkv") {
                continue;
            }
            std::fs::create_dir_all(&dest_category_dir)?;
            std::fs::copy(file_entry.path(), dest_category_dir.join(file_entry.file_name()))?;
        }
    }
    Ok(())
}

fn verify_destination(dest_dir: &Path) -> Result<()> {
    let has_content = std::fs::read_dir(dest_dir)
        .with_context(|| format!("reading destination {}", dest_dir.display()))?
        .flatten()
        .any(|entry| {
            entry.path().extension().and_then(|e| e.to_str()) == Some("mkv")
                && entry.metadata().map(|m| m.len() > 0).unwrap_or(false)
        });
    if !has_content {
        bail!("destination {} has no non-empty .mkv file after publish", dest_dir.display());
    }
    Ok(())
}
