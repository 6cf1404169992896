use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pipeline_core::organize_validator;
use pipeline_model::{JobId, Stage};
use pipeline_workers::{tool, StageContext, WorkerArgs};

#[derive(Parser, Debug)]
#[command(name = "rip")]
struct Cli {
    #[command(flatten)]
    worker: WorkerArgs,

    #[arg(long = "disc-path", default_value = "disc:0")]
    disc_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx =
        StageContext::bootstrap(Stage::Rip, JobId(cli.worker.job_id), &cli.worker.db, Some(PathBuf::from(&cli.disc_path)))
            .await?;

    match run(&ctx).await {
        Ok(()) => ctx.complete(None).await,
        Err(err) => {
            let _ = ctx.fail(&err.to_string()).await;
            Err(err)
        }
    }
}

async fn run(ctx: &StageContext) -> Result<()> {
    let disc_path = ctx.input_dir.to_str().context("disc path is not valid UTF-8")?;
    let makemkvcon = &ctx.config.external_tools.makemkvcon_path;

    tracing::info!(disc_path, "listing disc titles");
    tool::run(makemkvcon, ["-r", "info", disc_path]).await.context("listing disc titles")?;

    std::fs::create_dir_all(&ctx.output_dir)?;
    let output_dir = ctx.output_dir.to_str().context("output_dir is not valid UTF-8")?;
    tracing::info!(output_dir, "ripping all titles");
    tool::run(makemkvcon, ["mkv", disc_path, "all", output_dir]).await.context("ripping disc")?;

    let disc = ctx.job.disc.unwrap_or(1);
    let season_number = ctx.season.as_ref().map(|s| s.number);
    organize_validator::emit_rip_scaffolding(&ctx.output_dir, ctx.item.kind, &ctx.item.name, season_number, disc)
        .context("writing organization scaffolding")?;

    ctx.store.update_job_progress(ctx.job.id, 100).await?;
    Ok(())
}
