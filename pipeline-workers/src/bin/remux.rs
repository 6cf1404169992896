use anyhow::{Context, Result};
use clap::Parser;
use pipeline_model::{JobId, Stage};
use pipeline_workers::{fs_scan, tool, StageContext, WorkerArgs};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "remux")]
struct Cli {
    #[command(flatten)]
    worker: WorkerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = StageContext::bootstrap(Stage::Remux, JobId(cli.worker.job_id), &cli.worker.db, None).await?;

    match run(&ctx).await {
        Ok(()) => ctx.complete(None).await,
        Err(err) => {
            let _ = ctx.fail(&err.to_string()).await;
            Err(err)
        }
    }
}

async fn run(ctx: &StageContext) -> Result<()> {
    let sources = fs_scan::discover_remux_sources(&ctx.input_dir, ctx.item.kind)
        .with_context(|| format!("scanning {}", ctx.input_dir.display()))?;
    if sources.is_empty() {
        anyhow::bail!("no .mkv files found under {}", ctx.input_dir.display());
    }

    let keep = ctx.config.remux.keep_set_lowercase();
    let mkvmerge = &ctx.config.external_tools.mkvmerge_path;
    let total = sources.len();

    for (index, (relative, source)) in sources.iter().enumerate() {
        let dest = ctx.output_dir.join(relative);
        std::fs::create_dir_all(dest.parent().expect("relative path always has a parent"))?;
        remux_one(mkvmerge, source, &dest, &keep).await.with_context(|| format!("remuxing {relative}"))?;

        let progress = (((index + 1) * 100) / total) as u8;
        ctx.store.update_job_progress(ctx.job.id, progress).await?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct MkvIdentify {
    tracks: Vec<MkvTrack>,
}

#[derive(Debug, Deserialize)]
struct MkvTrack {
    id: u32,
    #[serde(rename = "type")]
    track_type: String,
    #[serde(default)]
    properties: MkvTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct MkvTrackProperties {
    language: Option<String>,
}

/// Probe `source` with `mkvmerge -J`, then re-mux it keeping all video
/// tracks and only the audio/subtitle tracks whose language is in `keep`.
async fn remux_one(mkvmerge: &str, source: &std::path::Path, dest: &std::path::Path, keep: &[String]) -> Result<()> {
    let source_str = source.to_str().context("source path is not valid UTF-8")?;
    let identify_json = tool::run(mkvmerge, ["-J", source_str]).await.context("probing track metadata")?;
    let identify: MkvIdentify = serde_json::from_str(&identify_json).context("parsing mkvmerge -J output")?;

    let mut video = Vec::new();
    let mut audio = Vec::new();
    let mut subtitles = Vec::new();
    for track in &identify.tracks {
        let language = track.properties.language.as_deref().unwrap_or("und").to_lowercase();
        match track.track_type.as_str() {
            "video" => video.push(track.id),
            "audio" if keep.iter().any(|l| l == &language) => audio.push(track.id),
            "subtitles" if keep.iter().any(|l| l == &language) => subtitles.push(track.id),
            _ => {}
        }
    }

    let mut args: Vec<String> = vec!["-o".into(), dest.to_string_lossy().into_owned()];
    push_track_selection(&mut args, "--video-tracks", "--no-video", &video);
    push_track_selection(&mut args, "--audio-tracks", "--no-audio", &audio);
    push_track_selection(&mut args, "--subtitle-tracks", "--no-subtitles", &subtitles);
    args.push(source_str.to_string());

    tool::run(mkvmerge, &args).await.context("rewriting tracks")?;
    Ok(())
}

fn push_track_selection(args: &mut Vec<String>, keep_flag: &str, drop_flag: &str, ids: &[u32]) {
    if ids.is_empty() {
        args.push(drop_flag.to_string());
    } else {
        let joined = ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
        args.push(keep_flag.to_string());
        args.push(joined);
    }
}
