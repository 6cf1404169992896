//! Drives the real control plane binary headlessly via `PIPELINECTL_TUI_SCRIPT`,
//! the same mechanism the teacher's TUI uses for its own integration tests.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use pipeline_model::MediaKind;
use pipeline_store::SqliteStore;

fn write_config(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    fs::write(
        &path,
        format!(
            "staging_base: {staging}\nlibrary_base:\n  movies: {movies}\n  tv: {tv}\n",
            staging = dir.join("staging").display(),
            movies = dir.join("library/movies").display(),
            tv = dir.join("library/tv").display(),
        ),
    )
    .unwrap();
    path
}

async fn seed_one_movie(db_path: &std::path::Path) {
    let store = SqliteStore::connect(db_path).await.unwrap();
    let draft = pipeline_model::MediaItem::new_draft(MediaKind::Movie, "The Wire");
    store.create_media_item(draft).await.unwrap();
}

#[test]
fn navigates_item_list_and_opens_detail_screen() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());
    let db_path = dir.path().join("pipeline.db");

    tokio::runtime::Runtime::new().unwrap().block_on(seed_one_movie(&db_path));

    let script_path = dir.path().join("script.txt");
    fs::write(&script_path, "enter\nesc\nq\n").unwrap();

    let mut cmd = cargo_bin_cmd!("pipelinectl");
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--db")
        .arg(&db_path)
        .env("PIPELINECTL_TUI_SCRIPT", &script_path)
        .assert()
        .success();
}

#[test]
fn quits_immediately_on_q() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());
    let db_path = dir.path().join("pipeline.db");

    tokio::runtime::Runtime::new().unwrap().block_on(async {
        SqliteStore::connect(&db_path).await.unwrap();
    });

    let script_path = dir.path().join("script.txt");
    fs::write(&script_path, "q\n").unwrap();

    let mut cmd = cargo_bin_cmd!("pipelinectl");
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--db")
        .arg(&db_path)
        .env("PIPELINECTL_TUI_SCRIPT", &script_path)
        .assert()
        .success();
}
