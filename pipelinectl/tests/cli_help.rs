use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn help_mentions_db_and_config_overrides() {
    let mut cmd = cargo_bin_cmd!("pipelinectl");
    let output = cmd.arg("--help").assert().success().get_output().stdout.clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("--db"), "help missing --db override");
    assert!(text.contains("--config"), "help missing --config override");
    assert!(text.contains("--binaries-dir"), "help missing --binaries-dir override");
}

#[test]
fn missing_config_file_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("pipelinectl");
    cmd.arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .arg("--db")
        .arg(dir.path().join("state.db"))
        .env("PIPELINECTL_TUI_SCRIPT", dir.path().join("missing-script"))
        .assert()
        .failure();
}
