//! End-to-end tests for the pstep binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("resources").join(name)
}

fn pstep() -> Command {
    let mut cmd = Command::cargo_bin("pstep").expect("Failed to find pstep binary");
    cmd.env_remove("PIPESTEP_DEFAULT_FS");
    cmd
}

/// Temp data root with an app config and one seeded source partition
fn workspace() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp.path().join("pipestep.yml");
    fs::write(
        &config_path,
        format!("engine:\n  kind: local\n  data-root: {}\n", temp.path().display()),
    )
    .unwrap();

    let partition = temp.path().join("source").join("info_date=2022-02-14");
    fs::create_dir_all(&partition).unwrap();
    fs::write(
        partition.join("part-00000.jsonl"),
        "{\"id\":1,\"info_date\":\"2022-02-14\"}\n{\"id\":2,\"info_date\":\"2022-02-14\"}\n{\"id\":3,\"info_date\":\"2022-02-14\"}\n",
    )
    .unwrap();

    (temp, config_path)
}

fn read_partition(dir: &Path) -> Vec<String> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    files.sort();
    files
        .iter()
        .flat_map(|f| {
            fs::read_to_string(f)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

// =============================================================================
// list / validate
// =============================================================================

#[test]
fn test_list_shows_builtins() {
    pstep()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Identity"))
        .stdout(predicate::str::contains("UnionTables"))
        .stdout(predicate::str::contains("--limit"));
}

#[test]
fn test_validate_prints_normalized_json() {
    pstep()
        .arg("validate")
        .arg(resource("real_config.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"records_per_partition\": 500000"))
        .stdout(predicate::str::contains("\"records_per_partition\": 1000000"));
}

#[test]
fn test_validate_yaml_format() {
    pstep()
        .args(["validate", "--format", "yaml"])
        .arg(resource("real_config.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("records_per_partition: 500000"));
}

#[test]
fn test_validate_rejects_bad_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.yaml");
    fs::write(&path, "run_transformers: []\nmetastore_tables: 5\n").unwrap();

    pstep()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("metastore_tables"));
}

// =============================================================================
// run / run-all
// =============================================================================

#[test]
fn test_run_all_writes_declared_outputs() {
    let (temp, config_path) = workspace();

    pstep()
        .arg("-c")
        .arg(&config_path)
        .arg("run-all")
        .arg(resource("builtin_pipeline.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 transformations complete"));

    // records_per_partition: 2 splits the three staged rows over two files
    let staged = temp.path().join("staged").join("info_date=2022-02-14");
    assert!(staged.join("part-00001.jsonl").exists());
    assert_eq!(read_partition(&staged).len(), 3);

    let combined = read_partition(&temp.path().join("combined").join("INFORMATION_DATE=2022-02-14"));
    assert_eq!(combined.len(), 6);
    assert!(combined.iter().all(|row| row.contains("\"INFORMATION_DATE\":\"20220214\"")));
}

#[test]
fn test_run_passes_step_flags() {
    let (temp, config_path) = workspace();

    pstep()
        .arg("-c")
        .arg(&config_path)
        .arg("run")
        .arg(resource("builtin_pipeline.yaml"))
        .args(["Identity", "--", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Identity"));

    let staged = read_partition(&temp.path().join("staged").join("info_date=2022-02-14"));
    assert_eq!(staged.len(), 1);
}

#[test]
fn test_run_unknown_transformation_fails() {
    let (_temp, config_path) = workspace();

    pstep()
        .arg("-c")
        .arg(&config_path)
        .arg("run")
        .arg(resource("builtin_pipeline.yaml"))
        .arg("Nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown transformation"));
}

#[test]
fn test_run_rejects_remote_fs_for_local_engine() {
    let (_temp, config_path) = workspace();

    pstep()
        .env("PIPESTEP_DEFAULT_FS", "s3")
        .arg("-c")
        .arg(&config_path)
        .arg("run-all")
        .arg(resource("builtin_pipeline.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file system"));
}
