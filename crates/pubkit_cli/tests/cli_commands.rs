use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pubkit"))
}

fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// Two root scripts, one unlisted file, the image dir with one image and one
/// stray file, no leetcode dir.
fn seed_repo(root: &Path) {
    write(&root.join("password_generator.py"), "print('pw')\n");
    write(&root.join("README.md"), "# repo\n");
    write(&root.join("notes.txt"), "private\n");
    write(&root.join("image_resolution_checker/image_info.py"), "print('img')\n");
    write(&root.join("image_resolution_checker/photo.png"), "png");
    write(&root.join("image_resolution_checker/scratch.txt"), "tmp");
}

#[test]
fn collect_publishes_only_allow_listed_files() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    cli()
        .current_dir(temp.path())
        .arg("collect")
        .assert()
        .success()
        .stdout(contains("manifest: built-in"))
        .stdout(contains("missing  snake_game.py"))
        .stdout(contains("absent   leetcode_analyzer/"))
        .stdout(contains("[COLLECT] output=public copied=4"));

    let public = temp.path().join("public");
    assert!(public.join("password_generator.py").is_file());
    assert!(public.join("README.md").is_file());
    assert!(public.join("image_resolution_checker/image_info.py").is_file());
    assert!(public.join("image_resolution_checker/photo.png").is_file());
    assert!(!public.join("notes.txt").exists());
    assert!(!public.join("image_resolution_checker/scratch.txt").exists());
    assert!(!public.join("leetcode_analyzer").exists());
    Ok(())
}

#[test]
fn collect_strict_fails_on_missing_entries() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    cli()
        .args(["collect", "--strict", "--source"])
        .arg(temp.path())
        .assert()
        .failure()
        .code(65)
        .stdout(contains("missing  snake_game.py"));

    // The pass still ran to completion.
    assert!(temp.path().join("public/README.md").is_file());
    Ok(())
}

#[test]
fn collect_dry_run_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    cli()
        .args(["collect", "--dry-run", "-v", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("planned  README.md"))
        .stdout(contains("[DRY-RUN]"));

    assert!(!temp.path().join("public").exists());
    Ok(())
}

#[test]
fn collect_json_reports_counts() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    let output = cli()
        .args(["collect", "--json", "--workers", "1", "--source"])
        .arg(temp.path())
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["root"]["cnt_copied"], 2);
    assert_eq!(value["origin"]["kind"], "built_in");
    assert_eq!(value["dirs"][1]["outcome"]["state"], "absent");
    Ok(())
}

#[test]
fn check_lists_unlisted_entries() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());
    fs::create_dir(temp.path().join("drafts"))?;

    cli()
        .args(["check", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("unlisted:"))
        .stdout(contains("  notes.txt"))
        .stdout(contains("  drafts/"))
        .stdout(contains("  image_resolution_checker/scratch.txt"))
        .stdout(contains("planned  README.md"))
        .stdout(contains("  pubkit.toml").not());

    assert!(!temp.path().join("public").exists());
    Ok(())
}

#[test]
fn manifest_file_in_source_root_replaces_built_in() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());
    write(
        &temp.path().join("pubkit.toml"),
        "output_dir = \"site\"\nfiles = [\"notes.txt\"]\n",
    );

    cli()
        .args(["collect", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("pubkit.toml"));

    assert!(temp.path().join("site/notes.txt").is_file());
    assert!(!temp.path().join("site/README.md").exists());
    assert!(!temp.path().join("public").exists());
    Ok(())
}

#[test]
fn manifest_command_prints_toml() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    cli()
        .args(["manifest", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("output_dir = \"public\""))
        .stdout(contains("name = \"image_resolution_checker\""));
    Ok(())
}

#[test]
fn invalid_manifest_maps_to_exit_codes() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    let path_bad_toml = temp.path().join("bad.toml");
    write(&path_bad_toml, "files = [\n");
    cli()
        .args(["collect", "--source"])
        .arg(temp.path())
        .arg("--manifest")
        .arg(&path_bad_toml)
        .assert()
        .code(78)
        .stderr(contains("error:"));

    let path_empty = temp.path().join("empty.toml");
    write(&path_empty, "files = []\n");
    cli()
        .args(["collect", "--source"])
        .arg(temp.path())
        .arg("--manifest")
        .arg(&path_empty)
        .assert()
        .code(65);

    cli()
        .args(["collect", "--source"])
        .arg(temp.path())
        .args(["--manifest", "does-not-exist.toml"])
        .assert()
        .code(66);
    Ok(())
}

#[test]
fn missing_source_exits_no_input() {
    cli()
        .args(["collect", "--source", "/definitely/not/here"])
        .assert()
        .failure()
        .code(66)
        .stderr(contains("not a directory"));
}

#[test]
fn output_inside_rule_directory_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_repo(temp.path());

    cli()
        .args(["collect", "--source"])
        .arg(temp.path())
        .arg("--output")
        .arg(temp.path().join("image_resolution_checker"))
        .assert()
        .code(64)
        .stderr(contains("overlaps source content"));

    assert!(temp.path().join("image_resolution_checker/scratch.txt").is_file());
    assert!(temp.path().join("image_resolution_checker/photo.png").is_file());
    Ok(())
}

#[test]
fn unknown_flag_is_usage_error() {
    cli().args(["collect", "--bogus"]).assert().code(64);
}
