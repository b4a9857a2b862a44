use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Discover, classify, and run shell scripts",
        ))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("group"));
}

#[test]
fn test_cli_version() {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("autoshell"));
}

#[test]
fn test_cli_run_help() {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--elevated"))
        .stdout(predicate::str::contains("--terminal"));
}

#[test]
fn test_cli_group_help() {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.args(["group", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("remove"));
}

#[test]
fn test_cli_config_help() {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("reset"));
}

// ========== End-to-End Flows ==========

/// Config dir wired to a database inside the same temp tree, so runs stay
/// isolated from the user's real catalog.
fn setup_env(temp: &TempDir) -> PathBuf {
    let config_dir = temp.path().join("config");
    fs::create_dir(&config_dir).unwrap();
    let db_path = temp.path().join("catalog.db");
    fs::write(
        config_dir.join("config.toml"),
        format!("[storage]\ndb_path = \"{}\"\n", db_path.display()),
    )
    .unwrap();
    config_dir
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn autoshell(config_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.arg("--config-dir").arg(config_dir);
    cmd
}

#[test]
fn test_scan_catalogs_scripts() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    write_script(&scripts, "backup.sh", "# Nightly backup job\nsudo apt update\n");
    write_script(&scripts, "build.sh", "# Builds the project\ncargo build\n");

    autoshell(&config_dir)
        .arg("scan")
        .arg(&scripts)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cataloged 2 scripts"))
        .stdout(predicate::str::contains("backup.sh"))
        .stdout(predicate::str::contains("build.sh"))
        .stdout(predicate::str::contains("Sudo required: 1"));
}

#[test]
fn test_list_empty_catalog() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);

    autoshell(&config_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Script Catalog"))
        .stdout(predicate::str::contains("No scripts found."));
}

#[test]
fn test_list_filters_catalog() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    write_script(&scripts, "backup.sh", "# Nightly backup job\nsudo apt update\n");
    write_script(&scripts, "build.sh", "# Builds the project\ncargo build\n");

    autoshell(&config_dir).arg("scan").arg(&scripts).assert().success();

    autoshell(&config_dir)
        .args(["list", "--filter", "backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backup.sh"))
        .stdout(predicate::str::contains("build.sh").not());

    autoshell(&config_dir)
        .args(["list", "--elevated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backup.sh"))
        .stdout(predicate::str::contains("build.sh").not());
}

#[test]
fn test_show_reports_script_detail() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    write_script(&scripts, "backup.sh", "# Nightly backup job\nsudo apt update\n");

    autoshell(&config_dir).arg("scan").arg(&scripts).assert().success();

    autoshell(&config_dir)
        .args(["show", "backup.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nightly backup job"))
        .stdout(predicate::str::contains("sudo required"))
        .stdout(predicate::str::contains("direct_sudo"))
        .stdout(predicate::str::contains("Content:"))
        .stdout(predicate::str::contains("sudo apt update"));
}

#[test]
fn test_analyze_reports_categories() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let elevated = write_script(&scripts, "setup.sh", "sudo apt install -y jq\n");
    let plain = write_script(&scripts, "hello.sh", "echo hello\n");

    autoshell(&config_dir)
        .arg("analyze")
        .arg(&elevated)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sudo required"))
        .stdout(predicate::str::contains("direct_sudo"))
        .stdout(predicate::str::contains("package_manager"));

    autoshell(&config_dir)
        .arg("analyze")
        .arg(&plain)
        .assert()
        .success()
        .stdout(predicate::str::contains("No elevated commands detected."));
}

#[test]
fn test_run_unknown_script_fails() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);

    autoshell(&config_dir)
        .args(["run", "ghost.sh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Script not in catalog: ghost.sh"));
}

#[cfg(unix)]
#[test]
fn test_run_executes_script() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let path = write_script(&scripts, "hello.sh", "#!/bin/bash\necho hello-from-run\n");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    autoshell(&config_dir)
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed with exit code 0"))
        .stdout(predicate::str::contains("hello-from-run"));
}

#[cfg(unix)]
#[test]
fn test_run_refuses_non_executable_script() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let path = write_script(&scripts, "plain.sh", "#!/bin/bash\necho nope\n");

    autoshell(&config_dir)
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed with exit code -1"))
        .stdout(predicate::str::contains("Script is not executable"));
}

#[cfg(unix)]
#[test]
fn test_chmod_x_marks_script_executable() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let path = write_script(&scripts, "plain.sh", "#!/bin/bash\necho ok\n");

    autoshell(&config_dir)
        .arg("chmod-x")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked executable:"));

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0);
}

#[test]
fn test_group_lifecycle() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let path = write_script(&scripts, "migrate.sh", "# Runs database migrations\necho ok\n");

    autoshell(&config_dir)
        .args(["group", "create", "release", "--description", "Release steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created group: release"));

    autoshell(&config_dir)
        .args(["group", "create", "release"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Group already exists: release"));

    let mut add = autoshell(&config_dir);
    add.args(["group", "add", "release"]).arg(&path);
    add.assert()
        .success()
        .stdout(predicate::str::contains("Added migrate.sh to group release"));

    autoshell(&config_dir)
        .args(["group", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Script Groups"))
        .stdout(predicate::str::contains("release"));

    autoshell(&config_dir)
        .args(["group", "show", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate.sh"));

    let mut remove = autoshell(&config_dir);
    remove.args(["group", "remove", "release"]).arg(&path);
    remove
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed migrate.sh from group release"));
}

#[cfg(unix)]
#[test]
fn test_group_run_reports_summary() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);
    let scripts = temp.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    let path = write_script(&scripts, "step.sh", "#!/bin/bash\necho step-ran\n");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    autoshell(&config_dir)
        .args(["group", "create", "release"])
        .assert()
        .success();
    let mut add = autoshell(&config_dir);
    add.args(["group", "add", "release"]).arg(&path);
    add.assert().success();

    autoshell(&config_dir)
        .args(["group", "run", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running group: release"))
        .stdout(predicate::str::contains("[1/1] step.sh"))
        .stdout(predicate::str::contains("Group execution completed"))
        .stdout(predicate::str::contains("Succeeded: 1  Failed: 0  Total: 1"));
}

#[test]
fn test_group_show_unknown_group_fails() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);

    autoshell(&config_dir)
        .args(["group", "show", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Group not found: missing"));
}

#[test]
fn test_config_show_and_path() {
    let temp = TempDir::new().unwrap();
    let config_dir = setup_env(&temp);

    autoshell(&config_dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[discovery]"))
        .stdout(predicate::str::contains("extension"));

    autoshell(&config_dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_reset_writes_defaults() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("fresh");
    fs::create_dir(&config_dir).unwrap();

    let mut cmd = cargo_bin_cmd!("autoshell");
    cmd.arg("--config-dir")
        .arg(&config_dir)
        .args(["config", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration reset to defaults."));

    let content = fs::read_to_string(config_dir.join("config.toml")).unwrap();
    assert!(content.contains("timeout_secs = 30"));
}
