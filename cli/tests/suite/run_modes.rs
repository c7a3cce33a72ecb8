use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// `ghsh` with its home, config and dotfiles isolated under `home`.
fn ghsh_command(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(env!("CARGO_BIN_EXE_ghsh"));
    cmd.env("GHSH_HOME", home)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

#[test]
fn command_flag_exits_with_pipeline_status() -> Result<()> {
    let home = TempDir::new()?;

    ghsh_command(home.path())
        .args(["-c", "printf 'x\\n' | cat | wc -l"])
        .assert()
        .success()
        .stdout(contains("1"));

    ghsh_command(home.path())
        .args(["-c", "sh -c 'exit 7'"])
        .assert()
        .code(7);
    Ok(())
}

#[test]
fn unknown_command_exits_127() -> Result<()> {
    let home = TempDir::new()?;
    ghsh_command(home.path())
        .args(["-c", "ghsh-no-such-command-xyz"])
        .assert()
        .code(127)
        .stderr(contains("ghsh: ghsh-no-such-command-xyz: command not found"));
    Ok(())
}

#[test]
fn script_runs_and_exit_sets_status() -> Result<()> {
    let home = TempDir::new()?;
    let script = home.path().join("script.ghsh");
    fs::write(&script, "# setup\necho from-script\nexit 3\necho unreachable\n")?;

    ghsh_command(home.path())
        .arg(&script)
        .assert()
        .code(3)
        .stdout("from-script\n");
    Ok(())
}

#[test]
fn piped_stdin_runs_startup_files_and_records_history() -> Result<()> {
    let home = TempDir::new()?;
    fs::write(home.path().join(".ghshrc"), "export GHSH_FROM_RC=rc-value\n")?;

    ghsh_command(home.path())
        .write_stdin("echo $GHSH_FROM_RC\nfalse\n")
        .assert()
        .code(1)
        .stdout(contains("rc-value"));

    let history = fs::read_to_string(home.path().join(".ghost_history"))?;
    assert_eq!(history, "echo $GHSH_FROM_RC\nfalse\n");
    Ok(())
}

#[test]
fn norc_skips_startup_files() -> Result<()> {
    let home = TempDir::new()?;
    fs::write(home.path().join(".ghshrc"), "exit 9\n")?;

    ghsh_command(home.path())
        .arg("--norc")
        .write_stdin("true\n")
        .assert()
        .success();
    Ok(())
}

#[test]
fn malformed_config_is_reported() -> Result<()> {
    let home = TempDir::new()?;
    fs::write(home.path().join("config.toml"), "unknown_key = 1\n")?;

    ghsh_command(home.path())
        .args(["-c", "true"])
        .assert()
        .failure()
        .stderr(contains("config.toml"));
    Ok(())
}

#[test]
fn log_file_is_owner_only() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new()?;
    ghsh_command(home.path()).args(["-c", "true"]).assert().success();

    let mode = fs::metadata(home.path().join("log").join("ghsh.log"))?
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
    Ok(())
}
