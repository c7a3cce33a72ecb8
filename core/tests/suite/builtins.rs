use std::fs;
use std::path::PathBuf;

use ghsh_core::source_file;
use ghsh_core::source_startup_files;
use pretty_assertions::assert_eq;
use serial_test::serial;

use crate::suite::harness;

/// Restores the process working directory when dropped.
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn new() -> Self {
        Self(std::env::current_dir().expect("cwd"))
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

#[tokio::test]
#[serial(cwd)]
async fn cd_updates_session_and_process_directory() {
    let _guard = CwdGuard::new();
    let mut h = harness();
    fs::create_dir(h.dir.path().join("sub")).expect("mkdir");
    let expected = h.dir.path().join("sub").canonicalize().expect("canonical");

    let target = h.path("sub");
    assert_eq!(h.run(&format!("cd {target}")).await, 0);
    assert_eq!(h.session.cwd(), expected.as_path());
    assert_eq!(std::env::current_dir().expect("cwd"), expected);

    assert_eq!(h.run("cd ..").await, 0);
    assert_eq!(h.session.cwd(), expected.parent().expect("parent"));
}

#[tokio::test]
#[serial(cwd)]
async fn cd_to_missing_directory_fails() {
    let _guard = CwdGuard::new();
    let mut h = harness();
    let before = h.session.cwd().to_path_buf();

    let missing = h.path("missing");
    assert_eq!(h.run(&format!("cd {missing}")).await, 1);
    assert!(h.err.text().starts_with(&format!("ghsh: cd: {missing}: ")));
    assert_eq!(h.session.cwd(), before.as_path());
}

#[tokio::test]
#[serial(env)]
async fn export_sets_variables_for_later_lines() {
    let mut h = harness();
    let out = h.path("exported.txt");

    assert_eq!(h.run("export GHSH_TEST_EXPORTED=hello GHSH_TEST_EMPTY=").await, 0);
    h.run(&format!("echo $GHSH_TEST_EXPORTED > {out}")).await;
    assert_eq!(fs::read_to_string(&out).expect("read"), "hello\n");
    assert_eq!(std::env::var("GHSH_TEST_EMPTY").as_deref(), Ok(""));

    assert_eq!(h.run("export 9bad=x").await, 1);
    assert_eq!(h.err.text(), "ghsh: export: `9bad=x': not a valid identifier\n");

    unsafe {
        std::env::remove_var("GHSH_TEST_EXPORTED");
        std::env::remove_var("GHSH_TEST_EMPTY");
    }
}

#[tokio::test]
async fn exit_sets_the_latch_once() {
    let mut h = harness();
    assert_eq!(h.run("exit 300").await, 44);
    assert!(h.session.should_exit());
    h.run("exit 1").await;
    assert_eq!(h.session.exit_status(), 44);
}

#[tokio::test]
async fn exit_without_argument_keeps_last_status() {
    let mut h = harness();
    h.run("false").await;
    h.run("exit").await;
    assert_eq!(h.session.exit_status(), 1);
}

#[tokio::test]
async fn history_lists_numbered_entries() {
    let mut h = harness();
    h.session.record_history("ls -la");
    h.session.record_history("   ");
    h.session.record_history("echo hi");

    assert_eq!(h.run("history").await, 0);
    assert_eq!(h.out.text(), "    1  ls -la\n    2  echo hi\n");
}

#[tokio::test]
async fn source_runs_lines_and_feeds_heredocs() {
    let mut h = harness();
    let out = h.path("sourced.txt");
    let script = h.path("script.ghsh");
    fs::write(
        &script,
        format!("# comment\n\necho one > {out}\ncat <<EOF >> {out}\ntwo\nEOF\nfalse\n"),
    )
    .expect("write");

    assert_eq!(h.run(&format!(". {script}")).await, 1);
    assert_eq!(fs::read_to_string(&out).expect("read"), "one\ntwo\n");
}

#[tokio::test]
async fn exit_inside_a_script_stops_it() {
    let mut h = harness();
    let out = h.path("after-exit.txt");
    let script = h.dir.path().join("exit.ghsh");
    fs::write(&script, format!("exit 5\necho never > {out}\n")).expect("write");

    assert_eq!(source_file(&mut h.session, script).await, 5);
    assert!(h.session.should_exit());
    assert!(!std::path::Path::new(&out).exists());
}

#[tokio::test]
async fn sourcing_a_missing_file_is_an_error() {
    let mut h = harness();
    let missing = h.path("nope.ghsh");
    assert_eq!(h.run(&format!("source {missing}")).await, 1);
    assert!(h.err.text().starts_with(&format!("ghsh: source: {missing}: ")));
}

#[tokio::test]
async fn self_sourcing_script_hits_the_depth_limit() {
    let mut h = harness();
    let script = h.path("loop.ghsh");
    fs::write(&script, format!("source {script}\n")).expect("write");

    h.run(&format!("source {script}")).await;
    assert!(h.err.text().contains("nested too deeply"));
}

#[tokio::test]
#[serial(env)]
async fn startup_files_run_in_order_and_may_be_missing() {
    let mut h = harness();
    let home = h.dir.path().join("home");
    fs::create_dir(&home).expect("mkdir");
    let out = h.path("startup.txt");
    fs::write(home.join(".ghshrc"), format!("echo rc >> {out}\n")).expect("write");

    let previous = std::env::var_os("HOME");
    unsafe {
        std::env::set_var("HOME", &home);
    }
    source_startup_files(&mut h.session).await;
    fs::write(home.join(".ghsh_profile"), format!("echo profile > {out}\n")).expect("write");
    source_startup_files(&mut h.session).await;
    unsafe {
        match previous {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
    }

    assert_eq!(fs::read_to_string(&out).expect("read"), "profile\nrc\n");
    assert_eq!(h.err.text(), "");
}
