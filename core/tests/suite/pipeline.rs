use std::fs;
use std::time::Duration;
use std::time::Instant;

use ghsh_core::pipeline::EXIT_NOT_EXECUTABLE;
use ghsh_core::pipeline::EXIT_NOT_FOUND;
use pretty_assertions::assert_eq;

use crate::suite::harness;

#[tokio::test]
async fn three_stage_pipeline_reports_last_status() {
    let mut h = harness();
    let out = h.path("count.txt");

    let status = h.run(&format!("printf 'x\\n' | cat | wc -l > {out}")).await;

    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out).expect("read").trim(), "1");
}

#[tokio::test]
async fn status_is_taken_from_the_last_stage() {
    let mut h = harness();
    assert_eq!(h.run("false | true").await, 0);
    assert_eq!(h.run("true | false").await, 1);
    assert_eq!(h.session.last_status(), 1);
}

#[tokio::test]
async fn signalled_stage_maps_to_128_plus_signal() {
    let mut h = harness();
    assert_eq!(h.run("sh -c 'kill -KILL $$'").await, 128 + 9);
}

#[tokio::test]
async fn background_pipeline_returns_immediately() {
    let mut h = harness();
    let started = Instant::now();

    let status = h.run("sleep 5 &").await;

    assert_eq!(status, 0);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(h.session.background_jobs(), 1);
    assert!(h.out.text().starts_with("[1] "));
}

#[tokio::test]
async fn finished_background_job_is_announced() {
    let mut h = harness();
    h.run("true &").await;

    let deadline = Instant::now() + Duration::from_secs(10);
    while h.session.background_jobs() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
        h.session.reap_jobs();
    }

    assert_eq!(h.session.background_jobs(), 0);
    assert!(h.out.text().ends_with("[1] Done true &\n"), "{}", h.out.text());
}

#[tokio::test]
async fn unknown_command_is_127() {
    let mut h = harness();
    assert_eq!(h.run("ghsh-no-such-command-xyz").await, EXIT_NOT_FOUND);
}

#[tokio::test]
async fn non_executable_file_is_126() {
    let mut h = harness();
    let script = h.path("plain.sh");
    fs::write(&script, "echo hi\n").expect("write");

    assert_eq!(h.run(&script).await, EXIT_NOT_EXECUTABLE);
}

#[tokio::test]
async fn redirections_truncate_and_append() {
    let mut h = harness();
    let input = h.path("in.txt");
    let output = h.path("out.txt");
    fs::write(&input, "b\na\n").expect("write");

    assert_eq!(h.run(&format!("sort < {input} > {output}")).await, 0);
    assert_eq!(h.run(&format!("echo c >> {output}")).await, 0);
    assert_eq!(fs::read_to_string(&output).expect("read"), "a\nb\nc\n");

    assert_eq!(h.run(&format!("echo fresh > {output}")).await, 0);
    assert_eq!(fs::read_to_string(&output).expect("read"), "fresh\n");
}

#[tokio::test]
async fn missing_input_file_launches_nothing() {
    let mut h = harness();
    let input = h.path("missing.txt");
    let output = h.path("never.txt");

    let status = h.run(&format!("cat < {input} > {output}")).await;

    assert_eq!(status, 1);
    assert!(h.err.text().starts_with("ghsh: "));
    assert!(!std::path::Path::new(&output).exists());
}

#[tokio::test]
async fn heredoc_becomes_stdin() {
    let mut h = harness();
    let output = h.path("doc.txt");
    let mut body = vec!["one".to_string(), "two".to_string(), "END".to_string()].into_iter();

    let status = h
        .session
        .execute_line(&format!("cat <<END > {output}"), &mut body)
        .await;

    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&output).expect("read"), "one\ntwo\n");
}

#[tokio::test]
async fn environment_is_expanded_before_parsing() {
    let mut h = harness();
    let output = h.path("env.txt");

    h.run(&format!("echo ${{GHSH_TEST_UNSET_VAR}}x$GHSH_TEST_UNSET_VAR > {output}"))
        .await;

    assert_eq!(fs::read_to_string(&output).expect("read"), "x\n");
}
