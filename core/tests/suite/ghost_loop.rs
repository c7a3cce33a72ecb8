use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use ghsh_api::ApiError;
use ghsh_api::ChatMessage;
use ghsh_api::Role;
use ghsh_core::config::ConfigToml;
use ghsh_core::ghost::CompletionService;
use pretty_assertions::assert_eq;

use crate::suite::Harness;
use crate::suite::harness_with;

type Requests = Arc<Mutex<Vec<Vec<ChatMessage>>>>;

/// Plays back canned replies, repeating the last one when the script runs
/// out. `None` entries fail the request.
struct FakeService {
    replies: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<String>>,
    requests: Requests,
}

#[async_trait]
impl CompletionService for FakeService {
    async fn complete(&self, _instructions: &str, input: &[ChatMessage]) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(input.to_vec());
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.replies.lock().unwrap().pop_front() {
            *last = next;
        }
        last.clone().ok_or(ApiError::EmptyResponse)
    }
}

fn with_fake(cfg: ConfigToml, replies: &[Option<&str>]) -> (Harness, Requests) {
    let requests = Requests::default();
    let service = FakeService {
        replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
        last: Mutex::new(None),
        requests: Arc::clone(&requests),
    };
    let mut h = harness_with(cfg);
    h.session = h.session.with_completion_service(Box::new(service));
    (h, requests)
}

#[tokio::test]
async fn call_runs_suggestions_until_success() {
    let (mut h, requests) = with_fake(ConfigToml::default(), &[
        Some("echo first"),
        Some("needs more"),
        Some("echo second"),
        Some("SUCCESS"),
    ]);

    let status = h.run("call print two words").await;

    assert_eq!(status, 0);
    let out = h.out.text();
    assert!(out.contains("echo first\nfirst\n"), "{out}");
    assert!(out.contains("echo second\nsecond\n"), "{out}");
    assert_eq!(requests.lock().unwrap().len(), 4);
    assert_eq!(h.err.text(), "");
}

#[tokio::test]
async fn follow_up_loop_is_bounded() {
    let cfg = ConfigToml {
        max_followup_attempts: Some(3),
        ..ConfigToml::default()
    };
    let (mut h, requests) = with_fake(cfg, &[Some("echo again")]);

    let status = h.run("call something impossible").await;

    assert_eq!(status, 1);
    assert_eq!(
        h.err.text(),
        "ghsh: call: giving up after 3 follow-up attempts\n"
    );
    // One initial request, four analyses, three follow-ups.
    assert_eq!(requests.lock().unwrap().len(), 8);
}

#[tokio::test]
async fn history_stays_within_its_ceiling() {
    let cfg = ConfigToml {
        max_followup_attempts: Some(10),
        max_history_messages: Some(6),
        ..ConfigToml::default()
    };
    let (mut h, requests) = with_fake(cfg, &[Some("echo loop")]);

    h.run("call loop forever").await;

    let requests = requests.lock().unwrap();
    assert!(requests.iter().all(|input| input.len() <= 6));
    let history = h.session.ai_context().expect("ai").history();
    assert_eq!(history.len(), 6);
    assert!(history.items().all(|item| !item.content.is_empty()));
}

#[tokio::test]
async fn failed_request_aborts_call() {
    let (mut h, _requests) = with_fake(ConfigToml::default(), &[Some("echo ran"), None]);

    let status = h.run("call break during analysis").await;

    assert_eq!(status, 1);
    assert!(h.out.text().contains("ran\n"));
    assert_eq!(
        h.err.text(),
        "ghsh: call: request failed: completion service returned an empty response\n"
    );
}

#[tokio::test]
async fn ask_prints_the_reply_without_running_it() {
    let marker = tempfile::TempDir::new().expect("tempdir");
    let target = marker.path().join("created");
    let reply = format!("touch {}\n", target.display());
    let (mut h, requests) = with_fake(ConfigToml::default(), &[Some(reply.as_str())]);

    let status = h.run("ask how do I create a file").await;

    assert_eq!(status, 0);
    assert_eq!(h.out.text(), reply);
    assert!(!target.exists());
    let ai = h.session.ai_context().expect("ai");
    assert!(!ai.ghost_mode());
    assert_eq!(ai.last_response(), Some(reply.as_str()));

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0], vec![ChatMessage::new(
        Role::User,
        "how do I create a file"
    )]);
}

#[tokio::test]
async fn missing_credential_disables_ai_for_the_session() {
    let cfg = ConfigToml {
        api_key_env: Some("GHSH_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
        ..ConfigToml::default()
    };
    let mut h = harness_with(cfg);

    assert_eq!(h.run("call list files").await, 1);
    assert_eq!(h.run("ask anything").await, 1);

    let line = "ghsh: AI mode unavailable: GHSH_TEST_KEY_THAT_IS_NEVER_SET is not set\n";
    assert_eq!(h.err.text(), format!("{line}{line}"));
    assert!(h.session.ai_context().is_none());
}

#[tokio::test]
async fn call_without_prompt_is_a_usage_error() {
    let (mut h, requests) = with_fake(ConfigToml::default(), &[Some("SUCCESS")]);

    assert_eq!(h.run("call").await, 2);
    assert!(requests.lock().unwrap().is_empty());
}
