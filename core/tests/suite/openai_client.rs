use std::time::Duration;

use ghsh_api::ChatMessage;
use ghsh_api::Role;
use ghsh_core::config::Config;
use ghsh_core::config::ConfigOverrides;
use ghsh_core::config::ConfigToml;
use ghsh_core::ghost::CompletionService;
use ghsh_core::ghost::OpenAiCompletion;
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::harness_with;

const KEY_VAR: &str = "GHSH_TEST_OPENAI_KEY";

fn config(server: &MockServer) -> Config {
    Config::load_from_base_config_with_overrides(
        ConfigToml {
            base_url: Some(format!("{}/v1", server.uri())),
            api_key_env: Some(KEY_VAR.to_string()),
            system_prompt: Some("only commands".to_string()),
            request_timeout_secs: Some(5),
            ..ConfigToml::default()
        },
        ConfigOverrides {
            model: Some("test-model".to_string()),
        },
        std::env::temp_dir(),
    )
}

#[tokio::test]
#[serial(env)]
async fn sends_system_prompt_history_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "only commands"},
                {"role": "user", "content": "list files"},
            ],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "ls -la\n"}}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    // SAFETY: serialised with every other test that touches the environment.
    unsafe {
        std::env::set_var(KEY_VAR, "sk-test-key");
    }
    let config = config(&server);
    let service = OpenAiCompletion::from_config(&config).expect("client");
    let reply = service
        .complete(&config.system_prompt, &[ChatMessage::new(Role::User, "list files")])
        .await
        .expect("reply");
    unsafe {
        std::env::remove_var(KEY_VAR);
    }

    assert_eq!(reply, "ls -la\n");
    assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
}

#[tokio::test]
#[serial(env)]
async fn reply_without_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    unsafe {
        std::env::set_var(KEY_VAR, "sk-another-key");
    }
    let config = config(&server);
    let service = OpenAiCompletion::from_config(&config).expect("client");
    let result = service.complete("sys", &[]).await;
    unsafe {
        std::env::remove_var(KEY_VAR);
    }

    assert!(result.is_err());
}

#[test]
#[serial(env)]
fn malformed_key_is_rejected_before_any_request() {
    unsafe {
        std::env::set_var(KEY_VAR, "pk-wrong-prefix");
    }
    let config = Config::load_from_base_config_with_overrides(
        ConfigToml {
            api_key_env: Some(KEY_VAR.to_string()),
            ..ConfigToml::default()
        },
        ConfigOverrides::default(),
        std::env::temp_dir(),
    );
    let result = OpenAiCompletion::from_config(&config);
    unsafe {
        std::env::remove_var(KEY_VAR);
    }

    let err = result.err().expect("bad prefix");
    assert_eq!(
        err.to_string(),
        "GHSH_TEST_OPENAI_KEY does not look like an API key (expected an `sk-` prefix)"
    );
}

#[tokio::test]
#[serial(env)]
async fn rejected_request_is_reported_on_one_line() {
    let server = MockServer::start().await;
    let body = serde_json::to_string_pretty(&json!({
        "error": {
            "message": "Incorrect API key provided",
            "type": "invalid_request_error",
            "code": "invalid_api_key",
        }
    }))
    .expect("json");
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(body))
        .mount(&server)
        .await;

    unsafe {
        std::env::set_var(KEY_VAR, "sk-revoked-key");
    }
    let mut h = harness_with(ConfigToml {
        base_url: Some(format!("{}/v1", server.uri())),
        api_key_env: Some(KEY_VAR.to_string()),
        ..ConfigToml::default()
    });
    let ask_status = h.run("ask hello").await;
    let ask_err = h.err.text();
    let call_status = h.run("call list the files").await;
    unsafe {
        std::env::remove_var(KEY_VAR);
    }

    assert_eq!(ask_status, 1);
    assert_eq!(ask_err, "ghsh: ask: request failed: http 401 Unauthorized\n");
    assert_eq!(call_status, 1);
    let err = h.err.text();
    assert_eq!(err.lines().count(), 2, "{err}");
    assert!(
        err.ends_with("ghsh: call: request failed: http 401 Unauthorized\n"),
        "{err}"
    );
    assert!(!err.contains("invalid_api_key"), "{err}");
}
