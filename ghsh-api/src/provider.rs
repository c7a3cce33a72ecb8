use ghsh_client::Request;
use http::Method;
use http::header::HeaderMap;
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP endpoint configuration for a Chat Completions deployment.
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    pub headers: HeaderMap,
    pub request_timeout: Option<Duration>,
}

impl Provider {
    pub fn openai(base_url: Option<String>, request_timeout: Option<Duration>) -> Self {
        Self {
            name: "openai".to_string(),
            base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            headers: HeaderMap::new(),
            request_timeout,
        }
    }

    pub fn url_for_path(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn build_request(&self, method: Method, path: &str) -> Request {
        Request {
            method,
            url: self.url_for_path(path),
            headers: self.headers.clone(),
            body: None,
            timeout: self.request_timeout,
        }
    }
}
