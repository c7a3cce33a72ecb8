use crate::error::TransportError;
use crate::request::Request;
use crate::request::Response;
use async_trait::async_trait;
use tracing::Level;
use tracing::debug;
use tracing::enabled;
use tracing::trace;
use tracing::warn;

const USER_AGENT: &str = concat!("ghsh/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response, TransportError>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// A client that identifies itself as `ghsh/<version>`.
    pub fn with_default_settings() -> Result<Self, TransportError> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map(Self::new)
            .map_err(|err| TransportError::Build(err.to_string()))
    }

    fn build(&self, req: Request) -> reqwest::RequestBuilder {
        let Request {
            method,
            url,
            headers,
            body,
            timeout,
        } = req;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder
    }

    fn map_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, req: Request) -> Result<Response, TransportError> {
        if enabled!(Level::TRACE) {
            trace!(
                "{} to {}: {}",
                req.method,
                req.url,
                req.body.as_ref().unwrap_or_default()
            );
        }

        let method = req.method.clone();
        let url = req.url.clone();
        let resp = self.build(req).send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "request failed");
            Self::map_error(err)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        debug!(
            %method,
            %url,
            %status,
            request_id = ?headers.get("x-request-id"),
            "request completed"
        );

        let bytes = resp.bytes().await.map_err(Self::map_error)?;
        if !status.is_success() {
            let body = String::from_utf8(bytes.to_vec()).ok();
            warn!(
                %status,
                %url,
                body = body.as_deref().unwrap_or("<binary>"),
                "completion service rejected the request"
            );
            return Err(TransportError::Http {
                status,
                url: Some(url),
                headers: Some(headers),
                body,
            });
        }
        Ok(Response {
            status,
            headers,
            body: bytes,
        })
    }
}
