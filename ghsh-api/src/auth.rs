use ghsh_client::Request;
use http::HeaderValue;

/// Supplies the bearer token attached to every API request.
///
/// Implementations should be cheap and non-blocking.
pub trait AuthProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

pub(crate) fn add_auth_headers<A: AuthProvider>(auth: &A, mut req: Request) -> Request {
    if let Some(token) = auth.bearer_token()
        && let Ok(mut header) = HeaderValue::from_str(&format!("Bearer {token}"))
    {
        header.set_sensitive(true);
        let _ = req.headers.insert(http::header::AUTHORIZATION, header);
    }
    req
}
