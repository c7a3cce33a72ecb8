use std::fmt;

use ghsh_api::AuthProvider;
use zeroize::Zeroizing;

use crate::error::CredentialError;

const KEY_PREFIX: &str = "sk-";
const MIN_KEY_LEN: usize = 5;

/// API key for the completion service. The buffer is wiped on drop and the
/// value never appears in `Debug` output.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    /// Reads and validates the key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, CredentialError> {
        let raw = Zeroizing::new(
            std::env::var(var)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| CredentialError::Missing(var.to_string()))?,
        );
        Self::parse(var, &raw)
    }

    /// Requires the `sk-` prefix, strips non-printable bytes and insists on
    /// at least five remaining characters.
    pub fn parse(var: &str, raw: &str) -> Result<Self, CredentialError> {
        if !raw.starts_with(KEY_PREFIX) {
            return Err(CredentialError::BadPrefix(var.to_string()));
        }
        let cleaned: Zeroizing<String> = Zeroizing::new(
            raw.chars()
                .filter(|c| matches!(c, ' '..='~'))
                .collect(),
        );
        if cleaned.len() < MIN_KEY_LEN {
            return Err(CredentialError::TooShort(var.to_string()));
        }
        Ok(Self(cleaned))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl AuthProvider for ApiKey {
    fn bearer_token(&self) -> Option<String> {
        Some(self.expose().to_string())
    }
}
