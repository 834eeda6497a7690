//! Anon-key credential for the hosted backend.
//!
//! The backend expects its publishable key twice on every REST request: an
//! `apikey` header and a bearer `Authorization` header.

use reqwest::RequestBuilder;

/// Marker the sample configuration leaves in an unconfigured project URL.
pub const PLACEHOLDER_URL_MARKER: &str = "your-project-id";
/// Anon key value the sample configuration ships with.
pub const PLACEHOLDER_ANON_KEY: &str = "your-anon-key-here";

/// Publishable anon-key credential.
///
/// An empty key is allowed and applies no headers: the backend then answers
/// with its own authentication error, so a half-configured environment
/// stays diagnosable instead of failing at construction.
///
/// # Examples
///
/// ```rust
/// use folio_link::Credential;
///
/// let credential = Credential::anon_key("public-anon-key");
/// assert!(credential.is_configured());
///
/// let missing = Credential::none();
/// assert!(!missing.is_configured());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Credential {
    anon_key: String,
}

impl Credential {
    /// Wrap an anon key. Empty keys are allowed (see type docs).
    pub fn anon_key(key: impl Into<String>) -> Self {
        Self {
            anon_key: key.into(),
        }
    }

    /// No credential at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The raw key, for transports that carry it as a query parameter.
    pub(crate) fn key(&self) -> &str {
        &self.anon_key
    }

    /// Attach the backend's header pair to an outbound request.
    pub(crate) fn apply_to_request(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.anon_key.is_empty() {
            return builder;
        }
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    /// Whether a real key is present (non-empty, not the sample value).
    pub fn is_configured(&self) -> bool {
        !self.anon_key.is_empty() && !self.is_placeholder()
    }

    /// Whether the key is the sample-config placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.anon_key == PLACEHOLDER_ANON_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_request(credential: &Credential) -> reqwest::Request {
        let client = reqwest::Client::new();
        let builder = client.get("http://localhost/rest/v1/contacts");
        credential
            .apply_to_request(builder)
            .build()
            .expect("request")
    }

    #[test]
    fn test_header_pair_applied() {
        let request = built_request(&Credential::anon_key("abc123"));
        assert_eq!(
            request.headers().get("apikey").map(|v| v.to_str().unwrap()),
            Some("abc123")
        );
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .map(|v| v.to_str().unwrap()),
            Some("Bearer abc123")
        );
    }

    #[test]
    fn test_empty_key_applies_nothing() {
        let request = built_request(&Credential::none());
        assert!(request.headers().get("apikey").is_none());
        assert!(request.headers().get("Authorization").is_none());
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(Credential::anon_key(PLACEHOLDER_ANON_KEY).is_placeholder());
        assert!(!Credential::anon_key(PLACEHOLDER_ANON_KEY).is_configured());
        assert!(!Credential::anon_key("real-key").is_placeholder());
        assert!(!Credential::none().is_configured());
    }
}
