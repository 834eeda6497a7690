//! Outbound contact-form relay.
//!
//! Independent of the table backend: one JSON POST to the third-party form
//! service, judged solely by the `success` flag in its response. No
//! retries; a failed submission is reported, never replayed.

use crate::error::{FolioError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default submission endpoint of the form relay service.
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.web3forms.com/submit";

/// One visitor message, as the relay expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Wire shape of a submission: the access key plus the message fields,
/// flattened into one object.
#[derive(Serialize)]
struct RelayRequest<'a> {
    access_key: &'a str,
    #[serde(flatten)]
    message: &'a ContactMessage,
}

#[derive(Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Form relay client.
///
/// # Examples
///
/// ```rust,no_run
/// use folio_link::{ContactMessage, FormRelay};
///
/// # async fn example() -> folio_link::Result<()> {
/// let relay = FormRelay::new("relay-access-key")?;
/// relay
///     .send(&ContactMessage {
///         name: "Ada".into(),
///         email: "ada@example.com".into(),
///         subject: "Hello".into(),
///         message: "Saw your work.".into(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct FormRelay {
    endpoint: String,
    access_key: String,
    http_client: reqwest::Client,
}

impl FormRelay {
    /// Relay bound to the default endpoint.
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(DEFAULT_RELAY_ENDPOINT, access_key)
    }

    /// Relay bound to a custom endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>, access_key: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FolioError::Configuration(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            http_client,
        })
    }

    /// Send one message.
    ///
    /// Success is whatever the relay's response says it is: `Ok(())` only
    /// when the payload carries `success: true`. Rejections and transport
    /// failures come back as [`FolioError::Relay`] with the relay's
    /// message when it supplied one.
    pub async fn send(&self, message: &ContactMessage) -> Result<()> {
        let request = RelayRequest {
            access_key: &self.access_key,
            message,
        };

        debug!("[RELAY] Submitting contact form from '{}'", message.email);
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("[RELAY] Transport failure: {}", e);
                FolioError::Relay(e.to_string())
            })?;

        let status = response.status();
        let body: RelayResponse = response.json().await.map_err(|e| {
            warn!("[RELAY] Unreadable response: {}", e);
            FolioError::Relay(format!("unreadable relay response: {}", e))
        })?;

        if body.success {
            debug!("[RELAY] Submission accepted");
            Ok(())
        } else {
            let message = body.message.unwrap_or_else(|| {
                format!("relay rejected the submission (HTTP {})", status.as_u16())
            });
            warn!("[RELAY] Submission rejected: {}", message);
            Err(FolioError::Relay(message))
        }
    }
}
