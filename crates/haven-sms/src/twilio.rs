//! Twilio Messages API adapter

use crate::error::{Error, Result};
use crate::transport::{SmsTransport, MAX_SMS_LENGTH};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Show only the tail of a secret in Debug output
fn mask_secret(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &secret[secret.len() - 4..])
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Twilio adapter configuration
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: String,
    /// Auth token
    pub auth_token: String,
    /// Sending phone number (E.164)
    pub from_number: String,
    /// Base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

// Custom Debug so the auth token never lands in logs
impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &mask_secret(&self.auth_token))
            .field("from_number", &self.from_number)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TwilioConfig {
    /// Create with required fields
    #[must_use]
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Create from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, or
    /// `TWILIO_FROM_NUMBER` is not set.
    pub fn from_env() -> Result<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| Error::NotConfigured("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| Error::NotConfigured("TWILIO_AUTH_TOKEN not set".to_string()))?;
        let from_number = std::env::var("TWILIO_FROM_NUMBER")
            .map_err(|_| Error::NotConfigured("TWILIO_FROM_NUMBER not set".to_string()))?;

        Ok(Self::new(account_sid, auth_token, from_number))
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

/// Twilio-backed SMS transport
pub struct TwilioTransport {
    config: TwilioConfig,
    client: Client,
}

impl TwilioTransport {
    /// Create a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("http client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    #[instrument(skip(self, body), fields(to = %to, chars = body.len()))]
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        if body.len() > MAX_SMS_LENGTH {
            return Err(Error::TooLong(body.len()));
        }

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit);
        }
        if !status.is_success() {
            let detail = response
                .json::<TwilioErrorBody>()
                .await
                .map(|body| match body.code {
                    Some(code) => format!("{} (code {})", body.message, code),
                    None => body.message,
                })
                .unwrap_or_else(|_| format!("http status {}", status));
            warn!(status = %status, "send rejected by vendor");
            return Err(Error::Rejected(detail));
        }

        let message: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Rejected(format!("unreadable response: {}", e)))?;

        debug!(sid = %message.sid, "message accepted");
        Ok(message.sid)
    }
}
