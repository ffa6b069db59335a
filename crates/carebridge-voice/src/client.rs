//! Telephony REST client
//!
//! Only call origination is needed; everything else the provider tells us
//! arrives through webhooks.

use async_trait::async_trait;
use carebridge_core::config::TwilioConfig;
use carebridge_core::error::AppError;
use carebridge_core::traits::{OriginateCall, OriginatedCall, VoiceProvider};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

const API_VERSION: &str = "2010-04-01";

/// Errors of the telephony client
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: request took longer than {0}s")]
    Timeout(u64),

    #[error("Telephony API error {status} (code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Markup error: {0}")]
    Markup(String),
}

impl From<VoiceError> for AppError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(msg) => AppError::Config(msg),
            VoiceError::Markup(msg) => AppError::Internal(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[derive(Clone)]
struct Credentials {
    account_sid: String,
    auth_token: String,
}

/// Call resource returned by the Calls endpoint
#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
    #[serde(default)]
    status: String,
}

/// Error body returned by the REST API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// REST client for the telephony provider
pub struct TwilioClient {
    http_client: Client,
    api_base: String,
    credentials: Option<Credentials>,
    timeout_secs: u64,
}

impl TwilioClient {
    /// Build a client from configuration
    ///
    /// Missing credentials are not an error here; they surface as
    /// [`VoiceError::Config`] on the first origination attempt.
    pub fn new(config: &TwilioConfig) -> Result<Self, VoiceError> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| VoiceError::Connection(e.to_string()))?;

        let credentials = match (&config.account_sid, &config.auth_token) {
            (Some(sid), Some(token)) if !sid.trim().is_empty() && !token.trim().is_empty() => {
                Some(Credentials {
                    account_sid: sid.trim().to_string(),
                    auth_token: token.trim().to_string(),
                })
            }
            _ => None,
        };

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn calls_url(&self, account_sid: &str) -> String {
        format!(
            "{}/{}/Accounts/{}/Calls.json",
            self.api_base, API_VERSION, account_sid
        )
    }

    /// Form fields for the Calls endpoint
    ///
    /// `StatusCallbackEvent` is repeated once per subscribed event.
    fn call_form(request: &OriginateCall) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("To", request.to.clone()),
            ("From", request.from.clone()),
            ("Url", request.instruction_url.clone()),
            ("Method", "POST".to_string()),
            ("StatusCallback", request.status_callback_url.clone()),
            ("StatusCallbackMethod", "POST".to_string()),
        ];
        form.extend(
            request
                .status_events
                .iter()
                .map(|event| ("StatusCallbackEvent", event.as_str().to_string())),
        );
        form
    }

    /// Create an outbound call
    #[instrument(skip(self, request), fields(to = %request.to))]
    pub async fn create_call(&self, request: &OriginateCall) -> Result<OriginatedCall, VoiceError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| VoiceError::Config("Twilio credentials not configured".to_string()))?;

        if request.from.trim().is_empty() {
            return Err(VoiceError::Config(
                "Twilio phone number not configured".to_string(),
            ));
        }

        let url = self.calls_url(&credentials.account_sid);
        debug!("Originating call via {}", url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&Self::call_form(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VoiceError::Timeout(self.timeout_secs)
                } else {
                    VoiceError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VoiceError::ParseError(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or(ApiErrorBody {
                code: 0,
                message: text,
            });
            error!(
                status = status.as_u16(),
                code = body.code,
                "Call origination rejected: {}",
                body.message
            );
            return Err(VoiceError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }

        let call: CallResource = serde_json::from_str(&text).map_err(|e| {
            VoiceError::ParseError(format!("Failed to parse JSON: {} - Body: {}", e, text))
        })?;

        info!(call_id = %call.sid, status = %call.status, "Outbound call created");

        Ok(OriginatedCall {
            call_id: call.sid,
            status: call.status,
        })
    }
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("api_base", &self.api_base)
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[async_trait]
impl VoiceProvider for TwilioClient {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn originate_call(&self, request: &OriginateCall) -> Result<OriginatedCall, AppError> {
        self.create_call(request).await.map_err(AppError::from)
    }
}
