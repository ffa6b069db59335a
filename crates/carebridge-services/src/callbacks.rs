//! Public webhook URLs handed to the telephony provider

use carebridge_core::{AppError, AppResult};
use url::Url;

pub const CONNECT_SIP_PATH: &str = "/api/twiml/connect-sip";
pub const WAIT_FOR_PROVIDER_PATH: &str = "/api/twiml/wait-for-provider";
pub const CALL_STATUS_PATH: &str = "/api/call-status";

/// Builds absolute webhook URLs under the server's public base URL
#[derive(Debug, Clone)]
pub struct CallbackUrls {
    base: Url,
}

impl CallbackUrls {
    /// # Errors
    ///
    /// `AppError::Config` when `public_url` is not an absolute http(s) URL.
    pub fn new(public_url: &str) -> AppResult<Self> {
        let base = Url::parse(public_url.trim()).map_err(|e| {
            AppError::Config(format!("Invalid public base URL '{}': {}", public_url, e))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Public base URL must be http(s): {}",
                public_url
            )));
        }

        Ok(Self { base })
    }

    /// Connection webhook for an outbound call's room
    pub fn connect_sip(&self, room_name: &str) -> String {
        self.endpoint(CONNECT_SIP_PATH, &[("room", room_name)])
    }

    /// Status webhook
    pub fn call_status(&self) -> String {
        self.endpoint(CALL_STATUS_PATH, &[])
    }

    /// Next poll of a waiting inbound caller
    pub fn wait_for_provider(&self, call_sid: &str, attempt: u32) -> String {
        self.endpoint(
            WAIT_FOR_PROVIDER_PATH,
            &[("callSid", call_sid), ("attempt", &attempt.to_string())],
        )
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, path));
        url.set_query(None);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_from_root_base() {
        let urls = CallbackUrls::new("https://bridge.example.org/").unwrap();
        assert_eq!(
            urls.connect_sip("call-p1-1700000000000"),
            "https://bridge.example.org/api/twiml/connect-sip?room=call-p1-1700000000000"
        );
        assert_eq!(urls.call_status(), "https://bridge.example.org/api/call-status");
        assert_eq!(
            urls.wait_for_provider("CA123", 4),
            "https://bridge.example.org/api/twiml/wait-for-provider?callSid=CA123&attempt=4"
        );
    }

    #[test]
    fn test_urls_keep_base_path() {
        let urls = CallbackUrls::new("https://example.org/telehealth").unwrap();
        assert_eq!(
            urls.call_status(),
            "https://example.org/telehealth/api/call-status"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            CallbackUrls::new("not a url"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            CallbackUrls::new("ftp://example.org"),
            Err(AppError::Config(_))
        ));
    }
}
