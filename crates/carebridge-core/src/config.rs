//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Values are layered: built-in defaults, optional `config/default` and
//! `config/{RUN_MODE}` files, `CAREBRIDGE__SECTION__KEY` environment variables,
//! and finally the plain variable names used by existing deployments
//! (`TWILIO_ACCOUNT_SID`, `LIVEKIT_API_KEY`, `PORT`, ...).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub livekit: LiveKitConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Externally reachable base URL used to build webhook callbacks
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Directory served as static content (browser client)
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Comma separated list of allowed CORS origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

/// Telephony provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: Option<String>,

    /// Auth token
    pub auth_token: Option<String>,

    /// Source phone number for outbound calls
    pub phone_number: Option<String>,

    /// REST API base URL
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_upstream_timeout() -> u64 {
    10
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            api_base: default_twilio_api_base(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl TwilioConfig {
    /// Whether both account credentials are present
    pub fn is_configured(&self) -> bool {
        is_set(&self.account_sid) && is_set(&self.auth_token)
    }
}

/// Media-room service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LiveKitConfig {
    /// WebSocket URL handed to browser clients
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// API key used as token issuer
    pub api_key: Option<String>,

    /// API secret used to sign tokens
    pub api_secret: Option<String>,

    /// SIP domain used to bridge phone legs into rooms
    pub sip_domain: Option<String>,

    /// Participant token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Seconds a room may stay empty before the service closes it
    #[serde(default = "default_empty_timeout")]
    pub room_empty_timeout_secs: u32,

    /// Participant cap for provisioned rooms
    #[serde(default = "default_max_participants")]
    pub room_max_participants: u32,

    /// Comma separated room name prefixes reported by `/active-rooms`
    #[serde(default = "default_room_prefixes")]
    pub room_prefixes: String,

    /// Prefix of rooms created by SIP dispatch rules (`<prefix><caller number>`)
    #[serde(default = "default_dispatch_prefix")]
    pub dispatch_prefix: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_ws_url() -> String {
    "ws://localhost:7880".to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

fn default_empty_timeout() -> u32 {
    300
}

fn default_max_participants() -> u32 {
    10
}

fn default_room_prefixes() -> String {
    "twilio-tgl-,incoming-,call-".to_string()
}

fn default_dispatch_prefix() -> String {
    "twilio-tgl-".to_string()
}

impl LiveKitConfig {
    /// Whether both signing credentials are present
    pub fn is_configured(&self) -> bool {
        is_set(&self.api_key) && is_set(&self.api_secret)
    }

    /// HTTP(S) form of the WebSocket URL, used for room service calls
    pub fn http_url(&self) -> String {
        let url = self.ws_url.trim_end_matches('/');
        if let Some(rest) = url.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = url.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            url.to_string()
        }
    }

    /// Parsed room prefix list
    pub fn prefixes(&self) -> Vec<String> {
        self.room_prefixes
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Call bridging behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Audio played to callers waiting for a provider
    #[serde(default = "default_hold_music_url")]
    pub hold_music_url: String,

    /// Greeting spoken when an inbound call arrives
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Seconds between wait-for-provider polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u32,

    /// Poll count after which a waiting caller is released
    #[serde(default = "default_max_wait_polls")]
    pub max_wait_polls: u32,

    /// Dial timeout for the SIP bridge leg
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_secs: u32,

    /// Maximum entries returned by the call log endpoint
    #[serde(default = "default_call_log_limit")]
    pub call_log_limit: usize,
}

fn default_hold_music_url() -> String {
    "http://com.twilio.sounds.music.s3.amazonaws.com/MARKOVICHAMP-Borghestral.mp3".to_string()
}

fn default_greeting() -> String {
    "Thank you for calling. Please hold while we connect you to a healthcare provider."
        .to_string()
}

fn default_poll_interval() -> u32 {
    3
}

fn default_max_wait_polls() -> u32 {
    100
}

fn default_dial_timeout() -> u32 {
    30
}

fn default_call_log_limit() -> usize {
    50
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hold_music_url: default_hold_music_url(),
            greeting: default_greeting(),
            poll_interval_secs: default_poll_interval(),
            max_wait_polls: default_max_wait_polls(),
            dial_timeout_secs: default_dial_timeout(),
            call_log_limit: default_call_log_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            public_url: default_public_url(),
            static_dir: default_static_dir(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_key: None,
            api_secret: None,
            sip_domain: None,
            token_ttl_secs: default_token_ttl(),
            room_empty_timeout_secs: default_empty_timeout(),
            room_max_participants: default_max_participants(),
            room_prefixes: default_room_prefixes(),
            dispatch_prefix: default_dispatch_prefix(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn legacy(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("twilio.api_base", default_twilio_api_base())?
            .set_default("livekit.ws_url", default_ws_url())?
            .set_default("bridge.poll_interval_secs", 3)?
            .set_default("bridge.max_wait_polls", 100)?
            .set_default("bridge.dial_timeout_secs", 30)?
            .set_default("bridge.call_log_limit", 50)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CAREBRIDGE_ prefix
            .add_source(
                Environment::with_prefix("CAREBRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            // Support the plain variable names of existing deployments
            .set_override_option("server.port", legacy("PORT"))?
            .set_override_option("server.public_url", legacy("PUBLIC_BASE_URL"))?
            .set_override_option("twilio.account_sid", legacy("TWILIO_ACCOUNT_SID"))?
            .set_override_option("twilio.auth_token", legacy("TWILIO_AUTH_TOKEN"))?
            .set_override_option("twilio.phone_number", legacy("TWILIO_PHONE_NUMBER"))?
            .set_override_option("livekit.ws_url", legacy("LIVEKIT_WS_URL"))?
            .set_override_option("livekit.api_key", legacy("LIVEKIT_API_KEY"))?
            .set_override_option("livekit.api_secret", legacy("LIVEKIT_API_SECRET"))?
            .set_override_option("livekit.sip_domain", legacy("LIVEKIT_SIP_DOMAIN"))?
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CAREBRIDGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bridge_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.dial_timeout_secs, 30);
        assert_eq!(config.call_log_limit, 50);
    }

    #[test]
    fn test_livekit_http_url() {
        let mut config = LiveKitConfig::default();
        config.ws_url = "wss://demo.livekit.cloud/".to_string();
        assert_eq!(config.http_url(), "https://demo.livekit.cloud");

        config.ws_url = "ws://localhost:7880".to_string();
        assert_eq!(config.http_url(), "http://localhost:7880");

        config.ws_url = "https://already.http".to_string();
        assert_eq!(config.http_url(), "https://already.http");
    }

    #[test]
    fn test_credentials_presence() {
        let mut livekit = LiveKitConfig::default();
        assert!(!livekit.is_configured());
        livekit.api_key = Some("APIkey".to_string());
        livekit.api_secret = Some("  ".to_string());
        assert!(!livekit.is_configured());
        livekit.api_secret = Some("secret".to_string());
        assert!(livekit.is_configured());

        let twilio = TwilioConfig {
            account_sid: Some("AC1".to_string()),
            auth_token: None,
            ..Default::default()
        };
        assert!(!twilio.is_configured());
    }

    #[test]
    fn test_room_prefixes() {
        let config = LiveKitConfig {
            room_prefixes: "twilio-tgl-, incoming-,,".to_string(),
            ..Default::default()
        };
        assert_eq!(config.prefixes(), vec!["twilio-tgl-", "incoming-"]);
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("carebridge-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 4100
public_url = "https://bridge.example.com"

[twilio]
account_sid = "AC123"

[livekit]
sip_domain = "sip.example.com"

[bridge]
max_wait_polls = 5
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.server_addr(), "0.0.0.0:4100");
        assert_eq!(config.twilio.account_sid.as_deref(), Some("AC123"));
        assert_eq!(config.twilio.api_base, "https://api.twilio.com");
        assert_eq!(config.livekit.sip_domain.as_deref(), Some("sip.example.com"));
        assert_eq!(config.bridge.max_wait_polls, 5);
        assert_eq!(config.bridge.poll_interval_secs, 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
