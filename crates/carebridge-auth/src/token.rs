//! Token issuance and validation
//!
//! Tokens are HS256 JWTs signed with the media service API secret, with the
//! API key as issuer.

use crate::claims::{Claims, VideoGrant};
use carebridge_core::error::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Lifetime of tokens the server uses for its own room service calls
const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(600);

/// Identity used for service tokens
const SERVICE_IDENTITY: &str = "carebridge-server";

/// Signing material, present only when both credentials are configured
#[derive(Clone)]
struct Credentials {
    api_key: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Issues media-room access tokens
///
/// Stateless apart from the cached keys; safe to share across workers.
#[derive(Clone)]
pub struct TokenIssuer {
    credentials: Option<Credentials>,
}

impl TokenIssuer {
    /// Create a new issuer
    ///
    /// Missing or blank credentials are accepted here; every issuing call then
    /// fails with `AppError::Config`.
    pub fn new(api_key: Option<String>, api_secret: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let api_secret = api_secret.filter(|s| !s.trim().is_empty());

        let credentials = match (api_key, api_secret) {
            (Some(api_key), Some(secret)) => Some(Credentials {
                api_key,
                encoding_key: EncodingKey::from_secret(secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            }),
            _ => None,
        };

        Self { credentials }
    }

    /// Whether tokens can be issued
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&Credentials, AppError> {
        self.credentials.as_ref().ok_or_else(|| {
            error!("LiveKit credentials not configured");
            AppError::Config("LiveKit credentials not configured".to_string())
        })
    }

    /// Issue a token for `identity` with the given grant
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the API key or secret is missing, and
    /// `AppError::Internal` if signing fails.
    pub fn issue_token(
        &self,
        identity: &str,
        grant: &VideoGrant,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let credentials = self.credentials()?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: credentials.api_key.clone(),
            sub: identity.to_string(),
            jti: identity.to_string(),
            nbf: now,
            exp: now + ttl.as_secs() as i64,
            name: Some(identity.to_string()),
            video: grant.clone(),
        };

        debug!(
            participant = %identity,
            room = ?grant.room,
            exp = %claims.exp,
            "Creating access token"
        );

        encode(&Header::new(Algorithm::HS256), &claims, &credentials.encoding_key).map_err(|e| {
            error!(error = %e, participant = %identity, "Failed to sign access token");
            AppError::Internal(format!("Token creation failed: {}", e))
        })
    }

    /// Issue a participant token with full rights in `room`
    pub fn participant_token(
        &self,
        identity: &str,
        room: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        self.issue_token(identity, &VideoGrant::participant(room), ttl)
    }

    /// Issue the short-lived token used to call the room service
    pub fn service_token(&self) -> Result<String, AppError> {
        self.issue_token(SERVICE_IDENTITY, &VideoGrant::room_service(), SERVICE_TOKEN_TTL)
    }

    /// Validate a token and extract claims
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` without credentials and
    /// `AppError::InvalidInput` if the token is malformed, expired or signed
    /// with another secret.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let credentials = self.credentials()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[credentials.api_key.as_str()]);

        let data = decode::<Claims>(token, &credentials.decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Invalid access token");
            AppError::InvalidInput(format!("Token validation failed: {}", e))
        })?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field(
                "api_key",
                &self.credentials.as_ref().map(|c| c.api_key.as_str()),
            )
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
