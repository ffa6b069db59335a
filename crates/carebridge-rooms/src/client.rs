//! HTTP client for the room service
//!
//! Low-level Twirp calls plus the `RoomService` implementation used by the
//! call-flow services.

use async_trait::async_trait;
use carebridge_auth::TokenIssuer;
use carebridge_core::error::AppError;
use carebridge_core::models::{RoomHandle, RoomSummary};
use carebridge_core::traits::RoomService;
use reqwest::{Client, ClientBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use super::types::{
    CreateRoomRequest, DeleteRoomRequest, ListRoomsRequest, ListRoomsResponse, Room, TwirpError,
};

const TWIRP_SERVICE_PATH: &str = "/twirp/livekit.RoomService";

/// Client for the room service
pub struct RoomServiceClient {
    http_client: Client,
    base_url: String,
    issuer: TokenIssuer,
    timeout_secs: u64,
}

/// Errors of the room service client
#[derive(Debug, Error)]
pub enum RoomServiceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: request took longer than {0}s")]
    Timeout(u64),

    #[error("Room service error {status} ({code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<RoomServiceError> for AppError {
    fn from(err: RoomServiceError) -> Self {
        match err {
            RoomServiceError::Config(msg) => AppError::Config(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl RoomServiceClient {
    /// Create a new room service client
    ///
    /// # Arguments
    ///
    /// * `base_url` - HTTP(S) URL of the service (e.g. "https://demo.livekit.cloud")
    /// * `issuer` - Token issuer used to authenticate each call
    /// * `timeout_secs` - Request timeout
    pub fn new(
        base_url: &str,
        issuer: TokenIssuer,
        timeout_secs: u64,
    ) -> Result<Self, RoomServiceError> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| RoomServiceError::Connection(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            issuer,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute one Twirp method
    #[instrument(skip(self, body), fields(method = %method))]
    async fn call<T, R>(&self, method: &str, body: &T) -> Result<R, RoomServiceError>
    where
        T: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let token = self
            .issuer
            .service_token()
            .map_err(|e| RoomServiceError::Config(e.to_string()))?;

        let url = format!("{}{}/{}", self.base_url, TWIRP_SERVICE_PATH, method);
        debug!("Room service request: {} {:?}", url, body);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoomServiceError::Timeout(self.timeout_secs)
                } else {
                    RoomServiceError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            RoomServiceError::ParseError(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<TwirpError>(&text) {
                Ok(err) => (err.code, err.msg),
                Err(_) => ("unknown".to_string(), text),
            };
            error!(
                status = status.as_u16(),
                code = %code,
                "Room service rejected {}: {}",
                method,
                message
            );
            return Err(RoomServiceError::Rejected {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            RoomServiceError::ParseError(format!("Failed to parse JSON: {} - Body: {}", e, text))
        })
    }
}

#[async_trait]
impl RoomService for RoomServiceClient {
    async fn create_room(
        &self,
        name: &str,
        empty_timeout: Duration,
        max_participants: u32,
    ) -> Result<RoomHandle, AppError> {
        let request = CreateRoomRequest {
            name: name.to_string(),
            empty_timeout: empty_timeout.as_secs().min(u32::MAX as u64) as u32,
            max_participants,
        };

        let room: Room = self.call("CreateRoom", &request).await.map_err(|e| {
            error!(room_name = %name, error = %e, "Failed to create room");
            AppError::from(e)
        })?;

        info!(room_name = %room.name, sid = %room.sid, "Room created");
        Ok(room.into())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, AppError> {
        let reply: ListRoomsResponse = self
            .call("ListRooms", &ListRoomsRequest::default())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list rooms");
                AppError::from(e)
            })?;

        Ok(reply.rooms.into_iter().map(RoomSummary::from).collect())
    }

    async fn delete_room(&self, name: &str) -> Result<(), AppError> {
        let request = DeleteRoomRequest {
            room: name.to_string(),
        };

        let _: serde_json::Value = self.call("DeleteRoom", &request).await.map_err(|e| {
            error!(room_name = %name, error = %e, "Failed to delete room");
            AppError::from(e)
        })?;

        info!(room_name = %name, "Room deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Some("APIkey".to_string()), Some("secret".to_string()))
    }

    #[test]
    fn test_client_creation() {
        let client = RoomServiceClient::new("https://demo.livekit.cloud/", issuer(), 10).unwrap();
        assert_eq!(client.base_url(), "https://demo.livekit.cloud");
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = RoomServiceError::Config("missing".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));

        let err: AppError = RoomServiceError::Rejected {
            status: 409,
            code: "already_exists".to_string(),
            message: "room exists".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Upstream(msg) if msg.contains("already_exists")));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_request() {
        let client = RoomServiceClient::new(
            "http://127.0.0.1:9",
            TokenIssuer::new(None, None),
            1,
        )
        .unwrap();

        let result = client
            .create_room("incoming-CA1", Duration::from_secs(60), 2)
            .await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
