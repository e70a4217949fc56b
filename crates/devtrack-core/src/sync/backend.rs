//! Device backend client
//!
//! [`DeviceBackend`] is the seam between the sync engine and the network.
//! [`HttpBackend`] implements it over `reqwest` against the tracking API:
//!
//! | Call                  | Method | Path                   | Auth   |
//! |-----------------------|--------|------------------------|--------|
//! | owner device settings | GET    | `/get-device-settings` | bearer |
//! | public locations      | GET    | `/device-locations`    | none   |
//! | profile               | GET    | `/profile`             | bearer |
//! | rename                | POST   | `/change-nickname`     | bearer |
//! | recolor               | POST   | `/change-color`        | bearer |
//! | hide / show           | POST   | `/hide-device`         | bearer |

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::SyncError;
use crate::config::Config;
use crate::models::{DeviceRecord, Profile};

pub const DEVICE_SETTINGS_PATH: &str = "/get-device-settings";
pub const DEVICE_LOCATIONS_PATH: &str = "/device-locations";
pub const PROFILE_PATH: &str = "/profile";
pub const CHANGE_NICKNAME_PATH: &str = "/change-nickname";
pub const CHANGE_COLOR_PATH: &str = "/change-color";
pub const HIDE_DEVICE_PATH: &str = "/hide-device";

/// Remote source of device state
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Full records, including the owner's private settings
    async fn device_settings(&self, token: &str) -> Result<Vec<DeviceRecord>, SyncError>;

    /// Public records: identity and position only
    async fn device_locations(&self) -> Result<Vec<DeviceRecord>, SyncError>;

    async fn profile(&self, token: &str) -> Result<Profile, SyncError>;

    async fn change_nickname(
        &self,
        token: &str,
        device_id: &str,
        nickname: &str,
    ) -> Result<(), SyncError>;

    async fn change_color(&self, token: &str, device_id: &str, color: &str)
        -> Result<(), SyncError>;

    async fn hide_device(&self, token: &str, device_id: &str, hide: bool)
        -> Result<(), SyncError>;
}

#[derive(Serialize)]
struct NicknameChange<'a> {
    device_id: &'a str,
    nickname: &'a str,
}

#[derive(Serialize)]
struct ColorChange<'a> {
    device_id: &'a str,
    color: &'a str,
}

#[derive(Serialize)]
struct HideChange<'a> {
    device_id: &'a str,
    hide: bool,
}

/// HTTP implementation of [`DeviceBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client for the configured base URL
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("devtrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client, &config.backend_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, SyncError> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        debug!("GET {}", path);
        let response = request.send().await.map_err(|source| SyncError::Network {
            endpoint: path.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| SyncError::Network {
            endpoint: path.to_string(),
            source,
        })?;

        decode_body(path, &body)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<(), SyncError> {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|source| SyncError::Network {
                endpoint: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceBackend for HttpBackend {
    async fn device_settings(&self, token: &str) -> Result<Vec<DeviceRecord>, SyncError> {
        self.get_json(DEVICE_SETTINGS_PATH, Some(token)).await
    }

    async fn device_locations(&self) -> Result<Vec<DeviceRecord>, SyncError> {
        self.get_json(DEVICE_LOCATIONS_PATH, None).await
    }

    async fn profile(&self, token: &str) -> Result<Profile, SyncError> {
        self.get_json(PROFILE_PATH, Some(token)).await
    }

    async fn change_nickname(
        &self,
        token: &str,
        device_id: &str,
        nickname: &str,
    ) -> Result<(), SyncError> {
        let body = NicknameChange {
            device_id,
            nickname,
        };
        self.post_json(CHANGE_NICKNAME_PATH, token, &body).await
    }

    async fn change_color(
        &self,
        token: &str,
        device_id: &str,
        color: &str,
    ) -> Result<(), SyncError> {
        let body = ColorChange { device_id, color };
        self.post_json(CHANGE_COLOR_PATH, token, &body).await
    }

    async fn hide_device(&self, token: &str, device_id: &str, hide: bool) -> Result<(), SyncError> {
        let body = HideChange { device_id, hide };
        self.post_json(HIDE_DEVICE_PATH, token, &body).await
    }
}

/// Decode a response body
///
/// The backend encodes an empty device list as `null`, so a null body reads
/// as an empty list.
fn decode_body<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, SyncError> {
    let decode_err = |source: serde_json::Error| SyncError::Decode {
        endpoint: endpoint.to_string(),
        source,
    };

    let value: serde_json::Value = serde_json::from_slice(body).map_err(decode_err)?;
    let value = if value.is_null() {
        serde_json::Value::Array(Vec::new())
    } else {
        value
    };
    serde_json::from_value(value).map_err(decode_err)
}
