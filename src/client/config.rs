//! Client configuration: service endpoints, auth token, and request timeout.
//! Constructed explicitly or from `SCENESTACK_*` environment variables.
use std::time::Duration;

/// Connection settings shared by the platform service clients.
///
/// Override the URL fields to target a different instance of the backing
/// services. The token, when present, is sent as a bearer credential on
/// every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub raster_url: String,
    pub places_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            raster_url: "https://platform.scenestack.io/raster".to_string(),
            places_url: "https://platform.scenestack.io/places".to_string(),
            token: None,
            timeout: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the environment, falling back to defaults:
    /// `SCENESTACK_RASTER_URL`, `SCENESTACK_PLACES_URL`, `SCENESTACK_TOKEN`,
    /// `SCENESTACK_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SCENESTACK_RASTER_URL") {
            config.raster_url = url;
        }
        if let Ok(url) = std::env::var("SCENESTACK_PLACES_URL") {
            config.places_url = url;
        }
        if let Ok(token) = std::env::var("SCENESTACK_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }
        if let Ok(secs) = std::env::var("SCENESTACK_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.timeout = Duration::from_secs(secs);
            }
        }
        config
    }
}
