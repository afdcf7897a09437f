//! Places lookup client: resolves a named location (e.g. an administrative
//! region slug) to its GeoJSON geometry, used as a rasterization cutline.
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::client::config::ClientConfig;
use crate::error::{Error, Result};

/// GeoJSON feature returned by the places service. Only the geometry is
/// interpreted client-side; everything else passes through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceShape {
    pub geometry: serde_json::Value,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

/// Client for the places/geocoding service.
pub struct PlacesClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl PlacesClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.places_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Fetch the shape of a named place at the requested geometry fidelity
    /// (`"low"`, `"medium"`, or `"high"`).
    pub fn shape(&self, slug: &str, geom: &str) -> Result<PlaceShape> {
        let url = format!("{}/shape/{}", self.base_url, slug);
        debug!(slug, geom, "resolving place shape");

        let mut request = self.http.get(&url).query(&[("geom", geom)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                ids: vec![slug.to_string()],
            });
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        Ok(response.json::<PlaceShape>()?)
    }
}
