//! Scene: one satellite image's catalog metadata and band catalog.
//! Scenes are created by an external search/catalog lookup and are
//! read-only afterwards; pixel data is fetched on demand through the
//! rasterization service.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::RasterService;
use crate::error::{Error, Result};
use crate::scenes::collection::GroupKey;
use crate::scenes::geocontext::GeoContext;
use crate::scenes::pixels::{Mosaic, MosaicOptions, rasterize_composite};
use crate::types::DataType;

/// Name of the transparency band; the service requires it to be the last
/// band of a request.
pub const ALPHA_BAND: &str = "alpha";

/// Per-band catalog metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub dtype: DataType,
    /// Sentinel value marking invalid pixels in this band, when declared.
    #[serde(default)]
    pub nodata: Option<f64>,
}

/// Catalog properties of a scene. `bands` maps band name to its metadata;
/// different products may declare different dtypes or nodata sentinels for
/// a same-named band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneProperties {
    pub id: String,
    pub product: String,
    pub acquired: DateTime<Utc>,
    pub bands: BTreeMap<String, Band>,
}

/// One satellite image: identity plus metadata, immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub properties: SceneProperties,
}

impl Scene {
    pub fn new(properties: SceneProperties) -> Self {
        Self { properties }
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    /// Common data type of the requested bands within this scene, following
    /// the promotion lattice. Errors if a band is absent from the catalog
    /// entry.
    pub fn common_data_type(&self, bands: &[String]) -> Result<DataType> {
        let mut common: Option<DataType> = None;
        for name in bands {
            let band = self
                .properties
                .bands
                .get(name)
                .ok_or_else(|| Error::UnknownBand {
                    scene_id: self.properties.id.clone(),
                    band: name.clone(),
                })?;
            common = Some(match common {
                None => band.dtype,
                Some(current) => current.promote(band.dtype),
            });
        }
        common.ok_or(Error::EmptyBands)
    }

    /// Load bands of this scene into a 3D ndarray, optionally masking
    /// invalid data. Equivalent to a mosaic of a one-scene collection.
    pub fn ndarray(
        &self,
        bands: &str,
        ctx: &GeoContext,
        options: &MosaicOptions,
        raster_client: &dyn RasterService,
    ) -> Result<Mosaic> {
        rasterize_composite(
            std::slice::from_ref(self),
            &parse_bands(bands),
            ctx,
            options,
            raster_client,
        )
    }

    /// Grouping key: acquisition day (UTC).
    pub fn acquired_day_key(&self) -> GroupKey {
        GroupKey::Day(self.properties.acquired.date_naive())
    }

    /// Grouping key: exact acquisition timestamp.
    pub fn acquired_key(&self) -> GroupKey {
        GroupKey::Timestamp(self.properties.acquired)
    }

    /// Grouping key: product identifier.
    pub fn product_key(&self) -> GroupKey {
        GroupKey::Text(self.properties.product.clone())
    }
}

/// Split a space-separated band string (`"red green blue"`) into names.
pub(crate) fn parse_bands(bands: &str) -> Vec<String> {
    bands.split_whitespace().map(str::to_string).collect()
}
