//! Rasterization service client: issues authenticated HTTP calls to the
//! remote `/raster` and `/featurearray` endpoints and decodes their binary
//! responses into ndarrays or file blobs.
//!
//! The `RasterService` trait is the seam between the scene layer and the
//! network; `RasterClient` is the HTTP implementation. Tests substitute stub
//! implementations, so nothing in this crate depends on a live platform.
use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ndarray::Array3;
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::config::ClientConfig;
use crate::client::places::PlacesClient;
use crate::error::{Error, Result};
use crate::types::{AxisOrder, DataType, Resampler, Scale};

/// One rasterization request: which scenes, which bands, and how the output
/// should be warped. Spatial fields are usually filled in from a
/// [`GeoContext`](crate::scenes::GeoContext).
#[derive(Debug, Clone)]
pub struct RasterRequest {
    /// Catalog IDs of the scenes to composite; later keys overlay earlier
    /// ones in overlapping regions.
    pub keys: Vec<String>,
    /// Ordered band names to rasterize.
    pub bands: Vec<String>,
    /// Optional per-band scaling table, indexed by destination band;
    /// `None` entries leave that band unscaled.
    pub scales: Option<Vec<Option<Scale>>>,
    /// Output pixel type; `None` keeps the source type.
    pub data_type: Option<DataType>,
    /// Output file format for `/raster` calls (ignored by `/featurearray`).
    pub output_format: String,
    /// Output spatial reference system.
    pub srs: Option<String>,
    /// Output resolution in SRS units; incompatible with `dimensions`.
    pub resolution: Option<f64>,
    /// Output size as (columns, rows); incompatible with `resolution`.
    pub dimensions: Option<(usize, usize)>,
    /// GeoJSON geometry string used as a cutline.
    pub shape: Option<String>,
    /// Named location resolved to a cutline via the places service;
    /// ignored when `shape` is present.
    pub location: Option<String>,
    /// Output bounds as (min x, min y, max x, max y) in the bounds SRS.
    pub bounds: Option<[f64; 4]>,
    /// SRS of `bounds` when it differs from the output SRS.
    pub bounds_srs: Option<String>,
    /// Snap output pixels to the coordinate grid.
    pub align_pixels: bool,
    /// Warp resampling algorithm.
    pub resampler: Option<Resampler>,
    /// Axis layout of returned arrays.
    pub order: AxisOrder,
}

impl Default for RasterRequest {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            bands: Vec::new(),
            scales: None,
            data_type: None,
            output_format: "GTiff".to_string(),
            srs: None,
            resolution: None,
            dimensions: None,
            shape: None,
            location: None,
            bounds: None,
            bounds_srs: None,
            align_pixels: false,
            resampler: None,
            order: AxisOrder::Image,
        }
    }
}

/// Wire shape POSTed to the service. Field spellings are the service's, not
/// ours, hence the renames.
#[derive(Debug, Serialize)]
struct RasterPayload<'a> {
    keys: &'a [String],
    bands: &'a [String],
    scales: Option<&'a [Option<Scale>]>,
    ot: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    of: Option<&'a str>,
    srs: Option<&'a str>,
    resolution: Option<f64>,
    shape: Option<&'a str>,
    #[serde(rename = "outputBounds")]
    output_bounds: Option<[f64; 4]>,
    #[serde(rename = "outputBoundsSRS")]
    output_bounds_srs: Option<&'a str>,
    #[serde(rename = "outsize")]
    outsize: Option<(usize, usize)>,
    #[serde(rename = "targetAlignedPixels")]
    target_aligned_pixels: bool,
    #[serde(rename = "resampleAlg")]
    resample_alg: Option<Resampler>,
}

impl<'a> RasterPayload<'a> {
    fn new(request: &'a RasterRequest, shape: Option<&'a str>, of: Option<&'a str>) -> Self {
        Self {
            keys: &request.keys,
            bands: &request.bands,
            scales: request.scales.as_deref(),
            ot: request.data_type,
            of,
            srs: request.srs.as_deref(),
            resolution: request.resolution,
            shape,
            output_bounds: request.bounds,
            output_bounds_srs: request.bounds_srs.as_deref(),
            outsize: request.dimensions,
            target_aligned_pixels: request.align_pixels,
            resample_alg: request.resampler,
        }
    }
}

/// Rasterization metadata returned alongside every array or file response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterInfo {
    #[serde(default, rename = "coordinateSystem")]
    pub coordinate_system: Option<CoordinateSystem>,
    #[serde(default, rename = "geoTransform")]
    pub geo_transform: Option<[f64; 6]>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub wkt: String,
}

/// Decoded `/featurearray` response: pixel values in a band-major (or
/// image-ordered) array, the logical pixel type, and rasterization metadata.
#[derive(Debug, Clone)]
pub struct NdarrayResult {
    pub array: Array3<f64>,
    pub dtype: DataType,
    pub info: RasterInfo,
}

/// Decoded `/raster` response: output files keyed by name, plus metadata.
#[derive(Debug, Clone)]
pub struct RasterFiles {
    pub files: BTreeMap<String, Vec<u8>>,
    pub info: RasterInfo,
}

/// Seam between the scene layer and the network. `RasterClient` talks HTTP;
/// tests provide deterministic stubs.
pub trait RasterService: Send + Sync {
    /// One `/featurearray` round trip: composite the requested scenes and
    /// return the pixels as an ndarray.
    fn ndarray(&self, request: &RasterRequest) -> Result<NdarrayResult>;

    /// One `/raster` round trip: composite the requested scenes into encoded
    /// output files (GeoTIFF by default).
    fn raster(&self, request: &RasterRequest) -> Result<RasterFiles>;
}

/// HTTP client for the remote rasterization service.
///
/// Retry and backoff belong to the transport or the caller; this client maps
/// failures onto the crate error taxonomy and otherwise reports them as-is.
pub struct RasterClient {
    http: HttpClient,
    config: ClientConfig,
    places: PlacesClient,
}

impl RasterClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::builder().timeout(config.timeout).build()?;
        let places = PlacesClient::new(&config)?;
        Ok(Self {
            http,
            config,
            places,
        })
    }

    /// The cutline actually sent: an explicit shape wins, a named location is
    /// resolved through the places service, otherwise none.
    fn resolve_cutline(&self, request: &RasterRequest) -> Result<Option<String>> {
        if request.shape.is_some() {
            return Ok(request.shape.clone());
        }
        match &request.location {
            Some(location) => {
                let place = self.places.shape(location, "low")?;
                Ok(Some(serde_json::to_string(&place.geometry)?))
            }
            None => Ok(None),
        }
    }

    fn post(
        &self,
        endpoint: &str,
        request: &RasterRequest,
        payload: &RasterPayload<'_>,
    ) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/{}", self.config.raster_url, endpoint);
        debug!(
            endpoint,
            keys = request.keys.len(),
            bands = ?request.bands,
            "rasterization request"
        );

        let mut http_request = self.http.post(&url).json(payload);
        if let Some(token) = &self.config.token {
            http_request = http_request.bearer_auth(token);
        }
        let response = http_request.send()?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                ids: request.keys.clone(),
            });
        }
        if status == StatusCode::BAD_REQUEST {
            return Err(Error::BadRequest {
                message: response.text().unwrap_or_default(),
                request: serde_json::to_string_pretty(payload)?,
            });
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

impl RasterService for RasterClient {
    fn ndarray(&self, request: &RasterRequest) -> Result<NdarrayResult> {
        let cutline = self.resolve_cutline(request)?;
        let payload = RasterPayload::new(request, cutline.as_deref(), None);
        let response = self.post("featurearray", request, &payload)?;
        let payload: ArrayPayload = response.json()?;
        let (array, dtype, info) = decode_array_payload(payload)?;
        let array = match request.order {
            AxisOrder::Gdal => array,
            // (band, row, col) -> (row, col, band)
            AxisOrder::Image => array.permuted_axes([1, 2, 0]),
        };
        Ok(NdarrayResult { array, dtype, info })
    }

    fn raster(&self, request: &RasterRequest) -> Result<RasterFiles> {
        let cutline = self.resolve_cutline(request)?;
        let payload = RasterPayload::new(
            request,
            cutline.as_deref(),
            Some(request.output_format.as_str()),
        );
        let response = self.post("raster", request, &payload)?;
        let wire: FilesPayload = response.json()?;

        let mut files = BTreeMap::new();
        for (name, blob) in wire.files {
            let bytes = STANDARD
                .decode(&blob)
                .map_err(|e| Error::Payload(format!("file `{}`: {}", name, e)))?;
            files.insert(name, bytes);
        }
        Ok(RasterFiles {
            files,
            info: wire.metadata,
        })
    }
}

/// Serialized array response from `/featurearray`: a dtype tag, the array
/// shape, and base64-encoded little-endian values in band-major order.
#[derive(Debug, Deserialize)]
struct ArrayPayload {
    shape: Vec<usize>,
    dtype: DataType,
    data: String,
    #[serde(default)]
    metadata: RasterInfo,
}

#[derive(Debug, Deserialize)]
struct FilesPayload {
    files: BTreeMap<String, String>,
    #[serde(default)]
    metadata: RasterInfo,
}

/// Decode a serialized array payload into a band-major `Array3<f64>`.
///
/// Every supported dtype is exactly representable in f64, so pixel values are
/// widened on decode while the logical dtype travels alongside. A 2-D shape
/// (single band) gains a leading band axis.
fn decode_array_payload(payload: ArrayPayload) -> Result<(Array3<f64>, DataType, RasterInfo)> {
    let dims = match payload.shape.len() {
        3 => (payload.shape[0], payload.shape[1], payload.shape[2]),
        2 => (1, payload.shape[0], payload.shape[1]),
        n => {
            return Err(Error::Payload(format!(
                "expected a 2D or 3D shape, got {}D",
                n
            )));
        }
    };

    let bytes = STANDARD
        .decode(&payload.data)
        .map_err(|e| Error::Payload(e.to_string()))?;
    let expected = dims.0 * dims.1 * dims.2 * payload.dtype.byte_width();
    if bytes.len() != expected {
        return Err(Error::Payload(format!(
            "shape {:?} as {} needs {} bytes, payload has {}",
            payload.shape,
            payload.dtype,
            expected,
            bytes.len()
        )));
    }

    let values: Vec<f64> = match payload.dtype {
        DataType::Byte => bytes.iter().map(|&b| f64::from(b)).collect(),
        DataType::UInt16 => bytes
            .chunks_exact(2)
            .map(|c| f64::from(u16::from_le_bytes([c[0], c[1]])))
            .collect(),
        DataType::Int16 => bytes
            .chunks_exact(2)
            .map(|c| f64::from(i16::from_le_bytes([c[0], c[1]])))
            .collect(),
        DataType::UInt32 => bytes
            .chunks_exact(4)
            .map(|c| f64::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        DataType::Int32 => bytes
            .chunks_exact(4)
            .map(|c| f64::from(i32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        DataType::Float32 => bytes
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        DataType::Float64 => bytes
            .chunks_exact(8)
            .map(|c| {
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
            })
            .collect(),
    };

    let array = Array3::from_shape_vec(dims, values)
        .map_err(|e| Error::Payload(e.to_string()))?;
    Ok((array, payload.dtype, payload.metadata))
}
