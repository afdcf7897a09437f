//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying transport and serialization errors, and provides semantic
//! variants for pre-flight validation and remote-call failures.
use thiserror::Error;

use crate::types::DataType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("This SceneCollection is empty")]
    EmptyCollection,

    #[error("No bands requested")]
    EmptyBands,

    #[error("Band `{band}` is not available in scene `{scene_id}`")]
    UnknownBand { scene_id: String, band: String },

    #[error(
        "Bands must all have the same dtype in every scene. \
         The requested bands in scene {index} have dtype '{found}', \
         but all prior scenes had dtype '{expected}'"
    )]
    InconsistentDataType {
        index: usize,
        found: DataType,
        expected: DataType,
    },

    #[error(
        "bands_axis of {axis} is unsupported for `stack`; \
         move the band axis on the returned array instead"
    )]
    UnsupportedAxis { axis: isize },

    #[error("Invalid bands_axis: axis {axis} would not exist in a {ndim}D array")]
    InvalidAxis { axis: isize, ndim: usize },

    #[error("Alpha must be the last band in order to reduce rasterization errors")]
    AlphaNotLast,

    #[error("GeoContext is missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("GeoContext parameters `{0}` and `{1}` are incompatible")]
    ConflictingParameters(&'static str, &'static str),

    #[error("These IDs don't exist in the catalog: {}", ids.join(", "))]
    NotFound { ids: Vec<String> },

    #[error(
        "Error with request:\n{message}\n\
         For reference, the rasterization service was called with these parameters:\n{request}"
    )]
    BadRequest { message: String, request: String },

    #[error("Item {index} produced an array of shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Malformed array payload: {0}")]
    Payload(String),

    #[error("Remote call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
