//! GeoContext: the spatial parameters needed to rasterize any scene
//! consistently. A context must be complete (SRS, bounds, and a target
//! resolution or pixel grid) before it can be turned into a request;
//! validation happens locally, before any network call.
use crate::client::RasterRequest;
use crate::error::{Error, Result};
use crate::types::Resampler;

/// Where and how to rasterize: output SRS, bounds, resolution or dimensions,
/// optional cutline, and warp options. Values are assigned with the `with_*`
/// helpers, so one base context can be specialized per call site.
#[derive(Debug, Clone, Default)]
pub struct GeoContext {
    /// Output spatial reference system (e.g. `"EPSG:32615"`).
    pub srs: Option<String>,
    /// Output resolution in SRS units; incompatible with `dimensions`.
    pub resolution: Option<f64>,
    /// Output size as (columns, rows); incompatible with `resolution`.
    pub dimensions: Option<(usize, usize)>,
    /// Output bounds as (min x, min y, max x, max y).
    pub bounds: Option<[f64; 4]>,
    /// SRS of `bounds`, when different from the output SRS.
    pub bounds_srs: Option<String>,
    /// GeoJSON geometry string used as a cutline; incompatible with `location`.
    pub shape: Option<String>,
    /// Named location resolved to a cutline by the places service.
    pub location: Option<String>,
    /// Snap output pixels to the coordinate grid.
    pub align_pixels: bool,
    /// Warp resampling algorithm.
    pub resampler: Option<Resampler>,
}

impl GeoContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_srs(mut self, srs: impl Into<String>) -> Self {
        self.srs = Some(srs.into());
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_dimensions(mut self, cols: usize, rows: usize) -> Self {
        self.dimensions = Some((cols, rows));
        self
    }

    pub fn with_bounds(mut self, bounds: [f64; 4]) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_bounds_srs(mut self, srs: impl Into<String>) -> Self {
        self.bounds_srs = Some(srs.into());
        self
    }

    pub fn with_shape(mut self, geojson_geometry: impl Into<String>) -> Self {
        self.shape = Some(geojson_geometry.into());
        self
    }

    pub fn with_location(mut self, slug: impl Into<String>) -> Self {
        self.location = Some(slug.into());
        self
    }

    pub fn with_align_pixels(mut self, align: bool) -> Self {
        self.align_pixels = align;
        self
    }

    pub fn with_resampler(mut self, resampler: Resampler) -> Self {
        self.resampler = Some(resampler);
        self
    }

    /// Validate completeness and produce a request carrying the spatial
    /// parameters. Scene keys, bands, and dtype are filled in by the caller.
    pub fn raster_request(&self) -> Result<RasterRequest> {
        let srs = self
            .srs
            .clone()
            .ok_or(Error::MissingParameter("srs"))?;
        let bounds = self.bounds.ok_or(Error::MissingParameter("bounds"))?;
        match (self.resolution, self.dimensions) {
            (None, None) => return Err(Error::MissingParameter("resolution or dimensions")),
            (Some(_), Some(_)) => {
                return Err(Error::ConflictingParameters("resolution", "dimensions"));
            }
            _ => {}
        }
        if self.shape.is_some() && self.location.is_some() {
            return Err(Error::ConflictingParameters("shape", "location"));
        }

        Ok(RasterRequest {
            srs: Some(srs),
            resolution: self.resolution,
            dimensions: self.dimensions,
            bounds: Some(bounds),
            bounds_srs: self.bounds_srs.clone(),
            shape: self.shape.clone(),
            location: self.location.clone(),
            align_pixels: self.align_pixels,
            resampler: self.resampler,
            ..Default::default()
        })
    }
}
