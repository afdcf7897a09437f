//! Shared fixtures: a deterministic stub rasterization service and scene
//! builders used by the stack/mosaic integration tests.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array3;

use scenestack::{
    AxisOrder, Band, DataType, GeoContext, NdarrayResult, RasterFiles, RasterInfo, RasterRequest,
    RasterService, Scene, SceneCollection, SceneProperties,
};
use scenestack::error::{Error, Result};

/// What the stub "rasterizes" for one scene: a constant fill value per band,
/// painted over a half-open column range of the output grid.
pub struct StubScene {
    pub values: BTreeMap<String, f64>,
    pub cols: (usize, usize),
}

/// Deterministic in-memory rasterization service.
///
/// Composites scenes in key order onto a fixed grid, later keys overwriting
/// earlier ones where they overlap, mirroring the server-side "last wins"
/// rule. Unpainted pixels stay at zero, which also leaves alpha at zero
/// outside every scene's coverage.
pub struct StubRaster {
    pub scenes: BTreeMap<String, StubScene>,
    pub grid: (usize, usize),
    pub calls: AtomicUsize,
}

impl StubRaster {
    pub fn new(grid: (usize, usize)) -> Self {
        Self {
            scenes: BTreeMap::new(),
            grid,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn add_scene(
        mut self,
        id: &str,
        cols: (usize, usize),
        values: &[(&str, f64)],
    ) -> Self {
        self.scenes.insert(
            id.to_string(),
            StubScene {
                values: values
                    .iter()
                    .map(|(band, v)| (band.to_string(), *v))
                    .collect(),
                cols,
            },
        );
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RasterService for StubRaster {
    fn ndarray(&self, request: &RasterRequest) -> Result<NdarrayResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let missing: Vec<String> = request
            .keys
            .iter()
            .filter(|k| !self.scenes.contains_key(*k))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotFound { ids: missing });
        }

        let (rows, cols) = self.grid;
        let bands = request.bands.len();
        let mut array = Array3::<f64>::zeros((bands, rows, cols));

        for key in &request.keys {
            let scene = &self.scenes[key];
            for (i, band) in request.bands.iter().enumerate() {
                let value = match scene.values.get(band) {
                    Some(v) => *v,
                    None => continue,
                };
                for r in 0..rows {
                    for c in scene.cols.0..scene.cols.1.min(cols) {
                        array[[i, r, c]] = value;
                    }
                }
            }
        }

        let array = match request.order {
            AxisOrder::Gdal => array,
            AxisOrder::Image => array.permuted_axes([1, 2, 0]),
        };
        Ok(NdarrayResult {
            array,
            dtype: request.data_type.unwrap_or(DataType::Float64),
            info: RasterInfo {
                geo_transform: Some([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]),
                ..Default::default()
            },
        })
    }

    fn raster(&self, request: &RasterRequest) -> Result<RasterFiles> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let missing: Vec<String> = request
            .keys
            .iter()
            .filter(|k| !self.scenes.contains_key(*k))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotFound { ids: missing });
        }
        let mut files = BTreeMap::new();
        files.insert("composite.tif".to_string(), vec![0x49u8, 0x49, 0x2a, 0x00]);
        Ok(RasterFiles {
            files,
            info: RasterInfo::default(),
        })
    }
}

/// Catalog fixture: a scene whose bands all share `dtype`, with optional
/// per-band nodata sentinels.
pub fn scene_with(
    id: &str,
    acquired: &str,
    dtype: DataType,
    bands: &[(&str, Option<f64>)],
) -> Scene {
    Scene::new(SceneProperties {
        id: id.to_string(),
        product: "landsat:LC08".to_string(),
        acquired: acquired.parse().unwrap(),
        bands: bands
            .iter()
            .map(|(name, nodata)| {
                (
                    name.to_string(),
                    Band {
                        dtype,
                        nodata: *nodata,
                    },
                )
            })
            .collect(),
    })
}

pub fn collection(stub: &Arc<StubRaster>, scenes: Vec<Scene>) -> SceneCollection {
    SceneCollection::new(scenes, Arc::clone(stub) as Arc<dyn RasterService>)
}

/// A complete context over a small grid matching `StubRaster::new((3, 4))`.
pub fn ctx() -> GeoContext {
    GeoContext::new()
        .with_srs("EPSG:32615")
        .with_dimensions(4, 3)
        .with_bounds([500000.0, 4000000.0, 500240.0, 4000180.0])
}
