//! SceneCollection: holds scenes and loads their data.
//!
//! `stack` and `mosaic` rasterize all contained scenes into ndarrays using a
//! GeoContext. `stack` fans per-item fetches out over a bounded worker pool;
//! every pre-flight validation (emptiness, band availability, dtype
//! agreement, axis support, alpha ordering) runs before the first network
//! call, so a request that is guaranteed to fail never pays network latency.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array4, Axis};
use rayon::prelude::*;
use tracing::warn;

use crate::client::RasterService;
use crate::error::{Error, Result};
use crate::scenes::collection::{Collection, GroupKey};
use crate::scenes::geocontext::GeoContext;
use crate::scenes::pixels::{
    Mosaic, MosaicOptions, Stack, common_data_type_across, moveaxis4, rasterize_composite,
    resolve_axis,
};
use crate::scenes::scene::{ALPHA_BAND, Scene, parse_bands};
use crate::types::DataType;

/// Grouping function used by `StackOptions::flatten`.
pub type SceneKeyFn = dyn Fn(&Scene) -> GroupKey;

/// Options for `SceneCollection::stack`.
pub struct StackOptions {
    /// Flatten groups of scenes into single mosaicked layers before
    /// stacking; groups are ordered by key, members keep collection order.
    pub flatten: Option<Box<SceneKeyFn>>,
    /// Mask pixels equal to a band's declared nodata sentinel.
    pub mask_nodata: bool,
    /// Mask pixels where the alpha band is zero, in every band.
    pub mask_alpha: bool,
    /// Axis where bands land in the output; 1 gives (scene, band, y, x),
    /// -1 gives (scene, y, x, band). 0 is unsupported.
    pub bands_axis: isize,
    /// Worker-pool bound; defaults to five workers per available processor,
    /// never more than the number of items.
    pub max_workers: Option<usize>,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            flatten: None,
            mask_nodata: true,
            mask_alpha: true,
            bands_axis: 1,
            max_workers: None,
        }
    }
}

/// Holds scenes, with methods for loading their data.
///
/// Collection-level operations (`filter`, `map`, `groupby`) return new
/// collections sharing the same service client; nothing mutates a
/// collection in place, and stack/mosaic treat it as read-only.
#[derive(Clone)]
pub struct SceneCollection {
    scenes: Collection<Scene>,
    raster_client: Arc<dyn RasterService>,
}

impl SceneCollection {
    pub fn new(
        scenes: impl IntoIterator<Item = Scene>,
        raster_client: Arc<dyn RasterService>,
    ) -> Self {
        Self {
            scenes: scenes.into_iter().collect(),
            raster_client,
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    pub fn scenes(&self) -> &Collection<Scene> {
        &self.scenes
    }

    /// New collection with the scenes that satisfy `predicate`, sharing
    /// this collection's client.
    pub fn filter(&self, predicate: impl Fn(&Scene) -> bool) -> Self {
        Self {
            scenes: self.scenes.filter(predicate),
            raster_client: Arc::clone(&self.raster_client),
        }
    }

    /// Apply `f` to every scene, yielding a plain collection of the results.
    pub fn map<U>(&self, f: impl Fn(&Scene) -> U) -> Collection<U> {
        self.scenes.map(f)
    }

    /// Group scenes by key; groups come back in ascending key order as
    /// sub-collections sharing this collection's client.
    pub fn groupby(&self, key: impl Fn(&Scene) -> GroupKey) -> Vec<(GroupKey, SceneCollection)> {
        self.scenes
            .groupby(key)
            .into_iter()
            .map(|(k, scenes)| {
                (
                    k,
                    Self {
                        scenes,
                        raster_client: Arc::clone(&self.raster_client),
                    },
                )
            })
            .collect()
    }

    /// Strict cross-scene dtype agreement for `bands`; the pre-flight pass
    /// behind stack and mosaic.
    pub fn common_data_type(&self, bands: &[String]) -> Result<DataType> {
        if self.is_empty() {
            return Err(Error::EmptyCollection);
        }
        common_data_type_across(self.scenes.as_slice(), bands)
    }

    /// Load bands from all scenes and stack them into a 4D ndarray,
    /// optionally masking invalid data.
    ///
    /// Each scene (or flattened group of scenes) becomes one layer, in
    /// collection order (or ascending group-key order). Layer fetches run
    /// concurrently on a bounded worker pool; each result is written to the
    /// output slot fixed by its position before dispatch, so completion
    /// order never reorders the stack. The first failure aborts the whole
    /// operation.
    pub fn stack(&self, bands: &str, ctx: &GeoContext, options: &StackOptions) -> Result<Stack> {
        if self.is_empty() {
            return Err(Error::EmptyCollection);
        }

        let bands_axis = options.bands_axis;
        if bands_axis == 0 || bands_axis == -4 {
            return Err(Error::UnsupportedAxis { axis: bands_axis });
        }
        let dest_axis = resolve_axis(bands_axis, 4)?;

        let band_list = parse_bands(bands);
        if band_list.is_empty() {
            return Err(Error::EmptyBands);
        }
        if let Some(i) = band_list.iter().position(|b| b == ALPHA_BAND) {
            if i != band_list.len() - 1 {
                return Err(Error::AlphaNotLast);
            }
        }

        // Validate the context now; per-item fetches rebuild their own
        // requests from it.
        ctx.raster_request()?;

        // Pre-check that all bands (and alpha, if masking will fetch it)
        // resolve to one dtype in every scene, before any network call.
        let mut check_bands = band_list.clone();
        if (options.mask_nodata || options.mask_alpha)
            && !check_bands.iter().any(|b| b == ALPHA_BAND)
        {
            check_bands.push(ALPHA_BAND.to_string());
        }
        self.common_data_type(&check_bands)?;

        // One item per layer: singleton groups fetch directly, larger groups
        // become nested mosaic sub-jobs. Group order becomes output order.
        let items: Vec<Vec<Scene>> = match &options.flatten {
            Some(key) => self
                .scenes
                .groupby(key.as_ref())
                .into_iter()
                .map(|(_, group)| group.into_vec())
                .collect(),
            None => self.scenes.iter().map(|s| vec![s.clone()]).collect(),
        };

        let item_options = MosaicOptions {
            mask_nodata: options.mask_nodata,
            mask_alpha: options.mask_alpha,
            bands_axis: 0,
        };
        let client = self.raster_client.as_ref();
        let fetch =
            |scenes: &Vec<Scene>| rasterize_composite(scenes, &band_list, ctx, &item_options, client);

        let workers = options
            .max_workers
            .unwrap_or_else(|| num_cpus::get() * 5)
            .min(items.len())
            .max(1);
        let results: Result<Vec<Mosaic>> =
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| items.par_iter().map(fetch).collect()),
                Err(e) => {
                    warn!("could not build a fetch pool ({e}); falling back to serial fetches");
                    items.iter().map(fetch).collect()
                }
            };
        let results = results?;

        // The first item fixes the per-layer shape; every other layer is
        // written into its pre-assigned slot and must match.
        let item_shape = results[0].data.dim();
        let any_masked = results.iter().any(|m| m.mask.is_some());
        let stack_shape = (results.len(), item_shape.0, item_shape.1, item_shape.2);

        let mut data = Array4::zeros(stack_shape);
        let mut mask = any_masked.then(|| Array4::from_elem(stack_shape, false));
        let mut infos = Vec::with_capacity(results.len());

        for (i, item) in results.into_iter().enumerate() {
            if item.data.dim() != item_shape {
                return Err(Error::ShapeMismatch {
                    index: i,
                    expected: vec![item_shape.0, item_shape.1, item_shape.2],
                    got: item.data.shape().to_vec(),
                });
            }
            data.index_axis_mut(Axis(0), i).assign(&item.data);
            if let Some(mask) = &mut mask {
                if let Some(item_mask) = &item.mask {
                    mask.index_axis_mut(Axis(0), i).assign(item_mask);
                }
            }
            infos.push(item.info);
        }

        // Masking operated band-major; the band axis moves last.
        let (data, mask) = if dest_axis != 1 {
            (
                moveaxis4(data, 1, dest_axis),
                mask.map(|m| moveaxis4(m, 1, dest_axis)),
            )
        } else {
            (data, mask)
        };

        Ok(Stack { data, mask, infos })
    }

    /// Load bands from all scenes, combining them into a single 3D ndarray
    /// and optionally masking invalid data.
    ///
    /// Where scenes overlap, only data from the scene that comes last in
    /// the collection is used; the compositing itself happens server-side
    /// in one call, the masking client-side afterwards.
    pub fn mosaic(&self, bands: &str, ctx: &GeoContext, options: &MosaicOptions) -> Result<Mosaic> {
        if self.is_empty() {
            return Err(Error::EmptyCollection);
        }
        rasterize_composite(
            self.scenes.as_slice(),
            &parse_bands(bands),
            ctx,
            options,
            self.raster_client.as_ref(),
        )
    }
}

impl fmt::Display for SceneCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SceneCollection of {} scene{}",
            self.len(),
            if self.len() == 1 { "" } else { "s" }
        )?;

        let dates: Vec<_> = self.iter().map(|s| s.properties.acquired).collect();
        if let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) {
            write!(
                f,
                "\n  * Dates: {} to {}",
                first.format("%b %d, %Y"),
                last.format("%b %d, %Y")
            )?;
        }

        let mut products: BTreeMap<&str, usize> = BTreeMap::new();
        for scene in self.iter() {
            *products.entry(scene.properties.product.as_str()).or_insert(0) += 1;
        }
        if !products.is_empty() {
            let summary: Vec<String> = products
                .iter()
                .map(|(product, count)| format!("{}: {}", product, count))
                .collect();
            write!(f, "\n  * Products: {}", summary.join(", "))?;
        }
        Ok(())
    }
}
