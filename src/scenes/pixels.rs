//! Pixel containers and client-side masking for composited rasters.
//!
//! Arrays come back from the service in canonical band-major layout; masking
//! always operates in that layout and the band axis is relocated only as the
//! final step. Masks are plain `bool` arrays paired with the data, true where
//! a pixel is invalid (nodata sentinel hit or zero alpha).
use std::collections::BTreeSet;

use ndarray::{Array3, Array4, Axis, Slice, Zip};

use crate::client::{RasterInfo, RasterService};
use crate::error::{Error, Result};
use crate::scenes::geocontext::GeoContext;
use crate::scenes::scene::{ALPHA_BAND, Scene};
use crate::types::{AxisOrder, DataType};

/// A single composited surface: (band, y, x) or the caller's permutation,
/// with an optional invalid-pixel mask of identical shape.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub data: Array3<f64>,
    pub mask: Option<Array3<bool>>,
    pub info: RasterInfo,
}

/// A stack of composited layers: (item, band, y, x) or the caller's
/// permutation, one layer per scene or flattened group, with per-item
/// rasterization metadata in item order.
#[derive(Debug, Clone)]
pub struct Stack {
    pub data: Array4<f64>,
    pub mask: Option<Array4<bool>>,
    pub infos: Vec<RasterInfo>,
}

/// Masking and axis options shared by single-scene fetches and mosaics.
#[derive(Debug, Clone, Copy)]
pub struct MosaicOptions {
    /// Mask pixels equal to a band's declared nodata sentinel.
    pub mask_nodata: bool,
    /// Mask pixels where the alpha band is zero, in every band.
    pub mask_alpha: bool,
    /// Axis where bands land in the output; 0 is (band, y, x), -1 is
    /// (y, x, band).
    pub bands_axis: isize,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            mask_nodata: true,
            mask_alpha: true,
            bands_axis: 0,
        }
    }
}

/// Resolve a possibly-negative axis index against `ndim` dimensions.
pub(crate) fn resolve_axis(axis: isize, ndim: usize) -> Result<usize> {
    let n = ndim as isize;
    if axis <= -n || axis >= n {
        return Err(Error::InvalidAxis { axis, ndim });
    }
    Ok(if axis < 0 { (n + axis) as usize } else { axis as usize })
}

/// Move axis `src` of a 3D array to position `dst`, keeping the others in
/// order.
pub(crate) fn moveaxis3<T>(array: Array3<T>, src: usize, dst: usize) -> Array3<T> {
    let mut axes: Vec<usize> = (0..3).filter(|&a| a != src).collect();
    axes.insert(dst, src);
    array.permuted_axes([axes[0], axes[1], axes[2]])
}

/// Move axis `src` of a 4D array to position `dst`, keeping the others in
/// order.
pub(crate) fn moveaxis4<T>(array: Array4<T>, src: usize, dst: usize) -> Array4<T> {
    let mut axes: Vec<usize> = (0..4).filter(|&a| a != src).collect();
    axes.insert(dst, src);
    array.permuted_axes([axes[0], axes[1], axes[2], axes[3]])
}

/// Strict cross-scene data type agreement for the requested bands. Each
/// scene resolves its own common dtype (promotion within the scene); any
/// disagreement between scenes fails before a single request is issued.
pub(crate) fn common_data_type_across(
    scenes: &[Scene],
    bands: &[String],
) -> Result<DataType> {
    let mut common = None;
    for (index, scene) in scenes.iter().enumerate() {
        let dtype = scene.common_data_type(bands)?;
        match common {
            None => common = Some(dtype),
            Some(expected) if expected != dtype => {
                return Err(Error::InconsistentDataType {
                    index,
                    found: dtype,
                    expected,
                });
            }
            _ => {}
        }
    }
    common.ok_or(Error::EmptyCollection)
}

/// Composite `scenes` into one band-major array via a single service call,
/// then apply client-side masking and axis placement.
///
/// Scenes later in the slice overlay earlier ones in overlapping regions
/// (server-side rule, driven by key order). The nodata mask for a band is
/// the union over every distinct sentinel declared by any contributing scene
/// for that band. The alpha mask zeroes out all bands wherever the
/// composited alpha is zero; an alpha band fetched only for masking is
/// dropped from the output.
pub(crate) fn rasterize_composite(
    scenes: &[Scene],
    bands: &[String],
    ctx: &GeoContext,
    options: &MosaicOptions,
    raster_client: &dyn RasterService,
) -> Result<Mosaic> {
    if scenes.is_empty() {
        return Err(Error::EmptyCollection);
    }
    if bands.is_empty() {
        return Err(Error::EmptyBands);
    }
    let bands_axis = resolve_axis(options.bands_axis, 3)?;

    // Alpha must be last whenever it is requested explicitly; when masking
    // needs it and it wasn't requested, fetch it and drop it afterwards.
    let mut bands = bands.to_vec();
    let mut drop_alpha = false;
    match bands.iter().position(|b| b == ALPHA_BAND) {
        Some(i) if i != bands.len() - 1 => return Err(Error::AlphaNotLast),
        Some(_) => {}
        None => {
            if options.mask_alpha {
                bands.push(ALPHA_BAND.to_string());
                drop_alpha = true;
            }
        }
    }

    let common_data_type = common_data_type_across(scenes, &bands)?;

    let mut request = ctx.raster_request()?;
    request.keys = scenes.iter().map(|s| s.properties.id.clone()).collect();
    request.bands = bands.clone();
    request.data_type = Some(common_data_type);
    request.order = AxisOrder::Gdal;

    let result = raster_client.ndarray(&request)?;
    let mut data = result.array;

    let band_count = data.dim().0;
    if band_count != bands.len() {
        return Err(Error::Payload(format!(
            "requested {} bands but the response carries {}",
            bands.len(),
            band_count
        )));
    }

    let mut alpha = None;
    if options.mask_alpha {
        alpha = Some(data.index_axis(Axis(0), band_count - 1).to_owned());
        if drop_alpha {
            data = data
                .slice_axis(Axis(0), Slice::from(..band_count - 1))
                .to_owned();
            bands.pop();
        }
    }

    let mask = if options.mask_nodata || options.mask_alpha {
        let mut mask = Array3::from_elem(data.dim(), false);

        if options.mask_nodata {
            // Collect every distinct sentinel declared for a band across the
            // contributing scenes; products may disagree on the value.
            for (i, name) in bands.iter().enumerate() {
                let mut sentinels: BTreeSet<u64> = BTreeSet::new();
                for scene in scenes {
                    if let Some(band) = scene.properties.bands.get(name) {
                        if let Some(nodata) = band.nodata {
                            sentinels.insert(nodata.to_bits());
                        }
                    }
                }
                if sentinels.is_empty() {
                    continue;
                }
                let mut band_mask = mask.index_axis_mut(Axis(0), i);
                let band_data = data.index_axis(Axis(0), i);
                for bits in sentinels {
                    let nodata = f64::from_bits(bits);
                    Zip::from(&mut band_mask)
                        .and(&band_data)
                        .for_each(|m, &v| {
                            if v == nodata {
                                *m = true;
                            }
                        });
                }
            }
        }

        if let Some(alpha) = &alpha {
            for mut band_mask in mask.axis_iter_mut(Axis(0)) {
                Zip::from(&mut band_mask).and(alpha).for_each(|m, &a| {
                    if a == 0.0 {
                        *m = true;
                    }
                });
            }
        }

        Some(mask)
    } else {
        None
    };

    let (data, mask) = if bands_axis != 0 {
        (
            moveaxis3(data, 0, bands_axis),
            mask.map(|m| moveaxis3(m, 0, bands_axis)),
        )
    } else {
        (data, mask)
    };

    Ok(Mosaic {
        data,
        mask,
        info: result.info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn resolve_axis_accepts_negatives() {
        assert_eq!(resolve_axis(-1, 3).unwrap(), 2);
        assert_eq!(resolve_axis(2, 3).unwrap(), 2);
        assert!(matches!(
            resolve_axis(3, 3),
            Err(Error::InvalidAxis { axis: 3, ndim: 3 })
        ));
        assert!(matches!(resolve_axis(-4, 3), Err(Error::InvalidAxis { .. })));
    }

    #[test]
    fn moveaxis3_matches_transpose() {
        let a = Array3::from_shape_vec((2, 3, 4), (0..24).collect()).unwrap();
        let moved = moveaxis3(a.clone(), 0, 2);
        assert_eq!(moved.dim(), (3, 4, 2));
        assert_eq!(moved[[1, 2, 0]], a[[0, 1, 2]]);
        assert_eq!(moved[[2, 3, 1]], a[[1, 2, 3]]);
    }

    #[test]
    fn moveaxis4_band_to_innermost() {
        let a = Array4::from_shape_vec((2, 3, 4, 5), (0..120).collect()).unwrap();
        let moved = moveaxis4(a.clone(), 1, 3);
        assert_eq!(moved.dim(), (2, 4, 5, 3));
        assert_eq!(moved[[1, 2, 3, 0]], a[[1, 0, 2, 3]]);
    }

    #[test]
    fn moveaxis_is_identity_for_same_position() {
        let a = array![[[1.0, 2.0], [3.0, 4.0]]];
        let moved = moveaxis3(a.clone(), 0, 0);
        assert_eq!(moved, a);
    }
}
