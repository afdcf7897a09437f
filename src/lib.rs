#![doc = r#"
scenestack — a client SDK for a remote geospatial rasterization platform.

This crate provides typed, ergonomic objects for working with satellite
scenes: search results become `Scene`s in a `SceneCollection`, and
`stack`/`mosaic` turn a collection plus a `GeoContext` into ndarrays of
pixel data by calling the platform's rasterization service. Rasterization,
warping, and compositing happen server-side; this client issues the HTTP
requests in parallel, decodes the responses, and aligns and masks the
resulting arrays.

Stability
---------
The public library API is experimental in initial releases. Breaking
changes can occur.

Add dependency
--------------
```toml
[dependencies]
scenestack = "0.1"
```

Quick start: stack a collection of scenes
-----------------------------------------
```rust,no_run
use std::sync::Arc;
use scenestack::{
    ClientConfig, GeoContext, RasterClient, Scene, SceneCollection, StackOptions,
};

fn main() -> scenestack::Result<()> {
    // Scenes normally come from an external catalog search
    let scenes: Vec<Scene> = load_scenes_from_search();

    let client = Arc::new(RasterClient::new(ClientConfig::from_env())?);
    let collection = SceneCollection::new(scenes, client);

    let ctx = GeoContext::new()
        .with_srs("EPSG:32615")
        .with_resolution(120.0)
        .with_bounds([500000.0, 4000000.0, 560000.0, 4060000.0]);

    let stack = collection.stack("red green blue", &ctx, &StackOptions::default())?;
    println!("stack shape: {:?}", stack.data.dim()); // (scene, band, y, x)
    Ok(())
}
# fn load_scenes_from_search() -> Vec<scenestack::Scene> { Vec::new() }
```

Mosaic into a single surface
----------------------------
```rust,no_run
use std::sync::Arc;
use scenestack::{ClientConfig, GeoContext, MosaicOptions, RasterClient, SceneCollection};

fn main() -> scenestack::Result<()> {
    let client = Arc::new(RasterClient::new(ClientConfig::from_env())?);
    let collection = SceneCollection::new(Vec::new(), client);

    let ctx = GeoContext::new()
        .with_srs("EPSG:32615")
        .with_resolution(60.0)
        .with_bounds([500000.0, 4000000.0, 560000.0, 4060000.0]);

    // Later scenes in the collection overlay earlier ones where they overlap
    let mosaic = collection.mosaic(
        "red green blue",
        &ctx,
        &MosaicOptions { bands_axis: -1, ..Default::default() },
    )?;
    println!("mosaic shape: {:?}", mosaic.data.dim()); // (y, x, band)
    Ok(())
}
```

Flattening a stack by acquisition day
-------------------------------------
```rust,ignore
let stack = collection.stack(
    "red nir",
    &ctx,
    &StackOptions {
        flatten: Some(Box::new(|s| s.acquired_day_key())),
        ..Default::default()
    },
)?;
```

Masking
-------
`mask_nodata` marks pixels equal to a band's declared nodata sentinel;
`mask_alpha` marks pixels wherever the alpha band is zero. Both default to
on, and the returned `mask` is a `bool` array the same shape as `data`
(true = invalid). With both off, no mask is allocated and the numeric data
is identical.

Error handling
--------------
All public functions return `scenestack::Result<T>`; match on
`scenestack::Error` to handle specific cases. Everything that can be
validated locally (empty collections, missing GeoContext parameters, dtype
disagreements, alpha ordering, unsupported axes) fails before a single
network request is issued.

Useful modules
--------------
- [`scenes`] — `Scene`, `SceneCollection`, `GeoContext`, stack/mosaic results.
- [`client`] — `RasterClient`, `PlacesClient`, `ClientConfig`, the `RasterService` seam.
- [`types`] — `DataType`, `Resampler`, `AxisOrder`, `Scale`.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod client;
pub mod error;
pub mod scenes;
pub mod types;

// Curated public API surface
// Types
pub use error::{Error, Result};
pub use types::{AxisOrder, DataType, Resampler, Scale};

// Network clients
pub use client::{
    ClientConfig, NdarrayResult, PlacesClient, RasterClient, RasterFiles, RasterInfo,
    RasterRequest, RasterService,
};

// Scene domain
pub use scenes::{
    ALPHA_BAND, Band, Collection, GeoContext, GroupKey, Mosaic, MosaicOptions, Scene,
    SceneCollection, SceneProperties, Stack, StackOptions,
};
