//! Network layer for the remote platform services.
//! Provides the `raster` rasterization client and service trait, the
//! `places` geometry lookup, and shared `config`.
pub mod config;
pub use config::ClientConfig;

pub mod raster;
pub use raster::{
    CoordinateSystem, NdarrayResult, RasterClient, RasterFiles, RasterInfo, RasterRequest,
    RasterService,
};

pub mod places;
pub use places::{PlaceShape, PlacesClient};
