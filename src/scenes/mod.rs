//! Scene domain: catalog metadata, geographic contexts, and the
//! stacking/mosaicking engine that turns collections of scenes into
//! ndarrays via the rasterization service.
pub mod collection;
pub use collection::{Collection, GroupKey};

pub mod geocontext;
pub use geocontext::GeoContext;

pub mod scene;
pub use scene::{ALPHA_BAND, Band, Scene, SceneProperties};

pub mod pixels;
pub use pixels::{Mosaic, MosaicOptions, Stack};

pub mod scenecollection;
pub use scenecollection::{SceneCollection, SceneKeyFn, StackOptions};
