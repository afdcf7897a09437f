use clap::Parser;
use std::path::PathBuf;

use scenestack::types::{DataType, Resampler};

#[derive(Parser)]
#[command(name = "scenestack", version, about = "scenestack CLI")]
pub struct CliArgs {
    /// Scene ID to composite; repeatable, later IDs win in overlapping regions
    #[arg(short = 'k', long = "scene-id", required = true)]
    pub scene_ids: Vec<String>,

    /// Bands to rasterize, space separated (e.g. "red green blue alpha")
    #[arg(short, long, default_value = "red green blue")]
    pub bands: String,

    /// Output file path for the composited raster
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output spatial reference system (e.g. EPSG:32615)
    #[arg(long)]
    pub srs: String,

    /// Output bounds as minx,miny,maxx,maxy
    #[arg(long)]
    pub bounds: String,

    /// SRS of the bounds, when different from --srs
    #[arg(long)]
    pub bounds_srs: Option<String>,

    /// Output resolution in SRS units (incompatible with --dimensions)
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Output size as COLSxROWS (incompatible with --resolution)
    #[arg(long)]
    pub dimensions: Option<String>,

    /// GeoJSON file holding a geometry to use as a cutline
    #[arg(long)]
    pub shape_file: Option<PathBuf>,

    /// Named location to use as a cutline, resolved via the places service
    #[arg(long)]
    pub location: Option<String>,

    /// Output data type (byte, uint16, ...); defaults to the source type
    #[arg(long, value_enum)]
    pub data_type: Option<DataType>,

    /// Output format identifier passed to the service (GTiff, PNG, ...)
    #[arg(long, default_value = "GTiff")]
    pub format: String,

    /// Per-band scaling entry: "min,max", "min,max,dstmin,dstmax", or "none".
    /// Repeatable, indexed by destination band
    #[arg(long = "scale")]
    pub scales: Vec<String>,

    /// Resampling algorithm for the warp
    #[arg(long, value_enum)]
    pub resampler: Option<Resampler>,

    /// Snap output pixels to the coordinate grid
    #[arg(long, default_value_t = false)]
    pub align_pixels: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
