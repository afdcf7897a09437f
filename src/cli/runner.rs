use std::fs;

use tracing::info;

use scenestack::client::{ClientConfig, RasterClient, RasterService};
use scenestack::scenes::GeoContext;
use scenestack::types::Scale;

use super::args::CliArgs;
use super::errors::AppError;

fn parse_bounds(bounds: &str) -> Result<[f64; 4], AppError> {
    let parts: Vec<f64> = bounds
        .split(',')
        .filter_map(|p| p.trim().parse::<f64>().ok())
        .collect();
    match parts.as_slice() {
        [minx, miny, maxx, maxy] => Ok([*minx, *miny, *maxx, *maxy]),
        _ => Err(AppError::InvalidBounds {
            bounds: bounds.to_string(),
        }),
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(usize, usize), AppError> {
    let invalid = || AppError::InvalidDimensions {
        dimensions: dimensions.to_string(),
    };
    let (cols, rows) = dimensions.split_once('x').ok_or_else(invalid)?;
    let cols = cols.trim().parse::<usize>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<usize>().map_err(|_| invalid())?;
    if cols == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((cols, rows))
}

fn parse_scale(scale: &str) -> Result<Option<Scale>, AppError> {
    if scale.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let parts: Vec<f64> = scale
        .split(',')
        .filter_map(|p| p.trim().parse::<f64>().ok())
        .collect();
    match parts.as_slice() {
        [a, b] => Ok(Some(Scale::Source(*a, *b))),
        [a, b, c, d] => Ok(Some(Scale::Full(*a, *b, *c, *d))),
        _ => Err(AppError::InvalidScale {
            scale: scale.to_string(),
        }),
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env();
    let client = RasterClient::new(config)?;

    let mut ctx = GeoContext::new()
        .with_srs(args.srs.clone())
        .with_bounds(parse_bounds(&args.bounds)?)
        .with_align_pixels(args.align_pixels);
    if let Some(srs) = &args.bounds_srs {
        ctx = ctx.with_bounds_srs(srs.clone());
    }
    if let Some(resolution) = args.resolution {
        ctx = ctx.with_resolution(resolution);
    }
    if let Some(dimensions) = &args.dimensions {
        let (cols, rows) = parse_dimensions(dimensions)?;
        ctx = ctx.with_dimensions(cols, rows);
    }
    if let Some(path) = &args.shape_file {
        ctx = ctx.with_shape(fs::read_to_string(path)?);
    }
    if let Some(location) = &args.location {
        ctx = ctx.with_location(location.clone());
    }
    if let Some(resampler) = args.resampler {
        ctx = ctx.with_resampler(resampler);
    }

    // Completeness is validated here, before the request goes out
    let mut request = ctx.raster_request()?;
    request.keys = args.scene_ids.clone();
    request.bands = args.bands.split_whitespace().map(str::to_string).collect();
    request.data_type = args.data_type;
    request.output_format = args.format.clone();
    if !args.scales.is_empty() {
        let scales: Result<Vec<Option<Scale>>, AppError> =
            args.scales.iter().map(|s| parse_scale(s)).collect();
        request.scales = Some(scales?);
    }

    info!(
        "compositing {} scene(s), bands: {}",
        request.keys.len(),
        args.bands
    );

    let result = client.raster(&request)?;

    if result.files.is_empty() {
        info!("service returned no files");
        return Ok(());
    }

    // A single returned file lands exactly at --output; extra files keep
    // their service-given names next to it.
    let single = result.files.len() == 1;
    let parent = args.output.parent().map(|p| p.to_path_buf());
    for (name, blob) in &result.files {
        let path = if single {
            args.output.clone()
        } else {
            match &parent {
                Some(dir) => dir.join(name),
                None => std::path::PathBuf::from(name),
            }
        };
        fs::write(&path, blob)?;
        info!("wrote {} ({} bytes)", path.display(), blob.len());
    }

    Ok(())
}
