use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid bounds: {bounds}. Expected minx,miny,maxx,maxy")]
    InvalidBounds { bounds: String },

    #[error("Invalid dimensions: {dimensions}. Expected COLSxROWS")]
    InvalidDimensions { dimensions: String },

    #[error("Invalid scale entry: {scale}. Expected \"min,max\", \"min,max,dstmin,dstmax\", or \"none\"")]
    InvalidScale { scale: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sdk(#[from] scenestack::Error),
}
