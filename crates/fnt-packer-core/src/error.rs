use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontPackerError {
    #[error("cannot decode source image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("cannot encode page image {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("no source images found")]
    EmptyCorpus,
    #[error(
        "cannot fit glyphs to texture: page {page} placed nothing, {remaining} glyph(s) left (largest {}x{})",
        largest.0,
        largest.1
    )]
    UnfittablePage {
        page: usize,
        remaining: usize,
        largest: (u32, u32),
    },
    #[error("descriptor write error: {0}")]
    DescriptorWrite(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid page dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FontPackerError>;
