use image::{ImageReader, RgbaImage};
use std::path::Path;

use crate::error::{FontPackerError, Result};
use crate::glyph_id::GlyphIdResolver;

/// A decoded glyph image and the id it is published under.
#[derive(Debug, Clone)]
pub struct SourceGlyph {
    pub id: String,
    pub image: RgbaImage,
}

impl SourceGlyph {
    pub fn new(id: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }

    /// Decode `path` into RGBA8 and derive its id with `ids`.
    pub fn open<R: GlyphIdResolver + ?Sized>(path: &Path, ids: &R) -> Result<Self> {
        let decode_err = |message: String| FontPackerError::Decode {
            path: path.to_path_buf(),
            message,
        };
        let id = ids
            .glyph_id(path)
            .ok_or_else(|| decode_err("cannot derive a glyph id from the file name".into()))?;
        let image = ImageReader::open(path)
            .map_err(|e| decode_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(decode_err("image has zero width or height".into()));
        }
        Ok(Self { id, image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
