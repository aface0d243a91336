//! Bitmap-font descriptor: which page every glyph landed on and where.
//!
//! No metrics are extracted from the glyph images, so offsets are zero and the
//! advance is the glyph's own width.

use serde::{Deserialize, Serialize};

use crate::model::Rect;

/// Channel mask selecting all four RGBA channels.
pub const CHANNEL_ALL: u8 = 15;

/// One atlas page as referenced from the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRef {
    pub id: usize,
    /// File name of the page image, as the font loader should resolve it.
    pub file: String,
}

/// One glyph entry (`<char .../>`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlyphRecord {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: i32,
    pub yoffset: i32,
    pub xadvance: u32,
    pub page: usize,
    pub chnl: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FontDescriptor {
    pub pages: Vec<PageRef>,
    pub chars: Vec<GlyphRecord>,
}

impl FontDescriptor {
    /// Total number of glyphs across all pages.
    pub fn count(&self) -> usize {
        self.chars.len()
    }

    pub fn glyph(&self, id: &str) -> Option<&GlyphRecord> {
        self.chars.iter().find(|c| c.id == id)
    }
}

/// Accumulates pages and glyphs while the overflow loop runs.
#[derive(Debug, Default)]
pub struct FontDescriptorBuilder {
    desc: FontDescriptor,
}

impl FontDescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, id: usize, file: impl Into<String>) -> &mut Self {
        self.desc.pages.push(PageRef {
            id,
            file: file.into(),
        });
        self
    }

    pub fn add_glyph(&mut self, id: impl Into<String>, rect: Rect, page: usize) -> &mut Self {
        self.desc.chars.push(GlyphRecord {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            width: rect.w,
            height: rect.h,
            xoffset: 0,
            yoffset: 0,
            xadvance: rect.w,
            page,
            chnl: CHANNEL_ALL,
        });
        self
    }

    pub fn count(&self) -> usize {
        self.desc.count()
    }

    pub fn finish(self) -> FontDescriptor {
        self.desc
    }
}
