//! Core library for packing glyph images into bitmap-font atlas pages.
//!
//! - Packer: MaxRects (BSSF/BLSF/BAF/BL/CP), largest-area-first batch insert
//! - Pipeline: each page tries every heuristic and keeps the densest; pages overflow until all glyphs are placed
//! - Output: RGBA pages handed to a `PageSink`, plus a `FontDescriptor` exported as BMFont XML or JSON
//!
//! Quick example:
//! ```ignore
//! use fnt_packer_core::prelude::*;
//! # fn main() -> fnt_packer_core::Result<()> {
//! let glyphs = vec![
//!     SourceGlyph::open("glyphs/_A.png".as_ref(), &GlyphIdStrategy::StripPrefix)?,
//!     SourceGlyph::open("glyphs/_B.png".as_ref(), &GlyphIdStrategy::StripPrefix)?,
//! ];
//! let cfg = PackerConfig::builder().with_page_size(256, 256).build();
//! let mut sink = PngPageSink::new("out/font")?;
//! let out = pack_glyphs(&glyphs, &cfg, &mut sink)?;
//! write_descriptor(&out.descriptor, "out/font".as_ref(), DescriptorFormat::Xml)?;
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod glyph_id;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use config::*;
pub use descriptor::*;
pub use error::*;
pub use export::*;
pub use glyph_id::*;
pub use model::*;
pub use pipeline::*;
pub use sink::*;
pub use source::*;

/// Convenience prelude for common types and functions.
/// Importing `fnt_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        HeuristicSelection, MaxRectsHeuristic, PackerConfig, PackerConfigBuilder,
    };
    pub use crate::descriptor::{FontDescriptor, FontDescriptorBuilder, GlyphRecord, PageRef};
    pub use crate::export::{DescriptorFormat, to_fnt_xml, to_json, write_descriptor};
    pub use crate::glyph_id::{GlyphIdResolver, GlyphIdStrategy};
    pub use crate::model::{PackStats, PageLayout, Placement, PlacementRequest, Rect};
    pub use crate::packer::{Packer, maxrects::MaxRectsPacker};
    pub use crate::sink::{MemoryPageSink, PageSink, PngPageSink};
    pub use crate::source::SourceGlyph;
    pub use crate::{OutputPage, PackOutput, pack_glyphs, pack_layout};
}
