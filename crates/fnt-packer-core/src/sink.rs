use image::ImageFormat;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{FontPackerError, Result};
use crate::pipeline::OutputPage;

/// Receives each finished page exactly once, in page order.
///
/// Returns the file name the descriptor should reference for that page.
/// Pages accepted before a later error are not rolled back.
pub trait PageSink {
    fn write_page(&mut self, page: OutputPage) -> Result<String>;
}

/// Writes `<output_base>_<id>.png` next to the descriptor.
#[derive(Debug, Clone)]
pub struct PngPageSink {
    output_base: PathBuf,
}

impl PngPageSink {
    /// `output_base` must end in a file name: `out/font`, not `out/font/` or `out/..`.
    pub fn new(output_base: impl Into<PathBuf>) -> Result<Self> {
        let output_base = output_base.into();
        if !has_file_name(&output_base) {
            return Err(FontPackerError::InvalidConfig(format!(
                "output base {} must end in a file name",
                output_base.display()
            )));
        }
        Ok(Self { output_base })
    }

    /// Full path of page `id` on disk.
    pub fn page_path(&self, id: usize) -> PathBuf {
        let mut s: OsString = self.output_base.as_os_str().to_owned();
        s.push(format!("_{id}.png"));
        PathBuf::from(s)
    }

    /// Name of page `id` relative to the descriptor.
    pub fn page_file_name(&self, id: usize) -> String {
        let base = self
            .output_base
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{base}_{id}.png")
    }
}

impl PageSink for PngPageSink {
    fn write_page(&mut self, page: OutputPage) -> Result<String> {
        let id = page.layout.id;
        let path = self.page_path(id);
        page.rgba
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| FontPackerError::Encode {
                path: path.clone(),
                message: e.to_string(),
            })?;
        info!(?path, id, glyphs = page.layout.placements.len(), "wrote page");
        Ok(self.page_file_name(id))
    }
}

/// Keeps pages in memory; file names follow the `<base>_<id>.png` scheme.
#[derive(Debug, Default)]
pub struct MemoryPageSink {
    base_name: String,
    pub pages: Vec<OutputPage>,
}

impl MemoryPageSink {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            pages: Vec::new(),
        }
    }
}

impl PageSink for MemoryPageSink {
    fn write_page(&mut self, page: OutputPage) -> Result<String> {
        let name = format!("{}_{}.png", self.base_name, page.layout.id);
        self.pages.push(page);
        Ok(name)
    }
}

// `Path::file_name` ignores a trailing separator, which `page_path` would not.
fn has_file_name(base: &Path) -> bool {
    let raw = base.as_os_str().to_string_lossy();
    base.file_name().is_some() && !raw.ends_with(['/', std::path::MAIN_SEPARATOR])
}
