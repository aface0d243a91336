use image::RgbaImage;

use crate::model::PageLayout;
use crate::source::SourceGlyph;

const BYTES_PER_PIXEL: usize = 4;

fn row_stride(img: &RgbaImage) -> usize {
    img.width() as usize * BYTES_PER_PIXEL
}

/// Copy all of `src` into `canvas` with its top-left corner at (dx, dy).
///
/// Rows are copied as slices, each buffer addressed with its own stride. No
/// blending or clamping: a source that does not fit inside the canvas at
/// (dx, dy) is a packing bug and panics.
pub fn blit_rows(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (sw, sh) = src.dimensions();
    let (cw, ch) = canvas.dimensions();
    assert!(
        dx as u64 + sw as u64 <= cw as u64 && dy as u64 + sh as u64 <= ch as u64,
        "blit of {sw}x{sh} at ({dx}, {dy}) escapes {cw}x{ch} page"
    );

    let src_stride = row_stride(src);
    let dst_stride = row_stride(canvas);
    let dst_x = dx as usize * BYTES_PER_PIXEL;
    let src_raw: &[u8] = src.as_raw();
    let dst_raw: &mut [u8] = canvas;
    for (row, src_row) in src_raw.chunks_exact(src_stride.max(1)).enumerate().take(sh as usize) {
        let start = (dy as usize + row) * dst_stride + dst_x;
        dst_raw[start..start + src_stride].copy_from_slice(src_row);
    }
}

/// Materialize a page: a transparent `width x height` canvas with every placed glyph copied in.
///
/// `placements[i].tag` indexes into `sources`.
pub fn assemble_page(layout: &PageLayout<usize>, sources: &[SourceGlyph]) -> RgbaImage {
    let mut canvas = RgbaImage::new(layout.width, layout.height);
    for p in &layout.placements {
        let src = &sources[p.tag].image;
        debug_assert_eq!(src.dimensions(), (p.rect.w, p.rect.h));
        blit_rows(src, &mut canvas, p.rect.x, p.rect.y);
    }
    canvas
}
