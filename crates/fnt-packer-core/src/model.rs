use serde::{Deserialize, Serialize};

use crate::config::MaxRectsHeuristic;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share any pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }
}

/// Packer input: a tagged size. The packer never sees pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest<K> {
    pub tag: K,
    pub w: u32,
    pub h: u32,
}

impl<K> PlacementRequest<K> {
    pub fn new(tag: K, w: u32, h: u32) -> Self {
        Self { tag, w, h }
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Final resting place of one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = usize> {
    pub tag: K,
    pub rect: Rect,
    /// Index of the page the item landed on.
    pub page: usize,
}

/// Logical page record: page size, the heuristic that filled it and its placements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout<K = usize> {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub heuristic: MaxRectsHeuristic,
    pub placements: Vec<Placement<K>>,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of pages.
    pub num_pages: usize,
    /// Total number of glyphs placed.
    pub num_glyphs: usize,
    /// Sum of width * height over all pages.
    pub total_page_area: u64,
    /// Sum of width * height over all placed glyphs.
    pub used_area: u64,
    /// used_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    pub fn from_layouts<K>(pages: &[PageLayout<K>]) -> Self {
        let mut num_glyphs = 0;
        let mut total_page_area = 0u64;
        let mut used_area = 0u64;
        for page in pages {
            total_page_area += page.width as u64 * page.height as u64;
            for p in &page.placements {
                num_glyphs += 1;
                used_area += p.rect.area();
            }
        }
        let occupancy = if total_page_area > 0 {
            used_area as f64 / total_page_area as f64
        } else {
            0.0
        };
        Self {
            num_pages: pages.len(),
            num_glyphs,
            total_page_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Glyphs: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_pages,
            self.num_glyphs,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_area)
    }
}
