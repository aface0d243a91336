use image::RgbaImage;
use tracing::{debug, info, instrument};

use crate::compositing::assemble_page;
use crate::config::{MaxRectsHeuristic, PackerConfig};
use crate::descriptor::{FontDescriptor, FontDescriptorBuilder};
use crate::error::{FontPackerError, Result};
use crate::model::{PackStats, PageLayout, Placement, PlacementRequest};
use crate::packer::{Insertion, Packer, maxrects::MaxRectsPacker};
use crate::sink::PageSink;
use crate::source::SourceGlyph;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A finished page: its layout record and the assembled RGBA pixels.
#[derive(Debug, Clone)]
pub struct OutputPage {
    pub layout: PageLayout<usize>,
    pub rgba: RgbaImage,
}

/// Output of a packing run: the descriptor and the per-page layouts.
/// Page pixels went to the `PageSink`.
#[derive(Debug, Clone)]
pub struct PackOutput {
    pub descriptor: FontDescriptor,
    pub pages: Vec<PageLayout<usize>>,
}

impl PackOutput {
    pub fn stats(&self) -> PackStats {
        PackStats::from_layouts(&self.pages)
    }
}

/// One heuristic's attempt at filling a fresh page with the pending items.
#[derive(Debug, Clone)]
pub struct PageTrial<K> {
    pub heuristic: MaxRectsHeuristic,
    pub insertion: Insertion<K>,
    pub occupancy: f64,
}

/// Pack `pending` onto an empty page with a single heuristic.
pub fn run_trial<K: Clone>(
    pending: &[PlacementRequest<K>],
    heuristic: MaxRectsHeuristic,
    cfg: &PackerConfig,
) -> PageTrial<K> {
    let mut packer = MaxRectsPacker::new(cfg.page_width, cfg.page_height, heuristic);
    let insertion = packer.insert(pending.to_vec());
    let occupancy = packer.occupancy();
    debug!(
        %heuristic,
        placed = insertion.placed.len(),
        occupancy,
        "heuristic trial"
    );
    PageTrial {
        heuristic,
        insertion,
        occupancy,
    }
}

/// Runs one trial per candidate heuristic, in the config's fixed order.
pub fn run_trials<K: Clone + Send + Sync>(
    pending: &[PlacementRequest<K>],
    cfg: &PackerConfig,
) -> Vec<PageTrial<K>> {
    let candidates = cfg.heuristic.candidates();

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            // collect keeps candidate order, so selection below stays deterministic
            return candidates
                .par_iter()
                .map(|&h| run_trial(pending, h, cfg))
                .collect();
        }
    }

    candidates
        .into_iter()
        .map(|h| run_trial(pending, h, cfg))
        .collect()
}

/// Picks the trial with the highest occupancy among those that placed anything.
///
/// Earlier candidates win ties. `None` when no heuristic could place a single item.
pub fn select_heuristic<K: Clone + Send + Sync>(
    pending: &[PlacementRequest<K>],
    cfg: &PackerConfig,
) -> Option<PageTrial<K>> {
    let mut best: Option<PageTrial<K>> = None;
    for trial in run_trials(pending, cfg) {
        if trial.insertion.placed.is_empty() {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => trial.occupancy > b.occupancy,
        };
        if better {
            best = Some(trial);
        }
    }
    best
}

/// Page overflow loop: each `next()` fills one fresh page from what is still pending.
///
/// Ends when nothing is pending. Yields a single `UnfittablePage` error, then
/// stops, when a non-empty pending set cannot place even one item.
pub struct PageOverflow<K> {
    cfg: PackerConfig,
    pending: Vec<PlacementRequest<K>>,
    next_id: usize,
    failed: bool,
}

impl<K: Clone + Send + Sync> PageOverflow<K> {
    pub fn new(items: Vec<PlacementRequest<K>>, cfg: &PackerConfig) -> Result<Self> {
        cfg.validate()?;
        if items.is_empty() {
            return Err(FontPackerError::EmptyCorpus);
        }
        if let Some(pos) = items.iter().position(|r| r.w == 0 || r.h == 0) {
            return Err(FontPackerError::InvalidInput(format!(
                "item #{pos} has zero width or height"
            )));
        }
        Ok(Self {
            cfg: cfg.clone(),
            pending: items,
            next_id: 0,
            failed: false,
        })
    }

    /// Items not yet placed on any page.
    pub fn pending(&self) -> &[PlacementRequest<K>] {
        &self.pending
    }
}

impl<K: Clone + Send + Sync> Iterator for PageOverflow<K> {
    type Item = Result<PageLayout<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        // an empty pending set is normal completion, not a failed page
        if self.failed || self.pending.is_empty() {
            return None;
        }
        let page = self.next_id;
        let Some(trial) = select_heuristic(&self.pending, &self.cfg) else {
            self.failed = true;
            let largest = self
                .pending
                .iter()
                .max_by_key(|r| r.area())
                .map(|r| (r.w, r.h))
                .unwrap_or_default();
            return Some(Err(FontPackerError::UnfittablePage {
                page,
                remaining: self.pending.len(),
                largest,
            }));
        };

        let PageTrial {
            heuristic,
            insertion,
            occupancy,
        } = trial;
        self.pending = insertion.unplaced;
        self.next_id += 1;
        info!(
            page,
            %heuristic,
            placed = insertion.placed.len(),
            remaining = self.pending.len(),
            occupancy = format!("{:.2}%", occupancy * 100.0),
            "page packed"
        );
        let placements = insertion
            .placed
            .into_iter()
            .map(|(tag, rect)| Placement { tag, rect, page })
            .collect();
        Some(Ok(PageLayout {
            id: page,
            width: self.cfg.page_width,
            height: self.cfg.page_height,
            heuristic,
            placements,
        }))
    }
}

/// Packs sizes into as many pages as needed without touching pixels.
///
/// Every item lands on exactly one page, or the whole call fails.
#[instrument(skip_all, fields(items = items.len()))]
pub fn pack_layout<K: Clone + Send + Sync>(
    items: Vec<PlacementRequest<K>>,
    cfg: &PackerConfig,
) -> Result<Vec<PageLayout<K>>> {
    PageOverflow::new(items, cfg)?.collect()
}

/// Packs `sources` into pages, handing each finished page to `sink` before the
/// next one is packed, and returns the descriptor.
///
/// Glyph `i` of `sources` is tagged `i` in the returned layouts. Pages already
/// passed to `sink` stay there if a later page fails.
#[instrument(skip_all, fields(glyphs = sources.len()))]
pub fn pack_glyphs<S: PageSink + ?Sized>(
    sources: &[SourceGlyph],
    cfg: &PackerConfig,
    sink: &mut S,
) -> Result<PackOutput> {
    let requests: Vec<PlacementRequest<usize>> = sources
        .iter()
        .enumerate()
        .map(|(i, s)| PlacementRequest::new(i, s.width(), s.height()))
        .collect();

    let mut builder = FontDescriptorBuilder::new();
    let mut layouts: Vec<PageLayout<usize>> = Vec::new();
    for layout in PageOverflow::new(requests, cfg)? {
        let layout = layout?;
        let rgba = assemble_page(&layout, sources);
        let file = sink.write_page(OutputPage {
            layout: layout.clone(),
            rgba,
        })?;
        for p in &layout.placements {
            builder.add_glyph(sources[p.tag].id.clone(), p.rect, p.page);
        }
        builder.add_page(layout.id, file);
        layouts.push(layout);
    }

    info!(
        pages = layouts.len(),
        glyphs = builder.count(),
        "packing finished"
    );
    Ok(PackOutput {
        descriptor: builder.finish(),
        pages: layouts,
    })
}
