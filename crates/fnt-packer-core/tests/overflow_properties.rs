use std::collections::HashMap;

use fnt_packer_core::config::{MaxRectsHeuristic, PackerConfig};
use fnt_packer_core::error::FontPackerError;
use fnt_packer_core::model::{PageLayout, PlacementRequest};
use fnt_packer_core::{PageOverflow, pack_layout};
use rand::{Rng, SeedableRng};

fn random_corpus(seed: u64, n: usize, max_side: u32) -> Vec<PlacementRequest<usize>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let w = rng.gen_range(1..=max_side);
            let h = rng.gen_range(1..=max_side);
            PlacementRequest::new(i, w, h)
        })
        .collect()
}

fn check_pages(pages: &[PageLayout<usize>], corpus: &[PlacementRequest<usize>], w: u32, h: u32) {
    let mut seen: HashMap<usize, usize> = HashMap::new();
    for (idx, page) in pages.iter().enumerate() {
        assert_eq!(page.id, idx, "page ids are sequential");
        assert_eq!((page.width, page.height), (w, h));
        assert!(!page.placements.is_empty(), "no empty pages");
        for (i, a) in page.placements.iter().enumerate() {
            assert_eq!(a.page, page.id);
            assert!(a.rect.right() <= w && a.rect.bottom() <= h, "out of bounds: {:?}", a.rect);
            let req = &corpus[a.tag];
            assert_eq!((a.rect.w, a.rect.h), (req.w, req.h));
            for b in &page.placements[i + 1..] {
                assert!(
                    !a.rect.intersects(&b.rect),
                    "overlap on page {}: {:?} / {:?}",
                    page.id,
                    a.rect,
                    b.rect
                );
            }
            *seen.entry(a.tag).or_default() += 1;
        }
    }
    assert_eq!(seen.len(), corpus.len(), "every item placed");
    assert!(seen.values().all(|&c| c == 1), "no item placed twice");
}

#[test]
fn auto_selection_multi_page_invariants() {
    let corpus = random_corpus(42, 150, 48);
    let cfg = PackerConfig::builder().with_page_size(128, 128).build();
    let pages = pack_layout(corpus.clone(), &cfg).expect("pack");
    assert!(pages.len() > 1);
    assert!(pages.len() <= corpus.len());
    check_pages(&pages, &corpus, 128, 128);
}

#[test]
fn every_fixed_heuristic_keeps_invariants() {
    let corpus = random_corpus(7, 80, 40);
    for h in MaxRectsHeuristic::ALL {
        let cfg = PackerConfig::builder()
            .with_page_size(96, 64)
            .fixed_heuristic(h)
            .build();
        let pages = pack_layout(corpus.clone(), &cfg).expect("pack");
        assert!(pages.iter().all(|p| p.heuristic == h));
        check_pages(&pages, &corpus, 96, 64);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let corpus = random_corpus(1234, 120, 64);
    let cfg = PackerConfig::builder().with_page_size(256, 256).build();
    let a = pack_layout(corpus.clone(), &cfg).expect("first");
    let b = pack_layout(corpus, &cfg).expect("second");
    assert_eq!(a.len(), b.len());
    for (pa, pb) in a.iter().zip(b.iter()) {
        assert_eq!(pa.heuristic, pb.heuristic);
        assert_eq!(pa.placements, pb.placements);
    }
}

#[test]
fn equal_sizes_keep_discovery_order() {
    // same size everywhere: first page must take the lowest tags
    let corpus: Vec<_> = (0..10).map(|i| PlacementRequest::new(i, 16, 16)).collect();
    let cfg = PackerConfig::builder().with_page_size(32, 32).build();
    let pages = pack_layout(corpus, &cfg).expect("pack");
    assert_eq!(pages.len(), 3);
    let tags: Vec<Vec<usize>> = pages
        .iter()
        .map(|p| p.placements.iter().map(|pl| pl.tag).collect())
        .collect();
    assert_eq!(tags, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
}

#[test]
fn page_count_never_exceeds_item_count() {
    // one item per page is the worst case
    let corpus: Vec<_> = (0..6).map(|i| PlacementRequest::new(i, 30, 30)).collect();
    let cfg = PackerConfig::builder().with_page_size(32, 32).build();
    let pages = pack_layout(corpus.clone(), &cfg).expect("pack");
    assert_eq!(pages.len(), corpus.len());
    check_pages(&pages, &corpus, 32, 32);
}

#[test]
fn stuck_page_leaves_the_unfittable_items_pending() {
    let corpus = vec![
        PlacementRequest::new(0usize, 8, 8),
        PlacementRequest::new(1usize, 40, 8),
        PlacementRequest::new(2usize, 8, 8),
    ];
    let cfg = PackerConfig::builder().with_page_size(32, 32).build();
    let mut overflow = PageOverflow::new(corpus, &cfg).expect("valid input");

    let first = overflow.next().expect("a page").expect("fits");
    let tags: Vec<usize> = first.placements.iter().map(|p| p.tag).collect();
    assert_eq!(tags, vec![0, 2]);
    assert_eq!(overflow.pending(), &[PlacementRequest::new(1usize, 40, 8)]);

    match overflow.next() {
        Some(Err(FontPackerError::UnfittablePage {
            page,
            remaining,
            largest,
        })) => assert_eq!((page, remaining, largest), (1, 1, (40, 8))),
        other => panic!("expected UnfittablePage, got {other:?}"),
    }
    assert!(overflow.next().is_none());
    assert_eq!(overflow.pending().len(), 1);
}
