use crate::model::{PlacementRequest, Rect};

pub mod maxrects;

/// A packer places rectangles into one fixed-size container.
///
/// Implementations must ensure placed rectangles never overlap and stay inside the container.
/// `pack` returns `None` if the rectangle cannot be placed in what is left of the container.
pub trait Packer {
    fn can_pack(&self, w: u32, h: u32) -> bool;
    fn pack(&mut self, w: u32, h: u32) -> Option<Rect>;
    /// Fraction of the container covered by placed rectangles.
    fn occupancy(&self) -> f64;
}

/// Result of a batch insert: what landed where, and what did not fit.
#[derive(Debug, Clone)]
pub struct Insertion<K> {
    pub placed: Vec<(K, Rect)>,
    pub unplaced: Vec<PlacementRequest<K>>,
}

/// Places `items` largest area first; equal areas keep their input order.
///
/// Items that do not fit are returned in `unplaced`, in input order, with their tags intact.
pub fn insert<K, P: Packer + ?Sized>(packer: &mut P, items: Vec<PlacementRequest<K>>) -> Insertion<K> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    // stable: ties stay in discovery order
    order.sort_by(|&a, &b| items[b].area().cmp(&items[a].area()));

    let mut fitted = vec![None; items.len()];
    for &idx in &order {
        let item = &items[idx];
        if item.w == 0 || item.h == 0 {
            continue;
        }
        fitted[idx] = packer.pack(item.w, item.h);
    }

    let mut placed_slots: Vec<Option<(K, Rect)>> = Vec::with_capacity(items.len());
    let mut unplaced = Vec::new();
    for (item, slot) in items.into_iter().zip(fitted) {
        match slot {
            Some(rect) => placed_slots.push(Some((item.tag, rect))),
            None => {
                placed_slots.push(None);
                unplaced.push(item);
            }
        }
    }
    // report placements in the order they were made
    let mut placed = Vec::with_capacity(placed_slots.len());
    for idx in order {
        if let Some(p) = placed_slots[idx].take() {
            placed.push(p);
        }
    }
    Insertion { placed, unplaced }
}
