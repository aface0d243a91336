use super::{Insertion, Packer};
use crate::config::MaxRectsHeuristic;
use crate::model::{PlacementRequest, Rect};

/// Maximal-free-rectangles packer over a fixed `width x height` container.
///
/// Cloning yields an independent copy of the packing state, so heuristic
/// trials never share free lists.
#[derive(Debug, Clone)]
pub struct MaxRectsPacker {
    bounds: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    used_area: u64,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, heuristic: MaxRectsHeuristic) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        let free = if bounds.is_empty() { Vec::new() } else { vec![bounds] };
        Self {
            bounds,
            free,
            used: Vec::new(),
            used_area: 0,
            heuristic,
        }
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn used_rects(&self) -> &[Rect] {
        &self.used
    }

    /// Batch insert, largest area first. See [`super::insert`].
    pub fn insert<K>(&mut self, items: Vec<PlacementRequest<K>>) -> Insertion<K> {
        super::insert(self, items)
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            split_free_node(fr, node, &mut new_free);
        }
        self.free = new_free;
        self.prune_free_list();
        self.used.push(*node);
        self.used_area += node.area();
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                // if a inside b
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                // if b inside a
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = fr.w as i64 - w as i64;
        let leftover_v = fr.h as i64 - h as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        match self.heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => {
                let area_fit = fr.area() as i64 - (w as i64 * h as i64);
                (area_fit, short_fit)
            }
            MaxRectsHeuristic::BottomLeft => (fr.y as i64 + h as i64, fr.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                // maximize contact: negate for minimization
                let contact = self.contact_point_score(fr.x, fr.y, w, h);
                (-(contact as i64), 0)
            }
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<((i64, i64), Rect)> = None;
        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            let s = self.score(fr, w, h);
            let better = match &best {
                None => true,
                Some((bs, _)) => s < *bs,
            };
            if better {
                best = Some((s, Rect::new(fr.x, fr.y, w, h)));
            }
        }
        best.map(|(_, r)| r)
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let node = Rect::new(x, y, w, h);
        let mut score = 0u64;
        // contact with container edges
        if node.x == self.bounds.x || node.right() == self.bounds.right() {
            score += node.h as u64;
        }
        if node.y == self.bounds.y || node.bottom() == self.bounds.bottom() {
            score += node.w as u64;
        }

        for u in &self.used {
            // left/right edges
            if node.x == u.right() || u.x == node.right() {
                score += overlap_1d(node.y, node.bottom(), u.y, u.bottom()) as u64;
            }
            // top/bottom edges
            if node.y == u.bottom() || u.y == node.bottom() {
                score += overlap_1d(node.x, node.right(), u.x, u.right()) as u64;
            }
        }
        score
    }
}

/// Splits `fr` around `node` into up to four maximal leftover strips.
fn split_free_node(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    // left
    if node.x > fr.x {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // right
    if node.right() < fr.right() {
        out.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
    }
    // top
    if node.y > fr.y {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // bottom
    if node.bottom() < fr.bottom() {
        out.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        w > 0 && h > 0 && self.find_position(w, h).is_some()
    }

    fn pack(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let place = self.find_position(w, h)?;
        self.place_rect(&place);
        Some(place)
    }

    fn occupancy(&self) -> f64 {
        let total = self.bounds.area();
        if total == 0 {
            return 0.0;
        }
        self.used_area as f64 / total as f64
    }
}
