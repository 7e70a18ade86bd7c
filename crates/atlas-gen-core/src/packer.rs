use crate::config::PlacementStrategy;
use crate::model::Rect;

/// Free-rectangle bin packer over a fixed canvas.
///
/// Maintains a list of maximal free rectangles and the list of placed
/// rectangles. Invariants after every successful `insert`:
/// - used rectangles are pairwise disjoint and inside the canvas;
/// - no free rectangle is contained in another free rectangle;
/// - no free rectangle overlaps a used rectangle.
///
/// Instances are single-use: create, fill, read the placements, drop.
pub struct BinPacker {
    width: u32,
    height: u32,
    strategy: PlacementStrategy,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl BinPacker {
    pub fn new(width: u32, height: u32, strategy: PlacementStrategy) -> Self {
        Self {
            width,
            height,
            strategy,
            free: vec![Rect::new(0, 0, width, height)],
            used: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn used_rects(&self) -> &[Rect] {
        &self.used
    }
    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    /// Places a `w`×`h` item and returns its rectangle, or `None` when no
    /// free rectangle can host it. The packer is left untouched on failure.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let node = self.find_position(w, h)?;
        self.split_free(&node);
        self.prune_free();
        self.used.push(node);
        Some(node)
    }

    /// Scans the free list in insertion order and keeps the candidate with
    /// the strictly best (primary, secondary) score; ties keep the earliest.
    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<(Rect, (i64, i64))> = None;
        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            let score = self.score(fr, w, h);
            let better = match &best {
                None => true,
                Some((_, b)) => score.0 < b.0 || (score.0 == b.0 && score.1 < b.1),
            };
            if better {
                best = Some((Rect::new(fr.x, fr.y, w, h), score));
            }
        }
        best.map(|(r, _)| r)
    }

    /// (primary, secondary) score for hosting a `w`×`h` item in `fr`; both
    /// components are minimized.
    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_w = (fr.w - w) as i64;
        let leftover_h = (fr.h - h) as i64;
        let short_fit = leftover_w.min(leftover_h);
        let long_fit = leftover_w.max(leftover_h);
        let area_fit = fr.area() as i64 - (w as u64 * h as u64) as i64;
        match self.strategy {
            PlacementStrategy::BestAreaFit => (area_fit, short_fit),
            PlacementStrategy::BestShortSideFit => (short_fit, long_fit),
            PlacementStrategy::BestLongSideFit => (long_fit, short_fit),
            PlacementStrategy::BottomLeft => (fr.y as i64, fr.x as i64),
            PlacementStrategy::ContactPoint => {
                // maximize contact: negate for minimization
                let contact = self.contact_score(fr.x, fr.y, w, h) as i64;
                (-contact, area_fit)
            }
        }
    }

    /// Total touching-edge length a placement at (x, y) would share with the
    /// canvas border and already-placed rectangles.
    fn contact_score(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let mut score = 0u64;
        if x == 0 {
            score += h as u64;
        }
        if y == 0 {
            score += w as u64;
        }
        for u in &self.used {
            // left edge against u's right edge, with strict vertical overlap
            if u.right() == x && y < u.bottom() && y + h > u.y {
                score += h.min(u.h) as u64;
            }
            // top edge against u's bottom edge, with strict horizontal overlap
            if u.bottom() == y && x < u.right() && x + w > u.x {
                score += w.min(u.w) as u64;
            }
        }
        score
    }

    /// Rebuilds the free list after placing `node`: rectangles that strictly
    /// overlap it are replaced by their up-to-four overhang bands, others are
    /// kept verbatim.
    fn split_free(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 3);
        for fr in &self.free {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            // right band
            if fr.x < node.right() && fr.right() > node.right() {
                new_free.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
            }
            // left band
            if fr.x < node.x && fr.right() > node.x {
                new_free.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
            }
            // bottom band
            if fr.y < node.bottom() && fr.bottom() > node.bottom() {
                new_free.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
            }
            // top band
            if fr.y < node.y && fr.bottom() > node.y {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
            }
        }
        self.free = new_free;
    }

    /// Drops every free rectangle contained in another free rectangle.
    fn prune_free(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
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
}
