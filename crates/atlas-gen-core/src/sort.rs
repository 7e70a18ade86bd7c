use crate::config::SortStrategy;
use crate::search::PackItem;

/// Reorders `items` under `strategy`. All sorts are stable, so equal keys
/// keep their source order and a fixed input yields a fixed output.
pub fn sort_items<'a>(items: &[PackItem<'a>], strategy: SortStrategy) -> Vec<PackItem<'a>> {
    let mut out: Vec<PackItem<'a>> = items.to_vec();
    match strategy {
        SortStrategy::None => {}
        SortStrategy::Area => out.sort_by(|a, b| area(b).cmp(&area(a))),
        SortStrategy::AreaAsc => out.sort_by(|a, b| area(a).cmp(&area(b))),
        SortStrategy::Height => out.sort_by(|a, b| dims(b).1.cmp(&dims(a).1)),
        SortStrategy::HeightAsc => out.sort_by(|a, b| dims(a).1.cmp(&dims(b).1)),
        SortStrategy::Width => out.sort_by(|a, b| dims(b).0.cmp(&dims(a).0)),
        SortStrategy::WidthAsc => out.sort_by(|a, b| dims(a).0.cmp(&dims(b).0)),
        SortStrategy::Perimeter => out.sort_by(|a, b| perimeter(b).cmp(&perimeter(a))),
        SortStrategy::MaxSide => out.sort_by(|a, b| max_side(b).cmp(&max_side(a))),
        SortStrategy::MinSide => out.sort_by(|a, b| min_side(b).cmp(&min_side(a))),
        // w/max(h,1) descending, compared exactly by cross-multiplication
        SortStrategy::Ratio => out.sort_by(|a, b| {
            let (aw, ah) = dims(a);
            let (bw, bh) = dims(b);
            (bw as u64 * ah.max(1) as u64).cmp(&(aw as u64 * bh.max(1) as u64))
        }),
        SortStrategy::RatioInv => out.sort_by(|a, b| {
            let (aw, ah) = dims(a);
            let (bw, bh) = dims(b);
            (bh as u64 * aw.max(1) as u64).cmp(&(ah as u64 * bw.max(1) as u64))
        }),
        // √(w²+h²) descending; the squared key orders identically
        SortStrategy::Diagonal => out.sort_by(|a, b| diag_sq(b).cmp(&diag_sq(a))),
        SortStrategy::Pathological => {
            out.sort_by(|a, b| area(b).cmp(&area(a)));
            out = interleave_ends(out);
        }
    }
    out
}

fn dims(it: &PackItem<'_>) -> (u32, u32) {
    it.image.dimensions()
}

fn area(it: &PackItem<'_>) -> u64 {
    let (w, h) = dims(it);
    w as u64 * h as u64
}

fn perimeter(it: &PackItem<'_>) -> u64 {
    let (w, h) = dims(it);
    w as u64 + h as u64
}

fn max_side(it: &PackItem<'_>) -> u32 {
    let (w, h) = dims(it);
    w.max(h)
}

fn min_side(it: &PackItem<'_>) -> u32 {
    let (w, h) = dims(it);
    w.min(h)
}

fn diag_sq(it: &PackItem<'_>) -> u64 {
    let (w, h) = dims(it);
    (w as u64 * w as u64) + (h as u64 * h as u64)
}

/// Alternates outermost and innermost elements (largest, smallest, second
/// largest, ...). The middle element of an odd-length input appears once.
fn interleave_ends<'a>(sorted: Vec<PackItem<'a>>) -> Vec<PackItem<'a>> {
    let mut out = Vec::with_capacity(sorted.len());
    if sorted.is_empty() {
        return out;
    }
    let mut left = 0usize;
    let mut right = sorted.len() - 1;
    while left <= right {
        out.push(sorted[left]);
        if left != right {
            out.push(sorted[right]);
        }
        left += 1;
        if right == 0 {
            break;
        }
        right -= 1;
    }
    out
}
