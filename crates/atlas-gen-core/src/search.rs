use crate::config::{PlacementStrategy, SortStrategy};
use crate::model::UvRect;
use crate::packer::BinPacker;
use crate::pipeline::ProgressEvent;
use crate::sort::sort_items;
use image::{imageops, RgbaImage};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Atlas edge lengths the search probes, largest first.
pub const ATLAS_SIZE_CANDIDATES: [u32; 3] = [2048, 1536, 1024];

const PERMUTATIONS_PER_CONFIG: u64 = 2;
const REFINEMENT_ROUNDS: u64 = 10;
const REFINEMENT_SEED_BASE: u64 = 5000;

/// One image at the current downscale level, borrowed from the orchestrator.
#[derive(Clone, Copy)]
pub struct PackItem<'a> {
    pub name: &'a str,
    pub image: &'a RgbaImage,
}

/// A packed atlas: the tightly cropped canvas plus per-image UVs in
/// placement order.
pub struct PackedAtlas {
    pub canvas: RgbaImage,
    pub width: u32,
    pub height: u32,
    pub uv: IndexMap<String, UvRect>,
}

impl PackedAtlas {
    pub fn score(&self) -> Score {
        let image_area = self
            .uv
            .values()
            .map(|uv| uv.width as u64 * uv.height as u64)
            .sum();
        Score {
            count: self.uv.len(),
            total_area: self.width as u64 * self.height as u64,
            image_area,
        }
    }
}

/// Ranking key for candidate atlases. Greater is better: more images
/// placed, then smaller cropped area, then higher fill ratio.
#[derive(Debug, Clone, Copy)]
pub struct Score {
    pub count: usize,
    pub total_area: u64,
    pub image_area: u64,
}

impl Score {
    /// Placed image area over cropped atlas area, in [0, 1].
    pub fn efficiency(&self) -> f64 {
        if self.total_area == 0 {
            0.0
        } else {
            self.image_area as f64 / self.total_area as f64
        }
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.total_area.cmp(&self.total_area))
            // efficiency compared by cross-multiplication, no division
            .then_with(|| {
                (self.image_area * other.total_area).cmp(&(other.image_area * self.total_area))
            })
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

/// Winning candidate of the single-atlas search, with the labels that
/// produced it.
pub struct BestAtlas {
    pub atlas: PackedAtlas,
    pub atlas_size: u32,
    pub sort_label: String,
    pub placement: PlacementStrategy,
    pub score: Score,
}

/// Greedily packs `items` (already in packing order) into one `size`×`size`
/// atlas, stopping at the first item that does not fit. The canvas is then
/// cropped to the used extent and UVs are normalized against the cropped
/// dimensions, y flipped to a bottom-left origin.
///
/// Returns `None` when not a single item was placed.
pub fn pack_single_atlas(
    items: &[PackItem<'_>],
    size: u32,
    padding: u32,
    placement: PlacementStrategy,
) -> Option<PackedAtlas> {
    let mut packer = BinPacker::new(size, size, placement);
    let mut canvas = RgbaImage::new(size, size);
    let mut placements: Vec<(&str, u32, u32, u32, u32)> = Vec::new();
    let mut max_right = 0u32;
    let mut max_bottom = 0u32;

    for it in items {
        let (iw, ih) = it.image.dimensions();
        let rect = match packer.insert(iw + 2 * padding, ih + 2 * padding) {
            Some(r) => r,
            // atlas is full for this order; the rest belongs to later atlases
            None => break,
        };
        let px = rect.x + padding;
        let py = rect.y + padding;
        imageops::replace(&mut canvas, it.image, px as i64, py as i64);
        placements.push((it.name, iw, ih, px, py));
        max_right = max_right.max(rect.right());
        max_bottom = max_bottom.max(rect.bottom());
    }

    if placements.is_empty() {
        return None;
    }

    let width = max_right.max(1);
    let height = max_bottom.max(1);
    let canvas = imageops::crop_imm(&canvas, 0, 0, width, height).to_image();

    let mut uv = IndexMap::with_capacity(placements.len());
    for (name, iw, ih, px, py) in placements {
        uv.insert(
            name.to_string(),
            UvRect {
                width: iw,
                height: ih,
                rect_x: px as f64 / width as f64,
                rect_y: 1.0 - (py + ih) as f64 / height as f64,
                rect_width: iw as f64 / width as f64,
                rect_height: ih as f64 / height as f64,
            },
        );
    }

    Some(PackedAtlas {
        canvas,
        width,
        height,
        uv,
    })
}

/// Searches for the best single atlas over `items`: every atlas size ×
/// placement × sort combination, two seeded block-shuffle permutations per
/// combination, then a shuffled refinement pass against the winner's size
/// and placement. Returns `None` when `items` is empty or some item cannot
/// fit the largest candidate atlas even alone.
pub fn find_best_single_atlas<'a>(items: &[PackItem<'a>], padding: u32) -> Option<BestAtlas> {
    find_best_single_atlas_with_progress(items, padding, &mut |_| {})
}

pub fn find_best_single_atlas_with_progress(
    items: &[PackItem<'_>],
    padding: u32,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Option<BestAtlas> {
    if items.is_empty() {
        return None;
    }
    let max_size = ATLAS_SIZE_CANDIDATES[0];
    for it in items {
        let (w, h) = it.image.dimensions();
        if w + 2 * padding > max_size || h + 2 * padding > max_size {
            warn!(
                name = it.name,
                width = w,
                height = h,
                "image exceeds the largest candidate atlas; search aborted"
            );
            return None;
        }
    }

    let candidates = enumerate_candidates();
    let total = candidates.len() + REFINEMENT_ROUNDS as usize;
    let mut best = evaluate_grid(items, padding, &candidates, total, progress)?;

    // refinement: full shuffles against the winning size and placement
    for i in 0..REFINEMENT_ROUNDS {
        let mut order: Vec<PackItem<'_>> = items.to_vec();
        let mut rng = StdRng::seed_from_u64(REFINEMENT_SEED_BASE + i);
        order.shuffle(&mut rng);
        if let Some(atlas) = pack_single_atlas(&order, best.atlas_size, padding, best.placement) {
            let score = atlas.score();
            if score > best.score {
                debug!(round = i, count = score.count, "shuffled refinement improved the atlas");
                best = BestAtlas {
                    atlas,
                    atlas_size: best.atlas_size,
                    sort_label: format!("random_{}", i),
                    placement: best.placement,
                    score,
                };
            }
        }
        progress(ProgressEvent::Candidate {
            evaluated: candidates.len() + i as usize + 1,
            total,
        });
    }

    Some(best)
}

struct Candidate {
    size: u32,
    placement: PlacementStrategy,
    order: CandidateOrder,
    label: String,
}

enum CandidateOrder {
    Sorted(SortStrategy),
    BlockShuffle { base: SortStrategy, seed: u64 },
}

/// Builds the full candidate list up front so the running config counter
/// (part of every shuffle seed) is identical no matter how candidates are
/// later evaluated.
fn enumerate_candidates() -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut counter: u64 = 0;
    for &size in &ATLAS_SIZE_CANDIDATES {
        for &placement in &PlacementStrategy::ALL {
            for &sort in &SortStrategy::SEARCH_SET {
                counter += 1;
                out.push(Candidate {
                    size,
                    placement,
                    order: CandidateOrder::Sorted(sort),
                    label: sort.as_str().to_string(),
                });
                for perm in 0..PERMUTATIONS_PER_CONFIG {
                    counter += 1;
                    out.push(Candidate {
                        size,
                        placement,
                        order: CandidateOrder::BlockShuffle {
                            base: sort,
                            seed: size as u64 + counter + perm * 1000,
                        },
                        label: format!("{}_perm{}", sort.as_str(), perm),
                    });
                }
            }
        }
    }
    out
}

fn materialize_order<'a>(items: &[PackItem<'a>], order: &CandidateOrder) -> Vec<PackItem<'a>> {
    match order {
        CandidateOrder::Sorted(sort) => sort_items(items, *sort),
        CandidateOrder::BlockShuffle { base, seed } => {
            let mut shuffled = sort_items(items, *base);
            let n = shuffled.len();
            let block = (n / 10).max(3);
            let step = block / 2;
            let mut rng = StdRng::seed_from_u64(*seed);
            let mut i = 0usize;
            while i + block <= n {
                shuffled[i..i + block].shuffle(&mut rng);
                i += step;
            }
            shuffled
        }
    }
}

fn evaluate(items: &[PackItem<'_>], padding: u32, cand: &Candidate) -> Option<BestAtlas> {
    let order = materialize_order(items, &cand.order);
    let atlas = pack_single_atlas(&order, cand.size, padding, cand.placement)?;
    let score = atlas.score();
    Some(BestAtlas {
        atlas,
        atlas_size: cand.size,
        sort_label: cand.label.clone(),
        placement: cand.placement,
        score,
    })
}

#[cfg(not(feature = "parallel"))]
fn evaluate_grid(
    items: &[PackItem<'_>],
    padding: u32,
    candidates: &[Candidate],
    total: usize,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Option<BestAtlas> {
    let mut best: Option<BestAtlas> = None;
    for (i, cand) in candidates.iter().enumerate() {
        let result = evaluate(items, padding, cand);
        progress(ProgressEvent::Candidate {
            evaluated: i + 1,
            total,
        });
        if let Some(r) = result {
            if best.as_ref().map_or(true, |b| r.score > b.score) {
                best = Some(r);
            }
        }
    }
    best
}

/// Parallel grid evaluation. Seeds are baked into the candidate list, so
/// only the ranking has to stay canonical: candidates are scored in
/// parallel, losers are dropped immediately, and the winner (first
/// enumeration index among the best scores) is repacked once.
#[cfg(feature = "parallel")]
fn evaluate_grid(
    items: &[PackItem<'_>],
    padding: u32,
    candidates: &[Candidate],
    total: usize,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Option<BestAtlas> {
    let scores: Vec<Option<Score>> = candidates
        .par_iter()
        .map(|cand| evaluate(items, padding, cand).map(|r| r.score))
        .collect();
    progress(ProgressEvent::Candidate {
        evaluated: candidates.len(),
        total,
    });
    let mut best: Option<(usize, Score)> = None;
    for (i, score) in scores.iter().enumerate() {
        if let Some(score) = score {
            if best.map_or(true, |(_, b)| *score > b) {
                best = Some((i, *score));
            }
        }
    }
    best.and_then(|(i, _)| evaluate(items, padding, &candidates[i]))
}
