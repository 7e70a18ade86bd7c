use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::model::{AtlasRecord, InputManifest, JsonMap, Manifest, UvRect};
use crate::search::{find_best_single_atlas_with_progress, PackItem, PackedAtlas};
use crate::source::{downscale, resize_to_fit, sha256_hex, SourceImage};
use image::{imageops, RgbaImage};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Downscale factors, processed in order; generation stops early at the
/// first level that fits everything into a single atlas.
pub const SCALE_FACTORS: [u32; 5] = [1, 2, 4, 8, 16];

/// Safety cap on atlases per downscale level.
const MAX_ATLASES_PER_LEVEL: usize = 100;

/// Coarse checkpoints reported during generation.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A downscale level is starting.
    Level { scale: u32 },
    /// Search candidates evaluated so far for the current atlas.
    Candidate { evaluated: usize, total: usize },
    /// The adaptive driver committed one more atlas for the current level.
    AtlasPacked { count: usize, remaining: usize },
    /// An atlas PNG was written to disk.
    AtlasSaved { scale: u32, file: String },
}

/// An atlas produced for one downscale level, before being written out.
pub struct BuiltAtlas {
    pub atlas: PackedAtlas,
    pub sort_strategy: String,
    pub placement_strategy: String,
}

/// Adaptive multi-atlas driver: repeatedly runs the single-atlas search on
/// the residual images, committing the winner each round, until everything
/// is placed or no placement fits. Returns the atlases in production order;
/// an empty result means the caller should fall back to one atlas per image.
pub fn find_best_packing<'a>(
    items: &[PackItem<'a>],
    cfg: &AtlasConfig,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Vec<BuiltAtlas> {
    let mut atlases = Vec::new();
    let mut remaining: Vec<PackItem<'a>> = items.to_vec();

    while !remaining.is_empty() {
        if atlases.len() >= MAX_ATLASES_PER_LEVEL {
            warn!(
                limit = MAX_ATLASES_PER_LEVEL,
                unplaced = remaining.len(),
                "atlas limit reached; keeping the partial result"
            );
            break;
        }
        let best = match find_best_single_atlas_with_progress(&remaining, cfg.padding, progress) {
            Some(b) => b,
            None => {
                warn!(
                    unplaced = remaining.len(),
                    "no placement fits the remaining images"
                );
                break;
            }
        };
        remaining.retain(|it| !best.atlas.uv.contains_key(it.name));
        info!(
            count = best.score.count,
            atlas_size = best.atlas_size,
            sort = %best.sort_label,
            placement = best.placement.as_str(),
            remaining = remaining.len(),
            "atlas committed"
        );
        progress(ProgressEvent::AtlasPacked {
            count: best.score.count,
            remaining: remaining.len(),
        });
        atlases.push(BuiltAtlas {
            atlas: best.atlas,
            sort_strategy: best.sort_label,
            placement_strategy: best.placement.as_str().to_string(),
        });
    }

    let total_area: u64 = atlases
        .iter()
        .map(|b| b.atlas.width as u64 * b.atlas.height as u64)
        .sum();
    let image_area: u64 = atlases
        .iter()
        .flat_map(|b| b.atlas.uv.values())
        .map(|uv| uv.width as u64 * uv.height as u64)
        .sum();
    if total_area > 0 {
        info!(
            atlases = atlases.len(),
            efficiency = format!("{:.1}%", image_area as f64 / total_area as f64 * 100.0),
            "adaptive packing complete"
        );
    }

    atlases
}

/// Fallback when adaptive packing cannot place anything: one atlas per
/// image. Images larger than the usable atlas interior are uniformly
/// downscaled to fit.
pub fn individual_atlases(items: &[PackItem<'_>], cfg: &AtlasConfig) -> Vec<BuiltAtlas> {
    let pad = cfg.padding;
    let limit = cfg.max_atlas_size.saturating_sub(2 * pad);
    items
        .iter()
        .map(|it| {
            let image = resize_to_fit(it.image.clone(), limit);
            let (iw, ih) = image.dimensions();
            let width = iw + 2 * pad;
            let height = ih + 2 * pad;
            let mut canvas = RgbaImage::new(width, height);
            imageops::replace(&mut canvas, &image, pad as i64, pad as i64);
            let mut uv = IndexMap::with_capacity(1);
            uv.insert(
                it.name.to_string(),
                UvRect {
                    width: iw,
                    height: ih,
                    rect_x: pad as f64 / width as f64,
                    rect_y: 1.0 - (pad + ih) as f64 / height as f64,
                    rect_width: iw as f64 / width as f64,
                    rect_height: ih as f64 / height as f64,
                },
            );
            BuiltAtlas {
                atlas: PackedAtlas {
                    canvas,
                    width,
                    height,
                    uv,
                },
                sort_strategy: "individual".to_string(),
                placement_strategy: "none".to_string(),
            }
        })
        .collect()
}

/// Builds all atlases and the output manifest for `images`.
///
/// For each downscale factor: resize copies, run the adaptive driver (or the
/// one-atlas-per-image fallback), write the PNGs densest-first, and record
/// each file's SHA-256. Stops after the first level that needed only a
/// single atlas. Finishes by writing `manifest.json` into `out_dir`.
#[instrument(skip_all)]
pub fn generate(
    images: &[SourceImage],
    input_manifest: Option<&InputManifest>,
    cfg: &AtlasConfig,
    out_dir: &Path,
) -> Result<Manifest> {
    generate_with_progress(images, input_manifest, cfg, out_dir, &mut |_| {})
}

#[instrument(skip_all)]
pub fn generate_with_progress(
    images: &[SourceImage],
    input_manifest: Option<&InputManifest>,
    cfg: &AtlasConfig,
    out_dir: &Path,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Result<Manifest> {
    cfg.validate()?;
    if images.is_empty() {
        return Err(AtlasError::Empty);
    }
    fs::create_dir_all(out_dir)?;

    let mut manifest = Manifest {
        version: 1,
        atlases: Vec::new(),
        total_images: images.len(),
        max_atlas_size: cfg.max_atlas_size,
        max_image_size: cfg.max_image_size,
        padding: cfg.padding,
        images_metadata: build_images_metadata(images, input_manifest),
        metadata: input_manifest
            .map(|m| m.metadata.clone())
            .filter(|m| !m.is_empty()),
    };

    for &scale in SCALE_FACTORS.iter() {
        info!(scale, "packing downscale level");
        progress(ProgressEvent::Level { scale });

        let scaled: Vec<RgbaImage> = if scale == 1 {
            Vec::new()
        } else {
            images.iter().map(|s| downscale(&s.image, scale)).collect()
        };
        let items: Vec<PackItem<'_>> = if scale == 1 {
            images
                .iter()
                .map(|s| PackItem {
                    name: &s.name,
                    image: &s.image,
                })
                .collect()
        } else {
            images
                .iter()
                .zip(&scaled)
                .map(|(s, img)| PackItem {
                    name: &s.name,
                    image: img,
                })
                .collect()
        };

        let mut level = find_best_packing(&items, cfg, progress);
        if level.is_empty() {
            warn!(scale, "adaptive packing placed nothing; building one atlas per image");
            level = individual_atlases(&items, cfg);
        }

        // densest atlases get the lowest indices
        level.sort_by(|a, b| b.atlas.uv.len().cmp(&a.atlas.uv.len()));
        let level_count = level.len();

        for (index, built) in level.into_iter().enumerate() {
            let file = format!("atlas_x{:02}_{:02}.png", scale, index);
            let path = out_dir.join(&file);
            built.atlas.canvas.save(&path)?;
            let sha = sha256_hex(&fs::read(&path)?);
            let efficiency = padded_efficiency(&built.atlas, cfg.padding);
            info!(
                file = %file,
                count = built.atlas.uv.len(),
                width = built.atlas.width,
                height = built.atlas.height,
                efficiency = format!("{:.1}%", efficiency),
                "atlas saved"
            );
            progress(ProgressEvent::AtlasSaved {
                scale,
                file: file.clone(),
            });
            manifest.atlases.push(AtlasRecord {
                file,
                scale,
                index,
                width: built.atlas.width,
                height: built.atlas.height,
                count: built.atlas.uv.len(),
                uv: built.atlas.uv,
                sha,
                sort_strategy: built.sort_strategy,
                placement_strategy: built.placement_strategy,
                efficiency,
            });
        }

        if level_count == 1 {
            info!(
                scale,
                "level fits a single atlas; higher downscale levels add nothing"
            );
            break;
        }
    }

    let manifest_path = out_dir.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    info!(
        path = %manifest_path.display(),
        atlases = manifest.atlases.len(),
        "manifest written"
    );
    Ok(manifest)
}

/// Share of the cropped atlas covered by images plus their padding
/// reservations, as a percentage.
fn padded_efficiency(atlas: &PackedAtlas, padding: u32) -> f64 {
    let atlas_area = atlas.width as u64 * atlas.height as u64;
    if atlas_area == 0 {
        return 0.0;
    }
    let reserved: u64 = atlas
        .uv
        .values()
        .map(|uv| (uv.width + 2 * padding) as u64 * (uv.height + 2 * padding) as u64)
        .sum();
    reserved as f64 / atlas_area as f64 * 100.0
}

/// Per-image metadata for the output manifest: the input manifest's entries
/// (in their original order) when one exists, otherwise a minimal entry per
/// loaded image; each is augmented with the source file's SHA-256.
fn build_images_metadata(
    images: &[SourceImage],
    input_manifest: Option<&InputManifest>,
) -> IndexMap<String, JsonMap> {
    let mut out = IndexMap::new();
    match input_manifest {
        Some(m) => {
            for (name, meta) in &m.images {
                let mut entry = meta.clone();
                if let Some(src) = images.iter().find(|s| &s.name == name) {
                    entry.insert("sha".to_string(), Value::String(src.sha256.clone()));
                }
                out.insert(name.clone(), entry);
            }
        }
        None => {
            for src in images {
                let mut entry = JsonMap::new();
                entry.insert("sha".to_string(), Value::String(src.sha256.clone()));
                out.insert(src.name.clone(), entry);
            }
        }
    }
    out
}
