use crate::error::{AtlasError, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

/// File extensions accepted as source images (case-insensitive).
pub const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "gif", "webp"];

/// A decoded source image, immutable for the rest of the run.
///
/// `sha256` is computed over the raw file bytes, before decoding or any
/// resizing, and identifies the source in the manifest.
pub struct SourceImage {
    pub name: String,
    pub image: RgbaImage,
    pub sha256: String,
}

impl SourceImage {
    /// Reads `path`, hashes the raw bytes, decodes to RGBA8 and uniformly
    /// shrinks the raster so neither side exceeds `max_image_size`.
    pub fn load(path: &Path, max_image_size: u32) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let sha256 = sha256_hex(&bytes);
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        let (w, h) = image.dimensions();
        let image = resize_to_fit(image, max_image_size);
        let (nw, nh) = image.dimensions();
        if (nw, nh) != (w, h) {
            info!(path = %path.display(), from = format!("{}x{}", w, h), to = format!("{}x{}", nw, nh), "resized oversized source");
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { name, image, sha256 })
    }
}

/// Returns true for paths with a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

/// Loads every supported image directly under `dir`, in filename order.
/// Files that fail to decode are skipped with a warning.
pub fn load_directory(dir: &Path, max_image_size: u32) -> Result<Vec<SourceImage>> {
    if !dir.is_dir() {
        return Err(AtlasError::InputMissing(dir.to_path_buf()));
    }
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();
    paths.sort();
    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        match SourceImage::load(path, max_image_size) {
            Ok(img) => images.push(img),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping undecodable image"),
        }
    }
    if images.is_empty() {
        return Err(AtlasError::Empty);
    }
    Ok(images)
}

/// Uniformly shrinks `image` so both sides are at most `max_side`,
/// preserving aspect ratio; returns it unchanged when it already fits.
pub fn resize_to_fit(image: RgbaImage, max_side: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_side && h <= max_side {
        return image;
    }
    let ratio = (max_side as f64 / w as f64).min(max_side as f64 / h as f64);
    let nw = ((w as f64 * ratio) as u32).max(1);
    let nh = ((h as f64 * ratio) as u32).max(1);
    imageops::resize(&image, nw, nh, FilterType::Lanczos3)
}

/// Downscales by an integer factor, clamping each side to at least 1px.
pub fn downscale(image: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let nw = (w / factor).max(1);
    let nh = (h / factor).max(1);
    imageops::resize(image, nw, nh, FilterType::Lanczos3)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
