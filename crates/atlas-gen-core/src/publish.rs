use crate::error::{AtlasError, Result};
use crate::model::{Manifest, StaticAtlas, StaticManifest};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a static publication pass.
#[derive(Debug, Clone, Copy)]
pub struct PublishSummary {
    pub atlases: usize,
    pub images: usize,
    pub copied: usize,
}

/// Rewrites `manifest` into the static consumer format: per-atlas `uv` maps
/// are re-keyed by the stable integer index of each image (the insertion
/// order of `images_metadata`), whose entries become the `mapping` array.
pub fn compress_manifest(manifest: &Manifest) -> StaticManifest {
    let index_of: HashMap<&str, usize> = manifest
        .images_metadata
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let mapping = manifest.images_metadata.values().cloned().collect();

    let atlases = manifest
        .atlases
        .iter()
        .map(|record| {
            let mut uv = IndexMap::with_capacity(record.uv.len());
            for (name, entry) in &record.uv {
                match index_of.get(name.as_str()) {
                    Some(i) => {
                        uv.insert(i.to_string(), *entry);
                    }
                    None => warn!(image = %name, atlas = %record.file, "image missing from metadata; dropped from static uv map"),
                }
            }
            StaticAtlas {
                scale: record.scale,
                width: record.width,
                height: record.height,
                sha: record.sha.clone(),
                uv,
            }
        })
        .collect();

    StaticManifest {
        version: manifest.version,
        mapping,
        atlases,
        metadata: manifest.metadata.clone(),
    }
}

/// Publishes `atlas_dir` (a generation output) as a static bundle in
/// `out_dir`: writes the compressed `atlas.json` and copies every atlas PNG
/// to `atlas/<flat-index>.png`.
pub fn publish_static(atlas_dir: &Path, out_dir: &Path) -> Result<PublishSummary> {
    if !atlas_dir.is_dir() {
        return Err(AtlasError::InputMissing(atlas_dir.to_path_buf()));
    }
    let manifest_path = atlas_dir.join("manifest.json");
    if !manifest_path.is_file() {
        return Err(AtlasError::ManifestMissing(manifest_path));
    }
    let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
    let compressed = compress_manifest(&manifest);

    fs::create_dir_all(out_dir)?;
    let json_path = out_dir.join("atlas.json");
    fs::write(&json_path, serde_json::to_string_pretty(&compressed)?)?;
    info!(path = %json_path.display(), "static manifest written");

    let images_dir = out_dir.join("atlas");
    fs::create_dir_all(&images_dir)?;
    let mut copied = 0usize;
    for (index, record) in manifest.atlases.iter().enumerate() {
        let src = atlas_dir.join(&record.file);
        if !src.is_file() {
            warn!(file = %record.file, "atlas file missing; not copied");
            continue;
        }
        let ext = Path::new(&record.file)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let dst = images_dir.join(format!("{}.{}", index, ext));
        fs::copy(&src, &dst)?;
        copied += 1;
    }
    info!(
        copied,
        atlases = compressed.atlases.len(),
        images = compressed.mapping.len(),
        "static bundle complete"
    );

    Ok(PublishSummary {
        atlases: compressed.atlases.len(),
        images: compressed.mapping.len(),
        copied,
    })
}
