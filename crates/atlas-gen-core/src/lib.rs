//! Core library for building multi-resolution texture atlases.
//!
//! - Packing: MaxRects-style free-rectangle packer with five placement
//!   heuristics (BAF/BSSF/BLSF/BL/CP)
//! - Search: exhaustive (atlas size × sort × placement) grid plus seeded
//!   shuffle refinement, picking the best single atlas per round
//! - Pipeline: `generate` packs a fixed ladder of downscale levels, writes
//!   PNG pages and a JSON manifest with normalized bottom-left-origin UVs
//!   and content hashes
//! - Publication: `publish_static` re-keys the manifest by stable image
//!   index for static hosting
//!
//! Quick example:
//! ```ignore
//! use atlas_gen_core::{generate, load_directory, AtlasConfig};
//! # fn main() -> atlas_gen_core::Result<()> {
//! let cfg = AtlasConfig::default();
//! let images = load_directory("input_images".as_ref(), cfg.max_image_size)?;
//! let manifest = generate(&images, None, &cfg, "output_atlases".as_ref())?;
//! println!("atlases: {}", manifest.atlases.len());
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod publish;
pub mod search;
pub mod sort;
pub mod source;

pub use config::*;
pub use error::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use publish::*;
pub use search::*;
pub use source::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_gen_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, PlacementStrategy, SortStrategy};
    pub use crate::model::{AtlasRecord, InputManifest, Manifest, Rect, StaticManifest, UvRect};
    pub use crate::packer::BinPacker;
    pub use crate::pipeline::{
        find_best_packing, generate, generate_with_progress, individual_atlases, ProgressEvent,
    };
    pub use crate::publish::{compress_manifest, publish_static};
    pub use crate::search::{find_best_single_atlas, pack_single_atlas, PackItem, PackedAtlas};
    pub use crate::source::{load_directory, SourceImage};
}
