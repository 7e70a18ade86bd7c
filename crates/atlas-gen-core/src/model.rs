use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arbitrary JSON object, insertion-ordered (per-image user metadata and
/// the pass-through `metadata` block).
pub type JsonMap = serde_json::Map<String, Value>;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge coordinate (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge coordinate (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Strict overlap; touching edges do not count.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// Placement of one image within an atlas, in normalized coordinates with a
/// bottom-left origin. `width`/`height` are the placed pixel dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UvRect {
    pub width: u32,
    pub height: u32,
    pub rect_x: f64,
    pub rect_y: f64,
    pub rect_width: f64,
    pub rect_height: f64,
}

/// One packed atlas page as recorded in the output manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasRecord {
    pub file: String,
    pub scale: u32,
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub uv: IndexMap<String, UvRect>,
    pub count: usize,
    pub sha: String,
    pub sort_strategy: String,
    pub placement_strategy: String,
    pub efficiency: f64,
}

/// Output manifest written next to the atlas PNGs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub atlases: Vec<AtlasRecord>,
    pub total_images: usize,
    pub max_atlas_size: u32,
    pub max_image_size: u32,
    pub padding: u32,
    pub images_metadata: IndexMap<String, JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

/// Optional `manifest.json` found in the input directory.
///
/// The `images` map order is authoritative: it defines the stable integer
/// index each image gets in the static publication output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub images: IndexMap<String, JsonMap>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl Default for InputManifest {
    fn default() -> Self {
        Self {
            version: default_version(),
            images: IndexMap::new(),
            metadata: JsonMap::new(),
        }
    }
}

fn default_version() -> u32 {
    1
}

impl InputManifest {
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn max_atlas_size(&self) -> Option<u32> {
        self.metadata_u32("max_atlas_size")
    }
    pub fn padding(&self) -> Option<u32> {
        self.metadata_u32("padding")
    }
    pub fn max_image_size(&self) -> Option<u32> {
        self.metadata_u32("max_image_size")
    }

    fn metadata_u32(&self, key: &str) -> Option<u32> {
        self.metadata.get(key).and_then(Value::as_u64).map(|v| v as u32)
    }
}

/// One atlas entry of the static publication manifest; `uv` is keyed by the
/// stable image index rendered as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticAtlas {
    pub scale: u32,
    pub width: u32,
    pub height: u32,
    pub sha: String,
    pub uv: IndexMap<String, UvRect>,
}

/// Static publication manifest (`atlas.json`): image names compressed to
/// integer indices, per-image metadata flattened into `mapping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticManifest {
    pub version: u32,
    pub mapping: Vec<JsonMap>,
    pub atlases: Vec<StaticAtlas>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}
