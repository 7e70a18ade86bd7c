use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Placement heuristics for the free-rectangle packer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl PlacementStrategy {
    /// All placement heuristics, in the order the search enumerates them.
    pub const ALL: [PlacementStrategy; 5] = [
        PlacementStrategy::BestAreaFit,
        PlacementStrategy::BestShortSideFit,
        PlacementStrategy::BestLongSideFit,
        PlacementStrategy::BottomLeft,
        PlacementStrategy::ContactPoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStrategy::BestAreaFit => "best_area_fit",
            PlacementStrategy::BestShortSideFit => "best_short_side_fit",
            PlacementStrategy::BestLongSideFit => "best_long_side_fit",
            PlacementStrategy::BottomLeft => "bottom_left",
            PlacementStrategy::ContactPoint => "contact_point",
        }
    }
}

impl FromStr for PlacementStrategy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "best_area_fit" => Ok(Self::BestAreaFit),
            "bssf" | "best_short_side_fit" => Ok(Self::BestShortSideFit),
            "blsf" | "best_long_side_fit" => Ok(Self::BestLongSideFit),
            "bl" | "bottom_left" => Ok(Self::BottomLeft),
            "cp" | "contact_point" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Orderings applied to the input set before greedy packing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    None,
    Area,
    AreaAsc,
    Height,
    HeightAsc,
    Width,
    WidthAsc,
    Perimeter,
    MaxSide,
    MinSide,
    Ratio,
    RatioInv,
    Diagonal,
    Pathological,
}

impl SortStrategy {
    /// The orderings the single-atlas search grid enumerates, in order.
    pub const SEARCH_SET: [SortStrategy; 12] = [
        SortStrategy::Area,
        SortStrategy::Height,
        SortStrategy::Width,
        SortStrategy::Perimeter,
        SortStrategy::MaxSide,
        SortStrategy::MinSide,
        SortStrategy::Ratio,
        SortStrategy::RatioInv,
        SortStrategy::Diagonal,
        SortStrategy::HeightAsc,
        SortStrategy::WidthAsc,
        SortStrategy::Pathological,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::None => "none",
            SortStrategy::Area => "area",
            SortStrategy::AreaAsc => "area_asc",
            SortStrategy::Height => "height",
            SortStrategy::HeightAsc => "height_asc",
            SortStrategy::Width => "width",
            SortStrategy::WidthAsc => "width_asc",
            SortStrategy::Perimeter => "perimeter",
            SortStrategy::MaxSide => "max_side",
            SortStrategy::MinSide => "min_side",
            SortStrategy::Ratio => "ratio",
            SortStrategy::RatioInv => "ratio_inv",
            SortStrategy::Diagonal => "diagonal",
            SortStrategy::Pathological => "pathological",
        }
    }
}

impl FromStr for SortStrategy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "area" => Ok(Self::Area),
            "area_asc" => Ok(Self::AreaAsc),
            "height" => Ok(Self::Height),
            "height_asc" => Ok(Self::HeightAsc),
            "width" => Ok(Self::Width),
            "width_asc" => Ok(Self::WidthAsc),
            "perimeter" => Ok(Self::Perimeter),
            "max_side" => Ok(Self::MaxSide),
            "min_side" => Ok(Self::MinSide),
            "ratio" => Ok(Self::Ratio),
            "ratio_inv" => Ok(Self::RatioInv),
            "diagonal" => Ok(Self::Diagonal),
            "pathological" => Ok(Self::Pathological),
            _ => Err(()),
        }
    }
}

/// Generation parameters.
///
/// `max_atlas_size` bounds the fallback path and is recorded in the manifest;
/// the single-atlas search always probes its fixed size ladder. `padding` is
/// the pixel margin reserved around every placed image. `max_image_size`
/// bounds source images before any packing (larger inputs are uniformly
/// resized down).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    pub max_atlas_size: u32,
    pub padding: u32,
    pub max_image_size: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_atlas_size: 2048,
            padding: 2,
            max_image_size: 2048,
        }
    }
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_atlas_size == 0 {
            return Err(AtlasError::InvalidConfig(
                "max_atlas_size must be greater than 0".into(),
            ));
        }
        if self.max_image_size == 0 {
            return Err(AtlasError::InvalidConfig(
                "max_image_size must be greater than 0".into(),
            ));
        }
        if self.padding.saturating_mul(2) >= self.max_atlas_size {
            return Err(AtlasError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no usable space in a {}px atlas",
                self.padding, self.max_atlas_size
            )));
        }
        Ok(())
    }
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
    max_image_size: Option<u32>,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
            max_image_size: None,
        }
    }
    pub fn max_atlas_size(mut self, v: u32) -> Self {
        self.cfg.max_atlas_size = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn max_image_size(mut self, v: u32) -> Self {
        self.max_image_size = Some(v);
        self
    }
    /// `max_image_size` defaults to `max_atlas_size` unless set explicitly.
    pub fn build(self) -> AtlasConfig {
        let mut cfg = self.cfg;
        cfg.max_image_size = self.max_image_size.unwrap_or(cfg.max_atlas_size);
        cfg
    }
}
