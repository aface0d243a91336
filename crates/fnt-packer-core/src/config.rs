use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
    ContactPoint,
}

impl MaxRectsHeuristic {
    /// All heuristics, in the order auto-selection evaluates them.
    pub const ALL: [MaxRectsHeuristic; 5] = [
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BestLongSideFit,
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BottomLeft,
        MaxRectsHeuristic::ContactPoint,
    ];

    /// Short CLI name (`bssf`, `blsf`, `baf`, `bl`, `cp`).
    pub fn short_name(self) -> &'static str {
        match self {
            Self::BestShortSideFit => "bssf",
            Self::BestLongSideFit => "blsf",
            Self::BestAreaFit => "baf",
            Self::BottomLeft => "bl",
            Self::ContactPoint => "cp",
        }
    }
}

impl fmt::Display for MaxRectsHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// How each page picks its heuristic.
///
/// `Auto` packs the pending glyphs once per heuristic and keeps the run with
/// the highest occupancy; `Fixed` always uses the given heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum HeuristicSelection {
    Auto,
    Fixed(MaxRectsHeuristic),
}

impl HeuristicSelection {
    /// Heuristics tried for one page, in evaluation order.
    pub fn candidates(&self) -> Vec<MaxRectsHeuristic> {
        match self {
            Self::Auto => MaxRectsHeuristic::ALL.to_vec(),
            Self::Fixed(h) => vec![*h],
        }
    }
}

impl fmt::Display for HeuristicSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(h) => write!(f, "{h}"),
        }
    }
}

impl FromStr for HeuristicSelection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<MaxRectsHeuristic>()
            .map(Self::Fixed)
            .map_err(|_| format!("unknown heuristic: {s} (expected auto|bssf|blsf|baf|bl|cp)"))
    }
}

impl TryFrom<String> for HeuristicSelection {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HeuristicSelection> for String {
    fn from(v: HeuristicSelection) -> Self {
        v.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Page width in pixels. Every emitted page has exactly this width.
    pub page_width: u32,
    /// Page height in pixels.
    pub page_height: u32,
    #[serde(default = "default_heuristic")]
    pub heuristic: HeuristicSelection,
    /// Evaluate heuristic trials in parallel when feature "parallel" is on.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            page_width: 1024,
            page_height: 1024,
            heuristic: default_heuristic(),
            parallel: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Zero-sized pages are rejected; anything else is packable in principle.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::FontPackerError;

        if self.page_width == 0 || self.page_height == 0 {
            return Err(FontPackerError::InvalidDimensions {
                width: self.page_width,
                height: self.page_height,
            });
        }
        if (self.page_width as u64) * (self.page_height as u64) * 4 > isize::MAX as u64 {
            return Err(FontPackerError::InvalidConfig(format!(
                "page {}x{} is too large to allocate",
                self.page_width, self.page_height
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

fn default_heuristic() -> HeuristicSelection {
    HeuristicSelection::Auto
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn with_page_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.page_width = w;
        self.cfg.page_height = h;
        self
    }
    pub fn heuristic(mut self, v: HeuristicSelection) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn fixed_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.heuristic = HeuristicSelection::Fixed(v);
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}
