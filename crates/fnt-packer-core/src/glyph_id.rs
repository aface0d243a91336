use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Maps a source image path to the glyph id written into the descriptor.
///
/// Returning `None` means no id can be derived; loading that file fails.
pub trait GlyphIdResolver {
    fn glyph_id(&self, path: &Path) -> Option<String>;
}

impl<F> GlyphIdResolver for F
where
    F: Fn(&Path) -> Option<String>,
{
    fn glyph_id(&self, path: &Path) -> Option<String> {
        self(path)
    }
}

/// Built-in id rules.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GlyphIdStrategy {
    /// Stems longer than one character lose their first character
    /// (`u0041.png` -> `0041`, `_A.png` -> `A`); a one-character stem is used as is.
    #[default]
    StripPrefix,
    /// The file stem, unchanged.
    Stem,
}

impl GlyphIdResolver for GlyphIdStrategy {
    fn glyph_id(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_string_lossy();
        if stem.is_empty() {
            return None;
        }
        match self {
            Self::StripPrefix => {
                let mut chars = stem.chars();
                if stem.chars().count() > 1 {
                    chars.next();
                }
                Some(chars.as_str().to_string())
            }
            Self::Stem => Some(stem.into_owned()),
        }
    }
}

impl fmt::Display for GlyphIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StripPrefix => f.write_str("strip-prefix"),
            Self::Stem => f.write_str("stem"),
        }
    }
}

impl FromStr for GlyphIdStrategy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strip-prefix" | "strip_prefix" | "prefix" => Ok(Self::StripPrefix),
            "stem" => Ok(Self::Stem),
            _ => Err(()),
        }
    }
}
