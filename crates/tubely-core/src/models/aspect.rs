use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Display geometry of an uploaded video, used to namespace its storage key.
///
/// Classification is an exact match on the probed `display_aspect_ratio` string;
/// `1.78:1` or `1920:1080` are `Other` even though they are numerically 16:9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    pub fn from_display_aspect_ratio(ratio: &str) -> Self {
        match ratio {
            "16:9" => AspectClass::Landscape,
            "9:16" => AspectClass::Portrait,
            _ => AspectClass::Other,
        }
    }

    /// Key prefix for objects of this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl Display for AspectClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
