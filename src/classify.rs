//! Coarse physical classification from cross-match metadata.

use serde::{Deserialize, Serialize};

/// Physical category of a star, as it appears in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Nature {
    MainSequence,
    WhiteDwarf,
    NeutronStar,
    BlackHole,
}

impl Nature {
    pub const ALL: [Nature; 4] = [
        Nature::MainSequence,
        Nature::WhiteDwarf,
        Nature::NeutronStar,
        Nature::BlackHole,
    ];

    /// The payload string for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Nature::MainSequence => "main-sequence",
            Nature::WhiteDwarf => "white-dwarf",
            Nature::NeutronStar => "neutron-star",
            Nature::BlackHole => "black-hole",
        }
    }

    /// Parses a payload string back to a category.
    pub fn from_payload_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == s)
    }
}

const WHITE_DWARF_MARKERS: &[&str] = &["WD"];
const NEUTRON_STAR_MARKERS: &[&str] = &["NS", "PSR"];
const BLACK_HOLE_MARKERS: &[&str] = &["BH", "XB"];

/// Maps object-type and spectral-type strings to a [`Nature`].
///
/// Precedence is white dwarf, then neutron star, then black hole; anything
/// unmatched (including absent metadata) is a main-sequence star. Matching is
/// case-insensitive substring search against fixed marker sets, except the
/// spectral-type checks which look at the leading characters only ("D" for
/// degenerate white dwarfs, "NS" for neutron stars).
pub fn classify(object_type: Option<&str>, spectral_type: Option<&str>) -> Nature {
    let otype = object_type.map(str::to_uppercase).unwrap_or_default();
    let stype = spectral_type
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default();

    if contains_any(&otype, WHITE_DWARF_MARKERS) || stype.starts_with('D') {
        return Nature::WhiteDwarf;
    }
    if contains_any(&otype, NEUTRON_STAR_MARKERS) || stype.starts_with("NS") {
        return Nature::NeutronStar;
    }
    if contains_any(&otype, BLACK_HOLE_MARKERS) {
        return Nature::BlackHole;
    }
    Nature::MainSequence
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}
