//! Catalog of the projections the viewer can draw.
//!
//! The catalog is a closed enumeration: each entry carries its constructor,
//! parameter fixups and scale family, so there is exactly one table to read
//! (and test) when asking how a projection is configured.

mod factory;

pub use factory::*;

use std::str::FromStr;

use foundation::math::{Clip, ConicConformal, ConicEqualArea, ConicEquidistant, RawProjection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionId {
    Orthographic,
    Stereographic,
    Gnomonic,
    AzimuthalEqualArea,
    AzimuthalEquidistant,
    ConicEqualArea,
    ConicConformal,
    ConicEquidistant,
    Mercator,
    TransverseMercator,
    Equirectangular,
    NaturalEarth1,
    EqualEarth,
    Mollweide,
    Sinusoidal,
}

impl ProjectionId {
    pub const ALL: [ProjectionId; 15] = [
        ProjectionId::Orthographic,
        ProjectionId::Stereographic,
        ProjectionId::Gnomonic,
        ProjectionId::AzimuthalEqualArea,
        ProjectionId::AzimuthalEquidistant,
        ProjectionId::ConicEqualArea,
        ProjectionId::ConicConformal,
        ProjectionId::ConicEquidistant,
        ProjectionId::Mercator,
        ProjectionId::TransverseMercator,
        ProjectionId::Equirectangular,
        ProjectionId::NaturalEarth1,
        ProjectionId::EqualEarth,
        ProjectionId::Mollweide,
        ProjectionId::Sinusoidal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionId::Orthographic => "orthographic",
            ProjectionId::Stereographic => "stereographic",
            ProjectionId::Gnomonic => "gnomonic",
            ProjectionId::AzimuthalEqualArea => "azimuthalEqualArea",
            ProjectionId::AzimuthalEquidistant => "azimuthalEquidistant",
            ProjectionId::ConicEqualArea => "conicEqualArea",
            ProjectionId::ConicConformal => "conicConformal",
            ProjectionId::ConicEquidistant => "conicEquidistant",
            ProjectionId::Mercator => "mercator",
            ProjectionId::TransverseMercator => "transverseMercator",
            ProjectionId::Equirectangular => "equirectangular",
            ProjectionId::NaturalEarth1 => "naturalEarth1",
            ProjectionId::EqualEarth => "equalEarth",
            ProjectionId::Mollweide => "mollweide",
            ProjectionId::Sinusoidal => "sinusoidal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectionId::Orthographic => "Orthographic",
            ProjectionId::Stereographic => "Stereographic",
            ProjectionId::Gnomonic => "Gnomonic",
            ProjectionId::AzimuthalEqualArea => "Lambert Azimuthal Equal-Area",
            ProjectionId::AzimuthalEquidistant => "Azimuthal Equidistant",
            ProjectionId::ConicEqualArea => "Albers Equal-Area Conic",
            ProjectionId::ConicConformal => "Lambert Conformal Conic",
            ProjectionId::ConicEquidistant => "Equidistant Conic",
            ProjectionId::Mercator => "Mercator",
            ProjectionId::TransverseMercator => "Transverse Mercator",
            ProjectionId::Equirectangular => "Equirectangular (Plate Carrée)",
            ProjectionId::NaturalEarth1 => "Natural Earth",
            ProjectionId::EqualEarth => "Equal Earth",
            ProjectionId::Mollweide => "Mollweide",
            ProjectionId::Sinusoidal => "Sinusoidal",
        }
    }

    /// Selector group shown to the user.
    pub fn group(self) -> &'static str {
        match self.family() {
            Family::Azimuthal => "Azimuthal",
            Family::Conic => "Conic",
            Family::Cylindrical => "Cylindrical",
            Family::Other => match self {
                ProjectionId::Equirectangular => "Cylindrical",
                ProjectionId::NaturalEarth1 => "Compromise",
                _ => "Pseudo-cylindrical",
            },
        }
    }

    pub fn family(self) -> Family {
        Family::of(self)
    }

    pub fn fixup(self) -> Fixup {
        match self {
            ProjectionId::ConicEqualArea
            | ProjectionId::ConicConformal
            | ProjectionId::ConicEquidistant => Fixup::StandardParallels {
                phi0_deg: STANDARD_PARALLELS_DEG.0,
                phi1_deg: STANDARD_PARALLELS_DEG.1,
            },
            ProjectionId::TransverseMercator => Fixup::ZeroBaseRotation,
            _ => Fixup::None,
        }
    }

    pub fn clip(self) -> Clip {
        match self {
            ProjectionId::Orthographic => Clip::circle_deg(90.0),
            ProjectionId::Stereographic => Clip::circle_deg(142.0),
            ProjectionId::Gnomonic => Clip::circle_deg(60.0),
            ProjectionId::AzimuthalEqualArea | ProjectionId::AzimuthalEquidistant => {
                Clip::circle_deg(180.0 - 1e-3)
            }
            _ => Clip::Antimeridian,
        }
    }

    /// The raw projection with this entry's parameter fixups applied.
    pub fn raw(self) -> RawProjection {
        let (phi0, phi1) = match self.fixup() {
            Fixup::StandardParallels { phi0_deg, phi1_deg } => {
                (phi0_deg.to_radians(), phi1_deg.to_radians())
            }
            _ => (0.0, 0.0),
        };
        match self {
            ProjectionId::Orthographic => RawProjection::Orthographic,
            ProjectionId::Stereographic => RawProjection::Stereographic,
            ProjectionId::Gnomonic => RawProjection::Gnomonic,
            ProjectionId::AzimuthalEqualArea => RawProjection::AzimuthalEqualArea,
            ProjectionId::AzimuthalEquidistant => RawProjection::AzimuthalEquidistant,
            ProjectionId::ConicEqualArea => {
                RawProjection::ConicEqualArea(ConicEqualArea::new(phi0, phi1))
            }
            ProjectionId::ConicConformal => {
                RawProjection::ConicConformal(ConicConformal::new(phi0, phi1))
            }
            ProjectionId::ConicEquidistant => {
                RawProjection::ConicEquidistant(ConicEquidistant::new(phi0, phi1))
            }
            ProjectionId::Mercator => RawProjection::Mercator,
            ProjectionId::TransverseMercator => RawProjection::TransverseMercator,
            ProjectionId::Equirectangular => RawProjection::Equirectangular,
            ProjectionId::NaturalEarth1 => RawProjection::NaturalEarth1,
            ProjectionId::EqualEarth => RawProjection::EqualEarth,
            ProjectionId::Mollweide => RawProjection::Mollweide,
            ProjectionId::Sinusoidal => RawProjection::Sinusoidal,
        }
    }
}

impl std::fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionId {
    type Err = UnknownProjection;

    /// Accepts `orthographic`, `Orthographic`, `geoOrthographic`,
    /// `azimuthal-equal-area` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_id(s);
        ProjectionId::ALL
            .into_iter()
            .find(|id| normalize_id(id.as_str()) == wanted)
            .ok_or_else(|| UnknownProjection { id: s.to_string() })
    }
}

fn normalize_id(s: &str) -> String {
    let lowered: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match lowered.strip_prefix("geo") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => lowered,
    }
}

/// Standard parallels bound to every conic projection.
pub const STANDARD_PARALLELS_DEG: (f64, f64) = (20.0, 50.0);

/// Roll the transverse Mercator needs to turn its cylinder sideways.
pub const TRANSVERSE_ROLL_DEG: f64 = 90.0;

/// Geometric family, which decides the world-view scale divisor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Azimuthal,
    Conic,
    Cylindrical,
    Other,
}

impl Family {
    /// Classification order; the first family listing an id wins.
    pub const PRECEDENCE: [Family; 4] = [
        Family::Azimuthal,
        Family::Conic,
        Family::Cylindrical,
        Family::Other,
    ];

    pub fn members(self) -> &'static [ProjectionId] {
        match self {
            Family::Azimuthal => &[
                ProjectionId::Orthographic,
                ProjectionId::Stereographic,
                ProjectionId::Gnomonic,
                ProjectionId::AzimuthalEqualArea,
                ProjectionId::AzimuthalEquidistant,
            ],
            Family::Conic => &[
                ProjectionId::ConicEqualArea,
                ProjectionId::ConicConformal,
                ProjectionId::ConicEquidistant,
            ],
            Family::Cylindrical => &[ProjectionId::Mercator, ProjectionId::TransverseMercator],
            Family::Other => &[],
        }
    }

    pub fn of(id: ProjectionId) -> Family {
        Family::PRECEDENCE
            .into_iter()
            .find(|family| family.members().contains(&id))
            .unwrap_or(Family::Other)
    }

    pub fn scale_divisor(self) -> f64 {
        match self {
            Family::Azimuthal => 2.2,
            Family::Conic => 4.5,
            Family::Cylindrical => 6.5,
            Family::Other => 5.5,
        }
    }
}

/// Per-projection parameter adjustments applied before use.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Fixup {
    None,
    StandardParallels { phi0_deg: f64, phi1_deg: f64 },
    /// Compose the caller's rotation onto an explicit zero base instead of the
    /// family default, then add the family's internal roll.
    ZeroBaseRotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProjection {
    pub id: String,
}

impl std::fmt::Display for UnknownProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown projection: {:?}", self.id)
    }
}

impl std::error::Error for UnknownProjection {}

/// One row of the projection selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ProjectionId,
    pub label: String,
    pub group: String,
    pub family: Family,
}

pub fn catalog_entries() -> Vec<CatalogEntry> {
    ProjectionId::ALL
        .into_iter()
        .map(|id| CatalogEntry {
            id,
            label: id.label().to_string(),
            group: id.group().to_string(),
            family: id.family(),
        })
        .collect()
}
