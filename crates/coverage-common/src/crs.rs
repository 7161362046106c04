//! Coordinate reference system types.
//!
//! A [`Crs`] is either a single component (a 2D horizontal system, a
//! vertical axis, or a temporal axis) or a compound of components whose
//! dimensions concatenate in order. Compound systems are what give grids
//! their extra depth/time dimensions on top of the horizontal plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::error::{CoverageError, CoverageResult};
use crate::unit::Unit;

/// Earth radius of the spherical web-mercator formulas, in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Well-known 2D horizontal systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// Albers Equal Area (CONUS)
    Epsg5070,
    /// Polar Stereographic North
    Epsg3413,
    /// Polar Stereographic South
    Epsg3031,
}

impl CrsCode {
    /// Parse an authority:code string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326)
    pub fn from_epsg_string(s: &str) -> CoverageResult<Self> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:4269" => Ok(CrsCode::Epsg4269),
            "EPSG:5070" => Ok(CrsCode::Epsg5070),
            "EPSG:3413" => Ok(CrsCode::Epsg3413),
            "EPSG:3031" => Ok(CrsCode::Epsg3031),
            _ => Err(CoverageError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lon/lat degrees) system.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Convert a coordinate in this system to geographic lon/lat degrees.
    ///
    /// Returns `None` for systems without a built-in conversion; callers
    /// treat those pairs as not reprojectable.
    pub fn to_geographic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => Some((x, y)),
            CrsCode::Epsg3857 => {
                let lon = (x / EARTH_RADIUS_M).to_degrees();
                let lat =
                    (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
                        .to_degrees();
                Some((lon, lat))
            }
            _ => None,
        }
    }

    /// Convert geographic lon/lat degrees to a coordinate in this system.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => Some((lon, lat)),
            CrsCode::Epsg3857 => {
                let x = lon.to_radians() * EARTH_RADIUS_M;
                let y = (lat.to_radians() / 2.0 + std::f64::consts::FRAC_PI_4)
                    .tan()
                    .ln()
                    * EARTH_RADIUS_M;
                Some((x, y))
            }
            _ => None,
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
            CrsCode::Epsg4269 => "EPSG:4269",
            CrsCode::Epsg5070 => "EPSG:5070",
            CrsCode::Epsg3413 => "EPSG:3413",
            CrsCode::Epsg3031 => "EPSG:3031",
        };
        write!(f, "{}", code)
    }
}

/// Direction a vertical axis grows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalDirection {
    /// Heights: larger coordinates are further from the ground.
    Up,
    /// Depths/pressure levels: larger coordinates are further down.
    Down,
}

/// A single vertical axis (height or depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalAxis {
    pub unit: Unit,
    pub direction: VerticalDirection,
}

impl VerticalAxis {
    pub fn new(unit: Unit, direction: VerticalDirection) -> Self {
        Self { unit, direction }
    }
}

/// A single temporal axis anchored at an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAxis {
    /// Instant corresponding to coordinate 0.
    pub epoch: DateTime<Utc>,
    /// Seconds per coordinate unit.
    pub unit_seconds: f64,
}

impl TemporalAxis {
    pub fn new(epoch: DateTime<Utc>, unit_seconds: f64) -> Self {
        Self {
            epoch,
            unit_seconds,
        }
    }

    /// Hourly axis anchored at the given epoch.
    pub fn hours_since(epoch: DateTime<Utc>) -> Self {
        Self::new(epoch, 3600.0)
    }
}

/// One component of a [`Crs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrsKind {
    /// 2D horizontal system.
    Horizontal(CrsCode),
    /// 1D vertical axis.
    Vertical(VerticalAxis),
    /// 1D temporal axis.
    Temporal(TemporalAxis),
    /// Ordered concatenation of component systems.
    Compound(Vec<Crs>),
}

/// A coordinate reference system: a display name plus one or more
/// components whose dimensions concatenate in order.
///
/// Display names are metadata only; [`Crs::equivalent_to`] ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    name: String,
    kind: CrsKind,
}

impl Crs {
    /// A 2D horizontal system, named after its code.
    pub fn horizontal(code: CrsCode) -> Self {
        Self {
            name: code.to_string(),
            kind: CrsKind::Horizontal(code),
        }
    }

    /// A 1D vertical system.
    pub fn vertical(name: impl Into<String>, axis: VerticalAxis) -> Self {
        Self {
            name: name.into(),
            kind: CrsKind::Vertical(axis),
        }
    }

    /// A 1D temporal system.
    pub fn temporal(name: impl Into<String>, axis: TemporalAxis) -> Self {
        Self {
            name: name.into(),
            kind: CrsKind::Temporal(axis),
        }
    }

    /// A compound system from components, flattening nested compounds one
    /// level and collapsing a single component to itself. The name is
    /// derived by joining the component names.
    pub fn compound(components: Vec<Crs>) -> Self {
        let mut flat: Vec<Crs> = Vec::with_capacity(components.len());
        for component in components {
            match component.kind {
                CrsKind::Compound(inner) => flat.extend(inner),
                _ => flat.push(component),
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        let name = flat
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        Self {
            name,
            kind: CrsKind::Compound(flat),
        }
    }

    /// Replace the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CrsKind {
        &self.kind
    }

    /// Total coordinate dimension count.
    pub fn dimension(&self) -> usize {
        match &self.kind {
            CrsKind::Horizontal(_) => 2,
            CrsKind::Vertical(_) | CrsKind::Temporal(_) => 1,
            CrsKind::Compound(parts) => parts.iter().map(Crs::dimension).sum(),
        }
    }

    /// Components in order. A single-component system yields itself.
    pub fn components(&self) -> Vec<&Crs> {
        match &self.kind {
            CrsKind::Compound(parts) => parts.iter().collect(),
            _ => vec![self],
        }
    }

    /// Semantic equality, ignoring display names.
    pub fn equivalent_to(&self, other: &Crs) -> bool {
        match (&self.kind, &other.kind) {
            (CrsKind::Horizontal(a), CrsKind::Horizontal(b)) => a == b,
            (CrsKind::Vertical(a), CrsKind::Vertical(b)) => a == b,
            (CrsKind::Temporal(a), CrsKind::Temporal(b)) => a == b,
            (CrsKind::Compound(a), CrsKind::Compound(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent_to(y))
            }
            _ => false,
        }
    }

    /// The component system spanning exactly the dimensions in `range`,
    /// or `None` when the range does not cover a whole run of components.
    pub fn sub_crs(&self, range: Range<usize>) -> Option<Crs> {
        if range.start == 0 && range.end == self.dimension() && !range.is_empty() {
            return Some(self.clone());
        }
        let parts = match &self.kind {
            CrsKind::Compound(parts) => parts,
            _ => return None,
        };

        let mut offset = 0;
        let mut picked: Vec<Crs> = Vec::new();
        for part in parts {
            let dim = part.dimension();
            let covered = offset >= range.start && offset + dim <= range.end;
            let overlaps = offset < range.end && offset + dim > range.start;
            if covered {
                picked.push(part.clone());
            } else if overlaps {
                // The range would split this component.
                return None;
            }
            offset += dim;
        }

        let total: usize = picked.iter().map(Crs::dimension).sum();
        if picked.is_empty() || total != range.len() {
            return None;
        }
        Some(Crs::compound(picked))
    }

    /// First horizontal component and the dimension offset where it
    /// starts.
    pub fn horizontal_component(&self) -> Option<(CrsCode, usize)> {
        match &self.kind {
            CrsKind::Horizontal(code) => Some((*code, 0)),
            CrsKind::Compound(parts) => {
                let mut offset = 0;
                for part in parts {
                    if let CrsKind::Horizontal(code) = &part.kind {
                        return Some((*code, offset));
                    }
                    offset += part.dimension();
                }
                None
            }
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
