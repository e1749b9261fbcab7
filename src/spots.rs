//! Spot registry for the surf report service.
//!
//! Defines the canonical list of surf spots, their physical attributes and
//! the upstream station identifiers used to fetch their data. The built-in
//! registry is `spots.toml`; a replacement file can be supplied through
//! `SURF_SPOTS_FILE`. All other modules should take spots from here rather
//! than hardcoding station identifiers.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::regime::Regime;
use crate::model::{BreakType, BuoyKind, SpotType, SurfError};
use crate::units;

/// Sentinel name that selects every registered spot.
pub const ALL_SPOTS: &str = "all";

const BUILTIN_REGISTRY: &str = include_str!("../spots.toml");

// ---------------------------------------------------------------------------
// Spot metadata
// ---------------------------------------------------------------------------

/// NDBC station nearest to the spot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuoyStation {
    pub id: String,
    pub kind: BuoyKind,
}

/// Tide heights (feet, MLLW) the spot works best within. Either bound may
/// be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TidalPreference {
    pub min_ft: Option<f64>,
    pub max_ft: Option<f64>,
}

impl TidalPreference {
    /// Parses `>2ft`, `<5ft`, `2ft-4ft` (either order), `N/A` or empty.
    pub fn parse(raw: &str) -> Result<TidalPreference, SurfError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
            return Ok(TidalPreference::default());
        }

        let invalid = || SurfError::Invalid(format!("unparseable tidal_range '{}'", trimmed));
        let feet = |s: &str| -> Result<f64, SurfError> {
            s.trim()
                .trim_end_matches("ft")
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid())
        };

        if let Some(rest) = trimmed.strip_prefix('>') {
            return Ok(TidalPreference {
                min_ft: Some(feet(rest.trim_start_matches('='))?),
                max_ft: None,
            });
        }
        if let Some(rest) = trimmed.strip_prefix('<') {
            return Ok(TidalPreference {
                min_ft: None,
                max_ft: Some(feet(rest.trim_start_matches('='))?),
            });
        }

        // Range; a leading minus belongs to the first bound.
        let split_at = trimmed
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '-')
            .map(|(idx, _)| idx)
            .ok_or_else(invalid)?;
        let a = feet(&trimmed[..split_at])?;
        let b = feet(&trimmed[split_at + 1..])?;
        Ok(TidalPreference {
            min_ft: Some(a.min(b)),
            max_ft: Some(a.max(b)),
        })
    }

    pub fn is_unconstrained(&self) -> bool {
        self.min_ft.is_none() && self.max_ft.is_none()
    }

    pub fn contains(&self, height_ft: f64) -> bool {
        self.min_ft.is_none_or(|min| height_ft >= min)
            && self.max_ft.is_none_or(|max| height_ft <= max)
    }
}

/// A validated, immutable surf spot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spot {
    pub name: String,
    pub city: String,
    pub state: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    pub spot_type: SpotType,
    pub break_type: BreakType,
    /// Bearing the beach faces, toward open water.
    pub facing_deg: f64,
    pub buoy: Option<BuoyStation>,
    /// NOAA CO-OPS station id. Always `None` for lake spots.
    pub tide_station: Option<String>,
    pub tidal_preference: TidalPreference,
    pub notes: String,
}

/// Raw TOML shape of one `[[spot]]` table.
#[derive(Debug, Deserialize)]
struct SpotConfig {
    name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    latitude: f64,
    longitude: f64,
    spot_type: String,
    break_type: String,
    facing: toml::Value,
    buoy_station: Option<String>,
    buoy_kind: Option<String>,
    tide_station: Option<String>,
    #[serde(default)]
    tidal_range: String,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    spot: Vec<SpotConfig>,
}

/// Treats `""` and `"N/A"` as "not configured".
fn configured_id(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("n/a"))
}

impl SpotConfig {
    fn validate(self) -> Result<Spot, SurfError> {
        let regime = Regime::select(&self.spot_type)?;
        let spot_type = match regime {
            Regime::Ocean => SpotType::Ocean,
            Regime::Lake => SpotType::Lake,
        };
        let break_type: BreakType = self.break_type.parse()?;

        let facing_deg = match &self.facing {
            toml::Value::String(s) => units::parse_bearing(s),
            toml::Value::Integer(i) => Some(units::normalize_degrees(*i as f64)),
            toml::Value::Float(f) if f.is_finite() => Some(units::normalize_degrees(*f)),
            _ => None,
        }
        .ok_or_else(|| {
            SurfError::Invalid(format!("spot '{}' has unparseable facing {}", self.name, self.facing))
        })?;

        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SurfError::Invalid(format!(
                "spot '{}' has out-of-range coordinates",
                self.name
            )));
        }

        let buoy = match configured_id(self.buoy_station) {
            Some(id) => {
                let kind = match self.buoy_kind.as_deref() {
                    Some(raw) => raw.parse()?,
                    None if regime == Regime::Lake => BuoyKind::Shore,
                    None => BuoyKind::Offshore,
                };
                Some(BuoyStation { id, kind })
            }
            None => None,
        };

        // Tidal range on lakes is negligible; never fetch predictions there.
        let tide_station = if regime.rates_tide() {
            configured_id(self.tide_station)
        } else {
            None
        };

        Ok(Spot {
            tidal_preference: TidalPreference::parse(&self.tidal_range)?,
            name: self.name.trim().to_string(),
            city: self.city,
            state: self.state,
            latitude: self.latitude,
            longitude: self.longitude,
            spot_type,
            break_type,
            facing_deg,
            buoy,
            tide_station,
            notes: self.notes,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SpotRegistry {
    spots: Vec<Spot>,
}

impl SpotRegistry {
    /// Parses and validates a TOML registry document.
    pub fn from_toml(document: &str) -> Result<SpotRegistry, SurfError> {
        let file: RegistryFile = toml::from_str(document)
            .map_err(|e| SurfError::Invalid(format!("spot registry parse error: {}", e)))?;

        let spots = file
            .spot
            .into_iter()
            .map(SpotConfig::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        for spot in &spots {
            if !seen.insert(spot.name.to_ascii_lowercase()) {
                return Err(SurfError::Invalid(format!("duplicate spot name '{}'", spot.name)));
            }
        }
        if spots.is_empty() {
            return Err(SurfError::Invalid("spot registry contains no spots".to_string()));
        }

        Ok(SpotRegistry { spots })
    }

    pub fn builtin() -> Result<SpotRegistry, SurfError> {
        SpotRegistry::from_toml(BUILTIN_REGISTRY)
    }

    pub fn load(path: &Path) -> Result<SpotRegistry, SurfError> {
        let document = std::fs::read_to_string(path).map_err(|e| {
            SurfError::Invalid(format!("cannot read spot registry {}: {}", path.display(), e))
        })?;
        SpotRegistry::from_toml(&document)
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Case-insensitive exact match. Returns `None` if not found.
    pub fn find(&self, name: &str) -> Option<&Spot> {
        let wanted = name.trim();
        self.spots.iter().find(|s| s.name.eq_ignore_ascii_case(wanted))
    }

    /// Resolves a request: a spot name, or `all` for every spot.
    pub fn lookup(&self, name: &str) -> Result<Vec<&Spot>, SurfError> {
        if name.trim().eq_ignore_ascii_case(ALL_SPOTS) {
            return Ok(self.spots.iter().collect());
        }
        self.find(name)
            .map(|spot| vec![spot])
            .ok_or_else(|| SurfError::NotFound(name.trim().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
