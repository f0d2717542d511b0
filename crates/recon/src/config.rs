use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::cargo_filter::CargoFilter;
use crate::direction::{DirectionMap, DirectionMode};
use crate::error::ReconError;
use crate::model::{AircraftTypeLimits, LocationCapacity};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Location the ledger describes; selects the capacity entry.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub direction: DirectionConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub aircraft: Vec<AircraftTypeLimits>,
    #[serde(default)]
    pub locations: BTreeMap<String, LocationCapacity>,
    #[serde(default)]
    pub range: Option<RangeConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input files, resolved relative to the config file by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    /// `.csv` or `.json` ledger.
    #[serde(default)]
    pub ledger: Option<String>,
    /// JSON manifest catalog.
    #[serde(default)]
    pub manifests: Option<String>,
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Stored direction settings. Values are kept raw and normalized on use, so an
/// unknown string falls back instead of failing the whole config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionConfig {
    #[serde(default)]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub companies: BTreeMap<String, String>,
}

impl DirectionConfig {
    pub fn default_mode(&self) -> DirectionMode {
        self.default_mode
            .as_deref()
            .map(DirectionMode::normalize)
            .unwrap_or_default()
    }

    pub fn direction_map(&self) -> DirectionMap {
        DirectionMap::from_raw(&self.companies)
    }

    /// Fill gaps from user-level defaults. Entries already set here win.
    pub fn fill_from<'a, I>(&mut self, default_mode: &str, companies: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        if self.default_mode.is_none() {
            self.default_mode = Some(default_mode.to_string());
        }
        for (company, mode) in companies {
            let exists = self
                .companies
                .keys()
                .any(|k| k.trim().to_lowercase() == company.trim().to_lowercase());
            if !exists {
                self.companies.insert(company.clone(), mode.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest screening
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestConfig {
    /// Replaces the built-in non-personnel keyword list when set.
    #[serde(default)]
    pub cargo_keywords: Option<Vec<String>>,
}

impl ManifestConfig {
    pub fn cargo_filter(&self) -> CargoFilter {
        match &self.cargo_keywords {
            Some(keywords) => CargoFilter::new(keywords),
            None => CargoFilter::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Range + Output
// ---------------------------------------------------------------------------

/// Calendar range the caller expands into the date sequence.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RangeConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        // Aircraft types are looked up case-insensitively, so they must be unique that way
        let mut seen = HashSet::new();
        for limits in &self.aircraft {
            let key = limits.aircraft_type.trim().to_lowercase();
            if key.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "aircraft entry with empty type".into(),
                ));
            }
            if !seen.insert(key) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate aircraft type '{}'",
                    limits.aircraft_type
                )));
            }
        }

        for (name, capacity) in &self.locations {
            let negative = capacity.max < 0
                || capacity.flotel.is_some_and(|v| v < 0)
                || capacity.field_boat.is_some_and(|v| v < 0);
            if negative {
                return Err(ReconError::ConfigValidation(format!(
                    "location '{name}': capacities must not be negative"
                )));
            }
        }

        if let Some(ref location) = self.location {
            if !self.locations.contains_key(location) {
                return Err(ReconError::ConfigValidation(format!(
                    "location '{location}' has no [locations] entry"
                )));
            }
        }

        // An empty keyword would match every passenger
        if let Some(ref keywords) = self.manifest.cargo_keywords {
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(
                    "cargo_keywords must not contain empty entries".into(),
                ));
            }
        }

        if let Some(range) = self.range {
            if range.start > range.end {
                return Err(ReconError::ConfigValidation(format!(
                    "range start {} is after end {}",
                    range.start, range.end
                )));
            }
        }

        Ok(())
    }

    /// Capacity entry for the configured location, if any.
    pub fn location_capacity(&self) -> Option<&LocationCapacity> {
        self.location.as_ref().and_then(|l| self.locations.get(l))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
