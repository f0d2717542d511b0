//! Per-company movement polarity.
//!
//! Under `OB` a headcount increase means people arrived and are waiting to be
//! flown out, so the increase is booked as outbound. `IB` inverts that for
//! companies whose increases are the inbound flight itself.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which list a movement token lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DirectionMode {
    #[default]
    #[serde(rename = "OB")]
    Outbound,
    #[serde(rename = "IB")]
    Inbound,
}

impl DirectionMode {
    /// Default-mode normalization: only the literal `IB` selects inbound.
    pub fn normalize(raw: &str) -> Self {
        if raw == "IB" {
            Self::Inbound
        } else {
            Self::Outbound
        }
    }

    /// Stored per-company value. Anything but `OB`/`IB` counts as absent.
    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "OB" => Some(Self::Outbound),
            "IB" => Some(Self::Inbound),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outbound => "OB",
            Self::Inbound => "IB",
        }
    }

    /// Bucket for a headcount change under this mode.
    pub fn bucket(self, increased: bool) -> Direction {
        match (self, increased) {
            (Self::Outbound, true) | (Self::Inbound, false) => Direction::Outbound,
            (Self::Outbound, false) | (Self::Inbound, true) => Direction::Inbound,
        }
    }
}

impl fmt::Display for DirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed, lower-cased company name → explicit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionMap {
    modes: HashMap<String, DirectionMode>,
}

impl DirectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored `company → "OB" | "IB"` pairs, dropping invalid values.
    pub fn from_raw<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (company, raw) in entries {
            match DirectionMode::from_stored(raw.as_ref()) {
                Some(mode) => map.insert(company.as_ref(), mode),
                None => log::debug!(
                    "ignoring direction '{}' for company '{}'",
                    raw.as_ref(),
                    company.as_ref()
                ),
            }
        }
        map
    }

    pub fn insert(&mut self, company: &str, mode: DirectionMode) {
        self.modes.insert(company_key(company), mode);
    }

    pub fn get(&self, company: &str) -> Option<DirectionMode> {
        self.modes.get(&company_key(company)).copied()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

fn company_key(company: &str) -> String {
    company.trim().to_lowercase()
}

/// Mode for `company`: its explicit entry if any, else `default_mode`.
pub fn resolve(company: &str, map: &DirectionMap, default_mode: DirectionMode) -> DirectionMode {
    map.get(company).unwrap_or(default_mode)
}
