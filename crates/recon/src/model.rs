use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::direction::{Direction, DirectionMode};
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// A ledger column date, written `M/D/YYYY` without zero padding.
///
/// Ordering is calendar order: `10/1/2025` sorts after `9/30/2025` even
/// though it sorts before it as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse `M/D/YYYY`. Zero-padded month/day are accepted too.
    pub fn parse(input: &str) -> Result<Self, ReconError> {
        let err = || ReconError::DateParse {
            value: input.to_string(),
            expected: "M/D/YYYY",
        };

        let mut parts = input.trim().split('/');
        let (Some(m), Some(d), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };

        let month: u32 = m.parse().map_err(|_| err())?;
        let day: u32 = d.parse().map_err(|_| err())?;
        let year: i32 = y.parse().map_err(|_| err())?;
        NaiveDate::from_ymd_opt(year, month, day).map(Self).ok_or_else(err)
    }

    /// Parse a manifest-style `YYYY-MM-DD` date.
    pub fn from_iso(input: &str) -> Result<Self, ReconError> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ReconError::DateParse {
                value: input.to_string(),
                expected: "YYYY-MM-DD",
            })
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// ISO form used as the manifest catalog key.
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn next_day(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.0.month(), self.0.day(), self.0.year())
    }
}

impl FromStr for DateKey {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One company's headcount series. Dates without an entry read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRow {
    pub company: String,
    pub counts: BTreeMap<DateKey, i64>,
}

impl LedgerRow {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn with(mut self, date: DateKey, count: i64) -> Self {
        self.counts.insert(date, count);
        self
    }

    pub fn set(&mut self, date: DateKey, count: i64) {
        self.counts.insert(date, count);
    }

    pub fn headcount(&self, date: &DateKey) -> i64 {
        self.counts.get(date).copied().unwrap_or(0)
    }
}

/// Coerce a hand-entered ledger cell to a headcount.
///
/// Empty and unparseable cells read as 0; decimals truncate toward zero.
pub fn coerce_headcount(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => n.trunc() as i64,
        _ => {
            log::debug!("ledger cell '{trimmed}' is not numeric, reading as 0");
            0
        }
    }
}

/// A ledger snapshot: rows in their display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    /// Every date that appears in any row, in calendar order.
    pub fn date_keys(&self) -> Vec<DateKey> {
        let dates: BTreeSet<DateKey> = self
            .rows
            .iter()
            .flat_map(|row| row.counts.keys().copied())
            .collect();
        dates.into_iter().collect()
    }

    /// Total persons on board across all companies for a date.
    pub fn pob_total(&self, date: &DateKey) -> i64 {
        self.rows
            .iter()
            .filter(|row| !row.company.trim().is_empty())
            .map(|row| row.headcount(date))
            .fold(0i64, i64::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Movements
// ---------------------------------------------------------------------------

/// An inferred movement, written `"{magnitude}-{company}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovementToken {
    pub magnitude: u64,
    pub company: String,
}

impl MovementToken {
    pub fn new(magnitude: u64, company: impl Into<String>) -> Self {
        Self {
            magnitude,
            company: company.into(),
        }
    }

    /// Split at the first `-`; the company part may contain more dashes.
    pub fn parse(input: &str) -> Result<Self, ReconError> {
        let (magnitude, company) = input
            .split_once('-')
            .ok_or_else(|| ReconError::InvalidInput(format!("movement token '{input}' has no '-'")))?;
        let magnitude: u64 = magnitude.parse().map_err(|_| {
            ReconError::InvalidInput(format!("movement token '{input}' has no numeric magnitude"))
        })?;
        if magnitude == 0 {
            return Err(ReconError::InvalidInput(format!(
                "movement token '{input}' has zero magnitude"
            )));
        }
        Ok(Self::new(magnitude, company))
    }
}

impl fmt::Display for MovementToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.magnitude, self.company)
    }
}

impl Serialize for MovementToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MovementToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Per-date outbound and inbound token lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMovements {
    pub outbound: BTreeMap<DateKey, Vec<MovementToken>>,
    pub inbound: BTreeMap<DateKey, Vec<MovementToken>>,
}

impl DailyMovements {
    pub fn tokens(&self, direction: Direction, date: &DateKey) -> &[MovementToken] {
        let map = match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        };
        map.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, direction: Direction, date: DateKey, token: MovementToken) {
        let map = match direction {
            Direction::Outbound => &mut self.outbound,
            Direction::Inbound => &mut self.inbound,
        };
        map.entry(date).or_default().push(token);
    }

    /// Every date with an entry in either map.
    pub fn dates(&self) -> Vec<DateKey> {
        let dates: BTreeSet<DateKey> = self
            .outbound
            .keys()
            .chain(self.inbound.keys())
            .copied()
            .collect();
        dates.into_iter().collect()
    }
}

/// Magnitude totals for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub outbound: u64,
    pub inbound: u64,
}

impl DayTotals {
    pub fn total(&self) -> u64 {
        self.outbound.saturating_add(self.inbound)
    }
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub body_weight: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bag_weight: f64,
}

impl Passenger {
    pub fn new(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            body_weight: 0.0,
            bag_weight: 0.0,
        }
    }

    pub fn weighing(mut self, body_weight: f64, bag_weight: f64) -> Self {
        self.body_weight = body_weight;
        self.bag_weight = bag_weight;
        self
    }

    pub fn total_weight(&self) -> f64 {
        self.body_weight + self.bag_weight
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMeta {
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub aircraft_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub flight_number: String,
}

/// One authored flight manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default)]
    pub meta: ManifestMeta,
    #[serde(default)]
    pub outbound: Vec<Passenger>,
    #[serde(default)]
    pub inbound: Vec<Passenger>,
}

/// Per aircraft type limits. `None` (or a non-positive value) is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftTypeLimits {
    #[serde(rename = "type")]
    pub aircraft_type: String,
    #[serde(default, alias = "max_pax", deserialize_with = "lenient_limit")]
    pub max_pax: Option<f64>,
    #[serde(default, alias = "max_outbound_weight", deserialize_with = "lenient_limit")]
    pub max_outbound_weight: Option<f64>,
    #[serde(default, alias = "max_inbound_weight", deserialize_with = "lenient_limit")]
    pub max_inbound_weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Declared limits for one location. `max = 0` means unconfigured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCapacity {
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub flotel: Option<i64>,
    #[serde(default, alias = "field_boat")]
    pub field_boat: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityStatus {
    pub over_max: bool,
    pub over_effective: bool,
    pub effective: i64,
}

/// Dashboard row for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOverview {
    pub date: DateKey,
    pub pob_total: i64,
    pub movement_count: usize,
    pub totals: DayTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityStatus>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconClass {
    MissingManifest,
    Reconciled,
    Mismatch,
}

impl fmt::Display for ReconClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingManifest => write!(f, "missing_manifest"),
            Self::Reconciled => write!(f, "reconciled"),
            Self::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Raw and keyword-filtered passenger counts from a day's manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestCounts {
    pub manifest_id: String,
    pub aircraft_type: String,
    pub flight_number: String,
    pub outbound_raw: usize,
    pub outbound_filtered: usize,
    pub inbound_raw: usize,
    pub inbound_filtered: usize,
    pub outbound_weight: f64,
    pub inbound_weight: f64,
}

impl ManifestCounts {
    pub fn raw_total(&self) -> usize {
        self.outbound_raw + self.inbound_raw
    }

    pub fn filtered_total(&self) -> usize {
        self.outbound_filtered + self.inbound_filtered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub date: DateKey,
    pub class: ReconClass,
    pub planner_count: u64,
    pub manifest_count: u64,
    pub planner: DayTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestCounts>,
    pub capacity_error: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

// ---------------------------------------------------------------------------
// Run input / output
// ---------------------------------------------------------------------------

/// Pre-loaded snapshot handed to [`crate::engine::run`].
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub ledger: Ledger,
    pub dates: Vec<DateKey>,
    pub manifests: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub total_days: usize,
    pub days_with_activity: usize,
    pub missing_manifest: usize,
    pub reconciled: usize,
    pub mismatch: usize,
    pub capacity_violations: usize,
    pub days_over_max: usize,
    pub days_over_effective: usize,
    pub class_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub default_mode: DirectionMode,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub movements: DailyMovements,
    pub days: BTreeMap<DateKey, DayOverview>,
    pub results: BTreeMap<DateKey, ReconciliationResult>,
}

// ---------------------------------------------------------------------------
// Lenient numeric fields
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numbers or numeric strings; anything else reads as 0.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() => n,
        Some(NumberOrText::Text(s)) => parse_finite(&s).unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Numbers or numeric strings; empty or unparseable means "no limit".
fn lenient_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrText::Text(s)) => parse_finite(&s),
        _ => None,
    })
}

/// Identifiers that may arrive as JSON numbers.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => n.to_string(),
        Some(NumberOrText::Text(s)) => s,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[test]
    fn date_key_orders_by_calendar_not_text() {
        assert!(d("9/30/2025") < d("10/1/2025"));
        assert!(d("12/31/2024") < d("1/1/2025"));
        assert!("10/1/2025" < "9/30/2025", "lexical order disagrees");
    }

    #[test]
    fn date_key_display_is_unpadded() {
        assert_eq!(d("01/02/2025").to_string(), "1/2/2025");
        assert_eq!(d("1/2/2025").to_iso(), "2025-01-02");
        assert_eq!(DateKey::from_iso("2025-01-02").unwrap(), d("1/2/2025"));
    }

    #[test]
    fn date_key_rejects_garbage() {
        assert!(DateKey::parse("2025-01-02").is_err());
        assert!(DateKey::parse("2/30/2025").is_err());
        assert!(DateKey::parse("1/2/2025/4").is_err());
        assert!(DateKey::parse("company").is_err());
    }

    #[test]
    fn absent_headcount_reads_zero() {
        let row = LedgerRow::new("Ops").with(d("1/1/2025"), 10);
        assert_eq!(row.headcount(&d("1/1/2025")), 10);
        assert_eq!(row.headcount(&d("1/2/2025")), 0);
    }

    #[test]
    fn coerce_handles_messy_cells() {
        assert_eq!(coerce_headcount(""), 0);
        assert_eq!(coerce_headcount("  12 "), 12);
        assert_eq!(coerce_headcount("7.9"), 7);
        assert_eq!(coerce_headcount("n/a"), 0);
        assert_eq!(coerce_headcount("NaN"), 0);
        assert_eq!(coerce_headcount("inf"), 0);
    }

    #[test]
    fn token_parse_splits_at_first_dash() {
        let token = MovementToken::parse("4-Acme-Drilling").unwrap();
        assert_eq!(token.magnitude, 4);
        assert_eq!(token.company, "Acme-Drilling");
        assert_eq!(token.to_string(), "4-Acme-Drilling");
        assert!(MovementToken::parse("Ops").is_err());
        assert!(MovementToken::parse("x-Ops").is_err());
        assert!(MovementToken::parse("0-Ops").is_err());
    }

    #[test]
    fn ledger_date_keys_are_calendar_sorted() {
        let ledger = Ledger::new(vec![
            LedgerRow::new("A").with(d("10/1/2025"), 1),
            LedgerRow::new("B").with(d("9/30/2025"), 2).with(d("10/1/2025"), 2),
        ]);
        assert_eq!(ledger.date_keys(), vec![d("9/30/2025"), d("10/1/2025")]);
        assert_eq!(ledger.pob_total(&d("10/1/2025")), 3);
    }

    #[test]
    fn passenger_weights_parse_leniently() {
        let json = r#"[
            {"name": "A", "company": "X", "bodyWeight": "82", "bagWeight": 11.5},
            {"name": "B", "company": "Y", "bodyWeight": "", "bagWeight": null},
            {"name": "C"}
        ]"#;
        let pax: Vec<Passenger> = serde_json::from_str(json).unwrap();
        assert_eq!(pax[0].total_weight(), 93.5);
        assert_eq!(pax[1].total_weight(), 0.0);
        assert_eq!(pax[2].company, "");
    }

    #[test]
    fn aircraft_limits_accept_both_key_styles() {
        let json = r#"{"type": "AW139", "maxPax": "12", "max_outbound_weight": 1200}"#;
        let limits: AircraftTypeLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits.max_pax, Some(12.0));
        assert_eq!(limits.max_outbound_weight, Some(1200.0));
        assert_eq!(limits.max_inbound_weight, None);
    }

    #[test]
    fn date_key_is_a_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(d("1/2/2025"), 1);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"1/2/2025":1}"#);
    }
}
