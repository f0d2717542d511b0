use serde_json::Value;

use crate::capacity::daily_overview;
use crate::classify::reconcile;
use crate::config::ReconConfig;
use crate::differ::diff_ledger;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::model::{
    coerce_headcount, DateKey, Ledger, LedgerRow, ManifestEntry, ReconInput, ReconMeta, ReconResult,
};

/// Run inference and reconciliation per config over a pre-loaded snapshot.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let default_mode = config.direction.default_mode();
    let directions = config.direction.direction_map();

    let movements = diff_ledger(&input.dates, &input.ledger.rows, &directions, default_mode)?;

    let filter = config.manifest.cargo_filter();
    let results = reconcile(&input.dates, &movements, &input.manifests, &config.aircraft, &filter);

    let days = daily_overview(&input.dates, &input.ledger, &movements, config.location_capacity());
    let summary = compute_summary(&results, &days);

    log::info!(
        "{}: {} days, {} reconciled, {} mismatched, {} missing manifests",
        config.name,
        summary.total_days,
        summary.reconciled,
        summary.mismatch,
        summary.missing_manifest,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            location: config.location.clone(),
            default_mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        movements,
        days,
        results,
    })
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Load a ledger grid: a `company` column plus one `M/D/YYYY` column per date.
///
/// Columns whose header is not a date are ignored. Rows with a blank company
/// are skipped. Blank cells stay absent (read as 0).
pub fn load_ledger_csv(csv_data: &str) -> Result<Ledger, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let company_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("company"))
        .ok_or_else(|| ReconError::InvalidInput("ledger CSV has no 'company' column".into()))?;

    let mut date_columns: Vec<(usize, DateKey)> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if idx == company_idx {
            continue;
        }
        match DateKey::parse(header) {
            Ok(date) => date_columns.push((idx, date)),
            Err(_) => log::debug!("ledger column '{header}' is not a date, skipping"),
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Parse(e.to_string()))?;

        let company = record.get(company_idx).unwrap_or("");
        if company.is_empty() {
            continue;
        }

        let mut row = LedgerRow::new(company);
        for (idx, date) in &date_columns {
            let cell = record.get(*idx).unwrap_or("");
            if !cell.is_empty() {
                row.set(*date, coerce_headcount(cell));
            }
        }
        rows.push(row);
    }

    Ok(Ledger::new(rows))
}

/// Load a ledger from `[{ "company": "...", "M/D/YYYY": n | "" }, ...]`.
pub fn load_ledger_json(json: &str) -> Result<Ledger, ReconError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ReconError::Parse(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ReconError::InvalidInput("ledger must be a JSON array".into()));
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(ReconError::InvalidInput(format!("ledger row {i} is not an object")));
        };

        let company = match fields.get("company") {
            Some(Value::String(s)) => s.trim(),
            _ => "",
        };
        if company.is_empty() {
            log::debug!("ledger row {i} has no company, skipping");
            continue;
        }

        let mut row = LedgerRow::new(company);
        for (key, cell) in fields {
            if key == "company" {
                continue;
            }
            let Ok(date) = DateKey::parse(key) else {
                continue;
            };
            match cell {
                Value::Number(n) => {
                    let count = n
                        .as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                        .unwrap_or(0);
                    row.set(date, count);
                }
                Value::String(s) if !s.trim().is_empty() => row.set(date, coerce_headcount(s)),
                Value::String(_) | Value::Null => {}
                other => {
                    log::debug!("ledger cell {company}/{key} = {other} is not numeric, reading as 0");
                    row.set(date, 0);
                }
            }
        }
        rows.push(row);
    }

    Ok(Ledger::new(rows))
}

/// Load a manifest catalog (JSON array of manifest entries).
pub fn load_manifests_json(json: &str) -> Result<Vec<ManifestEntry>, ReconError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ReconError::Parse(e.to_string()))?;
    if !value.is_array() {
        return Err(ReconError::InvalidInput("manifest catalog must be a JSON array".into()));
    }
    serde_json::from_value(value).map_err(|e| ReconError::Parse(format!("manifest catalog: {e}")))
}

/// Parse a caller-supplied range: `[{ "date": "M/D/YYYY" }, ...]`.
pub fn parse_date_range(json: &str) -> Result<Vec<DateKey>, ReconError> {
    #[derive(serde::Deserialize)]
    struct Day {
        date: String,
    }

    let value: Value = serde_json::from_str(json).map_err(|e| ReconError::Parse(e.to_string()))?;
    if !value.is_array() {
        return Err(ReconError::InvalidInput("date range must be a JSON array".into()));
    }
    let days: Vec<Day> =
        serde_json::from_value(value).map_err(|e| ReconError::Parse(format!("date range: {e}")))?;
    if days.is_empty() {
        return Err(ReconError::InvalidInput("date range is empty".into()));
    }
    days.iter().map(|d| DateKey::parse(&d.date)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReconClass;

    fn d(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[test]
    fn csv_ledger_is_sparse_and_ordered() {
        let csv = "company,notes,1/1/2025,1/2/2025\nOps,x,10,13\n,,5,5\nDrill,,,4\n";
        let ledger = load_ledger_csv(csv).unwrap();
        assert_eq!(ledger.rows.len(), 2);
        assert_eq!(ledger.rows[0].company, "Ops");
        assert_eq!(ledger.rows[0].headcount(&d("1/2/2025")), 13);
        assert!(!ledger.rows[1].counts.contains_key(&d("1/1/2025")));
        assert_eq!(ledger.rows[1].headcount(&d("1/2/2025")), 4);
    }

    #[test]
    fn csv_without_company_column_is_invalid() {
        let err = load_ledger_csv("name,1/1/2025\nOps,1\n").unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
    }

    #[test]
    fn json_ledger_accepts_numbers_and_blanks() {
        let json = r#"[
            {"company": "Ops", "1/1/2025": 10, "1/2/2025": "13", "note": "x"},
            {"company": "Drill", "1/1/2025": "", "1/2/2025": 2.7},
            {"1/1/2025": 4}
        ]"#;
        let ledger = load_ledger_json(json).unwrap();
        assert_eq!(ledger.rows.len(), 2);
        assert_eq!(ledger.rows[0].headcount(&d("1/2/2025")), 13);
        assert!(ledger.rows[1].counts.get(&d("1/1/2025")).is_none());
        assert_eq!(ledger.rows[1].headcount(&d("1/2/2025")), 2);
    }

    #[test]
    fn json_ledger_trims_company() {
        let json = r#"[
            {"company": "  ", "1/1/2025": 1, "1/2/2025": 4},
            {"company": " Ops ", "1/1/2025": 2}
        ]"#;
        let ledger = load_ledger_json(json).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].company, "Ops");
    }

    #[test]
    fn run_survives_extreme_headcounts() {
        let config = ReconConfig::from_toml(
            r#"
name = "Alpha"
location = "alpha"
[locations.alpha]
max = 30
flotel = 4
"#,
        )
        .unwrap();
        let ledger = load_ledger_csv("company,1/1/2025,1/2/2025\nA,9223372036854775807,1\nB,5,5\n").unwrap();
        let input = ReconInput { dates: ledger.date_keys(), ledger, manifests: Vec::new() };

        let result = run(&config, &input).unwrap();
        assert_eq!(result.days[&d("1/1/2025")].pob_total, i64::MAX);
        assert_eq!(result.days[&d("1/2/2025")].pob_total, 6);
        assert_eq!(result.results[&d("1/2/2025")].planner_count, i64::MAX.abs_diff(1));
    }

    #[test]
    fn json_ledger_must_be_array() {
        let err = load_ledger_json(r#"{"company": "Ops"}"#).unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
        let err = load_ledger_json("[1, 2]").unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
    }

    #[test]
    fn date_range_must_be_non_empty_array() {
        assert!(matches!(parse_date_range("[]").unwrap_err(), ReconError::InvalidInput(_)));
        assert!(matches!(parse_date_range(r#"{"date": "1/1/2025"}"#).unwrap_err(), ReconError::InvalidInput(_)));
        let dates = parse_date_range(r#"[{"date": "1/1/2025"}, {"date": "1/2/2025"}]"#).unwrap();
        assert_eq!(dates, vec![d("1/1/2025"), d("1/2/2025")]);
    }

    #[test]
    fn manifests_parse_from_camel_case() {
        let json = r#"[{
            "id": 7,
            "meta": {"date": "2025-01-02", "aircraftType": "AW139", "flightNumber": "HX12"},
            "outbound": [{"name": "A", "company": "Ops", "bodyWeight": "90", "bagWeight": "8"}],
            "inbound": []
        }]"#;
        let catalog = load_manifests_json(json).unwrap();
        assert_eq!(catalog[0].id, "7");
        assert_eq!(catalog[0].meta.aircraft_type, "AW139");
        assert_eq!(catalog[0].outbound[0].total_weight(), 98.0);
        assert!(matches!(load_manifests_json("{}").unwrap_err(), ReconError::InvalidInput(_)));
    }

    #[test]
    fn run_end_to_end() {
        let config = ReconConfig::from_toml(
            r#"
name = "Alpha"
location = "alpha"
[locations.alpha]
max = 20
"#,
        )
        .unwrap();
        let ledger = load_ledger_csv("company,1/1/2025,1/2/2025,1/3/2025\nOps,10,13,13\nDrill,5,5,9\n").unwrap();
        let manifests = load_manifests_json(
            r#"[{"id": "m1", "meta": {"date": "2025-01-02", "aircraftType": "S92"},
                 "outbound": [{"name": "A"}, {"name": "B"}, {"name": "C"}], "inbound": []}]"#,
        )
        .unwrap();
        let input = ReconInput { dates: ledger.date_keys(), ledger, manifests };

        let result = run(&config, &input).unwrap();
        assert_eq!(result.results[&d("1/2/2025")].class, ReconClass::Reconciled);
        assert_eq!(result.results[&d("1/3/2025")].class, ReconClass::MissingManifest);
        assert!(!result.results.contains_key(&d("1/1/2025")));
        assert_eq!(result.days[&d("1/3/2025")].pob_total, 22);
        assert!(result.days[&d("1/3/2025")].capacity.unwrap().over_max);
        assert_eq!(result.summary.days_over_max, 1);
        assert_eq!(result.meta.config_name, "Alpha");
    }

    #[test]
    fn run_rejects_empty_range() {
        let config = ReconConfig::from_toml(r#"name = "Alpha""#).unwrap();
        let err = run(&config, &ReconInput::default()).unwrap_err();
        assert!(matches!(err, ReconError::InvalidInput(_)));
    }
}
