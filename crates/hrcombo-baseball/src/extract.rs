// HR event extraction from per-day game-data JSON.
//
// Upstream scrapers disagree on shape and field names: some files are a bare
// array of player objects, others nest the list under `players`, `data` or
// `stats`; the HR column may be `HR`, `hr`, `home_runs` and so on. Field
// lookup goes through a small ordered rule table instead of ad-hoc probing.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::event::{DailyRecord, HrEvent};

/// Placeholder name some scrapers emit for unidentified players.
const UNKNOWN_NAME: &str = "Unknown";

/// Keys that may hold the player list when the record is an object.
const PLAYER_LIST_KEYS: &[&str] = &["players", "data", "stats"];

/// Top-level field holding the record date when the filename has none.
const EMBEDDED_DATE_KEY: &str = "date";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

/// A logical field and the raw keys it may appear under, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

pub const HR_RULE: FieldRule = FieldRule {
    field: "home_runs",
    aliases: &["HR", "hr", "home_runs", "homeRuns", "hrs", "HR_total"],
};

pub const NAME_RULE: FieldRule = FieldRule {
    field: "name",
    aliases: &["name", "Name", "playerName", "player_name", "fullName"],
};

pub const TEAM_RULE: FieldRule = FieldRule {
    field: "team",
    aliases: &["team", "Team", "teamAbbr", "team_abbr"],
};

impl FieldRule {
    /// First alias that is present, integer-coercible and positive.
    pub fn resolve_count(&self, entry: &Map<String, Value>) -> Option<u32> {
        self.aliases
            .iter()
            .filter_map(|alias| entry.get(*alias))
            .filter_map(coerce_int)
            .find(|&n| n > 0)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// First alias holding a non-blank string, trimmed.
    pub fn resolve_text<'a>(&self, entry: &'a Map<String, Value>) -> Option<&'a str> {
        self.aliases
            .iter()
            .filter_map(|alias| entry.get(*alias))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// JSON integers, integral floats, and strings holding an integer.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Result of extracting one source record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub date: Option<NaiveDate>,
    pub events: Vec<HrEvent>,
}

impl Extraction {
    /// A day record, or `None` when no date could be determined.
    pub fn into_daily(self) -> Option<DailyRecord> {
        self.date.map(|date| DailyRecord::new(date, self.events))
    }
}

/// Extract the date and HR events from one parsed record. `provenance` is the
/// source path; its file name is the primary date source.
pub fn extract_record(value: &Value, provenance: &Path) -> Extraction {
    let date = date_from_filename(provenance).or_else(|| embedded_date(value));
    let Some(date) = date else {
        debug!("no usable date for {}", provenance.display());
        return Extraction::default();
    };

    let events = player_entries(value)
        .iter()
        .filter_map(Value::as_object)
        .filter_map(event_from_entry)
        .collect();

    Extraction {
        date: Some(date),
        events,
    }
}

/// Read and extract one day file.
pub fn read_day_file(path: &Path) -> Result<Extraction, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| ExtractError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(extract_record(&value, path))
}

/// The player list of a record: the record itself when it is an array,
/// otherwise the first list found under a conventional key.
fn player_entries(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(obj) => PLAYER_LIST_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

fn event_from_entry(entry: &Map<String, Value>) -> Option<HrEvent> {
    if let Some(kind) = entry.get("playerType").and_then(Value::as_str) {
        if !kind.trim().eq_ignore_ascii_case("hitter") {
            return None;
        }
    }

    let hr_count = HR_RULE.resolve_count(entry)?;

    let name = NAME_RULE.resolve_text(entry)?;
    if name.eq_ignore_ascii_case(UNKNOWN_NAME) {
        return None;
    }
    // Identity is name plus team; without a team the row cannot be keyed.
    let team = TEAM_RULE.resolve_text(entry)?;

    Some(HrEvent::new(name, team, hr_count))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse `<month-name>_<day>_<year>.json`, e.g. `july_4_2025.json`.
pub fn date_from_filename(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.split('_');
    let month = month_number(parts.next()?)?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn embedded_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.get(EMBEDDED_DATE_KEY)?.as_str()?;
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("ignoring unparsable embedded date '{}': {}", raw, e);
            None
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn july(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn extract(value: Value) -> Extraction {
        extract_record(&value, Path::new("public/data/2025/july/july_25_2025.json"))
    }

    // -- Dates --

    #[test]
    fn filename_date_parses_month_names() {
        assert_eq!(date_from_filename(Path::new("july_25_2025.json")), Some(july(25)));
        assert_eq!(
            date_from_filename(Path::new("a/b/September_3_2025.json")),
            NaiveDate::from_ymd_opt(2025, 9, 3)
        );
    }

    #[test]
    fn filename_date_rejects_bad_names() {
        assert_eq!(date_from_filename(Path::new("july_32_2025.json")), None);
        assert_eq!(date_from_filename(Path::new("month_25_2025.json")), None);
        assert_eq!(date_from_filename(Path::new("schedule.json")), None);
        assert_eq!(date_from_filename(Path::new("july_xx_2025.json")), None);
    }

    #[test]
    fn embedded_date_used_when_filename_has_none() {
        let value = json!({
            "date": "2025-07-04",
            "players": [{"name": "Aaron Judge", "team": "NYY", "HR": 1}]
        });
        let got = extract_record(&value, Path::new("player_performance.json"));
        assert_eq!(got.date, Some(july(4)));
        assert_eq!(got.events.len(), 1);
    }

    #[test]
    fn no_date_means_no_events() {
        let value = json!({
            "date": "not-a-date",
            "players": [{"name": "Aaron Judge", "team": "NYY", "HR": 1}]
        });
        let got = extract_record(&value, Path::new("whatever.json"));
        assert_eq!(got, Extraction::default());
        assert!(got.into_daily().is_none());
    }

    // -- Shapes --

    #[test]
    fn array_shape() {
        let got = extract(json!([
            {"name": "Aaron Judge", "team": "NYY", "HR": 2},
            {"name": "Juan Soto", "team": "NYM", "HR": 0}
        ]));
        assert_eq!(got.events, vec![HrEvent::new("Aaron Judge", "NYY", 2)]);
    }

    #[test]
    fn nested_shapes_checked_in_order() {
        let got = extract(json!({
            "games": [],
            "data": [{"name": "Cal Raleigh", "team": "SEA", "hr": 1}],
            "stats": [{"name": "Ignored", "team": "BOS", "hr": 1}]
        }));
        assert_eq!(got.events, vec![HrEvent::new("Cal Raleigh", "SEA", 1)]);
    }

    #[test]
    fn scalar_record_has_no_players() {
        let got = extract(json!("nothing here"));
        assert_eq!(got.date, Some(july(25)));
        assert!(got.events.is_empty());
    }

    // -- Field rules --

    #[test]
    fn hr_aliases_first_positive_wins() {
        let got = extract(json!([
            {"name": "A", "team": "T", "HR": 0, "homeRuns": 2},
            {"name": "B", "team": "T", "HR": "x", "hrs": "3"},
            {"name": "C", "team": "T", "home_runs": 1.0},
            {"name": "D", "team": "T", "HR_total": 1.5},
            {"name": "E", "team": "T", "HR": null}
        ]));
        let counts: Vec<_> = got.events.iter().map(|e| (e.name.as_str(), e.hr_count)).collect();
        assert_eq!(counts, vec![("A", 2), ("B", 3), ("C", 1)]);
    }

    #[test]
    fn negative_hr_is_dropped() {
        let got = extract(json!([{"name": "A", "team": "T", "HR": -1}]));
        assert!(got.events.is_empty());
    }

    #[test]
    fn name_and_team_aliases_trimmed() {
        let got = extract(json!([
            {"playerName": "  Pete Alonso ", "teamAbbr": " NYM ", "HR": 1},
            {"Name": "Kyle Schwarber", "Team": "PHI", "HR": 1}
        ]));
        assert_eq!(
            got.events,
            vec![
                HrEvent::new("Pete Alonso", "NYM", 1),
                HrEvent::new("Kyle Schwarber", "PHI", 1),
            ]
        );
    }

    #[test]
    fn rows_without_team_dropped() {
        let got = extract(json!([
            {"name": "Mystery Slugger", "HR": 1},
            {"name": "Blank Team", "team": "  ", "HR": 1},
            {"name": "Aaron Judge", "team": "NYY", "HR": 1}
        ]));
        assert_eq!(got.events, vec![HrEvent::new("Aaron Judge", "NYY", 1)]);
    }

    #[test]
    fn unnamed_and_unknown_players_dropped() {
        let got = extract(json!([
            {"team": "NYY", "HR": 1},
            {"name": "   ", "team": "NYY", "HR": 1},
            {"name": "Unknown", "team": "NYY", "HR": 1},
            {"name": 42, "team": "NYY", "HR": 1}
        ]));
        assert!(got.events.is_empty());
    }

    #[test]
    fn pitchers_skipped_when_typed() {
        let got = extract(json!([
            {"name": "Hitter", "team": "NYY", "HR": 1, "playerType": "hitter"},
            {"name": "Pitcher", "team": "NYY", "HR": 1, "playerType": "pitcher"},
            {"name": "Untyped", "team": "NYY", "HR": 1}
        ]));
        let names: Vec<_> = got.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Hitter", "Untyped"]);
    }

    // -- Files --

    #[test]
    fn read_day_file_reports_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("july_1_2025.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(read_day_file(&path), Err(ExtractError::Json { .. })));
    }

    #[test]
    fn read_day_file_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("july_1_2025.json");
        assert!(matches!(read_day_file(&path), Err(ExtractError::Io { .. })));
    }

    #[test]
    fn read_day_file_extracts() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("july_1_2025.json");
        std::fs::write(&path, r#"{"players":[{"name":"Aaron Judge","team":"NYY","HR":1}]}"#)
            .unwrap();
        let day = read_day_file(&path).unwrap().into_daily().unwrap();
        assert_eq!(day.date, july(1));
        assert_eq!(day.events.len(), 1);
    }
}
