use calamine::Data;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::cells::ParseDiagnostics;

/// Days between the Excel epoch (1899-12-30) and the Unix epoch
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25569.0;
const MS_PER_DAY: f64 = 86_400_000.0;

// "PDT-0700" / "CET+01:00" at the end of a timestamp
static TZ_ABBREVIATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[A-Za-z]{3}([+-])([0-9]{2}):?([0-9]{2})\s*$").expect("valid timezone pattern")
});

const OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y/%m/%d %H:%M:%S %z",
];

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// A date cell after normalisation: the output text plus the instant when known
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDate {
    pub text: String,
    pub instant: Option<DateTime<Utc>>,
}

impl NormalizedDate {
    fn parsed(instant: DateTime<Utc>) -> Self {
        Self {
            text: format_utc(&instant),
            instant: Some(instant),
        }
    }

    fn raw(text: String) -> Self {
        Self { text, instant: None }
    }
}

pub fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Excel serial day number → UTC instant
pub fn from_excel_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH_DAYS) * MS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parse a free-text timestamp. A trailing timezone abbreviation glued to a
/// numeric offset is dropped and the offset kept. Text without an offset is
/// read as UTC.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let cleaned = TZ_ABBREVIATION_RE.replace(text, " ${1}${2}${3}");
    let cleaned = cleaned.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(cleaned, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Normalise a date cell. Never fails: anything unreadable comes back as its
/// raw text and is counted in the diagnostics.
pub fn normalize_date_cell(cell: Option<&Data>, diagnostics: &mut ParseDiagnostics) -> NormalizedDate {
    let (instant, raw) = match cell {
        None | Some(Data::Empty) => return NormalizedDate::raw(String::new()),
        Some(Data::Float(serial)) => (from_excel_serial(*serial), serial.to_string()),
        Some(Data::Int(serial)) => (from_excel_serial(*serial as f64), serial.to_string()),
        Some(Data::DateTime(dt)) => (from_excel_serial(dt.as_f64()), dt.as_f64().to_string()),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => (parse_date_text(s), s.clone()),
        Some(other) => (None, super::cells::cell_text(other)),
    };

    match instant {
        Some(instant) => NormalizedDate::parsed(instant),
        None => {
            diagnostics.unparsable_dates += 1;
            NormalizedDate::raw(raw)
        }
    }
}
