//! Field normalization shared by all extractors.
//!
//! Handles:
//! - Label synonyms (tel→phone, address→location, right pd→pd_od)
//! - Numeric captures (signed diopters, integer axis, millimeters)
//! - Calendar dates (ISO, US, month-name forms → `YYYY-MM-DD`)

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::models::DraftField;

/// Maps free-text `key:` labels to draft fields.
pub struct LabelNormalizer {
    /// Synonym map: lowercase label → field
    synonyms: HashMap<String, DraftField>,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelNormalizer {
    /// Create a normalizer with the default label vocabulary.
    pub fn new() -> Self {
        Self {
            synonyms: Self::default_synonyms(),
        }
    }

    /// Resolve a label (case-insensitive, surrounding whitespace ignored).
    pub fn field_for(&self, label: &str) -> Option<DraftField> {
        self.synonyms.get(&label.trim().to_lowercase()).copied()
    }

    /// Add a custom label mapping.
    pub fn add_synonym(&mut self, label: &str, field: DraftField) {
        self.synonyms.insert(label.trim().to_lowercase(), field);
    }

    fn default_synonyms() -> HashMap<String, DraftField> {
        let mut map = HashMap::new();

        // Identity
        map.insert("patient".into(), DraftField::Name);
        map.insert("name".into(), DraftField::Name);
        map.insert("patient name".into(), DraftField::Name);

        // Contact
        map.insert("phone".into(), DraftField::Phone);
        map.insert("tel".into(), DraftField::Phone);
        map.insert("telephone".into(), DraftField::Phone);
        map.insert("email".into(), DraftField::Email);
        map.insert("e-mail".into(), DraftField::Email);
        map.insert("location".into(), DraftField::Location);
        map.insert("address".into(), DraftField::Location);
        map.insert("city".into(), DraftField::Location);

        // Dates
        map.insert("dob".into(), DraftField::Dob);
        map.insert("date of birth".into(), DraftField::Dob);
        map.insert("birth date".into(), DraftField::Dob);
        map.insert("exam date".into(), DraftField::ExamDate);
        map.insert("examination date".into(), DraftField::ExamDate);
        map.insert("date of examination".into(), DraftField::ExamDate);

        // Pupillary distance
        map.insert("pd".into(), DraftField::Pd);
        map.insert("pupillary distance".into(), DraftField::Pd);
        map.insert("pd od".into(), DraftField::PdOd);
        map.insert("right pd".into(), DraftField::PdOd);
        map.insert("pd os".into(), DraftField::PdOs);
        map.insert("left pd".into(), DraftField::PdOs);

        map
    }
}

/// Parse a captured signed decimal such as `-2.25`, `+1.50` or `64.`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a captured integer axis. Digit runs too long for `u32` are dropped.
pub fn parse_axis(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

static LEADING_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-+]?(?:\d+\.?\d*|\.\d+))").unwrap());

static FIRST_UNSIGNED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").unwrap());

/// Parse the numeric prefix of a value (`"32.5 mm"` → `32.5`).
pub fn parse_leading_decimal(raw: &str) -> Option<f64> {
    LEADING_DECIMAL
        .captures(raw)
        .and_then(|caps| parse_decimal(&caps[1]))
}

/// First unsigned decimal anywhere in the value (`"approx. 64 mm"` → `64`).
pub fn find_decimal(raw: &str) -> Option<f64> {
    FIRST_UNSIGNED_DECIMAL
        .captures(raw)
        .and_then(|caps| parse_decimal(&caps[1]))
}

/// Round to one decimal place, half away from zero.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a Gregorian calendar date in one of the accepted layouts.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

/// Parse and re-format a date as `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_calendar_date(raw).map(format_date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
