//! Per-field normalization of raw extraction text.
//!
//! Extraction output is untrusted free text; this module rewrites each
//! scalar into the closed per-kind formats the rest of the engine relies
//! on:
//!
//! | Kind | Output |
//! |------|--------|
//! | Yes/No | `"Yes"`, `"No"`, or `"N/A"` |
//! | Date | `MM/DD/YYYY` |
//! | Time | 24-hour `HH:MM:SS` |
//! | Currency | two-decimal digits-only string |
//! | Identifier | digit residue with per-field length gates |
//! | Address | trailing region code expanded to its full name |
//!
//! Parsers are total: they either produce the normal form or report
//! failure, and failure leaves the field untouched so low-confidence raw
//! text survives for audit. [`normalize_record`] applies the whole pass in
//! a fixed order, ending with the derived recording-stamp flag.

use crate::canon::{classify_rider_name, RiderName};
use crate::config::EngineConfig;
use crate::confidence::ConfidenceValue;
use crate::record::{DocumentRecord, FieldKey, FieldKind, RiderEntry};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)(st|nd|rd|th)").expect("valid ordinal regex"));
static RE_DATE_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").expect("valid loose date regex")
});
static RE_DOTTED_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\.(\d)").expect("valid dotted time regex"));
static RE_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(AM|PM)\b").expect("valid meridiem regex"));
static RE_TIME_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?\b").expect("valid clock time regex")
});
static RE_TIME_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})(\d{2})(\d{2})?\b").expect("valid digit time regex"));
static RE_TIME_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").expect("valid bare hour regex"));
static RE_MONEY_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,$\s]").expect("valid money noise regex"));
static RE_PAGE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,5})\s*-\s*(\d{1,5})\s*$").expect("valid page range regex")
});
// Region-code extraction, most specific first: code before a ZIP after a
// comma, code after a comma, code before a ZIP with no comma. Each pattern
// is given one shot; a match on an unknown code falls through to the next.
static RE_REGION_COMMA_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?,\s*)([A-Za-z]{2})(\s+\d{5}(?:-\d{4})?\b.*)$").expect("valid region regex")
});
static RE_REGION_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?,\s*)([A-Za-z]{2})(\b.*)$").expect("valid region regex"));
static RE_REGION_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*\b)([A-Za-z]{2})(\s+\d{5}(?:-\d{4})?\b.*)$").expect("valid region regex")
});

const DATE_FORMATS: [&str; 7] = [
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Fold a checkbox-style answer into the closed `Yes`/`No`/`N/A` vocabulary.
#[must_use = "returns the folded answer"]
pub fn normalize_yes_no(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "checked" | "present" => "Yes".to_owned(),
        "n" | "no" | "false" | "0" | "unchecked" | "absent" => "No".to_owned(),
        _ => "N/A".to_owned(),
    }
}

/// Parse a date in any accepted layout and render it as `MM/DD/YYYY`.
///
/// Ordinal suffixes are stripped first so "January 2nd, 2024" parses. When
/// no full-string layout fits, a loose `M/D/Y` triple is pulled out of the
/// surrounding text; two-digit years below 50 resolve to 20xx.
#[must_use = "returns the normalized date"]
pub fn parse_date(raw: &str) -> Option<String> {
    let cleaned = RE_ORDINAL.replace_all(raw, "${1}");
    let cleaned = cleaned.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(date.format("%m/%d/%Y").to_string());
        }
    }
    let caps = RE_DATE_LOOSE.captures(cleaned)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%m/%d/%Y").to_string())
}

/// Parse a clock time and render it as 24-hour `HH:MM:SS`.
///
/// Handles colon and dotted separators, bare digit runs ("1427"), spelled
/// meridiems ("2 PM", "2.27.59 P.M."), and rejects out-of-range components.
#[must_use = "returns the normalized time"]
pub fn parse_time(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let folded = upper
        .replace("A.M.", "AM")
        .replace("P.M.", "PM")
        .replace("A M", "AM")
        .replace("P M", "PM");
    let folded = RE_DOTTED_TIME.replace_all(&folded, "${1}:${2}").into_owned();

    let meridiem = RE_MERIDIEM
        .captures(&folded)
        .map(|caps| caps[1].to_owned());
    let rest = RE_MERIDIEM.replace_all(&folded, "").into_owned();

    let (hour, minute, second) = if let Some(caps) = RE_TIME_COLON.captures(&rest) {
        (
            caps[1].parse::<u32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?,
        )
    } else {
        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        if let Some(caps) = RE_TIME_DIGITS.captures(&digits) {
            (
                caps[1].parse::<u32>().ok()?,
                caps[2].parse::<u32>().ok()?,
                caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?,
            )
        } else if meridiem.is_some() {
            let caps = RE_TIME_HOUR.captures(&rest)?;
            (caps[1].parse::<u32>().ok()?, 0, 0)
        } else {
            return None;
        }
    };

    if minute > 59 || second > 59 {
        return None;
    }
    let hour = match meridiem.as_deref() {
        Some("AM") if hour == 12 => 0,
        Some("PM") if hour < 12 => hour + 12,
        _ => hour,
    };
    if hour > 23 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}:{second:02}"))
}

/// Normalize a monetary amount to a plain two-decimal string.
///
/// Currency symbols, separators, and whitespace are stripped; a second
/// decimal point and anything after it is discarded.
#[must_use = "returns the normalized amount"]
pub fn format_currency(raw: &str) -> Option<String> {
    let stripped = RE_MONEY_NOISE.replace_all(raw, "").into_owned();
    let mut parts = stripped.split('.');
    let amount = match (parts.next(), parts.next()) {
        (Some(whole), Some(frac)) => format!("{whole}.{frac}"),
        _ => stripped,
    };
    let value: f64 = amount.parse().ok()?;
    Some(format!("{value:.2}"))
}

/// Expand a trailing two-letter region code into its full name.
///
/// Returns `None` when no pattern finds a known code; the caller keeps the
/// address unchanged in that case.
#[must_use = "returns the expanded address"]
pub fn expand_region_code(raw: &str, config: &EngineConfig) -> Option<String> {
    for pattern in [&RE_REGION_COMMA_ZIP, &RE_REGION_COMMA, &RE_REGION_ZIP] {
        if let Some(caps) = pattern.captures(raw) {
            if let Some(name) = config.region_name(&caps[2]) {
                return Some(format!("{}{}{}", &caps[1], name, &caps[3]));
            }
        }
    }
    None
}

/// Digit residue of a string.
fn digits_of(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Recording book: keep a 1-6 digit residue, otherwise mark absent.
fn sanitize_book(field: &mut ConfidenceValue<String>) {
    let digits = digits_of(field.value.trim());
    if digits.is_empty() || digits.len() > 6 {
        *field = ConfidenceValue::absent();
    } else {
        field.value = digits;
    }
}

/// Recording page: keep an `a-b` range with `0 < a <= b`, else a 1-5 digit
/// residue, otherwise mark absent.
fn sanitize_page(field: &mut ConfidenceValue<String>) {
    if let Some(caps) = RE_PAGE_RANGE.captures(&field.value) {
        if let (Ok(start), Ok(end)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            if start > 0 && end > 0 && end >= start {
                field.value = format!("{start}-{end}");
                return;
            }
        }
    }
    let digits = digits_of(field.value.trim());
    if digits.is_empty() || digits.len() > 5 {
        *field = ConfidenceValue::absent();
    } else {
        field.value = digits;
    }
}

/// Recorder's document number: at least six digits, never the 18-digit MIN
/// shape and never the MIN itself. Accepted values keep their original
/// formatting.
fn sanitize_document_number(field: &mut ConfidenceValue<String>, min_digits: &str) {
    let trimmed = field.value.trim();
    let digits = digits_of(trimmed);
    if digits.len() < 6 || digits.len() == 18 || digits == min_digits {
        *field = ConfidenceValue::absent();
    } else {
        field.value = trimmed.to_owned();
    }
}

/// MIN: exactly 18 digits keeps the trimmed original, any other digit
/// residue marks the field absent, and digit-free text is left alone.
fn sanitize_min(field: &mut ConfidenceValue<String>) {
    let trimmed = field.value.trim();
    let digits = digits_of(trimmed);
    if digits.is_empty() {
        return;
    }
    if digits.len() == 18 {
        field.value = trimmed.to_owned();
    } else {
        *field = ConfidenceValue::absent();
    }
}

/// Classify, deduplicate, and vocabulary-fold the rider list.
///
/// Canonical riders come first keyed by canonical name, unclassified riders
/// follow keyed by folded raw name; within a key the entry with the higher
/// name confidence wins. Deliberately-ignored checkbox rows are dropped.
fn normalize_riders(riders: &mut ConfidenceValue<Vec<RiderEntry>>, config: &EngineConfig) {
    let mut canonical: Vec<(String, RiderEntry)> = Vec::new();
    let mut unclassified: Vec<(String, RiderEntry)> = Vec::new();
    for mut entry in riders.value.drain(..) {
        entry.present.value = normalize_yes_no(&entry.present.value);
        entry.signed_attached.value = normalize_yes_no(&entry.signed_attached.value);
        match classify_rider_name(&entry.name.value, config) {
            RiderName::Ignored => {}
            RiderName::Canonical(name) => {
                entry.name.value.clone_from(&name);
                keep_higher_name(&mut canonical, name, entry);
            }
            RiderName::Unrecognized => {
                let key = entry.name.value.trim().to_lowercase();
                keep_higher_name(&mut unclassified, key, entry);
            }
        }
    }
    let mut rebuilt: Vec<RiderEntry> = canonical.into_iter().map(|(_, entry)| entry).collect();
    rebuilt.extend(unclassified.into_iter().map(|(_, entry)| entry));
    riders.value = rebuilt;
}

fn keep_higher_name(bucket: &mut Vec<(String, RiderEntry)>, key: String, entry: RiderEntry) {
    match bucket.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, existing)) => {
            if entry.name.confidence > existing.name.confidence {
                *existing = entry;
            }
        }
        None => bucket.push((key, entry)),
    }
}

/// Derive the recording-stamp flag from the five stamp components. Only the
/// value is derived; the extraction's confidence in the flag is kept.
fn derive_recording_stamp(record: &mut DocumentRecord) {
    let has_stamp = [
        &record.recording_document_number,
        &record.recording_book,
        &record.recording_page,
        &record.recording_date,
        &record.recording_time,
    ]
    .into_iter()
    .any(|field| !field.value.trim().eq_ignore_ascii_case("n/a"));
    record.recording_stamp_present.value = if has_stamp { "Yes" } else { "No" }.to_owned();
}

/// Run the full normalization pass over one freshly ingested record.
///
/// Order matters: the document number is checked against the MIN's raw
/// digits before the MIN itself is sanitized, and the stamp flag is derived
/// last so it sees the sanitized components.
pub fn normalize_record(record: &mut DocumentRecord, config: &EngineConfig) {
    sanitize_book(&mut record.recording_book);
    sanitize_page(&mut record.recording_page);
    let min_digits = digits_of(record.min.value.trim());
    sanitize_document_number(&mut record.recording_document_number, &min_digits);

    for key in FieldKey::ALL {
        let kind = key.kind();
        let money = config.is_money_field(key);
        let Some(field) = record.scalar_mut(key) else {
            continue;
        };
        // The money set comes from configuration and wins over the kind table.
        if money {
            if let Some(amount) = format_currency(&field.value) {
                field.value = amount;
            }
            continue;
        }
        match kind {
            FieldKind::YesNo => field.value = normalize_yes_no(&field.value),
            FieldKind::Date => {
                if let Some(date) = parse_date(&field.value) {
                    field.value = date;
                }
            }
            FieldKind::Time => {
                if let Some(time) = parse_time(&field.value) {
                    field.value = time;
                }
            }
            FieldKind::Address => {
                if let Some(expanded) = expand_region_code(&field.value, config) {
                    field.value = expanded;
                }
            }
            _ => {}
        }
    }

    sanitize_min(&mut record.min);
    normalize_riders(&mut record.riders, config);
    derive_recording_stamp(record);
}
