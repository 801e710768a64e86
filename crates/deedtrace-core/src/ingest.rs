//! Ingestion of raw extraction payloads.
//!
//! A capture payload is the JSON a vision extraction returns for one pass
//! over a document: an `entities` object keyed by wire field name, each
//! entry a `{value, confidence}` pair, plus a plain-text `summary`.
//!
//! The payload is untrusted. Violations of the top-level contract (payload
//! not an object, `entities` or `summary` missing, `entities` not an
//! object) are hard errors; everything below that degrades softly, field by
//! field, to the absent sentinel so one bad field never discards a capture.
//!
//! [`ingest_capture`] parses the payload against the closed field set,
//! applies the admission gates for party and rider entries, then runs the
//! full normalization pass and returns a [`CaptureResult`].

use crate::canon::sanitize_party_name;
use crate::config::EngineConfig;
use crate::confidence::{clamp_confidence, ConfidenceValue, NOT_AVAILABLE, NOT_LISTED};
use crate::error::{CoreError, Result};
use crate::normalize::{normalize_record, normalize_yes_no};
use crate::record::{CaptureResult, DocumentRecord, FieldKey, FieldKind, PartyEntry, RiderEntry};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse one extraction payload into a normalized capture.
///
/// # Errors
///
/// Returns [`CoreError::MalformedCapture`] when the payload violates the
/// top-level contract. Per-field problems are not errors.
pub fn ingest_capture(
    payload: &Value,
    capture_id: impl Into<String>,
    config: &EngineConfig,
) -> Result<CaptureResult> {
    let capture_id = capture_id.into();
    let object = payload
        .as_object()
        .ok_or_else(|| CoreError::malformed("payload is not a JSON object"))?;
    let entities = object
        .get("entities")
        .ok_or_else(|| CoreError::malformed("missing entities or summary"))?;
    let summary = object
        .get("summary")
        .ok_or_else(|| CoreError::malformed("missing entities or summary"))?;
    let entities = entities
        .as_object()
        .ok_or_else(|| CoreError::malformed("entities is not a JSON object"))?;
    let summary = summary.as_str().unwrap_or_default().to_owned();

    let mut record = DocumentRecord::default();
    for key in FieldKey::ALL {
        let entry = entities.get(key.as_str());
        match key.kind() {
            FieldKind::PartyList => record.borrowers = parse_parties(entry),
            FieldKind::RiderList => record.riders = parse_riders(entry, config),
            _ => {
                if let Some(field) = record.scalar_mut(key) {
                    *field = parse_scalar(entry, key);
                }
            }
        }
    }
    normalize_record(&mut record, config);
    debug!(capture_id, "capture ingested");
    Ok(CaptureResult::new(record, summary, capture_id))
}

/// Coerce an untrusted confidence into a clamped score. Strings parse,
/// booleans map to the endpoints, everything else is zero.
fn coerce_confidence(raw: Option<&Value>) -> f64 {
    let score = match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        Some(Value::Bool(false)) => 0.0,
        _ => 0.0,
    };
    clamp_confidence(score)
}

/// Coerce an untrusted scalar value into text. Numbers and booleans are
/// rendered; nested structures degrade to the default sentinel.
fn coerce_value(raw: Option<&Value>, field: &str, default: &str) -> String {
    match raw {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(_) | Value::Object(_)) => {
            warn!(field, "structured value where scalar text was expected");
            default.to_owned()
        }
        _ => default.to_owned(),
    }
}

fn parse_scalar(entry: Option<&Value>, key: FieldKey) -> ConfidenceValue<String> {
    let default = key.absent_text();
    let Some(obj) = entry.and_then(Value::as_object) else {
        return ConfidenceValue::text(default, 0.0);
    };
    let confidence = coerce_confidence(obj.get("confidence"));
    let value = coerce_value(obj.get("value"), key.as_str(), default);
    ConfidenceValue::text(value, confidence)
}

fn sub_field(
    item: &Map<String, Value>,
    key: &str,
    default: &str,
    field: &'static str,
) -> ConfidenceValue<String> {
    let Some(sub) = item.get(key).and_then(Value::as_object) else {
        return ConfidenceValue::text(default, 0.0);
    };
    let confidence = coerce_confidence(sub.get("confidence"));
    let value = coerce_value(sub.get("value"), field, default);
    ConfidenceValue::text(value, confidence)
}

fn parse_aliases(item: &Map<String, Value>) -> ConfidenceValue<Vec<String>> {
    let Some(sub) = item.get("Alias").and_then(Value::as_object) else {
        return ConfidenceValue::default();
    };
    let confidence = coerce_confidence(sub.get("confidence"));
    let aliases = match sub.get("value") {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    };
    ConfidenceValue::new(aliases, confidence)
}

/// Parse the borrower list, sanitizing names and collapsing same-identity
/// entries within the capture.
fn parse_parties(entry: Option<&Value>) -> ConfidenceValue<Vec<PartyEntry>> {
    let Some(obj) = entry.and_then(Value::as_object) else {
        return ConfidenceValue::default();
    };
    let list_confidence = coerce_confidence(obj.get("confidence"));
    let mut keyed: Vec<(String, PartyEntry)> = Vec::new();
    let items = obj.get("value").and_then(Value::as_array);
    for item in items.into_iter().flatten() {
        let Some(item) = item.as_object() else {
            continue;
        };
        let raw_name = sub_field(item, "Name", NOT_AVAILABLE, "Borrower.Name");
        let Some(clean) = sanitize_party_name(&raw_name.value) else {
            continue;
        };
        let party = PartyEntry {
            name: ConfidenceValue::text(clean, raw_name.confidence),
            aliases: parse_aliases(item),
            relationship: sub_field(item, "Relationship", NOT_AVAILABLE, "Borrower.Relationship"),
            tenancy: sub_field(
                item,
                "TenantInformation",
                NOT_AVAILABLE,
                "Borrower.TenantInformation",
            ),
        };
        absorb_party(&mut keyed, party);
    }
    ConfidenceValue::new(keyed.into_iter().map(|(_, party)| party).collect(), list_confidence)
}

/// Collapse a same-identity duplicate: a strictly more confident name
/// replaces the entry wholesale, otherwise aliases union and the better
/// sub-fields win.
fn absorb_party(keyed: &mut Vec<(String, PartyEntry)>, party: PartyEntry) {
    let key = party.identity_key();
    match keyed.iter_mut().find(|(existing, _)| *existing == key) {
        None => keyed.push((key, party)),
        Some((_, existing)) => {
            if party.name.confidence > existing.name.confidence {
                *existing = party;
            } else {
                union_aliases(&mut existing.aliases, &party.aliases);
                upgrade_text(&mut existing.relationship, &party.relationship);
                upgrade_text(&mut existing.tenancy, &party.tenancy);
            }
        }
    }
}

/// Append unseen trimmed aliases and keep the higher list confidence.
pub(crate) fn union_aliases(
    existing: &mut ConfidenceValue<Vec<String>>,
    incoming: &ConfidenceValue<Vec<String>>,
) {
    for alias in &incoming.value {
        let alias = alias.trim();
        if alias.is_empty() {
            continue;
        }
        if !existing.value.iter().any(|have| have.trim() == alias) {
            existing.value.push(alias.to_owned());
        }
    }
    existing.confidence = existing.confidence.max(incoming.confidence);
}

/// Adopt the incoming text when it is strictly more confident.
pub(crate) fn upgrade_text(
    existing: &mut ConfidenceValue<String>,
    incoming: &ConfidenceValue<String>,
) {
    if incoming.confidence > existing.confidence {
        existing.value.clone_from(&incoming.value);
        existing.confidence = incoming.confidence;
    }
}

/// Parse the rider list, admitting only signed rows with informative names
/// and a confident checkbox. The signed flag falls back to the checkbox
/// state when the extraction omits it.
fn parse_riders(entry: Option<&Value>, config: &EngineConfig) -> ConfidenceValue<Vec<RiderEntry>> {
    let Some(obj) = entry.and_then(Value::as_object) else {
        return ConfidenceValue::default();
    };
    let list_confidence = coerce_confidence(obj.get("confidence"));
    let mut admitted = Vec::new();
    let items = obj.get("value").and_then(Value::as_array);
    for item in items.into_iter().flatten() {
        let Some(item) = item.as_object() else {
            continue;
        };
        let name = sub_field(item, "Name", NOT_AVAILABLE, "RidersPresent.Name");
        let present = sub_field(item, "Present", "No", "RidersPresent.Present");
        let signed_attached = if item.contains_key("SignedAttached") {
            sub_field(item, "SignedAttached", "No", "RidersPresent.SignedAttached")
        } else {
            present.clone()
        };
        let signed = normalize_yes_no(&signed_attached.value) == "Yes";
        let label = name.value.trim();
        if !signed
            || label.is_empty()
            || label == NOT_AVAILABLE
            || label == NOT_LISTED
            || present.confidence < config.rider_present_min
        {
            continue;
        }
        admitted.push(RiderEntry {
            name,
            present,
            signed_attached,
        });
    }
    if admitted.is_empty() {
        ConfidenceValue::default()
    } else {
        ConfidenceValue::new(admitted, list_confidence)
    }
}
