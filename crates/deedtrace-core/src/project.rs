//! Threshold-gated projection of a reconciled record into display rows.
//!
//! Projection is the one place values become user-visible, and it is
//! deliberately stricter than storage: a field only earns a row when its
//! value is usable and its confidence clears the display threshold. Rows
//! are ordered by wire key, with the legal-description pair appended at
//! the end of the table.
//!
//! The reverse path lives here too: [`apply_edits`] writes operator
//! corrections back onto a record by display label, re-normalizing money
//! amounts and keeping the legal presence flag consistent with edited
//! detail text.

use crate::canon::canonical_rider_name;
use crate::config::EngineConfig;
use crate::confidence::is_usable_text;
use crate::normalize::format_currency;
use crate::record::{CaptureResult, DocumentRecord, FieldKey, FieldKind};
use tracing::warn;

/// One display row of the projected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedField {
    /// Field this row projects
    pub key: FieldKey,
    /// Short human-readable label
    pub label: String,
    /// Display-ready value text
    pub value: String,
}

/// Display label for a field: the configured short label, or the wire key
/// title-cased as a fallback.
#[must_use = "returns the display label"]
pub fn display_label(config: &EngineConfig, key: FieldKey) -> String {
    match config.display_name(key) {
        Some(label) => label.to_owned(),
        None => title_case(&key.as_str().replace('_', " ")),
    }
}

/// Resolve a display label back to its field. Exact labels resolve through
/// the display table; anything else is title-concatenated and tried as a
/// wire key, so "loan amount" still finds `LoanAmount`.
#[must_use = "returns the resolved field key"]
pub fn field_for_label(config: &EngineConfig, label: &str) -> Option<FieldKey> {
    let wanted = label.trim();
    for key in FieldKey::ALL {
        if config.display_name(key) == Some(wanted) {
            return Some(key);
        }
    }
    let collapsed: String = title_case(wanted).split_whitespace().collect();
    FieldKey::from_key(&collapsed)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Project a reconciled record into ordered display rows.
///
/// `history` supplies the fallback for riders the vocabulary does not
/// know: confidently signed but unclassified rider names surface under
/// their raw spelling rather than disappearing.
#[must_use = "returns the display rows"]
pub fn project(
    record: &DocumentRecord,
    history: &[CaptureResult],
    config: &EngineConfig,
) -> Vec<ProjectedField> {
    let threshold = config.display_threshold;
    let mut rows: Vec<ProjectedField> = Vec::new();

    for key in FieldKey::ALL {
        if matches!(
            key,
            FieldKey::LegalDescriptionPresent | FieldKey::LegalDescriptionDetail
        ) {
            continue;
        }
        let value = match key.kind() {
            FieldKind::PartyList => borrower_cell(record, threshold),
            FieldKind::RiderList => rider_cell(record, history, config),
            _ => {
                let Some(field) = record.scalar(key) else {
                    continue;
                };
                if !field.is_usable() || field.confidence < threshold {
                    None
                } else if config.is_money_field(key) {
                    Some(format_currency(&field.value).unwrap_or_else(|| field.value.clone()))
                } else {
                    Some(field.value.clone())
                }
            }
        };
        let Some(value) = value else {
            continue;
        };
        if !is_usable_text(&value) {
            continue;
        }
        rows.push(ProjectedField {
            key,
            label: display_label(config, key),
            value,
        });
    }
    rows.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));

    // The legal pair always closes the table and gates on confidence
    // alone: the reconciler already derived a truthful Yes/No value.
    let present = &record.legal_description_present;
    if present.confidence >= threshold {
        rows.push(ProjectedField {
            key: FieldKey::LegalDescriptionPresent,
            label: display_label(config, FieldKey::LegalDescriptionPresent),
            value: present.value.clone(),
        });
    }
    let detail = &record.legal_description_detail;
    if detail.confidence >= threshold {
        rows.push(ProjectedField {
            key: FieldKey::LegalDescriptionDetail,
            label: display_label(config, FieldKey::LegalDescriptionDetail),
            value: detail.value.clone(),
        });
    }
    rows
}

/// Render the borrower list, applying per-subfield gates. `None` when no
/// entry qualifies.
fn borrower_cell(record: &DocumentRecord, threshold: f64) -> Option<String> {
    let mut entries: Vec<String> = Vec::new();
    for party in &record.borrowers.value {
        if !party.name.is_usable() || party.name.confidence < threshold {
            continue;
        }
        let mut parts = vec![party.name.value.to_uppercase()];
        if party.aliases.confidence >= threshold && !party.aliases.value.is_empty() {
            parts.push(party.aliases.value.join(", "));
        }
        if party.relationship.confidence >= threshold && party.relationship.is_usable() {
            parts.push(party.relationship.value.to_uppercase());
        }
        if party.tenancy.confidence >= threshold && party.tenancy.is_usable() {
            parts.push(party.tenancy.value.to_uppercase());
        }
        entries.push(parts.join("; "));
    }
    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}

/// Render the rider list: canonical signed riders from the reconciled
/// record plus confidently signed unclassified names from the history,
/// deduplicated and sorted.
fn rider_cell(
    record: &DocumentRecord,
    history: &[CaptureResult],
    config: &EngineConfig,
) -> Option<String> {
    let threshold = config.display_threshold;
    let mut names: Vec<String> = Vec::new();
    for rider in &record.riders.value {
        if !rider.is_signed() || !rider.name.is_usable() || rider.name.confidence < threshold {
            continue;
        }
        let name = canonical_rider_name(&rider.name.value, config)
            .unwrap_or_else(|| rider.name.value.clone());
        if !names.contains(&name) {
            names.push(name);
        }
    }
    for capture in history {
        if !capture.contributes() {
            continue;
        }
        for rider in &capture.record.riders.value {
            if !rider.is_signed() || !rider.name.is_usable() || rider.name.confidence < threshold {
                continue;
            }
            if canonical_rider_name(&rider.name.value, config).is_some() {
                continue;
            }
            let name = rider.name.value.clone();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    if names.is_empty() {
        return None;
    }
    names.sort();
    Some(names.join(", "))
}

/// Write operator corrections back onto a record by display label.
///
/// Values are taken as-is apart from trimming; money amounts are
/// re-normalized when they parse. Confidence is never touched by an edit.
/// The two list fields cannot be edited as text and are skipped.
pub fn apply_edits(record: &mut DocumentRecord, edits: &[(String, String)], config: &EngineConfig) {
    for (label, new_value) in edits {
        let Some(key) = field_for_label(config, label) else {
            warn!(label = label.as_str(), "edit targets an unknown field label");
            continue;
        };
        if matches!(key.kind(), FieldKind::PartyList | FieldKind::RiderList) {
            warn!(
                field = key.as_str(),
                "structured list fields cannot be edited as plain text"
            );
            continue;
        }
        let trimmed = new_value.trim();
        let Some(field) = record.scalar_mut(key) else {
            continue;
        };
        field.value = if config.is_money_field(key) {
            format_currency(trimmed).unwrap_or_else(|| trimmed.to_owned())
        } else {
            trimmed.to_owned()
        };
        if key == FieldKey::LegalDescriptionDetail {
            let informative = !trimmed.is_empty()
                && trimmed != "N/A"
                && trimmed != "legal description is missing";
            record.legal_description_present.value =
                if informative { "Yes" } else { "No" }.to_owned();
        }
    }
}
