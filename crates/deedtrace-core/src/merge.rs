//! Cross-capture reconciliation.
//!
//! Multiple captures of the same document disagree: a skewed photo reads
//! the loan amount poorly, a second pass catches the recording stamp the
//! first one missed. This module turns a capture history into one best
//! record and keeps the per-capture records converging over time.
//!
//! ## Arbitration rules
//!
//! - **Scalars**: the most confident usable value at or above the display
//!   threshold wins; ties keep the earliest capture's value. Nothing
//!   qualifying leaves the field at its default sentinel.
//! - **Borrowers**: entries are unioned across captures by identity key.
//!   A strictly more confident name takes the entry over; its sub-fields
//!   only ride along when they clear the threshold themselves.
//! - **Riders**: only signed riders with confident, canonical names
//!   participate, deduplicated by canonical name.
//! - **Legal description**: usable, confident segments are deduplicated by
//!   folded text and concatenated in capture order; the presence flag is
//!   derived from whether any segment survived.
//!
//! [`merge_records`] is the gentler pairwise variant used to enrich older
//! captures with what later ones found ([`propagate_to_history`]): it
//! fills gaps and upgrades on strictly higher confidence without applying
//! display gates.

use crate::canon::canonical_rider_name;
use crate::config::EngineConfig;
use crate::confidence::{is_usable_text, ConfidenceValue, NOT_AVAILABLE};
use crate::ingest::{union_aliases, upgrade_text};
use crate::record::{CaptureResult, DocumentRecord, FieldKey, PartyEntry, RiderEntry};
use tracing::debug;

/// Reconcile a capture history into one best-of record.
///
/// Error captures are ignored. With no contributing capture the default
/// record is returned unchanged.
#[must_use = "returns the reconciled record"]
pub fn reconcile(history: &[CaptureResult], config: &EngineConfig) -> DocumentRecord {
    let contributions: Vec<&DocumentRecord> = history
        .iter()
        .filter(|capture| capture.contributes())
        .map(|capture| &capture.record)
        .collect();
    if contributions.is_empty() {
        return DocumentRecord::default();
    }
    let threshold = config.display_threshold;
    let mut merged = DocumentRecord::default();

    merge_legal(&mut merged, &contributions, threshold);
    merge_borrowers(&mut merged, &contributions, threshold);
    merge_riders(&mut merged, &contributions, threshold, config);
    merge_scalars(&mut merged, &contributions, threshold);

    debug!(
        captures = contributions.len(),
        "reconciled capture history"
    );
    merged
}

/// Collect usable legal-description segments and derive the presence flag.
fn merge_legal(merged: &mut DocumentRecord, contributions: &[&DocumentRecord], threshold: f64) {
    let mut seen: Vec<String> = Vec::new();
    let mut segments: Vec<&str> = Vec::new();
    let mut confidence = 0.0f64;
    for record in contributions {
        let detail = &record.legal_description_detail;
        if !detail.is_usable() || detail.confidence < threshold {
            continue;
        }
        let folded = detail
            .value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        segments.push(&detail.value);
        confidence = confidence.max(detail.confidence);
    }
    if segments.is_empty() {
        merged.legal_description_present = ConfidenceValue::text("No", 0.0);
    } else {
        merged.legal_description_detail = ConfidenceValue::text(segments.join("\n\n"), confidence);
        merged.legal_description_present = ConfidenceValue::text("Yes", confidence);
    }
}

/// Clone a party for adoption into the merged list, clearing sub-fields
/// that do not clear the threshold on their own.
fn adopt_party(party: &PartyEntry, threshold: f64) -> PartyEntry {
    let mut adopted = party.clone();
    if adopted.aliases.confidence < threshold {
        adopted.aliases.value.clear();
    }
    if adopted.relationship.confidence < threshold {
        adopted.relationship.value = NOT_AVAILABLE.to_owned();
    }
    if adopted.tenancy.confidence < threshold {
        adopted.tenancy.value = NOT_AVAILABLE.to_owned();
    }
    adopted
}

/// Adopt the incoming text when it clears the threshold and is strictly
/// more confident than what is already there.
fn threshold_upgrade(
    existing: &mut ConfidenceValue<String>,
    incoming: &ConfidenceValue<String>,
    threshold: f64,
) {
    if incoming.confidence >= threshold && incoming.confidence > existing.confidence {
        existing.value.clone_from(&incoming.value);
        existing.confidence = incoming.confidence;
    }
}

fn merge_borrowers(merged: &mut DocumentRecord, contributions: &[&DocumentRecord], threshold: f64) {
    let mut keyed: Vec<(String, PartyEntry)> = Vec::new();
    let mut list_confidence = 0.0f64;
    for record in contributions {
        list_confidence = list_confidence.max(record.borrowers.confidence);
        for party in &record.borrowers.value {
            if !party.name.is_usable() || party.name.confidence < threshold {
                continue;
            }
            let key = party.identity_key();
            if key.is_empty() {
                continue;
            }
            match keyed.iter_mut().find(|(existing, _)| *existing == key) {
                None => keyed.push((key, adopt_party(party, threshold))),
                Some((_, existing)) => {
                    if party.name.confidence > existing.name.confidence {
                        *existing = adopt_party(party, threshold);
                    } else {
                        if party.aliases.confidence >= threshold {
                            union_aliases(&mut existing.aliases, &party.aliases);
                        }
                        threshold_upgrade(&mut existing.relationship, &party.relationship, threshold);
                        threshold_upgrade(&mut existing.tenancy, &party.tenancy, threshold);
                    }
                }
            }
        }
    }
    if keyed.is_empty() {
        return;
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let entries = keyed.into_iter().map(|(_, party)| party).collect();
    merged.borrowers = ConfidenceValue::new(entries, list_confidence);
}

fn merge_riders(
    merged: &mut DocumentRecord,
    contributions: &[&DocumentRecord],
    threshold: f64,
    config: &EngineConfig,
) {
    let mut keyed: Vec<(String, RiderEntry)> = Vec::new();
    let mut list_confidence = 0.0f64;
    for record in contributions {
        list_confidence = list_confidence.max(record.riders.confidence);
        for rider in &record.riders.value {
            if !rider.is_signed() || !rider.name.is_usable() || rider.name.confidence < threshold {
                continue;
            }
            let Some(canonical) = canonical_rider_name(&rider.name.value, config) else {
                continue;
            };
            let candidate = RiderEntry {
                name: ConfidenceValue::text(canonical.clone(), rider.name.confidence),
                present: rider.present.clone(),
                signed_attached: rider.signed_attached.clone(),
            };
            match keyed.iter_mut().find(|(existing, _)| *existing == canonical) {
                None => keyed.push((canonical, candidate)),
                Some((_, existing)) => {
                    if candidate.name.confidence > existing.name.confidence {
                        *existing = candidate;
                    }
                }
            }
        }
    }
    if keyed.is_empty() {
        return;
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let entries = keyed.into_iter().map(|(_, rider)| rider).collect();
    merged.riders = ConfidenceValue::new(entries, list_confidence);
}

fn merge_scalars(merged: &mut DocumentRecord, contributions: &[&DocumentRecord], threshold: f64) {
    for key in FieldKey::ALL {
        if matches!(
            key,
            FieldKey::LegalDescriptionPresent | FieldKey::LegalDescriptionDetail
        ) {
            continue;
        }
        let mut best: Option<&ConfidenceValue<String>> = None;
        for record in contributions {
            let Some(field) = record.scalar(key) else {
                continue;
            };
            if !field.is_usable() || field.confidence < threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => field.confidence > current.confidence,
            };
            if better {
                best = Some(field);
            }
        }
        if let (Some(winner), Some(slot)) = (best, merged.scalar_mut(key)) {
            *slot = winner.clone();
        }
    }
}

/// Pairwise merge used for history back-propagation.
///
/// Scalars take the incoming value only when it is usable and strictly
/// more confident, or when the base value is itself unusable. Lists union
/// in base-then-incoming order. The legal presence flag is re-derived from
/// the merged detail text afterwards.
#[must_use = "returns the merged record"]
pub fn merge_records(base: &DocumentRecord, incoming: &DocumentRecord) -> DocumentRecord {
    let mut merged = DocumentRecord::default();
    for key in FieldKey::ALL {
        let (Some(base_field), Some(slot)) = (base.scalar(key), merged.scalar_mut(key)) else {
            continue;
        };
        let incoming_field = match incoming.scalar(key) {
            Some(field) => field,
            None => continue,
        };
        let take_incoming = (incoming_field.confidence > base_field.confidence
            && is_usable_text(&incoming_field.value))
            || !is_usable_text(&base_field.value);
        *slot = if take_incoming {
            incoming_field.clone()
        } else {
            base_field.clone()
        };
    }
    merged.borrowers = merge_party_lists(&base.borrowers, &incoming.borrowers);
    merged.riders = merge_rider_lists(&base.riders, &incoming.riders);
    harmonize_legal_presence(&mut merged);
    merged
}

fn merge_party_lists(
    base: &ConfidenceValue<Vec<PartyEntry>>,
    incoming: &ConfidenceValue<Vec<PartyEntry>>,
) -> ConfidenceValue<Vec<PartyEntry>> {
    let mut keyed: Vec<(String, PartyEntry)> = base
        .value
        .iter()
        .map(|party| (party.identity_key(), party.clone()))
        .collect();
    for party in &incoming.value {
        let key = party.identity_key();
        match keyed.iter_mut().find(|(existing, _)| *existing == key) {
            None => keyed.push((key, party.clone())),
            Some((_, existing)) => {
                if party.name.confidence > existing.name.confidence {
                    *existing = party.clone();
                } else {
                    union_aliases(&mut existing.aliases, &party.aliases);
                    upgrade_text(&mut existing.relationship, &party.relationship);
                    upgrade_text(&mut existing.tenancy, &party.tenancy);
                }
            }
        }
    }
    ConfidenceValue::new(
        keyed.into_iter().map(|(_, party)| party).collect(),
        base.confidence.max(incoming.confidence),
    )
}

fn merge_rider_lists(
    base: &ConfidenceValue<Vec<RiderEntry>>,
    incoming: &ConfidenceValue<Vec<RiderEntry>>,
) -> ConfidenceValue<Vec<RiderEntry>> {
    let mut keyed: Vec<(String, RiderEntry)> = Vec::new();
    for rider in base.value.iter().chain(&incoming.value) {
        let key = rider.name.value.clone();
        if key.trim().is_empty() {
            continue;
        }
        match keyed.iter_mut().find(|(existing, _)| *existing == key) {
            None => keyed.push((key, rider.clone())),
            Some((_, existing)) => {
                if rider.name.confidence > existing.name.confidence {
                    *existing = rider.clone();
                }
            }
        }
    }
    ConfidenceValue::new(
        keyed.into_iter().map(|(_, rider)| rider).collect(),
        base.confidence.max(incoming.confidence),
    )
}

/// Keep the legal presence flag consistent with the merged detail text.
fn harmonize_legal_presence(merged: &mut DocumentRecord) {
    let detail = &merged.legal_description_detail;
    let text = detail.value.trim();
    let informative = !text.is_empty()
        && !matches!(
            text.to_lowercase().as_str(),
            "n/a" | "not listed" | "legal description is missing"
        );
    let detail_confidence = detail.confidence;
    let present = &mut merged.legal_description_present;
    if informative {
        present.value = "Yes".to_owned();
    } else if present.value != "No" && present.value != "N/A" {
        present.value = "No".to_owned();
    }
    present.confidence = present.confidence.max(detail_confidence);
}

/// Enrich every other non-error capture in the history with what the
/// capture at `exclude` found.
pub fn propagate_to_history(history: &mut [CaptureResult], source: &DocumentRecord, exclude: usize) {
    for (index, capture) in history.iter_mut().enumerate() {
        if index == exclude || capture.error.is_some() {
            continue;
        }
        capture.record = merge_records(&capture.record, source);
    }
}
