//! End-to-end scenarios through the public API: raw capture payloads in,
//! reconciled projection rows out.

use deedtrace_core::{CaptureLog, EngineConfig, FieldKey};
use serde_json::{json, Value};
use std::io::Write as _;

fn scalar(value: &str, confidence: f64) -> Value {
    json!({ "value": value, "confidence": confidence })
}

fn row_value<'a>(rows: &'a [deedtrace_core::ProjectedField], key: FieldKey) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.key == key)
        .map(|row| row.value.as_str())
}

#[test]
fn first_capture_projects_normalized_values() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "DocumentType": scalar("Deed Of Trust", 0.98),
            "LoanAmount": scalar("$194,000", 0.95),
            "DocumentDate": scalar("January 2nd, 2024", 0.93),
            "RecordingTime": scalar("2:27 PM", 0.91),
            "RecordingDocumentNumber": scalar("2024-0012345", 0.92),
            "PropertyAddress": scalar("1 Shore Dr, Bayville, NJ 08721", 0.94),
        },
        "summary": "A deed of trust for a Bayville property."
    }));

    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::DocumentType), Some("Deed Of Trust"));
    assert_eq!(row_value(&rows, FieldKey::LoanAmount), Some("194000.00"));
    assert_eq!(row_value(&rows, FieldKey::DocumentDate), Some("01/02/2024"));
    assert_eq!(row_value(&rows, FieldKey::RecordingTime), Some("14:27:00"));
    assert_eq!(
        row_value(&rows, FieldKey::PropertyAddress),
        Some("1 Shore Dr, Bayville, New Jersey 08721")
    );
    // A surviving document number makes the derived stamp flag projectable
    // only when its own confidence clears the bar; here it was never
    // extracted, so the flag stays hidden.
    assert_eq!(row_value(&rows, FieldKey::RecordingStampPresent), None);
}

#[test]
fn loan_amount_arbitration_prefers_the_confident_capture() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": { "LoanAmount": scalar("$194,000", 0.95) },
        "summary": "first pass"
    }));
    log.submit(&json!({
        "entities": { "LoanAmount": scalar("$195,000", 0.92) },
        "summary": "second pass"
    }));

    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::LoanAmount), Some("194000.00"));
}

#[test]
fn sub_threshold_values_never_project() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": { "LoanAmount": scalar("$194,000", 0.85) },
        "summary": "blurry photo"
    }));
    assert!(log.project().is_empty());

    // The same capture clears a relaxed threshold.
    let mut config = EngineConfig::default();
    config.display_threshold = 0.8;
    let mut relaxed = CaptureLog::new(config);
    relaxed.submit(&json!({
        "entities": { "LoanAmount": scalar("$194,000", 0.85) },
        "summary": "blurry photo"
    }));
    let rows = relaxed.project();
    assert_eq!(row_value(&rows, FieldKey::LoanAmount), Some("194000.00"));
}

#[test]
fn duplicate_captures_change_nothing() {
    let payload = json!({
        "entities": {
            "DocumentType": scalar("Mortgage", 0.97),
            "LoanAmount": scalar("$194,000", 0.95),
            "Borrower": {
                "value": [{ "Name": scalar("BORROWER: John Smith; an unmarried person", 0.96) }],
                "confidence": 0.96
            },
        },
        "summary": "a mortgage"
    });

    let mut once = CaptureLog::default();
    once.submit(&payload);
    let mut twice = CaptureLog::default();
    twice.submit(&payload);
    twice.submit(&payload);

    assert_eq!(once.project(), twice.project());
    assert_eq!(once.reconcile(), twice.reconcile());
}

#[test]
fn condo_rider_projects_under_canonical_name() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "RidersPresent": {
                "value": [
                    { "Name": scalar("Condo Rider", 0.95), "Present": scalar("yes", 0.95) },
                    { "Name": scalar("Other(s) [specify]", 0.99), "Present": scalar("yes", 0.99) },
                ],
                "confidence": 0.95
            },
        },
        "summary": "riders page"
    }));

    let rows = log.project();
    assert_eq!(
        row_value(&rows, FieldKey::RidersPresent),
        Some("Condominium Rider")
    );
}

#[test]
fn unclassified_riders_survive_via_history() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "RidersPresent": {
                "value": [
                    { "Name": scalar("Manufactured Home Rider", 0.94), "Present": scalar("yes", 0.94) },
                    { "Name": scalar("ARM Rider", 0.96), "Present": scalar("yes", 0.96) },
                ],
                "confidence": 0.95
            },
        },
        "summary": "riders page"
    }));

    let rows = log.project();
    assert_eq!(
        row_value(&rows, FieldKey::RidersPresent),
        Some("Adjustable Rate Rider, Manufactured Home Rider")
    );
}

#[test]
fn borrower_name_sanitized_in_projection() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "Borrower": {
                "value": [
                    { "Name": scalar("BORROWER: John Smith; an unmarried person", 0.96) },
                    { "Name": scalar("Borrower", 0.99) },
                ],
                "confidence": 0.96
            },
        },
        "summary": "parties"
    }));

    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::Borrower), Some("JOHN SMITH"));
}

#[test]
fn document_number_rules_hold_end_to_end() {
    // An 18-digit residue or an echo of the MIN is a misread, not a
    // document number.
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "RecordingDocumentNumber": scalar("1000123-0001234567-8", 0.95),
            "MIN": scalar("1000123-0001234567-8", 0.95),
        },
        "summary": "stamp"
    }));
    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::RecordingDocumentNumber), None);
    assert_eq!(row_value(&rows, FieldKey::Min), Some("1000123-0001234567-8"));

    // A distinct ten-digit number passes through untouched.
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": {
            "RecordingDocumentNumber": scalar("2019123456", 0.95),
            "MIN": scalar("1000123-0001234567-8", 0.95),
        },
        "summary": "stamp"
    }));
    let rows = log.project();
    assert_eq!(
        row_value(&rows, FieldKey::RecordingDocumentNumber),
        Some("2019123456")
    );
}

#[test]
fn legal_description_duplicates_collapse() {
    let segment = "LOT 7, BLOCK 2, TRACT 9012, COUNTY OF OCEAN";
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": { "LegalDescriptionDetail": scalar(segment, 0.95) },
        "summary": "page 3"
    }));
    log.submit(&json!({
        "entities": { "LegalDescriptionDetail": scalar("lot 7, block 2,  tract 9012, county of ocean", 0.93) },
        "summary": "page 3 again"
    }));
    log.submit(&json!({
        "entities": { "LegalDescriptionDetail": scalar("TOGETHER WITH ALL IMPROVEMENTS", 0.92) },
        "summary": "page 4"
    }));

    let rows = log.project();
    assert_eq!(
        row_value(&rows, FieldKey::LegalDescriptionDetail),
        Some(format!("{segment}\n\nTOGETHER WITH ALL IMPROVEMENTS").as_str())
    );
    assert_eq!(row_value(&rows, FieldKey::LegalDescriptionPresent), Some("Yes"));
}

#[test]
fn malformed_payloads_become_audit_entries() {
    let mut log = CaptureLog::default();
    log.submit(&json!({ "entities": { "DocumentType": scalar("Mortgage", 0.97) } }));
    log.submit(&json!({
        "entities": { "DocumentType": scalar("Deed Of Trust", 0.98) },
        "summary": "good capture"
    }));

    assert_eq!(log.len(), 2);
    let errors = log.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Analysis Error (Document_1_Error):"));
    assert!(errors[0].contains("missing entities or summary"));

    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::DocumentType), Some("Deed Of Trust"));
}

#[test]
fn later_captures_enrich_earlier_ones() {
    let mut log = CaptureLog::default();
    log.submit(&json!({
        "entities": { "DocumentType": scalar("Deed Of Trust", 0.97) },
        "summary": "first page only"
    }));
    log.submit(&json!({
        "entities": { "RecordingBook": scalar("1234", 0.95) },
        "summary": "stamp page"
    }));

    let first = &log.captures()[0].record;
    assert_eq!(first.recording_book.value, "1234");
    assert_eq!(first.document_type.value, "Deed Of Trust");
}

#[test]
fn settings_file_overrides_threshold() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"display_threshold\": 0.6}}").unwrap();
    let config = EngineConfig::from_json_file(file.path()).unwrap();
    let mut log = CaptureLog::new(config);
    log.submit(&json!({
        "entities": { "LenderName": scalar("First Bank", 0.65) },
        "summary": "s"
    }));
    let rows = log.project();
    assert_eq!(row_value(&rows, FieldKey::LenderName), Some("First Bank"));
}
