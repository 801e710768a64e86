//! # deedtrace-core
//!
//! Confidence-scored entity reconciliation for recorded mortgage documents.
//!
//! Vision extraction of a photographed deed of trust is noisy: every field
//! arrives as free text with a confidence score, spellings drift between
//! captures, and no single capture sees the whole document. This crate
//! turns any number of such captures into one trustworthy record.
//!
//! ## Pipeline
//!
//! 1. **Ingest** - parse an untrusted extraction payload against the
//!    closed 26-field schema, coercing loose types and admitting party and
//!    rider entries through their gates
//! 2. **Normalize** - rewrite each field into its per-kind normal form
//!    (dates, times, money, identifiers, region codes, Yes/No vocabulary)
//! 3. **Reconcile** - arbitrate all captures field by field on confidence,
//!    unioning the party and rider lists, and back-propagate what newer
//!    captures found into older ones
//! 4. **Project** - render only the values that clear the display
//!    threshold, with short labels and a stable row order
//!
//! ## Field Kinds
//!
//! | Kind | Example fields | Normal form |
//! |------|----------------|-------------|
//! | Text | `LenderName`, `APN_ParcelID` | verbatim |
//! | Yes/No | `MERS_RiderSelected` | `Yes`, `No`, `N/A` |
//! | Date | `DocumentDate`, `RecordingDate` | `MM/DD/YYYY` |
//! | Time | `RecordingTime` | 24-hour `HH:MM:SS` |
//! | Currency | `LoanAmount`, `RecordingCost` | two-decimal digits |
//! | Identifier | `RecordingBook`, `MIN` | digit residue with length gates |
//! | Address | `PropertyAddress` | region code expanded |
//! | Party list | `Borrower` | sanitized, identity-keyed entries |
//! | Rider list | `RidersPresent` | canonical vocabulary entries |
//! | Legal detail | `LegalDescriptionDetail` | concatenated segments |
//!
//! ## Quick Start
//!
//! ```no_run
//! use deedtrace_core::{CaptureLog, EngineConfig};
//! use serde_json::json;
//!
//! let config = EngineConfig::from_json_file("settings.json")?;
//! let mut log = CaptureLog::new(config);
//!
//! log.submit(&json!({
//!     "entities": {
//!         "DocumentType": { "value": "Deed Of Trust", "confidence": 0.98 },
//!         "LoanAmount": { "value": "$194,000", "confidence": 0.95 },
//!     },
//!     "summary": "A deed of trust recorded in Ocean County."
//! }));
//!
//! for row in log.project() {
//!     println!("{}: {}", row.label, row.value);
//! }
//! # Ok::<(), deedtrace_core::CoreError>(())
//! ```
//!
//! ## Modules
//!
//! - [`record`] - The closed field schema and capture types
//! - [`confidence`] - Confidence-tagged values and sentinels
//! - [`config`] - Injected thresholds and vocabularies
//! - [`ingest`] - Untrusted payload parsing
//! - [`normalize`] - Per-kind field normalization
//! - [`canon`] - Rider and party-name canonicalization
//! - [`merge`] - Cross-capture reconciliation
//! - [`project`] - Threshold-gated display rows and edits
//! - [`session`] - Capture lifecycle and history
//! - [`error`] - Error taxonomy and `Result` alias

pub mod canon;
pub mod config;
pub mod confidence;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod normalize;
pub mod project;
pub mod record;
pub mod session;

pub use canon::{canonical_rider_name, identity_key, sanitize_party_name};
pub use config::EngineConfig;
pub use confidence::{
    clamp_confidence, is_usable_text, ConfidenceValue, NOT_AVAILABLE, NOT_LISTED,
};
pub use error::{CoreError, Result};
pub use ingest::ingest_capture;
pub use merge::{merge_records, propagate_to_history, reconcile};
pub use normalize::{
    expand_region_code, format_currency, normalize_record, normalize_yes_no, parse_date,
    parse_time,
};
pub use project::{apply_edits, display_label, field_for_label, project, ProjectedField};
pub use record::{
    CaptureResult, DocumentRecord, FieldKey, FieldKind, IdentifierRule, PartyEntry, RiderEntry,
    PROCESSING_SUMMARY,
};
pub use session::CaptureLog;
