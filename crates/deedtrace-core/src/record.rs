//! Data model for per-capture extraction records.
//!
//! This module defines the core data structures fed through the engine:
//!
//! - [`PartyEntry`] - One borrower-like party with aliases and sub-fields
//! - [`RiderEntry`] - One rider checkbox with presence/signature flags
//! - [`DocumentRecord`] - The fixed 26-field aggregate for one capture
//! - [`FieldKey`] / [`FieldKind`] - Explicit enumeration of the closed field
//!   set and the normalization rule each field follows
//! - [`CaptureResult`] - One capture attempt: record, summary, error state
//!
//! The field set is fixed and closed. Untrusted extraction output can never
//! introduce new keys; ingest walks [`FieldKey::ALL`] and ignores everything
//! else.

use crate::canon::identity_key;
use crate::confidence::{ConfidenceValue, NOT_AVAILABLE, NOT_LISTED};
use serde::{Deserialize, Serialize};

/// Summary text used by optimistic placeholder captures.
pub const PROCESSING_SUMMARY: &str = "Processing...";

/// One named party (borrower, trustor) extracted from the instrument.
///
/// Identity across captures is the case/punctuation-normalized name; the
/// remaining sub-fields are arbitrated independently by confidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartyEntry {
    /// Sanitized party name, uppercase, role labels stripped
    #[serde(rename = "Name")]
    pub name: ConfidenceValue<String>,
    /// Also-known-as names, deduplicated union across captures
    #[serde(rename = "Alias")]
    pub aliases: ConfidenceValue<Vec<String>>,
    /// Marital/relationship wording (e.g. "HUSBAND AND WIFE")
    #[serde(rename = "Relationship")]
    pub relationship: ConfidenceValue<String>,
    /// Tenancy wording (e.g. "AS JOINT TENANTS")
    #[serde(rename = "TenantInformation")]
    pub tenancy: ConfidenceValue<String>,
}

impl PartyEntry {
    /// Identity key: lowercase alphanumeric projection of the name.
    #[must_use = "returns the merge identity key"]
    pub fn identity_key(&self) -> String {
        identity_key(&self.name.value)
    }
}

/// One rider checkbox row from the rider list of the instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiderEntry {
    /// Rider name; canonical once normalized, raw text for unclassified riders
    #[serde(rename = "Name")]
    pub name: ConfidenceValue<String>,
    /// Whether the checkbox is marked ("Yes"/"No")
    #[serde(rename = "Present")]
    pub present: ConfidenceValue<String>,
    /// Whether the rider page is signed and attached ("Yes"/"No")
    #[serde(rename = "SignedAttached")]
    pub signed_attached: ConfidenceValue<String>,
}

impl RiderEntry {
    /// Whether the rider is signed and attached.
    #[inline]
    #[must_use = "checks the signed/attached flag"]
    pub fn is_signed(&self) -> bool {
        self.signed_attached.value.trim().eq_ignore_ascii_case("yes")
    }
}

/// The fixed, closed entity record for one capture of a recorded document.
///
/// Every scalar field is a [`ConfidenceValue<String>`] using `"N/A"` as the
/// absent sentinel; the two list fields use an empty `Vec`. Serde names
/// match the extraction wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Instrument type (e.g. "Deed Of Trust", "Mortgage")
    #[serde(rename = "DocumentType")]
    pub document_type: ConfidenceValue<String>,
    /// Borrower parties
    #[serde(rename = "Borrower")]
    pub borrowers: ConfidenceValue<Vec<PartyEntry>>,
    /// Borrower mailing address
    #[serde(rename = "BorrowerAddress")]
    pub borrower_address: ConfidenceValue<String>,
    /// Lender / beneficiary name
    #[serde(rename = "LenderName")]
    pub lender_name: ConfidenceValue<String>,
    /// Trustee name (deeds of trust only)
    #[serde(rename = "TrusteeName")]
    pub trustee_name: ConfidenceValue<String>,
    /// Trustee mailing address
    #[serde(rename = "TrusteeAddress")]
    pub trustee_address: ConfidenceValue<String>,
    /// Principal amount, two-decimal digits-only string
    #[serde(rename = "LoanAmount")]
    pub loan_amount: ConfidenceValue<String>,
    /// Subject property address
    #[serde(rename = "PropertyAddress")]
    pub property_address: ConfidenceValue<String>,
    /// Execution date of the instrument, MM/DD/YYYY
    #[serde(rename = "DocumentDate")]
    pub document_date: ConfidenceValue<String>,
    /// Loan maturity date, MM/DD/YYYY
    #[serde(rename = "MaturityDate")]
    pub maturity_date: ConfidenceValue<String>,
    /// Assessor parcel number
    #[serde(rename = "APN_ParcelID")]
    pub apn_parcel_id: ConfidenceValue<String>,
    /// Derived: whether an official recording stamp was found
    #[serde(rename = "RecordingStampPresent")]
    pub recording_stamp_present: ConfidenceValue<String>,
    /// Recording book number, 1-6 digits
    #[serde(rename = "RecordingBook")]
    pub recording_book: ConfidenceValue<String>,
    /// Recording page number or page range
    #[serde(rename = "RecordingPage")]
    pub recording_page: ConfidenceValue<String>,
    /// Recorder's document/instrument number
    #[serde(rename = "RecordingDocumentNumber")]
    pub recording_document_number: ConfidenceValue<String>,
    /// Recording date, MM/DD/YYYY
    #[serde(rename = "RecordingDate")]
    pub recording_date: ConfidenceValue<String>,
    /// Recording time, 24-hour HH:MM:SS
    #[serde(rename = "RecordingTime")]
    pub recording_time: ConfidenceValue<String>,
    /// Re-recording block text when the instrument was recorded before
    #[serde(rename = "ReRecordingInformation")]
    pub re_recording_information: ConfidenceValue<String>,
    /// Recording fee; "Not Listed" when the stamp omits it
    #[serde(rename = "RecordingCost")]
    pub recording_cost: ConfidenceValue<String>,
    /// Rider checkboxes
    #[serde(rename = "RidersPresent")]
    pub riders: ConfidenceValue<Vec<RiderEntry>>,
    /// Whether handwritten changes are initialed
    #[serde(rename = "InitialedChangesPresent")]
    pub initialed_changes_present: ConfidenceValue<String>,
    /// Whether the MERS rider checkbox is selected
    #[serde(rename = "MERS_RiderSelected")]
    pub mers_rider_selected: ConfidenceValue<String>,
    /// Whether the MERS rider is signed and attached
    #[serde(rename = "MERS_RiderSignedAttached")]
    pub mers_rider_signed_attached: ConfidenceValue<String>,
    /// Mortgage Identification Number, exactly 18 digits
    #[serde(rename = "MIN")]
    pub min: ConfidenceValue<String>,
    /// Whether a legal description section exists
    #[serde(rename = "LegalDescriptionPresent")]
    pub legal_description_present: ConfidenceValue<String>,
    /// Verbatim legal description text, multi-segment across captures
    #[serde(rename = "LegalDescriptionDetail")]
    pub legal_description_detail: ConfidenceValue<String>,
}

impl Default for DocumentRecord {
    fn default() -> Self {
        Self {
            document_type: ConfidenceValue::absent(),
            borrowers: ConfidenceValue::default(),
            borrower_address: ConfidenceValue::absent(),
            lender_name: ConfidenceValue::absent(),
            trustee_name: ConfidenceValue::absent(),
            trustee_address: ConfidenceValue::absent(),
            loan_amount: ConfidenceValue::absent(),
            property_address: ConfidenceValue::absent(),
            document_date: ConfidenceValue::absent(),
            maturity_date: ConfidenceValue::absent(),
            apn_parcel_id: ConfidenceValue::absent(),
            recording_stamp_present: ConfidenceValue::absent(),
            recording_book: ConfidenceValue::absent(),
            recording_page: ConfidenceValue::absent(),
            recording_document_number: ConfidenceValue::absent(),
            recording_date: ConfidenceValue::absent(),
            recording_time: ConfidenceValue::absent(),
            re_recording_information: ConfidenceValue::absent(),
            recording_cost: ConfidenceValue::text(NOT_LISTED, 0.0),
            riders: ConfidenceValue::default(),
            initialed_changes_present: ConfidenceValue::absent(),
            mers_rider_selected: ConfidenceValue::absent(),
            mers_rider_signed_attached: ConfidenceValue::absent(),
            min: ConfidenceValue::absent(),
            legal_description_present: ConfidenceValue::absent(),
            legal_description_detail: ConfidenceValue::absent(),
        }
    }
}

/// Normalization rule for identifier fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierRule {
    /// Recording book: digits-only residue of 1-6 digits
    Book,
    /// Recording page: `a-b` range or digits-only residue of 1-5 digits
    Page,
    /// Recorder's document number: >= 6 digits, never 18, never the MIN
    DocumentNumber,
    /// MIN: exactly 18 digits, original formatting preserved
    Min,
}

/// The normalization rule a field follows.
///
/// This is the explicit per-field dispatch table: ingest, merge, and
/// projection branch on the kind instead of inspecting values at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text kept verbatim
    Text,
    /// Closed Yes/No vocabulary with synonym folding
    YesNo,
    /// Calendar date normalized to MM/DD/YYYY
    Date,
    /// Clock time normalized to 24-hour HH:MM:SS
    Time,
    /// Monetary amount normalized to a two-decimal digits-only string
    Currency,
    /// Recording identifier with digit-length gates
    Identifier(IdentifierRule),
    /// Street address with trailing region-code expansion
    Address,
    /// Structured party list, unioned by identity key
    PartyList,
    /// Structured rider list, unioned by canonical name
    RiderList,
    /// Multi-segment free text, concatenated across captures
    LegalDetail,
}

/// Keys of the closed field set, one per [`DocumentRecord`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    DocumentType,
    Borrower,
    BorrowerAddress,
    LenderName,
    TrusteeName,
    TrusteeAddress,
    LoanAmount,
    PropertyAddress,
    DocumentDate,
    MaturityDate,
    ApnParcelId,
    RecordingStampPresent,
    RecordingBook,
    RecordingPage,
    RecordingDocumentNumber,
    RecordingDate,
    RecordingTime,
    ReRecordingInformation,
    RecordingCost,
    RidersPresent,
    InitialedChangesPresent,
    MersRiderSelected,
    MersRiderSignedAttached,
    Min,
    LegalDescriptionPresent,
    LegalDescriptionDetail,
}

impl FieldKey {
    /// Every field, in record declaration order.
    pub const ALL: [FieldKey; 26] = [
        FieldKey::DocumentType,
        FieldKey::Borrower,
        FieldKey::BorrowerAddress,
        FieldKey::LenderName,
        FieldKey::TrusteeName,
        FieldKey::TrusteeAddress,
        FieldKey::LoanAmount,
        FieldKey::PropertyAddress,
        FieldKey::DocumentDate,
        FieldKey::MaturityDate,
        FieldKey::ApnParcelId,
        FieldKey::RecordingStampPresent,
        FieldKey::RecordingBook,
        FieldKey::RecordingPage,
        FieldKey::RecordingDocumentNumber,
        FieldKey::RecordingDate,
        FieldKey::RecordingTime,
        FieldKey::ReRecordingInformation,
        FieldKey::RecordingCost,
        FieldKey::RidersPresent,
        FieldKey::InitialedChangesPresent,
        FieldKey::MersRiderSelected,
        FieldKey::MersRiderSignedAttached,
        FieldKey::Min,
        FieldKey::LegalDescriptionPresent,
        FieldKey::LegalDescriptionDetail,
    ];

    /// The wire key used by the extraction payload and display tables.
    #[must_use = "returns the wire key"]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::DocumentType => "DocumentType",
            FieldKey::Borrower => "Borrower",
            FieldKey::BorrowerAddress => "BorrowerAddress",
            FieldKey::LenderName => "LenderName",
            FieldKey::TrusteeName => "TrusteeName",
            FieldKey::TrusteeAddress => "TrusteeAddress",
            FieldKey::LoanAmount => "LoanAmount",
            FieldKey::PropertyAddress => "PropertyAddress",
            FieldKey::DocumentDate => "DocumentDate",
            FieldKey::MaturityDate => "MaturityDate",
            FieldKey::ApnParcelId => "APN_ParcelID",
            FieldKey::RecordingStampPresent => "RecordingStampPresent",
            FieldKey::RecordingBook => "RecordingBook",
            FieldKey::RecordingPage => "RecordingPage",
            FieldKey::RecordingDocumentNumber => "RecordingDocumentNumber",
            FieldKey::RecordingDate => "RecordingDate",
            FieldKey::RecordingTime => "RecordingTime",
            FieldKey::ReRecordingInformation => "ReRecordingInformation",
            FieldKey::RecordingCost => "RecordingCost",
            FieldKey::RidersPresent => "RidersPresent",
            FieldKey::InitialedChangesPresent => "InitialedChangesPresent",
            FieldKey::MersRiderSelected => "MERS_RiderSelected",
            FieldKey::MersRiderSignedAttached => "MERS_RiderSignedAttached",
            FieldKey::Min => "MIN",
            FieldKey::LegalDescriptionPresent => "LegalDescriptionPresent",
            FieldKey::LegalDescriptionDetail => "LegalDescriptionDetail",
        }
    }

    /// Parse a wire key back into a field key.
    #[must_use = "returns the parsed field key"]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == key)
    }

    /// The normalization rule this field follows.
    #[must_use = "returns the field kind"]
    pub fn kind(self) -> FieldKind {
        match self {
            FieldKey::DocumentType
            | FieldKey::BorrowerAddress
            | FieldKey::LenderName
            | FieldKey::TrusteeName
            | FieldKey::TrusteeAddress
            | FieldKey::ApnParcelId
            | FieldKey::ReRecordingInformation => FieldKind::Text,
            FieldKey::RecordingStampPresent
            | FieldKey::InitialedChangesPresent
            | FieldKey::MersRiderSelected
            | FieldKey::MersRiderSignedAttached
            | FieldKey::LegalDescriptionPresent => FieldKind::YesNo,
            FieldKey::DocumentDate | FieldKey::MaturityDate | FieldKey::RecordingDate => {
                FieldKind::Date
            }
            FieldKey::RecordingTime => FieldKind::Time,
            FieldKey::LoanAmount | FieldKey::RecordingCost => FieldKind::Currency,
            FieldKey::RecordingBook => FieldKind::Identifier(IdentifierRule::Book),
            FieldKey::RecordingPage => FieldKind::Identifier(IdentifierRule::Page),
            FieldKey::RecordingDocumentNumber => {
                FieldKind::Identifier(IdentifierRule::DocumentNumber)
            }
            FieldKey::Min => FieldKind::Identifier(IdentifierRule::Min),
            FieldKey::PropertyAddress => FieldKind::Address,
            FieldKey::Borrower => FieldKind::PartyList,
            FieldKey::RidersPresent => FieldKind::RiderList,
            FieldKey::LegalDescriptionDetail => FieldKind::LegalDetail,
        }
    }

    /// Whether the field carries a single `ConfidenceValue<String>` rather
    /// than one of the two list columns.
    #[must_use = "returns whether the field is scalar"]
    pub fn is_scalar(self) -> bool {
        !matches!(self, FieldKey::Borrower | FieldKey::RidersPresent)
    }

    /// The sentinel a missing or unusable extraction of this field degrades
    /// to. Extractions report the recording cost as `"Not Listed"` rather
    /// than `"N/A"`; every other scalar uses the common absent sentinel.
    #[must_use = "returns the absent sentinel text"]
    pub fn absent_text(self) -> &'static str {
        match self {
            FieldKey::RecordingCost => NOT_LISTED,
            _ => NOT_AVAILABLE,
        }
    }
}

impl DocumentRecord {
    /// Borrow a scalar field by key. `None` for the two list fields.
    #[must_use = "returns the scalar field"]
    pub fn scalar(&self, key: FieldKey) -> Option<&ConfidenceValue<String>> {
        match key {
            FieldKey::DocumentType => Some(&self.document_type),
            FieldKey::Borrower | FieldKey::RidersPresent => None,
            FieldKey::BorrowerAddress => Some(&self.borrower_address),
            FieldKey::LenderName => Some(&self.lender_name),
            FieldKey::TrusteeName => Some(&self.trustee_name),
            FieldKey::TrusteeAddress => Some(&self.trustee_address),
            FieldKey::LoanAmount => Some(&self.loan_amount),
            FieldKey::PropertyAddress => Some(&self.property_address),
            FieldKey::DocumentDate => Some(&self.document_date),
            FieldKey::MaturityDate => Some(&self.maturity_date),
            FieldKey::ApnParcelId => Some(&self.apn_parcel_id),
            FieldKey::RecordingStampPresent => Some(&self.recording_stamp_present),
            FieldKey::RecordingBook => Some(&self.recording_book),
            FieldKey::RecordingPage => Some(&self.recording_page),
            FieldKey::RecordingDocumentNumber => Some(&self.recording_document_number),
            FieldKey::RecordingDate => Some(&self.recording_date),
            FieldKey::RecordingTime => Some(&self.recording_time),
            FieldKey::ReRecordingInformation => Some(&self.re_recording_information),
            FieldKey::RecordingCost => Some(&self.recording_cost),
            FieldKey::InitialedChangesPresent => Some(&self.initialed_changes_present),
            FieldKey::MersRiderSelected => Some(&self.mers_rider_selected),
            FieldKey::MersRiderSignedAttached => Some(&self.mers_rider_signed_attached),
            FieldKey::Min => Some(&self.min),
            FieldKey::LegalDescriptionPresent => Some(&self.legal_description_present),
            FieldKey::LegalDescriptionDetail => Some(&self.legal_description_detail),
        }
    }

    /// Mutably borrow a scalar field by key. `None` for the two list fields.
    pub fn scalar_mut(&mut self, key: FieldKey) -> Option<&mut ConfidenceValue<String>> {
        match key {
            FieldKey::DocumentType => Some(&mut self.document_type),
            FieldKey::Borrower | FieldKey::RidersPresent => None,
            FieldKey::BorrowerAddress => Some(&mut self.borrower_address),
            FieldKey::LenderName => Some(&mut self.lender_name),
            FieldKey::TrusteeName => Some(&mut self.trustee_name),
            FieldKey::TrusteeAddress => Some(&mut self.trustee_address),
            FieldKey::LoanAmount => Some(&mut self.loan_amount),
            FieldKey::PropertyAddress => Some(&mut self.property_address),
            FieldKey::DocumentDate => Some(&mut self.document_date),
            FieldKey::MaturityDate => Some(&mut self.maturity_date),
            FieldKey::ApnParcelId => Some(&mut self.apn_parcel_id),
            FieldKey::RecordingStampPresent => Some(&mut self.recording_stamp_present),
            FieldKey::RecordingBook => Some(&mut self.recording_book),
            FieldKey::RecordingPage => Some(&mut self.recording_page),
            FieldKey::RecordingDocumentNumber => Some(&mut self.recording_document_number),
            FieldKey::RecordingDate => Some(&mut self.recording_date),
            FieldKey::RecordingTime => Some(&mut self.recording_time),
            FieldKey::ReRecordingInformation => Some(&mut self.re_recording_information),
            FieldKey::RecordingCost => Some(&mut self.recording_cost),
            FieldKey::InitialedChangesPresent => Some(&mut self.initialed_changes_present),
            FieldKey::MersRiderSelected => Some(&mut self.mers_rider_selected),
            FieldKey::MersRiderSignedAttached => Some(&mut self.mers_rider_signed_attached),
            FieldKey::Min => Some(&mut self.min),
            FieldKey::LegalDescriptionPresent => Some(&mut self.legal_description_present),
            FieldKey::LegalDescriptionDetail => Some(&mut self.legal_description_detail),
        }
    }
}

/// One capture attempt: the extracted record plus its summary and error
/// state.
///
/// Error captures stay in history for audit but contribute nothing to
/// merges. Placeholder captures are shown optimistically while a capture is
/// being analyzed and are replaced in place on completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureResult {
    /// The normalized per-capture record
    pub record: DocumentRecord,
    /// Plain-English summary returned by the extraction
    pub summary: String,
    /// Hard parse error, if the capture payload violated the contract
    pub error: Option<String>,
    /// Stable identifier for this capture within its session
    pub capture_id: String,
}

impl CaptureResult {
    /// A completed capture with no error.
    #[must_use = "returns the capture result"]
    pub fn new(record: DocumentRecord, summary: impl Into<String>, capture_id: impl Into<String>) -> Self {
        Self {
            record,
            summary: summary.into(),
            error: None,
            capture_id: capture_id.into(),
        }
    }

    /// An optimistic placeholder shown while analysis is in flight.
    #[must_use = "returns the placeholder capture"]
    pub fn processing(capture_id: impl Into<String>) -> Self {
        Self {
            record: DocumentRecord::default(),
            summary: PROCESSING_SUMMARY.to_owned(),
            error: None,
            capture_id: capture_id.into(),
        }
    }

    /// A failed capture preserved verbatim for audit.
    #[must_use = "returns the error capture"]
    pub fn failed(capture_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            record: DocumentRecord::default(),
            summary: String::new(),
            error: Some(message.into()),
            capture_id: capture_id.into(),
        }
    }

    /// Whether this is an in-flight placeholder.
    #[inline]
    #[must_use = "checks for the placeholder state"]
    pub fn is_processing(&self) -> bool {
        self.error.is_none() && self.summary == PROCESSING_SUMMARY
    }

    /// Whether this capture may contribute values to merges.
    #[inline]
    #[must_use = "checks merge eligibility"]
    pub fn contributes(&self) -> bool {
        self.error.is_none()
    }
}
