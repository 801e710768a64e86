//! Engine configuration: thresholds and closed vocabularies.
//!
//! All tunable behavior lives here and is injected into the engine by the
//! caller. Nothing in this crate reads configuration from ambient state;
//! construct an [`EngineConfig`] once (defaults, or [`EngineConfig::from_json_file`])
//! and pass it by reference.
//!
//! The vocabulary tables are ordered; lookups are linear scans over small
//! slices, which keeps declaration order stable in serialized form.

use crate::error::{CoreError, Result};
use crate::record::{FieldKey, FieldKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable engine configuration.
///
/// Deserializes from a JSON object in which every key is optional; missing
/// keys fall back to the built-in defaults, so a settings file may override
/// just one threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum confidence for a value to win arbitration and be displayed
    pub display_threshold: f64,
    /// Minimum checkbox confidence for a rider row to be admitted at ingest
    pub rider_present_min: f64,
    /// Canonical rider names, in checkbox order
    pub rider_allowlist: Vec<String>,
    /// Folded rider spelling -> canonical name; an empty target means
    /// "recognized but deliberately ignored"
    pub rider_aliases: Vec<(String, String)>,
    /// Two-letter region code -> full region name
    pub region_names: Vec<(String, String)>,
    /// Wire keys of scalar fields rewritten as fixed-point money amounts
    pub money_fields: Vec<String>,
    /// Wire field key -> short display label
    pub display_names: Vec<(String, String)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_threshold: 0.9,
            rider_present_min: 0.85,
            rider_allowlist: default_rider_allowlist(),
            rider_aliases: default_rider_aliases(),
            region_names: default_region_names(),
            money_fields: default_money_fields(),
            display_names: default_display_names(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration overlay from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| CoreError::config_io(path.to_path_buf(), source))?;
        let config: Self = serde_json::from_str(&text).map_err(|source| CoreError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency. Called by [`Self::from_json_file`];
    /// callers building a config by hand should call it too.
    pub fn validate(&self) -> Result<()> {
        if !self.display_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.display_threshold)
        {
            return Err(CoreError::config(format!(
                "display_threshold must be within [0.0, 1.0], got {}",
                self.display_threshold
            )));
        }
        if !self.rider_present_min.is_finite()
            || !(0.0..=1.0).contains(&self.rider_present_min)
        {
            return Err(CoreError::config(format!(
                "rider_present_min must be within [0.0, 1.0], got {}",
                self.rider_present_min
            )));
        }
        if self.rider_allowlist.is_empty() {
            return Err(CoreError::config("rider_allowlist must not be empty"));
        }
        if let Some(blank) = self.rider_allowlist.iter().find(|n| n.trim().is_empty()) {
            return Err(CoreError::config(format!(
                "rider_allowlist contains a blank entry: {blank:?}"
            )));
        }
        for (alias, target) in &self.rider_aliases {
            if alias.trim().is_empty() {
                return Err(CoreError::config("rider_aliases contains a blank alias"));
            }
            if !target.is_empty() && self.allowlisted(target).is_none() {
                return Err(CoreError::config(format!(
                    "rider alias {alias:?} maps to {target:?}, which is not in the allowlist"
                )));
            }
        }
        for (code, name) in &self.region_names {
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(CoreError::config(format!(
                    "region code {code:?} must be two uppercase ASCII letters"
                )));
            }
            if name.trim().is_empty() {
                return Err(CoreError::config(format!("region {code} has a blank name")));
            }
        }
        for entry in &self.money_fields {
            match FieldKey::from_key(entry) {
                Some(key) if key.is_scalar() => {}
                Some(_) => {
                    return Err(CoreError::config(format!(
                        "money field {entry:?} is a list field, not a scalar"
                    )));
                }
                None => {
                    return Err(CoreError::config(format!(
                        "money_fields refers to unknown field {entry:?}"
                    )));
                }
            }
        }
        for (key, label) in &self.display_names {
            if FieldKey::from_key(key).is_none() {
                return Err(CoreError::config(format!(
                    "display_names refers to unknown field {key:?}"
                )));
            }
            if label.trim().is_empty() {
                return Err(CoreError::config(format!("field {key} has a blank label")));
            }
        }
        Ok(())
    }

    /// Full region name for a two-letter code, case-insensitive.
    #[must_use = "returns the expanded region name"]
    pub fn region_name(&self, code: &str) -> Option<&str> {
        let upper = code.to_ascii_uppercase();
        self.region_names
            .iter()
            .find(|(c, _)| *c == upper)
            .map(|(_, name)| name.as_str())
    }

    /// Alias target for a folded rider spelling. `Some("")` means the
    /// spelling is recognized but must be dropped.
    #[must_use = "returns the alias target"]
    pub fn rider_alias(&self, folded: &str) -> Option<&str> {
        self.rider_aliases
            .iter()
            .find(|(alias, _)| alias == folded)
            .map(|(_, target)| target.as_str())
    }

    /// Canonical-case allowlist entry matching `name` case-insensitively.
    #[must_use = "returns the canonical rider name"]
    pub fn allowlisted(&self, name: &str) -> Option<&str> {
        self.rider_allowlist
            .iter()
            .find(|entry| entry.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Whether normalization and edits treat `key` as a money amount.
    #[must_use = "returns whether the field holds a money amount"]
    pub fn is_money_field(&self, key: FieldKey) -> bool {
        let wire = key.as_str();
        self.money_fields.iter().any(|name| name == wire)
    }

    /// Short display label for a field, if the table names one.
    #[must_use = "returns the display label"]
    pub fn display_name(&self, key: FieldKey) -> Option<&str> {
        let wire = key.as_str();
        self.display_names
            .iter()
            .find(|(k, _)| k == wire)
            .map(|(_, label)| label.as_str())
    }
}

fn default_rider_allowlist() -> Vec<String> {
    [
        "Adjustable Rate Rider",
        "1-4 Family Rider",
        "Condominium Rider",
        "Planned Unit Development Rider",
        "Second Home Rider",
        "V.A. Rider",
        "Biweekly Payment Rider",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

fn default_rider_aliases() -> Vec<(String, String)> {
    [
        ("adjustable rate rider", "Adjustable Rate Rider"),
        ("arm rider", "Adjustable Rate Rider"),
        ("1-4 family rider", "1-4 Family Rider"),
        ("1 to 4 family rider", "1-4 Family Rider"),
        ("one-to-four family rider", "1-4 Family Rider"),
        ("one to four family rider", "1-4 Family Rider"),
        ("condominium rider", "Condominium Rider"),
        ("condo rider", "Condominium Rider"),
        ("planned unit development rider", "Planned Unit Development Rider"),
        ("planned unit dev rider", "Planned Unit Development Rider"),
        ("pud rider", "Planned Unit Development Rider"),
        ("second home rider", "Second Home Rider"),
        ("v.a. rider", "V.A. Rider"),
        ("va rider", "V.A. Rider"),
        ("v a rider", "V.A. Rider"),
        ("biweekly payment rider", "Biweekly Payment Rider"),
        ("bi-weekly payment rider", "Biweekly Payment Rider"),
        ("bi weekly payment rider", "Biweekly Payment Rider"),
        // Catch-all checkbox rows carry no information; drop them.
        ("other(s) [specify]", ""),
        ("others", ""),
        ("other", ""),
    ]
    .into_iter()
    .map(|(a, t)| (a.to_owned(), t.to_owned()))
    .collect()
}

fn default_region_names() -> Vec<(String, String)> {
    [
        ("AL", "Alabama"),
        ("AK", "Alaska"),
        ("AZ", "Arizona"),
        ("AR", "Arkansas"),
        ("CA", "California"),
        ("CO", "Colorado"),
        ("CT", "Connecticut"),
        ("DE", "Delaware"),
        ("FL", "Florida"),
        ("GA", "Georgia"),
        ("HI", "Hawaii"),
        ("ID", "Idaho"),
        ("IL", "Illinois"),
        ("IN", "Indiana"),
        ("IA", "Iowa"),
        ("KS", "Kansas"),
        ("KY", "Kentucky"),
        ("LA", "Louisiana"),
        ("ME", "Maine"),
        ("MD", "Maryland"),
        ("MA", "Massachusetts"),
        ("MI", "Michigan"),
        ("MN", "Minnesota"),
        ("MS", "Mississippi"),
        ("MO", "Missouri"),
        ("MT", "Montana"),
        ("NE", "Nebraska"),
        ("NV", "Nevada"),
        ("NH", "New Hampshire"),
        ("NJ", "New Jersey"),
        ("NM", "New Mexico"),
        ("NY", "New York"),
        ("NC", "North Carolina"),
        ("ND", "North Dakota"),
        ("OH", "Ohio"),
        ("OK", "Oklahoma"),
        ("OR", "Oregon"),
        ("PA", "Pennsylvania"),
        ("RI", "Rhode Island"),
        ("SC", "South Carolina"),
        ("SD", "South Dakota"),
        ("TN", "Tennessee"),
        ("TX", "Texas"),
        ("UT", "Utah"),
        ("VT", "Vermont"),
        ("VA", "Virginia"),
        ("WA", "Washington"),
        ("WV", "West Virginia"),
        ("WI", "Wisconsin"),
        ("WY", "Wyoming"),
        ("DC", "District of Columbia"),
        ("PR", "Puerto Rico"),
        ("GU", "Guam"),
        ("VI", "U.S. Virgin Islands"),
        ("AS", "American Samoa"),
        ("MP", "Northern Mariana Islands"),
    ]
    .into_iter()
    .map(|(c, n)| (c.to_owned(), n.to_owned()))
    .collect()
}

fn default_money_fields() -> Vec<String> {
    FieldKey::ALL
        .into_iter()
        .filter(|key| key.kind() == FieldKind::Currency)
        .map(|key| key.as_str().to_owned())
        .collect()
}

fn default_display_names() -> Vec<(String, String)> {
    [
        ("DocumentType", "Doc Type"),
        ("Borrower", "Borrowers"),
        ("BorrowerAddress", "Borrower Addr."),
        ("LenderName", "Lender"),
        ("TrusteeName", "Trustee"),
        ("TrusteeAddress", "Trustee Addr."),
        ("LoanAmount", "Loan Amt."),
        ("PropertyAddress", "Prop. Addr."),
        ("DocumentDate", "Doc Date"),
        ("MaturityDate", "Maturity Date"),
        ("APN_ParcelID", "APN / Parcel ID"),
        ("RecordingStampPresent", "Rec. Stamp?"),
        ("RecordingBook", "Rec. Book"),
        ("RecordingPage", "Rec. Page"),
        ("RecordingDocumentNumber", "Rec. Doc No."),
        ("RecordingDate", "Rec. Date"),
        ("RecordingTime", "Rec. Time"),
        ("ReRecordingInformation", "Re-Rec. Info"),
        ("RecordingCost", "Rec. Cost"),
        ("RidersPresent", "Checked Riders"),
        ("InitialedChangesPresent", "Initialed Changes?"),
        ("MERS_RiderSelected", "MERS Rider Sel.?"),
        ("MERS_RiderSignedAttached", "MERS Rider Signed?"),
        ("MIN", "MIN"),
        ("LegalDescriptionPresent", "Legal Desc. Present?"),
        ("LegalDescriptionDetail", "Legal Desc. Detail"),
    ]
    .into_iter()
    .map(|(k, l)| (k.to_owned(), l.to_owned()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.display_threshold, 0.9);
        assert_eq!(config.rider_present_min, 0.85);
        assert_eq!(config.rider_allowlist.len(), 7);
        assert_eq!(config.region_names.len(), 56);
        assert_eq!(config.money_fields, ["LoanAmount", "RecordingCost"]);
        assert_eq!(config.display_names.len(), 26);
    }

    #[test]
    fn test_lookups() {
        let config = EngineConfig::default();
        assert_eq!(config.region_name("ca"), Some("California"));
        assert_eq!(config.region_name("DC"), Some("District of Columbia"));
        assert_eq!(config.region_name("ZZ"), None);
        assert_eq!(config.rider_alias("arm rider"), Some("Adjustable Rate Rider"));
        assert_eq!(config.rider_alias("other(s) [specify]"), Some(""));
        assert_eq!(config.rider_alias("unknown rider"), None);
        assert_eq!(config.allowlisted("CONDOMINIUM RIDER"), Some("Condominium Rider"));
        assert!(config.is_money_field(FieldKey::LoanAmount));
        assert!(!config.is_money_field(FieldKey::RecordingPage));
        assert_eq!(config.display_name(FieldKey::Min), Some("MIN"));
        assert_eq!(
            config.display_name(FieldKey::ApnParcelId),
            Some("APN / Parcel ID")
        );
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_partial_overlay_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"display_threshold\": 0.75}}").unwrap();
        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.display_threshold, 0.75);
        // Untouched keys keep their defaults.
        assert_eq!(config.rider_allowlist.len(), 7);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::from_json_file("/nonexistent/deedtrace.json").unwrap_err();
        assert!(matches!(err, CoreError::ConfigIo { .. }));
    }

    #[test]
    fn test_bad_json_is_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{not json").unwrap();
        let err = EngineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigFormat { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = EngineConfig::default();
        config.display_threshold = 1.5;
        assert!(config.validate().is_err());
        config.display_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_alias() {
        let mut config = EngineConfig::default();
        config
            .rider_aliases
            .push(("orphan rider".to_owned(), "No Such Rider".to_owned()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_region_code() {
        let mut config = EngineConfig::default();
        config.region_names.push(("cal".to_owned(), "California".to_owned()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_money_field() {
        let mut config = EngineConfig::default();
        config.money_fields.push("Borrower".to_owned());
        assert!(config.validate().is_err());
        config.money_fields = vec!["NotAField".to_owned()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_display_field() {
        let mut config = EngineConfig::default();
        config
            .display_names
            .push(("NotAField".to_owned(), "Nope".to_owned()));
        assert!(config.validate().is_err());
    }
}
