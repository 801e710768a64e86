//! Confidence-tagged value wrapper.
//!
//! Every extracted field carries the confidence the vision model reported for
//! it. Confidence from the model is untrusted: constructors clamp it into
//! `[0.0, 1.0]` (NaN clamps to `0.0`) so downstream arbitration can compare
//! scores without range checks.
//!
//! Absence is a sentinel, never a null: scalar fields use the literal `"N/A"`
//! and list fields use an empty `Vec`.

use serde::{Deserialize, Serialize};

/// Sentinel for an unknown scalar value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel used by extractions for fields the document does not state.
pub const NOT_LISTED: &str = "Not Listed";

/// Clamp a raw confidence score into `[0.0, 1.0]`. NaN clamps to `0.0`.
#[inline]
#[must_use = "returns the clamped confidence"]
pub fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// A value paired with the extraction confidence reported for it.
///
/// Two `ConfidenceValue`s are equal iff both the value and the confidence
/// match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceValue<T> {
    /// The extracted value, or the absent sentinel
    pub value: T,
    /// Extraction confidence in `[0.0, 1.0]`
    pub confidence: f64,
}

impl<T> ConfidenceValue<T> {
    /// Wrap a value with a clamped confidence.
    #[inline]
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
        }
    }
}

impl ConfidenceValue<String> {
    /// The absent scalar: `"N/A"` at zero confidence.
    #[must_use = "returns the absent sentinel value"]
    pub fn absent() -> Self {
        Self {
            value: NOT_AVAILABLE.to_owned(),
            confidence: 0.0,
        }
    }

    /// Wrap owned or borrowed text with a clamped confidence.
    #[inline]
    pub fn text(value: impl Into<String>, confidence: f64) -> Self {
        Self::new(value.into(), confidence)
    }

    /// Whether the value carries usable content (not a placeholder).
    #[inline]
    #[must_use = "checks the value against placeholder sentinels"]
    pub fn is_usable(&self) -> bool {
        is_usable_text(&self.value)
    }
}

impl Default for ConfidenceValue<String> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<T> Default for ConfidenceValue<Vec<T>> {
    fn default() -> Self {
        Self {
            value: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Whether a scalar string carries usable content.
///
/// The sentinels `"N/A"`, `"Not Listed"`, `"legal description is missing"`
/// and the empty string mean "unknown". A bare `"No"` is treated as a
/// placeholder too: extractions emit it for boolean fields they could not
/// verify, so it never wins arbitration or reaches the projected view.
#[must_use = "checks the value against placeholder sentinels"]
pub fn is_usable_text(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed == "No" {
        return false;
    }
    !matches!(
        trimmed.to_lowercase().as_str(),
        "" | "n/a" | "not listed" | "legal description is missing"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_clamp_confidence_range() {
        assert_eq!(clamp_confidence(0.5), 0.5);
        assert_eq!(clamp_confidence(-0.1), 0.0);
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(f64::INFINITY), 1.0);
        assert_eq!(clamp_confidence(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_new_clamps() {
        let cv = ConfidenceValue::text("Deed Of Trust", 1.3);
        assert_eq!(cv.confidence, 1.0);
        let cv = ConfidenceValue::new(vec!["a".to_owned()], -2.0);
        assert_eq!(cv.confidence, 0.0);
    }

    #[test]
    fn test_absent_sentinel() {
        let cv = ConfidenceValue::absent();
        assert_eq!(cv.value, NOT_AVAILABLE);
        assert!(!cv.is_usable());
    }

    #[test]
    fn test_usable_text() {
        assert!(is_usable_text("Deed Of Trust"));
        assert!(is_usable_text("Yes"));
        assert!(!is_usable_text("N/A"));
        assert!(!is_usable_text("n/a"));
        assert!(!is_usable_text("Not Listed"));
        assert!(!is_usable_text("  "));
        assert!(!is_usable_text("No"));
        assert!(!is_usable_text("legal description is missing"));
        // Only the exact placeholder "No" is rejected, not words containing it
        assert!(is_usable_text("Nora Smith"));
    }

    #[test]
    fn test_equality_includes_confidence() {
        let a = ConfidenceValue::text("X", 0.9);
        let b = ConfidenceValue::text("X", 0.8);
        assert_ne!(a, b);
        assert_eq!(a, ConfidenceValue::text("X", 0.9));
    }

    #[test]
    fn test_serde_shape() {
        let cv = ConfidenceValue::text("194000.00", 0.95);
        let json = serde_json::to_value(&cv).unwrap();
        assert_eq!(json["value"], "194000.00");
        assert!((json["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-9);
    }
}
