//! Canonicalization of rider names and party identities.
//!
//! Extraction text for the same real-world thing varies wildly between
//! captures ("ARM Rider" vs "Adjustable Rate Rider", "BORROWER: John
//! Smith" vs "John Smith"). This module folds those spellings into stable
//! forms so cross-capture merging can key on equality:
//!
//! - [`classify_rider_name`] maps a checkbox label onto the configured
//!   allowlist via the alias table, distinguishing labels that are
//!   deliberately ignored from ones that are merely unrecognized
//! - [`sanitize_party_name`] strips role prefixes and marital/tenancy
//!   tails from a party name and uppercases the remainder
//! - [`identity_key`] reduces a name to its lowercase alphanumeric core

use crate::config::EngineConfig;
use regex::Regex;
use std::sync::LazyLock;

static RE_ROLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:the\s+)?(?:borrowers?|mortgagors?|trustors?|owners?)\b\s*[:;,\-]*\s*")
        .expect("valid role prefix regex")
});
static RE_ROLE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:borrowers?|mortgagors?|trustors?|owners?)$")
        .expect("valid role word regex")
});
static RE_LEADING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,;:\-]+").expect("valid leading punct regex"));
static RE_MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid multi space regex"));
static RE_MARITAL_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.*?)(?:\s*[;,]\s*(?:AN?\s+)?(?:UNMARRIED|MARRIED|SINGLE|HUSBAND|WIFE|WIDOW|WIDOWER|SPOUSE|JOINT|TENANCY|TENANTS|COMMUNITY|SEVERALTY|BY THE ENTIRETY|IN COMMON).*)$",
    )
    .expect("valid marital tail regex")
});

/// Outcome of classifying a raw rider checkbox label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiderName {
    /// Folded onto an allowlist entry, canonical casing
    Canonical(String),
    /// Recognized as a catch-all row that carries no information
    Ignored,
    /// Not in the vocabulary; kept under its raw name
    Unrecognized,
}

/// Classify a rider checkbox label against the configured vocabulary.
///
/// The label is hyphen-folded, whitespace-collapsed, and lowercased before
/// the alias table and allowlist are consulted.
#[must_use = "returns the classification"]
pub fn classify_rider_name(raw: &str, config: &EngineConfig) -> RiderName {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return RiderName::Ignored;
    }
    let folded: String = trimmed
        .chars()
        .map(|c| if ('\u{2010}'..='\u{2015}').contains(&c) { '-' } else { c })
        .collect();
    let folded = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    let folded = folded.to_lowercase();
    if let Some(target) = config.rider_alias(&folded) {
        if target.is_empty() {
            return RiderName::Ignored;
        }
        return RiderName::Canonical(target.to_owned());
    }
    match config.allowlisted(&folded) {
        Some(canonical) => RiderName::Canonical(canonical.to_owned()),
        None => RiderName::Unrecognized,
    }
}

/// Canonical allowlist name for a rider label, if it folds onto one.
#[must_use = "returns the canonical rider name"]
pub fn canonical_rider_name(raw: &str, config: &EngineConfig) -> Option<String> {
    match classify_rider_name(raw, config) {
        RiderName::Canonical(name) => Some(name),
        RiderName::Ignored | RiderName::Unrecognized => None,
    }
}

/// Sanitize an extracted party name.
///
/// Leading role labels ("BORROWER:", "The Mortgagors,") are stripped to a
/// fixed point, marital and tenancy tails are cut, and the remainder is
/// uppercased. Returns `None` when nothing but a role label was extracted.
#[must_use = "returns the sanitized name"]
pub fn sanitize_party_name(raw: &str) -> Option<String> {
    let mut name = raw.trim().to_owned();
    loop {
        let stripped = RE_ROLE_PREFIX.replace(&name, "").trim().to_owned();
        if stripped == name {
            break;
        }
        name = stripped;
    }
    if name.is_empty() || RE_ROLE_ONLY.is_match(&name) {
        return None;
    }
    let name = RE_LEADING_PUNCT.replace(&name, "");
    let name = RE_MULTI_SPACE.replace_all(&name, " ");
    let name = name.to_uppercase();
    let name = match RE_MARITAL_TAIL.captures(&name) {
        Some(caps) => caps[1].trim().to_owned(),
        None => name,
    };
    if name.is_empty() {
        return None;
    }
    Some(name)
}

/// Lowercase alphanumeric core of a name, used as the cross-capture merge
/// key for parties.
#[must_use = "returns the identity key"]
pub fn identity_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_aliases_and_allowlist() {
        let config = EngineConfig::default();
        assert_eq!(
            classify_rider_name("ARM Rider", &config),
            RiderName::Canonical("Adjustable Rate Rider".to_owned())
        );
        assert_eq!(
            classify_rider_name("condo   rider", &config),
            RiderName::Canonical("Condominium Rider".to_owned())
        );
        assert_eq!(
            classify_rider_name("1\u{2013}4 Family Rider", &config),
            RiderName::Canonical("1-4 Family Rider".to_owned())
        );
        assert_eq!(
            classify_rider_name("PLANNED UNIT DEVELOPMENT RIDER", &config),
            RiderName::Canonical("Planned Unit Development Rider".to_owned())
        );
        assert_eq!(classify_rider_name("Other(s) [specify]", &config), RiderName::Ignored);
        assert_eq!(classify_rider_name("other", &config), RiderName::Ignored);
        assert_eq!(classify_rider_name("   ", &config), RiderName::Ignored);
        assert_eq!(
            classify_rider_name("Manufactured Home Rider", &config),
            RiderName::Unrecognized
        );
    }

    #[test]
    fn test_canonical_rider_name() {
        let config = EngineConfig::default();
        assert_eq!(
            canonical_rider_name("va rider", &config).as_deref(),
            Some("V.A. Rider")
        );
        assert_eq!(canonical_rider_name("Other(s) [specify]", &config), None);
        assert_eq!(canonical_rider_name("Manufactured Home Rider", &config), None);
    }

    #[test]
    fn test_sanitize_party_name_strips_role_and_tail() {
        assert_eq!(
            sanitize_party_name("BORROWER: John Smith; an unmarried person").as_deref(),
            Some("JOHN SMITH")
        );
        assert_eq!(
            sanitize_party_name("The Borrowers, Jane Doe, a single woman").as_deref(),
            Some("JANE DOE")
        );
        assert_eq!(
            sanitize_party_name("Mortgagor - Trustor: Ann Q. Public").as_deref(),
            Some("ANN Q. PUBLIC")
        );
        assert_eq!(
            sanitize_party_name("john  smith").as_deref(),
            Some("JOHN SMITH")
        );
    }

    #[test]
    fn test_sanitize_party_name_keeps_corporate_commas() {
        assert_eq!(
            sanitize_party_name("Acme Holdings, LLC").as_deref(),
            Some("ACME HOLDINGS, LLC")
        );
        assert_eq!(
            sanitize_party_name("Smith, John, husband and wife").as_deref(),
            Some("SMITH, JOHN")
        );
    }

    #[test]
    fn test_sanitize_party_name_rejects_bare_roles() {
        assert_eq!(sanitize_party_name("Borrower"), None);
        assert_eq!(sanitize_party_name("  the borrowers:  "), None);
        assert_eq!(sanitize_party_name(""), None);
        assert_eq!(sanitize_party_name("   "), None);
    }

    #[test]
    fn test_identity_key() {
        assert_eq!(identity_key("John  Q. Smith"), "johnqsmith");
        assert_eq!(identity_key("JOHN Q SMITH"), "johnqsmith");
        assert_eq!(identity_key("O'Brien-Diaz, Mary"), "obriendiazmary");
        assert_eq!(identity_key("---"), "");
    }
}
