//! Capture session lifecycle.
//!
//! A [`CaptureLog`] owns the capture history for one document session and
//! the immutable configuration driving it. Captures move through an
//! optimistic lifecycle: [`CaptureLog::begin_capture`] appends a
//! placeholder that is visible immediately, and the eventual outcome
//! either replaces it in place ([`CaptureLog::complete`]) or turns it into
//! an audit-only error entry ([`CaptureLog::fail`]).
//!
//! Every completed capture back-propagates what it found into the older
//! non-error captures, so the whole history converges instead of only the
//! newest record being right.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ingest::ingest_capture;
use crate::merge::{merge_records, propagate_to_history, reconcile};
use crate::project::{self, ProjectedField};
use crate::record::{CaptureResult, DocumentRecord};
use serde_json::Value;
use tracing::{debug, warn};

/// Extraction ids that mean "the capture could not name itself".
const UNNAMED: &str = "Unnamed Document";

/// Ordered capture history plus the configuration it is evaluated under.
#[derive(Debug, Clone)]
pub struct CaptureLog {
    captures: Vec<CaptureResult>,
    config: EngineConfig,
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CaptureLog {
    /// An empty log evaluated under `config`.
    #[must_use = "returns the new capture log"]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            captures: Vec::new(),
            config,
        }
    }

    /// The configuration this log evaluates under.
    #[must_use = "returns the engine configuration"]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The capture history, oldest first.
    #[must_use = "returns the capture history"]
    pub fn captures(&self) -> &[CaptureResult] {
        &self.captures
    }

    #[must_use = "returns the number of captures"]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    #[must_use = "checks whether the log is empty"]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Drop the whole history.
    pub fn clear(&mut self) {
        self.captures.clear();
    }

    /// Append an in-flight placeholder and return its id.
    pub fn begin_capture(&mut self) -> String {
        let id = format!("Document_{}", self.captures.len() + 1);
        self.captures.push(CaptureResult::processing(id.clone()));
        id
    }

    /// Land a completed capture.
    ///
    /// The matching placeholder is replaced in place. A capture that could
    /// not name itself inherits the placeholder id. Without a placeholder
    /// the capture upserts by id: an existing entry absorbs the new record
    /// pairwise and keeps the newer summary. Afterwards the capture's
    /// record is back-propagated into the rest of the history.
    pub fn complete(&mut self, placeholder_id: &str, mut capture: CaptureResult) -> usize {
        let unnamed = {
            let id = capture.capture_id.trim();
            id.is_empty() || id == UNNAMED || id.contains("Document_0")
        };
        if unnamed {
            capture.capture_id = placeholder_id.to_owned();
        }
        let source = capture.record.clone();
        let index = match self
            .captures
            .iter()
            .position(|entry| entry.is_processing() && entry.capture_id == placeholder_id)
        {
            Some(index) => {
                self.captures[index] = capture;
                index
            }
            None => {
                match self
                    .captures
                    .iter()
                    .position(|entry| entry.capture_id == capture.capture_id)
                {
                    Some(index) => {
                        let existing = &mut self.captures[index];
                        existing.record = merge_records(&existing.record, &capture.record);
                        if !capture.summary.is_empty() {
                            existing.summary = capture.summary;
                        }
                        index
                    }
                    None => {
                        self.captures.push(capture);
                        self.captures.len() - 1
                    }
                }
            }
        };
        propagate_to_history(&mut self.captures, &source, index);
        debug!(index, "capture completed");
        index
    }

    /// Record a failed capture for audit.
    ///
    /// A trailing placeholder is consumed by the failure; otherwise the
    /// error entry is appended. Error entries never contribute to merges.
    pub fn fail(&mut self, placeholder_id: &str, message: impl Into<String>) -> usize {
        let message = message.into();
        warn!(placeholder_id, error = message.as_str(), "capture failed");
        let failed = CaptureResult::failed(format!("{placeholder_id}_Error"), message);
        if let Some(last) = self.captures.last_mut() {
            if last.is_processing() {
                *last = failed;
                return self.captures.len() - 1;
            }
        }
        self.captures.push(failed);
        self.captures.len() - 1
    }

    /// Append an already-built capture and back-propagate it.
    pub fn push(&mut self, capture: CaptureResult) -> usize {
        let source = capture
            .contributes()
            .then(|| capture.record.clone());
        self.captures.push(capture);
        let index = self.captures.len() - 1;
        if let Some(source) = source {
            propagate_to_history(&mut self.captures, &source, index);
        }
        index
    }

    /// Ingest one raw payload through the full placeholder lifecycle.
    ///
    /// Contract violations become error entries rather than surfacing as
    /// `Err`, so a session survives arbitrarily bad payloads.
    pub fn submit(&mut self, payload: &Value) -> &CaptureResult {
        let placeholder_id = self.begin_capture();
        let index = match ingest_capture(payload, placeholder_id.clone(), &self.config) {
            Ok(capture) => self.complete(&placeholder_id, capture),
            Err(err) => self.fail(&placeholder_id, err.to_string()),
        };
        &self.captures[index]
    }

    /// Reconcile the history into the current best record.
    #[must_use = "returns the reconciled record"]
    pub fn reconcile(&self) -> DocumentRecord {
        reconcile(&self.captures, &self.config)
    }

    /// Reconcile and project into display rows.
    #[must_use = "returns the display rows"]
    pub fn project(&self) -> Vec<ProjectedField> {
        let merged = self.reconcile();
        project::project(&merged, &self.captures, &self.config)
    }

    /// Display lines for the failed captures, in history order.
    #[must_use = "returns the error display lines"]
    pub fn error_lines(&self) -> Vec<String> {
        self.captures
            .iter()
            .filter_map(|capture| {
                capture
                    .error
                    .as_ref()
                    .map(|error| format!("Analysis Error ({}): {error}", capture.capture_id))
            })
            .collect()
    }

    /// Apply operator edits to the most recent non-error capture.
    pub fn apply_edits(&mut self, edits: &[(String, String)]) {
        let Self { captures, config } = self;
        if let Some(capture) = captures.iter_mut().rev().find(|entry| entry.error.is_none()) {
            project::apply_edits(&mut capture.record, edits, config);
        }
    }

    /// Load a settings overlay and replace the log's configuration.
    pub fn reload_config(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.config = EngineConfig::from_json_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceValue;
    use serde_json::json;

    fn payload(lender: &str, confidence: f64) -> Value {
        json!({
            "entities": {
                "LenderName": { "value": lender, "confidence": confidence },
            },
            "summary": "a recorded deed of trust"
        })
    }

    #[test]
    fn test_placeholder_lifecycle() {
        let mut log = CaptureLog::default();
        let id = log.begin_capture();
        assert_eq!(id, "Document_1");
        assert_eq!(log.len(), 1);
        assert!(log.captures()[0].is_processing());

        let capture = CaptureResult::new(DocumentRecord::default(), "done", id.clone());
        let index = log.complete(&id, capture);
        assert_eq!(index, 0);
        assert_eq!(log.len(), 1);
        assert!(!log.captures()[0].is_processing());
        assert_eq!(log.captures()[0].summary, "done");
    }

    #[test]
    fn test_unnamed_capture_inherits_placeholder_id() {
        let mut log = CaptureLog::default();
        let id = log.begin_capture();
        let capture = CaptureResult::new(DocumentRecord::default(), "done", UNNAMED);
        log.complete(&id, capture);
        assert_eq!(log.captures()[0].capture_id, "Document_1");
    }

    #[test]
    fn test_completion_back_propagates() {
        let mut log = CaptureLog::default();
        log.submit(&payload("Frst Bnk", 0.4));
        log.submit(&payload("First Bank", 0.95));
        // The older capture absorbed the more confident later reading.
        assert_eq!(log.captures()[0].record.lender_name.value, "First Bank");
    }

    #[test]
    fn test_failure_consumes_trailing_placeholder() {
        let mut log = CaptureLog::default();
        let id = log.begin_capture();
        let index = log.fail(&id, "missing entities or summary");
        assert_eq!(index, 0);
        assert_eq!(log.len(), 1);
        let entry = &log.captures()[0];
        assert_eq!(entry.capture_id, "Document_1_Error");
        assert!(entry.error.is_some());
        assert_eq!(
            log.error_lines(),
            vec!["Analysis Error (Document_1_Error): missing entities or summary"]
        );
    }

    #[test]
    fn test_submit_survives_bad_payloads() {
        let mut log = CaptureLog::default();
        let entry = log.submit(&json!("not an object"));
        assert!(entry.error.is_some());
        let entry = log.submit(&payload("First Bank", 0.95));
        assert!(entry.error.is_none());
        assert_eq!(log.len(), 2);
        // The failed capture stays inert.
        assert_eq!(log.captures()[0].record, DocumentRecord::default());
    }

    #[test]
    fn test_upsert_by_id_merges_records() {
        let mut log = CaptureLog::default();
        let mut first = DocumentRecord::default();
        first.lender_name = ConfidenceValue::text("First Bank", 0.9);
        log.push(CaptureResult::new(first, "first pass", "deed-42"));

        let mut second = DocumentRecord::default();
        second.trustee_name = ConfidenceValue::text("Title Co.", 0.92);
        // No placeholder is open, so this lands as an upsert on the
        // existing id.
        log.complete("Document_9", CaptureResult::new(second, "second pass", "deed-42"));

        assert_eq!(log.len(), 1);
        let entry = &log.captures()[0];
        assert_eq!(entry.summary, "second pass");
        assert_eq!(entry.record.lender_name.value, "First Bank");
        assert_eq!(entry.record.trustee_name.value, "Title Co.");
    }

    #[test]
    fn test_project_and_edits_flow() {
        let mut log = CaptureLog::default();
        log.submit(&json!({
            "entities": {
                "LoanAmount": { "value": "$194,000", "confidence": 0.95 },
                "LenderName": { "value": "First Bank", "confidence": 0.97 },
            },
            "summary": "s"
        }));

        let rows = log.project();
        let loan = rows
            .iter()
            .find(|row| row.label == "Loan Amt.")
            .map(|row| row.value.as_str());
        assert_eq!(loan, Some("194000.00"));

        log.apply_edits(&[("Loan Amt.".to_owned(), "$195,000".to_owned())]);
        assert_eq!(
            log.captures()[0].record.loan_amount.value,
            "195000.00"
        );
    }

    #[test]
    fn test_reload_config_changes_projection() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"display_threshold\": 0.5}}").unwrap();

        let mut log = CaptureLog::default();
        log.submit(&payload("First Bank", 0.6));
        assert!(log.project().is_empty());

        log.reload_config(file.path()).unwrap();
        let rows = log.project();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "First Bank");
    }

    #[test]
    fn test_clear() {
        let mut log = CaptureLog::default();
        log.submit(&payload("First Bank", 0.95));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
