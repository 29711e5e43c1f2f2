//! Validation report types for structured error reporting.
//!
//! A report is a flat list of findings. Findings are data, not errors:
//! the validator never fails, it only describes what it saw.

use serde::Serialize;
use std::fmt;

/// The result of validating one collection.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All findings, in check order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds a finding to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// True when there are no errors. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// True if there are no findings at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns findings carrying `code`.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single finding.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the check that produced the finding.
    pub code: IssueCode,

    /// A human-readable description.
    pub message: String,

    /// Number of records (files, annotations) the finding covers.
    pub count: usize,

    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        count: usize,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            count,
            context,
        }
    }

    pub fn error(
        code: IssueCode,
        message: impl Into<String>,
        count: usize,
        context: IssueContext,
    ) -> Self {
        Self::new(Severity::Error, code, message, count, context)
    }

    pub fn warning(
        code: IssueCode,
        message: impl Into<String>,
        count: usize,
        context: IssueContext,
    ) -> Self {
        Self::new(Severity::Warning, code, message, count, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Something worth a look that does not make the collection invalid.
    Warning,
    /// The collection is inconsistent.
    Error,
}

/// A stable code identifying which check produced a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    /// An image record names a file that is not on disk.
    MissingImageFile,
    /// Fewer files on disk than image records.
    ImageFileShortfall,
    /// More files on disk than image records.
    UntrackedImageFiles,
    /// Annotations point at image ids that do not exist.
    InvalidImageRef,
    /// Annotations point at category ids that do not exist.
    InvalidCategoryRef,
    /// Annotations with an area under the size threshold.
    SmallObject,
    /// Annotations lacking a required key.
    MissingAnnotationField,
}

/// Where a finding applies.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// The collection as a whole.
    Collection,
    /// A specific image record.
    Image { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Collection => write!(f, "collection"),
            IssueContext::Image { id } => write!(f, "image {}", id),
        }
    }
}
