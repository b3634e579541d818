//! Validation report tree
//!
//! Every validation routine returns a [`ValidationReport`]. A report fails when
//! it raised an issue itself or when any of its sub-reports fails; the flag is
//! only settled after [`ValidationReport::validate`] folds the tree.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// How much of a report `print_status` logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Passes and failures
    All,
    /// Failures only
    Failures,
    #[default]
    None,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "all_results" => Ok(LogLevel::All),
            "failures" | "only_failures" => Ok(LogLevel::Failures),
            "none" => Ok(LogLevel::None),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

/// Pass/fail result with issues and nested results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub title: String,
    pub validated: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub sub_reports: Vec<ValidationReport>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            title: String::new(),
            validated: true,
            issues: Vec::new(),
            sub_reports: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Start out failed with `issues`, or passed when there are none
    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        self.validated = issues.is_empty();
        self.issues = issues;
        self
    }

    pub fn with_sub_reports(mut self, sub_reports: Vec<ValidationReport>) -> Self {
        self.sub_reports = sub_reports;
        self
    }

    /// Record an issue and mark this report failed
    pub fn fail(&mut self, issue: impl Into<String>) {
        self.validated = false;
        self.issues.push(issue.into());
    }

    /// Record an issue without changing the outcome
    pub fn note(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn push(&mut self, sub_report: ValidationReport) {
        self.sub_reports.push(sub_report);
    }

    /// Fold the tree bottom-up: a report stays valid only if every sub-report is.
    pub fn validate(&mut self) -> bool {
        let mut all_valid = true;
        for sub in &mut self.sub_reports {
            all_valid &= sub.validate();
        }
        self.validated = self.validated && all_valid;
        self.validated
    }

    /// Issues of this report and all of its sub-reports, depth first
    pub fn all_issues(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.issues.iter().map(String::as_str).collect();
        for sub in &self.sub_reports {
            out.extend(sub.all_issues());
        }
        out
    }

    pub fn print_status(&self, log_level: LogLevel) {
        match log_level {
            LogLevel::All if self.validated => info!("{}: PASSED!", self.title),
            LogLevel::All | LogLevel::Failures if !self.validated => {
                warn!("{}: FAILED.", self.title);
                for issue in &self.issues {
                    warn!("  - {}", issue);
                }
            }
            _ => {}
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if !self.title.is_empty() {
            let status = if self.validated { "PASSED!" } else { "FAILED." };
            match depth {
                0 => {
                    let rule = "#".repeat(61);
                    write!(
                        f,
                        "\n{rule}\n## {:<55} ##\n## Valid: {:<48} ##\n{rule}",
                        self.title,
                        self.validated.to_string()
                    )?;
                }
                1 => write!(f, "\n\n==> {} - {}\n", self.title, status)?,
                2 => write!(f, "\n\n    --> {} - {}\n", self.title, status)?,
                3 => write!(f, "\n\n        ~~> {} - {}\n", self.title, status)?,
                _ => write!(f, "\n\n            * {} - {}\n", self.title, status)?,
            }
        }
        if !self.validated {
            let indent = " ".repeat(depth * 4);
            let mut seen = HashSet::new();
            for issue in &self.issues {
                if seen.insert(issue.as_str()) {
                    write!(f, "\n{}{}", indent, issue)?;
                }
            }
        }
        for sub in &self.sub_reports {
            sub.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_validates() {
        let mut report = ValidationReport::new("Nothing");
        assert!(report.validate());
    }

    #[test]
    fn test_failed_sub_report_fails_parent() {
        let mut failing = ValidationReport::new("child");
        failing.fail("broken");
        let mut report = ValidationReport::new("parent").with_sub_reports(vec![
            ValidationReport::new("fine"),
            failing,
        ]);
        assert!(report.issues.is_empty());
        assert!(!report.validate());
        assert!(report.sub_reports[0].validated);
    }

    #[test]
    fn test_validate_is_post_order() {
        let mut leaf = ValidationReport::new("leaf");
        leaf.validated = false;
        let middle = ValidationReport::new("middle").with_sub_reports(vec![leaf]);
        let mut root = ValidationReport::new("root").with_sub_reports(vec![middle]);
        assert!(!root.validate());
        assert!(!root.sub_reports[0].validated);
    }

    #[test]
    fn test_note_does_not_fail() {
        let mut report = ValidationReport::new("notes");
        report.note("just so you know");
        assert!(report.validate());
    }

    #[test]
    fn test_render_deduplicates_in_first_seen_order() {
        let mut child = ValidationReport::new("Child");
        child.fail("b");
        child.fail("a");
        child.fail("b");
        let mut root = ValidationReport::new("Root").with_sub_reports(vec![child]);
        root.validate();
        let text = root.to_string();
        assert!(text.contains("## Root"));
        assert!(text.contains("==> Child - FAILED.\n\n    b\n    a"));
        assert_eq!(text.matches("    b").count(), 1);
    }

    #[test]
    fn test_render_hides_issues_on_success() {
        let mut report = ValidationReport::new("Quiet");
        report.note("hidden");
        assert!(!report.to_string().contains("hidden"));
    }

    #[test]
    fn test_all_issues_collects_nested() {
        let mut child = ValidationReport::new("child");
        child.fail("deep");
        let mut root = ValidationReport::new("root").with_sub_reports(vec![child]);
        root.fail("top");
        assert_eq!(root.all_issues(), vec!["top", "deep"]);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("failures".parse::<LogLevel>().unwrap(), LogLevel::Failures);
        assert_eq!("ALL".parse::<LogLevel>().unwrap(), LogLevel::All);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
