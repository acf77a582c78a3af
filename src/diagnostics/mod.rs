//! Embedding diagnostics.
//!
//! Read-only probes that explain why a third-party form does or does not work
//! inside an iframe: reachability, framing headers, CORS, cookie attributes
//! and referrer policy. Nothing here is on the relay's request path; the
//! `form-relay-diagnose` binary drives it.
//!
//! # Data Flow
//! ```text
//! iframe URL, host URL
//!     → probe.rs (HEAD + OPTIONS requests)
//!     → analysis.rs (pure header → finding rules)
//!     → Report (printed by the CLI)
//! ```

pub mod analysis;
pub mod probe;

use std::fmt;

pub use probe::{run_diagnostics, ProbeResult};

/// How a finding affects embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Info,
    Warn,
    Error,
}

impl Severity {
    fn symbol(self) -> &'static str {
        match self {
            Severity::Ok => "✓",
            Severity::Info => "ℹ",
            Severity::Warn => "⚠",
            Severity::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub findings: Vec<Finding>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            findings: Vec::new(),
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.findings.push(Finding::new(severity, message));
    }
}

/// Full diagnostic report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    /// Section by title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn error_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.findings)
            .filter(|f| f.severity == Severity::Error)
            .count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            writeln!(f, "\n{}. {}", i + 1, section.title)?;
            writeln!(f, "{}", "━".repeat(80))?;
            for finding in &section.findings {
                writeln!(f, "{} {}", finding.severity.symbol(), finding.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_rendering() {
        let mut section = Section::new("X-Frame-Options");
        section.push(Severity::Error, "DENY forbids framing");
        section.push(Severity::Ok, "fine");
        let report = Report {
            sections: vec![section],
        };

        let text = report.to_string();
        assert!(text.contains("1. X-Frame-Options"));
        assert!(text.contains("✗ DENY forbids framing"));
        assert!(text.contains("✓ fine"));
        assert_eq!(report.error_count(), 1);
        assert!(report.section("X-Frame-Options").is_some());
    }
}
