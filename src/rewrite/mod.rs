//! HTML rewriting for the embedded form.
//!
//! # Data Flow
//! ```text
//! upstream HTML (text)
//!     → rules.rs (four ordered reference rewrites, each guarded)
//!     → snippet.rs (interception script before </head>)
//!     → HTML served from our origin
//! ```
//!
//! # Design Decisions
//! - Textual substitution, not an HTML parse: the form host's pages are known
//!   to need exactly these four patterns
//! - `srcset`, inline `style` beyond `url()`, and protocol-relative URLs are
//!   not rewritten
//! - Rules compiled once at startup and shared immutably

pub mod rules;
pub mod snippet;

pub use rules::RewriteRule;

use crate::relay::{PROXY_PREFIX, SUBMIT_ROUTE};

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub html: String,
    /// False when the document had no `</head>` or was already instrumented.
    pub injected: bool,
}

/// Compiled rewrite pipeline for one form host.
#[derive(Debug, Clone)]
pub struct Rewriter {
    rules: Vec<RewriteRule>,
    guard: String,
    snippet: String,
}

impl Rewriter {
    /// Build the pipeline for resources under `/{base_segment}/`.
    pub fn new(base_segment: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            rules: rules::form_host_rules(base_segment, PROXY_PREFIX)?,
            guard: format!("{}/", PROXY_PREFIX),
            snippet: snippet::interception_snippet(base_segment, SUBMIT_ROUTE),
        })
    }

    /// Rewrite resource references and inject the interception script.
    pub fn rewrite(&self, html: &str) -> Rewritten {
        let rewritten = self.rewrite_references(html);
        match snippet::inject_before_head_close(&rewritten, &self.snippet) {
            Some(html) => Rewritten {
                html,
                injected: true,
            },
            None => Rewritten {
                html: rewritten,
                injected: false,
            },
        }
    }

    /// Apply only the reference rules.
    pub fn rewrite_references(&self, html: &str) -> String {
        self.rules.iter().fold(html.to_string(), |acc, rule| {
            rule.apply(&acc, &self.guard).into_owned()
        })
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }
}
