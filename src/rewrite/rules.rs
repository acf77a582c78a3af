//! Resource-reference rewrite rules.
//!
//! Four ordered rules move form-host resource references under the proxy
//! prefix:
//!
//! | rule            | before                  | after                              |
//! |-----------------|-------------------------|------------------------------------|
//! | `absolute`      | `"/{base}/…`            | `"/proxy/{base}/…`                 |
//! | `relative`      | `"static/…`             | `"/proxy/{base}/static/…`          |
//! | `css-absolute`  | `url(/{base}/…`         | `url(/proxy/{base}/…`              |
//! | `css-relative`  | `url('static/…`         | `url('/proxy/{base}/static/…`      |
//!
//! A match that already contains the proxy prefix is left untouched, so a
//! reference is rewritten at most once and the whole set is idempotent.

use std::borrow::Cow;

use regex::{Captures, Regex};

/// A single pattern → template substitution.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rule. `replacement` uses `${name}` capture references.
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply the rule to `input`, skipping matches that contain `guard`.
    pub fn apply<'a>(&self, input: &'a str, guard: &str) -> Cow<'a, str> {
        self.pattern.replace_all(input, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if matched.contains(guard) {
                return matched.to_string();
            }
            let mut out = String::with_capacity(matched.len() + guard.len());
            caps.expand(&self.replacement, &mut out);
            out
        })
    }
}

/// Build the fixed rule set for a form host whose resources live under
/// `/{base_segment}/`, proxied beneath `proxy_prefix`.
pub fn form_host_rules(base_segment: &str, proxy_prefix: &str) -> Result<Vec<RewriteRule>, regex::Error> {
    let base = regex::escape(base_segment);
    // `$` is the capture sigil in replacement templates
    let target = format!("{}/{}/", proxy_prefix, base_segment).replace('$', "$$");

    Ok(vec![
        RewriteRule::new(
            "absolute",
            &format!(r#"(?P<quote>['"])/{}/"#, base),
            format!("${{quote}}{}", target),
        )?,
        RewriteRule::new(
            "relative",
            r#"(?P<quote>['"])static/"#,
            format!("${{quote}}{}static/", target),
        )?,
        RewriteRule::new(
            "css-absolute",
            &format!(r#"url\((?P<quote>['"]?)/{}/"#, base),
            format!("url(${{quote}}{}", target),
        )?,
        RewriteRule::new(
            "css-relative",
            r#"url\((?P<quote>['"]?)static/"#,
            format!("url(${{quote}}{}static/", target),
        )?,
    ])
}
