//! Header analysis rules.

use reqwest::header::{self, HeaderMap};

use crate::diagnostics::{Finding, Severity};

/// Headers that decide whether a page can be framed and posted to.
pub const RELEVANT_HEADERS: [&str; 7] = [
    "access-control-allow-origin",
    "access-control-allow-credentials",
    "x-frame-options",
    "content-security-policy",
    "referrer-policy",
    "set-cookie",
    "strict-transport-security",
];

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Every `set-cookie` value that is valid text.
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect()
}

/// List the relevant headers present.
pub fn relevant_headers(headers: &HeaderMap) -> Vec<Finding> {
    let findings: Vec<Finding> = RELEVANT_HEADERS
        .iter()
        .flat_map(|name| {
            headers
                .get_all(*name)
                .iter()
                .map(move |v| Finding::new(Severity::Info, format!("{}: {}", name, v.to_str().unwrap_or("<binary>"))))
        })
        .collect();

    if findings.is_empty() {
        vec![Finding::new(Severity::Info, "no security headers found")]
    } else {
        findings
    }
}

pub fn frame_options(value: Option<&str>) -> Finding {
    match value.map(|v| v.trim().to_ascii_uppercase()) {
        None => Finding::new(Severity::Warn, "X-Frame-Options not set"),
        Some(v) if v == "DENY" => Finding::new(Severity::Error, "X-Frame-Options: DENY (framing forbidden)"),
        Some(v) if v == "SAMEORIGIN" => {
            Finding::new(Severity::Warn, "X-Frame-Options: SAMEORIGIN (same origin only)")
        }
        Some(v) if v == "ALLOWALL" => Finding::new(Severity::Ok, "X-Frame-Options: ALLOWALL (framing allowed)"),
        Some(v) => Finding::new(Severity::Info, format!("X-Frame-Options: {}", v)),
    }
}

pub fn content_security_policy(value: Option<&str>) -> Finding {
    match value {
        Some(csp) => Finding::new(Severity::Info, csp),
        None => Finding::new(Severity::Warn, "Content-Security-Policy not set"),
    }
}

pub fn referrer_policy(value: Option<&str>) -> Finding {
    match value {
        None => Finding::new(Severity::Warn, "Referrer-Policy not set"),
        Some(p) if p.contains("no-referrer") => Finding::new(Severity::Ok, format!("Referrer-Policy: {}", p)),
        Some(p) if p.contains("same-origin") => Finding::new(Severity::Warn, format!("Referrer-Policy: {}", p)),
        Some(p) if p.contains("strict-origin-when-cross-origin") => Finding::new(
            Severity::Error,
            format!("Referrer-Policy: {} (cross-origin POSTs rejected)", p),
        ),
        Some(p) => Finding::new(Severity::Info, format!("Referrer-Policy: {}", p)),
    }
}

/// Result of a CORS preflight.
pub fn cors(allow_origin: Option<&str>, allow_credentials: Option<&str>) -> Vec<Finding> {
    match allow_origin {
        Some(origin) => {
            let mut findings = vec![Finding::new(Severity::Ok, format!("CORS enabled: {}", origin))];
            if let Some(credentials) = allow_credentials {
                findings.push(Finding::new(Severity::Info, format!("credentials: {}", credentials)));
            }
            findings
        }
        None => vec![Finding::new(
            Severity::Error,
            "CORS not enabled or origin not allowed",
        )],
    }
}

/// Attributes of one `set-cookie` value, lowercased.
fn cookie_attributes(cookie: &str) -> Vec<String> {
    cookie
        .split(';')
        .skip(1)
        .map(|a| a.trim().to_ascii_lowercase())
        .collect()
}

fn same_site(attributes: &[String]) -> Option<&str> {
    attributes
        .iter()
        .find_map(|a| a.strip_prefix("samesite="))
        .map(str::trim)
}

/// SameSite, Secure and HttpOnly across every cookie set.
pub fn cookies(set_cookie: &[String]) -> Vec<Finding> {
    if set_cookie.is_empty() {
        return vec![Finding::new(Severity::Info, "no cookies set")];
    }

    let mut findings: Vec<Finding> = set_cookie
        .iter()
        .map(|c| Finding::new(Severity::Info, c.clone()))
        .collect();

    let attributes: Vec<Vec<String>> = set_cookie.iter().map(|c| cookie_attributes(c)).collect();
    let same_sites: Vec<Option<&str>> = attributes.iter().map(|a| same_site(a)).collect();

    findings.push(if same_sites.contains(&Some("strict")) {
        Finding::new(Severity::Error, "SameSite=Strict (cookies never sent inside an iframe)")
    } else if same_sites.iter().all(|s| *s == Some("none")) {
        Finding::new(Severity::Ok, "SameSite=None (sent cross-origin)")
    } else if same_sites.contains(&Some("lax")) {
        Finding::new(Severity::Warn, "SameSite=Lax (moderate restriction)")
    } else {
        Finding::new(Severity::Warn, "SameSite not specified")
    });

    let all_have = |flag: &str| attributes.iter().all(|a| a.iter().any(|x| x == flag));

    findings.push(if all_have("secure") {
        Finding::new(Severity::Ok, "Secure (HTTPS only)")
    } else {
        Finding::new(Severity::Error, "Secure not set")
    });

    findings.push(if all_have("httponly") {
        Finding::new(Severity::Ok, "HttpOnly (hidden from scripts)")
    } else {
        Finding::new(Severity::Warn, "HttpOnly not set")
    });

    findings
}

/// Problems that stop the form from working inside a cross-origin iframe.
pub fn blocking_issues(headers: &HeaderMap) -> Vec<Finding> {
    let mut issues = Vec::new();

    if header_str(headers, "access-control-allow-origin").is_none() {
        issues.push(Finding::new(Severity::Error, "CORS not enabled on the form host"));
    }

    if header_str(headers, "x-frame-options").is_some_and(|v| v.trim().eq_ignore_ascii_case("DENY")) {
        issues.push(Finding::new(Severity::Error, "X-Frame-Options: DENY prevents framing"));
    }

    if header_str(headers, "referrer-policy").is_some_and(|v| v.contains("strict-origin-when-cross-origin")) {
        issues.push(Finding::new(Severity::Error, "Referrer-Policy rejects cross-origin POSTs"));
    }

    let cookies = set_cookies(headers);
    if !cookies.is_empty()
        && !cookies
            .iter()
            .all(|c| same_site(&cookie_attributes(c)) == Some("none"))
    {
        issues.push(Finding::new(
            Severity::Error,
            "cookies lack SameSite=None (not sent inside iframes)",
        ));
    }

    issues
}
