//! HTTP probes against the form host and the embedding host.

use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use reqwest::{Client, Method, StatusCode};

use crate::diagnostics::analysis::{self, header_str};
use crate::diagnostics::{Report, Section, Severity};

/// Status and headers of one probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl From<&reqwest::Response> for ProbeResult {
    fn from(res: &reqwest::Response) -> Self {
        Self {
            status: res.status(),
            headers: res.headers().clone(),
        }
    }
}

pub fn diagnostic_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("form-relay-diagnose/", env!("CARGO_PKG_VERSION")))
        .build()
}

async fn head(client: &Client, url: &str) -> Result<ProbeResult, reqwest::Error> {
    let res = client.head(url).send().await?;
    Ok(ProbeResult::from(&res))
}

/// CORS preflight as a browser would send it for a form POST.
async fn preflight(client: &Client, url: &str, origin: &str) -> Result<ProbeResult, reqwest::Error> {
    let res = client
        .request(Method::OPTIONS, url)
        .header(ORIGIN, origin)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "Content-Type")
        .send()
        .await?;
    Ok(ProbeResult::from(&res))
}

fn reachability(section: &mut Section, url: &str, result: &Result<ProbeResult, reqwest::Error>) {
    match result {
        Ok(probe) => {
            section.push(Severity::Ok, format!("{}: reachable ({})", url, probe.status));
            if url.starts_with("https://") {
                section.push(Severity::Ok, format!("{}: certificate accepted", url));
            }
        }
        Err(e) => section.push(Severity::Error, format!("{}: {}", url, e)),
    }
}

/// Probe both hosts and assemble the report.
pub async fn run_diagnostics(client: &Client, iframe_url: &str, host_url: &str) -> Report {
    tracing::debug!(iframe_url, host_url, "Running embedding diagnostics");

    let form = head(client, iframe_url).await;
    let host = head(client, host_url).await;
    let cors = preflight(client, iframe_url, host_url).await;

    let mut report = Report::default();

    let mut tls = Section::new("SSL/TLS");
    reachability(&mut tls, iframe_url, &form);
    reachability(&mut tls, host_url, &host);
    report.sections.push(tls);

    let Ok(form) = form else {
        let mut summary = Section::new("Summary");
        summary.push(Severity::Error, "form host unreachable; header checks skipped");
        report.sections.push(summary);
        return report;
    };

    let mut headers = Section::new("Response headers");
    headers.findings = analysis::relevant_headers(&form.headers);
    report.sections.push(headers);

    let mut cors_section = Section::new("CORS");
    match &cors {
        Ok(probe) => {
            cors_section.push(Severity::Info, format!("preflight status: {}", probe.status));
            cors_section.findings.extend(analysis::cors(
                header_str(&probe.headers, "access-control-allow-origin"),
                header_str(&probe.headers, "access-control-allow-credentials"),
            ));
        }
        Err(e) => cors_section.push(Severity::Error, format!("preflight failed: {}", e)),
    }
    report.sections.push(cors_section);

    let mut cookies = Section::new("Cookies");
    cookies.findings = analysis::cookies(&analysis::set_cookies(&form.headers));
    report.sections.push(cookies);

    let mut frame = Section::new("X-Frame-Options");
    frame.findings.push(analysis::frame_options(header_str(&form.headers, "x-frame-options")));
    report.sections.push(frame);

    let mut csp = Section::new("Content-Security-Policy");
    csp.findings.push(analysis::content_security_policy(header_str(
        &form.headers,
        "content-security-policy",
    )));
    report.sections.push(csp);

    let mut referrer = Section::new("Referrer-Policy");
    referrer.findings.push(analysis::referrer_policy(header_str(&form.headers, "referrer-policy")));
    report.sections.push(referrer);

    // The preflight answer is authoritative for CORS.
    let mut observed = form.headers;
    if let Some(origin) = cors
        .as_ref()
        .ok()
        .and_then(|p| p.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN))
    {
        observed.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::clone(origin));
    }

    let mut summary = Section::new("Summary");
    let issues = analysis::blocking_issues(&observed);
    if issues.is_empty() {
        summary.push(Severity::Ok, "no blocking issues detected");
    } else {
        summary.findings = issues;
        summary.push(
            Severity::Info,
            "serve the form through the relay to embed it same-origin",
        );
    }
    report.sections.push(summary);

    report
}
