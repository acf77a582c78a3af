//! Embedding diagnostics against mock hosts.

use std::time::Duration;

use form_relay::diagnostics::{probe::diagnostic_client, run_diagnostics, Severity};

mod common;

use common::{start_mock_upstream, MockReply};

#[tokio::test]
async fn test_hostile_form_host_reports_blocking_issues() {
    let form_host = start_mock_upstream(|_| {
        MockReply::new(200, "")
            .header("x-frame-options", "DENY")
            .header("referrer-policy", "strict-origin-when-cross-origin")
            .header("set-cookie", "JSESSIONID=1; Path=/; SameSite=Strict")
    })
    .await;
    let host = start_mock_upstream(|_| MockReply::new(200, "")).await;

    let client = diagnostic_client(Duration::from_secs(5)).unwrap();
    let report = run_diagnostics(&client, &form_host.origin(), &host.origin()).await;

    let frame = report.section("X-Frame-Options").unwrap();
    assert_eq!(frame.findings[0].severity, Severity::Error);

    let cors = report.section("CORS").unwrap();
    assert!(cors.findings.iter().any(|f| f.severity == Severity::Error));

    let summary = report.section("Summary").unwrap();
    let blocking = summary
        .findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    assert_eq!(blocking, 4);

    // one HEAD and one OPTIONS preflight against the form host
    let methods: Vec<String> = form_host
        .recorded()
        .iter()
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(methods.len(), 2);
    assert!(methods.contains(&"HEAD".to_string()));
    assert!(methods.contains(&"OPTIONS".to_string()));

    let preflight = form_host
        .recorded()
        .into_iter()
        .find(|r| r.method == "OPTIONS")
        .unwrap();
    assert_eq!(preflight.header("origin"), Some(host.origin().as_str()));
    assert_eq!(preflight.header("access-control-request-method"), Some("POST"));
}

#[tokio::test]
async fn test_embeddable_form_host_is_clean() {
    let form_host = start_mock_upstream(|_| {
        MockReply::new(200, "")
            .header("access-control-allow-origin", "*")
            .header("referrer-policy", "no-referrer")
            .header("set-cookie", "JSESSIONID=1; SameSite=None; Secure; HttpOnly")
    })
    .await;
    let host = start_mock_upstream(|_| MockReply::new(200, "")).await;

    let client = diagnostic_client(Duration::from_secs(5)).unwrap();
    let report = run_diagnostics(&client, &form_host.origin(), &host.origin()).await;

    let summary = report.section("Summary").unwrap();
    assert_eq!(summary.findings.len(), 1);
    assert_eq!(summary.findings[0].severity, Severity::Ok);
    assert_eq!(report.error_count(), 0);
    assert!(report.to_string().contains("no blocking issues detected"));
}

#[tokio::test]
async fn test_unreachable_form_host_skips_header_checks() {
    let host = start_mock_upstream(|_| MockReply::new(200, "")).await;

    let client = diagnostic_client(Duration::from_secs(2)).unwrap();
    // port 1 on loopback refuses connections
    let report = run_diagnostics(&client, "http://127.0.0.1:1/form", &host.origin()).await;

    assert_eq!(report.sections.len(), 2);
    assert!(report.section("SSL/TLS").unwrap().findings[0].severity == Severity::Error);
    assert!(report.section("X-Frame-Options").is_none());
}
