//! Client-side interception script.
//!
//! The rewritten page cannot reach the form host directly once it is served
//! from our origin, so the script patches `window.fetch` and
//! `XMLHttpRequest.prototype.open`: any string target containing the form-host
//! marker is sent to the submission relay instead, keeping only its query
//! string. The script is a fixed artifact; nothing here executes it.

/// Attribute identifying an injected script; its presence blocks reinjection.
pub const SNIPPET_ATTRIBUTE: &str = "data-form-relay-interceptor";

const TEMPLATE: &str = r#"<script data-form-relay-interceptor>
(function () {
  var marker = __MARKER__;
  var relay = __RELAY__;
  function relayed(target) {
    var url = new URL(target, window.location.origin);
    return relay + '?' + url.searchParams.toString();
  }
  var nativeFetch = window.fetch;
  window.fetch = function (resource, init) {
    if (typeof resource === 'string' && resource.indexOf(marker) !== -1) {
      var options = Object.assign({}, init);
      options.method = (init && init.method) || 'GET';
      return nativeFetch.call(window, relayed(resource), options);
    }
    return nativeFetch.apply(window, arguments);
  };
  var nativeOpen = XMLHttpRequest.prototype.open;
  XMLHttpRequest.prototype.open = function (method, url) {
    var args = Array.prototype.slice.call(arguments);
    if (typeof url === 'string' && url.indexOf(marker) !== -1) {
      args[1] = relayed(url);
    }
    return nativeOpen.apply(this, args);
  };
})();
</script>"#;

/// Render the interception script for `marker`, redirecting to `relay_route`.
pub fn interception_snippet(marker: &str, relay_route: &str) -> String {
    TEMPLATE
        .replace("__MARKER__", &js_string(marker))
        .replace("__RELAY__", &js_string(relay_route))
}

/// Encode `value` as a JavaScript string literal safe inside `<script>`.
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// Insert `snippet` immediately before the first closing head tag.
///
/// Returns `None` when the document has no `</head>` or already carries an
/// injected script.
pub fn inject_before_head_close(html: &str, snippet: &str) -> Option<String> {
    if html.contains(SNIPPET_ATTRIBUTE) {
        return None;
    }
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let at = html.to_ascii_lowercase().find("</head>")?;

    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..at]);
    out.push_str(snippet);
    out.push_str(&html[at..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_embeds_marker_and_route() {
        let snippet = interception_snippet("ticketsplusform", "/form-proxy");
        assert!(snippet.contains(r#"var marker = "ticketsplusform";"#));
        assert!(snippet.contains(r#"var relay = "/form-proxy";"#));
        assert!(snippet.starts_with("<script data-form-relay-interceptor>"));
        assert!(snippet.ends_with("</script>"));
    }

    #[test]
    fn test_marker_cannot_close_script() {
        let snippet = interception_snippet("</script><b>", "/form-proxy");
        assert_eq!(snippet.matches("</script>").count(), 1);
    }

    #[test]
    fn test_injects_before_head_close() {
        let out = inject_before_head_close("<html><head><title>t</title></HEAD><body></body></html>", "<s/>")
            .unwrap();
        assert_eq!(out, "<html><head><title>t</title><s/></HEAD><body></body></html>");
    }

    #[test]
    fn test_injects_only_at_first_head_close() {
        let out = inject_before_head_close("<head></head><template><head></head></template>", "X").unwrap();
        assert_eq!(out, "<head>X</head><template><head></head></template>");
    }

    #[test]
    fn test_no_head_or_already_injected() {
        assert!(inject_before_head_close("<p>fragment</p>", "X").is_none());

        let snippet = interception_snippet("m", "/form-proxy");
        let once = inject_before_head_close("<head></head>", &snippet).unwrap();
        assert!(inject_before_head_close(&once, &snippet).is_none());
    }
}
