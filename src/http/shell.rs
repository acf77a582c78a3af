//! Embedding shell page.
//!
//! Renders the page the browser loads first: a header and an iframe pointing
//! at the form relay. A small inline loader enforces the load timeout and
//! reloads the frame a bounded number of times; that retry policy lives in the
//! browser, never in the relays.

use axum::{extract::State, response::Html};

use crate::config::{FormConfig, ShellConfig};
use crate::http::server::AppState;
use crate::relay::FORM_ROUTE;

/// `GET /`
pub async fn shell_page(State(state): State<AppState>) -> Html<String> {
    Html(render_shell(&state.config.shell, &state.config.form))
}

/// Render the shell, or a configuration notice when the form is not set up.
pub fn render_shell(shell: &ShellConfig, form: &FormConfig) -> String {
    let title = escape_html(&shell.title);

    if form.base_url.is_none() || form.params.is_none() {
        return format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<main class="container">
<h1>Error de configuración</h1>
<p>No se pudo construir la URL del formulario. Verifique FORM_BASE_URL y FORM_PARAMS.</p>
</main>
</body>
</html>"#
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<main class="container">
<header><h1>{title}</h1><p>{subtitle}</p></header>
<p id="form-status" role="status">Cargando formulario…</p>
<iframe id="form-frame" src="{src}" width="{width}" height="{height}" sandbox="{sandbox}" data-retry-attempts="{attempts}" data-load-timeout="{timeout}" data-retry-delay="{delay}"></iframe>
</main>
<script>
(function () {{
  var frame = document.getElementById('form-frame');
  var status = document.getElementById('form-status');
  var attempts = Number(frame.dataset.retryAttempts);
  var timeout = Number(frame.dataset.loadTimeout);
  var delay = Number(frame.dataset.retryDelay);
  var tries = 0;
  var timer = null;
  function arm() {{
    clearTimeout(timer);
    timer = setTimeout(fail, timeout);
  }}
  function fail() {{
    if (tries >= attempts) {{
      status.textContent = 'El formulario no se pudo cargar.';
      return;
    }}
    tries += 1;
    status.textContent = 'Reintentando (' + tries + '/' + attempts + ')…';
    setTimeout(function () {{
      arm();
      frame.src = frame.getAttribute('src').split('?')[0] + '?attempt=' + tries;
    }}, delay);
  }}
  frame.addEventListener('load', function () {{
    clearTimeout(timer);
    status.textContent = '';
  }});
  arm();
}})();
</script>
</body>
</html>"#,
        title = title,
        subtitle = escape_html(&shell.subtitle),
        src = FORM_ROUTE,
        width = escape_html(&shell.iframe_width),
        height = escape_html(&shell.iframe_height),
        sandbox = escape_html(&shell.iframe_sandbox),
        attempts = shell.retry_attempts,
        timeout = shell.load_timeout_ms,
        delay = shell.retry_delay_ms,
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> FormConfig {
        FormConfig {
            base_url: Some("https://forms.example/f".into()),
            params: Some("p".into()),
        }
    }

    #[test]
    fn test_shell_embeds_form_route() {
        let html = render_shell(&ShellConfig::default(), &configured());
        assert!(html.contains(r#"<iframe id="form-frame" src="/form-frame" width="100%" height="800px""#));
        assert!(html.contains(r#"sandbox="allow-same-origin allow-scripts allow-forms allow-popups allow-top-navigation""#));
        assert!(html.contains(r#"data-retry-attempts="3" data-load-timeout="30000" data-retry-delay="2000""#));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let shell = ShellConfig {
            iframe_height: r#"1px" onload="alert(1)"#.into(),
            title: "<b>x</b>".into(),
            ..ShellConfig::default()
        };
        let html = render_shell(&shell, &configured());
        assert!(html.contains(r#"height="1px&quot; onload=&quot;alert(1)""#));
        assert!(html.contains("<title>&lt;b&gt;x&lt;/b&gt;</title>"));
    }

    #[test]
    fn test_missing_configuration_notice() {
        let html = render_shell(&ShellConfig::default(), &FormConfig::default());
        assert!(html.contains("Error de configuración"));
        assert!(!html.contains("<iframe"));
    }
}
