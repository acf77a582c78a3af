use std::time::Duration;

use clap::Parser;
use form_relay::diagnostics::{self, probe::diagnostic_client};

#[derive(Parser)]
#[command(name = "form-relay-diagnose")]
#[command(about = "Check whether a form can be embedded in an iframe", long_about = None)]
struct Cli {
    /// Form page loaded inside the iframe
    #[arg(
        default_value = "https://ticketsplusform.mendoza.gov.ar/ticketsplusform/com.ticketsplus.responderformularioif"
    )]
    iframe_url: String,

    /// Page that embeds the iframe
    #[arg(default_value = "http://localhost:3000")]
    host_url: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = diagnostic_client(Duration::from_secs(cli.timeout))?;

    println!("Embedding diagnostics");
    println!("  iframe: {}", cli.iframe_url);
    println!("  host:   {}", cli.host_url);

    let report = diagnostics::run_diagnostics(&client, &cli.iframe_url, &cli.host_url).await;
    print!("{}", report);

    let errors = report.error_count();
    if errors > 0 {
        eprintln!("\n{} blocking finding(s)", errors);
    }

    Ok(())
}
