use clap::ValueEnum;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::coordinator::Report;
use crate::http_probe::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One tab separated line per probe.
    Text,
    /// One JSON object per probe, newline delimited.
    Json,
}

/// Renders probe results. Owned by the single task that drains the report channel,
/// which keeps every line whole on stdout.
pub struct Printer {
    format: OutputFormat,
    uri_width: usize,
}

/// Tally of what a run reported, logged once the channel closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub probes: usize,
    pub failed_probes: usize,
    pub unresolved: usize,
    pub malformed: usize,
}

fn to_fixed_width(input: &str, width: usize) -> String {
    format!("{:<width$}", input, width = width)
}

/// Stand-in JSON line for a result that failed to serialize.
fn json_error_line(uri: &str, error: &str) -> String {
    serde_json::json!({ "uri": uri, "error": error }).to_string()
}

impl Printer {
    /// Pads the uri column to the longest input so text lines align.
    pub fn new(format: OutputFormat, inputs: &[String]) -> Self {
        let uri_width = inputs.iter().map(|i| i.chars().count()).max().unwrap_or(0);
        Self { format, uri_width }
    }

    pub fn render(&self, result: &ProbeResult) -> String {
        match self.format {
            OutputFormat::Text => self.render_text(result),
            OutputFormat::Json => serde_json::to_string(result)
                .unwrap_or_else(|e| json_error_line(&result.uri, &e.to_string())),
        }
    }

    fn render_text(&self, result: &ProbeResult) -> String {
        let code = result
            .http_status
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "Host: {} \tIP: {}\tCode: {}",
            to_fixed_width(&result.uri, self.uri_width),
            result.ip,
            code
        );
        if result.scheme == Scheme::Https {
            let days = result
                .cert_days_remaining
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!("\tSSL: {days}"));
        }
        if let Some(error) = &result.error {
            line.push_str(&format!("\tError: {error}"));
        }
        line
    }

    /// Drains the channel until every sender is gone, printing probes to stdout and
    /// diagnostics to the log.
    pub async fn print_reports(&self, mut reports: UnboundedReceiver<Report>) -> Summary {
        let mut summary = Summary::default();

        while let Some(report) = reports.recv().await {
            match report {
                Report::Probe(result) => {
                    summary.probes += 1;
                    if result.error.is_some() {
                        summary.failed_probes += 1;
                    }
                    println!("{}", self.render(&result));
                }
                Report::Unresolved { input, hostname } => {
                    summary.unresolved += 1;
                    log::warn!("Could not resolve {hostname} (from {input})");
                }
                Report::Malformed(e) => {
                    summary.malformed += 1;
                    log::warn!("Skipping {e}");
                }
            }
        }

        summary
    }
}
