use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

pub mod config;
use config::{Args, load_config, setup_resolver, setup_tls_connector};
pub mod coordinator;
use coordinator::Coordinator;
pub mod error;
pub mod http_probe;
use http_probe::prelude::*;
pub mod report;
use report::Printer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let app_config = load_config(args)
        .await
        .context("Failed to load the url list")?;

    if app_config.urls.is_empty() {
        log::warn!("No urls to probe, use --datafile, --dataurl or pass them as arguments");
        return Ok(());
    }

    let tls_connector = setup_tls_connector().context("Failed to build TLS connector")?;
    let resolver =
        setup_resolver(&app_config.dns_hosts).context("Failed to set up the DNS resolver")?;

    let prober =
        Prober::new(tls_connector, app_config.timeout).accept_invalid_certs(app_config.insecure);
    let coordinator = Coordinator::new(resolver, prober).max_in_flight(app_config.max_in_flight);

    // A single printer task owns stdout, so concurrent probes never interleave a line.
    let printer = Printer::new(app_config.format, &app_config.urls);
    let (tx, rx) = mpsc::unbounded_channel();
    let printing = tokio::spawn(async move { printer.print_reports(rx).await });

    log::info!("Probing {} urls", app_config.urls.len());
    coordinator.run(app_config.urls, tx).await;

    let summary = printing.await?;
    log::info!(
        "Done: {} probes ({} failed), {} unresolved, {} malformed",
        summary.probes,
        summary.failed_probes,
        summary.unresolved,
        summary.malformed
    );

    Ok(())
}
