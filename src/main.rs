//! # Routepick CLI
//!
//! Command-line interface for the routepick library.
//! Pick a source and destination airport in the terminal and open the route
//! map computed by the route service.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::error;
use routepick::{
    AirportCatalog, CatalogSource, ClientConfig, ComputeClient, Notifier, Presentation,
    ResponseShape, SessionEvent, SessionOptions, SessionReport,
};
use tokio::io::BufReader;
use tokio::sync::mpsc;

mod cli;

/// Command-line interface for routepick
#[derive(Parser)]
#[command(name = "routepick")]
#[command(about = "Pick two airports and compute the cheapest route between them")]
#[command(long_about = "Pick a source and a destination airport, send them to the route service
and open the resulting route map:
  routepick                                  # Interactive: type ids or names
  routepick --source Mumbai --destination 3  # One-shot, non-interactive
  routepick --list                           # Print the airport catalog
  routepick --map-out airports_map.html      # Write a Leaflet map of the airports

Response contracts:
  --shape json                               # {status, map_file, message} (default)
  --shape document                           # Raw HTML, X-Negative-Cycle header")]
#[command(version = env!("ROUTEPICK_VERSION"))]
struct Cli {
    /// Base URL of the route service
    #[arg(long, env = "ROUTEPICK_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Path of the compute endpoint on the server
    #[arg(long, env = "ROUTEPICK_ENDPOINT", default_value = "/api/compute")]
    endpoint: String,

    /// JSON file with the airport catalog ([{id, name, lat, lon}, ...])
    #[arg(long, env = "ROUTEPICK_CATALOG", conflicts_with = "catalog_url")]
    catalog: Option<PathBuf>,

    /// URL returning the airport catalog as JSON
    #[arg(long)]
    catalog_url: Option<String>,

    /// Response contract of the compute endpoint: json or document
    #[arg(long, default_value = "json")]
    shape: ResponseShape,

    /// Ask the service to inject a negative cycle (demo)
    #[arg(long)]
    demo_negcycle: bool,

    /// Overall request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for result documents (document shape only)
    #[arg(long, default_value = "static_maps")]
    artifact_dir: PathBuf,

    /// Write a Leaflet map of the airports to this file
    #[arg(long)]
    map_out: Option<PathBuf>,

    /// Open results in the default browser
    #[arg(long)]
    open: bool,

    /// Print the airport catalog and exit
    #[arg(long)]
    list: bool,

    /// Source airport (id or name) for a one-shot run
    #[arg(long, requires = "destination")]
    source: Option<String>,

    /// Destination airport (id or name) for a one-shot run
    #[arg(long, requires = "source")]
    destination: Option<String>,

    /// Validate the selection and show the request without sending it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn catalog_source(&self) -> CatalogSource {
        match (&self.catalog, &self.catalog_url) {
            (Some(path), _) => CatalogSource::File(path.clone()),
            (None, Some(url)) => CatalogSource::Url(url.clone()),
            (None, None) => CatalogSource::Builtin,
        }
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            client: ClientConfig {
                server_url: self.server.clone(),
                endpoint_path: self.endpoint.clone(),
                shape: self.shape,
                timeout: self.timeout.map(Duration::from_secs),
                artifact_dir: self.artifact_dir.clone(),
                ..Default::default()
            },
            demo_negative_cycle: self.demo_negcycle,
            launch_viewer: self.open,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🛫 Routepick v{} starting...", env!("ROUTEPICK_VERSION"));
    }

    let options = cli.session_options();
    let client =
        ComputeClient::new(options.client.clone()).context("invalid client configuration")?;

    let source = cli.catalog_source();
    let catalog = routepick::load_catalog(&source, client.http())
        .await
        .with_context(|| format!("could not load airport catalog from {source:?}"))?;

    if cli.list {
        print!("{}", routepick::format_catalog(&catalog));
        return Ok(());
    }

    if let Some(path) = &cli.map_out {
        routepick::write_leaflet_map(&catalog, path)
            .with_context(|| format!("could not write map to {}", path.display()))?;
        eprintln!("🗺️  Airport map written to {}", path.display());
    }

    match (&cli.source, &cli.destination) {
        (Some(from), Some(to)) if cli.dry_run => dry_run(&catalog, from, to, &options),
        (Some(from), Some(to)) => one_shot(catalog, client, &options, from, to).await,
        _ if cli.dry_run => {
            eprintln!("🔍 [DRY RUN] Would post selections to {}", options.client.endpoint_url());
            Ok(())
        }
        _ => interactive(catalog, client, &options).await,
    }
}

/// Validate a pair and print the request body that would be sent
fn dry_run(
    catalog: &AirportCatalog,
    from: &str,
    to: &str,
    options: &SessionOptions,
) -> anyhow::Result<()> {
    let mut machine =
        routepick::SelectionStateMachine::new(Arc::new(catalog.clone()), Notifier::silent())
            .with_demo_negative_cycle(options.demo_negative_cycle);
    machine.pick_by_name(from)?;
    match machine.pick_by_name(to)? {
        routepick::PickOutcome::Dispatch(ticket) => {
            eprintln!("🔍 [DRY RUN] Would POST to {}", options.client.endpoint_url());
            println!("{}", serde_json::to_string(&ticket.request)?);
            Ok(())
        }
        routepick::PickOutcome::SourceSet(_) => bail!("destination was not accepted"),
    }
}

/// Run a session fed by command-line arguments instead of the terminal
async fn one_shot(
    catalog: AirportCatalog,
    client: ComputeClient,
    options: &SessionOptions,
    from: &str,
    to: &str,
) -> anyhow::Result<()> {
    let (notifier, notices) = Notifier::channel();
    let printer = tokio::spawn(cli::print_notices(notices));

    let (tx, rx) = mpsc::channel(2);
    tx.send(SessionEvent::ActivateByName(from.to_string())).await?;
    tx.send(SessionEvent::ActivateByName(to.to_string())).await?;
    drop(tx);

    let mut session = routepick::build_session(Arc::new(catalog), client, options, notifier);
    let report = session.run(rx).await;
    drop(session);
    printer.await?;

    check_report(&report)
}

fn check_report(report: &SessionReport) -> anyhow::Result<()> {
    if report.dispatched == 0 {
        bail!("selection was rejected, no route requested");
    }
    for presentation in &report.presented {
        match presentation {
            Presentation::Opened(location) | Presentation::OpenedWithNotice(location) => {
                println!("{location}");
            }
            Presentation::Failed(message) => bail!("route computation failed: {message}"),
        }
    }
    for summary in &report.routes {
        println!("{summary}");
    }
    Ok(())
}

/// Terminal session: read commands from stdin until quit or end of input
async fn interactive(
    catalog: AirportCatalog,
    client: ComputeClient,
    options: &SessionOptions,
) -> anyhow::Result<()> {
    let catalog = Arc::new(catalog);
    let (notifier, notices) = Notifier::channel();
    let printer = tokio::spawn(cli::print_notices(notices));

    eprintln!("🛫 {} airports loaded. Type an id or name to pick the source.", catalog.len());
    eprintln!("{}", routepick::core::surface::HELP_TEXT);

    let (tx, rx) = mpsc::channel(16);
    let mut session =
        routepick::build_session(catalog.clone(), client, options, notifier.clone());
    let stdin = BufReader::new(tokio::io::stdin());

    let (report, read) = tokio::join!(
        session.run(rx),
        cli::read_commands(stdin, &catalog, tx, notifier)
    );
    drop(session);
    printer.await?;

    read.context("failed to read from stdin")?;
    log::info!(
        "Session finished: {} request(s), {} presented, {} stale",
        report.dispatched,
        report.presented.len(),
        report.stale
    );
    Ok(())
}
