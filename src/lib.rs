//! # Routepick Library
//!
//! Pick a source and a destination airport, send them to a route computation
//! service, and open the rendered result.
//!
//! ## Features
//!
//! - **Selection state machine**: two picks become exactly one request
//! - **Typed compute contract**: success, negative-cycle success, or failure
//! - **Stale response guard**: replies to a reset selection are never shown
//! - **Non-blocking notices**: UI messages travel over a channel
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use routepick::{AirportCatalog, ClientConfig, ComputeResponse};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = AirportCatalog::builtin();
//!     let config = ClientConfig::default();
//!     let response = routepick::compute_route(&catalog, "Mumbai", "Chennai", config).await?;
//!
//!     if let ComputeResponse::Success { artifact, .. } = response {
//!         println!("Result map: {artifact}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive sessions
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use routepick::{AirportCatalog, ComputeClient, Notifier, SessionEvent, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (notifier, _notices) = Notifier::channel();
//!     let options = SessionOptions::default();
//!     let client = ComputeClient::new(options.client.clone())?;
//!     let catalog = Arc::new(AirportCatalog::builtin());
//!     let mut session = routepick::build_session(catalog, client, &options, notifier);
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(8);
//!     tx.send(SessionEvent::Activate(0)).await?;
//!     tx.send(SessionEvent::Activate(3)).await?;
//!     drop(tx);
//!
//!     let report = session.run(rx).await;
//!     println!("{} request(s) sent", report.dispatched);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

// Re-export core types that users might need
pub use crate::core::catalog::{AirportCatalog, Point};
pub use crate::core::client::{
    ClientConfig, ComputeClient, ComputeRequest, ComputeResponse, PricedPath, ResponseShape,
    RouteSummary,
};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::notify::{Notice, Notifier};
pub use crate::core::presenter::{Presentation, ResultPresenter, ResultViewer, RouteViewer};
pub use crate::core::selection::{
    DispatchTicket, Phase, PickOutcome, Selection, SelectionStateMachine,
};
pub use crate::core::session::{Session, SessionEvent, SessionReport};
pub use crate::core::surface::{
    format_catalog, parse_command, render_leaflet_map, write_leaflet_map, SurfaceCommand,
};

pub mod core;

/// Where the airport catalog comes from
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogSource {
    /// The bundled twenty-airport list
    #[default]
    Builtin,
    /// JSON file of `{id, name, lat, lon}` records
    File(PathBuf),
    /// `GET` endpoint returning the same records
    Url(String),
}

/// Load the catalog once at start-up
pub async fn load_catalog(
    source: &CatalogSource,
    http: &reqwest::Client,
) -> Result<AirportCatalog> {
    debug!("Loading catalog from {source:?}");
    match source {
        CatalogSource::Builtin => Ok(AirportCatalog::builtin()),
        CatalogSource::File(path) => AirportCatalog::from_file(path),
        CatalogSource::Url(url) => AirportCatalog::fetch(http, url).await,
    }
}

/// Settings for an interactive session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub client: ClientConfig,
    /// Ask the service to inject a negative cycle
    pub demo_negative_cycle: bool,
    /// Open results with the desktop's default handler
    pub launch_viewer: bool,
}

/// Wire a session together from its parts
///
/// JSON replies reference maps served by the compute server, so they are
/// viewed through its result page; document replies are stored locally.
pub fn build_session(
    catalog: Arc<AirportCatalog>,
    client: ComputeClient,
    options: &SessionOptions,
    notifier: Notifier,
) -> Session {
    let viewer = match options.client.shape {
        ResponseShape::Json => RouteViewer::for_server(options.client.server_url.clone()),
        ResponseShape::Document => RouteViewer::for_local_files(),
    }
    .with_launch(options.launch_viewer);

    let machine = SelectionStateMachine::new(catalog, notifier.clone())
        .with_demo_negative_cycle(options.demo_negative_cycle);
    let presenter = ResultPresenter::new(Box::new(viewer), notifier.clone());

    Session::new(machine, client, presenter, notifier)
}

/// Validate a source/destination pair and send one compute request
///
/// Tokens are ids or airport names. Validation problems (unknown airport,
/// same airport twice) are returned as errors; everything after dispatch is
/// reported through the [`ComputeResponse`].
pub async fn compute_route(
    catalog: &AirportCatalog,
    source: &str,
    destination: &str,
    config: ClientConfig,
) -> Result<ComputeResponse> {
    let mut machine = SelectionStateMachine::new(Arc::new(catalog.clone()), Notifier::silent());
    machine.pick_by_name(source)?;
    let ticket = match machine.pick_by_name(destination)? {
        PickOutcome::Dispatch(ticket) => ticket,
        PickOutcome::SourceSet(_) => {
            return Err(Error::InvalidInput("destination was not accepted".to_string()))
        }
    };

    let client = ComputeClient::new(config)?;
    Ok(client.submit(&ticket.request).await)
}
