//! Compute request client
//!
//! Serializes a completed selection into a request for the route service,
//! sends it once, and classifies whatever comes back into a
//! [`ComputeResponse`]. `submit` never fails: transport, protocol and
//! application problems all become [`ComputeResponse::Failure`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Header that flags a negative-cycle result on document responses
pub const NEGATIVE_CYCLE_HEADER: &str = "x-negative-cycle";

/// Message used when no response was received
pub const NETWORK_FAILURE_MESSAGE: &str = "network or server error";

/// Message used when a response was received but could not be understood
pub const MALFORMED_RESPONSE_MESSAGE: &str = "malformed server response";

/// Distinguishes artifacts stored within the same millisecond
static ARTIFACT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Body of a compute request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    #[serde(rename = "source")]
    pub source_id: u32,
    #[serde(rename = "destination")]
    pub destination_id: u32,
    #[serde(
        rename = "demo_negcycle",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub demo_negative_cycle: bool,
}

/// Paths listed in a summary before the rest are elided
pub const MAX_LISTED_PATHS: usize = 10;

/// One enumerated route and its total fare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedPath {
    pub path: Vec<String>,
    pub cost: f64,
}

/// Route details that accompany a JSON result, when the service sends them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSummary {
    /// Airport names along the cheapest route; empty when none is finite
    pub cheapest_path: Vec<String>,
    pub cheapest_cost: Option<f64>,
    /// Enumerated simple paths, in the order the service sent them
    pub all_paths: Vec<PricedPath>,
    /// Free-text remark from the service
    pub message: Option<String>,
}

impl RouteSummary {
    /// Whether there is anything besides the message to show
    pub fn has_routes(&self) -> bool {
        !self.cheapest_path.is_empty()
            || self.cheapest_cost.is_some()
            || !self.all_paths.is_empty()
    }

    fn is_empty(&self) -> bool {
        !self.has_routes() && self.message.is_none()
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if !self.cheapest_path.is_empty() {
            lines.push(format!("Cheapest path: {}", self.cheapest_path.join(" → ")));
        }
        if let Some(cost) = self.cheapest_cost {
            lines.push(format!("Total cheapest fare: {}", format_cost(cost)));
        }
        if !self.all_paths.is_empty() {
            let mut sorted: Vec<&PricedPath> = self.all_paths.iter().collect();
            sorted.sort_by(|a, b| a.cost.total_cmp(&b.cost));

            lines.push(format!("{} simple path(s), sorted by cost:", sorted.len()));
            for (i, p) in sorted.iter().take(MAX_LISTED_PATHS).enumerate() {
                lines.push(format!(
                    "{:3}. Cost = {} | Path: {}",
                    i + 1,
                    format_cost(p.cost),
                    p.path.join(" → ")
                ));
            }
            if sorted.len() > MAX_LISTED_PATHS {
                lines.push(format!("     ... {} more", sorted.len() - MAX_LISTED_PATHS));
            }
        }
        write!(f, "{}", lines.join("\n"))
    }
}

/// Fares are whole numbers in practice; print them without a fraction then
fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 && cost.abs() < 1e15 {
        format!("{}", cost as i64)
    } else {
        format!("{cost:.2}")
    }
}

/// Classified outcome of one compute request
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeResponse {
    Success {
        artifact: String,
        summary: Option<RouteSummary>,
    },
    /// The generated graph contained a negative-weight cycle; still viewable
    SuccessWithNegativeCycle {
        artifact: String,
        summary: Option<RouteSummary>,
    },
    Failure {
        message: String,
    },
}

impl ComputeResponse {
    /// Reference to the rendered result, for the two success variants
    pub fn artifact(&self) -> Option<&str> {
        match self {
            ComputeResponse::Success { artifact, .. }
            | ComputeResponse::SuccessWithNegativeCycle { artifact, .. } => Some(artifact),
            ComputeResponse::Failure { .. } => None,
        }
    }

    /// Route details sent alongside a success, if any
    pub fn summary(&self) -> Option<&RouteSummary> {
        match self {
            ComputeResponse::Success { summary, .. }
            | ComputeResponse::SuccessWithNegativeCycle { summary, .. } => summary.as_ref(),
            ComputeResponse::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.artifact().is_some()
    }
}

impl From<Error> for ComputeResponse {
    fn from(err: Error) -> Self {
        let message = match err {
            Error::NetworkError(_) => NETWORK_FAILURE_MESSAGE.to_string(),
            Error::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
            Error::ServerError(msg) => msg,
            Error::IoError(e) => format!("could not store result artifact: {e}"),
            other => other.to_string(),
        };
        ComputeResponse::Failure { message }
    }
}

/// Which of the two response contracts the service speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// `{status, map_file?, message?}` JSON body referencing a stored map
    #[default]
    Json,
    /// The rendered document itself, negative cycle flagged by header
    Document,
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseShape::Json),
            "document" | "doc" | "html" => Ok(ResponseShape::Document),
            other => Err(format!(
                "unknown response shape '{other}' (expected 'json' or 'document')"
            )),
        }
    }
}

/// Configuration for the compute client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the route service
    pub server_url: String,

    /// Path of the compute endpoint
    pub endpoint_path: String,

    /// Response contract to expect
    pub shape: ResponseShape,

    /// Overall request timeout; `None` leaves the transport default
    pub timeout: Option<Duration>,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Where document responses are stored
    pub artifact_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            endpoint_path: "/api/compute".to_string(),
            shape: ResponseShape::default(),
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            artifact_dir: PathBuf::from("static_maps"),
        }
    }
}

impl ClientConfig {
    /// Full URL of the compute endpoint
    pub fn endpoint_url(&self) -> String {
        join_url(&self.server_url, &self.endpoint_path)
    }
}

/// Join a base URL and a path without doubling or dropping the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Deserialize)]
struct JsonReply {
    status: Option<String>,
    map_file: Option<String>,
    message: Option<String>,
    cheapest_path: Option<Vec<String>>,
    cheapest_cost: Option<f64>,
    all_paths: Option<Vec<PricedPath>>,
}

impl JsonReply {
    fn summary(&self) -> Option<RouteSummary> {
        let summary = RouteSummary {
            cheapest_path: self.cheapest_path.clone().unwrap_or_default(),
            cheapest_cost: self.cheapest_cost,
            all_paths: self.all_paths.clone().unwrap_or_default(),
            message: self.message.clone(),
        };
        (!summary.is_empty()).then_some(summary)
    }
}

/// Sends compute requests; cheap to clone
#[derive(Debug, Clone)]
pub struct ComputeClient {
    http: Client,
    config: Arc<ClientConfig>,
}

impl ComputeClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("routepick/{}", env!("ROUTEPICK_VERSION")))
            .build()
            .map_err(|e| Error::InvalidInput(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying HTTP client, shared with the catalog loader
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Send one request and classify the reply. No retries.
    pub async fn submit(&self, request: &ComputeRequest) -> ComputeResponse {
        match self.try_submit(request).await {
            Ok(response) => {
                info!("Compute request {:?} -> {:?}", request, response);
                response
            }
            Err(e) => {
                warn!("Compute request {:?} failed: {}", request, e);
                e.into()
            }
        }
    }

    async fn try_submit(&self, request: &ComputeRequest) -> Result<ComputeResponse> {
        let url = self.config.endpoint_url();
        debug!("POST {url} {request:?}");

        let mut builder = self.http.post(&url).json(request);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;

        let status = response.status();
        let negative_cycle = negative_cycle_flag(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        debug!("HTTP {} with {} byte body", status, body.len());

        match self.config.shape {
            ResponseShape::Json => classify_json(status, &body),
            ResponseShape::Document => {
                classify_document(status, &body)?;
                let path = store_artifact(&self.config.artifact_dir, &body).await?;
                let artifact = path.to_string_lossy().into_owned();
                Ok(if negative_cycle {
                    ComputeResponse::SuccessWithNegativeCycle {
                        artifact,
                        summary: None,
                    }
                } else {
                    ComputeResponse::Success {
                        artifact,
                        summary: None,
                    }
                })
            }
        }
    }
}

fn negative_cycle_flag(headers: &HeaderMap) -> bool {
    headers
        .get(NEGATIVE_CYCLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        })
}

/// Classify a `{status, map_file?, message?}` reply and its optional route summary
pub fn classify_json(status: StatusCode, body: &[u8]) -> Result<ComputeResponse> {
    let reply: JsonReply = match serde_json::from_slice(body) {
        Ok(reply) => reply,
        // Proxies and crashed backends answer 5xx with HTML; that is the
        // server failing, not a protocol mismatch.
        Err(_) if status.is_server_error() => {
            return Err(Error::NetworkError(format!("HTTP {status} without JSON body")));
        }
        Err(e) => return Err(Error::MalformedResponse(e.to_string())),
    };

    match reply.status.as_deref() {
        Some(status @ ("ok" | "negcycle")) => {
            // An empty reference cannot be viewed
            let artifact = reply
                .map_file
                .clone()
                .filter(|file| !file.trim().is_empty())
                .ok_or_else(|| {
                    Error::MalformedResponse(format!("'{status}' reply without map_file"))
                })?;
            let summary = reply.summary();
            Ok(if status == "ok" {
                ComputeResponse::Success { artifact, summary }
            } else {
                ComputeResponse::SuccessWithNegativeCycle { artifact, summary }
            })
        }
        Some("error") => Err(Error::ServerError(
            reply.message.unwrap_or_else(|| "unknown".to_string()),
        )),
        Some(other) => Err(Error::MalformedResponse(format!("unknown status '{other}'"))),
        None => Err(Error::MalformedResponse("reply without status".to_string())),
    }
}

/// Validate a document reply; the body itself is the artifact
pub fn classify_document(status: StatusCode, body: &[u8]) -> Result<()> {
    if !status.is_success() {
        let message = serde_json::from_slice::<JsonReply>(body)
            .ok()
            .and_then(|reply| reply.message)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| "unknown".to_string());
        return Err(Error::ServerError(message));
    }

    if body.is_empty() {
        return Err(Error::MalformedResponse("empty document".to_string()));
    }

    Ok(())
}

async fn store_artifact(dir: &Path, body: &Bytes) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = ARTIFACT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = dir.join(format!("result_map_{millis}_{seq}.html"));

    tokio::fs::write(&path, body).await?;
    debug!("Stored result artifact at {}", path.display());
    Ok(path)
}
