//! Result presentation
//!
//! Turns a classified [`ComputeResponse`] into something the user sees:
//! the artifact opened in a viewer, or an error notice.

use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, warn};
use reqwest::Url;

use crate::core::client::{join_url, ComputeResponse, RouteSummary};
use crate::core::error::{Error, Result};
use crate::core::notify::Notifier;

/// Shown after the viewer opens a negative-cycle result
pub const NEGATIVE_CYCLE_NOTICE: &str =
    "Negative cycle detected in generated graph (demo): no finite cheapest path exists";

/// Something that can display a result artifact
pub trait ResultViewer: Send + Sync {
    /// Open the artifact and return the location that was opened
    fn open(&self, artifact: &str) -> Result<String>;
}

/// Resolves artifacts into result page URLs or local files
#[derive(Debug, Clone, Default)]
pub struct RouteViewer {
    /// Server serving `/result?map=...`; `None` treats artifacts as local files
    result_base: Option<String>,
    /// Hand the location to the platform opener
    launch: bool,
}

impl RouteViewer {
    /// Viewer for JSON replies whose `map_file` is served by `server_url`
    pub fn for_server(server_url: impl Into<String>) -> Self {
        Self {
            result_base: Some(server_url.into()),
            launch: false,
        }
    }

    /// Viewer for documents stored on local disk
    pub fn for_local_files() -> Self {
        Self::default()
    }

    pub fn with_launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    /// Where an artifact can be viewed
    pub fn location(&self, artifact: &str) -> Result<String> {
        if artifact.starts_with("http://") || artifact.starts_with("https://") {
            return Ok(artifact.to_string());
        }

        match &self.result_base {
            Some(base) => {
                let page = join_url(base, "/result");
                let url = Url::parse_with_params(&page, &[("map", artifact)])
                    .map_err(|e| Error::InvalidInput(format!("bad result URL {page}: {e}")))?;
                Ok(url.to_string())
            }
            None => {
                let path = Path::new(artifact);
                let absolute = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    std::env::current_dir()?.join(path)
                };
                Url::from_file_path(&absolute)
                    .map(|u| u.to_string())
                    .map_err(|_| {
                        Error::InvalidInput(format!("bad artifact path {}", absolute.display()))
                    })
            }
        }
    }
}

impl ResultViewer for RouteViewer {
    fn open(&self, artifact: &str) -> Result<String> {
        let location = self.location(artifact)?;
        if self.launch {
            launch_system_opener(&location)?;
        }
        Ok(location)
    }
}

/// Open a location with the desktop's default handler
fn launch_system_opener(location: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };

    debug!("Launching viewer for {location}");
    command
        .arg(location)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// What the presenter did with a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Viewer opened at this location
    Opened(String),
    /// Viewer opened, followed by the negative-cycle notice
    OpenedWithNotice(String),
    /// Nothing opened; the message was shown to the user
    Failed(String),
}

/// Hands results to a viewer and reports failures
pub struct ResultPresenter {
    viewer: Box<dyn ResultViewer>,
    notifier: Notifier,
}

impl ResultPresenter {
    pub fn new(viewer: Box<dyn ResultViewer>, notifier: Notifier) -> Self {
        Self { viewer, notifier }
    }

    pub fn present(&self, response: &ComputeResponse) -> Presentation {
        match response {
            ComputeResponse::Success { artifact, summary } => match self.open(artifact) {
                Ok(location) => {
                    self.show_routes(summary.as_ref());
                    Presentation::Opened(location)
                }
                Err(message) => Presentation::Failed(message),
            },
            ComputeResponse::SuccessWithNegativeCycle { artifact, summary } => {
                match self.open(artifact) {
                    Ok(location) => {
                        let notice = summary
                            .as_ref()
                            .and_then(|s| s.message.as_deref())
                            .filter(|m| !m.trim().is_empty())
                            .unwrap_or(NEGATIVE_CYCLE_NOTICE);
                        self.notifier.info(notice);
                        self.show_routes(summary.as_ref());
                        Presentation::OpenedWithNotice(location)
                    }
                    Err(message) => Presentation::Failed(message),
                }
            }
            ComputeResponse::Failure { message } => {
                self.notifier.error(format!("Error: {message}"));
                self.notifier.info("Reset to choose a new pair");
                Presentation::Failed(message.clone())
            }
        }
    }

    fn show_routes(&self, summary: Option<&RouteSummary>) {
        if let Some(summary) = summary.filter(|s| s.has_routes()) {
            self.notifier.info(summary.to_string());
        }
    }

    fn open(&self, artifact: &str) -> std::result::Result<String, String> {
        match self.viewer.open(artifact) {
            Ok(location) => {
                self.notifier.info(format!("Result ready: {location}"));
                Ok(location)
            }
            Err(e) => {
                warn!("Viewer failed for {artifact}: {e}");
                let message = format!("Could not open result: {e}");
                self.notifier.error(message.clone());
                Err(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::PricedPath;
    use crate::core::notify::Notice;
    use std::sync::{Arc, Mutex};

    /// Records opened artifacts and marks the moment on the notice channel
    struct RecordingViewer {
        opened: Arc<Mutex<Vec<String>>>,
        notifier: Notifier,
        fail: bool,
    }

    impl ResultViewer for RecordingViewer {
        fn open(&self, artifact: &str) -> Result<String> {
            if self.fail {
                return Err(Error::InvalidInput("no display".into()));
            }
            self.opened.lock().unwrap().push(artifact.to_string());
            self.notifier.send(Notice::Busy(format!("viewing {artifact}")));
            Ok(artifact.to_string())
        }
    }

    type Notices = tokio::sync::mpsc::UnboundedReceiver<Notice>;

    fn presenter(fail: bool) -> (ResultPresenter, Arc<Mutex<Vec<String>>>, Notices) {
        let (notifier, rx) = Notifier::channel();
        let opened = Arc::new(Mutex::new(Vec::new()));
        let viewer = RecordingViewer {
            opened: opened.clone(),
            notifier: notifier.clone(),
            fail,
        };
        (ResultPresenter::new(Box::new(viewer), notifier), opened, rx)
    }

    fn success(artifact: &str) -> ComputeResponse {
        ComputeResponse::Success {
            artifact: artifact.into(),
            summary: None,
        }
    }

    fn drain(rx: &mut Notices) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    #[test]
    fn test_success_opens_viewer() {
        let (p, opened, _rx) = presenter(false);
        let result = p.present(&success("abc"));
        assert_eq!(result, Presentation::Opened("abc".into()));
        assert_eq!(*opened.lock().unwrap(), vec!["abc".to_string()]);
    }

    #[test]
    fn test_negative_cycle_notice_follows_viewer() {
        let (p, _opened, mut rx) = presenter(false);
        let result = p.present(&ComputeResponse::SuccessWithNegativeCycle {
            artifact: "abc".into(),
            summary: None,
        });
        assert_eq!(result, Presentation::OpenedWithNotice("abc".into()));

        assert_eq!(rx.try_recv().unwrap(), Notice::Busy("viewing abc".into()));
        assert_eq!(rx.try_recv().unwrap(), Notice::Info("Result ready: abc".into()));
        assert_eq!(rx.try_recv().unwrap(), Notice::Info(NEGATIVE_CYCLE_NOTICE.into()));
    }

    #[test]
    fn test_plain_success_has_no_cycle_notice() {
        let (p, _opened, mut rx) = presenter(false);
        p.present(&success("abc"));
        while let Ok(notice) = rx.try_recv() {
            assert_ne!(notice, Notice::Info(NEGATIVE_CYCLE_NOTICE.into()));
        }
    }

    #[test]
    fn test_route_summary_follows_viewer() {
        let (p, _opened, mut rx) = presenter(false);
        let summary = RouteSummary {
            cheapest_path: vec!["Mumbai".into(), "Chennai".into()],
            cheapest_cost: Some(5100.0),
            ..Default::default()
        };
        p.present(&ComputeResponse::Success {
            artifact: "abc".into(),
            summary: Some(summary),
        });

        assert_eq!(
            drain(&mut rx),
            vec![
                Notice::Busy("viewing abc".into()),
                Notice::Info("Result ready: abc".into()),
                Notice::Info(
                    "Cheapest path: Mumbai → Chennai\nTotal cheapest fare: 5100".into()
                ),
            ]
        );
    }

    #[test]
    fn test_negative_cycle_prefers_server_message() {
        let (p, _opened, mut rx) = presenter(false);
        let summary = RouteSummary {
            all_paths: vec![PricedPath {
                path: vec!["Mumbai".into(), "Nagpur".into()],
                cost: 1800.0,
            }],
            message: Some("Negative cycle detected in generated graph (demo).".into()),
            ..Default::default()
        };
        p.present(&ComputeResponse::SuccessWithNegativeCycle {
            artifact: "abc".into(),
            summary: Some(summary),
        });

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 4);
        assert_eq!(notices[1], Notice::Info("Result ready: abc".into()));
        assert_eq!(
            notices[2],
            Notice::Info("Negative cycle detected in generated graph (demo).".into())
        );
        assert!(matches!(&notices[3], Notice::Info(m) if m.contains("Mumbai → Nagpur")));
    }

    #[test]
    fn test_negative_cycle_message_only_summary() {
        let (p, _opened, mut rx) = presenter(false);
        p.present(&ComputeResponse::SuccessWithNegativeCycle {
            artifact: "abc".into(),
            summary: Some(RouteSummary {
                message: Some("cycle!".into()),
                ..Default::default()
            }),
        });
        let notices = drain(&mut rx);
        assert_eq!(notices.last(), Some(&Notice::Info("cycle!".into())));
        assert_eq!(notices.len(), 3);
    }

    #[test]
    fn test_failure_shows_message_and_opens_nothing() {
        let (p, opened, mut rx) = presenter(false);
        let result = p.present(&ComputeResponse::Failure {
            message: "bad input".into(),
        });
        assert_eq!(result, Presentation::Failed("bad input".into()));
        assert!(opened.lock().unwrap().is_empty());
        assert_eq!(rx.try_recv().unwrap(), Notice::Error("Error: bad input".into()));
    }

    #[test]
    fn test_viewer_failure_is_reported() {
        let (p, _opened, mut rx) = presenter(true);
        let result = p.present(&ComputeResponse::SuccessWithNegativeCycle {
            artifact: "abc".into(),
            summary: None,
        });
        assert!(matches!(result, Presentation::Failed(_)));
        match rx.try_recv().unwrap() {
            Notice::Error(m) => assert!(m.contains("no display")),
            other => panic!("Expected error notice, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_route_viewer_server_location() {
        let viewer = RouteViewer::for_server("http://127.0.0.1:5000/");
        let location = viewer.location("/static_maps/result_map_1.html").unwrap();
        assert_eq!(
            location,
            "http://127.0.0.1:5000/result?map=%2Fstatic_maps%2Fresult_map_1.html"
        );
        assert_eq!(
            viewer.location("https://maps.example/r/1").unwrap(),
            "https://maps.example/r/1"
        );
    }

    #[test]
    fn test_route_viewer_local_file_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("result_map_1.html");
        let viewer = RouteViewer::for_local_files();
        let location = viewer.open(file.to_str().unwrap()).unwrap();
        assert!(location.starts_with("file://"));
        assert!(location.ends_with("result_map_1.html"));
    }
}
