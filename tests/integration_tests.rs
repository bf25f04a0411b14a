//! Integration tests for routepick
//!
//! Whole sessions run against a mock route service, and the built binary is
//! exercised for its non-interactive modes. No real network access is needed.

use std::sync::Arc;
use std::time::Duration;

use routepick::{
    AirportCatalog, ClientConfig, ComputeClient, Error, Notice, Notifier, Presentation,
    ResponseShape, SessionEvent, SessionOptions,
};
use serde_json::json;
use tokio::process::Command;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options_for(
    server: &MockServer,
    shape: ResponseShape,
    dir: &std::path::Path,
) -> SessionOptions {
    SessionOptions {
        client: ClientConfig {
            server_url: server.uri(),
            shape,
            artifact_dir: dir.to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn run_session(
    options: &SessionOptions,
    events: Vec<SessionEvent>,
) -> (routepick::SessionReport, Vec<Notice>) {
    let (notifier, mut notices) = Notifier::channel();
    let client = ComputeClient::new(options.client.clone()).unwrap();
    let mut session = routepick::build_session(
        Arc::new(AirportCatalog::builtin()),
        client,
        options,
        notifier,
    );

    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        tx.send(event).await.unwrap();
    }
    drop(tx);

    let report = session.run(rx).await;
    drop(session);

    let mut collected = Vec::new();
    while let Some(notice) = notices.recv().await {
        collected.push(notice);
    }
    (report, collected)
}

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_routepick"))
}

#[tokio::test]
async fn test_negative_cycle_session_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/compute"))
        .and(body_json(json!({"source": 0, "destination": 11, "demo_negcycle": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "negcycle",
            "message": "Negative cycle detected in generated graph (demo).",
            "map_file": "/static_maps/result_map_1.html"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = options_for(&server, ResponseShape::Json, dir.path());
    options.demo_negative_cycle = true;

    let (report, notices) = run_session(
        &options,
        vec![
            SessionEvent::ActivateByName("Mumbai".into()),
            SessionEvent::ActivateByName("nagpur".into()),
        ],
    )
    .await;

    let expected = format!(
        "{}/result?map=%2Fstatic_maps%2Fresult_map_1.html",
        server.uri()
    );
    assert_eq!(report.presented, vec![Presentation::OpenedWithNotice(expected.clone())]);

    // Busy before the request, idle after, then the viewer, then the notice
    let busy = notices.iter().position(|n| matches!(n, Notice::Busy(_))).unwrap();
    let idle = notices.iter().position(|n| *n == Notice::Idle).unwrap();
    let ready = notices
        .iter()
        .position(|n| *n == Notice::Info(format!("Result ready: {expected}")))
        .unwrap();
    let cycle = notices
        .iter()
        .position(|n| {
            *n == Notice::Info("Negative cycle detected in generated graph (demo).".into())
        })
        .unwrap();
    assert!(busy < idle && idle < ready && ready < cycle);
    assert!(report.routes.is_empty());
}

#[tokio::test]
async fn test_rejected_picks_are_reported_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "map_file": "x"})),
        )
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let options = options_for(&server, ResponseShape::Json, dir.path());
    let (report, notices) = run_session(
        &options,
        vec![
            SessionEvent::Activate(42),
            SessionEvent::Activate(2),
            SessionEvent::Activate(2),
            SessionEvent::ActivateByName("Bengaluu".into()),
        ],
    )
    .await;

    assert_eq!(report.dispatched, 0);
    let warnings: Vec<_> = notices
        .iter()
        .filter_map(|n| match n {
            Notice::Warning(m) => Some(m.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        warnings,
        vec![
            "Airport 42 not found",
            "Source and destination must differ",
            "Airport 'Bengaluu' not found. Did you mean 'Bengaluru'?",
        ]
    );
}

#[tokio::test]
async fn test_document_shape_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>route</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let options = options_for(&server, ResponseShape::Document, dir.path());
    let (report, _) = run_session(
        &options,
        vec![SessionEvent::Activate(1), SessionEvent::Activate(9)],
    )
    .await;

    match &report.presented[..] {
        [Presentation::Opened(location)] => {
            assert!(location.starts_with("file://"));
            assert!(location.contains("result_map_"));
        }
        other => panic!("Expected one opened document, got {other:?}"),
    }
    let stored: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_reset_while_in_flight_drops_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "map_file": "late"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let options = options_for(&server, ResponseShape::Json, dir.path());
    let (report, notices) = run_session(
        &options,
        vec![
            SessionEvent::Activate(0),
            SessionEvent::Activate(1),
            SessionEvent::Reset,
        ],
    )
    .await;

    assert_eq!(report.stale, 1);
    assert!(report.presented.is_empty());
    assert!(!notices
        .iter()
        .any(|n| matches!(n, Notice::Info(m) if m.starts_with("Result ready"))));
}

#[tokio::test]
async fn test_compute_route_helper() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"source": 6, "destination": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "map_file": "abc",
            "cheapest_path": ["Pune", "Hyderabad", "Bengaluru"],
            "cheapest_cost": 3900,
            "all_paths": [{"path": ["Pune", "Hyderabad", "Bengaluru"], "cost": 3900}]
        })))
        .mount(&server)
        .await;

    let catalog = AirportCatalog::builtin();
    let config = ClientConfig {
        server_url: server.uri(),
        ..Default::default()
    };

    let response = routepick::compute_route(&catalog, "Pune", "2", config.clone())
        .await
        .unwrap();
    assert_eq!(response.artifact(), Some("abc"));
    let summary = response.summary().unwrap();
    assert_eq!(summary.cheapest_path, vec!["Pune", "Hyderabad", "Bengaluru"]);
    assert_eq!(summary.cheapest_cost, Some(3900.0));

    let err = routepick::compute_route(&catalog, "Pune", "pune", config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SamePoint(6)));
}

#[tokio::test]
async fn test_binary_list() {
    let output = binary().arg("--list").output().await.unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Mumbai"));
    assert!(stdout.contains("Thiruvananthapuram"));
}

#[tokio::test]
async fn test_binary_dry_run_prints_request() {
    let output = binary()
        .args(["--source", "Mumbai", "--destination", "Chennai", "--dry-run", "--demo-negcycle"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body, json!({"source": 0, "destination": 3, "demo_negcycle": true}));
}

#[tokio::test]
async fn test_binary_one_shot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/compute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "map_file": "/static_maps/result_map_2.html",
            "cheapest_path": ["Mumbai", "Delhi"],
            "cheapest_cost": 4500,
            "all_paths": [
                {"path": ["Mumbai", "Delhi"], "cost": 4500},
                {"path": ["Mumbai", "Ahmedabad", "Delhi"], "cost": 6100}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = binary()
        .args(["--server", &server.uri(), "--source", "0", "--destination", "Delhi"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/result?map=%2Fstatic_maps%2Fresult_map_2.html"));
    assert!(stdout.contains("Cheapest path: Mumbai → Delhi"));
    assert!(stdout.contains("Total cheapest fare: 4500"));
    assert!(stdout.contains("2. Cost = 6100 | Path: Mumbai → Ahmedabad → Delhi"));
}

#[tokio::test]
async fn test_binary_one_shot_failure_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"status": "error", "message": "destination unreachable"})),
        )
        .mount(&server)
        .await;

    let output = binary()
        .args(["--server", &server.uri(), "--source", "0", "--destination", "1"])
        .output()
        .await
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("destination unreachable"));
}

#[tokio::test]
async fn test_binary_same_airport_rejected() {
    let output = binary()
        .args(["--source", "5", "--destination", "Hyderabad", "--dry-run"])
        .output()
        .await
        .unwrap();
    assert!(!output.status.success());
}
