//! HTTP surface tests driven through the router without binding a socket.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use carbon_ledger::api::{router, AppState};
use carbon_ledger::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let mut cfg = Config::default();
    cfg.simulation.seed = Some(42);
    cfg.simulation.max_readings = 5_000;
    router(AppState::new(cfg))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn simulate(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn chain() -> Value {
    json!({
        "nodes": [
            {
                "id": "cap",
                "type": "capture",
                "name": "Capture Unit",
                "params": {"base_flow": 150, "dropout": 0}
            },
            {"id": "pipe", "type": "transport", "params": {"base_leakage": 1.8}},
            {"id": "well", "type": "storage"}
        ],
        "edges": [
            {"source": "cap", "target": "pipe"},
            {"source": "pipe", "target": "well"}
        ],
        "jurisdiction": "puro",
        "metadata": {"interval_minutes": 1}
    })
}

#[tokio::test]
async fn root_reports_running() {
    let (status, body) = send(Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Carbon Operations Engine Running"}));
}

#[tokio::test]
async fn health_endpoints() {
    let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(Request::get("/health/live").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn simulate_chain_returns_ledger() {
    let (status, body) = send(simulate("/simulate?readings=60", chain())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["simulation_readings"], 60);
    assert_eq!(data["simulation_timestep_seconds"], 5);
    assert_eq!(data["simulation_duration_minutes"], 5.0);
    assert_eq!(data["jurisdiction_used"], "puro");
    assert_eq!(data["strategy_applied"], "Puro Biochar");
    assert_eq!(data["processing_order"], json!(["cap", "pipe", "well"]));
    assert_eq!(data["degraded"], false);
    assert_eq!(data["nodes"]["cap"]["name"], "Capture Unit");
    assert_eq!(data["nodes"]["pipe"]["name"], "pipe");
    assert_eq!(data["nodes"]["well"]["timeseries"].as_array().unwrap().len(), 60);
    assert_eq!(data["nodes"]["cap"]["timeseries"][0]["timestamp"], "2024-01-01T00:00:00");

    let captured = data["total_captured_co2_tonnes"].as_f64().unwrap();
    let stored = data["total_stored_or_utilized_co2_tonnes"].as_f64().unwrap();
    let net = data["total_net_co2_tonnes"].as_f64().unwrap();
    assert!(captured > stored);
    assert!((net - (captured - stored)).abs() < 1e-12);
}

#[tokio::test]
async fn seeded_runs_are_reproducible() {
    let (_, a) = send(simulate("/simulate?readings=30", chain())).await;
    let (_, b) = send(simulate("/simulate?readings=30", chain())).await;
    assert_eq!(a["data"]["nodes"], b["data"]["nodes"]);
    assert_ne!(a["data"]["run_id"], b["data"]["run_id"]);
}

#[tokio::test]
async fn default_readings_and_jurisdiction() {
    let graph = json!({"nodes": [{"id": "cap", "type": "capture"}]});
    let (status, body) = send(simulate("/simulate", graph)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["simulation_readings"], 720);
    assert_eq!(body["data"]["jurisdiction_used"], "epa");
    assert_eq!(body["data"]["strategy_applied"], "EPA Subpart RR");
}

#[tokio::test]
async fn structural_errors_are_bad_requests() {
    let dangling = json!({
        "nodes": [{"id": "cap", "type": "capture"}],
        "edges": [{"source": "cap", "target": "nowhere"}]
    });
    let (status, body) = send(simulate("/simulate?readings=10", dangling)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidGraph");
    assert!(body["message"].as_str().unwrap().contains("nowhere"));
    assert_eq!(body["detail"], body["message"]);

    let duplicate = json!({
        "nodes": [{"id": "a", "type": "capture"}, {"id": "a", "type": "storage"}]
    });
    let (status, _) = send(simulate("/simulate?readings=10", duplicate)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_param = json!({
        "nodes": [{"id": "cap", "type": "capture", "params": {"base_flow": "plenty"}}]
    });
    let (status, body) = send(simulate("/simulate?readings=10", bad_param)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("base_flow"));

    let negative_base = json!({
        "nodes": [{"id": "cap", "type": "capture", "params": {"base_flow": -10}}]
    });
    let (status, body) = send(simulate("/simulate?readings=10", negative_base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("non-negative"));
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let unknown_type = json!({"nodes": [{"id": "x", "type": "reactor"}]});
    let (status, body) = send(simulate("/simulate", unknown_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let empty_id = json!({"nodes": [{"id": "", "type": "capture"}]});
    let (status, body) = send(simulate("/simulate", empty_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let (status, _) = send(simulate("/simulate?readings=-5", chain())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(simulate("/simulate?readings=5001", chain())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("5000"));
}

#[tokio::test]
async fn null_metadata_is_treated_as_empty() {
    let graph = json!({
        "nodes": [
            {"id": "cap", "type": "capture", "metadata": null},
            {"id": "pipe", "type": "transport", "metadata": {"interval_minutes": 1}}
        ],
        "edges": [{"source": "cap", "target": "pipe"}],
        "jurisdiction": "alberta",
        "metadata": null
    });
    let (status, body) = send(simulate("/simulate?readings=20", graph)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["strategy_applied"], "Alberta TIER");
    assert_eq!(body["data"]["processing_order"], json!(["cap", "pipe"]));
}
