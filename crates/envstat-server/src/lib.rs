//! HTTP + WebSocket dashboard server for envstat.
//!
//! Serves the dashboard page, JSON telemetry endpoints and a `/ws` log stream
//! on top of a shared [`TelemetryService`]. The server never owns telemetry
//! state; it is handed the service and the log relay by the caller.

pub mod api;
pub mod page;
mod push;
mod sampler;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};

use envstat_core::{LogRelay, TelemetryService};

use api::{
    BatteryDetailResponse, DataResponse, ErrorResponse, HistoryResponse, ResetResponse,
    StatsResponse,
};

pub use push::CONNECTED_GREETING;
pub use sampler::spawn_sampler;

/// Shared server state.
pub struct AppState {
    pub service: Arc<TelemetryService>,
    pub relay: Arc<LogRelay>,
}

async fn handle_index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

async fn handle_data(State(state): State<Arc<AppState>>) -> Response {
    match state.service.current_data() {
        Ok(snapshot) => (
            [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
            Json(DataResponse::from(&snapshot)),
        )
            .into_response(),
        Err(e) => {
            log::debug!("/data unavailable: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Sensor unavailable", 503)),
            )
                .into_response()
        }
    }
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Response {
    // Host probes read procfs.
    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.current_stats()).await {
        Ok(health) => Json(StatsResponse::from(&health)).into_response(),
        Err(e) => {
            log::error!("/stats collection failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Stats unavailable", 500)),
            )
                .into_response()
        }
    }
}

async fn handle_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse::from(state.service.current_history()))
}

async fn handle_battery(State(state): State<Arc<AppState>>) -> Json<BatteryDetailResponse> {
    Json(BatteryDetailResponse::from(&state.service.battery_report()))
}

async fn handle_reset(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    state.service.reset();
    Json(ResetResponse { success: true })
}

async fn handle_not_found(method: Method, uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("404: Not Found\n\nURI: {uri}\nMethod: {method}\n"),
    )
}

/// Count every request, count 5xx responses as errors, and add CORS headers.
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    state.service.health().record_request();
    let mut response = next.run(request).await;
    if response.status().is_server_error() {
        state.service.health().record_error();
    }

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Build the axum router.
///
/// Routes are GET-only; any other method on a known path gets `405`.
pub fn build_router(service: Arc<TelemetryService>, relay: Arc<LogRelay>) -> Router {
    let state = Arc::new(AppState { service, relay });

    Router::new()
        .route("/", get(handle_index))
        .route("/data", get(handle_data))
        .route("/stats", get(handle_stats))
        .route("/history", get(handle_history))
        .route("/battery", get(handle_battery))
        .route("/reset", get(handle_reset))
        .route("/ws", get(push::handle_ws))
        .fallback(handle_not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            track_requests,
        ))
        .with_state(state)
}

/// Run the dashboard server until Ctrl-C.
pub async fn run_server(
    service: Arc<TelemetryService>,
    relay: Arc<LogRelay>,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let app = build_router(service, relay);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("HTTP server started on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use envstat_core::{
        HostSample, NetworkInfo, ReplaySensor, SensorError, ServiceConfig, SimulatedPower,
        StaticHostProbe,
    };
    use tower::ServiceExt;

    fn test_service(readings: Vec<(f64, f64)>) -> Arc<TelemetryService> {
        let config = ServiceConfig {
            network: NetworkInfo::new("lab-net", -67, "192.168.1.40"),
            ..ServiceConfig::default()
        };
        Arc::new(
            TelemetryService::new(config, Box::new(ReplaySensor::from_readings(readings)))
                .with_power(Box::new(SimulatedPower::fixed(3.85, false)))
                .with_host(Box::new(StaticHostProbe::new(HostSample {
                    free_heap_bytes: 200 * 1024,
                    total_heap_bytes: 320 * 1024,
                    cpu_usage_percent: 12.34,
                }))),
        )
    }

    fn router(service: &Arc<TelemetryService>) -> Router {
        build_router(Arc::clone(service), Arc::new(LogRelay::default()))
    }

    async fn send(app: Router, method: Method, uri: &str) -> Response {
        app.oneshot(
            axum::http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = send(app, Method::GET, uri).await;
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn data_before_first_sample_is_503() {
        let service = test_service(vec![(22.0, 50.0)]);
        let (status, json) = get_json(router(&service), "/data").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Sensor unavailable");
        assert_eq!(json["code"], 503);
        assert_eq!(service.health().error_count(), 1);
    }

    #[tokio::test]
    async fn data_reports_reading_and_statistics() {
        let service = test_service(vec![(23.5, 55.0), (25.0, 50.0)]);
        service.record_sample().unwrap();
        service.record_sample().unwrap();

        let resp = send(router(&service), Method::GET, "/data").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["temperature"], 25.0);
        assert_eq!(json["maxTemp"], 25.0);
        assert_eq!(json["minTemp"], 23.5);
        assert_eq!(json["maxHumid"], 55.0);
        assert_eq!(json["minHumid"], 50.0);
        assert!(json["dewPoint"].is_number());
        assert!(json["heatIndex"].is_number());
        assert!(json["timestamp"].as_u64().unwrap() >= 1);
        assert!(json["battery"]["voltage"].is_number());
        assert!(json["battery"]["status"].is_string());
    }

    #[tokio::test]
    async fn stats_formats_strings() {
        let service = test_service(vec![(22.0, 50.0)]);
        service.record_power();
        let (status, json) = get_json(router(&service), "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cpuUsage"], "12.3%");
        assert_eq!(json["heapUsage"], "37.5%");
        assert_eq!(json["freeHeap"], "200.0 KB");
        assert_eq!(json["rssi"], "-67 dBm");
        assert_eq!(json["ssid"], "lab-net");
        assert_eq!(json["ip"], "192.168.1.40");
        assert!(json["requests"].as_u64().unwrap() >= 1);
        assert_eq!(json["battery"]["voltage"], 3.85);
        assert_eq!(json["battery"]["source"], "Battery");
        assert_eq!(json["battery"]["isLow"], false);
        for key in ["percent", "status", "isCharging", "isUsb", "isCritical"] {
            assert!(json["battery"].get(key).is_some(), "missing battery.{key}");
        }
    }

    #[tokio::test]
    async fn history_arrays_match() {
        let service = test_service(vec![(21.04, 40.06), (22.0, 41.0)]);
        for _ in 0..3 {
            service.record_sample().unwrap();
        }
        let (status, json) = get_json(router(&service), "/history").await;
        assert_eq!(status, StatusCode::OK);
        let labels = json["labels"].as_array().unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(json["temp"].as_array().unwrap().len(), 3);
        assert_eq!(json["humid"].as_array().unwrap().len(), 3);
        assert_eq!(json["temp"][0], 21.0);
        assert_eq!(json["humid"][0], 40.1);
    }

    #[tokio::test]
    async fn reset_returns_success() {
        let service = test_service(vec![(18.0, 40.0), (26.0, 60.0)]);
        service.record_sample().unwrap();
        service.record_sample().unwrap();

        let (status, json) = get_json(router(&service), "/reset").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        let data = service.current_data().unwrap();
        assert_eq!(data.statistics.min_temp, 26.0);
        assert_eq!(data.statistics.max_temp, 26.0);
    }

    #[tokio::test]
    async fn reset_before_first_sample_still_succeeds() {
        let service = Arc::new(TelemetryService::new(
            ServiceConfig::default(),
            Box::new(ReplaySensor::new(vec![Err(SensorError::Unavailable(
                "no ack".into(),
            ))])),
        ));
        assert!(service.record_sample().is_err());

        let (status, json) = get_json(router(&service), "/reset").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "success": true }));
        assert!(service.current_data().is_err());
    }

    #[tokio::test]
    async fn battery_endpoint_reports_reads() {
        let service = test_service(vec![(22.0, 50.0)]);
        service.record_power();
        service.record_power();
        let (status, json) = get_json(router(&service), "/battery").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["readCount"], 2);
        assert!(json["lastUpdate"].as_u64().unwrap() >= 1);
        assert_eq!(json["voltage"], 3.85);
    }

    #[tokio::test]
    async fn index_page_has_dashboard_ids() {
        let service = test_service(vec![(22.0, 50.0)]);
        let resp = send(router(&service), Method::GET, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Environmental Statistics</title>"));
        for id in [
            "temperature",
            "humidity",
            "minTemp",
            "maxTemp",
            "avgTemp",
            "minHumid",
            "maxHumid",
            "avgHumid",
            "dewPoint",
            "heatIndex",
            "uptime",
            "freeHeap",
            "cpuUsage",
            "ssid",
            "rssi",
            "ipAddr",
            "historyChart",
            "logConsole",
            "wsStatus",
            "wsStatusText",
        ] {
            assert!(html.contains(&format!("id=\"{id}\"")), "missing #{id}");
        }
        assert!(html.contains("updateData"));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let service = test_service(vec![(22.0, 50.0)]);
        let resp = send(router(&service), Method::GET, "/nope").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/nope"));
        assert_eq!(service.health().request_count(), 1);
        assert_eq!(service.health().error_count(), 0);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let service = test_service(vec![(22.0, 50.0)]);
        service.record_sample().unwrap();
        let resp = send(router(&service), Method::POST, "/reset").await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let resp = send(router(&service), Method::DELETE, "/data").await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures_util::Stream<
                Item = Result<
                    tokio_tungstenite::tungstenite::Message,
                    tokio_tungstenite::tungstenite::Error,
                >,
            > + Unpin,
    {
        use futures_util::StreamExt;
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        loop {
            let frame = tokio::time::timeout(std::time::Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");
            if let WsMessage::Text(text) = frame {
                return text.as_str().to_string();
            }
        }
    }

    #[tokio::test]
    async fn ws_streams_greeting_backlog_and_live_lines() {
        let service = test_service(vec![(22.0, 50.0)]);
        let relay = Arc::new(LogRelay::default());
        relay.publish("T: 22.0°C | H: 50.0% | Avg: T=22.0°C H=50.0%");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(Arc::clone(&service), Arc::clone(&relay));
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();

        assert_eq!(next_text(&mut ws).await, CONNECTED_GREETING);
        assert_eq!(
            next_text(&mut ws).await,
            "T: 22.0°C | H: 50.0% | Avg: T=22.0°C H=50.0%"
        );
        assert_eq!(relay.subscriber_count(), 1);

        assert_eq!(relay.publish("✓ Min/Max have been reset"), 1);
        assert_eq!(next_text(&mut ws).await, "✓ Min/Max have been reset");

        ws.close(None).await.unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while relay.subscriber_count() > 0 && std::time::Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(relay.subscriber_count(), 0);

        server.abort();
    }

    #[tokio::test]
    async fn ws_without_upgrade_is_client_error() {
        let service = test_service(vec![(22.0, 50.0)]);
        let resp = send(router(&service), Method::GET, "/ws").await;
        assert!(resp.status().is_client_error());
    }
}
