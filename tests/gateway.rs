//! End-to-end tests over the gateway's HTTP and WebSocket surface.

#![allow(clippy::panic, missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use worker_monitor::api;
use worker_monitor::app_state::AppState;
use worker_monitor::domain::{BusEvent, ConnectionId, EventBus, EventRule, STATUS_UPDATE};
use worker_monitor::error::{GatewayError, SendError};
use worker_monitor::monitor::{
    EventPublisher, HttpEventPublisher, InstanceId, InvocationContext, Monitor,
};
use worker_monitor::registry::{ConnectionRegistry, MemoryRegistry};
use worker_monitor::service::{Broadcaster, Dispatcher, LifecycleService};
use worker_monitor::transport::{ConnectionHub, ManagementClient, Transport};
use worker_monitor::ws::handler::ws_handler;

const BUS: &str = "monitor-events";
const SOURCE: &str = "monitor-worker";

struct Gateway {
    state: AppState,
    registry: Arc<MemoryRegistry>,
    broadcaster: Broadcaster,
}

fn gateway() -> Gateway {
    let registry = Arc::new(MemoryRegistry::new());
    let hub = Arc::new(ConnectionHub::new());
    let event_bus = EventBus::new(BUS, 64);
    let broadcaster = Broadcaster::new(
        Arc::clone(&registry) as Arc<dyn ConnectionRegistry>,
        Arc::clone(&hub) as Arc<dyn Transport>,
    );
    let _dispatcher =
        Dispatcher::new(EventRule::status_updates(SOURCE), broadcaster.clone()).spawn(&event_bus);
    let state = AppState {
        lifecycle: LifecycleService::new(Arc::clone(&registry) as Arc<dyn ConnectionRegistry>),
        event_bus,
        hub,
    };
    Gateway {
        state,
        registry,
        broadcaster,
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()));
    let Ok(request) = request else {
        panic!("request should build");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router is infallible");
    };
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn serve(app: Router) -> std::net::SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn next_text(rx: &mut worker_monitor::transport::hub::SessionReceiver) -> Value {
    let Ok(Some(text)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await else {
        panic!("expected a broadcast envelope");
    };
    serde_json::from_str(&text).unwrap_or(Value::Null)
}

#[tokio::test]
async fn connect_broadcast_disconnect_scenario() {
    let gw = gateway();
    let x = ConnectionId::from("X");
    let mut inbox = gw.state.hub.register(x.clone());

    let ack = gw.state.lifecycle.connect(&x).await;
    assert!(ack.is_success());
    assert!(gw.registry.contains(&x).await);

    let detail = json!({"status": "start", "request_id": "r1", "lambda_instance_id": "i1"});
    gw.state.event_bus.publish(BusEvent::new(
        SOURCE,
        STATUS_UPDATE,
        Value::String(detail.to_string()),
        BUS,
    ));

    let envelope = next_text(&mut inbox).await;
    assert_eq!(envelope["eventDetail"], detail);
    assert!(envelope["timestamp"].is_string());

    let ack = gw.state.lifecycle.disconnect(&x).await;
    assert!(ack.is_success());
    assert!(!gw.registry.contains(&x).await);

    let event = BusEvent::new(SOURCE, STATUS_UPDATE, json!({"status": "finished"}), BUS);
    let Ok(report) = gw.broadcaster.broadcast(&event).await else {
        panic!("broadcast should succeed");
    };
    assert_eq!(report.attempted, 0);
    assert_eq!(report.pruned, 0);
}

#[tokio::test]
async fn monitored_work_reaches_connected_client() {
    let gw = gateway();
    let x = ConnectionId::from("X");
    let mut inbox = gw.state.hub.register(x.clone());
    let _ = gw.state.lifecycle.connect(&x).await;

    let publisher: Arc<dyn EventPublisher> = Arc::new(gw.state.event_bus.clone());
    let handler = Monitor::new(publisher, SOURCE, BUS)
        .wrap(|n: u32, _ctx: InvocationContext| async move { Ok::<_, String>(n + 1) });
    let instance = InstanceId::generate();
    let ctx = InvocationContext::new("r1", instance);

    let result = handler.call(1, ctx).await;
    assert!(matches!(result, Ok(2)));

    let mut statuses = Vec::new();
    for _ in 0..2 {
        let envelope = next_text(&mut inbox).await;
        assert_eq!(envelope["eventDetail"]["request_id"], "r1");
        assert_eq!(
            envelope["eventDetail"]["lambda_instance_id"],
            instance.to_string()
        );
        statuses.push(envelope["eventDetail"]["status"].clone());
    }
    statuses.sort_by_key(|s| s.as_str().map(str::to_string));
    assert_eq!(statuses, vec![json!("finished"), json!("start")]);
}

#[tokio::test]
async fn unrouted_source_is_not_broadcast() {
    let gw = gateway();
    let x = ConnectionId::from("X");
    let mut inbox = gw.state.hub.register(x.clone());
    let _ = gw.state.lifecycle.connect(&x).await;

    gw.state
        .event_bus
        .publish(BusEvent::new("billing", STATUS_UPDATE, json!({}), BUS));

    let received = tokio::time::timeout(Duration::from_millis(200), inbox.recv()).await;
    assert!(received.is_err());
}

#[tokio::test]
async fn ingest_accepts_own_bus_and_rejects_foreign_bus() {
    let gw = gateway();
    let app = router(gw.state);

    let body = json!({
        "entries": [
            {"source": SOURCE, "detailType": STATUS_UPDATE, "detail": "{}", "eventBusName": BUS},
            {"source": SOURCE, "detailType": STATUS_UPDATE, "detail": "{}", "eventBusName": "other"},
        ]
    });
    let (status, response) = post_json(app, "/api/v1/events", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["failedEntryCount"], 1);
    assert!(response["entries"][0]["eventId"].is_string());
    assert_eq!(response["entries"][1]["errorCode"], "UnknownEventBus");
}

#[tokio::test]
async fn ingest_rejects_empty_batch() {
    let gw = gateway();
    let (status, response) =
        post_json(router(gw.state), "/api/v1/events", json!({"entries": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], 1001);
}

#[tokio::test]
async fn lifecycle_triggers_update_registry() {
    let gw = gateway();
    let registry = Arc::clone(&gw.registry);
    let app = router(gw.state);

    let (status, body) = post_json(
        app.clone(),
        "/api/v1/connections/connect",
        json!({"connection_id": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"statusCode": 200, "body": "Connected"}));
    assert!(registry.contains(&ConnectionId::from("abc")).await);

    let (status, body) = post_json(
        app,
        "/api/v1/connections/disconnect",
        json!({"connection_id": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "Disconnected");
    assert!(!registry.contains(&ConnectionId::from("abc")).await);
}

#[tokio::test]
async fn management_send_to_closed_session_is_gone() {
    let gw = gateway();
    let closed = gw.state.hub.issue();
    let app = router(gw.state);

    let (status, _) = post_json(app.clone(), &format!("/@connections/{closed}"), json!({})).await;
    assert_eq!(status, StatusCode::GONE);

    let (status, _) = post_json(app, "/@connections/ghost", json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn management_send_rejects_non_utf8_payload() {
    let gw = gateway();
    let id = gw.state.hub.issue();
    let mut inbox = gw.state.hub.register(id.clone());
    let app = router(gw.state);

    let Ok(request) = Request::post(format!("/@connections/{id}"))
        .body(Body::from(vec![0xff_u8, 0xfe, 0x00]))
    else {
        panic!("request should build");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router is infallible");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(inbox.try_recv().is_err());
}

#[tokio::test]
async fn gateways_sharing_a_registry_keep_each_others_clients() {
    let registry = Arc::new(MemoryRegistry::new());
    let hub_a = Arc::new(ConnectionHub::new());
    let hub_b = Arc::new(ConnectionHub::new());

    let on_b = hub_b.issue();
    let mut inbox_b = hub_b.register(on_b.clone());
    let _ = registry.put(&on_b).await;
    let gone_from_a = hub_a.issue();
    let _ = registry.put(&gone_from_a).await;

    let from_a = Broadcaster::new(
        Arc::clone(&registry) as Arc<dyn ConnectionRegistry>,
        Arc::clone(&hub_a) as Arc<dyn Transport>,
    );
    let event = BusEvent::new(SOURCE, STATUS_UPDATE, json!({"status": "start"}), BUS);
    let Ok(report) = from_a.broadcast(&event).await else {
        panic!("broadcast should succeed");
    };

    assert_eq!(report.attempted, 2);
    assert_eq!(report.pruned, 1);
    assert_eq!(report.failed, 1);
    assert!(registry.contains(&on_b).await);
    assert!(!registry.contains(&gone_from_a).await);
    assert!(inbox_b.try_recv().is_err());

    let from_b = Broadcaster::new(
        Arc::clone(&registry) as Arc<dyn ConnectionRegistry>,
        Arc::clone(&hub_b) as Arc<dyn Transport>,
    );
    let Ok(report) = from_b.broadcast(&event).await else {
        panic!("broadcast should succeed");
    };
    assert_eq!(report.delivered, 1);
    let envelope = next_text(&mut inbox_b).await;
    assert_eq!(envelope["eventDetail"]["status"], "start");
}

#[tokio::test]
async fn management_client_round_trips_against_live_gateway() {
    let gw = gateway();
    let hub = Arc::clone(&gw.state.hub);
    let awkward = ConnectionId::from("a?b/c+d");
    let mut inbox = hub.register(awkward.clone());
    let addr = serve(router(gw.state)).await;

    let Ok(client) = ManagementClient::new(&format!("http://{addr}"), Duration::from_secs(2)) else {
        panic!("client should build");
    };

    assert_eq!(client.send(&awkward, r#"{"n":1}"#).await, Ok(()));
    let Ok(Some(payload)) = tokio::time::timeout(Duration::from_secs(2), inbox.recv()).await
    else {
        panic!("session should receive the payload");
    };
    assert_eq!(payload, r#"{"n":1}"#);

    assert_eq!(
        client.send(&hub.issue(), "{}").await,
        Err(SendError::RecipientGone)
    );
    assert!(matches!(
        client.send(&ConnectionId::from("elsewhere"), "{}").await,
        Err(SendError::DeliveryFailed(_))
    ));
}

#[tokio::test]
async fn http_publisher_reaches_live_gateway_bus() {
    let gw = gateway();
    let mut bus_rx = gw.state.event_bus.subscribe();
    let x = gw.state.hub.issue();
    let mut inbox = gw.state.hub.register(x.clone());
    let _ = gw.state.lifecycle.connect(&x).await;
    let addr = serve(router(gw.state)).await;

    let Ok(publisher) = HttpEventPublisher::new(&format!("http://{addr}"), Duration::from_secs(2))
    else {
        panic!("publisher should build");
    };

    let accepted = publisher
        .publish(BusEvent::new(SOURCE, STATUS_UPDATE, json!({"n": 1}), BUS))
        .await;
    assert!(accepted.is_ok());
    let Ok(Ok(record)) = tokio::time::timeout(Duration::from_secs(2), bus_rx.recv()).await else {
        panic!("record should reach the bus");
    };
    assert_eq!(record.source, SOURCE);
    assert_eq!(record.detail, json!({"n": 1}));
    let envelope = next_text(&mut inbox).await;
    assert_eq!(envelope["eventDetail"], json!({"n": 1}));

    let rejected = publisher
        .publish(BusEvent::new(SOURCE, STATUS_UPDATE, json!({}), "other-bus"))
        .await;
    let Err(GatewayError::EventPublishFailed(reason)) = rejected else {
        panic!("foreign bus must be rejected");
    };
    assert!(reason.contains("other-bus"));

    let handler = Monitor::new(Arc::new(publisher) as Arc<dyn EventPublisher>, SOURCE, BUS)
        .wrap(|(): (), _ctx: InvocationContext| async move { Ok::<_, String>(()) });
    let ctx = InvocationContext::new("r-http", InstanceId::generate());
    assert!(handler.call((), ctx).await.is_ok());
    for _ in 0..2 {
        let envelope = next_text(&mut inbox).await;
        assert_eq!(envelope["eventDetail"]["request_id"], "r-http");
    }
}

#[tokio::test]
async fn websocket_client_receives_ingested_event() {
    let gw = gateway();
    let registry = Arc::clone(&gw.registry);
    let addr = serve(router(gw.state)).await;

    let Ok((mut socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await
    else {
        panic!("ws connect failed");
    };
    assert_eq!(registry.len().await.unwrap_or_default(), 1);

    let detail = json!({"status": "start", "request_id": "r1"});
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/v1/events"))
        .json(&json!({
            "entries": [{
                "source": SOURCE,
                "detailType": STATUS_UPDATE,
                "detail": detail.to_string(),
                "eventBusName": BUS,
            }]
        }))
        .send()
        .await;
    assert!(matches!(response, Ok(r) if r.status().is_success()));

    let Ok(Some(Ok(frame))) = tokio::time::timeout(Duration::from_secs(2), socket.next()).await
    else {
        panic!("expected a frame");
    };
    let Ok(text) = frame.to_text() else {
        panic!("expected a text frame");
    };
    let envelope: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    assert_eq!(envelope["eventDetail"], detail);

    let _ = socket.close(None).await;
    for _ in 0..50 {
        if registry.len().await.unwrap_or(1) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(registry.len().await.unwrap_or(1), 0);
}
