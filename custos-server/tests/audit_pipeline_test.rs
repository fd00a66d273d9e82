//! Publisher-to-consumer tests for the asynchronous audit pipeline,
//! running the real consumer loop against the in-memory bus and store.

mod support;

use std::sync::Arc;
use std::time::Duration;

use custos_core::ports::EventBus;
use custos_core::{AuditEvent, AuditEventKind};
use custos_server::audit::consumer::run_audit_consumer;
use custos_server::audit::publisher::AuditPublisher;
use serde_json::json;
use support::{InMemoryAuditRepository, InMemoryEventBus, setup_test_state};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const CHANNEL: &str = "user_log_channel";

struct Pipeline {
    bus: Arc<InMemoryEventBus>,
    store: Arc<InMemoryAuditRepository>,
    publisher: AuditPublisher,
    shutdown: CancellationToken,
    consumer: JoinHandle<anyhow::Result<()>>,
}

/// Spawns the consumer and waits until its subscription is live, so
/// published events cannot race past it.
async fn start_pipeline() -> Pipeline {
    let bus = Arc::new(InMemoryEventBus::default());
    let store = Arc::new(InMemoryAuditRepository::default());
    let shutdown = CancellationToken::new();

    let consumer = tokio::spawn(run_audit_consumer(
        bus.clone(),
        store.clone(),
        CHANNEL.to_string(),
        shutdown.clone(),
    ));

    while !bus.has_subscribers(CHANNEL).await {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    Pipeline {
        publisher: AuditPublisher::new(bus.clone(), CHANNEL),
        bus,
        store,
        shutdown,
        consumer,
    }
}

async fn wait_for_events(store: &InMemoryAuditRepository, count: usize) -> Vec<AuditEvent> {
    for _ in 0..200 {
        let events = store.all().await;
        if events.len() >= count {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} audit events, got {}", store.all().await.len());
}

fn sample_event(user_id: &str) -> AuditEvent {
    AuditEvent::now(
        user_id.to_string(),
        AuditEventKind::Created,
        json!({ "name": "Alice", "email": "alice@example.com" }),
    )
}

#[tokio::test]
async fn published_events_reach_the_store() {
    let pipeline = start_pipeline().await;

    pipeline.publisher.publish(sample_event("admin-1")).await;

    let events = wait_for_events(&pipeline.store, 1).await;
    assert_eq!(events[0].user_id, "admin-1");
    assert_eq!(events[0].event, AuditEventKind::Created);
    assert_eq!(events[0].data["email"], json!("alice@example.com"));

    pipeline.shutdown.cancel();
    pipeline.consumer.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_payloads_do_not_stop_the_consumer() {
    let pipeline = start_pipeline().await;

    pipeline
        .bus
        .publish(CHANNEL, b"not json at all".to_vec())
        .await
        .unwrap();
    pipeline.publisher.publish(sample_event("admin-1")).await;

    // The garbage payload is discarded and the following event still lands.
    let events = wait_for_events(&pipeline.store, 1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, "admin-1");

    pipeline.shutdown.cancel();
    pipeline.consumer.await.unwrap().unwrap();
}

#[tokio::test]
async fn publishing_without_a_consumer_drops_the_event() {
    let bus = Arc::new(InMemoryEventBus::default());
    let store = Arc::new(InMemoryAuditRepository::default());
    let publisher = AuditPublisher::new(bus, CHANNEL);

    // Fire-and-forget: returns immediately even with nobody subscribed.
    publisher.publish(sample_event("admin-1")).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.all().await.is_empty());
}

#[tokio::test]
async fn cancellation_stops_the_consumer_cleanly() {
    let pipeline = start_pipeline().await;

    pipeline.shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(1), pipeline.consumer)
        .await
        .unwrap();
    result.unwrap().unwrap();
}

#[tokio::test]
async fn consumer_outlives_the_listener_and_persists_draining_events() {
    let pipeline = start_pipeline().await;

    // Shutdown begins: the listener's token fires while the consumer keeps
    // running on its own token.
    let listener_shutdown = CancellationToken::new();
    listener_shutdown.cancel();

    // A request completing inside the drain window still gets its event
    // persisted.
    pipeline.publisher.publish(sample_event("admin-1")).await;
    let events = wait_for_events(&pipeline.store, 1).await;
    assert_eq!(events[0].user_id, "admin-1");

    // The consumer is stopped only after the drain.
    pipeline.shutdown.cancel();
    pipeline.consumer.await.unwrap().unwrap();
}

#[tokio::test]
async fn request_handlers_emit_audit_events() {
    use axum::http::StatusCode;
    use custos_server::create_app;
    use support::{seed_user, test_request};
    use tower::ServiceExt;

    let ctx = setup_test_state();
    let shutdown = CancellationToken::new();
    let consumer = tokio::spawn(run_audit_consumer(
        ctx.bus.clone(),
        ctx.audit_store.clone(),
        "user_log_channel".to_string(),
        shutdown.clone(),
    ));
    while !ctx.bus.has_subscribers("user_log_channel").await {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let user = seed_user(&ctx, "Alice", "alice@example.com", "secret1").await;
    let token = ctx.state.tokens.issue_access_token(user.id).unwrap();

    let response = create_app(ctx.state.clone())
        .oneshot(test_request(
            "GET",
            &format!("/api/users/{}", user.id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = wait_for_events(&ctx.audit_store, 1).await;
    assert_eq!(events[0].event, AuditEventKind::Read);
    assert_eq!(events[0].user_id, user.id.to_string());
    assert_eq!(events[0].data["email"], json!("alice@example.com"));

    shutdown.cancel();
    consumer.await.unwrap().unwrap();
}

#[tokio::test]
async fn user_logs_endpoint_lists_persisted_events() {
    use axum::http::StatusCode;
    use custos_core::ports::AuditRepository;
    use custos_server::create_app;
    use serde_json::Value;
    use support::{parse_json_response, seed_user, test_request};
    use tower::ServiceExt;

    let ctx = setup_test_state();
    let user = seed_user(&ctx, "Admin", "admin@example.com", "secret1").await;
    let token = ctx.state.tokens.issue_access_token(user.id).unwrap();

    for i in 0..3 {
        ctx.audit_store
            .create(&sample_event(&format!("admin-{i}")))
            .await
            .unwrap();
    }

    let response = create_app(ctx.state.clone())
        .oneshot(test_request(
            "GET",
            "/api/user-logs?page=1&page_size=2",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = parse_json_response(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_count"], json!(3));
    assert_eq!(body["pagination"]["total_pages"], json!(2));
    assert_eq!(body["data"][0]["event"], json!("user:created"));
}
