//! Integration tests for subscriber fan-out and failure isolation.
//!
//! Subscribers are in-memory `mpsc` sinks; no sockets are opened.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use resilience_core::config::ResilienceConfig;
use resilience_observer::hub::{DeliveryFailure, Frame, SubscriptionHub};
use resilience_observer::state::AppState;
use resilience_observer::ws::handle_command;
use resilience_types::{ServerMessage, SwarmMode};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn message_type(frame: &Frame) -> String {
    let value: Value = serde_json::from_str(frame).unwrap();
    value["type"].as_str().unwrap().to_owned()
}

fn hub() -> Arc<SubscriptionHub> {
    Arc::new(SubscriptionHub::new(None, Duration::from_millis(100)))
}

#[tokio::test]
async fn test_failing_subscriber_is_isolated_and_removed() {
    let hub = hub();
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, rx_b) = mpsc::channel(8);
    let (tx_c, mut rx_c) = mpsc::channel(8);

    let a = hub.subscribe(tx_a, &ServerMessage::system("a")).await.unwrap();
    let b = hub.subscribe(tx_b, &ServerMessage::system("b")).await.unwrap();
    let c = hub.subscribe(tx_c, &ServerMessage::system("c")).await.unwrap();
    drop(rx_b);

    let report = hub.broadcast(&ServerMessage::system("first")).await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.removed, vec![(b, DeliveryFailure::Closed)]);

    assert!(hub.contains(a).await);
    assert!(!hub.contains(b).await);
    assert!(hub.contains(c).await);

    // The next pass no longer includes the failed subscriber.
    let report = hub.broadcast(&ServerMessage::system("second")).await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 2);
    assert!(report.removed.is_empty());

    for rx in [&mut rx_a, &mut rx_c] {
        let frames: Vec<Frame> = [rx.recv().await, rx.recv().await, rx.recv().await]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| message_type(f) == "system"));
    }
}

#[tokio::test]
async fn test_slow_subscriber_times_out_without_blocking_others() {
    let hub = hub();
    let (slow_tx, _slow_rx) = mpsc::channel(1);
    let (fast_tx, mut fast_rx) = mpsc::channel(8);

    // The initial frame fills the slow subscriber's only slot.
    let slow = hub.subscribe(slow_tx, &ServerMessage::system("slow")).await.unwrap();
    let _fast = hub.subscribe(fast_tx, &ServerMessage::system("fast")).await.unwrap();

    let report = hub.broadcast(&ServerMessage::system("tick")).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.removed, vec![(slow, DeliveryFailure::TimedOut)]);

    assert!(fast_rx.recv().await.is_some());
    assert!(fast_rx.recv().await.is_some());
}

#[tokio::test]
async fn test_subscriber_joining_mid_pass_gets_initial_but_not_in_flight_batch() {
    let hub = hub();

    // A subscriber with a full buffer holds the pass open until drained.
    let (slow_tx, mut slow_rx) = mpsc::channel(1);
    hub.subscribe(slow_tx, &ServerMessage::system("slow")).await.unwrap();

    let pass = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move { hub.broadcast(&ServerMessage::system("in-flight")).await })
    };
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    let (late_tx, mut late_rx) = mpsc::channel(8);
    let late = hub.subscribe(late_tx, &ServerMessage::system("welcome")).await.unwrap();

    // Let the pass finish.
    let _ = slow_rx.recv().await;
    let report = pass.await.unwrap().unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.delivered, 1);

    let initial = late_rx.recv().await.unwrap();
    assert!(initial.contains("welcome"));
    assert!(late_rx.try_recv().is_err());
    assert!(hub.contains(late).await);

    // The next pass reaches the late subscriber.
    hub.broadcast(&ServerMessage::system("next")).await.unwrap();
    assert!(late_rx.recv().await.unwrap().contains("next"));
}

#[tokio::test]
async fn test_concurrent_subscribe_and_broadcast_never_tear_frames() {
    let hub = hub();
    let mut receivers = Vec::new();
    let mut joins = Vec::new();

    for i in 0..16 {
        let (tx, rx) = mpsc::channel(64);
        receivers.push(rx);
        let hub = Arc::clone(&hub);
        joins.push(tokio::spawn(async move {
            hub.subscribe(tx, &ServerMessage::system(format!("sub {i}")))
                .await
                .unwrap();
            hub.broadcast(&ServerMessage::system(format!("from {i}")))
                .await
                .unwrap();
        }));
    }
    for join in joins {
        join.await.unwrap();
    }

    assert_eq!(hub.subscriber_count().await, 16);
    for mut rx in receivers {
        rx.close();
        while let Some(frame) = rx.recv().await {
            // Every frame parses as a whole message.
            assert_eq!(message_type(&frame), "system");
        }
    }
}

#[tokio::test]
async fn test_rejected_channel_command_answers_issuer_only() {
    let state = AppState::from_config(&ResilienceConfig::default(), CancellationToken::new())
        .unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    state
        .hub
        .subscribe(tx, &ServerMessage::system("hello"))
        .await
        .unwrap();
    let _ = rx.recv().await;

    let reply = handle_command(
        &state,
        r#"{"action": "deploy_agents", "disasterType": "flood", "location": {"lat": 0, "lng": 0}}"#,
    )
    .await;
    assert_eq!(reply.map(|m| m.kind()), Some("error"));

    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_accepted_channel_command_is_announced() {
    let state = AppState::from_config(&ResilienceConfig::default(), CancellationToken::new())
        .unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    state
        .hub
        .subscribe(tx, &ServerMessage::system("hello"))
        .await
        .unwrap();
    let _ = rx.recv().await;

    assert!(handle_command(&state, r#"{"action": "activate_swarm"}"#).await.is_none());
    let notice = rx.recv().await.unwrap();
    assert_eq!(message_type(&notice), "system");
    assert!(notice.contains("100 agents"));

    let reply = handle_command(
        &state,
        r#"{"action": "deploy_agents", "disaster_type": "earthquake", "location": {"lat": 1, "lng": 2}}"#,
    )
    .await;
    assert!(reply.is_none());
    assert!(rx.recv().await.unwrap().contains("Deployed 50 agents"));
    assert_eq!(state.orchestrator.snapshot().await.active_count, 50);
}

#[tokio::test]
async fn test_unrecognized_channel_command_is_ignored() {
    let state = AppState::from_config(&ResilienceConfig::default(), CancellationToken::new())
        .unwrap();
    assert!(handle_command(&state, r#"{"action": "self_destruct"}"#).await.is_none());
    assert!(handle_command(&state, "not json").await.is_none());
    assert_eq!(state.orchestrator.mode().await.0, SwarmMode::Offline);
}

#[tokio::test]
async fn test_known_action_with_bad_body_answers_issuer() {
    let state = AppState::from_config(&ResilienceConfig::default(), CancellationToken::new())
        .unwrap();
    state.orchestrator.initialize_swarm().await;
    let (tx, mut rx) = mpsc::channel(8);
    state
        .hub
        .subscribe(tx, &ServerMessage::system("hello"))
        .await
        .unwrap();
    let _ = rx.recv().await;

    let missing_location = r#"{"action": "deploy_agents", "disaster_type": "flood"}"#;
    let bad_agent = r#"{"action": "agent_action", "agent_id": "seven", "action_type": "activate"}"#;
    for raw in [missing_location, bad_agent] {
        let reply = handle_command(&state, raw).await.unwrap();
        assert_eq!(reply.kind(), "error", "{raw}");
    }

    // Nothing was applied or announced.
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
    assert_eq!(state.orchestrator.snapshot().await.active_count, 0);
}
