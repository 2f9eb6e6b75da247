// Integration tests for the HTTP introspection routes
//
// Requests go straight through the router with `tower::ServiceExt::oneshot`.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use lingua_rooms::gateway::ClientEvent;
use lingua_rooms::room::RoomSettings;
use lingua_rooms::translation::Translator;
use lingua_rooms::{create_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn state() -> AppState {
    AppState::new(
        RoomSettings::default(),
        Arc::new(Translator::new(Vec::new(), Duration::from_secs(10))),
    )
}

async fn get(state: &AppState, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
    let response = create_router(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (status, body) = get(&state(), "/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    Ok(())
}

#[tokio::test]
async fn test_stats_reports_rooms_and_sessions() -> Result<()> {
    let state = state();

    let (status, body) = get(&state, "/stats").await?;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_slice(&body)?;
    assert_eq!(stats["active_rooms"], 0);
    assert_eq!(stats["active_sessions"], 0);

    let (alice, _a) = state.gateway.connect(Some("alice".to_string())).await;
    let (_bob, _b) = state.gateway.connect(Some("bob".to_string())).await;
    state
        .gateway
        .dispatch(
            alice.id,
            ClientEvent::Join {
                room_id: "lobby".to_string(),
                user_id: None,
                language: None,
            },
        )
        .await;

    let (_, body) = get(&state, "/stats").await?;
    let stats: Value = serde_json::from_slice(&body)?;
    assert_eq!(stats["active_rooms"], 1);
    assert_eq!(stats["active_sessions"], 2);

    Ok(())
}

#[tokio::test]
async fn test_room_snapshot_route() -> Result<()> {
    let state = state();
    let (alice, _a) = state.gateway.connect(Some("alice".to_string())).await;
    state
        .gateway
        .dispatch(
            alice.id,
            ClientEvent::Join {
                room_id: "room-42".to_string(),
                user_id: None,
                language: Some("en".to_string()),
            },
        )
        .await;

    let (status, body) = get(&state, "/rooms/room-42").await?;
    assert_eq!(status, StatusCode::OK);
    let room: Value = serde_json::from_slice(&body)?;
    assert_eq!(room["room_id"], "room-42");
    assert_eq!(room["participant_count"], 1);
    assert_eq!(room["participants"][0]["user_id"], "alice");

    Ok(())
}

#[tokio::test]
async fn test_missing_room_is_not_found() -> Result<()> {
    let (status, body) = get(&state(), "/rooms/nowhere").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&body)?;
    assert_eq!(error["code"], "room_not_found");
    Ok(())
}
