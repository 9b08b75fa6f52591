use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use matchroom_infra::config::AppConfig;
use matchroom_infra::memory::MemoryStore;
use matchroom_infra::notify::LogNotificationSink;

use crate::dispatcher;
use crate::routes;
use crate::state::AppState;

fn test_config() -> AppConfig {
    AppConfig {
        app_env: "test".to_string(),
        port: 0,
        log_level: "info".to_string(),
        tx_max_attempts: 5,
        event_buffer: 1024,
        push_enabled: false,
        push_gateway_url: "http://127.0.0.1:9300/push".to_string(),
        push_timeout_ms: 2500,
    }
}

fn test_app_state() -> AppState {
    AppState::with_store_and_sink(
        test_config(),
        Arc::new(MemoryStore::default()),
        Arc::new(LogNotificationSink),
    )
}

fn test_app_state_router() -> (AppState, axum::Router) {
    let state = test_app_state();
    let app = routes::router(state.clone());
    (state, app)
}

async fn post_json(
    app: &axum::Router,
    uri: &str,
    payload: serde_json::Value,
) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn user_and_group_creation_round_trips() {
    let (_state, app) = test_app_state_router();

    let response = post_json(
        &app,
        "/v1/users",
        json!({ "id": "u1", "nickname": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        &app,
        "/v1/groups",
        json!({
            "id": "group-a",
            "memberIds": ["u1"],
            "groupGender": "female",
            "preferredGender": "any",
            "averageAge": 25,
            "maxDistanceKm": 50
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = json_body(response).await;
    assert_eq!(group.get("status"), Some(&json!("forming")));
    assert_eq!(group.get("groupGender"), Some(&json!("female")));

    let response = get(&app, "/v1/groups/group-a").await;
    assert_eq!(response.status(), StatusCode::OK);
    let group = json_body(response).await;
    assert_eq!(group.get("memberIds"), Some(&json!(["u1"])));
}

#[tokio::test]
async fn group_creation_rejects_an_empty_member_list() {
    let (_state, app) = test_app_state_router();
    let response = post_json(&app, "/v1/groups", json!({ "memberIds": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_user_ids_conflict() {
    let (_state, app) = test_app_state_router();
    let payload = json!({ "id": "u1", "nickname": "alice" });
    let response = post_json(&app, "/v1/users", payload.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = post_json(&app, "/v1/users", payload).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn seeking_an_unknown_group_is_not_found() {
    let (_state, app) = test_app_state_router();
    let response = post_json(&app, "/v1/groups/group-missing/seek", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exemption_requires_two_distinct_users() {
    let (_state, app) = test_app_state_router();
    let response = post_json(
        &app,
        "/v1/exemptions",
        json!({ "exempterId": "u1", "exemptedId": "u1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn seeking_pair_flows_into_a_chatroom_through_the_dispatcher() {
    let (state, app) = test_app_state_router();
    dispatcher::spawn(state.store.clone(), state.triggers.clone());

    for (user_id, nickname) in [("u1", "ann"), ("u2", "ben"), ("u3", "cho"), ("u4", "dee")] {
        let response = post_json(
            &app,
            "/v1/users",
            json!({ "id": user_id, "nickname": nickname }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let group_a = json!({
        "id": "group-a",
        "memberIds": ["u1", "u2"],
        "groupGender": "male",
        "preferredGender": "any",
        "averageAge": 25,
        "minAge": 20,
        "maxAge": 30,
        "latitude": 37.5,
        "longitude": 127.0,
        "maxDistanceKm": 50
    });
    let group_b = json!({
        "id": "group-b",
        "memberIds": ["u3", "u4"],
        "groupGender": "female",
        "preferredGender": "male",
        "averageAge": 24,
        "minAge": 18,
        "maxAge": 26,
        "latitude": 37.51,
        "longitude": 127.01,
        "maxDistanceKm": 50
    });
    assert_eq!(
        post_json(&app, "/v1/groups", group_a).await.status(),
        StatusCode::CREATED
    );
    assert_eq!(
        post_json(&app, "/v1/groups", group_b).await.status(),
        StatusCode::CREATED
    );

    assert_eq!(
        post_json(&app, "/v1/groups/group-a/seek", json!({})).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        post_json(&app, "/v1/groups/group-b/seek", json!({})).await.status(),
        StatusCode::OK
    );

    // The match, merge and notifications all happen off the change feed;
    // wait for the merged chatroom to appear.
    let chatroom_id = "group-a_group-b";
    let mut room = None;
    for _ in 0..100 {
        let response = get(&app, &format!("/v1/chatrooms/{chatroom_id}")).await;
        if response.status() == StatusCode::OK {
            room = Some(json_body(response).await);
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    let room = room.expect("merged chatroom never appeared");
    assert_eq!(
        room.get("participants"),
        Some(&json!(["u1", "u2", "u3", "u4"]))
    );

    // Both source groups are retired and every member points at the room.
    for group_id in ["group-a", "group-b"] {
        let response = get(&app, &format!("/v1/groups/{group_id}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    for user_id in ["u1", "u2", "u3", "u4"] {
        let user = state
            .user_store
            .get(user_id)
            .await
            .expect("get user")
            .doc
            .expect("user");
        assert_eq!(user.current_group_id.as_deref(), Some(chatroom_id));
    }

    // The merged room is a live chat surface.
    let response = post_json(
        &app,
        &format!("/v1/chatrooms/{chatroom_id}/messages"),
        json!({ "senderId": "u3", "senderNickname": "cho", "content": "hello!" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let room = json_body(response).await;
    assert_eq!(room.get("messageCount"), Some(&json!(1)));

    let response = post_json(
        &app,
        &format!("/v1/chatrooms/{chatroom_id}/messages"),
        json!({ "senderId": "u9", "senderNickname": "eve", "content": "hi" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
