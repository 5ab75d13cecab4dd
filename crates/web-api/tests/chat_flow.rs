mod support;

use application::ParticipantRepository;
use axum::http::StatusCode;
use serde_json::json;

use support::build_app;

#[tokio::test]
async fn participant_and_message_flow() {
    let app = build_app();

    let (status, _) = app
        .call("POST", "/participants", None, Some(json!({"name": "alice"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call("POST", "/participants", None, Some(json!({"name": "alice"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PARTICIPANT_EXISTS");

    let (status, participants) = app.call("GET", "/participants", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(participants.as_array().unwrap().len(), 1);
    assert_eq!(participants[0]["name"], "alice");
    assert!(participants[0]["lastStatus"].is_i64());

    let (status, sent) = app
        .call(
            "POST",
            "/messages",
            Some("alice"),
            Some(json!({"to": "Todos", "text": "hi", "type": "message"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["from"], "alice");
    assert_eq!(sent["type"], "message");
    assert_eq!(sent["time"], "08:00:00");

    let (status, _) = app
        .call(
            "POST",
            "/messages",
            Some("ghost"),
            Some(json!({"to": "Todos", "text": "boo", "type": "message"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // bob 没有加入也可以读取公开消息；limit=1 只返回最新一条
    let (status, latest) = app.call("GET", "/messages?limit=1", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    let latest = latest.as_array().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["text"], "hi");

    let (_, all) = app
        .call("GET", "/messages?limit=abc", Some("bob"), None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["type"], "status");
}

#[tokio::test]
async fn invalid_payloads_report_every_violation() {
    let app = build_app();

    let (status, body) = app
        .call("POST", "/participants", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"], json!(["name must not be empty"]));

    let (status, body) = app
        .call(
            "POST",
            "/messages",
            None,
            Some(json!({"type": "status"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn private_messages_stay_private() {
    let app = build_app();
    for name in ["alice", "bob"] {
        app.call("POST", "/participants", None, Some(json!({"name": name})))
            .await;
    }

    let (status, _) = app
        .call(
            "POST",
            "/messages",
            Some("alice"),
            Some(json!({"to": "bob", "text": "psst", "type": "private_message"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, carol_view) = app.call("GET", "/messages", Some("carol"), None).await;
    assert!(carol_view
        .as_array()
        .unwrap()
        .iter()
        .all(|message| message["text"] != "psst"));

    let (_, bob_view) = app.call("GET", "/messages", Some("bob"), None).await;
    assert!(bob_view
        .as_array()
        .unwrap()
        .iter()
        .any(|message| message["text"] == "psst"));
}

#[tokio::test]
async fn heartbeat_requires_registration() {
    let app = build_app();
    app.call("POST", "/participants", None, Some(json!({"name": "alice"})))
        .await;

    app.clock.advance(std::time::Duration::from_secs(5));
    let (status, _) = app.call("POST", "/status", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("POST", "/status", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("POST", "/status", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_and_delete_enforce_ownership() {
    let app = build_app();
    for name in ["alice", "bob"] {
        app.call("POST", "/participants", None, Some(json!({"name": name})))
            .await;
    }
    let (_, sent) = app
        .call(
            "POST",
            "/messages",
            Some("alice"),
            Some(json!({"to": "Todos", "text": "hi", "type": "message"})),
        )
        .await;
    let uri = format!("/messages/{}", sent["id"].as_str().unwrap());

    let (status, _) = app
        .call(
            "PUT",
            &uri,
            Some("bob"),
            Some(json!({"to": "Todos", "text": "hijacked", "type": "message"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, edited) = app
        .call(
            "PUT",
            &uri,
            Some("alice"),
            Some(json!({"to": "bob", "text": "hello", "type": "private_message"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "hello");
    assert_eq!(edited["time"], sent["time"]);

    let (status, _) = app.call("DELETE", &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("DELETE", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("DELETE", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("DELETE", "/messages/not-a-uuid", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.messages.snapshot().await.len(), 2);
    assert_eq!(app.participants.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = build_app();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn unreadable_bodies_use_error_envelope() {
    let app = build_app();

    // 字段类型不符按校验失败返回
    let (status, body) = app
        .call("POST", "/participants", None, Some(json!({"name": 123})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"].as_array().unwrap().len(), 1);

    let (status, body) = app.call("POST", "/participants", None, None).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "INVALID_BODY");
    assert!(body["message"].is_string());

    assert!(app.participants.list().await.unwrap().is_empty());
}
