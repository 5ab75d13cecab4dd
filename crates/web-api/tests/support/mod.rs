#![allow(dead_code)]

use std::sync::Arc;

use application::{
    ManualClock, MemoryMessageRepository, MemoryParticipantRepository, MessageService,
    MessageServiceDependencies, PresenceService, PresenceServiceDependencies,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use time::macros::datetime;
use tower::ServiceExt;
use web_api::{router, AppState};

pub struct TestApp {
    pub router: Router,
    pub participants: Arc<MemoryParticipantRepository>,
    pub messages: Arc<MemoryMessageRepository>,
    pub clock: Arc<ManualClock>,
}

/// 使用内存存储与手动时钟构建路由
pub fn build_app() -> TestApp {
    let participants = Arc::new(MemoryParticipantRepository::new());
    let messages = Arc::new(MemoryMessageRepository::new());
    let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 08:00:00 UTC)));

    let presence_service = PresenceService::new(PresenceServiceDependencies {
        participant_repository: participants.clone(),
        message_repository: messages.clone(),
        clock: clock.clone(),
        broadcast_target: "Todos".into(),
    });
    let message_service = MessageService::new(MessageServiceDependencies {
        participant_repository: participants.clone(),
        message_repository: messages.clone(),
        clock: clock.clone(),
        broadcast_target: "Todos".into(),
    });

    let state = AppState::new(Arc::new(presence_service), Arc::new(message_service));

    TestApp {
        router: router(state),
        participants,
        messages,
        clock,
    }
}

impl TestApp {
    /// 发送请求并返回状态码与 JSON 响应体（无响应体时为 Null）
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("User", user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}
