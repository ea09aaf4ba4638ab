//! Dispatcher behavior against a local mock endpoint.

mod common;

use code_coach::dispatch::Dispatcher;
use code_coach::providers::{Role, WireMessage};
use code_coach::CoachError;
use common::{reply, MockInference};

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let mock = MockInference::start(200, &reply("Hi there")).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    let out = d.complete("chat-model", &[WireMessage::new(Role::User, "hello")]).await.unwrap();
    assert_eq!(out.as_deref(), Some("Hi there"));

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(reqs[0].body["model"], "chat-model");
    assert_eq!(reqs[0].body["stream"], false);
    assert_eq!(reqs[0].body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_non_2xx_is_status_error_even_with_reply_body() {
    let mock = MockInference::start(500, &reply("ignored")).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    let r = d.complete("m", &[]).await;
    assert!(matches!(r, Err(CoachError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_missing_reply_field_is_none() {
    let mock = MockInference::start(200, r#"{"object":"chat.completion"}"#).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    assert_eq!(d.complete("m", &[]).await.unwrap(), None);
}

#[tokio::test]
async fn test_unexpected_shape_is_none() {
    let mock = MockInference::start(200, r#"{"choices":"nope"}"#).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    assert_eq!(d.complete("m", &[]).await.unwrap(), None);
}

#[tokio::test]
async fn test_malformed_second_choice_keeps_first_reply() {
    let mock = MockInference::start(200, r#"{"choices":[{"message":{"content":"Hi there"}},{"message":"x"}]}"#).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    assert_eq!(d.complete("m", &[]).await.unwrap().as_deref(), Some("Hi there"));
}

#[tokio::test]
async fn test_non_json_body_is_transport_error() {
    let mock = MockInference::start(200, "<html>gateway</html>").await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    assert!(matches!(d.complete("m", &[]).await, Err(CoachError::Transport(_))));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock = MockInference::gated(200, &reply("never sent")).await;
    let cfg = code_coach::config::InferenceConfig { timeout_secs: Some(1), ..mock.inference() };
    let d = Dispatcher::new(&cfg).unwrap();
    match d.complete("m", &[]).await {
        Err(CoachError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_one_post_per_call() {
    let mock = MockInference::start(200, &reply("ok")).await;
    let d = Dispatcher::new(&mock.inference()).unwrap();
    for _ in 0..3 {
        d.complete("m", &[]).await.unwrap();
    }
    assert_eq!(mock.count(), 3);
}
