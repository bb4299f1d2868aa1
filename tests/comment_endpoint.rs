//! `HttpCommentSink` against a local submission endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use quillpost::comments::{CommentAreaState, CommentForm, CommentSink, FormInput, HttpCommentSink};
use std::sync::{Arc, Mutex};

type Received = Arc<Mutex<Vec<serde_json::Value>>>;

/// Start an endpoint answering `status` and recording every JSON body.
async fn spawn_endpoint(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route(
            "/api/createComments",
            post(
                move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                    received.lock().unwrap().push(body);
                    status
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/createComments", addr), received)
}

fn draft() -> FormInput {
    FormInput {
        id: "post-hello".into(),
        name: "Grace".into(),
        email: "grace@example.com".into(),
        comment: "Lovely read".into(),
    }
}

#[tokio::test]
async fn posts_json_body_with_wire_names() {
    let (endpoint, received) = spawn_endpoint(StatusCode::OK).await;
    let sink = HttpCommentSink::new(endpoint).unwrap();

    sink.post(&draft()).await.unwrap();

    let bodies = received.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![serde_json::json!({
            "_id": "post-hello",
            "name": "Grace",
            "email": "grace@example.com",
            "comment": "Lovely read",
        })]
    );
}

#[tokio::test]
async fn accepted_submission_acknowledges_form() {
    let (endpoint, _) = spawn_endpoint(StatusCode::OK).await;
    let sink = HttpCommentSink::new(endpoint).unwrap();
    let mut form = CommentForm::new();

    form.submit(draft(), &sink).await;
    assert_eq!(form.state(), CommentAreaState::Acknowledged);
}

#[tokio::test]
async fn error_status_is_a_failure() {
    let (endpoint, received) = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
    let sink = HttpCommentSink::new(endpoint).unwrap();

    assert!(sink.post(&draft()).await.is_err());
    assert_eq!(received.lock().unwrap().len(), 1);

    let mut form = CommentForm::new();
    form.submit(draft(), &sink).await;
    assert_eq!(form.state(), CommentAreaState::Awaiting);
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_failure() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = HttpCommentSink::new(format!("http://{}/api/createComments", addr)).unwrap();
    assert!(sink.post(&draft()).await.is_err());

    let mut form = CommentForm::new();
    form.submit(draft(), &sink).await;
    assert!(!form.submitted());
}
