use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tokio::sync::Notify;
use tower::ServiceExt;

use form_autofill::api::create_api;
use form_autofill::autofill::{FormFiller, NoDelay};
use form_autofill::config::{AnswerMode, AutofillConfig};
use form_autofill::providers::local::HashingEmbedder;
use form_autofill::providers::traits::{CompletionProvider, EmbeddingProvider};

/// Answers each numbered question with the word after its label, or fails.
struct FakeModel {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeModel {
    fn answering() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: true })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeModel {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("model unavailable"));
        }

        if let Some(start) = prompt.find("what is the '") {
            let rest = &prompt[start + "what is the '".len()..];
            let label = &rest[..rest.find('\'').unwrap_or(rest.len())];
            return Ok(format!(" value of {} \n", label));
        }

        Ok(prompt
            .lines()
            .skip_while(|l| *l != "Questions:")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .filter_map(|l| l.split_once(". "))
            .map(|(n, label)| format!("{}: value of {}", n, label))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn get_model_info(&self) -> String {
        "fake".to_string()
    }
}

/// Holds every completion until released.
struct GatedModel {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl CompletionProvider for GatedModel {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
        self.started.notify_one();
        self.release.notified().await;
        Ok("1: Jane Doe".to_string())
    }

    fn get_model_info(&self) -> String {
        "gated".to_string()
    }
}

struct CountingEmbedder {
    calls: AtomicUsize,
    inner: HashingEmbedder,
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn generate_embedding(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_embedding(text).await
    }

    fn get_model_info(&self) -> String {
        "counting".to_string()
    }
}

fn corpus() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("applicant.txt"),
        "Name: Jane Doe\n\nDate: 4 March 2024\n\nAddress: 12 Elm Road\u{c}Phone: 555 0100\n\nEmail: jane@example.com",
    )
    .unwrap();
    dir
}

fn app(
    corpus_dir: &std::path::Path,
    mode: AnswerMode,
    model: Arc<FakeModel>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Router {
    let config = AutofillConfig {
        corpus_dir: corpus_dir.to_path_buf(),
        answer_mode: mode,
        ..AutofillConfig::default()
    };
    let filler = FormFiller::from_config(&config, model, embedder, Arc::new(NoDelay));
    create_api(Arc::new(filler), 4)
}

async fn post(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/get_autofill_data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn five_fields() -> Value {
    json!({
        "form_fields": [
            {"id": 1, "label": "Name"},
            {"id": 2, "label": "Date"},
            {"id": 3, "label": "Address"},
            {"id": 4, "label": "Phone"},
            {"id": 5, "label": "Email"}
        ]
    })
}

#[tokio::test]
async fn test_batched_request_maps_every_id() {
    let dir = corpus();
    let model = FakeModel::answering();
    let app = app(dir.path(), AnswerMode::Batched, model.clone(), Arc::new(HashingEmbedder::default()));

    let (status, body) = post(app, &five_fields().to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "1": "value of Name",
            "2": "value of Date",
            "3": "value of Address",
            "4": "value of Phone",
            "5": "value of Email"
        })
    );
    // Batches of 4 and 1
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_single_mode_calls_model_per_field() {
    let dir = corpus();
    let model = FakeModel::answering();
    let app = app(dir.path(), AnswerMode::Single, model.clone(), Arc::new(HashingEmbedder::default()));

    let (status, body) = post(app, &five_fields().to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["3"], "value of Address");
    assert_eq!(model.calls(), 5);
}

#[tokio::test]
async fn test_failing_model_still_succeeds_with_fallbacks() {
    let dir = corpus();
    let model = FakeModel::failing();
    let app = app(dir.path(), AnswerMode::Batched, model.clone(), Arc::new(HashingEmbedder::default()));

    let (status, body) = post(app, &five_fields().to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let map = body.as_object().unwrap();
    assert_eq!(map.len(), 5);
    assert!(map.values().all(|v| v == ""));
}

#[tokio::test]
async fn test_empty_form_fields_makes_no_calls() {
    let dir = corpus();
    let model = FakeModel::answering();
    let embedder = Arc::new(CountingEmbedder {
        calls: AtomicUsize::new(0),
        inner: HashingEmbedder::default(),
    });
    let app = app(dir.path(), AnswerMode::Batched, model.clone(), embedder.clone());

    let (status, body) = post(app, r#"{"form_fields": []}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert_eq!(model.calls(), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_form_fields_is_bad_request() {
    let dir = corpus();
    let model = FakeModel::answering();
    let app = app(dir.path(), AnswerMode::Batched, model.clone(), Arc::new(HashingEmbedder::default()));

    let (status, _) = post(app.clone(), r#"{"fields": []}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app.clone(), "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app, r#"{"form_fields": "Name"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_and_invalid_fields() {
    let dir = corpus();
    let model = FakeModel::answering();
    let app = app(dir.path(), AnswerMode::Batched, model, Arc::new(HashingEmbedder::default()));

    let body = json!({
        "form_fields": [
            {"id": "a", "label": "Name"},
            {"label": "no id"},
            {"id": "a", "label": "Email"},
            {"id": "b", "label": "Phone", "type": "tel"}
        ]
    });
    let (status, body) = post(app, &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    // Last write wins for "a"; the entry without an id is dropped
    assert_eq!(body, json!({"a": "value of Email", "b": "value of Phone (type: tel)"}));
}

#[tokio::test]
async fn test_missing_corpus_is_server_error() {
    let dir = tempdir().unwrap();
    let model = FakeModel::answering();
    let app = app(&dir.path().join("info"), AnswerMode::Batched, model.clone(), Arc::new(HashingEmbedder::default()));

    let (status, body) = post(app, &five_fields().to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["status"].as_str().unwrap().contains("Corpus unavailable"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_health() {
    let dir = corpus();
    let app = app(dir.path(), AnswerMode::Batched, FakeModel::answering(), Arc::new(HashingEmbedder::default()));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_not_blocked_by_busy_autofill() {
    let dir = corpus();
    let model = Arc::new(GatedModel {
        started: Notify::new(),
        release: Notify::new(),
    });
    let config = AutofillConfig {
        corpus_dir: dir.path().to_path_buf(),
        ..AutofillConfig::default()
    };
    let filler = FormFiller::from_config(
        &config,
        model.clone(),
        Arc::new(HashingEmbedder::default()),
        Arc::new(NoDelay),
    );
    let app = create_api(Arc::new(filler), 1);
    let body = r#"{"form_fields": [{"id": "a", "label": "Name"}]}"#;

    let busy = tokio::spawn(post(app.clone(), body));
    model.started.notified().await;

    // The only autofill slot is taken
    let queued = tokio::time::timeout(Duration::from_millis(100), post(app.clone(), body)).await;
    assert!(queued.is_err());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), app.oneshot(request))
        .await
        .expect("health check waited on the autofill limit")
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    model.release.notify_one();
    let (status, body) = busy.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"a": "Jane Doe"}));
}
