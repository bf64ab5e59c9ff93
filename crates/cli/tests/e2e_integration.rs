//! End-to-end tests for the Aisha chat service.
//!
//! These drive the full HTTP router with a scripted model provider and a
//! manual clock, from JSON request to JSON response and cache state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aisha_agent::{ChatService, GENERIC_FAILURE_DETAIL, WhatlangDetector};
use aisha_config::GatewayConfig;
use aisha_core::clock::ManualClock;
use aisha_core::error::ProviderError;
use aisha_core::language::{FixedLanguage, LanguageCode};
use aisha_core::persona::Persona;
use aisha_core::provider::{GenerationRequest, GenerationResponse, Provider, Usage};
use aisha_gateway::{GatewayState, build_router};
use aisha_memory::{DEFAULT_TTL, HistoryCache};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted results in sequence and keeps
/// every prompt it was sent.
struct ScriptedProvider {
    results: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(results: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let next = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider exhausted");
        Ok(GenerationResponse {
            text: next?,
            model: request.model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

struct Harness {
    app: Router,
    state: Arc<GatewayState>,
}

impl Harness {
    fn new(chat: ChatService) -> Self {
        let state = Arc::new(GatewayState { chat });
        let app = build_router(state.clone(), &GatewayConfig::default());
        Self { app, state }
    }

    fn history(&self) -> &HistoryCache {
        self.state.chat.history()
    }

    async fn post_chat(&self, message: &str) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({ "message": message }).to_string();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/chat/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn english_chat(provider: Arc<ScriptedProvider>, history: Arc<HistoryCache>) -> ChatService {
    ChatService::new(provider, "mock-model", history)
        .with_detector(Arc::new(FixedLanguage(Ok(LanguageCode::new("en")))))
}

// ── E2E: Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_hello_returns_model_reply_and_records_turn() {
    let provider = ScriptedProvider::texts(&["Hi there"]);
    let h = Harness::new(english_chat(provider.clone(), Arc::new(HistoryCache::default())));

    let (status, body) = h.post_chat("Hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "response": "Hi there" }));

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    let persona = Persona::builtin();
    assert!(prompts[0].starts_with(&persona.prompt));
    assert!(prompts[0].ends_with(&format!("\nЧеловек: Hello\n{}", persona.default_prefix)));

    let entries = h.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_message, "Hello");
    assert_eq!(entries[0].ai_response, "Hi there");
}

#[tokio::test]
async fn e2e_conversation_carries_previous_turns() {
    let provider = ScriptedProvider::texts(&["Hi there", "I'm fine, thanks!"]);
    let h = Harness::new(english_chat(provider.clone(), Arc::new(HistoryCache::default())));

    h.post_chat("Hello").await;
    let (status, body) = h.post_chat("How are you?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "I'm fine, thanks!");

    let second = &provider.prompts()[1];
    assert!(second.contains("Человек: Hello\nAI-ша: Hi there\nЧеловек: How are you?\nAI-ша:"));
    assert_eq!(h.history().len(), 2);
}

#[tokio::test]
async fn e2e_reply_is_returned_verbatim() {
    let raw = "  Привет!\n\n*улыбается*  ";
    let provider = ScriptedProvider::texts(&[raw]);
    let h = Harness::new(english_chat(provider, Arc::new(HistoryCache::default())));

    let (_, body) = h.post_chat("Hi").await;
    assert_eq!(body["response"], raw);
}

// ── E2E: Failure path ────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_provider_failure_returns_generic_error_and_keeps_cache() {
    let provider = ScriptedProvider::new(vec![
        Ok("Hi there".into()),
        Err(ProviderError::Timeout("no response in 120s".into())),
    ]);
    let h = Harness::new(english_chat(provider, Arc::new(HistoryCache::default())));

    h.post_chat("Hello").await;
    let before = h.history().entries();

    let (status, body) = h.post_chat("Are you there?").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "detail": GENERIC_FAILURE_DETAIL }));

    let after = h.history().entries();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0].sequence, before[0].sequence);
}

#[tokio::test]
async fn e2e_blank_message_passes_through_when_policy_disabled() {
    let provider = ScriptedProvider::texts(&["..."]);
    let chat = english_chat(provider.clone(), Arc::new(HistoryCache::default()))
        .with_blank_rejection(false);
    let h = Harness::new(chat);

    let (status, body) = h.post_chat("").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "...");
    assert_eq!(provider.prompts().len(), 1);
}

// ── E2E: Expiry ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_history_older_than_ttl_is_evicted() {
    let clock = Arc::new(ManualClock::default());
    let history = Arc::new(HistoryCache::with_clock(DEFAULT_TTL, clock.clone()));
    let provider = ScriptedProvider::texts(&["first reply", "second reply", "third reply"]);
    let h = Harness::new(english_chat(provider.clone(), history));

    h.post_chat("first message").await;
    clock.advance(chrono::Duration::seconds(601));
    h.post_chat("second message").await;

    let rendered = h.history().render(&Persona::builtin());
    assert_eq!(rendered, "Человек: second message\nAI-ша: second reply");

    h.post_chat("third message").await;
    let last = provider.prompts().pop().unwrap();
    assert!(!last.contains("first message"));
    assert!(last.contains("Человек: second message\nAI-ша: second reply"));
}

#[tokio::test]
async fn e2e_history_within_ttl_is_kept() {
    let clock = Arc::new(ManualClock::default());
    let history = Arc::new(HistoryCache::with_clock(DEFAULT_TTL, clock.clone()));
    let provider = ScriptedProvider::texts(&["a", "b"]);
    let h = Harness::new(english_chat(provider, history));

    h.post_chat("one").await;
    clock.advance(chrono::Duration::seconds(600));
    h.post_chat("two").await;

    assert_eq!(h.history().len(), 2);
}

// ── E2E: Language ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_russian_message_gets_russian_prefix() {
    let provider = ScriptedProvider::texts(&["Привет! Всё отлично."]);
    let chat = ChatService::new(provider.clone(), "mock-model", Arc::new(HistoryCache::default()))
        .with_detector(Arc::new(WhatlangDetector::new()));
    let h = Harness::new(chat);

    let (status, _) = h
        .post_chat("Привет! Как у тебя сегодня дела? Что нового произошло за неделю?")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(provider.prompts()[0].ends_with("\nAI-ша 0.5:"));
}

#[tokio::test]
async fn e2e_short_russian_turns_get_russian_prefix() {
    let provider = ScriptedProvider::texts(&["Пожалуйста!", "Колобок повесился."]);
    let chat = ChatService::new(provider.clone(), "mock-model", Arc::new(HistoryCache::default()))
        .with_detector(Arc::new(WhatlangDetector::new()));
    let h = Harness::new(chat);

    h.post_chat("Спасибо").await;
    h.post_chat("Расскажи анекдот").await;

    for prompt in provider.prompts() {
        assert!(prompt.ends_with("\nAI-ша 0.5:"), "prompt: {prompt:?}");
    }
}

#[tokio::test]
async fn e2e_english_message_gets_default_prefix() {
    let provider = ScriptedProvider::texts(&["Doing great."]);
    let chat = ChatService::new(provider.clone(), "mock-model", Arc::new(HistoryCache::default()))
        .with_detector(Arc::new(WhatlangDetector::new()));
    let h = Harness::new(chat);

    h.post_chat("Hello! How are you doing today? What have you been up to this week?")
        .await;
    let prompt = &provider.prompts()[0];
    assert!(prompt.ends_with("\nAI-ша:"));
    assert!(!prompt.ends_with("0.5:"));
}

// ── E2E: Page, assets, health ────────────────────────────────────────────

#[tokio::test]
async fn e2e_page_assets_and_health_are_served() {
    let provider = ScriptedProvider::texts(&["Hi there"]);
    let h = Harness::new(english_chat(provider, Arc::new(HistoryCache::default())));

    let (status, html) = h.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("AI-ша"));

    let (status, _) = h.get("/static/style.css").await;
    assert_eq!(status, StatusCode::OK);

    h.post_chat("Hello").await;
    let (status, health) = h.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&health).unwrap();
    assert_eq!(health["history_entries"], 1);
}
