//! Integration tests for the trip planner
//!
//! These tests drive the public pipeline end to end: prompt rendering, the
//! HTTP client against a mock server, history and document export.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tripplanner::config::LlmConfig;
use tripplanner::export::{self, ExportFormat, Exporter, HEADING, PdfFonts};
use tripplanner::history::HistoryLog;
use tripplanner::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
use tripplanner::planner::{Planner, PlannerError};
use tripplanner::prompts::PromptLoader;

/// Answers every request with a fixed itinerary built from the system prompt
struct EchoClient {
    seen: Mutex<Vec<CompletionRequest>>,
}

impl EchoClient {
    fn new() -> Self {
        Self { seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl LlmClient for EchoClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let text = format!("- Plan based on: {}", request.system_prompt);
        self.seen.lock().unwrap().push(request);
        Ok(CompletionResponse::text(text))
    }
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_pipeline_records_history_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let client = Arc::new(EchoClient::new());
    let planner = Planner::new(client.clone(), PromptLoader::embedded_only())
        .with_history(HistoryLog::open(temp_dir.path()).unwrap());

    let cities = ["Lisbon", "Kyoto", "Montreal"];
    for city in cities {
        planner.plan(city, "food, walking").await.unwrap();
    }

    let entries = HistoryLog::open(temp_dir.path()).unwrap().load().unwrap();
    assert_eq!(entries.len(), 3);
    for (entry, city) in entries.iter().zip(cities) {
        assert_eq!(entry.city, city);
        assert_eq!(entry.interests, "food, walking");
        assert!(entry.itinerary.contains(city));
    }
    assert_eq!(client.seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_blank_input_never_reaches_model_or_history() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let client = Arc::new(EchoClient::new());
    let planner = Planner::new(client.clone(), PromptLoader::embedded_only())
        .with_history(HistoryLog::open(temp_dir.path()).unwrap());

    let err = planner.plan("   ", "museums").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Please enter both a city and your interests.");

    assert!(client.seen.lock().unwrap().is_empty());
    assert!(planner.history().unwrap().load().unwrap().is_empty());
}

#[tokio::test]
async fn test_spawned_requests_run_concurrently() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let planner = Arc::new(
        Planner::new(Arc::new(EchoClient::new()), PromptLoader::embedded_only())
            .with_history(HistoryLog::open(temp_dir.path()).unwrap()),
    );

    let mut pending: Vec<_> = (0..5)
        .map(|i| planner.spawn(format!("City {}", i), "parks"))
        .collect();
    for p in &mut pending {
        p.wait().await.unwrap();
    }

    assert_eq!(planner.history().unwrap().load().unwrap().len(), 5);
}

// =============================================================================
// HTTP Client Tests
// =============================================================================

#[tokio::test]
async fn test_plan_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "* 9:00 Rijksmuseum\n* 13:00 Canal cruise"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 60, "completion_tokens": 14}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let llm = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = create_client(&llm.resolve_with_key("test-key")).unwrap();
    let planner = Planner::new(client, PromptLoader::embedded_only());

    let record = planner.plan("Amsterdam", "art, boats").await.unwrap();
    assert_eq!(record.itinerary(), "* 9:00 Rijksmuseum\n* 13:00 Canal cruise");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["messages"][0]["content"],
        "You are a helpful travel assistant. Create a day trip itinerary for Amsterdam based on the user's \
         interests: art, boats. Provide a brief, bulleted itinerary."
    );
    assert_eq!(body["messages"][1]["content"], "Create an itinerary for my day trip.");
    assert_eq!(body["temperature"], 0.0);
}

#[tokio::test]
async fn test_server_error_surfaces_without_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = create_client(&llm.resolve_with_key("test-key")).unwrap();
    let planner = Planner::new(client, PromptLoader::embedded_only())
        .with_history(HistoryLog::open(temp_dir.path()).unwrap());

    let err = planner.plan("Oslo", "fjords").await.unwrap_err();
    assert!(matches!(err, PlannerError::Llm(LlmError::ApiError { status: 500, .. })));
    assert!(planner.history().unwrap().load().unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let llm = LlmConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = create_client(&llm.resolve_with_key("test-key")).unwrap();
    let planner = Planner::new(client, PromptLoader::embedded_only()).with_timeout(Duration::from_millis(100));

    let err = planner.plan("Reykjavik", "hot springs").await.unwrap_err();
    assert!(matches!(err, PlannerError::Timeout(_)));
}

// =============================================================================
// Export Tests
// =============================================================================

#[tokio::test]
async fn test_exports_of_history_entry_are_stable() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let planner = Planner::new(Arc::new(EchoClient::new()), PromptLoader::embedded_only())
        .with_history(HistoryLog::open(temp_dir.path()).unwrap());
    planner.plan("Rome", "history, gelato").await.unwrap();

    let entry = planner.history().unwrap().get(1).unwrap().unwrap();

    let exporter = Exporter::new(None).unwrap();
    let docx_path = temp_dir.path().join("exports").join("rome.docx");
    exporter.write(&entry.itinerary, ExportFormat::Docx, &docx_path).unwrap();
    let paragraphs = export::docx_text(&std::fs::read(&docx_path).unwrap()).unwrap();
    assert_eq!(paragraphs, vec![HEADING.to_string(), entry.itinerary.clone()]);
    assert_eq!(
        export::docx_text(&export::to_docx(&entry.itinerary).unwrap()).unwrap(),
        paragraphs
    );

    let pdf_path = temp_dir.path().join("rome.pdf");
    let rendered = exporter.write(&entry.itinerary, ExportFormat::Pdf, &pdf_path).unwrap();
    assert!(rendered.is_complete());
    assert!(std::fs::read(&pdf_path).unwrap().starts_with(b"%PDF-"));

    let font = PdfFonts::bundled().unwrap().body;
    let page = export::layout(&entry.itinerary, &font);
    assert_eq!(page, export::layout(&entry.itinerary, &font));
    assert_eq!(page.lines_dropped, 0);
}
