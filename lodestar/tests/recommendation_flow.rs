use std::sync::Arc;

use chrono::Utc;
use lodestar::config::{DatabaseConfig, RetrievalConfig};
use lodestar::{
    ClientConfig, ContentItem, Database, LibSqlMemoryAdapter, Metadata, RecommendationClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_DIMENSIONS: usize = 4;

fn llm_response(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
    })
}

fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new("sk-test");
    config.llm.base_url = Some(base_url.to_string());
    config.llm.max_retries = 0;
    config.embeddings.base_url = Some(base_url.to_string());
    config.embeddings.dimensions = TEST_DIMENSIONS;
    config.embeddings.max_retries = 0;
    config.retrieval = RetrievalConfig {
        limit: 5,
        threshold: 0.5,
    };
    config
}

fn content_item(id: &str, title: &str, category: &str) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        title: title.to_string(),
        excerpt: Some(format!("{title} in depth")),
        category: Some(category.to_string()),
        tags: vec![category.to_string()],
        metadata: Metadata::new(),
        created_at: Utc::now(),
    }
}

async fn seeded_adapter(temp_dir: &TempDir) -> LibSqlMemoryAdapter {
    let db_path = temp_dir.path().join("lodestar_test.db");
    let config = DatabaseConfig {
        url: format!("file:{}", db_path.to_str().unwrap()),
        auth_token: None,
        local_path: None,
    };
    let db = Database::new(&config, TEST_DIMENSIONS)
        .await
        .expect("Failed to create database");
    let adapter = LibSqlMemoryAdapter::new(db);

    // Orthogonal-ish embeddings so cosine similarity against [0.1, 0.2,
    // 0.3, 0.4] ranks coast > mountain and leaves city below threshold.
    adapter
        .save_content(
            &content_item("coast", "Quiet coastal towns", "coastal"),
            &[0.1, 0.2, 0.3, 0.4],
        )
        .await
        .expect("seed coast");
    adapter
        .save_content(
            &content_item("mountain", "Alpine hiking escapes", "mountain"),
            &[0.4, 0.3, 0.2, 0.1],
        )
        .await
        .expect("seed mountain");
    adapter
        .save_content(
            &content_item("city", "City break guide", "urban"),
            &[-0.4, 0.1, -0.2, 0.1],
        )
        .await
        .expect("seed city");

    adapter
}

#[tokio::test]
async fn test_cold_start_query_returns_scored_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(
            r#"{
                "intent": "coastal escapes",
                "keywords": ["coast", "beach"],
                "lifestyleVibe": "relaxed",
                "constraints": [],
                "reasoning": "Query asks for quiet seaside destinations",
                "searchQuery": "quiet coastal towns",
                "confidence": 0.85
            }"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3, 0.4]}]
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let adapter = Arc::new(seeded_adapter(&temp_dir).await);
    let client = RecommendationClient::new(test_config(&server.uri()), adapter)
        .expect("Failed to build client");

    let result = client.get_recommendations(Some("quiet seaside towns")).await;

    assert_eq!(result.analysis.intent, "coastal escapes");
    assert_eq!(result.analysis.search_vector.len(), TEST_DIMENSIONS);

    assert!(!result.content.is_empty());
    assert_eq!(result.content[0].item.id, "coast");
    // Seed embedding equals the query embedding, so the top hit is an
    // exact cosine match.
    assert!((result.content[0].match_score - 1.0).abs() < 1e-5);
    for pair in result.content.windows(2) {
        assert!(pair[0].match_score >= pair[1].match_score);
    }
    assert!(result.content.iter().all(|c| c.item.id != "city"));
}

#[tokio::test]
async fn test_tracked_signals_reach_contextual_prompt() {
    let server = MockServer::start().await;

    // Contextual analysis must carry the tracked signal data in the
    // prompt; match on it so a cold-start prompt would fail the test.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(
            r#"{
                "intent": "alpine hiking",
                "keywords": ["hiking"],
                "lifestyleVibe": "active",
                "constraints": [],
                "reasoning": "Session shows repeated hiking engagement",
                "searchQuery": "alpine hiking trips",
                "confidence": 0.7
            }"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.4, 0.3, 0.2, 0.1]}]
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let adapter = Arc::new(seeded_adapter(&temp_dir).await);
    let client = RecommendationClient::new(test_config(&server.uri()), adapter)
        .expect("Failed to build client");

    let mut data = Metadata::new();
    data.insert("postId".to_string(), json!("hiking-guide"));
    client.track("article_view", data);

    let result = client.get_recommendations(None).await;

    assert_eq!(result.content[0].item.id, "mountain");

    let requests = server.received_requests().await.unwrap();
    let chat_body = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .expect("chat request");
    assert!(chat_body.contains("article_view"));
    assert!(chat_body.contains("hiking-guide"));
    assert!(!chat_body.contains("no behavioral history"));
}

#[tokio::test]
async fn test_llm_outage_falls_back_to_raw_query_search() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Fallback embeds the raw query text directly.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"input": ["coastal towns"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3, 0.4]}]
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let adapter = Arc::new(seeded_adapter(&temp_dir).await);
    let client = RecommendationClient::new(test_config(&server.uri()), adapter)
        .expect("Failed to build client");

    let result = client.get_recommendations(Some("coastal towns")).await;

    assert_eq!(result.analysis.intent, "Fallback Search");
    assert_eq!(result.analysis.confidence, 0.1);
    assert_eq!(result.analysis.keywords, vec!["coastal towns".to_string()]);
    // Recommendations still flow from the raw-query embedding.
    assert_eq!(result.content[0].item.id, "coast");
}

#[tokio::test]
async fn test_total_model_outage_yields_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let adapter = Arc::new(seeded_adapter(&temp_dir).await);
    let client = RecommendationClient::new(test_config(&server.uri()), adapter)
        .expect("Failed to build client");

    let result = client.get_recommendations(Some("anything at all")).await;

    assert_eq!(result.analysis.intent, "Fallback Search");
    assert!(result.analysis.search_vector.is_empty());
    assert!(result.content.is_empty());
}

#[tokio::test]
async fn test_result_serializes_with_flattened_analysis() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(
            r#"{
                "intent": "coastal escapes",
                "keywords": ["coast"],
                "lifestyleVibe": null,
                "constraints": [],
                "reasoning": "Direct query",
                "searchQuery": "coastal towns",
                "confidence": 0.8
            }"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3, 0.4]}]
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let adapter = Arc::new(seeded_adapter(&temp_dir).await);
    let client = RecommendationClient::new(test_config(&server.uri()), adapter)
        .expect("Failed to build client");

    let result = client.get_recommendations(Some("coastal towns")).await;
    let value = serde_json::to_value(&result).expect("serialize result");

    // Host apps consume the camelCase wire shape with the analysis
    // flattened at the top level next to `content`.
    assert_eq!(value["intent"], "coastal escapes");
    assert!(value["searchVector"].is_array());
    assert!(value["content"].is_array());
    assert_eq!(value["content"][0]["id"], "coast");
    assert!(value["content"][0]["matchScore"].as_f64().unwrap() > 0.5);
}
