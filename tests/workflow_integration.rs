use std::sync::Arc;

use chrono::{Duration, Utc};
use daybook::api::ApiClient;
use daybook::model::{Entry, Privacy, SearchFilters};
use daybook::service::{JournalService, SearchKind, SearchRequest, SearchResponse};
use daybook::store::{EntryStore, JsonStore};
use daybook::vector;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(owner: Uuid, title: &str, content: &str, tags: &[&str]) -> Entry {
    Entry {
        id: Uuid::new_v4(),
        owner_id: owner,
        title: Some(title.into()),
        content: content.into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        privacy: Privacy::Private,
        shared_with: vec![],
        created_at: Utc::now() - Duration::days(2),
        media_labels: vec![],
        searchable_text: String::new(),
        content_embedding: None,
        embedding_version: None,
        last_embedding_update: None,
        ai_insights: None,
    }
}

fn with_embedding(mut e: Entry, vec: &[f32]) -> Entry {
    e.content_embedding = Some(vector::encode(vec));
    e.embedding_version = Some("test".into());
    e.last_embedding_update = Some(Utc::now());
    e
}

async fn mock_query_embedding(server: &MockServer, vec: &[f32]) {
    let response = serde_json::json!({
        "data": [ { "index": 0, "embedding": vec } ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

fn service(uri: String, store: Arc<JsonStore>) -> JournalService {
    let client = ApiClient::new("test_key".into(), Some(uri))
        .unwrap()
        .disable_throttle();
    JournalService::new(Arc::new(client), store)
}

#[tokio::test]
async fn test_vector_search_end_to_end() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();

    let close = with_embedding(
        entry(user, "Morning Run", "Went for a 5k run in the park", &["fitness"]),
        &[1.0, 0.0, 0.0],
    );
    let close_id = close.id;
    store.insert(close).unwrap();
    store
        .insert(with_embedding(
            entry(user, "Tax paperwork", "Filed the annual return", &[]),
            &[0.0, 1.0, 0.0],
        ))
        .unwrap();
    // No embedding yet: invisible to vector search
    store
        .insert(entry(user, "Draft", "unembedded thoughts", &[]))
        .unwrap();

    let uri = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        let mut request = SearchRequest::new("morning runs", user);
        request.kind = SearchKind::Vector;
        svc.search(&request)
    })
    .await
    .unwrap()
    .unwrap();

    match response {
        SearchResponse::Results {
            results,
            total_results,
            ..
        } => {
            assert_eq!(total_results, 1);
            assert_eq!(results[0].entry_id, close_id);
            assert!(results[0].score > 0.9);
            assert_eq!(results[0].match_reason, "semantic match");
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[tokio::test]
async fn test_wildcard_with_filters_bypasses_threshold() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();

    // Orthogonal to the query vector: similarity 0, below any threshold
    store
        .insert(with_embedding(
            entry(user, "Leg day", "Squats and lunges", &["fitness"]),
            &[0.0, 1.0, 0.0],
        ))
        .unwrap();

    let uri = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        let mut request = SearchRequest::new("*", user);
        request.kind = SearchKind::Vector;
        request.filters = SearchFilters {
            tags: vec!["fitness".into()],
            ..Default::default()
        };
        svc.search(&request)
    })
    .await
    .unwrap()
    .unwrap();

    match response {
        SearchResponse::Results { total_results, .. } => assert_eq!(total_results, 1),
        other => panic!("unexpected response {:?}", other),
    }
}

#[tokio::test]
async fn test_wildcard_unmatched_filter_returns_empty() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();
    store
        .insert(with_embedding(
            entry(user, "Leg day", "Squats and lunges", &["gym"]),
            &[1.0, 0.0, 0.0],
        ))
        .unwrap();

    let uri = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        let mut request = SearchRequest::new("*", user);
        request.kind = SearchKind::Vector;
        request.filters = SearchFilters {
            tags: vec!["fitness".into()],
            ..Default::default()
        };
        svc.search(&request)
    })
    .await
    .unwrap()
    .unwrap();

    // No entry is tagged "fitness": empty result set, not an error
    match response {
        SearchResponse::Results { total_results, .. } => assert_eq!(total_results, 0),
        other => panic!("unexpected response {:?}", other),
    }
}

#[tokio::test]
async fn test_hybrid_search_fuses_signals() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();

    // Semantically close AND lexically matching
    let both = with_embedding(
        entry(user, "Morning Run", "Went for a 5k run in the park", &[]),
        &[0.9, 0.1, 0.0],
    );
    let both_id = both.id;
    store.insert(both).unwrap();
    // Semantically close only
    store
        .insert(with_embedding(
            entry(user, "Hill sprints", "Intervals on the slope", &[]),
            &[0.9, 0.1, 0.0],
        ))
        .unwrap();

    let uri = mock_server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        let request = SearchRequest::new("run", user);
        svc.search(&request)
    })
    .await
    .unwrap()
    .unwrap();

    match response {
        SearchResponse::Results { results, .. } => {
            assert_eq!(results[0].entry_id, both_id);
            assert_eq!(results[0].match_reason, "semantic + keyword match");
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[tokio::test]
async fn test_conversational_citation_repair_and_confidence() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;

    let answer = serde_json::json!({
        "choices": [
            { "message": { "role": "assistant",
                "content": "You enjoyed it [entry: \"Morning Run\"] and also [entry:Nonexistent Entry]." } }
        ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer))
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();

    let run = with_embedding(
        entry(user, "Morning Run", "Went for a 5k run in the park", &["fitness"]),
        &[1.0, 0.0, 0.0],
    );
    let run_id = run.id;
    store.insert(run).unwrap();

    let uri = mock_server.uri();
    let answer = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        svc.converse(user, "how did my run go?", &[])
    })
    .await
    .unwrap()
    .unwrap();

    // Title citation rewritten to the uuid; unknown citation demoted to text
    assert!(answer.answer.contains(&format!("[entry:{}]", run_id)));
    assert!(answer.answer.contains("Nonexistent Entry"));
    assert!(!answer.answer.contains("[entry:Nonexistent"));

    // Similarity 1.0 → min(0.95, 1.2) = 0.95
    assert!((answer.confidence - 0.95).abs() < 1e-6);
    assert_eq!(answer.entries_used, 1);
}

#[tokio::test]
async fn test_conversational_nothing_found() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;
    // No chat mock: the model must not be called when grounding is empty

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();

    let uri = mock_server.uri();
    let answer = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        svc.converse(user, "did I ever go skydiving?", &[])
    })
    .await
    .unwrap()
    .unwrap();

    assert!((answer.confidence - 0.1).abs() < 1e-6);
    assert_eq!(answer.entries_used, 0);
    assert!(answer.entries.is_empty());
}

#[tokio::test]
async fn test_model_failure_returns_fallback() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[1.0, 0.0, 0.0]).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();
    store
        .insert(with_embedding(
            entry(user, "Morning Run", "Went for a 5k run in the park", &[]),
            &[1.0, 0.0, 0.0],
        ))
        .unwrap();

    let uri = mock_server.uri();
    let answer = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store);
        svc.converse(user, "how did my run go?", &[])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(answer.confidence, 0.0);
    assert!(answer.entries.is_empty());
    assert!(!answer.answer.is_empty());
}

#[tokio::test]
async fn test_process_missing_embeddings_backfill() {
    let mock_server = MockServer::start().await;
    mock_query_embedding(&mock_server, &[0.3, 0.4, 0.5]).await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp.path().join("journal.json")).unwrap());
    let user = store.default_user();
    store
        .insert(entry(user, "One", "first entry", &[]))
        .unwrap();
    store
        .insert(entry(user, "Two", "second entry", &[]))
        .unwrap();

    let uri = mock_server.uri();
    let store_clone = Arc::clone(&store);
    let (report, status) = tokio::task::spawn_blocking(move || {
        let svc = service(uri, store_clone);
        let report = svc.process_missing_embeddings(Some(user), 50)?;
        let status = svc.embedding_status(user)?;
        // The sweep runs inline; the background queue saw no work
        assert_eq!(svc.background_error_count(), 0);
        Ok::<_, daybook::Error>((report, status))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.total_found, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(status.with_embeddings, 2);
    assert_eq!(status.needs_processing, 0);
    assert!((status.coverage_percent - 100.0).abs() < 1e-3);

    // The persisted vector round-trips through the codec
    let entries = store.owned_entries(user).unwrap();
    let decoded = vector::decode(entries[0].content_embedding.as_deref().unwrap()).unwrap();
    assert_eq!(decoded, vec![0.3, 0.4, 0.5]);
}
