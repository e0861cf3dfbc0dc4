//! End-to-end session behavior: ingestion, querying, limits, teardown.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{StaticChatModel, VocabEmbedder};
use finrag::{
    ExtractedText, IngestOutcome, PlainTextExtractor, RagConfig, RagError, RetrievalMode,
    Session,
};

fn small_config() -> RagConfig {
    RagConfig::builder().chunk_size(120).chunk_overlap(20).build().unwrap()
}

fn session_with(config: RagConfig) -> Session {
    Session::builder()
        .config(config)
        .embedding_provider(Arc::new(VocabEmbedder::financial()))
        .chat_model(Arc::new(StaticChatModel::new("the canned analysis")))
        .build()
        .unwrap()
}

fn tesla_text() -> String {
    "tesla revenue grew on vehicle deliveries. tesla battery production scaled. \
     tesla revenue from energy storage accelerated. tesla risk factors include \
     competition and supply chain exposure. tesla revenue guidance was raised."
        .to_string()
}

fn apple_text() -> String {
    "apple revenue was driven by services growth. apple revenue from hardware \
     held steady. apple risk factors include regulatory scrutiny. apple \
     revenue per user expanded in all regions this year."
        .to_string()
}

async fn load(session: &mut Session, filename: &str, text: String) -> String {
    let outcome = session
        .ingest_extracted(filename, "10-K", ExtractedText { text, page_count: 1 })
        .await
        .unwrap();
    match outcome {
        IngestOutcome::Added { document_id, chunk_count } => {
            assert!(chunk_count > 0);
            document_id
        }
        IngestOutcome::DuplicateSkipped => panic!("fixture ingested twice"),
    }
}

#[tokio::test]
async fn ingest_and_ask_produces_a_cited_answer() {
    let mut session = session_with(small_config());
    let tesla_id = load(&mut session, "10-K TESLA.txt", tesla_text()).await;

    let answer = session.ask("What were tesla revenue drivers?").await.unwrap();

    assert_eq!(answer.text, "the canned analysis");
    assert!(!answer.citations.is_empty());
    assert!(answer.citations.iter().all(|c| c.document_id == tesla_id));
    assert!(answer.citations.iter().all(|c| c.company == "Tesla"));
    assert_eq!(session.stats().queries_asked, 1);
}

#[tokio::test]
async fn comparative_question_draws_from_both_companies() {
    let mut session = session_with(small_config());
    let tesla_id = load(&mut session, "10-K TESLA.txt", tesla_text()).await;
    let apple_id = load(&mut session, "10-K APPLE.txt", apple_text()).await;

    assert_eq!(session.companies(), vec!["Tesla".to_string(), "Apple".to_string()]);

    let (answer, retrieval) =
        session.ask_with_sources("Compare Tesla and Apple revenue").await.unwrap();

    assert_eq!(retrieval.mode, RetrievalMode::Balanced);
    assert!(retrieval.missing_entities.is_empty());
    assert!(answer.citations.iter().any(|c| c.document_id == tesla_id));
    assert!(answer.citations.iter().any(|c| c.document_id == apple_id));
}

#[tokio::test]
async fn the_query_quota_boundary_is_exact() {
    let config = RagConfig::builder()
        .chunk_size(120)
        .chunk_overlap(20)
        .max_queries_per_window(10)
        .build()
        .unwrap();
    let mut session = session_with(config);
    load(&mut session, "10-K TESLA.txt", tesla_text()).await;

    for i in 0..10u32 {
        assert_eq!(session.queries_remaining(), 10 - i);
        session.ask("tesla revenue?").await.unwrap();
    }

    assert_eq!(session.queries_remaining(), 0);
    let denied = session.ask("tesla revenue?").await;
    assert!(matches!(denied, Err(RagError::RateLimitExceeded { .. })));
    // The denied query is not counted as asked.
    assert_eq!(session.stats().queries_asked, 10);
}

#[tokio::test]
async fn the_query_quota_resets_after_the_window() {
    let config = RagConfig::builder()
        .chunk_size(120)
        .chunk_overlap(20)
        .max_queries_per_window(1)
        .rate_limit_window(Duration::from_millis(50))
        .build()
        .unwrap();
    let mut session = session_with(config);
    load(&mut session, "10-K TESLA.txt", tesla_text()).await;

    session.ask("tesla revenue?").await.unwrap();
    assert!(matches!(
        session.ask("tesla revenue?").await,
        Err(RagError::RateLimitExceeded { .. })
    ));

    tokio::time::sleep(Duration::from_millis(60)).await;
    session.ask("tesla revenue?").await.unwrap();
}

#[tokio::test]
async fn identical_content_is_ingested_once() {
    let mut session = session_with(small_config());
    load(&mut session, "10-K TESLA.txt", tesla_text()).await;

    let second = session
        .ingest_extracted(
            "tesla-copy.txt",
            "10-K",
            ExtractedText { text: tesla_text(), page_count: 1 },
        )
        .await
        .unwrap();

    assert_eq!(second, IngestOutcome::DuplicateSkipped);
    assert_eq!(session.documents().len(), 1);
    assert_eq!(session.stats().documents_processed, 1);
}

#[tokio::test]
async fn clearing_the_session_removes_every_trace() {
    let mut session = session_with(small_config());
    load(&mut session, "10-K TESLA.txt", tesla_text()).await;
    load(&mut session, "10-K APPLE.txt", apple_text()).await;

    session.clear().await.unwrap();

    assert!(session.documents().is_empty());
    assert!(session.companies().is_empty());
    let asked = session.ask("tesla revenue?").await;
    assert!(matches!(asked, Err(RagError::EmptyIndex)));
}

#[tokio::test]
async fn removing_one_document_leaves_the_other_searchable() {
    let mut session = session_with(small_config());
    let tesla_id = load(&mut session, "10-K TESLA.txt", tesla_text()).await;
    load(&mut session, "10-K APPLE.txt", apple_text()).await;

    let removed = session.remove_document(&tesla_id).await.unwrap();
    assert!(removed > 0);
    assert_eq!(session.companies(), vec!["Apple".to_string()]);

    let answer = session.ask("apple revenue?").await.unwrap();
    assert!(answer.citations.iter().all(|c| c.company == "Apple"));

    // Removing an unknown document is a no-op.
    assert_eq!(session.remove_document(&tesla_id).await.unwrap(), 0);
}

#[tokio::test]
async fn oversized_uploads_are_rejected_before_extraction() {
    let config = RagConfig::builder()
        .chunk_size(120)
        .chunk_overlap(20)
        .max_document_bytes(16)
        .build()
        .unwrap();
    let mut session = session_with(config);

    let result = session
        .ingest_bytes("huge.txt", "10-K", &[b'a'; 64], &PlainTextExtractor)
        .await;

    assert!(matches!(result, Err(RagError::InvalidDocument(_))));
}

#[tokio::test]
async fn documents_without_a_text_layer_are_unsupported() {
    let mut session = session_with(small_config());

    let pdf = session
        .ingest_bytes("scan.pdf", "10-K", b"%PDF-1.7 binary", &PlainTextExtractor)
        .await;
    assert!(matches!(pdf, Err(RagError::UnsupportedDocument(_))));

    let binary = session
        .ingest_bytes("blob.bin", "10-K", &[0xff, 0xfe, 0x00, 0x80], &PlainTextExtractor)
        .await;
    assert!(matches!(binary, Err(RagError::UnsupportedDocument(_))));
}

#[tokio::test]
async fn empty_extracted_text_is_an_invalid_document() {
    let mut session = session_with(small_config());

    let result = session
        .ingest_extracted("empty.txt", "10-K", ExtractedText { text: String::new(), page_count: 0 })
        .await;

    assert!(matches!(result, Err(RagError::InvalidDocument(_))));
    assert!(session.documents().is_empty());
}
