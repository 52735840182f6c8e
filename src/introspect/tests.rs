use super::*;
use crate::collections;
use crate::ingest::{NewDocument, add_documents, empty};
use crate::test_support::{MODEL_SMALL, context, object};
use crate::vectordb::MemoryStore;
use serde_json::{Map, json};

async fn library() -> ServiceContext<MemoryStore> {
    let ctx = context();
    collections::create(&ctx, "library", Some(MODEL_SMALL), Map::new())
        .await
        .unwrap();
    add_documents(
        &ctx,
        "library",
        vec![
            NewDocument::new("Dune")
                .with_id("b1")
                .with_metadata(object(json!({"genre": "scifi", "year": 1965}))),
            NewDocument::new("Emma")
                .with_id("b2")
                .with_metadata(object(json!({"genre": "romance", "year": 1815}))),
            NewDocument::new("Foundation")
                .with_id("b3")
                .with_metadata(object(json!({"genre": "scifi", "year": 1951, "series": true}))),
            NewDocument::new("Untitled")
                .with_id("b4")
                .with_metadata(object(json!({"genre": null}))),
        ],
    )
    .await
    .unwrap();
    ctx
}

#[test]
fn test_page_limit() {
    assert_eq!(page_limit(None).unwrap(), DEFAULT_DOCUMENTS_LIMIT);
    assert_eq!(page_limit(Some(5)).unwrap(), 5);
    assert_eq!(page_limit(Some(0)).unwrap(), 0);
    assert_eq!(page_limit(Some(50_000)).unwrap(), MAX_DOCUMENTS_LIMIT);
    assert!(page_limit(Some(-1)).is_err());
    assert!(page_offset(Some(-1)).is_err());
    assert_eq!(page_offset(None).unwrap(), 0);
}

#[tokio::test]
async fn test_get_documents_paging() {
    let ctx = library().await;

    let page = get_documents(&ctx, "library", None, Some(2), Some(1))
        .await
        .unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.total, 4);
    let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["b2", "b3"]);

    let again = get_documents(&ctx, "library", None, Some(2), Some(1))
        .await
        .unwrap();
    assert_eq!(again, page);
}

#[tokio::test]
async fn test_get_documents_filtered_total() {
    let ctx = library().await;
    let filter = MetadataFilter::parse(&json!({"genre": "scifi"})).unwrap();

    let page = get_documents(&ctx, "library", Some(&filter), Some(1), None)
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.total, 2);
    assert_eq!(page.documents[0].text, "Dune");
}

#[tokio::test]
async fn test_get_documents_errors() {
    let ctx = library().await;

    assert!(matches!(
        get_documents(&ctx, "ghost", None, None, None).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        get_documents(&ctx, "library", None, Some(-5), None)
            .await
            .unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
    assert!(matches!(
        get_documents(&ctx, "ghost", None, None, Some(-1))
            .await
            .unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
}

#[tokio::test]
async fn test_empty_then_get_documents() {
    let ctx = library().await;
    empty(&ctx, "library").await.unwrap();

    let page = get_documents(&ctx, "library", None, None, None).await.unwrap();
    assert_eq!(page.count, 0);
    assert_eq!(page.total, 0);
    assert_eq!(
        collections::get(&ctx, "library").await.unwrap().metadata["embedding_model"],
        MODEL_SMALL
    );
}

#[tokio::test]
async fn test_metadata_values_sorted_distinct() {
    let ctx = library().await;

    let genres = get_metadata_values(&ctx, "library", "genre").await.unwrap();
    assert_eq!(genres, vec!["romance", "scifi"]);

    let years = get_metadata_values(&ctx, "library", "year").await.unwrap();
    assert_eq!(years, vec!["1815", "1951", "1965"]);

    let series = get_metadata_values(&ctx, "library", "series").await.unwrap();
    assert_eq!(series, vec!["true"]);

    assert!(get_metadata_values(&ctx, "library", "missing")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_metadata_values_errors() {
    let ctx = library().await;
    assert!(matches!(
        get_metadata_values(&ctx, "library", "").await.unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));
    assert!(matches!(
        get_metadata_values(&ctx, "ghost", "genre").await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_metadata_values_span_scan_pages() {
    let ctx = context();
    collections::create(&ctx, "logs", Some(MODEL_SMALL), Map::new())
        .await
        .unwrap();

    let total = SCAN_PAGE_SIZE as usize * 2 + 203;
    let documents = (0..total)
        .map(|i| {
            let shard = if i == total - 1 { json!("last") } else { json!(i % 7) };
            NewDocument::new(format!("entry {i}"))
                .with_id(format!("e{i:05}"))
                .with_metadata(object(json!({ "shard": shard })))
        })
        .collect();
    add_documents(&ctx, "logs", documents).await.unwrap();

    let shards = get_metadata_values(&ctx, "logs", "shard").await.unwrap();
    assert_eq!(shards, vec!["0", "1", "2", "3", "4", "5", "6", "last"]);
}
