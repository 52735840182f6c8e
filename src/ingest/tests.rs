use std::sync::Arc;

use super::*;
use crate::collections;
use crate::embedding::{Embedder, EmbeddingError};
use crate::models::ModelRegistry;
use crate::test_support::{MODEL_LARGE, context, object};
use crate::vectordb::MemoryStore;
use serde_json::json;

async fn recipes() -> ServiceContext<MemoryStore> {
    let ctx = context();
    collections::create(&ctx, "recipes", Some(MODEL_LARGE), Map::new())
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn test_add_documents_with_ids_and_metadata() {
    let ctx = recipes().await;
    let added = add_documents(
        &ctx,
        "recipes",
        vec![
            NewDocument::new("Chocolate cake")
                .with_id("d1")
                .with_metadata(object(json!({"course": "dessert"}))),
            NewDocument::new("Tomato soup").with_id("d2"),
        ],
    )
    .await
    .unwrap();

    assert_eq!(added.count, 2);
    assert_eq!(added.ids, vec!["d1", "d2"]);
    assert_eq!(ctx.store.document_count("recipes"), Some(2));

    let docs = ctx.store.fetch("recipes", None, 10, 0).await.unwrap();
    assert_eq!(docs[0].metadata["course"], "dessert");
    assert!(docs[1].metadata.is_empty());
}

#[tokio::test]
async fn test_add_documents_generates_ids() {
    let ctx = recipes().await;
    let added = add_documents(
        &ctx,
        "recipes",
        vec![
            NewDocument::new("one"),
            NewDocument::new("two").with_id(""),
        ],
    )
    .await
    .unwrap();

    assert_eq!(added.ids.len(), 2);
    assert_ne!(added.ids[0], added.ids[1]);
    for id in &added.ids {
        let uuid = id.strip_prefix(GENERATED_ID_PREFIX).unwrap();
        assert!(Uuid::parse_str(uuid).is_ok(), "{id} is not doc_<uuid>");
    }
}

#[tokio::test]
async fn test_add_documents_reingest_overwrites() {
    let ctx = recipes().await;
    add_documents(&ctx, "recipes", vec![NewDocument::new("v1").with_id("d1")])
        .await
        .unwrap();
    add_documents(&ctx, "recipes", vec![NewDocument::new("v2").with_id("d1")])
        .await
        .unwrap();

    let docs = ctx.store.fetch("recipes", None, 10, 0).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].text, "v2");
}

#[tokio::test]
async fn test_add_documents_validation_writes_nothing() {
    let ctx = recipes().await;

    let err = add_documents(&ctx, "recipes", vec![]).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let err = add_documents(
        &ctx,
        "recipes",
        vec![NewDocument::new("fine"), NewDocument::new("")],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m.contains("index 1")));

    let err = add_documents(&ctx, "recipes", vec![NewDocument::default()])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    assert_eq!(ctx.store.document_count("recipes"), Some(0));
}

#[tokio::test]
async fn test_add_documents_rejects_repeated_ids() {
    let ctx = recipes().await;

    let err = add_documents(
        &ctx,
        "recipes",
        vec![
            NewDocument::new("Chocolate cake").with_id("d1"),
            NewDocument::new("Tomato soup").with_id("d1"),
        ],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m.contains("'d1'")));
    assert_eq!(ctx.store.document_count("recipes"), Some(0));
}

#[tokio::test]
async fn test_add_documents_accepts_whitespace_text() {
    let ctx = recipes().await;

    let added = add_documents(&ctx, "recipes", vec![NewDocument::new("   ").with_id("blank")])
        .await
        .unwrap();

    assert_eq!(added.ids, vec!["blank"]);
    let docs = ctx.store.fetch("recipes", None, 10, 0).await.unwrap();
    assert_eq!(docs[0].text, "   ");
}

#[tokio::test]
async fn test_validation_precedes_collection_lookup() {
    let ctx = context();
    let err = add_documents(&ctx, "ghost", vec![NewDocument::default()])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_add_documents_missing_collection() {
    let ctx = context();
    let err = add_documents(&ctx, "ghost", vec![NewDocument::new("text")])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[derive(Debug)]
struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn dimension(&self) -> usize {
        8
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }
}

#[tokio::test]
async fn test_dimension_mismatch_fails_whole_batch() {
    let registry = ModelRegistry::builder()
        .embedder("short", ShortEmbedder)
        .build()
        .unwrap();
    let ctx = ServiceContext::new(Arc::new(registry), MemoryStore::new());
    collections::create(&ctx, "c", Some("short"), Map::new())
        .await
        .unwrap();

    let err = add_documents(&ctx, "c", vec![NewDocument::new("a"), NewDocument::new("b")])
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Internal(ref m) if m.contains("expected 8, got 4")));
    assert_eq!(ctx.store.document_count("c"), Some(0));
}

#[tokio::test]
async fn test_delete_documents() {
    let ctx = recipes().await;
    add_documents(
        &ctx,
        "recipes",
        vec![
            NewDocument::new("a").with_id("a"),
            NewDocument::new("b").with_id("b"),
        ],
    )
    .await
    .unwrap();

    let requested = delete_documents(&ctx, "recipes", vec!["a".into(), "nope".into()])
        .await
        .unwrap();
    assert_eq!(requested, 2);
    assert_eq!(ctx.store.document_count("recipes"), Some(1));

    let err = delete_documents(&ctx, "recipes", vec![]).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let err = delete_documents(&ctx, "ghost", vec!["a".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_empty_keeps_collection() {
    let ctx = recipes().await;
    add_documents(
        &ctx,
        "recipes",
        vec![NewDocument::new("a"), NewDocument::new("b"), NewDocument::new("c")],
    )
    .await
    .unwrap();

    assert_eq!(empty(&ctx, "recipes").await.unwrap(), 3);
    assert_eq!(ctx.store.document_count("recipes"), Some(0));

    let info = collections::get(&ctx, "recipes").await.unwrap();
    assert_eq!(info.metadata["embedding_model"], MODEL_LARGE);

    assert!(matches!(
        empty(&ctx, "ghost").await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}
