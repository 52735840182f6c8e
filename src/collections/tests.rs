use super::*;
use crate::test_support::{MODEL_LARGE, MODEL_SMALL, context, object};
use crate::vectordb::StoredDocument;
use serde_json::json;

#[tokio::test]
async fn test_create_records_binding() {
    let ctx = context();
    let metadata = create(&ctx, "recipes", Some(MODEL_LARGE), object(json!({"owner": "kitchen"})))
        .await
        .unwrap();

    assert_eq!(metadata[EMBEDDING_MODEL_KEY], MODEL_LARGE);
    assert_eq!(metadata[DISTANCE_METRIC_KEY], DISTANCE_METRIC_COSINE);
    assert_eq!(metadata["owner"], "kitchen");

    let info = get(&ctx, "recipes").await.unwrap();
    assert_eq!(info.count, 0);
    assert_eq!(info.metadata, metadata);
}

#[tokio::test]
async fn test_create_reserved_keys_win() {
    let ctx = context();
    let metadata = create(
        &ctx,
        "recipes",
        Some(MODEL_SMALL),
        object(json!({"embedding_model": "other", "distance_metric": "l2"})),
    )
    .await
    .unwrap();

    assert_eq!(metadata[EMBEDDING_MODEL_KEY], MODEL_SMALL);
    assert_eq!(metadata[DISTANCE_METRIC_KEY], "cosine");
}

#[tokio::test]
async fn test_create_validation() {
    let ctx = context();

    for (name, model) in [
        ("", Some(MODEL_LARGE)),
        ("recipes", None),
        ("recipes", Some("")),
        ("recipes", Some("ghost-model")),
    ] {
        let err = create(&ctx, name, model, Map::new()).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidArgument(_)),
            "({name:?}, {model:?}) gave {err:?}"
        );
    }

    assert!(list(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_duplicate_conflicts_and_keeps_original() {
    let ctx = context();
    create(&ctx, "recipes", Some(MODEL_LARGE), object(json!({"v": 1})))
        .await
        .unwrap();

    let err = create(&ctx, "recipes", Some(MODEL_SMALL), object(json!({"v": 2})))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let info = get(&ctx, "recipes").await.unwrap();
    assert_eq!(info.metadata["v"], 1);
    assert_eq!(info.metadata[EMBEDDING_MODEL_KEY], MODEL_LARGE);
}

#[tokio::test]
async fn test_get_missing() {
    let ctx = context();
    let err = get(&ctx, "ghost").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref m) if m.contains("ghost")));
}

#[tokio::test]
async fn test_list_sorted_with_counts() {
    let ctx = context();
    for name in ["zeta", "alpha", "mid"] {
        create(&ctx, name, Some(MODEL_SMALL), Map::new()).await.unwrap();
    }
    ctx.store
        .upsert(
            "mid",
            vec![StoredDocument {
                id: "d1".to_string(),
                text: "hello".to_string(),
                metadata: Map::new(),
                vector: vec![0.1; 384],
            }],
        )
        .await
        .unwrap();

    let summaries = list(&ctx).await.unwrap();
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    assert_eq!(summaries[1].count, 1);
    assert!(summaries.iter().all(|s| s.error.is_none()));
}

#[tokio::test]
async fn test_update_metadata_replace_keeps_reserved() {
    let ctx = context();
    create(&ctx, "recipes", Some(MODEL_LARGE), object(json!({"a": 1, "b": 2})))
        .await
        .unwrap();

    let updated = update_metadata(&ctx, "recipes", object(json!({"c": 3})), false)
        .await
        .unwrap();

    assert_eq!(
        updated,
        object(json!({"c": 3, "embedding_model": MODEL_LARGE, "distance_metric": "cosine"}))
    );
    assert_eq!(get(&ctx, "recipes").await.unwrap().metadata, updated);
}

#[tokio::test]
async fn test_update_metadata_merge() {
    let ctx = context();
    create(&ctx, "recipes", Some(MODEL_LARGE), object(json!({"a": 1, "b": 2})))
        .await
        .unwrap();

    let updated = update_metadata(&ctx, "recipes", object(json!({"b": 20, "c": 3})), true)
        .await
        .unwrap();

    assert_eq!(updated["a"], 1);
    assert_eq!(updated["b"], 20);
    assert_eq!(updated["c"], 3);
    assert_eq!(updated[EMBEDDING_MODEL_KEY], MODEL_LARGE);
}

#[tokio::test]
async fn test_update_metadata_rejects_rebinding() {
    let ctx = context();
    create(&ctx, "recipes", Some(MODEL_LARGE), Map::new())
        .await
        .unwrap();

    for merge in [false, true] {
        let err = update_metadata(
            &ctx,
            "recipes",
            object(json!({"embedding_model": MODEL_SMALL})),
            merge,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    // Restating the current value is allowed.
    update_metadata(
        &ctx,
        "recipes",
        object(json!({"embedding_model": MODEL_LARGE, "x": 1})),
        false,
    )
    .await
    .unwrap();

    let resolved = resolve_model(&ctx, "recipes").await.unwrap();
    assert_eq!(resolved.model_id, MODEL_LARGE);
}

#[tokio::test]
async fn test_update_metadata_missing_collection() {
    let ctx = context();
    let err = update_metadata(&ctx, "ghost", Map::new(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_delete() {
    let ctx = context();
    create(&ctx, "recipes", Some(MODEL_LARGE), Map::new())
        .await
        .unwrap();

    delete(&ctx, "recipes").await.unwrap();
    assert!(matches!(
        get(&ctx, "recipes").await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        delete(&ctx, "recipes").await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_resolve_model_errors() {
    let ctx = context();

    assert!(matches!(
        resolve_model(&ctx, "ghost").await.unwrap_err(),
        ServiceError::NotFound(_)
    ));

    // Legacy collection without a binding.
    ctx.store
        .create_collection("legacy", 384, object(json!({"owner": "old"})))
        .await
        .unwrap();
    assert!(matches!(
        resolve_model(&ctx, "legacy").await.unwrap_err(),
        ServiceError::InvalidArgument(_)
    ));

    // Bound to a model this process did not load.
    ctx.store
        .create_collection("orphan", 384, object(json!({"embedding_model": "retired"})))
        .await
        .unwrap();
    assert!(matches!(
        resolve_model(&ctx, "orphan").await.unwrap_err(),
        ServiceError::ServiceUnavailable(_)
    ));
}

#[tokio::test]
async fn test_list_tolerates_per_collection_failure() {
    let ctx = crate::test_support::flaky_context("broken");
    create(&ctx, "healthy", Some(MODEL_SMALL), Map::new())
        .await
        .unwrap();
    create(&ctx, "broken", Some(MODEL_SMALL), Map::new())
        .await
        .unwrap_err();
    ctx.store
        .inner
        .create_collection("broken", 384, Map::new())
        .await
        .unwrap();

    let summaries = list(&ctx).await.unwrap();
    assert_eq!(summaries.len(), 2);

    let broken = &summaries[0];
    assert_eq!(broken.name, "broken");
    assert_eq!(broken.count, 0);
    assert!(broken.metadata.is_empty());
    assert!(broken.error.as_deref().unwrap().contains("simulated"));

    let healthy = &summaries[1];
    assert!(healthy.error.is_none());
    assert_eq!(healthy.metadata[EMBEDDING_MODEL_KEY], MODEL_SMALL);
}

#[tokio::test]
async fn test_existence_check_failure_is_internal() {
    let ctx = crate::test_support::flaky_context("broken");
    let err = create(&ctx, "broken", Some(MODEL_SMALL), Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Internal(_)));
    assert!(ctx.store.inner.list_collections().await.unwrap().is_empty());
}
