use super::*;
use crate::vectordb::cosine_similarity;

fn stub_embedder(dimension: usize) -> TextEmbedder {
    TextEmbedder::load(EmbedderConfig::stub(dimension)).expect("stub embedder should load")
}

#[test]
fn test_stub_config_validates() {
    assert!(EmbedderConfig::stub(384).validate().is_ok());
}

#[test]
fn test_stub_zero_dimension_rejected() {
    let err = EmbedderConfig::stub(0).validate().unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidConfig { .. }));
}

#[test]
fn test_missing_model_path_rejected() {
    let err = EmbedderConfig::default().validate().unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidConfig { .. }));
}

#[test]
fn test_nonexistent_model_dir_rejected() {
    let err = TextEmbedder::load(EmbedderConfig::new("/nonexistent/mxbai-large")).unwrap_err();
    assert!(matches!(err, EmbeddingError::ModelNotFound { .. }));
}

#[test]
fn test_model_dir_without_weights_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{}").unwrap();

    let err = TextEmbedder::load(EmbedderConfig::new(dir.path())).unwrap_err();
    match err {
        EmbeddingError::ModelLoadFailed { reason } => {
            assert!(reason.contains("model.safetensors"));
            assert!(reason.contains("tokenizer.json"));
            assert!(!reason.contains("config.json"));
        }
        other => panic!("expected ModelLoadFailed, got {other:?}"),
    }
}

#[test]
fn test_stub_dimension_and_mode() {
    let embedder = stub_embedder(128);
    assert_eq!(embedder.dimension(), 128);
    assert!(embedder.is_stub());

    let vector = embedder.embed("hello world").unwrap();
    assert_eq!(vector.len(), 128);
}

#[test]
fn test_stub_is_deterministic() {
    let embedder = stub_embedder(256);
    let a = embedder.embed("Chocolate cake").unwrap();
    let b = embedder.embed("Chocolate cake").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_stub_is_normalized() {
    let embedder = stub_embedder(256);
    for text in ["Chocolate cake", "???", "a b c d e f"] {
        let v = embedder.embed(text).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm for {text:?} was {norm}");
    }
}

#[test]
fn test_stub_word_overlap_is_closer() {
    let embedder = stub_embedder(1024);
    let query = embedder.embed("chocolate dessert").unwrap();
    let cake = embedder.embed("Chocolate cake").unwrap();
    let soup = embedder.embed("Tomato soup").unwrap();

    assert!(cosine_similarity(&query, &cake) > cosine_similarity(&query, &soup));
}

#[test]
fn test_batch_matches_single() {
    let embedder = stub_embedder(64);
    let batch = embedder.embed_batch(&["one", "two"]).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0], embedder.embed("one").unwrap());
    assert_eq!(batch[1], embedder.embed("two").unwrap());
}

#[test]
fn test_empty_batch() {
    let embedder = stub_embedder(64);
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
}

#[test]
fn test_normalize_zero_vector() {
    assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
}
