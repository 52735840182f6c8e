//! Stable numeric ids for engine records.
//!
//! Qdrant only accepts unsigned integers or UUIDs as point ids, while document ids and
//! collection names are arbitrary client strings. Both are mapped through BLAKE3.

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// With 64 bits the birthday bound sits around 4 billion items, far beyond a single
/// collection. The original string id is always stored next to the point and returned
/// to clients, so the hash is never exposed.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Point id for a document id inside its collection.
#[inline]
pub fn document_point_id(doc_id: &str) -> u64 {
    hash_to_u64(doc_id.as_bytes())
}

/// Point id for a collection's entry in the catalog namespace.
#[inline]
pub fn catalog_point_id(collection: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"collection|");
    hasher.update(collection.as_bytes());

    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}
