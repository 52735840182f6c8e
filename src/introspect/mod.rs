//! Read-only document paging and metadata value enumeration.
//!
//! [`get_metadata_values`] scans the whole collection; it is meant for building filter UIs,
//! not for request hot paths.

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::{DEFAULT_DOCUMENTS_LIMIT, MAX_DOCUMENTS_LIMIT};
use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::filter::MetadataFilter;
use crate::vectordb::{DocumentRecord, VectorStore};

const SCAN_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentsPage {
    pub documents: Vec<DocumentRecord>,
    /// Documents in this page.
    pub count: usize,
    /// Documents matching the filter.
    pub total: u64,
}

/// Validates a client page size: default when absent, clamped to the max, never negative.
pub fn page_limit(limit: Option<i64>) -> ServiceResult<u64> {
    match limit {
        None => Ok(DEFAULT_DOCUMENTS_LIMIT),
        Some(l) if l < 0 => Err(ServiceError::invalid("'limit' must not be negative")),
        Some(l) => Ok((l as u64).min(MAX_DOCUMENTS_LIMIT)),
    }
}

pub fn page_offset(offset: Option<i64>) -> ServiceResult<u64> {
    match offset {
        None => Ok(0),
        Some(o) if o < 0 => Err(ServiceError::invalid("'offset' must not be negative")),
        Some(o) => Ok(o as u64),
    }
}

pub async fn get_documents<S: VectorStore>(
    ctx: &ServiceContext<S>,
    collection: &str,
    filter: Option<&MetadataFilter>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ServiceResult<DocumentsPage> {
    let limit = page_limit(limit)?;
    let offset = page_offset(offset)?;

    if !ctx.store.collection_exists(collection).await? {
        return Err(ServiceError::collection_not_found(collection));
    }

    let documents = ctx.store.fetch(collection, filter, limit, offset).await?;
    let total = ctx.store.count(collection, filter).await?;

    debug!(collection, limit, offset, returned = documents.len(), total, "Fetched documents");

    Ok(DocumentsPage {
        count: documents.len(),
        documents,
        total,
    })
}

/// Distinct values of `field` across the collection, sorted.
///
/// Strings are returned verbatim, other values as their JSON text. Documents where the
/// field is missing or `null` are skipped.
pub async fn get_metadata_values<S: VectorStore>(
    ctx: &ServiceContext<S>,
    collection: &str,
    field: &str,
) -> ServiceResult<Vec<String>> {
    if field.trim().is_empty() {
        return Err(ServiceError::invalid("'field' is required"));
    }
    if !ctx.store.collection_exists(collection).await? {
        return Err(ServiceError::collection_not_found(collection));
    }

    let mut values = BTreeSet::new();
    let mut cursor = None;
    loop {
        let page = ctx.store.scan(collection, cursor, SCAN_PAGE_SIZE).await?;

        for doc in page.documents {
            match doc.metadata.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => {
                    values.insert(s.clone());
                }
                Some(other) => {
                    values.insert(other.to_string());
                }
            }
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(collection, field, distinct = values.len(), "Collected metadata values");
    Ok(values.into_iter().collect())
}
