use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeleteCollectionBuilder, DeletePointsBuilder,
    Distance, Filter, GetPointsBuilder, PointId, PointStruct, PointsIdsList, RetrievedPoint,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::error::VectorDbError;
use super::model::{
    DocumentRecord, PAYLOAD_METADATA, ScanCursor, ScanPage, SearchHit, StoredDocument,
    object_to_qdrant, qdrant_to_json,
};
use super::store::VectorStore;
use crate::filter::MetadataFilter;
use crate::hashing::{catalog_point_id, document_point_id};

/// Qdrant collection holding one point per user collection (name, dimension, metadata).
pub const CATALOG_COLLECTION: &str = "_ragdock_catalog";

const CATALOG_NAME_KEY: &str = "name";
const CATALOG_DIMENSION_KEY: &str = "dimension";
const SCROLL_PAGE_SIZE: u32 = 256;

#[derive(Clone)]
/// [`VectorStore`] backed by a Qdrant server.
///
/// Qdrant has no collection-level metadata, so it lives in [`CATALOG_COLLECTION`]. Document
/// ids are mapped to numeric point ids; the original id is kept in the payload.
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Connects to `url` and makes sure the catalog exists.
    pub async fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        let store = Self {
            client,
            url: url.to_string(),
        };
        store.ensure_catalog().await?;

        info!(url, "Connected to Qdrant");
        Ok(store)
    }

    async fn ensure_catalog(&self) -> Result<(), VectorDbError> {
        if self.exists(CATALOG_COLLECTION).await? {
            return Ok(());
        }

        // Catalog points carry a constant 1-d vector; only their payload matters.
        self.client
            .create_collection(
                CreateCollectionBuilder::new(CATALOG_COLLECTION)
                    .vectors_config(VectorParamsBuilder::new(1, Distance::Dot)),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: CATALOG_COLLECTION.to_string(),
                message: e.to_string(),
            })?;

        info!(collection = CATALOG_COLLECTION, "Created catalog collection");
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, VectorDbError> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| VectorDbError::ReadFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })
    }

    async fn require(&self, name: &str) -> Result<(), VectorDbError> {
        if name == CATALOG_COLLECTION || !self.exists(name).await? {
            return Err(VectorDbError::CollectionNotFound {
                collection: name.to_string(),
            });
        }
        Ok(())
    }

    async fn write_catalog_entry(
        &self,
        name: &str,
        dimension: u64,
        metadata: &Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert(CATALOG_NAME_KEY.to_string(), name.to_string().into());
        payload.insert(CATALOG_DIMENSION_KEY.to_string(), (dimension as i64).into());
        payload.insert(PAYLOAD_METADATA.to_string(), object_to_qdrant(metadata));

        let point = PointStruct::new(catalog_point_id(name), vec![1.0f32], payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(CATALOG_COLLECTION, vec![point]).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: CATALOG_COLLECTION.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn read_catalog_entry(
        &self,
        name: &str,
    ) -> Result<(u64, Map<String, Value>), VectorDbError> {
        let corrupt = |message: &str| VectorDbError::CatalogCorrupt {
            collection: name.to_string(),
            message: message.to_string(),
        };

        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(
                    CATALOG_COLLECTION,
                    vec![PointId::from(catalog_point_id(name))],
                )
                .with_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::ReadFailed {
                collection: CATALOG_COLLECTION.to_string(),
                message: e.to_string(),
            })?;

        let mut point = response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| corrupt("no catalog entry"))?;

        let dimension = point
            .payload
            .get(CATALOG_DIMENSION_KEY)
            .and_then(|v| v.as_integer())
            .ok_or_else(|| corrupt("missing dimension"))?;

        let metadata = match point.payload.remove(PAYLOAD_METADATA).map(qdrant_to_json) {
            Some(Value::Object(map)) => map,
            _ => return Err(corrupt("metadata is not an object")),
        };

        Ok((dimension as u64, metadata))
    }

    async fn scroll_page(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u32,
        offset: Option<PointId>,
        with_payload: bool,
    ) -> Result<(Vec<RetrievedPoint>, Option<PointId>), VectorDbError> {
        let mut builder = ScrollPointsBuilder::new(name)
            .limit(limit)
            .with_payload(with_payload)
            .with_vectors(false);
        if let Some(filter) = filter {
            builder = builder.filter(qdrant_filter(filter));
        }
        if let Some(offset) = offset {
            builder = builder.offset(offset);
        }

        let response = self
            .client
            .scroll(builder)
            .await
            .map_err(|e| VectorDbError::ReadFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok((response.result, response.next_page_offset))
    }
}

fn qdrant_filter(filter: &MetadataFilter) -> Filter {
    filter.to_qdrant(&format!("{PAYLOAD_METADATA}."))
}

impl VectorStore for QdrantStore {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        if name == CATALOG_COLLECTION || self.exists(name).await? {
            return Err(VectorDbError::CollectionExists {
                collection: name.to_string(),
            });
        }

        let vectors_config = VectorParamsBuilder::new(dimension as u64, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        if let Err(e) = self.write_catalog_entry(name, dimension as u64, &metadata).await {
            // A namespace without a catalog entry would block the name for good.
            if let Err(cleanup) = self
                .client
                .delete_collection(DeleteCollectionBuilder::new(name))
                .await
            {
                warn!(collection = name, error = %cleanup, "Failed to roll back collection");
            }
            return Err(e);
        }

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorDbError> {
        if name == CATALOG_COLLECTION {
            return Ok(false);
        }
        self.exists(name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        let response =
            self.client
                .list_collections()
                .await
                .map_err(|e| VectorDbError::ReadFailed {
                    collection: "*".to_string(),
                    message: e.to_string(),
                })?;

        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .filter(|name| name != CATALOG_COLLECTION)
            .collect())
    }

    async fn collection_metadata(&self, name: &str) -> Result<Map<String, Value>, VectorDbError> {
        self.require(name).await?;
        let (_, metadata) = self.read_catalog_entry(name).await?;
        Ok(metadata)
    }

    async fn set_collection_metadata(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), VectorDbError> {
        self.require(name).await?;
        let (dimension, _) = self.read_catalog_entry(name).await?;
        self.write_catalog_entry(name, dimension, &metadata).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), VectorDbError> {
        self.require(name).await?;

        self.client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        let catalog_ids = PointsIdsList {
            ids: vec![catalog_point_id(name).into()],
        };
        self.client
            .delete_points(
                DeletePointsBuilder::new(CATALOG_COLLECTION)
                    .points(catalog_ids)
                    .wait(true),
            )
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: CATALOG_COLLECTION.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn count(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<u64, VectorDbError> {
        self.require(name).await?;

        let mut builder = CountPointsBuilder::new(name).exact(true);
        if let Some(filter) = filter {
            builder = builder.filter(qdrant_filter(filter));
        }

        let response = self
            .client
            .count(builder)
            .await
            .map_err(|e| VectorDbError::ReadFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn upsert(
        &self,
        name: &str,
        documents: Vec<StoredDocument>,
    ) -> Result<(), VectorDbError> {
        self.require(name).await?;
        if documents.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = documents
            .into_iter()
            .map(|doc| {
                let payload = doc.payload();
                PointStruct::new(document_point_id(&doc.id), doc.vector, payload)
            })
            .collect();

        debug!(collection = name, points = points.len(), "Upserting points");

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn delete_documents(&self, name: &str, ids: &[String]) -> Result<(), VectorDbError> {
        self.require(name).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let points_selector = PointsIdsList {
            ids: ids.iter().map(|id| document_point_id(id).into()).collect(),
        };

        self.client
            .delete_points(
                DeletePointsBuilder::new(name)
                    .points(points_selector)
                    .wait(true),
            )
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn clear(&self, name: &str) -> Result<u64, VectorDbError> {
        self.require(name).await?;

        let mut deleted = 0u64;
        loop {
            // Always read from the start: the previous page is gone.
            let (points, _) = self
                .scroll_page(name, None, SCROLL_PAGE_SIZE, None, false)
                .await?;
            if points.is_empty() {
                break;
            }

            let ids: Vec<PointId> = points.into_iter().filter_map(|p| p.id).collect();
            deleted += ids.len() as u64;

            self.client
                .delete_points(
                    DeletePointsBuilder::new(name)
                        .points(PointsIdsList { ids })
                        .wait(true),
                )
                .await
                .map_err(|e| VectorDbError::DeleteFailed {
                    collection: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(deleted)
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        self.require(name).await?;

        let mut search_builder = SearchPointsBuilder::new(name, vector, limit).with_payload(true);
        if let Some(filter) = filter {
            search_builder = search_builder.filter(qdrant_filter(filter));
        }

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        let hits = search_result
            .result
            .into_iter()
            .filter_map(|point| {
                let score = point.score;
                DocumentRecord::from_payload(point.payload).map(|doc| SearchHit {
                    id: doc.id,
                    text: doc.text,
                    metadata: doc.metadata,
                    distance: 1.0 - score,
                })
            })
            .collect();

        Ok(hits)
    }

    async fn fetch(
        &self,
        name: &str,
        filter: Option<&MetadataFilter>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<DocumentRecord>, VectorDbError> {
        self.require(name).await?;

        let mut documents = Vec::new();
        let mut skipped = 0u64;
        let mut cursor: Option<PointId> = None;

        while (documents.len() as u64) < limit {
            let (points, next) = self
                .scroll_page(name, filter, SCROLL_PAGE_SIZE, cursor, true)
                .await?;

            for point in points {
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                if (documents.len() as u64) >= limit {
                    break;
                }
                if let Some(doc) = DocumentRecord::from_payload(point.payload) {
                    documents.push(doc);
                }
            }

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn scan(
        &self,
        name: &str,
        cursor: Option<ScanCursor>,
        limit: u64,
    ) -> Result<ScanPage, VectorDbError> {
        self.require(name).await?;

        let offset = match cursor {
            None => None,
            Some(ScanCursor::Point(id)) => Some(id),
            Some(ScanCursor::After(_)) => {
                return Err(VectorDbError::ReadFailed {
                    collection: name.to_string(),
                    message: "cursor does not belong to this engine".to_string(),
                });
            }
        };

        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let (points, next) = self.scroll_page(name, None, limit, offset, true).await?;
        let documents = points
            .into_iter()
            .filter_map(|point| DocumentRecord::from_payload(point.payload))
            .collect();

        Ok(ScanPage {
            documents,
            next: next.map(ScanCursor::Point),
        })
    }

    async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
