use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::collections;
use crate::constants::DEFAULT_QUERY_TOP_K;
use crate::error::ServiceError;
use crate::filter::MetadataFilter;
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    AddDocumentsRequest, CollectionChanged, CollectionEmptied, CollectionsResponse,
    CreateCollectionRequest, DeleteDocumentsRequest, DocumentsAdded, DocumentsDeleted,
    DocumentsParams, DocumentsResponse, MergeParams, MetadataValuesParams,
    MetadataValuesResponse, QueryBody, QueryResults, RerankBody, RerankResponse,
    UpdateMetadataRequest,
};
use crate::gateway::state::HandlerState;
use crate::ingest;
use crate::introspect;
use crate::query::{self, QueryRequest};
use crate::rerank;
use crate::vectordb::VectorStore;

type HandlerResult<T> = Result<T, GatewayError>;

/// Parses the optional `where` clause. `null` means no filter.
fn parse_filter(clause: Option<&Value>) -> Result<Option<MetadataFilter>, ServiceError> {
    match clause {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(MetadataFilter::parse(value)?)),
    }
}

/// The `where` query parameter arrives as JSON text.
fn parse_filter_param(clause: Option<&str>) -> Result<Option<MetadataFilter>, ServiceError> {
    match clause.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Ok(Some(MetadataFilter::parse_str(text)?)),
    }
}

#[instrument(skip(state))]
pub async fn list_collections_handler<S>(
    State(state): State<HandlerState<S>>,
) -> HandlerResult<Json<CollectionsResponse>>
where
    S: VectorStore + Clone + 'static,
{
    let collections = collections::list(&state.ctx).await?;
    Ok(Json(CollectionsResponse { collections }))
}

#[instrument(skip(state))]
pub async fn get_collection_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
) -> HandlerResult<Json<collections::CollectionInfo>>
where
    S: VectorStore + Clone + 'static,
{
    Ok(Json(collections::get(&state.ctx, &name).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_collection_handler<S>(
    State(state): State<HandlerState<S>>,
    payload: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> HandlerResult<Json<CollectionChanged>>
where
    S: VectorStore + Clone + 'static,
{
    let Json(request) = payload?;
    let name = request.name.unwrap_or_default();

    let metadata = collections::create(
        &state.ctx,
        &name,
        request.embedding_model.as_deref(),
        request.metadata.unwrap_or_default(),
    )
    .await?;

    Ok(Json(CollectionChanged {
        status: "created",
        name,
        metadata: Some(metadata),
    }))
}

#[instrument(skip(state, params, payload))]
pub async fn update_metadata_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
    params: Result<Query<MergeParams>, QueryRejection>,
    payload: Result<Json<UpdateMetadataRequest>, JsonRejection>,
) -> HandlerResult<Json<CollectionChanged>>
where
    S: VectorStore + Clone + 'static,
{
    let Query(params) = params?;
    let Json(request) = payload?;

    let metadata =
        collections::update_metadata(&state.ctx, &name, request.metadata, params.merge).await?;

    Ok(Json(CollectionChanged {
        status: "updated",
        name,
        metadata: Some(metadata),
    }))
}

#[instrument(skip(state))]
pub async fn delete_collection_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
) -> HandlerResult<Json<CollectionChanged>>
where
    S: VectorStore + Clone + 'static,
{
    collections::delete(&state.ctx, &name).await?;
    Ok(Json(CollectionChanged {
        status: "deleted",
        name,
        metadata: None,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_documents_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
    payload: Result<Json<AddDocumentsRequest>, JsonRejection>,
) -> HandlerResult<Json<DocumentsAdded>>
where
    S: VectorStore + Clone + 'static,
{
    let Json(request) = payload?;
    let added = ingest::add_documents(&state.ctx, &name, request.documents).await?;

    Ok(Json(DocumentsAdded {
        status: "added",
        collection: name,
        count: added.count,
        ids: added.ids,
    }))
}

#[instrument(skip(state, payload))]
pub async fn delete_documents_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
    payload: Result<Json<DeleteDocumentsRequest>, JsonRejection>,
) -> HandlerResult<Json<DocumentsDeleted>>
where
    S: VectorStore + Clone + 'static,
{
    let Json(request) = payload?;
    let count = ingest::delete_documents(&state.ctx, &name, request.ids).await?;

    Ok(Json(DocumentsDeleted {
        status: "deleted",
        collection: name,
        count,
    }))
}

#[instrument(skip(state))]
pub async fn empty_collection_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
) -> HandlerResult<Json<CollectionEmptied>>
where
    S: VectorStore + Clone + 'static,
{
    let count_deleted = ingest::empty(&state.ctx, &name).await?;
    Ok(Json(CollectionEmptied {
        status: "emptied",
        collection: name,
        count_deleted,
    }))
}

#[instrument(skip(state, params))]
pub async fn get_documents_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
    params: Result<Query<DocumentsParams>, QueryRejection>,
) -> HandlerResult<Json<DocumentsResponse>>
where
    S: VectorStore + Clone + 'static,
{
    let Query(params) = params?;
    let filter = parse_filter_param(params.where_clause.as_deref())?;

    let page = introspect::get_documents(
        &state.ctx,
        &name,
        filter.as_ref(),
        params.limit,
        params.offset,
    )
    .await?;

    Ok(Json(DocumentsResponse {
        documents: page.documents,
        count: page.count,
        total: page.total,
    }))
}

#[instrument(skip(state, params))]
pub async fn metadata_values_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(name): Path<String>,
    params: Result<Query<MetadataValuesParams>, QueryRejection>,
) -> HandlerResult<Json<MetadataValuesResponse>>
where
    S: VectorStore + Clone + 'static,
{
    let Query(params) = params?;
    let field = params.field.unwrap_or_default();

    let values = introspect::get_metadata_values(&state.ctx, &name, &field).await?;

    Ok(Json(MetadataValuesResponse {
        field,
        count: values.len(),
        values,
    }))
}

#[instrument(skip(state, payload))]
pub async fn query_handler<S>(
    State(state): State<HandlerState<S>>,
    payload: Result<Json<QueryBody>, JsonRejection>,
) -> HandlerResult<Json<QueryResults>>
where
    S: VectorStore + Clone + 'static,
{
    let Json(body) = payload?;
    let filter = parse_filter(body.where_clause.as_ref())?;

    let request = QueryRequest {
        collection: body.collection,
        query: body.query,
        top_k: body.top_k.unwrap_or(DEFAULT_QUERY_TOP_K),
        filter,
    };
    debug!(collection = ?request.collection, top_k = request.top_k, "Query received");

    let response = query::query(&state.ctx, request).await?;
    Ok(Json(QueryResults {
        results: response.results,
        collection_metadata: response.collection_metadata,
    }))
}

#[instrument(skip(state, payload))]
pub async fn rerank_handler<S>(
    State(state): State<HandlerState<S>>,
    payload: Result<Json<RerankBody>, JsonRejection>,
) -> HandlerResult<Json<RerankResponse>>
where
    S: VectorStore + Clone + 'static,
{
    let Json(body) = payload?;
    let reranked = rerank::rerank(&state.ctx, &body.query, body.documents, body.top_k).await?;
    Ok(Json(RerankResponse { reranked }))
}
