//! HTTP gateway (Axum) over the collection, ingest, query and rerank pipelines.
//!
//! This module is primarily used by the `ragdock` server binary.

#![allow(missing_docs)]

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub use error::{ErrorResponse, GatewayError};
pub use state::HandlerState;

use handler::{
    add_documents_handler, create_collection_handler, delete_collection_handler,
    delete_documents_handler, empty_collection_handler, get_collection_handler,
    get_documents_handler, list_collections_handler, metadata_values_handler, query_handler,
    rerank_handler, update_metadata_handler,
};
use payload::{HealthResponse, ServiceInfo, UnhealthyResponse};

use crate::vectordb::VectorStore;

pub const SERVICE_NAME: &str = "ragdock";
pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_UNHEALTHY: &str = "unhealthy";

pub fn create_router_with_state<S>(state: HandlerState<S>) -> Router
where
    S: VectorStore + Clone + 'static,
{
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler::<S>))
        .route(
            "/collections",
            get(list_collections_handler::<S>).post(create_collection_handler::<S>),
        )
        .route(
            "/collections/{name}",
            get(get_collection_handler::<S>).delete(delete_collection_handler::<S>),
        )
        .route(
            "/collections/{name}/metadata",
            put(update_metadata_handler::<S>),
        )
        .route(
            "/collections/{name}/documents",
            get(get_documents_handler::<S>)
                .post(add_documents_handler::<S>)
                .delete(delete_documents_handler::<S>),
        )
        .route(
            "/collections/{name}/documents/all",
            delete(empty_collection_handler::<S>),
        )
        .route(
            "/collections/{name}/metadata-values",
            get(metadata_values_handler::<S>),
        )
        .route("/query", post(query_handler::<S>))
        .route("/rerank", post(rerank_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tracing::instrument]
pub async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// Healthy when the storage engine answers; lists the loaded models.
#[tracing::instrument(skip(state))]
pub async fn health_handler<S>(State(state): State<HandlerState<S>>) -> Response
where
    S: VectorStore + Clone + 'static,
{
    let collections = match state.ctx.store.health_check().await {
        Ok(()) => state.ctx.store.list_collections().await,
        Err(e) => Err(e),
    };

    match collections {
        Ok(names) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: STATUS_HEALTHY,
                collections_count: names.len(),
                embedding_models: state.ctx.models.model_ids(),
                cross_encoder: state.ctx.models.reranker_id().map(str::to_string),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    status: STATUS_UNHEALTHY,
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
