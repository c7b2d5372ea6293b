//! OData sample service: a `Customers` entity set served through the
//! formatter registry.

pub mod customers;
pub mod request_id;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Extension, Json, Router,
};
use odata_core::{FormatterRegistry, ModelRef, RegistryBuilder};
use odata_http::ODataService;
use runtime::AppConfig;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::customers::CustomerStore;

const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the formatter registry with the default provider set.
pub fn build_registry() -> anyhow::Result<FormatterRegistry> {
    RegistryBuilder::default()
        .build()
        .context("Failed to build formatter registry")
}

pub fn build_service(config: &AppConfig) -> anyhow::Result<ODataService> {
    let registry = Arc::new(build_registry()?);
    Ok(
        ODataService::new(registry, ModelRef::new(config.odata.namespace.clone()))
            .with_service_root(config.odata.route_prefix.clone())
            .with_preferred_metadata(config.odata.default_metadata.into()),
    )
}

fn odata_routes() -> Router {
    Router::new()
        .route(
            "/Customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/Customers/{id}", get(customers::get_customer))
        .route(
            "/Customers/Default.ResetRatings",
            post(customers::reset_ratings),
        )
        .route("/$metadata", get(customers::metadata))
        .route("/formatters", get(customers::formatters))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Full application router for `config`.
pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let service = Arc::new(build_service(config)?);
    let store = Arc::new(CustomerStore::seeded());
    tracing::debug!(
        prefix = %config.odata.route_prefix,
        namespace = %config.odata.namespace,
        formatters = service.registry().len(),
        "building router"
    );

    let prefix = config.odata.route_prefix.as_str();
    let mut router = Router::new().route("/health", get(health_check));
    router = if prefix.is_empty() {
        router.merge(odata_routes())
    } else {
        router.nest(prefix, odata_routes())
    };

    router = router.layer(Extension(service)).layer(Extension(store));

    // Applied innermost first; a request passes
    // SetRequestId -> PropagateRequestId -> stamp -> Trace -> Timeout -> BodyLimit
    router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT));
    if config.server.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            config.server.timeout_sec,
        )));
    }
    router = router.layer(request_id::create_trace_layer());
    router = router.layer(from_fn(request_id::stamp_request_id));

    let x_request_id = request_id::header();
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
    router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

    Ok(router)
}
