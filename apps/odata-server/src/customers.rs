//! `Customers` entity set: the end-to-end controller returning a collection.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use odata_core::TargetType;
use odata_http::{
    catalog, ActionParameters, EntitySetDef, EntityTypeDef, FormatPreference, ODataBody,
    ODataPayload, ODataResponse, ODataService, ProblemResponse, Schema,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const ENTITY_SET: &str = "Customers";
pub const ENTITY_TYPE: &str = "Customer";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub rating: i32,
}

/// POST body for a new customer; the id is assigned by the store.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct NewCustomer {
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub rating: i32,
}

impl ODataPayload for NewCustomer {
    fn target_type() -> TargetType {
        TargetType::entity(ENTITY_TYPE)
    }
}

/// In-memory customer table.
#[derive(Debug, Default)]
pub struct CustomerStore {
    rows: RwLock<Vec<Customer>>,
}

impl CustomerStore {
    pub fn seeded() -> Self {
        let rows = [("Alfreds", "Berlin", 3), ("Bottom-Dollar", "London", 5), ("Chop-suey", "Bern", 4)]
            .into_iter()
            .enumerate()
            .map(|(i, (name, city, rating))| Customer {
                id: i as i32 + 1,
                name: name.to_string(),
                city: city.to_string(),
                rating,
            })
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn list(&self) -> Vec<Customer> {
        self.rows.read().clone()
    }

    pub fn get(&self, id: i32) -> Option<Customer> {
        self.rows.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn insert(&self, new: NewCustomer) -> Customer {
        let mut rows = self.rows.write();
        let id = rows.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let customer = Customer {
            id,
            name: new.name,
            city: new.city,
            rating: new.rating,
        };
        rows.push(customer.clone());
        customer
    }

    pub fn reset_ratings(&self, rating: i32) -> usize {
        let mut rows = self.rows.write();
        for c in rows.iter_mut() {
            c.rating = rating;
        }
        rows.len()
    }
}

pub fn schema(namespace: &str) -> Schema {
    Schema {
        namespace: namespace.to_string(),
        entity_types: vec![EntityTypeDef {
            name: ENTITY_TYPE.to_string(),
            key: "Id".to_string(),
            properties: vec![
                ("Id".into(), "Edm.Int32".into(), false),
                ("Name".into(), "Edm.String".into(), false),
                ("City".into(), "Edm.String".into(), false),
                ("Rating".into(), "Edm.Int32".into(), false),
            ],
        }],
        entity_sets: vec![EntitySetDef {
            name: ENTITY_SET.to_string(),
            entity_type: ENTITY_TYPE.to_string(),
        }],
    }
}

/// List all customers
pub async fn list_customers(
    Extension(service): Extension<Arc<ODataService>>,
    Extension(store): Extension<Arc<CustomerStore>>,
    OriginalUri(uri): OriginalUri,
    preference: FormatPreference,
) -> Result<ODataResponse, ProblemResponse> {
    let target = TargetType::collection_of(TargetType::entity(ENTITY_TYPE));
    let media_type = service.negotiate_write(&target, uri.path(), &preference)?;

    let customers = store.list();
    info!(count = customers.len(), %media_type, "listing customers");
    ODataResponse::collection(&service, media_type, ENTITY_SET, ENTITY_TYPE, &customers)
}

/// Get a customer by key
pub async fn get_customer(
    Extension(service): Extension<Arc<ODataService>>,
    Extension(store): Extension<Arc<CustomerStore>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<i32>,
    preference: FormatPreference,
) -> Result<ODataResponse, ProblemResponse> {
    let media_type =
        service.negotiate_write(&TargetType::entity(ENTITY_TYPE), uri.path(), &preference)?;

    let customer = store.get(id).ok_or_else(|| {
        catalog::NOT_FOUND.response(format!("customer {} does not exist", id), uri.path())
    })?;
    ODataResponse::entity(&service, media_type, ENTITY_SET, ENTITY_TYPE, &customer)
}

/// Create a customer; the body goes through formatter selection first.
pub async fn create_customer(
    Extension(service): Extension<Arc<ODataService>>,
    Extension(store): Extension<Arc<CustomerStore>>,
    OriginalUri(uri): OriginalUri,
    preference: FormatPreference,
    ODataBody(new): ODataBody<NewCustomer>,
) -> Result<ODataResponse, ProblemResponse> {
    let media_type =
        service.negotiate_write(&TargetType::entity(ENTITY_TYPE), uri.path(), &preference)?;

    let customer = store.insert(new);
    info!(id = customer.id, "created customer");
    Ok(
        ODataResponse::entity(&service, media_type, ENTITY_SET, ENTITY_TYPE, &customer)?
            .with_status(StatusCode::CREATED),
    )
}

/// Bound action taking the untyped parameter bag: `{"Rating": <int>}`.
pub async fn reset_ratings(
    Extension(store): Extension<Arc<CustomerStore>>,
    OriginalUri(uri): OriginalUri,
    ODataBody(params): ODataBody<ActionParameters>,
) -> Result<StatusCode, ProblemResponse> {
    let rating = match params.get("Rating") {
        None => 0,
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| catalog::INVALID_BODY.response("Rating must be an Int32", uri.path()))?,
    };

    let updated = store.reset_ratings(rating);
    info!(updated, rating, "reset customer ratings");
    Ok(StatusCode::NO_CONTENT)
}

/// `$metadata` document
pub async fn metadata(
    Extension(service): Extension<Arc<ODataService>>,
    OriginalUri(uri): OriginalUri,
    preference: FormatPreference,
) -> Result<ODataResponse, ProblemResponse> {
    let media_type = service.negotiate_write(&TargetType::Metadata, uri.path(), &preference)?;
    Ok(ODataResponse::metadata(media_type, &schema(service.namespace())))
}

#[derive(Serialize)]
struct FormatterInfo<'a> {
    id: &'a str,
    media_types: &'a [String],
    encodings: Vec<&'static str>,
}

/// Registered formatters in negotiation order.
pub async fn formatters(Extension(service): Extension<Arc<ODataService>>) -> Response {
    let registry = service.registry();
    let formatters: Vec<FormatterInfo<'_>> = registry
        .iter()
        .map(|d| FormatterInfo {
            id: d.id(),
            media_types: d.media_types(),
            encodings: d.encodings().iter().map(|e| e.display_name()).collect(),
        })
        .collect();

    Json(serde_json::json!({
        "formatters": formatters,
        "media_types": registry.media_types(),
        "encodings": registry.encoding_names(),
    }))
    .into_response()
}
