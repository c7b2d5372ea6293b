use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use odata_core::{MediaType, MetadataLevel};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::problem::{catalog, ProblemResponse};
use crate::service::ODataService;

pub const ODATA_VERSION: HeaderName = HeaderName::from_static("odata-version");
pub const ODATA_VERSION_VALUE: &str = "4.0";

const CONTEXT_ANNOTATION: &str = "@odata.context";
const TYPE_ANNOTATION: &str = "@odata.type";

/// A payload rendered with a negotiated media type.
#[derive(Debug, Clone)]
pub struct ODataResponse {
    status: StatusCode,
    media_type: MediaType,
    body: Vec<u8>,
}

impl ODataResponse {
    /// Entity-set response: `{"@odata.context": ..., "value": [...]}`.
    pub fn collection<T: Serialize>(
        service: &ODataService,
        media_type: MediaType,
        entity_set: &str,
        type_name: &str,
        items: &[T],
    ) -> Result<Self, ProblemResponse> {
        let level = media_type
            .metadata()
            .unwrap_or_else(|| service.preferred_metadata());

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(annotate(to_value(item, entity_set)?, service, type_name, level));
        }

        let mut envelope = Map::new();
        if level != MetadataLevel::None {
            envelope.insert(
                CONTEXT_ANNOTATION.into(),
                Value::String(format!("{}/$metadata#{}", service.service_root(), entity_set)),
            );
        }
        envelope.insert("value".into(), Value::Array(values));

        Self::json(media_type, &Value::Object(envelope), entity_set)
    }

    /// Single-entity response; annotations are inlined into the object.
    pub fn entity<T: Serialize>(
        service: &ODataService,
        media_type: MediaType,
        entity_set: &str,
        type_name: &str,
        item: &T,
    ) -> Result<Self, ProblemResponse> {
        let level = media_type
            .metadata()
            .unwrap_or_else(|| service.preferred_metadata());

        let mut value = annotate(to_value(item, entity_set)?, service, type_name, level);
        if level != MetadataLevel::None {
            if let Value::Object(map) = &mut value {
                map.insert(
                    CONTEXT_ANNOTATION.into(),
                    Value::String(format!(
                        "{}/$metadata#{}/$entity",
                        service.service_root(),
                        entity_set
                    )),
                );
            }
        }

        Self::json(media_type, &value, entity_set)
    }

    /// XML metadata document.
    pub fn metadata(media_type: MediaType, schema: &Schema) -> Self {
        Self {
            status: StatusCode::OK,
            media_type,
            body: schema.to_csdl_xml().into_bytes(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    fn json(media_type: MediaType, value: &Value, instance: &str) -> Result<Self, ProblemResponse> {
        let body = serde_json::to_vec(value).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize response");
            catalog::INTERNAL.response("failed to serialize response", instance)
        })?;
        Ok(Self {
            status: StatusCode::OK,
            media_type,
            body,
        })
    }
}

impl IntoResponse for ODataResponse {
    fn into_response(self) -> Response {
        let content_type = format!("{};charset=utf-8", self.media_type.to_canonical());
        let mut resp = (self.status, self.body).into_response();
        let headers = resp.headers_mut();
        if let Ok(v) = HeaderValue::from_str(&content_type) {
            headers.insert(header::CONTENT_TYPE, v);
        }
        headers.insert(ODATA_VERSION, HeaderValue::from_static(ODATA_VERSION_VALUE));
        resp
    }
}

fn to_value<T: Serialize>(item: &T, instance: &str) -> Result<Value, ProblemResponse> {
    serde_json::to_value(item).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize entity");
        catalog::INTERNAL.response("failed to serialize entity", instance)
    })
}

/// Full metadata tags every object with its qualified type.
fn annotate(value: Value, service: &ODataService, type_name: &str, level: MetadataLevel) -> Value {
    match (level, value) {
        (MetadataLevel::Full, Value::Object(mut map)) => {
            map.insert(
                TYPE_ANNOTATION.into(),
                Value::String(format!("#{}.{}", service.namespace(), type_name)),
            );
            Value::Object(map)
        }
        (_, other) => other,
    }
}

/// Minimal CSDL description served at `$metadata`.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub namespace: String,
    pub entity_types: Vec<EntityTypeDef>,
    pub entity_sets: Vec<EntitySetDef>,
}

#[derive(Clone, Debug)]
pub struct EntityTypeDef {
    pub name: String,
    pub key: String,
    /// `(name, Edm type, nullable)`
    pub properties: Vec<(String, String, bool)>,
}

#[derive(Clone, Debug)]
pub struct EntitySetDef {
    pub name: String,
    pub entity_type: String,
}

impl Schema {
    pub fn to_csdl_xml(&self) -> String {
        let ns = xml_escape(&self.namespace);
        let mut out = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        out.push_str(
            r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">"#,
        );
        out.push_str("<edmx:DataServices>");
        out.push_str(&format!(
            r#"<Schema Namespace="{}" xmlns="http://docs.oasis-open.org/odata/ns/edm">"#,
            ns
        ));

        for ty in &self.entity_types {
            out.push_str(&format!(r#"<EntityType Name="{}">"#, xml_escape(&ty.name)));
            out.push_str(&format!(
                r#"<Key><PropertyRef Name="{}"/></Key>"#,
                xml_escape(&ty.key)
            ));
            for (name, edm_type, nullable) in &ty.properties {
                out.push_str(&format!(
                    r#"<Property Name="{}" Type="{}" Nullable="{}"/>"#,
                    xml_escape(name),
                    xml_escape(edm_type),
                    nullable
                ));
            }
            out.push_str("</EntityType>");
        }

        out.push_str(r#"<EntityContainer Name="Container">"#);
        for set in &self.entity_sets {
            out.push_str(&format!(
                r#"<EntitySet Name="{}" EntityType="{}.{}"/>"#,
                xml_escape(&set.name),
                ns,
                xml_escape(&set.entity_type)
            ));
        }
        out.push_str("</EntityContainer></Schema></edmx:DataServices></edmx:Edmx>");
        out
    }
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
