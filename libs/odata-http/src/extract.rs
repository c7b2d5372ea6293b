use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, OriginalUri, Query, Request};
use axum::http::{header, request::Parts, StatusCode};
use odata_core::TargetType;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::negotiate::FormatPreference;
use crate::problem::{catalog, ProblemResponse};
use crate::service::{decode_text, ODataService};

#[derive(Deserialize, Default)]
struct FormatParams {
    #[serde(rename = "$format")]
    format: Option<String>,
}

/// `$format` query option plus the `Accept` header. Never rejects.
impl<S> FromRequestParts<S> for FormatPreference
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let Query(params) = Query::<FormatParams>::from_request_parts(parts, state)
                .await
                .unwrap_or_else(|_| Query(FormatParams::default()));
            let accept = parts
                .headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            Ok(FormatPreference {
                format: params.format,
                accept,
            })
        }
    }
}

/// A body type with a fixed OData payload shape.
pub trait ODataPayload: DeserializeOwned {
    fn target_type() -> TargetType;
}

/// The untyped action-parameter bag.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ActionParameters(pub serde_json::Map<String, serde_json::Value>);

impl ActionParameters {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }
}

impl ODataPayload for ActionParameters {
    fn target_type() -> TargetType {
        TargetType::ActionParameters
    }
}

/// Request body read through the formatter the registry selects for `T`.
///
/// Rejects with 415 when no formatter can read the declared `Content-Type`,
/// 413 when the body exceeds the configured limit, 400 when it does not
/// decode. Problems name the full request path, nest prefix included.
#[derive(Debug, Clone)]
pub struct ODataBody<T>(pub T);

impl<S, T> FromRequest<S> for ODataBody<T>
where
    S: Send + Sync,
    T: ODataPayload + Send,
{
    type Rejection = ProblemResponse;

    #[allow(clippy::manual_async_fn)]
    fn from_request(
        req: Request,
        state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let instance = req
                .extensions()
                .get::<OriginalUri>()
                .map(|uri| uri.0.path().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());
            let service = req
                .extensions()
                .get::<Arc<ODataService>>()
                .cloned()
                .ok_or_else(|| catalog::INTERNAL.response("OData service is not installed", &instance))?;
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let format =
                service.select_read(&T::target_type(), &instance, content_type.as_deref())?;

            let bytes = Bytes::from_request(req, state).await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    catalog::PAYLOAD_TOO_LARGE.response(e.body_text(), &instance)
                } else {
                    catalog::INVALID_BODY.response(e.body_text(), &instance)
                }
            })?;
            let text = decode_text(&bytes, format.encoding, format.byte_order)
                .map_err(|e| catalog::INVALID_BODY.response(e, &instance))?;
            let value = serde_json::from_str::<T>(&text).map_err(|e| {
                catalog::INVALID_BODY.response(format!("malformed payload: {}", e), &instance)
            })?;

            tracing::debug!(formatter = format.formatter, media_type = %format.media_type, "read request body");
            Ok(ODataBody(value))
        }
    }
}
