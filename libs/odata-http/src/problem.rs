use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// A URI reference that identifies the specific occurrence of the problem.
    pub instance: String,
    /// Machine-readable error code from [`catalog`].
    pub code: String,
    /// Media types the client may retry with (406/415 only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<Vec<String>>,
    /// Optional request id useful for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            supported: None,
            request_id: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_supported(mut self, media_types: Vec<String>) -> Self {
        self.supported = Some(media_types);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Axum response wrapper that renders `Problem` with correct status & content type.
///
/// The rendered response also carries the `Problem` in its extensions so
/// outer middleware can re-render it (for example with a request id).
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl ProblemResponse {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn code(&self) -> &str {
        &self.0.code
    }
}

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let problem = self.0.clone();
        let mut resp = axum::Json(self.0).into_response();
        *resp.status_mut() = status;
        resp.extensions_mut().insert(problem);
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

/// Static error definition from the catalog.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail.into(),
        )
        .with_code(self.code)
        .with_type(self.type_url)
    }

    #[inline]
    pub fn response(&self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        self.to_problem(detail).with_instance(instance).into()
    }
}

/// Error catalog for the OData HTTP surface.
pub mod catalog {
    use super::ErrDef;

    pub const UNSUPPORTED_MEDIA_TYPE: ErrDef = ErrDef {
        status: 415,
        title: "Unsupported Media Type",
        code: "UNSUPPORTED_MEDIA_TYPE",
        type_url: "https://errors.example.com/UNSUPPORTED_MEDIA_TYPE",
    };

    pub const NOT_ACCEPTABLE: ErrDef = ErrDef {
        status: 406,
        title: "Not Acceptable",
        code: "NOT_ACCEPTABLE",
        type_url: "https://errors.example.com/NOT_ACCEPTABLE",
    };

    pub const INVALID_FORMAT: ErrDef = ErrDef {
        status: 400,
        title: "Invalid $format",
        code: "INVALID_FORMAT",
        type_url: "https://errors.example.com/INVALID_FORMAT",
    };

    pub const INVALID_BODY: ErrDef = ErrDef {
        status: 400,
        title: "Invalid Body",
        code: "INVALID_BODY",
        type_url: "https://errors.example.com/INVALID_BODY",
    };

    pub const PAYLOAD_TOO_LARGE: ErrDef = ErrDef {
        status: 413,
        title: "Payload Too Large",
        code: "PAYLOAD_TOO_LARGE",
        type_url: "https://errors.example.com/PAYLOAD_TOO_LARGE",
    };

    pub const NOT_FOUND: ErrDef = ErrDef {
        status: 404,
        title: "Not Found",
        code: "NOT_FOUND",
        type_url: "https://errors.example.com/NOT_FOUND",
    };

    pub const INTERNAL: ErrDef = ErrDef {
        status: 500,
        title: "Internal Server Error",
        code: "INTERNAL",
        type_url: "https://errors.example.com/INTERNAL",
    };
}
