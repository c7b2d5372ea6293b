use axum::http::{header::CONTENT_LENGTH, HeaderName, Request};
use axum::response::IntoResponse;
use axum::{body::Body, middleware::Next, response::Response};
use odata_http::{Problem, ProblemResponse};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::field::Empty;

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

fn request_id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

/// Records the request id on the current span and stamps it into every
/// problem response produced further in.
pub async fn stamp_request_id(req: Request<Body>, next: Next) -> Response {
    let rid = request_id_of(&req).to_owned();
    tracing::Span::current().record("request_id", tracing::field::display(&rid));

    let resp = next.run(req).await;
    let Some(problem) = resp.extensions().get::<Problem>().cloned() else {
        return resp;
    };

    let (mut parts, _) = resp.into_parts();
    let mut stamped = ProblemResponse(problem.with_request_id(rid)).into_response();
    parts.headers.remove(CONTENT_LENGTH);
    for (name, value) in parts.headers.drain().filter_map(|(n, v)| n.map(|n| (n, v))) {
        stamped.headers_mut().entry(name).or_insert(value);
    }
    stamped
}

#[allow(clippy::type_complexity)]
pub fn create_trace_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    use tower_http::trace::TraceLayer;

    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "odata_request",
            method = %req.method(),
            path = %req.uri().path(),
            query = req.uri().query().unwrap_or(""),
            request_id = %request_id_of(req),
            status = Empty,
            latency_ms = Empty
        )
    })
}
