//! axum integration for the OData formatter registry: negotiation from
//! `Accept`/`$format`, body reading through the selected formatter, response
//! writing and RFC 9457 problems.

pub mod extract;
pub mod negotiate;
pub mod problem;
pub mod response;
pub mod service;

pub use extract::{ActionParameters, ODataBody, ODataPayload};
pub use negotiate::{negotiate, parse_accept, AcceptRange, FormatPreference};
pub use problem::{catalog, ErrDef, Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use response::{EntitySetDef, EntityTypeDef, ODataResponse, Schema, ODATA_VERSION};
pub use service::{decode_text, ODataService, ReadFormat};
