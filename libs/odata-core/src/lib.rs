//! Content-negotiation core for OData payloads.
//!
//! The [`FormatterRegistry`] holds the ordered formatter descriptors; the
//! [`FormatterSelector`] picks the ones that apply to a request. Nothing here
//! performs I/O or (de)serialization.

pub mod encoding;
pub mod error;
pub mod formatter;
pub mod media_type;
pub mod ordered_set;
pub mod provider;
pub mod registry;
pub mod selector;

pub use encoding::{ByteOrder, TextEncoding};
pub use error::{Error, Result};
pub use formatter::{
    FormatterKind, ModelRef, ODataFormatter, ODataPath, PayloadKind, RequestContext, TargetType,
};
pub use media_type::{MediaType, MetadataLevel, APPLICATION_JSON, APPLICATION_XML};
pub use ordered_set::OrderedSet;
pub use provider::{
    DefaultDeserializerProvider, DefaultSerializerProvider, DeserializerProvider,
    SerializerProvider,
};
pub use registry::{FormatterDescriptor, FormatterRegistry, RegistryBuilder};
pub use selector::{negotiable_encodings, negotiable_media_types, FormatterSelector};

#[cfg(test)]
mod tests;
