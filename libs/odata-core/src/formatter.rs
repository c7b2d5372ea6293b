use std::fmt;

use serde::Serialize;

use crate::media_type::{json_media_types, MediaType};

/// Opaque handle to the EDM model a request is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }

    pub fn namespace(&self) -> &str {
        &self.0
    }
}

/// Opaque OData resource path (for example `Customers(1)/Orders`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ODataPath(String);

impl ODataPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a request or response body carries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    Entity(String),
    Complex(String),
    Primitive(String),
    Collection(Box<TargetType>),
    EntityReference,
    /// Untyped bag of action parameters.
    ActionParameters,
    Metadata,
    ServiceDocument,
}

impl TargetType {
    pub fn entity(name: impl Into<String>) -> Self {
        TargetType::Entity(name.into())
    }

    pub fn collection_of(inner: TargetType) -> Self {
        TargetType::Collection(Box::new(inner))
    }

    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            TargetType::Entity(_) | TargetType::Complex(_) => PayloadKind::Resource,
            TargetType::Primitive(_) => PayloadKind::Property,
            TargetType::Collection(inner) => match inner.as_ref() {
                TargetType::Entity(_) | TargetType::Complex(_) => PayloadKind::ResourceSet,
                _ => PayloadKind::Collection,
            },
            TargetType::EntityReference => PayloadKind::EntityReferenceLink,
            TargetType::ActionParameters => PayloadKind::Parameter,
            TargetType::Metadata => PayloadKind::MetadataDocument,
            TargetType::ServiceDocument => PayloadKind::ServiceDocument,
        }
    }
}

/// Payload shapes a (de)serializer can handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PayloadKind {
    Resource,
    ResourceSet,
    Property,
    Collection,
    EntityReferenceLink,
    Parameter,
    MetadataDocument,
    ServiceDocument,
}

/// Per-request inputs to formatter selection. Never mutated by the selector.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub content_type: Option<MediaType>,
    pub model: Option<ModelRef>,
    pub path: Option<ODataPath>,
}

impl RequestContext {
    pub fn new(model: ModelRef) -> Self {
        Self {
            content_type: None,
            model: Some(model),
            path: None,
        }
    }

    pub fn with_content_type(mut self, content_type: MediaType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_path(mut self, path: ODataPath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn is_odata(&self) -> bool {
        self.model.is_some()
    }
}

/// Capability interface shared by every formatter variant.
pub trait ODataFormatter: Send + Sync {
    fn id(&self) -> &'static str;

    fn supported_media_types(&self) -> Vec<MediaType>;

    fn readable_payloads(&self) -> &'static [PayloadKind];

    fn writable_payloads(&self) -> &'static [PayloadKind];

    fn can_read_type(&self, target: &TargetType) -> bool {
        self.readable_payloads().contains(&target.payload_kind())
    }

    fn can_write_type(&self, target: &TargetType) -> bool {
        self.writable_payloads().contains(&target.payload_kind())
    }
}

/// The closed set of formatters the registry is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FormatterKind {
    /// JSON for typed data: entities, complex values, properties, collections.
    JsonResource,
    /// JSON for the untyped action-parameter bag.
    JsonParameters,
    /// XML for metadata documents.
    Xml,
}

impl FormatterKind {
    /// Registration order. JSON before XML.
    pub const ALL: [FormatterKind; 3] = [
        FormatterKind::JsonResource,
        FormatterKind::JsonParameters,
        FormatterKind::Xml,
    ];
}

impl ODataFormatter for FormatterKind {
    fn id(&self) -> &'static str {
        match self {
            FormatterKind::JsonResource => "odata.json.resource",
            FormatterKind::JsonParameters => "odata.json.parameters",
            FormatterKind::Xml => "odata.xml",
        }
    }

    fn supported_media_types(&self) -> Vec<MediaType> {
        match self {
            FormatterKind::JsonResource | FormatterKind::JsonParameters => json_media_types(),
            FormatterKind::Xml => vec![MediaType::xml()],
        }
    }

    fn readable_payloads(&self) -> &'static [PayloadKind] {
        match self {
            FormatterKind::JsonResource => &[
                PayloadKind::Resource,
                PayloadKind::ResourceSet,
                PayloadKind::Property,
                PayloadKind::Collection,
                PayloadKind::EntityReferenceLink,
            ],
            FormatterKind::JsonParameters => &[PayloadKind::Parameter],
            FormatterKind::Xml => &[],
        }
    }

    fn writable_payloads(&self) -> &'static [PayloadKind] {
        match self {
            FormatterKind::JsonResource => &[
                PayloadKind::Resource,
                PayloadKind::ResourceSet,
                PayloadKind::Property,
                PayloadKind::Collection,
                PayloadKind::EntityReferenceLink,
                PayloadKind::ServiceDocument,
            ],
            FormatterKind::JsonParameters => &[],
            FormatterKind::Xml => &[PayloadKind::MetadataDocument],
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
