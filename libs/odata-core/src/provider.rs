use crate::formatter::PayloadKind;

/// Resolves deserializers for incoming payloads.
pub trait DeserializerProvider: Send + Sync {
    fn supports(&self, kind: PayloadKind) -> bool;
}

/// Resolves serializers for outgoing payloads.
pub trait SerializerProvider: Send + Sync {
    fn supports(&self, kind: PayloadKind) -> bool;
}

/// Built-in deserializers: everything except documents the service only emits.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDeserializerProvider;

impl DeserializerProvider for DefaultDeserializerProvider {
    fn supports(&self, kind: PayloadKind) -> bool {
        !matches!(
            kind,
            PayloadKind::MetadataDocument | PayloadKind::ServiceDocument
        )
    }
}

/// Built-in serializers: everything except the inbound-only parameter bag.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSerializerProvider;

impl SerializerProvider for DefaultSerializerProvider {
    fn supports(&self, kind: PayloadKind) -> bool {
        kind != PayloadKind::Parameter
    }
}
