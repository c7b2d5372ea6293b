use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::formatter::{FormatterKind, ODataFormatter};
use crate::ordered_set::OrderedSet;
use crate::provider::{
    DefaultDeserializerProvider, DefaultSerializerProvider, DeserializerProvider,
    SerializerProvider,
};

/// One formatter plus the media types and encodings it advertises.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormatterDescriptor {
    id: &'static str,
    #[serde(skip)]
    kind: FormatterKind,
    media_types: Vec<String>,
    encodings: Vec<TextEncoding>,
}

impl FormatterDescriptor {
    /// Media types must be non-empty and distinct; order is preserved as given.
    pub fn new(
        kind: FormatterKind,
        media_types: Vec<String>,
        encodings: Vec<TextEncoding>,
    ) -> Result<Self> {
        if media_types.is_empty() {
            return Err(Error::Configuration(format!(
                "formatter '{}' declares no media types",
                kind
            )));
        }
        let mut seen = HashSet::with_capacity(media_types.len());
        for mt in &media_types {
            if !seen.insert(mt.as_str()) {
                return Err(Error::Configuration(format!(
                    "formatter '{}' declares media type '{}' twice",
                    kind, mt
                )));
            }
        }
        if encodings.is_empty() {
            return Err(Error::Configuration(format!(
                "formatter '{}' declares no encodings",
                kind
            )));
        }

        Ok(Self {
            id: kind.id(),
            kind,
            media_types,
            encodings,
        })
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn kind(&self) -> FormatterKind {
        self.kind
    }

    pub fn formatter(&self) -> &dyn ODataFormatter {
        &self.kind
    }

    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    pub fn encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    /// Exact match against a canonical media-type token.
    pub fn supports_media_type(&self, canonical: &str) -> bool {
        self.media_types.iter().any(|mt| mt == canonical)
    }

    pub fn supports_encoding(&self, encoding: TextEncoding) -> bool {
        self.encodings.contains(&encoding)
    }
}

/// Ordered, immutable list of formatter descriptors.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormatterRegistry {
    descriptors: Vec<FormatterDescriptor>,
}

impl FormatterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn descriptors(&self) -> &[FormatterDescriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FormatterDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FormatterDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// All media types, flattened in registration order without duplicates.
    pub fn media_types(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .flat_map(|d| d.media_types.iter().cloned())
            .collect::<OrderedSet<_>>()
            .into_vec()
    }

    /// All encodings, flattened in registration order without duplicates.
    pub fn encodings(&self) -> Vec<TextEncoding> {
        self.descriptors
            .iter()
            .flat_map(|d| d.encodings.iter().copied())
            .collect::<OrderedSet<_>>()
            .into_vec()
    }

    pub fn encoding_names(&self) -> Vec<&'static str> {
        self.encodings().iter().map(|e| e.display_name()).collect()
    }
}

impl<'a> IntoIterator for &'a FormatterRegistry {
    type Item = &'a FormatterDescriptor;
    type IntoIter = std::slice::Iter<'a, FormatterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Builds the canonical [`FormatterRegistry`].
///
/// The formatter set and its order are fixed; the builder only resolves the
/// (de)serializer providers each formatter depends on.
pub struct RegistryBuilder {
    serializers: Option<Arc<dyn SerializerProvider>>,
    deserializers: Option<Arc<dyn DeserializerProvider>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            serializers: Some(Arc::new(DefaultSerializerProvider)),
            deserializers: Some(Arc::new(DefaultDeserializerProvider)),
        }
    }
}

impl RegistryBuilder {
    /// A builder with no providers installed.
    pub fn empty() -> Self {
        Self {
            serializers: None,
            deserializers: None,
        }
    }

    pub fn with_serializers(mut self, provider: Arc<dyn SerializerProvider>) -> Self {
        self.serializers = Some(provider);
        self
    }

    pub fn with_deserializers(mut self, provider: Arc<dyn DeserializerProvider>) -> Self {
        self.deserializers = Some(provider);
        self
    }

    pub fn build(&self) -> Result<FormatterRegistry> {
        let serializers = self
            .serializers
            .as_ref()
            .ok_or_else(|| Error::Configuration("no serializer provider installed".into()))?;
        let deserializers = self
            .deserializers
            .as_ref()
            .ok_or_else(|| Error::Configuration("no deserializer provider installed".into()))?;

        let mut descriptors = Vec::with_capacity(FormatterKind::ALL.len());
        for kind in FormatterKind::ALL {
            if let Some(missing) = kind
                .readable_payloads()
                .iter()
                .find(|p| !deserializers.supports(**p))
            {
                return Err(Error::Configuration(format!(
                    "formatter '{}' needs a deserializer for {:?}",
                    kind, missing
                )));
            }
            if let Some(missing) = kind
                .writable_payloads()
                .iter()
                .find(|p| !serializers.supports(**p))
            {
                return Err(Error::Configuration(format!(
                    "formatter '{}' needs a serializer for {:?}",
                    kind, missing
                )));
            }

            let media_types = kind
                .supported_media_types()
                .iter()
                .map(|mt| mt.to_canonical())
                .collect();
            descriptors.push(FormatterDescriptor::new(
                kind,
                media_types,
                TextEncoding::SUPPORTED.to_vec(),
            )?);
        }

        let registry = FormatterRegistry { descriptors };
        tracing::debug!(
            formatters = registry.len(),
            media_types = registry.media_types().len(),
            "formatter registry built"
        );
        Ok(registry)
    }
}
