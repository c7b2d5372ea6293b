use std::sync::Arc;

use odata_core::{
    negotiable_encodings, ByteOrder, negotiable_media_types, FormatterRegistry, FormatterSelector, MediaType,
    MetadataLevel, ModelRef, ODataPath, RequestContext, TargetType, TextEncoding,
};

use crate::negotiate::{negotiate, FormatPreference};
use crate::problem::{catalog, ProblemResponse};

/// Request-scoped view of the formatter registry, installed as an axum
/// `Extension<Arc<ODataService>>`.
#[derive(Clone, Debug)]
pub struct ODataService {
    registry: Arc<FormatterRegistry>,
    selector: FormatterSelector,
    model: ModelRef,
    service_root: String,
    preferred_metadata: MetadataLevel,
}

/// Formatter chosen for an incoming body.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadFormat {
    pub formatter: &'static str,
    pub media_type: MediaType,
    pub encoding: TextEncoding,
    /// Applies to UTF-16 bodies without a BOM.
    pub byte_order: ByteOrder,
}

impl ODataService {
    pub fn new(registry: Arc<FormatterRegistry>, model: ModelRef) -> Self {
        Self {
            registry,
            selector: FormatterSelector::new(),
            model,
            service_root: String::new(),
            preferred_metadata: MetadataLevel::Minimal,
        }
    }

    /// Base used in `@odata.context` URLs, e.g. `/odata`.
    pub fn with_service_root(mut self, root: impl Into<String>) -> Self {
        self.service_root = root.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_preferred_metadata(mut self, level: MetadataLevel) -> Self {
        self.preferred_metadata = level;
        self
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn namespace(&self) -> &str {
        self.model.namespace()
    }

    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    pub fn preferred_metadata(&self) -> MetadataLevel {
        self.preferred_metadata
    }

    pub fn context(&self, path: &str) -> RequestContext {
        RequestContext::new(self.model.clone()).with_path(ODataPath::new(path))
    }

    /// Negotiate the response media type for `target`.
    ///
    /// Fails with 406 when the client accepts none of the writable media
    /// types, 400 on a malformed `$format`.
    pub fn negotiate_write(
        &self,
        target: &TargetType,
        instance: &str,
        preference: &FormatPreference,
    ) -> Result<MediaType, ProblemResponse> {
        let ctx = self.context(instance);
        let selected = self.selector.select_for_write(&self.registry, target, &ctx);
        let candidates = negotiable_media_types(&selected);
        if candidates.is_empty() {
            tracing::error!(?target, "no registered formatter can write target");
            return Err(catalog::INTERNAL.response("no formatter can write this payload", instance));
        }

        let ranges = preference
            .ranges()
            .map_err(|e| catalog::INVALID_FORMAT.response(e, instance))?;

        match negotiate(&ranges, &candidates, self.preferred_metadata) {
            Some(media_type) => {
                tracing::debug!(%media_type, instance, "negotiated response format");
                Ok(media_type)
            }
            None => {
                tracing::debug!(?preference, instance, "no acceptable response format");
                Err(catalog::NOT_ACCEPTABLE
                    .to_problem("none of the requested media types can be produced")
                    .with_instance(instance)
                    .with_supported(candidates)
                    .into())
            }
        }
    }

    /// Select the formatter for a request body declared as `content_type`.
    ///
    /// An empty selection is reported as 415 together with the media types
    /// that would have been accepted for `target`.
    pub fn select_read(
        &self,
        target: &TargetType,
        instance: &str,
        content_type: Option<&str>,
    ) -> Result<ReadFormat, ProblemResponse> {
        let unsupported = |detail: String| -> ProblemResponse {
            let ctx = self.context(instance);
            let readable = self.selector.select_for_read(&self.registry, target, &ctx);
            catalog::UNSUPPORTED_MEDIA_TYPE
                .to_problem(detail)
                .with_instance(instance)
                .with_supported(negotiable_media_types(&readable))
                .into()
        };

        let raw = content_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| unsupported("missing Content-Type".to_string()))?;
        let media_type = MediaType::parse(raw).map_err(|e| unsupported(e.to_string()))?;

        let ctx = self.context(instance).with_content_type(media_type.clone());
        let selected = self.selector.select_for_read(&self.registry, target, &ctx);
        let Some(first) = selected.first() else {
            tracing::debug!(content_type = raw, ?target, "no formatter can read body");
            return Err(unsupported(format!(
                "'{}' cannot be read for this resource",
                media_type
            )));
        };

        let encoding = match media_type.charset() {
            None => TextEncoding::Utf8,
            Some(label) => TextEncoding::from_charset(label)
                .filter(|e| negotiable_encodings(&selected).contains(e))
                .ok_or_else(|| unsupported(format!("charset '{}' is not supported", label)))?,
        };

        let byte_order = media_type
            .charset()
            .map(ByteOrder::from_charset)
            .unwrap_or_default();

        Ok(ReadFormat {
            formatter: first.id(),
            media_type,
            encoding,
            byte_order,
        })
    }
}

/// Decode a request body in the negotiated encoding. A leading BOM is
/// honoured; UTF-16 without a BOM is read in `byte_order`.
pub fn decode_text(
    bytes: &[u8],
    encoding: TextEncoding,
    byte_order: ByteOrder,
) -> Result<String, String> {
    match encoding {
        TextEncoding::Utf8 => {
            let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
            String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid UTF-8 body: {}", e))
        }
        TextEncoding::Utf16 => {
            let (bytes, little_endian) = match bytes {
                [0xFF, 0xFE, rest @ ..] => (rest, true),
                [0xFE, 0xFF, rest @ ..] => (rest, false),
                _ => (bytes, byte_order == ByteOrder::LittleEndian),
            };
            if bytes.len() % 2 != 0 {
                return Err("UTF-16 body has an odd number of bytes".into());
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| {
                    if little_endian {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                })
                .collect();
            String::from_utf16(&units).map_err(|e| format!("invalid UTF-16 body: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use odata_core::RegistryBuilder;

    fn service() -> ODataService {
        let registry = Arc::new(RegistryBuilder::default().build().unwrap());
        ODataService::new(registry, ModelRef::new("Sample")).with_service_root("/odata/")
    }

    #[test]
    fn service_root_is_trimmed() {
        assert_eq!(service().service_root(), "/odata");
    }

    #[test]
    fn select_read_accepts_json_entity() {
        let format = service()
            .select_read(
                &TargetType::entity("Customer"),
                "/odata/Customers",
                Some("application/json;odata.metadata=minimal;charset=utf-8"),
            )
            .unwrap();
        assert_eq!(format.formatter, "odata.json.resource");
        assert_eq!(format.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn select_read_routes_parameters_to_parameter_formatter() {
        let format = service()
            .select_read(
                &TargetType::ActionParameters,
                "/odata/Customers/Default.ResetRatings",
                Some("application/json"),
            )
            .unwrap();
        assert_eq!(format.formatter, "odata.json.parameters");
    }

    #[test]
    fn select_read_rejects_unknown_media_type_with_415() {
        let err = service()
            .select_read(&TargetType::entity("Customer"), "/x", Some("text/plain"))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.0.supported.as_ref().map(Vec::len), Some(12));
    }

    #[test]
    fn select_read_rejects_missing_content_type() {
        let err = service()
            .select_read(&TargetType::entity("Customer"), "/x", None)
            .unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[test]
    fn select_read_rejects_unknown_charset() {
        let err = service()
            .select_read(
                &TargetType::entity("Customer"),
                "/x",
                Some("application/json;charset=iso-8859-1"),
            )
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn negotiate_write_for_metadata_is_xml() {
        let mt = service()
            .negotiate_write(
                &TargetType::Metadata,
                "/odata/$metadata",
                &FormatPreference::default(),
            )
            .unwrap();
        assert_eq!(mt.to_canonical(), "application/xml");
    }

    #[test]
    fn negotiate_write_rejects_xml_for_collections() {
        let err = service()
            .negotiate_write(
                &TargetType::collection_of(TargetType::entity("Customer")),
                "/odata/Customers",
                &FormatPreference::from_accept("application/xml"),
            )
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn negotiate_write_reports_bad_format() {
        let err = service()
            .negotiate_write(
                &TargetType::entity("Customer"),
                "/x",
                &FormatPreference::from_format("???"),
            )
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
    }

    #[test]
    fn decode_utf16_with_and_without_bom() {
        let le: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("{}".encode_utf16().flat_map(|u| u.to_le_bytes()))
            .collect();
        assert_eq!(
            decode_text(&le, TextEncoding::Utf16, ByteOrder::BigEndian).unwrap(),
            "{}"
        );

        let be: Vec<u8> = "{}".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        assert_eq!(
            decode_text(&be, TextEncoding::Utf16, ByteOrder::BigEndian).unwrap(),
            "{}"
        );

        assert!(decode_text(&[0x00], TextEncoding::Utf16, ByteOrder::BigEndian).is_err());
    }

    #[test]
    fn decode_utf16le_without_bom() {
        let le: Vec<u8> = "{\"a\":1}".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(
            decode_text(&le, TextEncoding::Utf16, ByteOrder::LittleEndian).unwrap(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn select_read_accepts_utf16le_charset() {
        let format = service()
            .select_read(
                &TargetType::entity("Customer"),
                "/x",
                Some("application/json;charset=utf-16le"),
            )
            .unwrap();
        assert_eq!(format.encoding, TextEncoding::Utf16);
        assert_eq!(format.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn decode_utf8_strips_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'{', b'}'];
        assert_eq!(
            decode_text(&bytes, TextEncoding::Utf8, ByteOrder::default()).unwrap(),
            "{}"
        );
    }
}
