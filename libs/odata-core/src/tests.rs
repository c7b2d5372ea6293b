#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use std::sync::Arc;

    use crate::{
        DeserializerProvider, Error, FormatterDescriptor, FormatterKind, FormatterRegistry,
        FormatterSelector, MediaType, MetadataLevel, ModelRef, PayloadKind, RegistryBuilder,
        RequestContext, SerializerProvider, TargetType, TextEncoding,
    };

    struct NoParameters;

    impl DeserializerProvider for NoParameters {
        fn supports(&self, kind: PayloadKind) -> bool {
            kind != PayloadKind::Parameter
        }
    }

    struct NoMetadata;

    impl SerializerProvider for NoMetadata {
        fn supports(&self, kind: PayloadKind) -> bool {
            kind != PayloadKind::MetadataDocument
        }
    }

    fn registry() -> FormatterRegistry {
        RegistryBuilder::default().build().expect("default registry")
    }

    fn ctx() -> RequestContext {
        RequestContext::new(ModelRef::new("Sample"))
    }

    #[test]
    fn test_empty_builder_fails_with_configuration_error() {
        let err = RegistryBuilder::empty().build().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_deserializer_fails_build() {
        let err = RegistryBuilder::default()
            .with_deserializers(Arc::new(NoParameters))
            .build()
            .unwrap_err();
        match err {
            Error::Configuration(msg) => {
                assert!(msg.contains("odata.json.parameters"), "got: {}", msg);
                assert!(msg.contains("Parameter"), "got: {}", msg);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_serializer_fails_build() {
        let err = RegistryBuilder::default()
            .with_serializers(Arc::new(NoMetadata))
            .build()
            .unwrap_err();
        match err {
            Error::Configuration(msg) => assert!(msg.contains("odata.xml"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_descriptor_rejects_empty_media_types() {
        let err = FormatterDescriptor::new(FormatterKind::Xml, vec![], vec![TextEncoding::Utf8])
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_descriptor_rejects_duplicate_media_types() {
        let err = FormatterDescriptor::new(
            FormatterKind::Xml,
            vec!["application/xml".into(), "application/xml".into()],
            vec![TextEncoding::Utf8],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_descriptor_rejects_empty_encodings() {
        let err =
            FormatterDescriptor::new(FormatterKind::Xml, vec!["application/xml".into()], vec![])
                .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_registry_lookup_by_id() {
        let registry = registry();
        let xml = registry.get("odata.xml").expect("xml formatter");
        assert_eq!(xml.kind(), FormatterKind::Xml);
        assert_eq!(xml.media_types(), &["application/xml".to_string()]);
        assert!(registry.get("odata.csv").is_none());
    }

    #[test]
    fn test_registry_order_is_json_before_xml() {
        let ids: Vec<_> = registry().iter().map(|d| d.id()).collect();
        assert_eq!(
            ids,
            vec!["odata.json.resource", "odata.json.parameters", "odata.xml"]
        );
    }

    #[test]
    fn test_can_read_requires_model() {
        let registry = registry();
        let selector = FormatterSelector::new();
        let json = registry.get("odata.json.resource").unwrap();
        let target = TargetType::entity("Customer");

        assert!(selector.can_read(json, &target, &ctx()));
        assert!(!selector.can_read(json, &target, &RequestContext::default()));
    }

    #[test]
    fn test_can_read_honours_content_type() {
        let registry = registry();
        let selector = FormatterSelector::new();
        let target = TargetType::entity("Customer");

        let full = ctx().with_content_type(
            MediaType::json()
                .with_metadata(MetadataLevel::Full)
                .with_charset("utf-8"),
        );
        assert_eq!(selector.select_for_read(&registry, &target, &full).len(), 1);

        let plain = ctx().with_content_type(MediaType::new("text", "plain"));
        assert!(selector.select_for_read(&registry, &target, &plain).is_empty());

        let xml = ctx().with_content_type(MediaType::xml());
        assert!(selector.select_for_read(&registry, &target, &xml).is_empty());
    }

    #[test]
    fn test_parameters_formatter_only_reads_action_parameters() {
        let registry = registry();
        let selector = FormatterSelector::new();
        let params = registry.get("odata.json.parameters").unwrap();

        assert!(selector.can_read(params, &TargetType::ActionParameters, &ctx()));
        assert!(!selector.can_read(params, &TargetType::entity("Customer"), &ctx()));
        assert!(!selector.can_write(params, &TargetType::ActionParameters, &ctx()));
    }

    #[test]
    fn test_write_selection_for_metadata_is_xml_only() {
        let registry = registry();
        let selected =
            FormatterSelector::new().select_for_write(&registry, &TargetType::Metadata, &ctx());
        let ids: Vec<_> = selected.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["odata.xml"]);
    }

    #[test]
    fn test_write_selection_for_collection_is_json_resource() {
        let registry = registry();
        let target = TargetType::collection_of(TargetType::entity("Customer"));
        let selected = FormatterSelector::new().select_for_write(&registry, &target, &ctx());
        let ids: Vec<_> = selected.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["odata.json.resource"]);
    }

    #[test]
    fn test_payload_kind_mapping() {
        assert_eq!(
            TargetType::entity("Customer").payload_kind(),
            PayloadKind::Resource
        );
        assert_eq!(
            TargetType::collection_of(TargetType::Complex("Address".into())).payload_kind(),
            PayloadKind::ResourceSet
        );
        assert_eq!(
            TargetType::collection_of(TargetType::Primitive("Edm.String".into())).payload_kind(),
            PayloadKind::Collection
        );
        assert_eq!(
            TargetType::ActionParameters.payload_kind(),
            PayloadKind::Parameter
        );
    }

    #[test]
    fn test_registry_serializes_for_diagnostics() {
        let value = serde_json::to_value(registry()).unwrap();
        let descriptors = value["descriptors"].as_array().unwrap();
        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[2]["id"], "odata.xml");
        assert_eq!(descriptors[2]["media_types"][0], "application/xml");
        assert_eq!(descriptors[0]["encodings"][0], "Utf8");
    }
}
