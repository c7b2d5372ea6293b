use crate::encoding::TextEncoding;
use crate::formatter::{RequestContext, TargetType};
use crate::ordered_set::OrderedSet;
use crate::registry::{FormatterDescriptor, FormatterRegistry};

/// Decides which registered formatters apply to a request.
///
/// Stateless: every call is a pure function of the registry, the target type
/// and the request context, so a single value can be shared across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatterSelector;

impl FormatterSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn can_read(
        &self,
        descriptor: &FormatterDescriptor,
        target: &TargetType,
        ctx: &RequestContext,
    ) -> bool {
        applies_to_context(descriptor, ctx) && descriptor.formatter().can_read_type(target)
    }

    pub fn can_write(
        &self,
        descriptor: &FormatterDescriptor,
        target: &TargetType,
        ctx: &RequestContext,
    ) -> bool {
        applies_to_context(descriptor, ctx) && descriptor.formatter().can_write_type(target)
    }

    /// Every descriptor able to read `target`, in registry order. Empty when
    /// none applies; the caller maps that to "unsupported media type".
    pub fn select_for_read<'r>(
        &self,
        registry: &'r FormatterRegistry,
        target: &TargetType,
        ctx: &RequestContext,
    ) -> Vec<&'r FormatterDescriptor> {
        let selected: Vec<_> = registry
            .iter()
            .filter(|d| self.can_read(d, target, ctx))
            .collect();
        tracing::trace!(?target, matched = selected.len(), "selected formatters for read");
        selected
    }

    pub fn select_for_write<'r>(
        &self,
        registry: &'r FormatterRegistry,
        target: &TargetType,
        ctx: &RequestContext,
    ) -> Vec<&'r FormatterDescriptor> {
        let selected: Vec<_> = registry
            .iter()
            .filter(|d| self.can_write(d, target, ctx))
            .collect();
        tracing::trace!(?target, matched = selected.len(), "selected formatters for write");
        selected
    }
}

fn applies_to_context(descriptor: &FormatterDescriptor, ctx: &RequestContext) -> bool {
    if !ctx.is_odata() {
        return false;
    }
    match &ctx.content_type {
        Some(ct) => descriptor.supports_media_type(&ct.to_canonical()),
        None => true,
    }
}

/// The negotiable media-type set: the union of the selected descriptors'
/// media types, first-seen order.
pub fn negotiable_media_types(selected: &[&FormatterDescriptor]) -> Vec<String> {
    selected
        .iter()
        .flat_map(|d| d.media_types().iter().cloned())
        .collect::<OrderedSet<_>>()
        .into_vec()
}

pub fn negotiable_encodings(selected: &[&FormatterDescriptor]) -> Vec<TextEncoding> {
    selected
        .iter()
        .flat_map(|d| d.encodings().iter().copied())
        .collect::<OrderedSet<_>>()
        .into_vec()
}
