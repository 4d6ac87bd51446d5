//! The rule-annotation data model (spec §3 `RuleAnnotation`).
//!
//! Schemas attach rules to messages, fields, and oneofs as custom
//! protobuf options. `prost_reflect` surfaces a field or message's option
//! block as a `DynamicMessage`, which we convert into these plain,
//! `serde`-derived structs the same way `examples/other_examples`'
//! `kube-core/src/cel.rs` represents a CRD's `x-kubernetes-validations`
//! rules as a plain `Rule` struct rather than re-deriving the Kubernetes
//! API machinery. The field numbers used to locate these option blocks
//! are recorded in [`ext`].

use serde::Deserialize;

/// Whether a field's rules run unconditionally, only when the field is
/// populated, or never.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ignore {
    #[default]
    Unspecified,
    IfUnpopulated,
    IfDefaultValue,
    Always,
}

/// A single free-form expression rule (`cel` in protovalidate's own
/// vocabulary): an id for stable reporting, a human message, and the
/// expression source.
#[derive(Debug, Clone, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub message: String,
    pub expression: String,
}

/// The structured, typed predicates available on a scalar-kind field.
/// Real protovalidate generates one near-identical message per scalar
/// kind (`Int32Rules`, `StringRules`, ...); this crate uses one superset
/// struct and lets the compiler (§4.E) type-check which predicates are
/// legal for a given field kind, avoiding dozens of copy-pasted proto
/// messages for what is, structurally, the same handful of predicate
/// shapes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScalarRules {
    pub const_value: Option<serde_json::Value>,
    pub lt: Option<serde_json::Value>,
    pub lte: Option<serde_json::Value>,
    pub gt: Option<serde_json::Value>,
    pub gte: Option<serde_json::Value>,
    pub r#in: Vec<serde_json::Value>,
    pub not_in: Vec<serde_json::Value>,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
    pub pattern: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub contains: Option<String>,
    pub not_contains: Option<String>,
    pub email: bool,
    pub hostname: bool,
    pub ip: bool,
    pub ipv4: bool,
    pub ipv6: bool,
    pub ip_prefix: bool,
    pub ipv4_prefix: bool,
    pub ipv6_prefix: bool,
    pub uri: bool,
    pub uri_ref: bool,
    pub host_and_port: bool,
}

/// Rules specific to an enum-kind field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnumRules {
    pub const_value: Option<i32>,
    pub defined_only: bool,
    pub r#in: Vec<i32>,
    pub not_in: Vec<i32>,
}

/// Rules specific to a repeated field: cardinality bounds, `unique`, and
/// the item sub-rules applied to each element.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepeatedRules {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique: bool,
    pub items: Option<Box<FieldRules>>,
}

/// Rules specific to a map field: cardinality bounds and key/value
/// sub-rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapRules {
    pub min_pairs: Option<u64>,
    pub max_pairs: Option<u64>,
    pub keys: Option<Box<FieldRules>>,
    pub values: Option<Box<FieldRules>>,
}

/// Rules specific to a `google.protobuf.Any` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnyRules {
    pub r#in: Vec<String>,
    pub not_in: Vec<String>,
}

/// The rule-case attached to a specific field: exactly one of the
/// type-specific rule blocks may be set, mirroring protovalidate's
/// `FieldRules.type` oneof.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    pub ignore: Ignore,
    pub required: bool,
    pub cel: Vec<Constraint>,

    pub bool_: Option<ScalarRules>,
    pub float: Option<ScalarRules>,
    pub double: Option<ScalarRules>,
    pub int32: Option<ScalarRules>,
    pub int64: Option<ScalarRules>,
    pub uint32: Option<ScalarRules>,
    pub uint64: Option<ScalarRules>,
    pub sint32: Option<ScalarRules>,
    pub sint64: Option<ScalarRules>,
    pub fixed32: Option<ScalarRules>,
    pub fixed64: Option<ScalarRules>,
    pub sfixed32: Option<ScalarRules>,
    pub sfixed64: Option<ScalarRules>,
    pub string: Option<ScalarRules>,
    pub bytes: Option<ScalarRules>,
    pub enum_: Option<EnumRules>,
    pub duration: Option<ScalarRules>,
    pub timestamp: Option<ScalarRules>,
    pub repeated: Option<RepeatedRules>,
    pub map: Option<MapRules>,
    pub any: Option<AnyRules>,
}

/// Which scalar-or-structured case is set on a [`FieldRules`], if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCase {
    Bool,
    Float,
    Double,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    String,
    Bytes,
    Enum,
    Duration,
    Timestamp,
    Repeated,
    Map,
    Any,
}

impl RuleCase {
    /// The rule-id prefix protovalidate-style diagnostics use for this
    /// case (e.g. `"bool"`, `"string"`), independent of the Rust field
    /// name used to store it on [`FieldRules`].
    pub fn rule_id_prefix(&self) -> &'static str {
        match self {
            RuleCase::Bool => "bool",
            RuleCase::Float => "float",
            RuleCase::Double => "double",
            RuleCase::Int32 => "int32",
            RuleCase::Int64 => "int64",
            RuleCase::Uint32 => "uint32",
            RuleCase::Uint64 => "uint64",
            RuleCase::Sint32 => "sint32",
            RuleCase::Sint64 => "sint64",
            RuleCase::Fixed32 => "fixed32",
            RuleCase::Fixed64 => "fixed64",
            RuleCase::Sfixed32 => "sfixed32",
            RuleCase::Sfixed64 => "sfixed64",
            RuleCase::String => "string",
            RuleCase::Bytes => "bytes",
            RuleCase::Enum => "enum",
            RuleCase::Duration => "duration",
            RuleCase::Timestamp => "timestamp",
            RuleCase::Repeated => "repeated",
            RuleCase::Map => "map",
            RuleCase::Any => "any",
        }
    }
}

impl FieldRules {
    /// The well-known-wrapper message type a scalar rule case may also
    /// legally attach to (spec §4.E: "OR be a message field of the
    /// corresponding well-known wrapper type").
    pub fn wrapper_type_name(case: RuleCase) -> Option<&'static str> {
        Some(match case {
            RuleCase::Bool => "google.protobuf.BoolValue",
            RuleCase::Float => "google.protobuf.FloatValue",
            RuleCase::Double => "google.protobuf.DoubleValue",
            RuleCase::Int32 => "google.protobuf.Int32Value",
            RuleCase::Int64 => "google.protobuf.Int64Value",
            RuleCase::Uint32 => "google.protobuf.UInt32Value",
            RuleCase::Uint64 => "google.protobuf.UInt64Value",
            RuleCase::String => "google.protobuf.StringValue",
            RuleCase::Bytes => "google.protobuf.BytesValue",
            _ => return None,
        })
    }

    pub fn case(&self) -> Option<RuleCase> {
        if self.bool_.is_some() {
            Some(RuleCase::Bool)
        } else if self.float.is_some() {
            Some(RuleCase::Float)
        } else if self.double.is_some() {
            Some(RuleCase::Double)
        } else if self.int32.is_some() {
            Some(RuleCase::Int32)
        } else if self.int64.is_some() {
            Some(RuleCase::Int64)
        } else if self.uint32.is_some() {
            Some(RuleCase::Uint32)
        } else if self.uint64.is_some() {
            Some(RuleCase::Uint64)
        } else if self.sint32.is_some() {
            Some(RuleCase::Sint32)
        } else if self.sint64.is_some() {
            Some(RuleCase::Sint64)
        } else if self.fixed32.is_some() {
            Some(RuleCase::Fixed32)
        } else if self.fixed64.is_some() {
            Some(RuleCase::Fixed64)
        } else if self.sfixed32.is_some() {
            Some(RuleCase::Sfixed32)
        } else if self.sfixed64.is_some() {
            Some(RuleCase::Sfixed64)
        } else if self.string.is_some() {
            Some(RuleCase::String)
        } else if self.bytes.is_some() {
            Some(RuleCase::Bytes)
        } else if self.enum_.is_some() {
            Some(RuleCase::Enum)
        } else if self.duration.is_some() {
            Some(RuleCase::Duration)
        } else if self.timestamp.is_some() {
            Some(RuleCase::Timestamp)
        } else if self.repeated.is_some() {
            Some(RuleCase::Repeated)
        } else if self.map.is_some() {
            Some(RuleCase::Map)
        } else if self.any.is_some() {
            Some(RuleCase::Any)
        } else {
            None
        }
    }

    pub fn scalar_rules(&self, case: RuleCase) -> Option<&ScalarRules> {
        match case {
            RuleCase::Bool => self.bool_.as_ref(),
            RuleCase::Float => self.float.as_ref(),
            RuleCase::Double => self.double.as_ref(),
            RuleCase::Int32 => self.int32.as_ref(),
            RuleCase::Int64 => self.int64.as_ref(),
            RuleCase::Uint32 => self.uint32.as_ref(),
            RuleCase::Uint64 => self.uint64.as_ref(),
            RuleCase::Sint32 => self.sint32.as_ref(),
            RuleCase::Sint64 => self.sint64.as_ref(),
            RuleCase::Fixed32 => self.fixed32.as_ref(),
            RuleCase::Fixed64 => self.fixed64.as_ref(),
            RuleCase::Sfixed32 => self.sfixed32.as_ref(),
            RuleCase::Sfixed64 => self.sfixed64.as_ref(),
            RuleCase::String => self.string.as_ref(),
            RuleCase::Bytes => self.bytes.as_ref(),
            RuleCase::Duration => self.duration.as_ref(),
            RuleCase::Timestamp => self.timestamp.as_ref(),
            _ => None,
        }
    }
}

/// A message-level `oneof` rule: a set of field names of which at most
/// one (or exactly one, if `required`) may be populated.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageOneofRule {
    pub fields: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// Rules attached to a message as a whole.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageRules {
    pub disabled: bool,
    pub cel: Vec<Constraint>,
    pub oneof: Vec<MessageOneofRule>,
}

/// Rules attached to a protobuf `oneof` declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OneofRules {
    pub required: bool,
}

/// Extension (custom-option) field numbers used to locate rule
/// annotations, matching the reserved numbers protovalidate itself uses
/// for `buf.validate.message` / `.field` / `.oneof` so that a descriptor
/// pool built against that well-known schema is also readable here.
pub mod ext {
    pub const MESSAGE_RULES_FIELD_NUMBER: u32 = 1159;
    pub const FIELD_RULES_FIELD_NUMBER: u32 = 1159;
    pub const ONEOF_RULES_FIELD_NUMBER: u32 = 1159;
}
