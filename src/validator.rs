//! `Validator` / `ValidationResult` (spec §4.F/§6.4): the public
//! entry point a caller drives a single message through, and the
//! outcome it gets back.

use prost_reflect::DynamicMessage;

use crate::context::RuleContext;
use crate::error::Result;
use crate::factory::Factory;
use crate::violation::Violation;

/// A validator bound to one [`Factory`] and one fail-fast setting.
/// Cheap to construct; the expensive work lives in the factory's cache.
pub struct Validator<'a> {
    factory: &'a Factory,
    fail_fast: bool,
}

impl<'a> Validator<'a> {
    pub fn new(factory: &'a Factory, fail_fast: bool) -> Self {
        Validator { factory, fail_fast }
    }

    /// Compiles (or reuses the cached compilation of) `msg`'s rules and
    /// evaluates them, returning every violation found or the first
    /// runtime/compilation error encountered along the way.
    pub fn validate(&self, msg: &DynamicMessage) -> Result<ValidationResult> {
        let desc = msg.descriptor();
        let node = self.factory.get(&desc).ok_or_else(|| {
            crate::error::Error::compilation(format!(
                "message type `{}` was never registered with the factory",
                desc.full_name()
            ))
        })?;
        let mut ctx = RuleContext::new(self.fail_fast);
        node.evaluate(&mut ctx, msg, self.factory)?;
        Ok(ValidationResult {
            violations: ctx.finalize(),
        })
    }
}

/// The outcome of a single [`Validator::validate`] call.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn violation_at(&self, index: usize) -> Option<&Violation> {
        self.violations.get(index)
    }

    pub fn size(&self) -> usize {
        self.violations.len()
    }

    pub fn success(&self) -> bool {
        self.violations.is_empty()
    }

    /// Renders the result as a `google.protobuf.Struct` (spec §4.H):
    /// this crate doesn't vendor a dedicated violation-list protobuf
    /// message, so the well-known `Struct`/`Value` types already shipped
    /// by `prost-types` stand in for one, carrying the same
    /// `serde`-derived shape [`crate::conformance`] emits as JSON.
    pub fn into_proto(self) -> prost_types::Struct {
        let json = serde_json::json!({ "violations": self.violations });
        match json_to_prost_value(&json).kind {
            Some(prost_types::value::Kind::StructValue(s)) => s,
            _ => prost_types::Struct::default(),
        }
    }
}

fn json_to_prost_value(value: &serde_json::Value) -> prost_types::Value {
    use prost_types::value::Kind;
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(*b),
        serde_json::Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Kind::StringValue(s.clone()),
        serde_json::Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(json_to_prost_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(prost_types::Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_prost_value(v)))
                .collect(),
        }),
    };
    prost_types::Value { kind: Some(kind) }
}
