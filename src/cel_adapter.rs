//! The only module that touches `cel_interpreter` directly (spec §6.2):
//! compiles and runs the expression language backing `cel` constraints and
//! predefined rules, translating between [`ExprValue`] and
//! `cel_interpreter::Value` at the boundary.

use std::collections::HashMap;
use std::sync::Arc;

use cel_interpreter::objects::{Key, Map as CelMap};
use cel_interpreter::{Context, Program, Value as CelValue};

use crate::error::{Error, Result};
use crate::value::{Duration, ExprValue, MapKey, Timestamp};

/// A parsed, ready-to-run expression. Parsing happens once at compile
/// time (spec §4.E); evaluation happens once per message per rule.
pub struct CompiledExpr {
    program: Program,
}

/// The variable bindings an expression sees when evaluated, matching
/// spec §6.2's `this` / `rules` / `rule` / `now` convention.
#[derive(Default)]
pub struct Bindings {
    pub this: Option<ExprValue>,
    pub rules: Option<ExprValue>,
    pub rule: Option<ExprValue>,
    pub now: Option<Timestamp>,
}

pub fn compile(source: &str) -> Result<CompiledExpr> {
    let program = Program::compile(source)
        .map_err(|e| Error::compilation(format!("invalid expression {source:?}: {e}")))?;
    Ok(CompiledExpr { program })
}

pub fn evaluate(expr: &CompiledExpr, bindings: &Bindings) -> Result<ExprValue> {
    let mut ctx = Context::default();
    crate::builtins::register(&mut ctx);
    if let Some(this) = &bindings.this {
        ctx.add_variable_from_value("this", to_cel(this));
    }
    if let Some(rules) = &bindings.rules {
        ctx.add_variable_from_value("rules", to_cel(rules));
    }
    if let Some(rule) = &bindings.rule {
        ctx.add_variable_from_value("rule", to_cel(rule));
    }
    if let Some(now) = &bindings.now {
        ctx.add_variable_from_value("now", to_cel(&ExprValue::Timestamp(*now)));
    }

    match expr.program.execute(&ctx) {
        Ok(value) => Ok(from_cel(&value)),
        Err(e) => Err(Error::Runtime(format!("expression evaluation failed: {e}"))),
    }
}

fn to_cel(value: &ExprValue) -> CelValue {
    match value {
        ExprValue::Null => CelValue::Null,
        ExprValue::Bool(b) => CelValue::Bool(*b),
        ExprValue::Int(i) => CelValue::Int(*i),
        ExprValue::Uint(u) => CelValue::UInt(*u),
        ExprValue::Double(d) => CelValue::Float(*d),
        ExprValue::String(s) => CelValue::String(Arc::new(s.as_str().to_string())),
        ExprValue::Bytes(b) => CelValue::Bytes(Arc::new(b.as_ref().clone())),
        ExprValue::Duration(d) => {
            CelValue::Duration(chrono::Duration::seconds(d.seconds) + chrono::Duration::nanoseconds(d.nanos as i64))
        }
        ExprValue::Timestamp(t) => {
            let dt = chrono::DateTime::from_timestamp(t.seconds, t.nanos.max(0) as u32)
                .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap());
            CelValue::Timestamp(dt.into())
        }
        ExprValue::List(items) => {
            CelValue::List(Arc::new(items.iter().map(to_cel).collect()))
        }
        ExprValue::Map(map) => {
            let mut out = HashMap::new();
            for (k, v) in map.iter() {
                out.insert(to_cel_key(k), to_cel(v));
            }
            CelValue::Map(CelMap { map: Arc::new(out) })
        }
        ExprValue::Message(msg) => {
            // Messages are exposed field-by-field, not as a nested CEL
            // struct type; callers needing message fields read them off
            // `this` before binding, matching how rule compilation
            // resolves field access ahead of time (spec §4.D).
            CelValue::String(Arc::new(msg.descriptor().full_name().to_string()))
        }
        ExprValue::Error(msg) => CelValue::String(Arc::new(msg.clone())),
    }
}

fn to_cel_key(key: &MapKey) -> Key {
    match key {
        MapKey::Bool(b) => Key::Bool(*b),
        MapKey::Int(i) => Key::Int(*i),
        MapKey::Uint(u) => Key::Uint(*u),
        MapKey::String(s) => Key::String(Arc::new(s.clone())),
    }
}

fn from_cel(value: &CelValue) -> ExprValue {
    match value {
        CelValue::Null => ExprValue::Null,
        CelValue::Bool(b) => ExprValue::Bool(*b),
        CelValue::Int(i) => ExprValue::Int(*i),
        CelValue::UInt(u) => ExprValue::Uint(*u),
        CelValue::Float(f) => ExprValue::Double(*f),
        CelValue::String(s) => ExprValue::string(s.as_str()),
        CelValue::Bytes(b) => ExprValue::bytes(b.as_ref().clone()),
        CelValue::Duration(d) => ExprValue::Duration(Duration {
            seconds: d.num_seconds(),
            nanos: (d.num_nanoseconds().unwrap_or(0) % 1_000_000_000) as i32,
        }),
        CelValue::Timestamp(t) => ExprValue::Timestamp(Timestamp {
            seconds: t.timestamp(),
            nanos: t.timestamp_subsec_nanos() as i32,
        }),
        CelValue::List(items) => {
            ExprValue::List(Arc::new(items.iter().map(from_cel).collect()))
        }
        CelValue::Map(map) => {
            let mut out = std::collections::BTreeMap::new();
            for (k, v) in map.map.iter() {
                out.insert(from_cel_key(k), from_cel(v));
            }
            ExprValue::Map(Arc::new(out))
        }
        CelValue::Function(name, _) => ExprValue::string(name.as_str()),
    }
}

fn from_cel_key(key: &Key) -> MapKey {
    match key {
        Key::Bool(b) => MapKey::Bool(*b),
        Key::Int(i) => MapKey::Int(*i),
        Key::Uint(u) => MapKey::Uint(*u),
        Key::String(s) => MapKey::String(s.as_str().to_string()),
    }
}

/// The result of checking a `cel` constraint's expression value against
/// spec §4.D's rule: `true`/empty string pass, `false` fails with the
/// constraint's declared message, and a non-empty string fails using
/// that string as the violation message instead of the declared one.
/// Any other result type is a runtime error.
pub enum ConstraintOutcome {
    Pass,
    Fail(Option<String>),
}

pub fn check_constraint(value: &ExprValue) -> Result<ConstraintOutcome> {
    match value {
        ExprValue::Bool(true) => Ok(ConstraintOutcome::Pass),
        ExprValue::Bool(false) => Ok(ConstraintOutcome::Fail(None)),
        ExprValue::String(s) if s.is_empty() => Ok(ConstraintOutcome::Pass),
        ExprValue::String(s) => Ok(ConstraintOutcome::Fail(Some(s.as_str().to_string()))),
        other => Err(Error::Runtime(format!(
            "expression did not evaluate to bool or string: {other:?}"
        ))),
    }
}
