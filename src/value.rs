//! The expression runtime's value universe (spec §6.2): the minimal
//! `Value` sum type the core requires of its expression backend, kept as
//! our own type so [`crate::bridge`] and [`crate::node`] don't leak the
//! external CEL crate's type into every signature — only
//! [`crate::cel_adapter`] touches `cel_interpreter::Value` directly.

use std::collections::BTreeMap;
use std::sync::Arc;

/// A duration, independent of any particular expression-runtime crate's
/// representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

/// An absolute instant, independent of any particular expression-runtime
/// crate's representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

/// A map key: CEL restricts map keys to a handful of hashable types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

/// The full value universe: `null, bool, int64, uint64, double, string,
/// bytes, duration, timestamp, list, map, message, error`.
#[derive(Debug, Clone)]
pub enum ExprValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Arc<String>),
    Bytes(Arc<Vec<u8>>),
    Duration(Duration),
    Timestamp(Timestamp),
    List(Arc<Vec<ExprValue>>),
    Map(Arc<BTreeMap<MapKey, ExprValue>>),
    /// A message-typed value, carrying its dynamic type name so `type_url`
    /// style checks (the `any` rule case) still work after bridging.
    Message(Arc<prost_reflect::DynamicMessage>),
    /// A runtime error surfaced as a value, per the expression runtime's
    /// own error-as-value convention, distinct from a host-level `Error`.
    Error(String),
}

impl ExprValue {
    pub fn string(s: impl Into<String>) -> Self {
        ExprValue::String(Arc::new(s.into()))
    }

    pub fn bytes(b: Vec<u8>) -> Self {
        ExprValue::Bytes(Arc::new(b))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExprValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExprValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ExprValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ExprValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ExprValue::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ExprValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_empty_default(&self) -> bool {
        match self {
            ExprValue::Null => true,
            ExprValue::Bool(b) => !*b,
            ExprValue::Int(i) => *i == 0,
            ExprValue::Uint(u) => *u == 0,
            ExprValue::Double(d) => *d == 0.0,
            ExprValue::String(s) => s.is_empty(),
            ExprValue::Bytes(b) => b.is_empty(),
            ExprValue::List(l) => l.is_empty(),
            ExprValue::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExprValue::Error(_))
    }
}

impl PartialEq for ExprValue {
    fn eq(&self, other: &Self) -> bool {
        use ExprValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Uint(a), Uint(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Int(a), Uint(b)) | (Uint(b), Int(a)) => *a >= 0 && *a as u64 == *b,
            _ => false,
        }
    }
}
