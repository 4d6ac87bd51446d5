//! The value bridge (spec §4.C): maps a reflected field value into the
//! expression runtime's value universe ([`ExprValue`]).

use std::collections::BTreeMap;
use std::sync::Arc;

use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MapKey as ProstMapKey, Value as ProstValue};

use crate::value::{Duration, ExprValue, MapKey, Timestamp};

/// Bridges a scalar `prost_reflect::Value` (never a list/map wrapper).
pub fn bridge_scalar(value: &ProstValue) -> ExprValue {
    match value {
        ProstValue::Bool(b) => ExprValue::Bool(*b),
        ProstValue::I32(i) => ExprValue::Int(*i as i64),
        ProstValue::I64(i) => ExprValue::Int(*i),
        ProstValue::U32(u) => ExprValue::Uint(*u as u64),
        ProstValue::U64(u) => ExprValue::Uint(*u),
        ProstValue::F32(f) => ExprValue::Double(*f as f64),
        ProstValue::F64(f) => ExprValue::Double(*f),
        ProstValue::String(s) => ExprValue::string(s.clone()),
        ProstValue::Bytes(b) => ExprValue::bytes(b.to_vec()),
        ProstValue::EnumNumber(n) => ExprValue::Int(*n as i64),
        ProstValue::Message(m) => bridge_message(m),
        ProstValue::List(items) => {
            ExprValue::List(Arc::new(items.iter().map(bridge_scalar).collect()))
        }
        ProstValue::Map(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(bridge_map_key(k), bridge_scalar(v));
            }
            ExprValue::Map(Arc::new(out))
        }
    }
}

/// `google.protobuf.Duration`/`Timestamp` bridge to their own [`ExprValue`]
/// variants (so `lt`/`gt`/`const_value` rules on those fields compare
/// seconds/nanos instead of silently no-opping against an opaque
/// `Message`); every other message type bridges generically.
fn bridge_message(m: &DynamicMessage) -> ExprValue {
    match m.descriptor().full_name() {
        "google.protobuf.Duration" => ExprValue::Duration(Duration {
            seconds: message_i64_field(m, "seconds"),
            nanos: message_i32_field(m, "nanos"),
        }),
        "google.protobuf.Timestamp" => ExprValue::Timestamp(Timestamp {
            seconds: message_i64_field(m, "seconds"),
            nanos: message_i32_field(m, "nanos"),
        }),
        _ => ExprValue::Message(Arc::new(m.clone())),
    }
}

fn message_i64_field(m: &DynamicMessage, name: &str) -> i64 {
    m.descriptor()
        .get_field_by_name(name)
        .and_then(|f| m.get_field(&f).as_i64())
        .unwrap_or(0)
}

fn message_i32_field(m: &DynamicMessage, name: &str) -> i32 {
    m.descriptor()
        .get_field_by_name(name)
        .and_then(|f| m.get_field(&f).as_i32())
        .unwrap_or(0)
}

pub fn bridge_map_key(key: &ProstMapKey) -> MapKey {
    match key {
        ProstMapKey::Bool(b) => MapKey::Bool(*b),
        ProstMapKey::I32(i) => MapKey::Int(*i as i64),
        ProstMapKey::I64(i) => MapKey::Int(*i),
        ProstMapKey::U32(u) => MapKey::Uint(*u as u64),
        ProstMapKey::U64(u) => MapKey::Uint(*u),
        ProstMapKey::String(s) => MapKey::String(s.clone()),
    }
}

/// Converts the expression-side map key representation into the
/// path-reporting [`crate::path::MapKey`] used on a [`crate::path::FieldPathElement`].
pub fn key_to_path_key(key: &MapKey) -> crate::path::MapKey {
    match key {
        MapKey::Bool(b) => crate::path::MapKey::Bool(*b),
        MapKey::Int(i) => crate::path::MapKey::Int(*i),
        MapKey::Uint(u) => crate::path::MapKey::Uint(*u),
        MapKey::String(s) => crate::path::MapKey::String(s.clone()),
    }
}

pub fn map_key_to_expr_value(key: &MapKey) -> ExprValue {
    match key {
        MapKey::Bool(b) => ExprValue::Bool(*b),
        MapKey::Int(i) => ExprValue::Int(*i),
        MapKey::Uint(u) => ExprValue::Uint(*u),
        MapKey::String(s) => ExprValue::string(s.clone()),
    }
}

/// Bridges a whole field out of a live message: scalar, repeated-as-list,
/// or map-as-map, per spec §4.C.
pub fn bridge_field(msg: &DynamicMessage, field: &FieldDescriptor) -> ExprValue {
    if field.is_map() {
        let value = msg.get_field(field);
        match value.as_ref() {
            ProstValue::Map(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(bridge_map_key(k), bridge_scalar(v));
                }
                ExprValue::Map(Arc::new(out))
            }
            _ => ExprValue::Map(Arc::new(BTreeMap::new())),
        }
    } else if field.is_list() {
        let value = msg.get_field(field);
        match value.as_ref() {
            ProstValue::List(items) => {
                ExprValue::List(Arc::new(items.iter().map(bridge_scalar).collect()))
            }
            _ => ExprValue::List(Arc::new(Vec::new())),
        }
    } else {
        let value = msg.get_field(field);
        bridge_scalar(&value)
    }
}

/// Bridges the default value declared for a field (used by
/// `ignore_default`).
pub fn bridge_default(field: &FieldDescriptor) -> ExprValue {
    match field.kind() {
        Kind::Message(_) | Kind::Group(_) => ExprValue::Null,
        _ => bridge_scalar(&field.default_value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip_is_structural_equality() {
        let original = ProstValue::String("hello".to_string());
        let bridged = bridge_scalar(&original);
        assert_eq!(bridged.as_str(), Some("hello"));
    }

    #[test]
    fn int_uint_cross_equality() {
        assert_eq!(ExprValue::Int(5), ExprValue::Uint(5));
        assert_ne!(ExprValue::Int(-1), ExprValue::Uint(1));
    }
}
