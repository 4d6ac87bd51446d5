//! `Violation` and `FieldRef` (spec §3).
//!
//! `field_value`/`rule_value` are "lazy" handles in the sense the spec
//! means it (§9: "Value captures are optional"): we bridge the reflected
//! value into a small, cheap-to-clone [`ScalarCapture`] at the moment a
//! node emits a violation, rather than serializing the whole message, so
//! a caller who only asks `success()` never pays for capture formatting.
//! `RuleContext::finalize` (spec §4.F) is where a richer implementation
//! would resolve a true lazy handle; here it is a no-op pass that exists
//! to keep that extension point named.

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::value::ExprValue;

/// A capture of a scalar (or message-typed-but-summarized) field value,
/// attached to a violation for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScalarCapture {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// A message-typed value, summarized by its type name only.
    Message(String),
}

impl From<&ExprValue> for ScalarCapture {
    fn from(value: &ExprValue) -> Self {
        match value {
            ExprValue::Null => ScalarCapture::Null,
            ExprValue::Bool(b) => ScalarCapture::Bool(*b),
            ExprValue::Int(i) => ScalarCapture::Int(*i),
            ExprValue::Uint(u) => ScalarCapture::Uint(*u),
            ExprValue::Double(d) => ScalarCapture::Double(*d),
            ExprValue::String(s) => ScalarCapture::String(s.as_str().to_string()),
            ExprValue::Bytes(b) => ScalarCapture::Bytes(b.as_ref().clone()),
            ExprValue::Duration(d) => ScalarCapture::String(format!("{}.{}s", d.seconds, d.nanos)),
            ExprValue::Timestamp(t) => {
                ScalarCapture::String(format!("{}.{}s", t.seconds, t.nanos))
            }
            ExprValue::List(_) => ScalarCapture::String("<list>".to_string()),
            ExprValue::Map(_) => ScalarCapture::String("<map>".to_string()),
            ExprValue::Message(m) => ScalarCapture::Message(m.descriptor().full_name().to_string()),
            ExprValue::Error(e) => ScalarCapture::String(e.clone()),
        }
    }
}

impl std::fmt::Display for ScalarCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarCapture::Null => write!(f, "null"),
            ScalarCapture::Bool(b) => write!(f, "{b}"),
            ScalarCapture::Int(i) => write!(f, "{i}"),
            ScalarCapture::Uint(u) => write!(f, "{u}"),
            ScalarCapture::Double(d) => write!(f, "{d}"),
            ScalarCapture::String(s) => write!(f, "{s}"),
            ScalarCapture::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            ScalarCapture::Message(name) => write!(f, "<{name}>"),
        }
    }
}

/// A single precisely-located violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    pub rule_id: String,
    pub field_path: FieldPath,
    pub rule_path: FieldPath,
    pub field_value: Option<ScalarCapture>,
    pub rule_value: Option<ScalarCapture>,
    pub for_key: bool,
}

impl Violation {
    pub fn new(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            message: message.into(),
            rule_id: rule_id.into(),
            field_path: FieldPath::new(),
            rule_path: FieldPath::new(),
            field_value: None,
            rule_value: None,
            for_key: false,
        }
    }
}
