//! `FieldPath` / `RulePath` location tracking (spec §3, §4.F, §4.D).
//!
//! Paths are never built incrementally while a node evaluates; instead a
//! node remembers where its emitted violations start in the violation
//! list and patches them afterward (`RuleContext::append_*`, spec §9). The
//! types here are just the patched-in values.

use serde::{Deserialize, Serialize};

/// A typed map key, carried on a `FieldPathElement` when the violation is
/// located inside a map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

impl std::fmt::Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Uint(u) => write!(f, "{u}"),
            MapKey::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// One step of a `FieldPath`: a field number, its declared or
/// extension-bracketed name, and either a repeated index or a typed map
/// key if the step descends into a repeated/map field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPathElement {
    pub field_number: i32,
    pub field_name: String,
    pub field_type: String,
    pub index: Option<u64>,
    pub key: Option<MapKey>,
}

impl FieldPathElement {
    pub fn new(field_number: i32, field_name: impl Into<String>, field_type: impl Into<String>) -> Self {
        FieldPathElement {
            field_number,
            field_name: field_name.into(),
            field_type: field_type.into(),
            index: None,
            key: None,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_key(mut self, key: MapKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// An ordered sequence of `FieldPathElement`s locating a value inside a
/// nested message, or the rule that produced a violation inside
/// `FieldRules`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPath {
    pub elements: Vec<FieldPathElement>,
}

impl FieldPath {
    pub fn new() -> Self {
        FieldPath::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Prepends `elem`, used when patching a violation's path after the
    /// node that owns `elem` finishes evaluating its children.
    pub fn prepend(&mut self, elem: FieldPathElement) {
        self.elements.insert(0, elem);
    }

    pub fn prepend_many(&mut self, elems: &[FieldPathElement]) {
        for elem in elems.iter().rev() {
            self.elements.insert(0, elem.clone());
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", e.field_name)?;
            if let Some(idx) = e.index {
                write!(f, "[{idx}]")?;
            }
            if let Some(key) = &e.key {
                write!(f, "[{key}]")?;
            }
        }
        Ok(())
    }
}

/// A rule-path element pointing into the `FieldRules` schema that produced
/// a violation (e.g. `{FieldRules.cel, index 0}`).
pub fn rule_path_element(message: &str, field: &str) -> FieldPathElement {
    FieldPathElement::new(0, field, message)
}
