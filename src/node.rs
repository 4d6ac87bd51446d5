//! Compiled rule nodes (spec §4.D): the tree [`crate::compiler`] builds
//! out of a schema's annotations, walked in parallel with a message
//! instance by [`MessageNode::evaluate`]. Every `evaluate*` here follows
//! the same shape: bridge a value, run the type-specific checks, run the
//! attached `cel` constraints, then patch the emitted violations' paths
//! on the way back out (spec §9).

use std::collections::HashSet;

use prost_reflect::{DynamicMessage, EnumDescriptor, FieldDescriptor, OneofDescriptor};

use crate::address;
use crate::bridge;
use crate::cel_adapter::{self, Bindings, CompiledExpr};
use crate::context::RuleContext;
use crate::error::Result;
use crate::factory::Factory;
use crate::path::FieldPathElement;
use crate::rules::{AnyRules, EnumRules, Ignore, MapRules, RepeatedRules, ScalarRules};
use crate::value::ExprValue;
use crate::violation::{ScalarCapture, Violation};

/// A compiled `cel` constraint: its parsed expression plus the id/message
/// reported on a failing evaluation.
pub struct CompiledConstraint {
    pub id: String,
    pub message: String,
    pub expr: CompiledExpr,
}

/// The type-specific shape of a field's compiled rules. Nested message
/// recursion is resolved lazily through the [`Factory`] cache rather than
/// eagerly compiling a child [`MessageNode`], so self-referential message
/// types (a `Tree` with a repeated `Tree children` field) don't send the
/// compiler into infinite recursion.
pub enum FieldKind {
    Scalar {
        rules: ScalarRules,
        /// The rule-id prefix for this scalar kind (`"bool"`,
        /// `"string"`, ...), used to compose ids like `"string.uri"`.
        rule_id_prefix: &'static str,
    },
    Enum {
        rules: EnumRules,
        descriptor: EnumDescriptor,
    },
    Any(AnyRules),
    Message,
    Repeated {
        rules: RepeatedRules,
        item: Option<Box<ItemNode>>,
    },
    Map {
        rules: MapRules,
        key: Option<Box<ItemNode>>,
        value: Option<Box<ItemNode>>,
    },
    None,
}

/// A compiled field: presence/required handling plus a [`FieldKind`] and
/// the field's own `cel` constraints.
pub struct FieldNode {
    pub field: FieldDescriptor,
    pub ignore: Ignore,
    pub required: bool,
    pub constraints: Vec<CompiledConstraint>,
    pub kind: FieldKind,
}

/// A repeated item, map key, or map value's compiled rules: the same
/// [`FieldKind`]/constraint shape as a field, minus presence tracking
/// (an item is always "present" by virtue of existing in the
/// collection).
pub struct ItemNode {
    pub constraints: Vec<CompiledConstraint>,
    pub kind: FieldKind,
}

/// A protobuf `oneof` declaration's compiled rules (just `required`,
/// spec §3's `OneofRules`).
pub struct OneofNode {
    pub oneof: OneofDescriptor,
    pub required: bool,
}

/// A custom cross-field "one of these named fields" rule (spec §3's
/// `MessageOneofRule`), independent of any protobuf `oneof` declaration.
pub struct MessageOneofNode {
    pub fields: Vec<FieldDescriptor>,
    pub required: bool,
}

/// A compiled message: its own `cel` constraints, its fields, its
/// protobuf oneofs, and its custom message-level oneof rules.
pub struct MessageNode {
    pub disabled: bool,
    pub constraints: Vec<CompiledConstraint>,
    pub fields: Vec<FieldNode>,
    pub oneofs: Vec<OneofNode>,
    pub message_oneofs: Vec<MessageOneofNode>,
}

impl MessageNode {
    pub fn evaluate(&self, ctx: &mut RuleContext, msg: &DynamicMessage, factory: &Factory) -> Result<()> {
        if self.disabled {
            tracing::trace!(message = msg.descriptor().full_name(), "message rules disabled, skipping");
            return Ok(());
        }

        let this = ExprValue::Message(std::sync::Arc::new(msg.clone()));
        evaluate_constraints(ctx, &self.constraints, &this)?;

        for field in &self.fields {
            if ctx.should_return() {
                return Ok(());
            }
            field.evaluate(ctx, msg, factory)?;
        }

        for oneof in &self.oneofs {
            if ctx.should_return() {
                return Ok(());
            }
            oneof.evaluate(ctx, msg);
        }

        for mo in &self.message_oneofs {
            if ctx.should_return() {
                return Ok(());
            }
            mo.evaluate(ctx, msg);
        }

        Ok(())
    }
}

impl FieldNode {
    fn path_element(&self) -> FieldPathElement {
        FieldPathElement::new(
            self.field.number() as i32,
            self.field.name(),
            kind_name(&self.field),
        )
    }

    pub fn evaluate(&self, ctx: &mut RuleContext, parent: &DynamicMessage, factory: &Factory) -> Result<()> {
        let value = bridge::bridge_field(parent, &self.field);
        let populated = if self.field.supports_presence() {
            parent.has_field(&self.field)
        } else {
            !value.is_empty_default()
        };

        if self.required && !populated {
            let mark = ctx.mark();
            ctx.add_violation(Violation::new("required", "value is required"));
            ctx.append_field_path_element(mark, self.path_element());
            return Ok(());
        }

        let skip = match self.ignore {
            Ignore::Always => true,
            Ignore::IfUnpopulated => !populated,
            Ignore::IfDefaultValue => value == bridge::bridge_default(&self.field),
            Ignore::Unspecified => false,
        };
        if skip {
            return Ok(());
        }

        let field_element = self.path_element();

        match &self.kind {
            FieldKind::Repeated { rules, item } => {
                evaluate_repeated(ctx, &value, rules, item.as_deref(), &field_element, factory)?;
            }
            FieldKind::Map { rules, key, value: vnode } => {
                evaluate_map(
                    ctx,
                    &value,
                    rules,
                    key.as_deref(),
                    vnode.as_deref(),
                    &field_element,
                    factory,
                )?;
            }
            other => {
                let mark = ctx.mark();
                evaluate_kind(ctx, &value, other, factory)?;
                ctx.append_field_path_element(mark, field_element.clone());
            }
        }

        let mark = ctx.mark();
        evaluate_constraints(ctx, &self.constraints, &value)?;
        ctx.append_field_path_element(mark, field_element);
        Ok(())
    }
}

impl ItemNode {
    pub fn evaluate(&self, ctx: &mut RuleContext, value: &ExprValue, factory: &Factory) -> Result<()> {
        evaluate_kind(ctx, value, &self.kind, factory)?;
        evaluate_constraints(ctx, &self.constraints, value)
    }
}

impl OneofNode {
    pub fn evaluate(&self, ctx: &mut RuleContext, msg: &DynamicMessage) {
        if !self.required {
            return;
        }
        let populated = self.oneof.fields().any(|f| msg.has_field(&f));
        if !populated {
            ctx.add_violation(Violation::new(
                "oneof.required",
                format!("exactly one field of oneof `{}` must be set", self.oneof.name()),
            ));
        }
    }
}

impl MessageOneofNode {
    pub fn evaluate(&self, ctx: &mut RuleContext, msg: &DynamicMessage) {
        let set_count = self.fields.iter().filter(|f| msg.has_field(f)).count();
        let names: Vec<&str> = self.fields.iter().map(|f| f.name()).collect();
        if set_count > 1 {
            ctx.add_violation(Violation::new(
                "message.oneof",
                format!("exactly one of [{}] may be set", names.join(", ")),
            ));
        } else if self.required && set_count == 0 {
            ctx.add_violation(Violation::new(
                "message.oneof.required",
                format!("one of [{}] is required", names.join(", ")),
            ));
        }
    }
}

fn evaluate_kind(ctx: &mut RuleContext, value: &ExprValue, kind: &FieldKind, factory: &Factory) -> Result<()> {
    match kind {
        FieldKind::Scalar { rules, rule_id_prefix } => {
            evaluate_scalar(ctx, value, rules, rule_id_prefix);
            Ok(())
        }
        FieldKind::Enum { rules, descriptor } => {
            evaluate_enum(ctx, value, rules, descriptor);
            Ok(())
        }
        FieldKind::Any(rules) => {
            evaluate_any(ctx, value, rules);
            Ok(())
        }
        FieldKind::Message => {
            if let ExprValue::Message(m) = value {
                let desc = m.descriptor();
                let node = factory.get(&desc).ok_or_else(|| {
                    crate::error::Error::compilation(format!(
                        "message type `{}` was never registered with the factory",
                        desc.full_name()
                    ))
                })?;
                node.evaluate(ctx, m, factory)?;
            }
            Ok(())
        }
        FieldKind::Repeated { .. } | FieldKind::Map { .. } => Ok(()),
        FieldKind::None => Ok(()),
    }
}

fn evaluate_constraints(ctx: &mut RuleContext, constraints: &[CompiledConstraint], this: &ExprValue) -> Result<()> {
    for c in constraints {
        let bindings = Bindings {
            this: Some(this.clone()),
            ..Default::default()
        };
        let value = cel_adapter::evaluate(&c.expr, &bindings)?;
        match cel_adapter::check_constraint(&value)? {
            cel_adapter::ConstraintOutcome::Pass => {}
            cel_adapter::ConstraintOutcome::Fail(override_message) => {
                let message = override_message.unwrap_or_else(|| c.message.clone());
                ctx.add_violation(Violation::new(c.id.clone(), message));
            }
        }
    }
    Ok(())
}

fn expr_to_json(v: &ExprValue) -> serde_json::Value {
    match v {
        ExprValue::Null => serde_json::Value::Null,
        ExprValue::Bool(b) => serde_json::json!(b),
        ExprValue::Int(i) => serde_json::json!(i),
        ExprValue::Uint(u) => serde_json::json!(u),
        ExprValue::Double(d) => serde_json::json!(d),
        ExprValue::String(s) => serde_json::json!(s.as_str()),
        ExprValue::Bytes(b) => serde_json::json!(String::from_utf8_lossy(b)),
        ExprValue::List(items) => serde_json::Value::Array(items.iter().map(expr_to_json).collect()),
        ExprValue::Duration(d) => serde_json::json!({"seconds": d.seconds, "nanos": d.nanos}),
        ExprValue::Timestamp(t) => serde_json::json!({"seconds": t.seconds, "nanos": t.nanos}),
        _ => serde_json::Value::Null,
    }
}

/// Bridges a scalar, duration, or timestamp value to a comparable `f64`
/// for `lt`/`lte`/`gt`/`gte`: durations and timestamps compare as
/// fractional seconds since the epoch (or since zero, for a duration).
fn as_f64(v: &ExprValue) -> Option<f64> {
    match v {
        ExprValue::Int(i) => Some(*i as f64),
        ExprValue::Uint(u) => Some(*u as f64),
        ExprValue::Double(d) => Some(*d),
        ExprValue::Duration(d) => Some(d.seconds as f64 + d.nanos as f64 / 1e9),
        ExprValue::Timestamp(t) => Some(t.seconds as f64 + t.nanos as f64 / 1e9),
        _ => None,
    }
}

fn scalar_len(v: &ExprValue) -> Option<usize> {
    match v {
        ExprValue::String(s) => Some(s.chars().count()),
        ExprValue::Bytes(b) => Some(b.len()),
        _ => None,
    }
}

/// Converts a rule-annotation threshold (always decoded as JSON) into the
/// same [`ScalarCapture`] shape a field value is captured in, so
/// `rule_value` and `field_value` are directly comparable by a caller.
fn json_to_capture(v: &serde_json::Value) -> ScalarCapture {
    match v {
        serde_json::Value::Null => ScalarCapture::Null,
        serde_json::Value::Bool(b) => ScalarCapture::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ScalarCapture::Int(i)
            } else if let Some(u) = n.as_u64() {
                ScalarCapture::Uint(u)
            } else {
                ScalarCapture::Double(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => ScalarCapture::String(s.clone()),
        other => ScalarCapture::String(other.to_string()),
    }
}

fn evaluate_scalar(ctx: &mut RuleContext, value: &ExprValue, rules: &ScalarRules, prefix: &str) {
    let mut violate = |rule: &str, message: String, rule_value: Option<ScalarCapture>| {
        let mut v = Violation::new(format!("{prefix}.{rule}"), message);
        v.field_value = Some(ScalarCapture::from(value));
        v.rule_value = rule_value;
        ctx.add_violation(v);
    };

    if let Some(cv) = &rules.const_value {
        if &expr_to_json(value) != cv {
            violate(
                "const",
                format!("value must equal {cv}"),
                Some(json_to_capture(cv)),
            );
        }
    }
    if let (Some(lt), Some(v)) = (rules.lt.as_ref().and_then(json_f64), as_f64(value)) {
        if v >= lt {
            violate(
                "lt",
                format!("value must be less than {lt}"),
                rules.lt.as_ref().map(json_to_capture),
            );
        }
    }
    if let (Some(lte), Some(v)) = (rules.lte.as_ref().and_then(json_f64), as_f64(value)) {
        if v > lte {
            violate(
                "lte",
                format!("value must be less than or equal to {lte}"),
                rules.lte.as_ref().map(json_to_capture),
            );
        }
    }
    if let (Some(gt), Some(v)) = (rules.gt.as_ref().and_then(json_f64), as_f64(value)) {
        if v <= gt {
            violate(
                "gt",
                format!("value must be greater than {gt}"),
                rules.gt.as_ref().map(json_to_capture),
            );
        }
    }
    if let (Some(gte), Some(v)) = (rules.gte.as_ref().and_then(json_f64), as_f64(value)) {
        if v < gte {
            violate(
                "gte",
                format!("value must be greater than or equal to {gte}"),
                rules.gte.as_ref().map(json_to_capture),
            );
        }
    }
    if !rules.r#in.is_empty() {
        let json = expr_to_json(value);
        if !rules.r#in.iter().any(|v| v == &json) {
            violate("in", "value must be one of the allowed values".to_string(), None);
        }
    }
    if !rules.not_in.is_empty() {
        let json = expr_to_json(value);
        if rules.not_in.iter().any(|v| v == &json) {
            violate(
                "not_in",
                "value must not be one of the disallowed values".to_string(),
                None,
            );
        }
    }
    if let Some(min_len) = rules.min_len {
        if scalar_len(value).map(|l| (l as u64) < min_len).unwrap_or(false) {
            violate(
                "min_len",
                format!("value must have at least {min_len} characters"),
                Some(ScalarCapture::Uint(min_len)),
            );
        }
    }
    if let Some(max_len) = rules.max_len {
        if scalar_len(value).map(|l| (l as u64) > max_len).unwrap_or(false) {
            violate(
                "max_len",
                format!("value must have at most {max_len} characters"),
                Some(ScalarCapture::Uint(max_len)),
            );
        }
    }
    if let (Some(min_bytes), ExprValue::Bytes(b)) = (rules.min_bytes, value) {
        if (b.len() as u64) < min_bytes {
            violate(
                "min_bytes",
                format!("value must have at least {min_bytes} bytes"),
                Some(ScalarCapture::Uint(min_bytes)),
            );
        }
    }
    if let (Some(max_bytes), ExprValue::Bytes(b)) = (rules.max_bytes, value) {
        if (b.len() as u64) > max_bytes {
            violate(
                "max_bytes",
                format!("value must have at most {max_bytes} bytes"),
                Some(ScalarCapture::Uint(max_bytes)),
            );
        }
    }
    if let (Some(pattern), Some(s)) = (&rules.pattern, value.as_str()) {
        match regex::Regex::new(pattern) {
            Ok(re) if !re.is_match(s) => violate(
                "pattern",
                format!("value must match pattern `{pattern}`"),
                Some(ScalarCapture::String(pattern.clone())),
            ),
            _ => {}
        }
    }
    if let (Some(prefix_str), Some(s)) = (&rules.prefix, value.as_str()) {
        if !s.starts_with(prefix_str.as_str()) {
            violate(
                "prefix",
                format!("value must have prefix `{prefix_str}`"),
                Some(ScalarCapture::String(prefix_str.clone())),
            );
        }
    }
    if let (Some(suffix), Some(s)) = (&rules.suffix, value.as_str()) {
        if !s.ends_with(suffix.as_str()) {
            violate(
                "suffix",
                format!("value must have suffix `{suffix}`"),
                Some(ScalarCapture::String(suffix.clone())),
            );
        }
    }
    if let (Some(needle), Some(s)) = (&rules.contains, value.as_str()) {
        if !s.contains(needle.as_str()) {
            violate(
                "contains",
                format!("value must contain `{needle}`"),
                Some(ScalarCapture::String(needle.clone())),
            );
        }
    }
    if let (Some(needle), Some(s)) = (&rules.not_contains, value.as_str()) {
        if s.contains(needle.as_str()) {
            violate(
                "not_contains",
                format!("value must not contain `{needle}`"),
                Some(ScalarCapture::String(needle.clone())),
            );
        }
    }
    if rules.email {
        if let Some(s) = value.as_str() {
            if !address::is_valid_email(s) {
                violate("email", "value must be a valid email address".to_string(), None);
            }
        }
    }
    if rules.hostname {
        if let Some(s) = value.as_str() {
            if !address::is_valid_hostname(s) {
                violate("hostname", "value must be a valid hostname".to_string(), None);
            }
        }
    }
    if rules.ip {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip(s, 0) {
                violate("ip", "value must be a valid IP address".to_string(), None);
            }
        }
    }
    if rules.ipv4 {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip(s, 4) {
                violate("ipv4", "value must be a valid IPv4 address".to_string(), None);
            }
        }
    }
    if rules.ipv6 {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip(s, 6) {
                violate("ipv6", "value must be a valid IPv6 address".to_string(), None);
            }
        }
    }
    if rules.ip_prefix {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip_prefix(s, 0, true) {
                violate("ip_prefix", "value must be a valid IP prefix".to_string(), None);
            }
        }
    }
    if rules.ipv4_prefix {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip_prefix(s, 4, true) {
                violate("ipv4_prefix", "value must be a valid IPv4 prefix".to_string(), None);
            }
        }
    }
    if rules.ipv6_prefix {
        if let Some(s) = value.as_str() {
            if !address::is_valid_ip_prefix(s, 6, true) {
                violate("ipv6_prefix", "value must be a valid IPv6 prefix".to_string(), None);
            }
        }
    }
    if rules.uri {
        if let Some(s) = value.as_str() {
            if !address::is_valid_uri(s) {
                violate("uri", "value must be a valid URI".to_string(), None);
            }
        }
    }
    if rules.uri_ref {
        if let Some(s) = value.as_str() {
            if !address::is_valid_uri_reference(s) {
                violate("uri_ref", "value must be a valid URI reference".to_string(), None);
            }
        }
    }
    if rules.host_and_port {
        if let Some(s) = value.as_str() {
            if !address::is_valid_host_and_port(s, false) {
                violate("host_and_port", "value must be a valid host:port".to_string(), None);
            }
        }
    }
}

fn json_f64(v: &serde_json::Value) -> Option<f64> {
    v.as_f64()
}

fn evaluate_enum(ctx: &mut RuleContext, value: &ExprValue, rules: &EnumRules, descriptor: &EnumDescriptor) {
    let Some(n) = value.as_int() else { return };
    let n = n as i32;
    if let Some(cv) = rules.const_value {
        if n != cv {
            ctx.add_violation(Violation::new("enum.const", "value does not match the required const value"));
        }
    }
    if rules.defined_only && descriptor.get_value(n).is_none() {
        ctx.add_violation(Violation::new("enum.defined_only", "value is not one of the defined enum values"));
    }
    if !rules.r#in.is_empty() && !rules.r#in.contains(&n) {
        ctx.add_violation(Violation::new("enum.in", "value must be one of the allowed values"));
    }
    if rules.not_in.contains(&n) {
        ctx.add_violation(Violation::new("enum.not_in", "value must not be one of the disallowed values"));
    }
}

fn evaluate_any(ctx: &mut RuleContext, value: &ExprValue, rules: &AnyRules) {
    let ExprValue::Message(m) = value else { return };
    let Some(type_url_field) = m.descriptor().get_field_by_name("type_url") else {
        return;
    };
    let type_url = m
        .get_field(&type_url_field)
        .as_str()
        .unwrap_or_default()
        .to_string();
    if !rules.r#in.is_empty() && !rules.r#in.iter().any(|u| u == &type_url) {
        ctx.add_violation(Violation::new("any.in", "message type is not in the allowed set"));
    }
    if rules.not_in.iter().any(|u| u == &type_url) {
        ctx.add_violation(Violation::new("any.not_in", "message type is in the disallowed set"));
    }
}

fn evaluate_repeated(
    ctx: &mut RuleContext,
    value: &ExprValue,
    rules: &RepeatedRules,
    item: Option<&ItemNode>,
    field_element: &FieldPathElement,
    factory: &Factory,
) -> Result<()> {
    let ExprValue::List(items) = value else { return Ok(()) };

    let container_mark = ctx.mark();
    if let Some(min) = rules.min_items {
        if (items.len() as u64) < min {
            ctx.add_violation(Violation::new("repeated.min_items", "repeated field has too few items"));
        }
    }
    if let Some(max) = rules.max_items {
        if (items.len() as u64) > max {
            ctx.add_violation(Violation::new("repeated.max_items", "repeated field has too many items"));
        }
    }
    if rules.unique {
        let mut seen = HashSet::new();
        for it in items.iter() {
            if !seen.insert(expr_to_json(it).to_string()) {
                ctx.add_violation(Violation::new("repeated.unique", "repeated value must contain unique items"));
                break;
            }
        }
    }
    ctx.append_field_path_element(container_mark, field_element.clone());

    if let Some(item_node) = item {
        for (idx, it) in items.iter().enumerate() {
            if ctx.should_return() {
                break;
            }
            let mark = ctx.mark();
            item_node.evaluate(ctx, it, factory)?;
            ctx.append_field_path_element(mark, field_element.clone().with_index(idx as u64));
        }
    }
    Ok(())
}

fn evaluate_map(
    ctx: &mut RuleContext,
    value: &ExprValue,
    rules: &MapRules,
    key_node: Option<&ItemNode>,
    value_node: Option<&ItemNode>,
    field_element: &FieldPathElement,
    factory: &Factory,
) -> Result<()> {
    let ExprValue::Map(map) = value else { return Ok(()) };

    let container_mark = ctx.mark();
    if let Some(min) = rules.min_pairs {
        if (map.len() as u64) < min {
            ctx.add_violation(Violation::new("map.min_pairs", "map has too few entries"));
        }
    }
    if let Some(max) = rules.max_pairs {
        if (map.len() as u64) > max {
            ctx.add_violation(Violation::new("map.max_pairs", "map has too many entries"));
        }
    }
    ctx.append_field_path_element(container_mark, field_element.clone());

    for (k, v) in map.iter() {
        if ctx.should_return() {
            break;
        }
        let path_key = bridge::key_to_path_key(k);
        if let Some(key_node) = key_node {
            let mark = ctx.mark();
            key_node.evaluate(ctx, &bridge::map_key_to_expr_value(k), factory)?;
            ctx.mark_for_key(mark);
            ctx.append_field_path_element(mark, field_element.clone().with_key(path_key.clone()));
        }
        if let Some(value_node) = value_node {
            let mark = ctx.mark();
            value_node.evaluate(ctx, v, factory)?;
            ctx.append_field_path_element(mark, field_element.clone().with_key(path_key));
        }
    }
    Ok(())
}

fn kind_name(field: &FieldDescriptor) -> String {
    format!("{:?}", field.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::DescriptorPool;
    use prost_types::{DescriptorProto, FileDescriptorProto, FileDescriptorSet};

    fn empty_message() -> DynamicMessage {
        let message = DescriptorProto {
            name: Some("Empty".to_string()),
            ..Default::default()
        };
        let file = FileDescriptorProto {
            name: Some("node_tests.proto".to_string()),
            package: Some("node_tests".to_string()),
            message_type: vec![message],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };
        let pool = DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
            .expect("valid descriptor set");
        let descriptor = pool.get_message_by_name("node_tests.Empty").unwrap();
        DynamicMessage::new(descriptor)
    }

    fn constraint(id: &str, message: &str, expression: &str) -> CompiledConstraint {
        CompiledConstraint {
            id: id.to_string(),
            message: message.to_string(),
            expr: cel_adapter::compile(expression).unwrap(),
        }
    }

    /// Three message-level `cel` constraints fire, in declaration order,
    /// before any field node runs.
    #[test]
    fn message_constraints_run_depth_first_in_declared_order() {
        let msg = empty_message();
        let node = MessageNode {
            disabled: false,
            constraints: vec![
                constraint("message_expression_scalar", "a must be less than b", "false"),
                constraint("message_expression_enum", "c must not equal d", "false"),
                constraint("message_expression_nested", "a must be greater than b", "false"),
            ],
            fields: Vec::new(),
            oneofs: Vec::new(),
            message_oneofs: Vec::new(),
        };

        let factory = Factory::new();
        let mut ctx = RuleContext::new(false);
        node.evaluate(&mut ctx, &msg, &factory).unwrap();
        let violations = ctx.finalize();

        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0].rule_id, "message_expression_scalar");
        assert_eq!(violations[0].message, "a must be less than b");
        assert_eq!(violations[1].rule_id, "message_expression_enum");
        assert_eq!(violations[1].message, "c must not equal d");
        assert_eq!(violations[2].rule_id, "message_expression_nested");
        assert_eq!(violations[2].message, "a must be greater than b");
    }

    #[test]
    fn disabled_message_produces_no_violations() {
        let msg = empty_message();
        let node = MessageNode {
            disabled: true,
            constraints: vec![constraint("x", "unreachable", "false")],
            fields: Vec::new(),
            oneofs: Vec::new(),
            message_oneofs: Vec::new(),
        };
        let factory = Factory::new();
        let mut ctx = RuleContext::new(false);
        node.evaluate(&mut ctx, &msg, &factory).unwrap();
        assert!(ctx.finalize().is_empty());
    }
}
