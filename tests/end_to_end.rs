//! Exercises the public API against a schema built directly from
//! `prost_types::FileDescriptorProto`, the way `prost-reflect`'s own test
//! suite constructs descriptors without a `build.rs` step.

use prost_reflect::{DescriptorPool, DynamicMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use rule_engine::Factory;

fn simple_field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn build_pool() -> DescriptorPool {
    let message = DescriptorProto {
        name: Some("Simple".to_string()),
        field: vec![
            simple_field("val", 1, Type::Bool),
            simple_field("name", 2, Type::String),
        ],
        ..Default::default()
    };
    let file = FileDescriptorProto {
        name: Some("rule_engine_test.proto".to_string()),
        package: Some("rule_engine.test".to_string()),
        message_type: vec![message],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
        .expect("valid descriptor set")
}

#[test]
fn message_with_no_rule_annotations_validates_successfully() {
    let pool = build_pool();
    let descriptor = pool
        .get_message_by_name("rule_engine.test.Simple")
        .expect("message registered");
    let message = DynamicMessage::new(descriptor);

    let factory = Factory::new();
    let validator = factory.new_validator(false);
    let result = validator.validate(&message).expect("validation runs cleanly");

    assert!(result.success());
    assert_eq!(result.size(), 0);
}

#[test]
fn factory_caches_compiled_rules_across_validators() {
    let pool = build_pool();
    let descriptor = pool
        .get_message_by_name("rule_engine.test.Simple")
        .expect("message registered");
    let message = DynamicMessage::new(descriptor.clone());

    let factory = Factory::new();
    factory.add(&descriptor).expect("compiles once");
    let first = factory.get(&descriptor).expect("cached after add");
    let second = factory.get(&descriptor).expect("reuses cache");
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let validator = factory.new_validator(false);
    assert!(validator.validate(&message).unwrap().success());
}

/// Minimal protobuf wire-format encoding helpers, used below to attach a
/// real rule-annotation extension (field number 1159, matching
/// `rule_engine::rules::ext::FIELD_RULES_FIELD_NUMBER`) to a field's
/// options. Built by hand instead of through `prost_types`' typed
/// `FieldOptions`/`FieldDescriptorProto` structs, since those expose no
/// field slot for an extension number they don't know about; encoding
/// the schema and its extension value as one raw byte stream and handing
/// it to `DescriptorPool::decode` is the same path `conformance.rs` uses
/// for externally-supplied descriptor sets.
mod wire {
    pub fn varint(mut n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut b = (n & 0x7f) as u8;
            n >>= 7;
            if n != 0 {
                b |= 0x80;
            }
            out.push(b);
            if n == 0 {
                break;
            }
        }
        out
    }

    fn tag(field: u32, wire_type: u8) -> Vec<u8> {
        varint(((field as u64) << 3) | wire_type as u64)
    }

    pub fn varint_field(field: u32, value: u64) -> Vec<u8> {
        let mut out = tag(field, 0);
        out.extend(varint(value));
        out
    }

    pub fn len_field(field: u32, body: &[u8]) -> Vec<u8> {
        let mut out = tag(field, 2);
        out.extend(varint(body.len() as u64));
        out.extend_from_slice(body);
        out
    }

    pub fn string_field(field: u32, s: &str) -> Vec<u8> {
        len_field(field, s.as_bytes())
    }
}

/// A `FieldDescriptorProto`-shaped byte blob: every parameter maps
/// directly onto that message's own field numbers (`name`=1,
/// `extendee`=2, `number`=3, `label`=4, `type`=5, `type_name`=6,
/// `options`=8, `json_name`=10).
#[allow(clippy::too_many_arguments)]
fn field_descriptor_bytes(
    name: &str,
    extendee: Option<&str>,
    number: i32,
    label: i32,
    field_type: i32,
    type_name: Option<&str>,
    json_name: &str,
    options: Option<&[u8]>,
) -> Vec<u8> {
    let mut out = wire::string_field(1, name);
    if let Some(extendee) = extendee {
        out.extend(wire::string_field(2, extendee));
    }
    out.extend(wire::varint_field(3, number as u64));
    out.extend(wire::varint_field(4, label as u64));
    out.extend(wire::varint_field(5, field_type as u64));
    if let Some(type_name) = type_name {
        out.extend(wire::string_field(6, type_name));
    }
    if let Some(options) = options {
        out.extend(wire::len_field(8, options));
    }
    out.extend(wire::string_field(10, json_name));
    out
}

/// A `DescriptorProto`-shaped byte blob (`name`=1, `field`=2).
fn descriptor_bytes(name: &str, fields: &[Vec<u8>]) -> Vec<u8> {
    let mut out = wire::string_field(1, name);
    for field in fields {
        out.extend(wire::len_field(2, field));
    }
    out
}

/// Builds a schema with one message (`Target`, a single bool field `val`)
/// whose field carries a real `(rule_engine.test.ext.rules)` extension at
/// field number 1159 declaring `bool_.const_value = true`, and drives a
/// `false`-valued message through `Factory::add`/`Validator::validate` to
/// produce a genuine `bool.const` violation end to end.
#[test]
fn field_rules_extension_produces_a_real_violation() {
    const FIELD_RULES_FIELD_NUMBER: i32 = 1159;

    // `BoolRules` { bool const_value = 1; } — the scalar predicate block.
    let const_value_field = field_descriptor_bytes(
        "const_value",
        None,
        1,
        Label::Optional as i32,
        Type::Bool as i32,
        None,
        "const_value",
        None,
    );
    let bool_rules_descriptor = descriptor_bytes("BoolRules", &[const_value_field]);

    // `Rules` { BoolRules bool_ = 1; } — the per-field-kind rule case.
    let bool_field = field_descriptor_bytes(
        "bool_",
        None,
        1,
        Label::Optional as i32,
        Type::Message as i32,
        Some(".rule_engine.test.ext.BoolRules"),
        "bool_",
        None,
    );
    let rules_descriptor = descriptor_bytes("Rules", &[bool_field]);

    // The extension itself: `extend google.protobuf.FieldOptions { Rules rules = 1159; }`.
    let extension_descriptor = field_descriptor_bytes(
        "rules",
        Some(".google.protobuf.FieldOptions"),
        FIELD_RULES_FIELD_NUMBER,
        Label::Optional as i32,
        Type::Message as i32,
        Some(".rule_engine.test.ext.Rules"),
        "rules",
        None,
    );

    // The extension *value* attached to `Target.val`: a `Rules` instance
    // with `bool_ = BoolRules { const_value: true }`.
    let bool_rules_value = wire::varint_field(1, 1); // const_value = true
    let rules_value = wire::len_field(1, &bool_rules_value); // bool_ = <BoolRules>
    let field_options_value = wire::len_field(FIELD_RULES_FIELD_NUMBER as u32, &rules_value);

    let val_field = field_descriptor_bytes(
        "val",
        None,
        1,
        Label::Optional as i32,
        Type::Bool as i32,
        None,
        "val",
        Some(&field_options_value),
    );
    let target_descriptor = descriptor_bytes("Target", &[val_field]);

    let mut file = wire::string_field(1, "rule_engine_ext_test.proto");
    file.extend(wire::string_field(2, "rule_engine.test.ext"));
    for message in [&bool_rules_descriptor, &rules_descriptor, &target_descriptor] {
        file.extend(wire::len_field(4, message));
    }
    file.extend(wire::len_field(7, &extension_descriptor));
    file.extend(wire::string_field(12, "proto3"));

    let file_descriptor_set = wire::len_field(1, &file);

    let pool = DescriptorPool::decode(file_descriptor_set.as_slice()).expect("valid descriptor set");
    let descriptor = pool
        .get_message_by_name("rule_engine.test.ext.Target")
        .expect("message registered");

    let mut message = DynamicMessage::new(descriptor.clone());
    message.set_field_by_name("val", Value::Bool(false));

    let factory = Factory::new();
    factory.add(&descriptor).expect("compiles cleanly");
    let validator = factory.new_validator(false);
    let result = validator.validate(&message).expect("validation runs");

    assert_eq!(result.size(), 1);
    let violation = result.violation_at(0).expect("one violation");
    assert_eq!(violation.rule_id, "bool.const");
    assert_eq!(violation.message, "value must equal true");
    assert_eq!(violation.field_path.to_string(), "val");
}
