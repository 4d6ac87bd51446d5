//! The rule compiler (spec §4.E): walks a schema descriptor and turns its
//! attached annotations into the [`crate::node`] tree [`crate::factory::Factory`]
//! caches and [`crate::node::MessageNode::evaluate`] walks.

use prost_reflect::{FieldDescriptor, Kind, MessageDescriptor};

use crate::annotations;
use crate::cel_adapter;
use crate::error::{Error, Result};
use crate::node::{
    CompiledConstraint, FieldKind, FieldNode, ItemNode, MessageNode, MessageOneofNode, OneofNode,
};
use crate::rules::{ext, Constraint, FieldRules, RuleCase};

/// Compiles a message descriptor's rules into a [`MessageNode`]. Nested
/// message-typed fields are *not* recursively compiled here — they are
/// resolved lazily through the factory cache at evaluation time, so a
/// self-referential schema never sends the compiler into infinite
/// recursion (spec §4.D, §4.G).
#[tracing::instrument(skip(desc), fields(message = desc.full_name()))]
pub fn compile_message(desc: &MessageDescriptor, allow_unknown_fields: bool) -> Result<MessageNode> {
    if annotations::has_unresolved_rule_fields(&desc.options(), ext::MESSAGE_RULES_FIELD_NUMBER) {
        if !allow_unknown_fields {
            return Err(Error::compilation(format!(
                "message `{}` has unresolved rule annotation fields",
                desc.full_name()
            )));
        }
        tracing::warn!(
            message = desc.full_name(),
            "tolerating unresolved rule annotation fields"
        );
    }
    let mr = annotations::message_rules(desc)?.unwrap_or_default();
    let constraints = compile_constraints(&mr.cel)?;

    let message_oneofs = mr
        .oneof
        .iter()
        .map(|rule| {
            let fields = rule
                .fields
                .iter()
                .map(|name| {
                    desc.get_field_by_name(name).ok_or_else(|| {
                        Error::compilation(format!(
                            "message `{}` oneof rule references unknown field `{name}`",
                            desc.full_name()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(MessageOneofNode {
                fields,
                required: rule.required,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut fields = Vec::new();
    for field in desc.fields() {
        fields.push(compile_field(&field, allow_unknown_fields)?);
    }

    let mut oneofs = Vec::new();
    for oneof in desc.oneofs() {
        if let Some(rules) = annotations::oneof_rules(&oneof)? {
            if rules.required {
                oneofs.push(OneofNode {
                    oneof: oneof.clone(),
                    required: true,
                });
            }
        }
    }

    tracing::debug!(
        message = desc.full_name(),
        fields = fields.len(),
        constraints = constraints.len(),
        "compiled message rule node"
    );
    Ok(MessageNode {
        disabled: mr.disabled,
        constraints,
        fields,
        oneofs,
        message_oneofs,
    })
}

fn compile_field(field: &FieldDescriptor, allow_unknown_fields: bool) -> Result<FieldNode> {
    if annotations::has_unresolved_rule_fields(&field.options(), ext::FIELD_RULES_FIELD_NUMBER) {
        if !allow_unknown_fields {
            return Err(Error::compilation(format!(
                "field `{}` has unresolved rule annotation fields",
                field.full_name()
            )));
        }
        tracing::warn!(
            field = field.full_name(),
            "tolerating unresolved rule annotation fields"
        );
    }
    let fr = annotations::field_rules(field)?.unwrap_or_default();
    let constraints = compile_constraints(&fr.cel)?;
    let kind = compile_field_kind(field, &fr, allow_unknown_fields)?;
    Ok(FieldNode {
        field: field.clone(),
        ignore: fr.ignore,
        required: fr.required,
        constraints,
        kind,
    })
}

fn compile_item(field: &FieldDescriptor, item_fr: &FieldRules, allow_unknown_fields: bool) -> Result<ItemNode> {
    let constraints = compile_constraints(&item_fr.cel)?;
    let kind = compile_field_kind(field, item_fr, allow_unknown_fields)?;
    Ok(ItemNode { constraints, kind })
}

fn compile_field_kind(field: &FieldDescriptor, fr: &FieldRules, allow_unknown_fields: bool) -> Result<FieldKind> {
    let Some(case) = fr.case() else {
        return default_kind_for(field, allow_unknown_fields);
    };

    match case {
        RuleCase::Repeated => {
            let rules = fr.repeated.clone().unwrap_or_default();
            let item = match &rules.items {
                Some(item_fr) => Some(Box::new(compile_item(field, item_fr, allow_unknown_fields)?)),
                None => default_item_for(field, allow_unknown_fields)?,
            };
            Ok(FieldKind::Repeated { rules, item })
        }
        RuleCase::Map => {
            let rules = fr.map.clone().unwrap_or_default();
            let key = match &rules.keys {
                Some(key_fr) => Some(Box::new(compile_item(field, key_fr, allow_unknown_fields)?)),
                None => None,
            };
            let value = match &rules.values {
                Some(value_fr) => Some(Box::new(compile_item(field, value_fr, allow_unknown_fields)?)),
                None => default_item_for(field, allow_unknown_fields)?,
            };
            Ok(FieldKind::Map { rules, key, value })
        }
        RuleCase::Any => Ok(FieldKind::Any(fr.any.clone().unwrap_or_default())),
        RuleCase::Enum => match field.kind() {
            Kind::Enum(descriptor) => Ok(FieldKind::Enum {
                rules: fr.enum_.clone().unwrap_or_default(),
                descriptor,
            }),
            _ => Err(Error::compilation(format!(
                "field `{}` carries enum rules but is not an enum",
                field.full_name()
            ))),
        },
        scalar_case => {
            check_scalar_case_matches_field(field, scalar_case)?;
            let rules = fr.scalar_rules(scalar_case).cloned().unwrap_or_default();
            Ok(FieldKind::Scalar {
                rules,
                rule_id_prefix: scalar_case.rule_id_prefix(),
            })
        }
    }
}

fn default_kind_for(field: &FieldDescriptor, allow_unknown_fields: bool) -> Result<FieldKind> {
    if field.is_map() {
        let value = default_item_for(field, allow_unknown_fields)?;
        Ok(FieldKind::Map {
            rules: Default::default(),
            key: None,
            value,
        })
    } else if field.is_list() {
        let item = default_item_for(field, allow_unknown_fields)?;
        Ok(FieldKind::Repeated {
            rules: Default::default(),
            item,
        })
    } else {
        match field.kind() {
            Kind::Message(_) => Ok(FieldKind::Message),
            _ => Ok(FieldKind::None),
        }
    }
}

/// A field/map/repeated whose element type is a message gets recursive
/// validation by default, even with no rule annotation attached to the
/// collection itself — the same default protovalidate applies.
fn default_item_for(field: &FieldDescriptor, _allow_unknown_fields: bool) -> Result<Option<Box<ItemNode>>> {
    match field.kind() {
        Kind::Message(_) => Ok(Some(Box::new(ItemNode {
            constraints: Vec::new(),
            kind: FieldKind::Message,
        }))),
        _ => Ok(None),
    }
}

fn check_scalar_case_matches_field(field: &FieldDescriptor, case: RuleCase) -> Result<()> {
    let matches_primitive = matches!(
        (case, field.kind()),
        (RuleCase::Bool, Kind::Bool)
            | (RuleCase::Float, Kind::Float)
            | (RuleCase::Double, Kind::Double)
            | (RuleCase::Int32, Kind::Int32)
            | (RuleCase::Int64, Kind::Int64)
            | (RuleCase::Uint32, Kind::Uint32)
            | (RuleCase::Uint64, Kind::Uint64)
            | (RuleCase::Sint32, Kind::Sint32)
            | (RuleCase::Sint64, Kind::Sint64)
            | (RuleCase::Fixed32, Kind::Fixed32)
            | (RuleCase::Fixed64, Kind::Fixed64)
            | (RuleCase::Sfixed32, Kind::Sfixed32)
            | (RuleCase::Sfixed64, Kind::Sfixed64)
            | (RuleCase::String, Kind::String)
            | (RuleCase::Bytes, Kind::Bytes)
    );
    if matches_primitive {
        return Ok(());
    }
    if let Kind::Message(m) = field.kind() {
        match case {
            RuleCase::Duration if m.full_name() == "google.protobuf.Duration" => return Ok(()),
            RuleCase::Timestamp if m.full_name() == "google.protobuf.Timestamp" => return Ok(()),
            _ => {
                if let Some(wrapper) = FieldRules::wrapper_type_name(case) {
                    if m.full_name() == wrapper {
                        return Ok(());
                    }
                }
            }
        }
    }
    Err(Error::compilation(format!(
        "rule case {case:?} does not match the type of field `{}`",
        field.full_name()
    )))
}

fn compile_constraints(constraints: &[Constraint]) -> Result<Vec<CompiledConstraint>> {
    constraints
        .iter()
        .map(|c| {
            let expr = cel_adapter::compile(&c.expression)?;
            Ok(CompiledConstraint {
                id: c.id.clone(),
                message: c.message.clone(),
                expr,
            })
        })
        .collect()
}
