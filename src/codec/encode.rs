// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use super::BinaryCodec;
use crate::builtin::BuiltInType;
use crate::descriptor::{EnumDescriptor, FieldDescriptor, TypeDescriptor, TypeRef};
use crate::error::{Result, TypeError};
use crate::extension::{ExtensionBody, ExtensionContainer};
use crate::registry::MAX_OPTIONAL_FIELDS;
use crate::value::{EnumValue, Record, Value};
use opcua_types::{BinaryEncoder, EncodingResult, NodeId};
use std::io::Write;

fn lift(res: EncodingResult<usize>) -> Result<usize> {
    res.map_err(|status| TypeError::Encode(status.to_string()))
}

fn mismatch(expected: &dyn std::fmt::Display, value: &Value) -> TypeError {
    TypeError::Encode(format!("expected {}, found {}", expected, value.kind_name()))
}

/// Prefixes the field name to shape errors
fn in_field(name: &str, err: TypeError) -> TypeError {
    match err {
        TypeError::Encode(msg) => TypeError::Encode(format!("{}: {}", name, msg)),
        err => err,
    }
}

impl<'a> BinaryCodec<'a> {
    pub(crate) fn encode_record<S: Write>(
        &self,
        stream: &mut S,
        record: &Record,
        type_id: &NodeId,
        depth: usize,
    ) -> Result<usize> {
        self.check_depth(depth, TypeError::Encode)?;
        let s = self.registry.resolve_structure(type_id)?;
        if s.is_abstract {
            return Err(TypeError::Encode(format!(
                "{} is abstract, use a concrete subtype",
                s.name
            )));
        }
        let fields = self.registry.effective_fields(type_id)?;
        if let Some(name) = record
            .field_names()
            .find(|n| !fields.iter().any(|f| f.name == *n))
        {
            return Err(TypeError::Encode(format!("{} has no field {}", s.name, name)));
        }
        if s.is_union() {
            return self.encode_union(stream, record, &fields, depth);
        }
        let mut sz = 0;
        let optional: Vec<&FieldDescriptor> = fields.iter().filter(|f| f.is_optional).collect();
        if optional.len() > MAX_OPTIONAL_FIELDS {
            return Err(TypeError::Encode(format!(
                "{} has {} optional fields, the encoding mask holds {}",
                s.name,
                optional.len(),
                MAX_OPTIONAL_FIELDS
            )));
        }
        if !optional.is_empty() {
            let mask = optional
                .iter()
                .enumerate()
                .filter(|(_, f)| record.contains(&f.name))
                .fold(0_u32, |mask, (i, _)| mask | (1 << i));
            sz += lift(mask.encode(stream))?;
        }
        for f in &fields {
            match record.get(&f.name) {
                Some(v) => sz += self.encode_field(stream, f, v, depth)?,
                None if f.is_optional => {}
                None => {
                    return Err(TypeError::Encode(format!(
                        "required field {}.{} is missing",
                        s.name, f.name
                    )))
                }
            }
        }
        Ok(sz)
    }

    fn encode_union<S: Write>(
        &self,
        stream: &mut S,
        record: &Record,
        fields: &[FieldDescriptor],
        depth: usize,
    ) -> Result<usize> {
        if record.len() > 1 {
            return Err(TypeError::Encode(format!(
                "a union holds one field, found {}",
                record.len()
            )));
        }
        let selected = fields
            .iter()
            .enumerate()
            .find_map(|(i, f)| record.get(&f.name).map(|v| (i, f, v)));
        match selected {
            Some((i, f, v)) => {
                let mut sz = lift((i as u32 + 1).encode(stream))?;
                sz += self.encode_field(stream, f, v, depth)?;
                Ok(sz)
            }
            None => lift(0_u32.encode(stream)),
        }
    }

    fn encode_field<S: Write>(
        &self,
        stream: &mut S,
        field: &FieldDescriptor,
        value: &Value,
        depth: usize,
    ) -> Result<usize> {
        let res = if field.is_array {
            match value {
                Value::Array(items) => {
                    let mut sz = lift((items.len() as i32).encode(stream))?;
                    for item in items {
                        sz += self.encode_scalar(stream, item, &field.type_ref, depth)?;
                    }
                    Ok(sz)
                }
                v => Err(mismatch(&format!("array of {}", field.type_ref), v)),
            }
        } else {
            self.encode_scalar(stream, value, &field.type_ref, depth)
        };
        res.map_err(|e| in_field(&field.name, e))
    }

    pub(crate) fn encode_scalar<S: Write>(
        &self,
        stream: &mut S,
        value: &Value,
        type_ref: &TypeRef,
        depth: usize,
    ) -> Result<usize> {
        match type_ref {
            TypeRef::BuiltIn(BuiltInType::ExtensionObject) => match value {
                Value::Extension(c) => c.encode_inner(self, stream, depth + 1),
                v => Err(mismatch(&BuiltInType::ExtensionObject, v)),
            },
            TypeRef::BuiltIn(b) => encode_builtin(stream, value, *b),
            TypeRef::Type(id) => match self.registry.resolve(id)? {
                TypeDescriptor::Enumeration(e) => match value {
                    Value::Enumeration(ev) => encode_enum(stream, e, ev),
                    v => Err(mismatch(&e.name, v)),
                },
                TypeDescriptor::Structure(s) if s.is_abstract => match value {
                    Value::Extension(c) => {
                        self.check_subtype(c, id)?;
                        c.encode_inner(self, stream, depth + 1)
                    }
                    v => Err(mismatch(&format!("ExtensionObject with a {}", s.name), v)),
                },
                TypeDescriptor::Structure(s) => match value {
                    Value::Structure(r) => self.encode_record(stream, r, id, depth + 1),
                    v => Err(mismatch(&s.name, v)),
                },
            },
        }
    }

    /// The content of a polymorphic field has to extend the declared abstract type
    fn check_subtype(&self, container: &ExtensionContainer, ancestor: &NodeId) -> Result<()> {
        if container.is_empty() {
            return Ok(());
        }
        let actual = match self.registry.resolve_encoding(container.type_id()) {
            Ok(d) => d.type_id(),
            // bodies of unknown types are forwarded as received
            Err(_) if matches!(container.body(), ExtensionBody::Encoded(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        if self.registry.is_subtype_of(actual, ancestor)? {
            Ok(())
        } else {
            Err(TypeError::Encode(format!(
                "{} does not extend {}",
                actual, ancestor
            )))
        }
    }
}

fn encode_enum<S: Write>(stream: &mut S, e: &EnumDescriptor, value: &EnumValue) -> Result<usize> {
    match value {
        EnumValue::Member { name, value } => match e.member_by_name(name) {
            Some(m) if m.value == *value => lift(value.encode(stream)),
            _ => Err(TypeError::Encode(format!(
                "{} has no member {} = {}",
                e.name, name, value
            ))),
        },
        EnumValue::Unrecognized(v) => {
            if let Some(m) = e.member_by_value(*v) {
                return Err(TypeError::Encode(format!(
                    "{} is member {} of {}",
                    v, m.name, e.name
                )));
            }
            lift(v.encode(stream))
        }
    }
}

fn encode_builtin<S: Write>(stream: &mut S, value: &Value, b: BuiltInType) -> Result<usize> {
    let res = match (b, value) {
        (BuiltInType::Boolean, Value::Boolean(v)) => v.encode(stream),
        (BuiltInType::SByte, Value::SByte(v)) => v.encode(stream),
        (BuiltInType::Byte, Value::Byte(v)) => v.encode(stream),
        (BuiltInType::Int16, Value::Int16(v)) => v.encode(stream),
        (BuiltInType::UInt16, Value::UInt16(v)) => v.encode(stream),
        (BuiltInType::Int32, Value::Int32(v)) => v.encode(stream),
        (BuiltInType::UInt32, Value::UInt32(v)) => v.encode(stream),
        (BuiltInType::Int64, Value::Int64(v)) => v.encode(stream),
        (BuiltInType::UInt64, Value::UInt64(v)) => v.encode(stream),
        (BuiltInType::Float, Value::Float(v)) => v.encode(stream),
        (BuiltInType::Double, Value::Double(v)) => v.encode(stream),
        (BuiltInType::String, Value::String(v)) => v.encode(stream),
        (BuiltInType::DateTime, Value::DateTime(v)) => v.encode(stream),
        (BuiltInType::Guid, Value::Guid(v)) => v.encode(stream),
        (BuiltInType::ByteString, Value::ByteString(v)) => v.encode(stream),
        (BuiltInType::NodeId, Value::NodeId(v)) => v.encode(stream),
        (BuiltInType::ExpandedNodeId, Value::ExpandedNodeId(v)) => v.encode(stream),
        (BuiltInType::StatusCode, Value::StatusCode(v)) => v.encode(stream),
        (BuiltInType::QualifiedName, Value::QualifiedName(v)) => v.encode(stream),
        (BuiltInType::LocalizedText, Value::LocalizedText(v)) => v.encode(stream),
        (b, v) => return Err(mismatch(&b, v)),
    };
    lift(res)
}
