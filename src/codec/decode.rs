// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use super::stream::{read, SliceReader};
use super::BinaryCodec;
use crate::builtin::BuiltInType;
use crate::descriptor::{FieldDescriptor, TypeDescriptor, TypeRef};
use crate::error::{Result, TypeError};
use crate::extension::ExtensionContainer;
use crate::registry::MAX_OPTIONAL_FIELDS;
use crate::value::{EnumValue, Record, Value};
use log::warn;
use opcua_types::status_code::StatusCode;
use opcua_types::{
    ByteString, DateTime, DecodingOptions, ExpandedNodeId, Guid, LocalizedText,
    NodeId, QualifiedName, UAString,
};

impl<'a> BinaryCodec<'a> {
    pub(crate) fn decode_record(
        &self,
        stream: &mut SliceReader<'_>,
        type_id: &NodeId,
        depth: usize,
    ) -> Result<Record> {
        self.check_depth(depth, TypeError::Decode)?;
        let s = self.registry.resolve_structure(type_id)?;
        if s.is_abstract {
            return Err(TypeError::Decode(format!(
                "{} is abstract and has no encoding",
                s.name
            )));
        }
        let fields = self.registry.effective_fields(type_id)?;
        let mut record = Record::new();
        if s.is_union() {
            let switch: u32 = read(stream, &self.decoding_options)?;
            if switch as usize > fields.len() {
                return Err(TypeError::Decode(format!(
                    "switch field {} of union {} is out of range",
                    switch, s.name
                )));
            }
            if switch > 0 {
                let f = &fields[switch as usize - 1];
                let v = self.decode_field(stream, f, depth)?;
                record.set(f.name.clone(), v);
            }
            return Ok(record);
        }
        let optional_count = fields.iter().filter(|f| f.is_optional).count();
        if optional_count > MAX_OPTIONAL_FIELDS {
            return Err(TypeError::Decode(format!(
                "{} has {} optional fields, the encoding mask holds {}",
                s.name, optional_count, MAX_OPTIONAL_FIELDS
            )));
        }
        let mask: u32 = if optional_count > 0 {
            read(stream, &self.decoding_options)?
        } else {
            0
        };
        if optional_count < 32 && mask >> optional_count != 0 {
            return Err(TypeError::Decode(format!(
                "encoding mask {:#x} of {} sets reserved bits",
                mask, s.name
            )));
        }
        let mut bit = 0;
        for f in &fields {
            if f.is_optional {
                let present = mask & (1 << bit) != 0;
                bit += 1;
                if !present {
                    continue;
                }
            }
            let v = self.decode_field(stream, f, depth)?;
            record.set(f.name.clone(), v);
        }
        Ok(record)
    }

    fn decode_field(
        &self,
        stream: &mut SliceReader<'_>,
        field: &FieldDescriptor,
        depth: usize,
    ) -> Result<Value> {
        if !field.is_array {
            return self.decode_scalar(stream, &field.type_ref, depth);
        }
        let len: i32 = read(stream, &self.decoding_options)?;
        if len == -1 {
            return Ok(Value::Array(Vec::new()));
        }
        if len < -1 {
            return Err(TypeError::Decode(format!(
                "invalid array length {} of field {}",
                len, field.name
            )));
        }
        let len = len as usize;
        if len > self.decoding_options.max_array_length {
            return Err(TypeError::Decode(format!(
                "array length {} of field {} exceeds the limit {}",
                len, field.name, self.decoding_options.max_array_length
            )));
        }
        let min = self.min_wire_size(&field.type_ref);
        if min > 0 {
            stream.ensure_available(len.saturating_mul(min))?;
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.decode_scalar(stream, &field.type_ref, depth)?);
        }
        Ok(Value::Array(items))
    }

    /// Least number of bytes one value of the type takes on the wire,
    /// 0 for structures since one without fields encodes to nothing
    fn min_wire_size(&self, type_ref: &TypeRef) -> usize {
        match type_ref {
            TypeRef::BuiltIn(BuiltInType::String) | TypeRef::BuiltIn(BuiltInType::ByteString) => 4,
            // null NodeId and the body byte
            TypeRef::BuiltIn(BuiltInType::ExtensionObject) => 3,
            TypeRef::BuiltIn(b) => b.fixed_size().unwrap_or(1),
            TypeRef::Type(id) => match self.registry.resolve(id) {
                Ok(TypeDescriptor::Enumeration(_)) => 4,
                Ok(TypeDescriptor::Structure(s)) if s.is_abstract => 3,
                _ => 0,
            },
        }
    }

    pub(crate) fn decode_scalar(
        &self,
        stream: &mut SliceReader<'_>,
        type_ref: &TypeRef,
        depth: usize,
    ) -> Result<Value> {
        match type_ref {
            TypeRef::BuiltIn(BuiltInType::ExtensionObject) => {
                let c = ExtensionContainer::decode_inner(self, stream, depth + 1)?;
                Ok(Value::Extension(Box::new(c)))
            }
            TypeRef::BuiltIn(b) => decode_builtin(stream, *b, &self.decoding_options),
            TypeRef::Type(id) => match self.registry.resolve(id)? {
                TypeDescriptor::Enumeration(e) => {
                    let v: i32 = read(stream, &self.decoding_options)?;
                    let ev = EnumValue::from_value(e, v);
                    if !ev.is_recognized() {
                        warn!("Value {} is not a member of enumeration {}", v, e.name);
                    }
                    Ok(Value::Enumeration(ev))
                }
                TypeDescriptor::Structure(s) if s.is_abstract => {
                    let c = ExtensionContainer::decode_inner(self, stream, depth + 1)?;
                    if !c.is_empty() && self.registry.contains(c.type_id()) {
                        if !self.registry.is_subtype_of(c.type_id(), id)? {
                            return Err(TypeError::Decode(format!(
                                "{} does not extend {}",
                                c.type_id(),
                                s.name
                            )));
                        }
                    }
                    Ok(Value::Extension(Box::new(c)))
                }
                TypeDescriptor::Structure(_) => {
                    Ok(Value::Structure(self.decode_record(stream, id, depth + 1)?))
                }
            },
        }
    }
}

fn decode_builtin(
    stream: &mut SliceReader<'_>,
    b: BuiltInType,
    opts: &DecodingOptions,
) -> Result<Value> {
    Ok(match b {
        BuiltInType::Boolean => Value::Boolean(read::<bool>(stream, opts)?),
        BuiltInType::SByte => Value::SByte(read::<i8>(stream, opts)?),
        BuiltInType::Byte => Value::Byte(read::<u8>(stream, opts)?),
        BuiltInType::Int16 => Value::Int16(read::<i16>(stream, opts)?),
        BuiltInType::UInt16 => Value::UInt16(read::<u16>(stream, opts)?),
        BuiltInType::Int32 => Value::Int32(read::<i32>(stream, opts)?),
        BuiltInType::UInt32 => Value::UInt32(read::<u32>(stream, opts)?),
        BuiltInType::Int64 => Value::Int64(read::<i64>(stream, opts)?),
        BuiltInType::UInt64 => Value::UInt64(read::<u64>(stream, opts)?),
        BuiltInType::Float => Value::Float(read::<f32>(stream, opts)?),
        BuiltInType::Double => Value::Double(read::<f64>(stream, opts)?),
        BuiltInType::String => Value::String(read::<UAString>(stream, opts)?),
        BuiltInType::DateTime => Value::DateTime(read::<DateTime>(stream, opts)?),
        BuiltInType::Guid => Value::Guid(read::<Guid>(stream, opts)?),
        BuiltInType::ByteString => Value::ByteString(read::<ByteString>(stream, opts)?),
        BuiltInType::NodeId => Value::NodeId(read::<NodeId>(stream, opts)?),
        BuiltInType::ExpandedNodeId => {
            Value::ExpandedNodeId(read::<ExpandedNodeId>(stream, opts)?)
        }
        BuiltInType::StatusCode => Value::StatusCode(read::<StatusCode>(stream, opts)?),
        BuiltInType::QualifiedName => Value::QualifiedName(read::<QualifiedName>(stream, opts)?),
        BuiltInType::LocalizedText => Value::LocalizedText(read::<LocalizedText>(stream, opts)?),
        BuiltInType::ExtensionObject => {
            return Err(TypeError::Decode(
                "ExtensionObject needs the registry to decode".to_string(),
            ))
        }
    })
}
