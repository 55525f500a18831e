// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use crate::builtin::BuiltInType;
use crate::descriptor::EnumDescriptor;
use crate::extension::ExtensionContainer;
use opcua_types::status_code::StatusCode;
use opcua_types::{
    ByteString, DateTime, ExpandedNodeId, Guid, LocalizedText, NodeId, QualifiedName, UAString,
};

/// Value of an enumeration field
#[derive(Debug, PartialEq, Clone)]
pub enum EnumValue {
    /// A declared member
    Member { name: String, value: i32 },
    /// A value unknown to the local schema, e.g. added by a newer sender
    Unrecognized(i32),
}

impl EnumValue {
    /// Creates a member value, None if the enumeration has no such member
    pub fn member(descriptor: &EnumDescriptor, name: &str) -> Option<Self> {
        descriptor.member_by_name(name).map(|m| Self::Member {
            name: m.name.clone(),
            value: m.value,
        })
    }

    /// Maps an integer read from the wire
    pub fn from_value(descriptor: &EnumDescriptor, value: i32) -> Self {
        match descriptor.member_by_value(value) {
            Some(m) => Self::Member {
                name: m.name.clone(),
                value,
            },
            None => Self::Unrecognized(value),
        }
    }

    pub const fn value(&self) -> i32 {
        match self {
            Self::Member { value, .. } => *value,
            Self::Unrecognized(v) => *v,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Member { name, .. } => Some(name),
            Self::Unrecognized(_) => None,
        }
    }

    pub const fn is_recognized(&self) -> bool {
        matches!(self, Self::Member { .. })
    }
}

/// A field value
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(UAString),
    DateTime(DateTime),
    Guid(Guid),
    ByteString(ByteString),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    /// A nested structure or union of the field's declared type
    Structure(Record),
    Enumeration(EnumValue),
    /// A structure of any concrete type, used for abstract field types
    Extension(Box<ExtensionContainer>),
    Array(Vec<Value>),
}

/// A LocalizedText leaves empty parts out of its encoding, they come back as null
fn same_text(a: &UAString, b: &UAString) -> bool {
    a.value().as_deref().unwrap_or("") == b.value().as_deref().unwrap_or("")
}

/// Floats compare by bit pattern, so a NaN survives the round trip check
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::SByte(a), Value::SByte(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::ByteString(a), Value::ByteString(b)) => a == b,
            (Value::NodeId(a), Value::NodeId(b)) => a == b,
            (Value::ExpandedNodeId(a), Value::ExpandedNodeId(b)) => a == b,
            (Value::StatusCode(a), Value::StatusCode(b)) => a == b,
            (Value::QualifiedName(a), Value::QualifiedName(b)) => a == b,
            (Value::LocalizedText(a), Value::LocalizedText(b)) => {
                same_text(&a.locale, &b.locale) && same_text(&a.text, &b.text)
            }
            (Value::Structure(a), Value::Structure(b)) => a == b,
            (Value::Enumeration(a), Value::Enumeration(b)) => a == b,
            (Value::Extension(a), Value::Extension(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Built-in type the value carries directly, None for composites
    pub fn builtin_type(&self) -> Option<BuiltInType> {
        Some(match self {
            Value::Boolean(_) => BuiltInType::Boolean,
            Value::SByte(_) => BuiltInType::SByte,
            Value::Byte(_) => BuiltInType::Byte,
            Value::Int16(_) => BuiltInType::Int16,
            Value::UInt16(_) => BuiltInType::UInt16,
            Value::Int32(_) => BuiltInType::Int32,
            Value::UInt32(_) => BuiltInType::UInt32,
            Value::Int64(_) => BuiltInType::Int64,
            Value::UInt64(_) => BuiltInType::UInt64,
            Value::Float(_) => BuiltInType::Float,
            Value::Double(_) => BuiltInType::Double,
            Value::String(_) => BuiltInType::String,
            Value::DateTime(_) => BuiltInType::DateTime,
            Value::Guid(_) => BuiltInType::Guid,
            Value::ByteString(_) => BuiltInType::ByteString,
            Value::NodeId(_) => BuiltInType::NodeId,
            Value::ExpandedNodeId(_) => BuiltInType::ExpandedNodeId,
            Value::StatusCode(_) => BuiltInType::StatusCode,
            Value::QualifiedName(_) => BuiltInType::QualifiedName,
            Value::LocalizedText(_) => BuiltInType::LocalizedText,
            Value::Extension(_) => BuiltInType::ExtensionObject,
            Value::Structure(_) | Value::Enumeration(_) | Value::Array(_) => return None,
        })
    }

    /// Short description used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Structure(_) => "Structure",
            Value::Enumeration(_) => "Enumeration",
            Value::Array(_) => "Array",
            _ => self.builtin_type().map_or("Unknown", BuiltInType::name),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Structure(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enumeration(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from!(bool, Boolean);
impl_from!(i8, SByte);
impl_from!(u8, Byte);
impl_from!(i16, Int16);
impl_from!(u16, UInt16);
impl_from!(i32, Int32);
impl_from!(u32, UInt32);
impl_from!(i64, Int64);
impl_from!(u64, UInt64);
impl_from!(f32, Float);
impl_from!(f64, Double);
impl_from!(UAString, String);
impl_from!(DateTime, DateTime);
impl_from!(Guid, Guid);
impl_from!(ByteString, ByteString);
impl_from!(NodeId, NodeId);
impl_from!(ExpandedNodeId, ExpandedNodeId);
impl_from!(StatusCode, StatusCode);
impl_from!(QualifiedName, QualifiedName);
impl_from!(LocalizedText, LocalizedText);
impl_from!(Record, Structure);
impl_from!(EnumValue, Enumeration);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(UAString::from(v))
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::DateTime(DateTime::from(v))
    }
}

impl From<ExtensionContainer> for Value {
    fn from(v: ExtensionContainer) -> Self {
        Value::Extension(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Field values of one structure instance.
/// Absent optional fields are simply not present. Equality ignores the order of entries.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder style `set`
    pub fn with<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replaces the value in place if it exists
    pub fn set<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .all(|(n, v)| other.get(n).map_or(false, |o| o == v))
    }
}
