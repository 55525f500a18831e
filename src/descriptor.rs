// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use crate::builtin::BuiltInType;
use opcua_types::NodeId;
use std::fmt;

/// Semantic type of a field
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum TypeRef {
    /// A built-in type
    BuiltIn(BuiltInType),
    /// A registered structure or enumeration
    Type(NodeId),
}

impl From<BuiltInType> for TypeRef {
    fn from(b: BuiltInType) -> Self {
        Self::BuiltIn(b)
    }
}

impl From<NodeId> for TypeRef {
    fn from(id: NodeId) -> Self {
        Self::Type(id)
    }
}

impl From<&NodeId> for TypeRef {
    fn from(id: &NodeId) -> Self {
        Self::Type(id.clone())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::BuiltIn(b) => write!(f, "{}", b),
            TypeRef::Type(id) => write!(f, "{}", id),
        }
    }
}

/// Describes one field of a structure
#[derive(Debug, PartialEq, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_ref: TypeRef,
    pub is_array: bool,
    pub is_optional: bool,
}

impl FieldDescriptor {
    pub fn new<N: Into<String>, T: Into<TypeRef>>(name: N, type_ref: T) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            is_array: false,
            is_optional: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Mirrors the StructureType enumeration (i=98) for the layouts this crate encodes.
/// StructureWithOptionalFields is implied by any optional field.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StructureKind {
    Structure,
    Union,
}

/// Describes a structured DataType
#[derive(Debug, PartialEq, Clone)]
pub struct StructureDescriptor {
    pub type_id: NodeId,
    pub name: String,
    /// Structure this one extends, the abstract roots Structure and Union are not listed
    pub parent: Option<NodeId>,
    /// Own fields in declaration order, inherited fields are resolved by the registry
    pub fields: Vec<FieldDescriptor>,
    pub is_abstract: bool,
    pub kind: StructureKind,
    /// Node id of the "Default Binary" encoding object, used as ExtensionObject type id
    pub binary_encoding_id: Option<NodeId>,
}

impl StructureDescriptor {
    /// Id written into ExtensionObjects, falls back to the DataType id
    pub fn encoding_id(&self) -> &NodeId {
        self.binary_encoding_id.as_ref().unwrap_or(&self.type_id)
    }

    pub fn is_union(&self) -> bool {
        self.kind == StructureKind::Union
    }
}

/// One named value of an enumeration
#[derive(Debug, PartialEq, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
}

/// Describes an enumerated DataType
#[derive(Debug, PartialEq, Clone)]
pub struct EnumDescriptor {
    pub type_id: NodeId,
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDescriptor {
    /// First member carrying the value
    pub fn member_by_value(&self, value: i32) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A registered DataType
#[derive(Debug, PartialEq, Clone)]
pub enum TypeDescriptor {
    Structure(StructureDescriptor),
    Enumeration(EnumDescriptor),
}

impl TypeDescriptor {
    pub fn type_id(&self) -> &NodeId {
        match self {
            TypeDescriptor::Structure(s) => &s.type_id,
            TypeDescriptor::Enumeration(e) => &e.type_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Structure(s) => &s.name,
            TypeDescriptor::Enumeration(e) => &e.name,
        }
    }

    pub fn as_structure(&self) -> Option<&StructureDescriptor> {
        match self {
            TypeDescriptor::Structure(s) => Some(s),
            TypeDescriptor::Enumeration(_) => None,
        }
    }

    pub fn as_enumeration(&self) -> Option<&EnumDescriptor> {
        match self {
            TypeDescriptor::Enumeration(e) => Some(e),
            TypeDescriptor::Structure(_) => None,
        }
    }
}

impl From<StructureDescriptor> for TypeDescriptor {
    fn from(s: StructureDescriptor) -> Self {
        Self::Structure(s)
    }
}

impl From<EnumDescriptor> for TypeDescriptor {
    fn from(e: EnumDescriptor) -> Self {
        Self::Enumeration(e)
    }
}

/// Builds a structure descriptor
pub struct StructureBuilder {
    data: StructureDescriptor,
}

impl StructureBuilder {
    pub fn new<N: Into<String>>(type_id: NodeId, name: N) -> Self {
        Self {
            data: StructureDescriptor {
                type_id,
                name: name.into(),
                parent: None,
                fields: Vec::new(),
                is_abstract: false,
                kind: StructureKind::Structure,
                binary_encoding_id: None,
            },
        }
    }

    /// Sets the structure this one extends
    pub fn parent(mut self, parent: NodeId) -> Self {
        self.data.parent = Some(parent);
        self
    }

    pub fn field<N: Into<String>, T: Into<TypeRef>>(mut self, name: N, type_ref: T) -> Self {
        self.data.fields.push(FieldDescriptor::new(name, type_ref));
        self
    }

    pub fn optional_field<N: Into<String>, T: Into<TypeRef>>(
        mut self,
        name: N,
        type_ref: T,
    ) -> Self {
        self.data
            .fields
            .push(FieldDescriptor::new(name, type_ref).optional());
        self
    }

    pub fn array_field<N: Into<String>, T: Into<TypeRef>>(
        mut self,
        name: N,
        type_ref: T,
    ) -> Self {
        self.data.fields.push(FieldDescriptor::new(name, type_ref).array());
        self
    }

    pub fn add_field(mut self, field: FieldDescriptor) -> Self {
        self.data.fields.push(field);
        self
    }

    /// Abstract types can only be used through a concrete subtype
    pub fn abstract_type(mut self) -> Self {
        self.data.is_abstract = true;
        self
    }

    pub fn union(mut self) -> Self {
        self.data.kind = StructureKind::Union;
        self
    }

    pub fn binary_encoding_id(mut self, id: NodeId) -> Self {
        self.data.binary_encoding_id = Some(id);
        self
    }

    pub fn build(self) -> StructureDescriptor {
        self.data
    }
}

/// Builds an enumeration descriptor
pub struct EnumBuilder {
    data: EnumDescriptor,
}

impl EnumBuilder {
    pub fn new<N: Into<String>>(type_id: NodeId, name: N) -> Self {
        Self {
            data: EnumDescriptor {
                type_id,
                name: name.into(),
                members: Vec::new(),
            },
        }
    }

    pub fn member<N: Into<String>>(mut self, name: N, value: i32) -> Self {
        self.data.members.push(EnumMember {
            name: name.into(),
            value,
        });
        self
    }

    pub fn build(self) -> EnumDescriptor {
        self.data
    }
}
