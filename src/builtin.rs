// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use crate::constants::STRUCTURE_ID;
use opcua_types::{Identifier, NodeId};
use std::convert::TryFrom;
use std::fmt;

/// Built-in types a structure field can carry directly.
/// The discriminants are the OPC UA built-in type ids (Part 6, 5.1.2),
/// which are also the numeric node ids of the DataTypes in namespace 0.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BuiltInType {
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    /// Any concrete structure, transported in an ExtensionObject
    ExtensionObject = 22,
}

impl BuiltInType {
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Node id of the DataType in namespace 0
    pub fn node_id(self) -> NodeId {
        NodeId::new(0, self.id())
    }

    /// Size on the wire if the size doesn't depend on the value
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::SByte | Self::Byte => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float | Self::StatusCode => Some(4),
            Self::Int64 | Self::UInt64 | Self::Double | Self::DateTime => Some(8),
            Self::Guid => Some(16),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
            Self::NodeId => "NodeId",
            Self::ExpandedNodeId => "ExpandedNodeId",
            Self::StatusCode => "StatusCode",
            Self::QualifiedName => "QualifiedName",
            Self::LocalizedText => "LocalizedText",
            Self::ExtensionObject => "ExtensionObject",
        }
    }

    /// Maps a namespace 0 numeric id, unsupported built-ins like Variant or DataValue give None
    pub const fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            13 => Self::DateTime,
            14 => Self::Guid,
            15 => Self::ByteString,
            17 => Self::NodeId,
            18 => Self::ExpandedNodeId,
            19 => Self::StatusCode,
            20 => Self::QualifiedName,
            21 => Self::LocalizedText,
            STRUCTURE_ID => Self::ExtensionObject,
            _ => return None,
        })
    }
}

impl TryFrom<&NodeId> for BuiltInType {
    type Error = ();
    fn try_from(node_id: &NodeId) -> Result<Self, Self::Error> {
        if node_id.namespace != 0 {
            return Err(());
        }
        match node_id.identifier {
            Identifier::Numeric(id) => Self::from_id(id).ok_or(()),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BuiltInType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
