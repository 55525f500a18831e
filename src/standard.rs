// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

//! Namespace 0 DataTypes shipped with the crate.
use crate::builtin::BuiltInType;
use crate::builtin::BuiltInType as BT;
use crate::descriptor::{EnumDescriptor, EnumMember, FieldDescriptor, StructureDescriptor};
use crate::descriptor::{StructureKind, TypeDescriptor, TypeRef};
use crate::error::Result;
use crate::registry::TypeRegistry;
use log::debug;
use opcua_types::NodeId;
use std::convert::TryFrom;

/// Numeric ids of the catalog types in namespace 0
pub mod ids {
    pub const ARGUMENT: u32 = 296;
    pub const ARGUMENT_ENCODING: u32 = 298;
    pub const RANGE: u32 = 884;
    pub const RANGE_ENCODING: u32 = 886;
    pub const EU_INFORMATION: u32 = 887;
    pub const EU_INFORMATION_ENCODING: u32 = 889;
    pub const TIME_ZONE_DATA_TYPE: u32 = 8912;
    pub const TIME_ZONE_DATA_TYPE_ENCODING: u32 = 8917;
    pub const ENUM_VALUE_TYPE: u32 = 7594;
    pub const ENUM_VALUE_TYPE_ENCODING: u32 = 8251;
    pub const ENUM_FIELD: u32 = 102;
    pub const ENUM_FIELD_ENCODING: u32 = 14845;
    pub const STRUCTURE_FIELD: u32 = 101;
    pub const STRUCTURE_FIELD_ENCODING: u32 = 14844;
    pub const DATA_TYPE_DEFINITION: u32 = 97;
    pub const STRUCTURE_TYPE: u32 = 98;
    pub const STRUCTURE_DEFINITION: u32 = 99;
    pub const STRUCTURE_DEFINITION_ENCODING: u32 = 122;
    pub const ENUM_DEFINITION: u32 = 100;
    pub const ENUM_DEFINITION_ENCODING: u32 = 123;
    pub const XV_TYPE: u32 = 12080;
    pub const XV_TYPE_ENCODING: u32 = 12090;
    pub const COMPLEX_NUMBER_TYPE: u32 = 12171;
    pub const COMPLEX_NUMBER_TYPE_ENCODING: u32 = 12181;
    pub const DOUBLE_COMPLEX_NUMBER_TYPE: u32 = 12172;
    pub const DOUBLE_COMPLEX_NUMBER_TYPE_ENCODING: u32 = 12182;
    pub const AXIS_SCALE_ENUMERATION: u32 = 12077;
    pub const AXIS_INFORMATION: u32 = 12079;
    pub const AXIS_INFORMATION_ENCODING: u32 = 12089;
    pub const CONFIGURATION_VERSION_DATA_TYPE: u32 = 14593;
    pub const CONFIGURATION_VERSION_DATA_TYPE_ENCODING: u32 = 14847;
    pub const NODE_CLASS: u32 = 257;
    pub const MESSAGE_SECURITY_MODE: u32 = 302;
    pub const SERVER_STATE: u32 = 852;
}

#[derive(Clone, Copy)]
enum Ty {
    B(BuiltInType),
    /// namespace 0 DataType
    T(u32),
}

struct FieldDef {
    name: &'static str,
    ty: Ty,
    array: bool,
}

struct StructDef {
    id: u32,
    encoding: Option<u32>,
    name: &'static str,
    parent: Option<u32>,
    is_abstract: bool,
    fields: &'static [FieldDef],
}

struct EnumDef {
    id: u32,
    name: &'static str,
    members: &'static [(&'static str, i32)],
}

macro_rules! f {
    ($name:expr, $ty:expr) => {
        FieldDef {
            name: $name,
            ty: $ty,
            array: false,
        }
    };
}

/// array field
macro_rules! a {
    ($name:expr, $ty:expr) => {
        FieldDef {
            name: $name,
            ty: $ty,
            array: true,
        }
    };
}

const fn s(
    id: u32,
    encoding: u32,
    name: &'static str,
    fields: &'static [FieldDef],
) -> StructDef {
    StructDef {
        id,
        encoding: Some(encoding),
        name,
        parent: None,
        is_abstract: false,
        fields,
    }
}

use ids::*;
use Ty::{B, T};

const STRUCTURES: &[StructDef] = &[
    s(
        ARGUMENT,
        ARGUMENT_ENCODING,
        "Argument",
        &[
            f!("Name", B(BT::String)),
            f!("DataType", B(BT::NodeId)),
            f!("ValueRank", B(BT::Int32)),
            a!("ArrayDimensions", B(BT::UInt32)),
            f!("Description", B(BT::LocalizedText)),
        ],
    ),
    s(
        RANGE,
        RANGE_ENCODING,
        "Range",
        &[f!("Low", B(BT::Double)), f!("High", B(BT::Double))],
    ),
    s(
        EU_INFORMATION,
        EU_INFORMATION_ENCODING,
        "EUInformation",
        &[
            f!("NamespaceUri", B(BT::String)),
            f!("UnitId", B(BT::Int32)),
            f!("DisplayName", B(BT::LocalizedText)),
            f!("Description", B(BT::LocalizedText)),
        ],
    ),
    s(
        TIME_ZONE_DATA_TYPE,
        TIME_ZONE_DATA_TYPE_ENCODING,
        "TimeZoneDataType",
        &[
            f!("Offset", B(BT::Int16)),
            f!("DaylightSavingInOffset", B(BT::Boolean)),
        ],
    ),
    s(
        ENUM_VALUE_TYPE,
        ENUM_VALUE_TYPE_ENCODING,
        "EnumValueType",
        &[
            f!("Value", B(BT::Int64)),
            f!("DisplayName", B(BT::LocalizedText)),
            f!("Description", B(BT::LocalizedText)),
        ],
    ),
    StructDef {
        parent: Some(ENUM_VALUE_TYPE),
        ..s(
            ENUM_FIELD,
            ENUM_FIELD_ENCODING,
            "EnumField",
            &[f!("Name", B(BT::String))],
        )
    },
    s(
        STRUCTURE_FIELD,
        STRUCTURE_FIELD_ENCODING,
        "StructureField",
        &[
            f!("Name", B(BT::String)),
            f!("Description", B(BT::LocalizedText)),
            f!("DataType", B(BT::NodeId)),
            f!("ValueRank", B(BT::Int32)),
            a!("ArrayDimensions", B(BT::UInt32)),
            f!("MaxStringLength", B(BT::UInt32)),
            f!("IsOptional", B(BT::Boolean)),
        ],
    ),
    StructDef {
        id: DATA_TYPE_DEFINITION,
        encoding: None,
        name: "DataTypeDefinition",
        parent: None,
        is_abstract: true,
        fields: &[],
    },
    StructDef {
        parent: Some(DATA_TYPE_DEFINITION),
        ..s(
            STRUCTURE_DEFINITION,
            STRUCTURE_DEFINITION_ENCODING,
            "StructureDefinition",
            &[
                f!("DefaultEncodingId", B(BT::NodeId)),
                f!("BaseDataType", B(BT::NodeId)),
                f!("StructureType", T(STRUCTURE_TYPE)),
                a!("Fields", T(STRUCTURE_FIELD)),
            ],
        )
    },
    StructDef {
        parent: Some(DATA_TYPE_DEFINITION),
        ..s(
            ENUM_DEFINITION,
            ENUM_DEFINITION_ENCODING,
            "EnumDefinition",
            &[a!("Fields", T(ENUM_FIELD))],
        )
    },
    s(
        XV_TYPE,
        XV_TYPE_ENCODING,
        "XVType",
        &[f!("X", B(BT::Double)), f!("Value", B(BT::Float))],
    ),
    s(
        COMPLEX_NUMBER_TYPE,
        COMPLEX_NUMBER_TYPE_ENCODING,
        "ComplexNumberType",
        &[f!("Real", B(BT::Float)), f!("Imaginary", B(BT::Float))],
    ),
    s(
        DOUBLE_COMPLEX_NUMBER_TYPE,
        DOUBLE_COMPLEX_NUMBER_TYPE_ENCODING,
        "DoubleComplexNumberType",
        &[f!("Real", B(BT::Double)), f!("Imaginary", B(BT::Double))],
    ),
    s(
        AXIS_INFORMATION,
        AXIS_INFORMATION_ENCODING,
        "AxisInformation",
        &[
            f!("EngineeringUnits", T(EU_INFORMATION)),
            f!("EURange", T(RANGE)),
            f!("Title", B(BT::LocalizedText)),
            f!("AxisScaleType", T(AXIS_SCALE_ENUMERATION)),
            a!("AxisSteps", B(BT::Double)),
        ],
    ),
    s(
        CONFIGURATION_VERSION_DATA_TYPE,
        CONFIGURATION_VERSION_DATA_TYPE_ENCODING,
        "ConfigurationVersionDataType",
        &[f!("MajorVersion", B(BT::UInt32)), f!("MinorVersion", B(BT::UInt32))],
    ),
];

const ENUMERATIONS: &[EnumDef] = &[
    EnumDef {
        id: STRUCTURE_TYPE,
        name: "StructureType",
        members: &[
            ("Structure", 0),
            ("StructureWithOptionalFields", 1),
            ("Union", 2),
            ("StructureWithSubtypedValues", 3),
            ("UnionWithSubtypedValues", 4),
        ],
    },
    EnumDef {
        id: AXIS_SCALE_ENUMERATION,
        name: "AxisScaleEnumeration",
        members: &[("Linear", 0), ("Log", 1), ("Ln", 2)],
    },
    EnumDef {
        id: NODE_CLASS,
        name: "NodeClass",
        members: &[
            ("Unspecified", 0),
            ("Object", 1),
            ("Variable", 2),
            ("Method", 4),
            ("ObjectType", 8),
            ("VariableType", 16),
            ("ReferenceType", 32),
            ("DataType", 64),
            ("View", 128),
        ],
    },
    EnumDef {
        id: MESSAGE_SECURITY_MODE,
        name: "MessageSecurityMode",
        members: &[
            ("Invalid", 0),
            ("None", 1),
            ("Sign", 2),
            ("SignAndEncrypt", 3),
        ],
    },
    EnumDef {
        id: SERVER_STATE,
        name: "ServerState",
        members: &[
            ("Running", 0),
            ("Failed", 1),
            ("NoConfiguration", 2),
            ("Suspended", 3),
            ("Shutdown", 4),
            ("Test", 5),
            ("CommunicationFault", 6),
            ("Unknown", 7),
        ],
    },
];

/// Subtypes of built-in types, encoded like their base
const SIMPLE_TYPES: &[(u32, BuiltInType)] = &[
    (30, BT::ByteString),    // Image
    (288, BT::UInt32),       // IntegerId
    (289, BT::UInt32),       // Counter
    (290, BT::Double),       // Duration
    (291, BT::String),       // NumericRange
    (292, BT::String),       // Time
    (293, BT::DateTime),     // Date
    (294, BT::DateTime),     // UtcTime
    (295, BT::String),       // LocaleId
    (311, BT::ByteString),   // ApplicationInstanceCertificate
    (388, BT::NodeId),       // SessionAuthenticationToken
    (521, BT::ByteString),   // ContinuationPoint
    (2000, BT::ByteString),  // ImageBMP
    (2001, BT::ByteString),  // ImageGIF
    (2002, BT::ByteString),  // ImageJPG
    (2003, BT::ByteString),  // ImagePNG
    (12877, BT::String),     // NormalizedString
    (12878, BT::String),     // DecimalString
    (12879, BT::String),     // DurationString
    (12880, BT::String),     // TimeString
    (12881, BT::String),     // DateString
    (17588, BT::UInt32),     // Index
    (20998, BT::UInt32),     // VersionTime
    (23751, BT::String),     // UriString
];

fn ns0(id: u32) -> opcua_types::NodeId {
    opcua_types::NodeId::new(0, id)
}

impl Ty {
    fn type_ref(self) -> TypeRef {
        match self {
            B(b) => TypeRef::BuiltIn(b),
            T(id) => TypeRef::Type(ns0(id)),
        }
    }
}

impl StructDef {
    fn descriptor(&self) -> StructureDescriptor {
        StructureDescriptor {
            type_id: ns0(self.id),
            name: self.name.to_string(),
            parent: self.parent.map(ns0),
            fields: self
                .fields
                .iter()
                .map(|fd| FieldDescriptor {
                    name: fd.name.to_string(),
                    type_ref: fd.ty.type_ref(),
                    is_array: fd.array,
                    is_optional: false,
                })
                .collect(),
            is_abstract: self.is_abstract,
            kind: StructureKind::Structure,
            binary_encoding_id: self.encoding.map(ns0),
        }
    }
}

impl EnumDef {
    fn descriptor(&self) -> EnumDescriptor {
        EnumDescriptor {
            type_id: ns0(self.id),
            name: self.name.to_string(),
            members: self
                .members
                .iter()
                .map(|(name, value)| EnumMember {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }
}

/// Every catalog type as descriptor
pub fn standard_types() -> Vec<TypeDescriptor> {
    ENUMERATIONS
        .iter()
        .map(|e| TypeDescriptor::from(e.descriptor()))
        .chain(STRUCTURES.iter().map(|s| s.descriptor().into()))
        .collect()
}

/// Adds the catalog to a registry, fails if one of the ids is already taken
pub fn register_standard_types(registry: &mut TypeRegistry) -> Result<()> {
    let types = standard_types();
    debug!("Registering {} standard DataTypes", types.len());
    registry.register_all(types)
}

/// Built-in type behind a namespace 0 DataType that is encoded as a built-in.
/// Covers the built-in types themselves and their well known simple subtypes.
pub fn simple_type_base(type_id: &NodeId) -> Option<BuiltInType> {
    if let Ok(b) = BuiltInType::try_from(type_id) {
        return Some(b);
    }
    if type_id.namespace != 0 {
        return None;
    }
    match &type_id.identifier {
        opcua_types::Identifier::Numeric(n) => SIMPLE_TYPES
            .iter()
            .find(|(id, _)| id == n)
            .map(|(_, b)| *b),
        _ => None,
    }
}

impl TypeRegistry {
    /// Registry holding the namespace 0 catalog
    pub fn with_standard_types() -> Result<Self> {
        let mut registry = TypeRegistry::new();
        register_standard_types(&mut registry)?;
        Ok(registry)
    }
}
