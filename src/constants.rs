// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

/// Namespace index 0 of every OPC UA server
pub const OPC_UA_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// Abstract root of all structured DataTypes
pub const STRUCTURE_ID: u32 = 22;
/// Abstract root of all enumerations
pub const ENUMERATION_ID: u32 = 29;
/// Abstract root of all unions
pub const UNION_ID: u32 = 12756;
/// BaseDataType, the Variant type
pub const BASE_DATA_TYPE_ID: u32 = 24;
/// Abstract Number and its integer subtypes
pub const NUMBER_ID: u32 = 26;
pub const INTEGER_ID: u32 = 27;
pub const UINTEGER_ID: u32 = 28;
/// HasSubtype ReferenceType
pub const HAS_SUBTYPE_ID: u32 = 45;
/// HasEncoding ReferenceType
pub const HAS_ENCODING_ID: u32 = 38;

/// Body flag of an ExtensionObject without body
pub(crate) const EXTENSION_BODY_NONE: u8 = 0x00;
/// Body flag of an ExtensionObject with a binary body
pub(crate) const EXTENSION_BODY_BINARY: u8 = 0x01;
/// Body flag of an ExtensionObject with a xml body
pub(crate) const EXTENSION_BODY_XML: u8 = 0x02;

/// Encodings a DataType can have, identified by the browse name of the encoding object
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum DataTypeEncoding {
    /// Default Binary
    Binary,
    /// Default XML
    Xml,
    /// Default JSON
    Json,
    Unknown,
}

impl From<&str> for DataTypeEncoding {
    /// Get from the browse name of an encoding object, namespace prefixes are ignored
    fn from(browse_name: &str) -> Self {
        let name = match browse_name.split_once(':') {
            Some((_, name)) => name,
            None => browse_name,
        };
        match name {
            "Default Binary" => Self::Binary,
            "Default XML" => Self::Xml,
            "Default JSON" => Self::Json,
            _ => Self::Unknown,
        }
    }
}
