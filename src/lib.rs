// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

//! Runtime registry of OPC UA DataTypes with an OPC UA binary codec for
//! structures, unions and enumerations that are only known at runtime, plus
//! an ExtensionObject container to carry them between peers.
pub mod builtin;
pub mod codec;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod extension;
#[cfg(feature = "nodeset")]
pub mod nodeset;
pub mod registry;
pub mod standard;
pub mod value;

pub mod prelude {
    pub use opcua_types::status_code::StatusCode;
    pub use opcua_types::string::UAString;
    pub use opcua_types::{ByteString, DateTime, DecodingOptions, ExtensionObject, Guid, NodeId};
    pub use opcua_types::{LocalizedText, QualifiedName};
    pub use crate::builtin::BuiltInType;
    pub use crate::codec::BinaryCodec;
    pub use crate::descriptor::{EnumBuilder, StructureBuilder, TypeDescriptor, TypeRef};
    pub use crate::descriptor::{EnumDescriptor, FieldDescriptor, StructureDescriptor};
    pub use crate::error::TypeError;
    pub use crate::extension::{ExtensionBody, ExtensionContainer};
    #[cfg(feature = "nodeset")]
    pub use crate::nodeset::{load_nodeset_file, load_nodeset_str};
    pub use crate::registry::TypeRegistry;
    pub use crate::value::{EnumValue, Record, Value};
}
