// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use opcua_types::status_code::StatusCode;
use opcua_types::NodeId;
use thiserror::Error;

/// Errors of the registry, the codec and the schema loaders
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// The type id is not registered. Usually sender and receiver run different schema versions.
    #[error("unknown type {0}")]
    UnknownType(NodeId),
    /// A type id or encoding id was registered twice
    #[error("type {0} is already registered")]
    DuplicateType(NodeId),
    /// The ancestor walk of a structure visited the same type twice
    #[error("cyclic inheritance at type {0}")]
    CyclicInheritance(NodeId),
    /// A field name appears twice in the effective field list
    #[error("field {field} of type {type_id} is declared twice")]
    DuplicateField { type_id: NodeId, field: String },
    /// The type exists but is not of the requested kind
    #[error("type {type_id} is not a {expected}")]
    TypeMismatch {
        type_id: NodeId,
        expected: &'static str,
    },
    /// The schema source or the registry content is malformed
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The record does not match its declared shape
    #[error("encoding failed: {0}")]
    Encode(String),
    /// The input ended before the value was complete
    #[error("input truncated")]
    Truncated,
    /// The input is malformed
    #[error("decoding failed: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, TypeError>;

impl From<TypeError> for StatusCode {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::UnknownType(_) => StatusCode::BadDataTypeIdUnknown,
            TypeError::TypeMismatch { .. } => StatusCode::BadTypeMismatch,
            TypeError::DuplicateType(_)
            | TypeError::CyclicInheritance(_)
            | TypeError::DuplicateField { .. }
            | TypeError::InvalidSchema(_) => StatusCode::BadConfigurationError,
            TypeError::Encode(_) => StatusCode::BadEncodingError,
            TypeError::Truncated | TypeError::Decode(_) => StatusCode::BadDecodingError,
        }
    }
}
