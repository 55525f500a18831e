// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

//! OPC UA binary encoding (Part 6, 5.2) of registered DataTypes.
//!
//! Structures are written field by field in effective order. If a structure has
//! optional fields a UInt32 encoding mask with one bit per optional field comes
//! first. Unions start with a UInt32 switch field holding the 1-based index of
//! the encoded field. Enumerations are Int32, arrays and strings carry an Int32
//! length prefix.
mod decode;
mod encode;
pub(crate) mod stream;

use crate::descriptor::TypeRef;
use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::value::{Record, Value};
use log::trace;
use opcua_types::{DecodingOptions, NodeId};
use std::io::Write;
use stream::SliceReader;

/// Nesting limit for structures and ExtensionObjects
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Encodes and decodes values of the types known to a registry
#[derive(Clone)]
pub struct BinaryCodec<'a> {
    registry: &'a TypeRegistry,
    decoding_options: DecodingOptions,
    max_depth: usize,
}

impl<'a> BinaryCodec<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            decoding_options: DecodingOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the limits for strings, byte strings and arrays
    pub fn with_decoding_options(mut self, decoding_options: DecodingOptions) -> Self {
        self.decoding_options = decoding_options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn decoding_options(&self) -> &DecodingOptions {
        &self.decoding_options
    }

    /// Encodes a record of a structure or union type
    pub fn encode(&self, record: &Record, type_id: &NodeId) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.encode_to(&mut data, record, type_id)?;
        Ok(data)
    }

    /// Encodes a record into a stream, returns the number of bytes written
    pub fn encode_to<S: Write>(
        &self,
        stream: &mut S,
        record: &Record,
        type_id: &NodeId,
    ) -> Result<usize> {
        let sz = self.encode_record(stream, record, type_id, 0)?;
        trace!("Encoded {} with {} bytes", type_id, sz);
        Ok(sz)
    }

    /// Decodes a record, the input has to be consumed completely
    pub fn decode(&self, data: &[u8], type_id: &NodeId) -> Result<Record> {
        let mut stream = SliceReader::new(data);
        let record = self.decode_record(&mut stream, type_id, 0)?;
        stream.finish()?;
        trace!("Decoded {} from {} bytes", type_id, data.len());
        Ok(record)
    }

    /// Encodes a single value of any type
    pub fn encode_value(&self, value: &Value, type_ref: &TypeRef) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.encode_scalar(&mut data, value, type_ref, 0)?;
        Ok(data)
    }

    /// Decodes a single value of any type, e.g. an enumeration
    pub fn decode_value(&self, data: &[u8], type_ref: &TypeRef) -> Result<Value> {
        let mut stream = SliceReader::new(data);
        let value = self.decode_scalar(&mut stream, type_ref, 0)?;
        stream.finish()?;
        Ok(value)
    }

    pub(crate) fn check_depth(&self, depth: usize, err: fn(String) -> TypeError) -> Result<()> {
        if depth > self.max_depth {
            Err(err(format!("nesting exceeds {} levels", self.max_depth)))
        } else {
            Ok(())
        }
    }
}
