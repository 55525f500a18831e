// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

//! ExtensionObject container for structure values whose type is only known at runtime.
//!
//! A container keeps its body either as encoded bytes or as a decoded [`Record`].
//! Bodies of types unknown to the local registry stay encoded, so they can be
//! forwarded unchanged.
use crate::codec::stream::{read, SliceReader};
use crate::codec::BinaryCodec;
use crate::constants::{EXTENSION_BODY_BINARY, EXTENSION_BODY_NONE, EXTENSION_BODY_XML};
use crate::descriptor::TypeDescriptor;
use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use crate::value::Record;
use log::{debug, warn};
use opcua_types::{
    BinaryEncoder, ByteString, ExtensionObject, ExtensionObjectEncoding, NodeId,
};
use std::io::Write;

#[derive(Debug, PartialEq, Clone)]
pub enum ExtensionBody {
    /// Null ExtensionObject
    Empty,
    /// Binary body as received or produced by the codec
    Encoded(Vec<u8>),
    Decoded(Record),
}

/// A structure value tagged with the NodeId of its type.
///
/// Containers compare by content: an encoded body equals a decoded one if the
/// decoded container was read from exactly these bytes. Empty containers are
/// all equal.
#[derive(Debug, Clone)]
pub struct ExtensionContainer {
    type_id: NodeId,
    body: ExtensionBody,
    /// Wire id and body a decoded container was read from
    source: Option<(NodeId, Vec<u8>)>,
}

fn io_err(err: std::io::Error) -> TypeError {
    TypeError::Encode(err.to_string())
}

fn lift(res: opcua_types::EncodingResult<usize>) -> Result<usize> {
    res.map_err(|status| TypeError::Encode(status.to_string()))
}

/// Binary body: encoding byte and length prefixed bytes
fn write_body<S: Write>(stream: &mut S, data: &[u8]) -> Result<usize> {
    let mut sz = lift(EXTENSION_BODY_BINARY.encode(stream))?;
    sz += lift((data.len() as i32).encode(stream))?;
    stream.write_all(data).map_err(io_err)?;
    Ok(sz + data.len())
}

impl ExtensionContainer {
    /// An empty body carries no type, its id is always null
    pub fn new(type_id: NodeId, body: ExtensionBody) -> Self {
        let type_id = match body {
            ExtensionBody::Empty => NodeId::null(),
            _ => type_id,
        };
        Self {
            type_id,
            body,
            source: None,
        }
    }

    fn decoded_from(type_id: NodeId, record: Record, wire_id: NodeId, data: Vec<u8>) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Decoded(record),
            source: Some((wire_id, data)),
        }
    }

    /// `id` names this container's type, either as DataType or as the id it was read with
    fn known_as(&self, id: &NodeId) -> bool {
        self.type_id == *id || matches!(&self.source, Some((wire, _)) if wire == id)
    }

    /// True if this container was decoded from `data` sent as `type_id`
    fn read_from(&self, type_id: &NodeId, data: &[u8]) -> bool {
        match &self.source {
            Some((_, bytes)) => bytes.as_slice() == data && self.known_as(type_id),
            None => false,
        }
    }

    pub fn null() -> Self {
        Self::new(NodeId::null(), ExtensionBody::Empty)
    }

    /// Wraps a record, encoding happens when the container is written
    pub fn wrap(record: Record, type_id: NodeId) -> Self {
        Self::new(type_id, ExtensionBody::Decoded(record))
    }

    /// Wraps a record and encodes it right away
    pub fn wrap_encoded(record: &Record, type_id: NodeId, codec: &BinaryCodec) -> Result<Self> {
        let data = codec.encode(record, &type_id)?;
        Ok(Self::new(type_id, ExtensionBody::Encoded(data)))
    }

    /// Wraps an encoded body, the id can be the DataType or the encoding id
    pub fn from_bytes(type_id: NodeId, data: Vec<u8>) -> Self {
        Self::new(type_id, ExtensionBody::Encoded(data))
    }

    pub fn type_id(&self) -> &NodeId {
        &self.type_id
    }

    pub fn body(&self) -> &ExtensionBody {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, ExtensionBody::Empty)
    }

    /// Returns the record, decoding the body if needed
    pub fn unwrap(&self, codec: &BinaryCodec) -> Result<Record> {
        let descriptor = match codec.registry().resolve_encoding(&self.type_id) {
            Ok(d) => d,
            Err(err) => {
                warn!("Can't unwrap ExtensionObject of unknown type {}", self.type_id);
                return Err(err);
            }
        };
        let s = match descriptor {
            TypeDescriptor::Structure(s) => s,
            TypeDescriptor::Enumeration(e) => {
                return Err(TypeError::TypeMismatch {
                    type_id: e.type_id.clone(),
                    expected: "structure",
                })
            }
        };
        match &self.body {
            ExtensionBody::Empty => Err(TypeError::Decode(format!(
                "ExtensionObject of {} has no body",
                s.name
            ))),
            ExtensionBody::Encoded(data) => codec.decode(data, &s.type_id),
            ExtensionBody::Decoded(record) => Ok(record.clone()),
        }
    }

    /// Like [`unwrap`](Self::unwrap) but the content has to be of type `expected` or extend it
    pub fn unwrap_as(&self, codec: &BinaryCodec, expected: &NodeId) -> Result<Record> {
        let registry = codec.registry();
        let actual = registry.resolve_encoding(&self.type_id)?.type_id();
        if !registry.is_subtype_of(actual, expected)? {
            return Err(TypeError::TypeMismatch {
                type_id: actual.clone(),
                expected: "subtype of the requested type",
            });
        }
        self.unwrap(codec)
    }

    /// Replaces a decoded body by its encoding
    pub fn into_encoded(self, codec: &BinaryCodec) -> Result<Self> {
        match self.body {
            ExtensionBody::Decoded(record) => {
                let type_id = codec.registry().resolve_encoding(&self.type_id)?.type_id();
                let data = codec.encode(&record, type_id)?;
                Ok(Self::new(type_id.clone(), ExtensionBody::Encoded(data)))
            }
            _ => Ok(self),
        }
    }

    /// Replaces an encoded body by the record, the id becomes the DataType id
    pub fn into_decoded(self, codec: &BinaryCodec) -> Result<Self> {
        if !matches!(self.body, ExtensionBody::Encoded(_)) {
            return Ok(self);
        }
        let record = self.unwrap(codec)?;
        let type_id = codec
            .registry()
            .resolve_encoding(&self.type_id)?
            .type_id()
            .clone();
        match self.body {
            ExtensionBody::Encoded(data) => {
                Ok(Self::decoded_from(type_id, record, self.type_id, data))
            }
            _ => Ok(Self::new(type_id, ExtensionBody::Decoded(record))),
        }
    }

    /// Writes the container as ExtensionObject
    pub fn encode<S: Write>(&self, codec: &BinaryCodec, stream: &mut S) -> Result<usize> {
        self.encode_inner(codec, stream, 0)
    }

    /// Reads a container from a complete ExtensionObject
    pub fn decode(codec: &BinaryCodec, data: &[u8]) -> Result<Self> {
        let mut stream = SliceReader::new(data);
        let container = Self::decode_inner(codec, &mut stream, 0)?;
        stream.finish()?;
        Ok(container)
    }

    /// NodeId written in front of the body
    fn encoding_id(&self, registry: &TypeRegistry) -> NodeId {
        match registry.resolve_encoding(&self.type_id) {
            Ok(TypeDescriptor::Structure(s)) => s.encoding_id().clone(),
            _ => self.type_id.clone(),
        }
    }

    pub(crate) fn encode_inner<S: Write>(
        &self,
        codec: &BinaryCodec,
        stream: &mut S,
        depth: usize,
    ) -> Result<usize> {
        let mut sz = 0;
        match &self.body {
            ExtensionBody::Empty => {
                sz += lift(NodeId::null().encode(stream))?;
                sz += lift(EXTENSION_BODY_NONE.encode(stream))?;
            }
            ExtensionBody::Encoded(data) => {
                sz += lift(self.encoding_id(codec.registry()).encode(stream))?;
                sz += write_body(stream, data)?;
            }
            ExtensionBody::Decoded(record) => {
                let s = codec
                    .registry()
                    .resolve_encoding(&self.type_id)?
                    .as_structure()
                    .ok_or_else(|| TypeError::TypeMismatch {
                        type_id: self.type_id.clone(),
                        expected: "structure",
                    })?;
                let mut data = Vec::new();
                codec.encode_record(&mut data, record, &s.type_id, depth)?;
                sz += lift(s.encoding_id().encode(stream))?;
                sz += write_body(stream, &data)?;
            }
        }
        Ok(sz)
    }

    pub(crate) fn decode_inner(
        codec: &BinaryCodec,
        stream: &mut SliceReader<'_>,
        depth: usize,
    ) -> Result<Self> {
        codec.check_depth(depth, TypeError::Decode)?;
        let opts = codec.decoding_options();
        let node_id: NodeId = read(stream, opts)?;
        let encoding: u8 = read(stream, opts)?;
        match encoding {
            EXTENSION_BODY_NONE => Ok(Self::new(node_id, ExtensionBody::Empty)),
            EXTENSION_BODY_BINARY => {
                let body: ByteString = read(stream, opts)?;
                let data = body.value.unwrap_or_default();
                match codec.registry().resolve_encoding(&node_id) {
                    Ok(TypeDescriptor::Structure(s)) => {
                        let mut inner = SliceReader::new(&data);
                        let record = codec.decode_record(&mut inner, &s.type_id, depth)?;
                        inner.finish()?;
                        Ok(Self::decoded_from(s.type_id.clone(), record, node_id, data))
                    }
                    Ok(TypeDescriptor::Enumeration(e)) => Err(TypeError::Decode(format!(
                        "ExtensionObject can't carry enumeration {}",
                        e.name
                    ))),
                    Err(_) => {
                        debug!("Keeping ExtensionObject of unknown type {} encoded", node_id);
                        Ok(Self::new(node_id, ExtensionBody::Encoded(data)))
                    }
                }
            }
            EXTENSION_BODY_XML => Err(TypeError::Decode(format!(
                "XML body of ExtensionObject {} is not supported",
                node_id
            ))),
            b => Err(TypeError::Decode(format!(
                "invalid ExtensionObject encoding byte {:#x}",
                b
            ))),
        }
    }

    /// Converts into the opcua-types ExtensionObject, the body gets encoded
    pub fn to_extension_object(&self, codec: &BinaryCodec) -> Result<ExtensionObject> {
        if self.is_empty() {
            return Ok(ExtensionObject::null());
        }
        let node_id = self.encoding_id(codec.registry());
        let data = match self.clone().into_encoded(codec)?.body {
            ExtensionBody::Encoded(data) => data,
            _ => Vec::new(),
        };
        Ok(ExtensionObject {
            node_id,
            body: ExtensionObjectEncoding::ByteString(ByteString::from(data)),
        })
    }

    /// Takes over the body of an opcua-types ExtensionObject without decoding it
    pub fn from_extension_object(eobj: &ExtensionObject, registry: &TypeRegistry) -> Result<Self> {
        let type_id = match registry.resolve_encoding(&eobj.node_id) {
            Ok(d) => d.type_id().clone(),
            Err(_) => eobj.node_id.clone(),
        };
        match &eobj.body {
            ExtensionObjectEncoding::None => Ok(Self::new(type_id, ExtensionBody::Empty)),
            ExtensionObjectEncoding::ByteString(bs) => Ok(Self::new(
                type_id,
                ExtensionBody::Encoded(bs.value.clone().unwrap_or_default()),
            )),
            ExtensionObjectEncoding::XmlElement(_) => Err(TypeError::Decode(format!(
                "XML body of ExtensionObject {} is not supported",
                eobj.node_id
            ))),
        }
    }
}

impl PartialEq for ExtensionContainer {
    fn eq(&self, other: &Self) -> bool {
        match (&self.body, &other.body) {
            (ExtensionBody::Empty, ExtensionBody::Empty) => true,
            (ExtensionBody::Encoded(a), ExtensionBody::Encoded(b)) => {
                self.type_id == other.type_id && a == b
            }
            (ExtensionBody::Decoded(a), ExtensionBody::Decoded(b)) => {
                (self.known_as(&other.type_id) || other.known_as(&self.type_id)) && a == b
            }
            (ExtensionBody::Encoded(data), ExtensionBody::Decoded(_)) => {
                other.read_from(&self.type_id, data)
            }
            (ExtensionBody::Decoded(_), ExtensionBody::Encoded(data)) => {
                self.read_from(&other.type_id, data)
            }
            _ => false,
        }
    }
}

impl Default for ExtensionContainer {
    fn default() -> Self {
        Self::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BuiltInType;
    use crate::descriptor::StructureBuilder;
    use crate::value::Value;

    fn id(n: u32) -> NodeId {
        NodeId::new(3, n)
    }

    /// Shape (abstract), Circle extends Shape, Drawing holds any Shape
    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register(
            StructureBuilder::new(id(1), "Shape")
                .field("name", BuiltInType::String)
                .abstract_type()
                .build(),
        )
        .unwrap();
        reg.register(
            StructureBuilder::new(id(2), "Circle")
                .parent(id(1))
                .field("radius", BuiltInType::Double)
                .binary_encoding_id(id(102))
                .build(),
        )
        .unwrap();
        reg.register(
            StructureBuilder::new(id(3), "Drawing")
                .field("shape", id(1))
                .array_field("extras", BuiltInType::ExtensionObject)
                .build(),
        )
        .unwrap();
        reg
    }

    fn circle() -> Record {
        Record::new().with("name", "c1").with("radius", 2.5)
    }

    #[test]
    fn wrap_and_unwrap() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::wrap(circle(), id(2));
        assert_eq!(c.unwrap(&codec).unwrap(), circle());
        let e = ExtensionContainer::wrap_encoded(&circle(), id(2), &codec).unwrap();
        assert!(matches!(e.body(), ExtensionBody::Encoded(_)));
        assert_eq!(e.unwrap(&codec).unwrap(), circle());
        assert_eq!(e.clone().into_decoded(&codec).unwrap(), c);
        assert_eq!(c.into_encoded(&codec).unwrap(), e);
    }

    #[test]
    fn binary_layout() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::wrap(Record::new().with("name", "").with("radius", 0.0), id(2));
        let mut data = Vec::new();
        let sz = c.encode(&codec, &mut data).unwrap();
        assert_eq!(sz, data.len());
        // four byte NodeId of the encoding, body byte, length, string and double
        assert_eq!(&data[..4], &[0x01, 0x03, 102, 0x00]);
        assert_eq!(data[4], EXTENSION_BODY_BINARY);
        assert_eq!(&data[5..9], &12_i32.to_le_bytes());
        assert_eq!(data.len(), 9 + 12);
        let d = ExtensionContainer::decode(&codec, &data).unwrap();
        assert_eq!(d.type_id(), &id(2));
        assert_eq!(d, c);
    }

    #[test]
    fn null_container() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let mut data = Vec::new();
        ExtensionContainer::null().encode(&codec, &mut data).unwrap();
        assert_eq!(data, vec![0x00, 0x00, 0x00]);
        let d = ExtensionContainer::decode(&codec, &data).unwrap();
        assert!(d.is_empty());
        assert!(matches!(
            d.unwrap(&codec),
            Err(TypeError::UnknownType(_))
        ));
    }

    #[test]
    fn unknown_type_stays_encoded() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::from_bytes(NodeId::new(7, 1_u32), vec![1, 2, 3]);
        let mut data = Vec::new();
        c.encode(&codec, &mut data).unwrap();
        let d = ExtensionContainer::decode(&codec, &data).unwrap();
        assert_eq!(d, c);
        assert_eq!(d.unwrap(&codec), Err(TypeError::UnknownType(NodeId::new(7, 1_u32))));
    }

    #[test]
    fn encoded_bodies_survive_a_round_trip() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let data = codec.encode(&circle(), &id(2)).unwrap();
        let shapes = vec![
            ExtensionContainer::wrap_encoded(&circle(), id(2), &codec).unwrap(),
            ExtensionContainer::from_bytes(id(102), data.clone()),
            ExtensionContainer::wrap(circle(), id(102)),
        ];
        for shape in shapes {
            let drawing = Record::new()
                .with("shape", shape)
                .with("extras", Value::Array(vec![]));
            let wire = codec.encode(&drawing, &id(3)).unwrap();
            assert_eq!(codec.decode(&wire, &id(3)).unwrap(), drawing);
        }

        // a decoded container only matches the bytes it was read from
        let other = codec
            .encode(&Record::new().with("name", "c2").with("radius", 2.5), &id(2))
            .unwrap();
        let read = ExtensionContainer::from_bytes(id(2), data).into_decoded(&codec).unwrap();
        assert_ne!(read, ExtensionContainer::from_bytes(id(2), other));
        assert_ne!(
            ExtensionContainer::wrap(circle(), id(2)),
            ExtensionContainer::wrap_encoded(&circle(), id(2), &codec).unwrap()
        );
    }

    #[test]
    fn empty_containers_have_no_type() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::new(id(2), ExtensionBody::Empty);
        assert_eq!(c.type_id(), &NodeId::null());
        assert_eq!(c, ExtensionContainer::null());
        let mut data = Vec::new();
        c.encode(&codec, &mut data).unwrap();
        assert_eq!(ExtensionContainer::decode(&codec, &data).unwrap(), c);
    }

    #[test]
    fn bad_encoding_byte() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        assert!(matches!(
            ExtensionContainer::decode(&codec, &[0x00, 0x00, 0x05]),
            Err(TypeError::Decode(_))
        ));
        assert!(matches!(
            ExtensionContainer::decode(&codec, &[0x00, 0x00, EXTENSION_BODY_XML, 0, 0, 0, 0]),
            Err(TypeError::Decode(_))
        ));
        assert_eq!(
            ExtensionContainer::decode(&codec, &[0x00, 0x00, 0x01, 8, 0, 0, 0, 1]),
            Err(TypeError::Truncated)
        );
    }

    #[test]
    fn polymorphic_field() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let shape = ExtensionContainer::wrap(circle(), id(2));
        let drawing = Record::new()
            .with("shape", shape.clone())
            .with("extras", vec![Value::from(shape.clone()), Value::from(ExtensionContainer::null())]);
        let data = codec.encode(&drawing, &id(3)).unwrap();
        assert_eq!(codec.decode(&data, &id(3)).unwrap(), drawing);

        // a concrete Drawing is no Shape
        let wrong = ExtensionContainer::wrap(
            Record::new().with("shape", shape).with("extras", Value::Array(vec![])),
            id(3),
        );
        let bad = Record::new()
            .with("shape", wrong)
            .with("extras", Value::Array(vec![]));
        assert!(matches!(codec.encode(&bad, &id(3)), Err(TypeError::Encode(_))));
    }

    #[test]
    fn unwrap_as_checks_hierarchy() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::wrap(circle(), id(2));
        assert_eq!(c.unwrap_as(&codec, &id(1)).unwrap(), circle());
        assert!(matches!(
            c.unwrap_as(&codec, &id(3)),
            Err(TypeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn extension_object_bridge() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg);
        let c = ExtensionContainer::wrap(circle(), id(2));
        let eobj = c.to_extension_object(&codec).unwrap();
        assert_eq!(eobj.node_id, id(102));
        let back = ExtensionContainer::from_extension_object(&eobj, &reg).unwrap();
        assert_eq!(back.type_id(), &id(2));
        assert_eq!(back.unwrap(&codec).unwrap(), circle());
        let null = ExtensionContainer::null().to_extension_object(&codec).unwrap();
        assert!(null.is_null());
    }

    #[test]
    fn nesting_limit() {
        let reg = registry();
        let codec = BinaryCodec::new(&reg).with_max_depth(3);
        let mut value = ExtensionContainer::null();
        for _ in 0..5 {
            value = ExtensionContainer::wrap(
                Record::new()
                    .with("shape", ExtensionContainer::null())
                    .with("extras", vec![Value::from(value)]),
                id(3),
            );
        }
        let mut data = Vec::new();
        assert!(value.encode(&codec, &mut data).is_err());
        let deep = BinaryCodec::new(&reg);
        data.clear();
        value.encode(&deep, &mut data).unwrap();
        assert!(matches!(
            ExtensionContainer::decode(&codec, &data),
            Err(TypeError::Decode(_))
        ));
        assert_eq!(ExtensionContainer::decode(&deep, &data).unwrap(), value);
    }
}
