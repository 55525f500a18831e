// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

// ExtensionObjects exchanged between peers whose registries differ
use opcua_typecodec::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(n: u32) -> NodeId {
    NodeId::new(1, n)
}

/// Vendor types only the producer knows about
fn producer_registry() -> Result<TypeRegistry, TypeError> {
    let mut reg = TypeRegistry::new();
    reg.register(
        StructureBuilder::new(id(100), "Event")
            .field("source", BuiltInType::String)
            .field("severity", BuiltInType::UInt16)
            .abstract_type()
            .build(),
    )?;
    reg.register(
        StructureBuilder::new(id(101), "AlarmEvent")
            .parent(id(100))
            .field("limit", BuiltInType::Double)
            .binary_encoding_id(id(201))
            .build(),
    )?;
    reg.register(
        StructureBuilder::new(id(102), "EventLog")
            .field("name", BuiltInType::String)
            .array_field("events", id(100))
            .build(),
    )?;
    reg.validate()?;
    Ok(reg)
}

/// Knows the log but none of the concrete events
fn relay_registry() -> Result<TypeRegistry, TypeError> {
    let mut reg = TypeRegistry::new();
    reg.register(
        StructureBuilder::new(id(100), "Event")
            .field("source", BuiltInType::String)
            .field("severity", BuiltInType::UInt16)
            .abstract_type()
            .build(),
    )?;
    reg.register(
        StructureBuilder::new(id(102), "EventLog")
            .field("name", BuiltInType::String)
            .array_field("events", id(100))
            .build(),
    )?;
    reg.validate()?;
    Ok(reg)
}

fn alarm(source: &str, limit: f64) -> Record {
    Record::new()
        .with("source", source)
        .with("severity", 500_u16)
        .with("limit", limit)
}

fn event_log() -> Record {
    Record::new().with("name", "boiler").with(
        "events",
        vec![
            ExtensionContainer::wrap(alarm("pump", 80.0), id(101)),
            ExtensionContainer::wrap(alarm("valve", 3.5), id(101)),
        ],
    )
}

#[test]
fn relay_forwards_unknown_payloads() -> Result<(), StatusCode> {
    init();
    let producer = producer_registry()?;
    let relay = relay_registry()?;
    let data = BinaryCodec::new(&producer).encode(&event_log(), &id(102))?;

    let relay_codec = BinaryCodec::new(&relay);
    let log = relay_codec.decode(&data, &id(102))?;
    let events = log.get("events").and_then(Value::as_array).unwrap_or(&[]);
    assert_eq!(events.len(), 2);
    for e in events {
        match e {
            Value::Extension(c) => {
                assert_eq!(c.type_id(), &id(201));
                assert!(matches!(c.body(), ExtensionBody::Encoded(_)));
                assert_eq!(c.unwrap(&relay_codec), Err(TypeError::UnknownType(id(201))));
            }
            v => panic!("expected an ExtensionObject, found {:?}", v),
        }
    }
    // the relay writes the events back as it received them
    assert_eq!(relay_codec.encode(&log, &id(102))?, data);

    let consumer = BinaryCodec::new(&producer);
    assert_eq!(consumer.decode(&data, &id(102))?, event_log());
    Ok(())
}

#[test]
fn unwrap_on_the_consumer_side() -> Result<(), StatusCode> {
    init();
    let producer = producer_registry()?;
    let codec = BinaryCodec::new(&producer);
    let c = ExtensionContainer::wrap_encoded(&alarm("pump", 80.0), id(101), &codec)?;
    let mut data = Vec::new();
    c.encode(&codec, &mut data)?;

    let received = ExtensionContainer::decode(&codec, &data)?;
    assert_eq!(received.type_id(), &id(101));
    assert_eq!(received.unwrap_as(&codec, &id(100))?, alarm("pump", 80.0));

    let relay = relay_registry()?;
    let relay_codec = BinaryCodec::new(&relay);
    let opaque = ExtensionContainer::decode(&relay_codec, &data)?;
    assert!(opaque.clone().into_decoded(&relay_codec).is_err());
    let eobj = opaque.to_extension_object(&relay_codec)?;
    assert_eq!(eobj.node_id, id(201));
    let back = ExtensionContainer::from_extension_object(&eobj, &producer)?;
    assert_eq!(back.into_decoded(&codec)?, ExtensionContainer::wrap(alarm("pump", 80.0), id(101)));
    Ok(())
}

#[test]
fn abstract_fields_need_subtypes() -> Result<(), StatusCode> {
    init();
    let producer = producer_registry()?;
    let codec = BinaryCodec::new(&producer);
    let bad = Record::new().with("name", "boiler").with(
        "events",
        vec![ExtensionContainer::wrap(
            Record::new().with("name", "nested").with("events", Value::Array(Vec::new())),
            id(102),
        )],
    );
    assert!(matches!(codec.encode(&bad, &id(102)), Err(TypeError::Encode(_))));

    let plain = Record::new()
        .with("name", "boiler")
        .with("events", vec![alarm("pump", 1.0)]);
    assert!(matches!(codec.encode(&plain, &id(102)), Err(TypeError::Encode(_))));

    // the abstract type itself has no encoding
    let event = Record::new().with("source", "pump").with("severity", 1_u16);
    assert!(matches!(codec.encode(&event, &id(100)), Err(TypeError::Encode(_))));
    Ok(())
}
