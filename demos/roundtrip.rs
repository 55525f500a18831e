// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use log::info;
use opcua_typecodec::prelude::*;
use opcua_typecodec::standard::ids;
use std::env;

/// Encodes an AxisInformation as ExtensionObject and reads it back.
/// Pass NodeSet2 files as arguments to load vendor DataTypes first,
/// their types are listed afterwards.
fn main() -> Result<(), StatusCode> {
    env_logger::init();
    let mut registry = TypeRegistry::with_standard_types()?;
    for path in env::args().skip(1) {
        let count = load_nodeset_file(&path, &mut registry)?;
        info!("{}: {} DataTypes", path, count);
    }
    let registry = registry.into_shared();
    let codec = BinaryCodec::new(&registry);

    let scale = registry.resolve_enumeration(&NodeId::new(0, ids::AXIS_SCALE_ENUMERATION))?;
    let axis = Record::new()
        .with(
            "EngineeringUnits",
            Record::new()
                .with("NamespaceUri", "http://www.opcfoundation.org/UA/units/un/cefact")
                .with("UnitId", 5067858_i32)
                .with("DisplayName", LocalizedText::new("", "mm"))
                .with("Description", LocalizedText::new("en", "millimetre")),
        )
        .with("EURange", Record::new().with("Low", 0.0).with("High", 250.0))
        .with("Title", LocalizedText::new("en", "Stroke"))
        .with(
            "AxisScaleType",
            EnumValue::member(scale, "Linear").ok_or(StatusCode::BadNotFound)?,
        )
        .with("AxisSteps", vec![0.0, 50.0, 100.0, 250.0]);

    let container = ExtensionContainer::wrap(axis, NodeId::new(0, ids::AXIS_INFORMATION));
    let mut data = Vec::new();
    let sz = container.encode(&codec, &mut data)?;
    let hex: Vec<String> = data.iter().map(|b| format!("{:02x}", b)).collect();
    println!("AxisInformation as ExtensionObject, {} bytes:", sz);
    println!("{}", hex.join(" "));

    let received = ExtensionContainer::decode(&codec, &data)?;
    let record = received.unwrap(&codec)?;
    for (name, value) in record.iter() {
        println!("  {} = {:?}", name, value);
    }
    assert_eq!(received, container);

    let mut vendor: Vec<&TypeDescriptor> = registry
        .type_ids()
        .filter(|id| id.namespace != 0)
        .filter_map(|id| registry.resolve(id).ok())
        .collect();
    vendor.sort_by(|a, b| a.name().cmp(b.name()));
    for t in vendor {
        println!("{} {}", t.type_id(), t.name());
    }
    Ok(())
}
