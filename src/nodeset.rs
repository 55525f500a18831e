// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode

//! NodeSet2 XML import.
//!
//! Reads the `UADataType` nodes of a NodeSet2 file together with their
//! `Definition` and the "Default Binary" encoding objects and registers them.
//! Namespace indices of the file are remapped onto the namespace table of the
//! registry. DataTypes that can't be described (Variant fields, matrices,
//! abstract numbers) are skipped with a warning, as is everything depending on them.
use crate::builtin::BuiltInType;
use crate::constants::{
    DataTypeEncoding, BASE_DATA_TYPE_ID, ENUMERATION_ID, HAS_ENCODING_ID, HAS_SUBTYPE_ID,
    INTEGER_ID, NUMBER_ID, STRUCTURE_ID, UINTEGER_ID, UNION_ID,
};
use crate::descriptor::{
    EnumBuilder, FieldDescriptor, StructureBuilder, TypeDescriptor, TypeRef,
};
use crate::error::{Result, TypeError};
use crate::registry::TypeRegistry;
use log::{debug, info, warn};
use opcua_types::{Identifier, NodeId};
use roxmltree::{Document, Node};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads the DataTypes of a NodeSet2 file, see [`load_nodeset_str`]
pub fn load_nodeset_file<P: AsRef<Path>>(path: P, registry: &mut TypeRegistry) -> Result<usize> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path).map_err(|e| {
        TypeError::InvalidSchema(format!("Failed to read NodeSet {}: {}", path.display(), e))
    })?;
    load_nodeset_str(&xml, registry)
}

/// Loads the DataTypes of a NodeSet2 document and returns the number of
/// structures and enumerations registered. On error the registry is left untouched.
pub fn load_nodeset_str(xml: &str, registry: &mut TypeRegistry) -> Result<usize> {
    let doc = Document::parse(xml)
        .map_err(|e| TypeError::InvalidSchema(format!("Failed to parse NodeSet: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "UANodeSet" {
        return Err(TypeError::InvalidSchema(format!(
            "Expected <UANodeSet>, found <{}>",
            root.tag_name().name()
        )));
    }
    let mut staged = registry.clone();
    let loader = Loader::new(root, &mut staged)?;
    let count = loader.load(&mut staged)?;
    staged.validate()?;
    *registry = staged;
    Ok(count)
}

struct RawField {
    name: String,
    data_type: Option<NodeId>,
    value_rank: i32,
    is_optional: bool,
    value: Option<i32>,
}

struct RawDataType {
    id: NodeId,
    name: String,
    is_abstract: bool,
    parent: Option<NodeId>,
    fields: Vec<RawField>,
    is_union: bool,
    is_option_set: bool,
    encodings: Vec<NodeId>,
}

impl RawDataType {
    /// Enumeration definitions carry values but no field types
    fn is_value_only(&self) -> bool {
        !self.is_option_set
            && !self.fields.is_empty()
            && self
                .fields
                .iter()
                .all(|f| f.value.is_some() && f.data_type.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Class {
    Structure,
    Union,
    Enumeration,
    Simple(BuiltInType),
    Unsupported,
}

struct Loader {
    /// file namespace index to registry namespace index
    ns_map: Vec<u16>,
    aliases: HashMap<String, String>,
    types: Vec<RawDataType>,
    /// encoding objects named "Default Binary" and the DataType they belong to, if known
    binary_encodings: HashMap<NodeId, Option<NodeId>>,
}

fn is_ns0(id: &NodeId, num: u32) -> bool {
    id.namespace == 0 && id.identifier == Identifier::Numeric(num)
}

fn strip_prefix(browse_name: &str) -> &str {
    match browse_name.split_once(':') {
        Some((_, name)) => name,
        None => browse_name,
    }
}

fn bool_attr(node: &Node, name: &str) -> bool {
    node.attribute(name).map(|v| v == "true").unwrap_or(false)
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

impl Loader {
    fn new(root: Node, registry: &mut TypeRegistry) -> Result<Self> {
        let mut ns_map = vec![0];
        if let Some(uris) = children(root, "NamespaceUris").next() {
            for uri in children(uris, "Uri") {
                let uri = uri.text().unwrap_or("").trim();
                ns_map.push(registry.add_namespace(uri));
            }
        }
        let mut aliases = HashMap::new();
        if let Some(list) = children(root, "Aliases").next() {
            for alias in children(list, "Alias") {
                if let (Some(name), Some(id)) = (alias.attribute("Alias"), alias.text()) {
                    aliases.insert(name.to_string(), id.trim().to_string());
                }
            }
        }
        let mut loader = Self {
            ns_map,
            aliases,
            types: Vec::new(),
            binary_encodings: HashMap::new(),
        };
        for node in children(root, "UAObject") {
            loader.read_encoding_object(node)?;
        }
        for node in children(root, "UADataType") {
            let raw = loader.read_data_type(node)?;
            loader.types.push(raw);
        }
        Ok(loader)
    }

    fn node_id(&self, text: &str) -> Result<NodeId> {
        let text = text.trim();
        let text = self.aliases.get(text).map(String::as_str).unwrap_or(text);
        let id = NodeId::from_str(text)
            .map_err(|_| TypeError::InvalidSchema(format!("Invalid NodeId {}", text)))?;
        let ns = self.ns_map.get(id.namespace as usize).ok_or_else(|| {
            TypeError::InvalidSchema(format!("Namespace index of {} is not declared", text))
        })?;
        Ok(NodeId {
            namespace: *ns,
            identifier: id.identifier,
        })
    }

    fn id_attr(&self, node: &Node, name: &str) -> Result<NodeId> {
        match node.attribute(name) {
            Some(text) => self.node_id(text),
            None => Err(TypeError::InvalidSchema(format!(
                "<{}> without {}",
                node.tag_name().name(),
                name
            ))),
        }
    }

    /// Reference types are given as alias, NodeId or plain browse name
    fn is_reference(&self, reference: &Node, id: u32, name: &str) -> bool {
        match reference.attribute("ReferenceType") {
            Some(t) if t == name => true,
            Some(t) => self.node_id(t).map(|t| is_ns0(&t, id)).unwrap_or(false),
            None => false,
        }
    }

    /// Targets of the references of `node` with the given type and direction
    fn references(&self, node: Node, id: u32, name: &str, forward: bool) -> Result<Vec<NodeId>> {
        let mut targets = Vec::new();
        if let Some(refs) = children(node, "References").next() {
            for r in children(refs, "Reference") {
                let is_forward = r.attribute("IsForward") != Some("false");
                if is_forward == forward && self.is_reference(&r, id, name) {
                    targets.push(self.node_id(r.text().unwrap_or(""))?);
                }
            }
        }
        Ok(targets)
    }

    fn read_encoding_object(&mut self, node: Node) -> Result<()> {
        let browse_name = node.attribute("BrowseName").unwrap_or("");
        match DataTypeEncoding::from(browse_name) {
            DataTypeEncoding::Binary => {}
            DataTypeEncoding::Xml | DataTypeEncoding::Json => {
                debug!(
                    "Ignoring encoding object {}, only binary bodies are supported",
                    browse_name
                );
                return Ok(());
            }
            DataTypeEncoding::Unknown => return Ok(()),
        }
        let id = self.id_attr(&node, "NodeId")?;
        let owner = self
            .references(node, HAS_ENCODING_ID, "HasEncoding", false)?
            .into_iter()
            .next();
        self.binary_encodings.insert(id, owner);
        Ok(())
    }

    fn read_data_type(&self, node: Node) -> Result<RawDataType> {
        let id = self.id_attr(&node, "NodeId")?;
        let name = strip_prefix(node.attribute("BrowseName").unwrap_or("")).to_string();
        let parent = self
            .references(node, HAS_SUBTYPE_ID, "HasSubtype", false)?
            .into_iter()
            .next();
        let encodings = self.references(node, HAS_ENCODING_ID, "HasEncoding", true)?;
        let mut raw = RawDataType {
            id,
            name,
            is_abstract: bool_attr(&node, "IsAbstract"),
            parent,
            fields: Vec::new(),
            is_union: false,
            is_option_set: false,
            encodings,
        };
        if let Some(def) = children(node, "Definition").next() {
            raw.is_union = bool_attr(&def, "IsUnion");
            raw.is_option_set = bool_attr(&def, "IsOptionSet");
            for field in children(def, "Field") {
                raw.fields.push(self.read_field(field)?);
            }
        }
        Ok(raw)
    }

    fn read_field(&self, node: Node) -> Result<RawField> {
        let name = node.attribute("Name").unwrap_or("").to_string();
        let data_type = match node.attribute("DataType") {
            Some(t) => Some(self.node_id(t)?),
            None => None,
        };
        let value_rank = match node.attribute("ValueRank") {
            Some(v) => v.trim().parse::<i32>().map_err(|_| {
                TypeError::InvalidSchema(format!("Invalid ValueRank {} of field {}", v, name))
            })?,
            None => -1,
        };
        let value = match node.attribute("Value") {
            Some(v) => Some(v.trim().parse::<i32>().map_err(|_| {
                TypeError::InvalidSchema(format!("Invalid Value {} of field {}", v, name))
            })?),
            None => None,
        };
        Ok(RawField {
            name,
            data_type,
            value_rank,
            is_optional: bool_attr(&node, "IsOptional"),
            value,
        })
    }

    /// Finds the root a DataType derives from
    fn classify(
        &self,
        id: &NodeId,
        index: &HashMap<NodeId, usize>,
        registry: &TypeRegistry,
        seen: &mut HashSet<NodeId>,
    ) -> Result<Class> {
        if is_ns0(id, STRUCTURE_ID) {
            return Ok(Class::Structure);
        }
        if is_ns0(id, UNION_ID) {
            return Ok(Class::Union);
        }
        if is_ns0(id, ENUMERATION_ID) {
            return Ok(Class::Enumeration);
        }
        if let Ok(d) = registry.resolve(id) {
            return Ok(match d {
                TypeDescriptor::Structure(s) if s.is_union() => Class::Union,
                TypeDescriptor::Structure(_) => Class::Structure,
                TypeDescriptor::Enumeration(_) => Class::Enumeration,
            });
        }
        if let Some(b) = registry.simple_base(id) {
            return Ok(Class::Simple(b));
        }
        let raw = match index.get(id) {
            Some(i) => &self.types[*i],
            None => return Ok(Class::Unsupported),
        };
        if !seen.insert(id.clone()) {
            return Err(TypeError::CyclicInheritance(id.clone()));
        }
        if raw.is_value_only() {
            return Ok(Class::Enumeration);
        }
        match &raw.parent {
            Some(parent) => {
                let class = self.classify(parent, index, registry, seen)?;
                Ok(match class {
                    Class::Structure if raw.is_union => Class::Union,
                    class => class,
                })
            }
            None => Ok(Class::Unsupported),
        }
    }

    fn field_type(
        &self,
        field: &RawField,
        registry: &TypeRegistry,
        candidates: &HashSet<NodeId>,
    ) -> std::result::Result<TypeRef, String> {
        if field.value_rank != -1 && field.value_rank != 1 {
            return Err(format!(
                "field {} has unsupported ValueRank {}",
                field.name, field.value_rank
            ));
        }
        let data_type = match &field.data_type {
            Some(t) => t,
            None => return Err(format!("field {} is a Variant", field.name)),
        };
        if is_ns0(data_type, BASE_DATA_TYPE_ID) {
            return Err(format!("field {} is a Variant", field.name));
        }
        if [NUMBER_ID, INTEGER_ID, UINTEGER_ID]
            .iter()
            .any(|n| is_ns0(data_type, *n))
        {
            return Err(format!("field {} has an abstract number type", field.name));
        }
        if let Some(b) = registry.simple_base(data_type) {
            Ok(TypeRef::BuiltIn(b))
        } else if registry.contains(data_type) || candidates.contains(data_type) {
            Ok(TypeRef::Type(data_type.clone()))
        } else {
            Err(format!(
                "field {} has unsupported type {}",
                field.name, data_type
            ))
        }
    }

    /// Binary encoding of a DataType, from either direction of HasEncoding
    fn binary_encoding(&self, raw: &RawDataType) -> Option<NodeId> {
        raw.encodings
            .iter()
            .find(|e| self.binary_encodings.contains_key(e))
            .cloned()
            .or_else(|| {
                self.binary_encodings
                    .iter()
                    .find(|(_, owner)| owner.as_ref() == Some(&raw.id))
                    .map(|(enc, _)| enc.clone())
            })
    }

    fn load(self, registry: &mut TypeRegistry) -> Result<usize> {
        let mut index = HashMap::new();
        for (i, raw) in self.types.iter().enumerate() {
            if registry.contains(&raw.id) {
                debug!("DataType {} ({}) is already registered", raw.name, raw.id);
                continue;
            }
            index.insert(raw.id.clone(), i);
        }

        let mut classes = HashMap::new();
        let mut simple = 0;
        for (id, i) in &index {
            let class = self.classify(id, &index, registry, &mut HashSet::new())?;
            match class {
                Class::Simple(b) => {
                    registry.register_simple(id.clone(), b);
                    simple += 1;
                }
                Class::Unsupported => {
                    warn!(
                        "Skipping DataType {} ({}), it has no supported base type",
                        self.types[*i].name, id
                    );
                }
                class => {
                    classes.insert(id.clone(), class);
                }
            }
        }

        // drop structures with unsupported parents or fields until nothing changes
        let mut candidates: HashSet<NodeId> = classes.keys().cloned().collect();
        loop {
            let mut rejected = Vec::new();
            for id in &candidates {
                if classes.get(id) == Some(&Class::Enumeration) {
                    continue;
                }
                let raw = &self.types[index[id]];
                if let Some(parent) = &raw.parent {
                    let rooted = is_ns0(parent, STRUCTURE_ID) || is_ns0(parent, UNION_ID);
                    if !rooted && !registry.contains(parent) && !candidates.contains(parent) {
                        rejected.push((id.clone(), format!("parent {} is skipped", parent)));
                        continue;
                    }
                }
                if let Some(reason) = raw
                    .fields
                    .iter()
                    .find_map(|f| self.field_type(f, registry, &candidates).err())
                {
                    rejected.push((id.clone(), reason));
                }
            }
            if rejected.is_empty() {
                break;
            }
            for (id, reason) in rejected {
                warn!(
                    "Skipping DataType {} ({}): {}",
                    self.types[index[&id]].name, id, reason
                );
                candidates.remove(&id);
            }
        }

        let mut count = 0;
        let mut pending = Vec::new();
        for raw in &self.types {
            if !candidates.contains(&raw.id) {
                continue;
            }
            if classes.get(&raw.id) == Some(&Class::Enumeration) {
                let mut builder = EnumBuilder::new(raw.id.clone(), raw.name.clone());
                for (i, f) in raw.fields.iter().enumerate() {
                    builder = builder.member(f.name.clone(), f.value.unwrap_or(i as i32));
                }
                registry.register(builder.build())?;
                count += 1;
            } else {
                pending.push(raw);
            }
        }

        // parents first so inherited fields repeated by the definition can be removed
        while !pending.is_empty() {
            let (ready, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|raw| {
                raw.parent
                    .as_ref()
                    .map(|p| {
                        is_ns0(p, STRUCTURE_ID) || is_ns0(p, UNION_ID) || registry.contains(p)
                    })
                    .unwrap_or(true)
            });
            if ready.is_empty() {
                // an inheritance cycle, validation reports it
                for raw in rest {
                    self.register_structure(raw, &classes, &candidates, registry)?;
                    count += 1;
                }
                break;
            }
            for raw in ready {
                self.register_structure(raw, &classes, &candidates, registry)?;
                count += 1;
            }
            pending = rest;
        }

        info!(
            "Loaded {} DataTypes and {} simple DataTypes from NodeSet, skipped {}",
            count,
            simple,
            index.len() - count - simple
        );
        Ok(count)
    }

    fn register_structure(
        &self,
        raw: &RawDataType,
        classes: &HashMap<NodeId, Class>,
        candidates: &HashSet<NodeId>,
        registry: &mut TypeRegistry,
    ) -> Result<()> {
        let mut builder = StructureBuilder::new(raw.id.clone(), raw.name.clone());
        let mut own_fields = &raw.fields[..];
        if let Some(parent) = &raw.parent {
            if !is_ns0(parent, STRUCTURE_ID) && !is_ns0(parent, UNION_ID) {
                builder = builder.parent(parent.clone());
                let inherited = registry.effective_fields(parent).unwrap_or_default();
                let repeats_inherited = own_fields.len() >= inherited.len()
                    && inherited
                        .iter()
                        .zip(own_fields.iter())
                        .all(|(i, f)| i.name == f.name);
                if !inherited.is_empty() && repeats_inherited {
                    own_fields = &own_fields[inherited.len()..];
                }
            }
        }
        for f in own_fields {
            let type_ref = self
                .field_type(f, registry, candidates)
                .map_err(TypeError::InvalidSchema)?;
            let mut field = FieldDescriptor::new(f.name.clone(), type_ref);
            if f.value_rank == 1 {
                field = field.array();
            }
            if f.is_optional {
                field = field.optional();
            }
            builder = builder.add_field(field);
        }
        if raw.is_abstract {
            builder = builder.abstract_type();
        }
        if classes.get(&raw.id) == Some(&Class::Union) {
            builder = builder.union();
        }
        if let Some(enc) = self.binary_encoding(raw) {
            builder = builder.binary_encoding_id(enc);
        }
        registry.register(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryCodec;
    use crate::extension::ExtensionContainer;
    use crate::value::{EnumValue, Record, Value};

    const NODESET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<UANodeSet xmlns="http://opcfoundation.org/UA/2011/03/UANodeSet.xsd">
  <NamespaceUris>
    <Uri>urn:example:shapes</Uri>
  </NamespaceUris>
  <Aliases>
    <Alias Alias="Boolean">i=1</Alias>
    <Alias Alias="Int32">i=6</Alias>
    <Alias Alias="Double">i=11</Alias>
    <Alias Alias="String">i=12</Alias>
    <Alias Alias="HasEncoding">i=38</Alias>
    <Alias Alias="HasSubtype">i=45</Alias>
  </Aliases>
  <UADataType NodeId="ns=1;i=3001" BrowseName="1:Color">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=29</Reference>
    </References>
    <Definition Name="1:Color">
      <Field Name="Red" Value="0" />
      <Field Name="Green" Value="1" />
      <Field Name="Blue" Value="4" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3002" BrowseName="1:Point">
    <References>
      <Reference ReferenceType="HasEncoding">ns=1;i=5002</Reference>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=22</Reference>
    </References>
    <Definition Name="1:Point">
      <Field Name="X" DataType="Double" />
      <Field Name="Y" DataType="Double" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3003" BrowseName="1:ColoredPoint">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">ns=1;i=3002</Reference>
    </References>
    <Definition Name="1:ColoredPoint">
      <Field Name="X" DataType="Double" />
      <Field Name="Y" DataType="Double" />
      <Field Name="Color" DataType="ns=1;i=3001" />
      <Field Name="Label" DataType="ns=1;i=3010" IsOptional="true" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3004" BrowseName="1:Polygon">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=22</Reference>
    </References>
    <Definition Name="1:Polygon">
      <Field Name="Points" DataType="ns=1;i=3002" ValueRank="1" />
      <Field Name="Closed" DataType="Boolean" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3005" BrowseName="1:Measure">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=12756</Reference>
    </References>
    <Definition Name="1:Measure" IsUnion="true">
      <Field Name="Count" DataType="Int32" />
      <Field Name="Length" DataType="Double" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3006" BrowseName="1:Tagged">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=22</Reference>
    </References>
    <Definition Name="1:Tagged">
      <Field Name="Tag" DataType="String" />
      <Field Name="Value" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3007" BrowseName="1:TaggedList">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">i=22</Reference>
    </References>
    <Definition Name="1:TaggedList">
      <Field Name="Items" DataType="ns=1;i=3006" ValueRank="1" />
    </Definition>
  </UADataType>
  <UADataType NodeId="ns=1;i=3010" BrowseName="1:LabelString">
    <References>
      <Reference ReferenceType="HasSubtype" IsForward="false">String</Reference>
    </References>
  </UADataType>
  <UAObject NodeId="ns=1;i=5002" BrowseName="Default Binary" SymbolicName="DefaultBinary">
    <References>
      <Reference ReferenceType="HasEncoding" IsForward="false">ns=1;i=3002</Reference>
    </References>
  </UAObject>
  <UAObject NodeId="ns=1;i=5003" BrowseName="Default Binary" SymbolicName="DefaultBinary">
    <References>
      <Reference ReferenceType="i=38" IsForward="false">ns=1;i=3003</Reference>
    </References>
  </UAObject>
  <UAObject NodeId="ns=1;i=5103" BrowseName="Default XML" SymbolicName="DefaultXml">
    <References>
      <Reference ReferenceType="HasEncoding" IsForward="false">ns=1;i=3003</Reference>
    </References>
  </UAObject>
</UANodeSet>"#;

    fn loaded() -> (TypeRegistry, u16) {
        let mut reg = TypeRegistry::new();
        reg.add_namespace("urn:example:other");
        let count = load_nodeset_str(NODESET, &mut reg).unwrap();
        assert_eq!(count, 5);
        let ns = reg.namespace_index("urn:example:shapes").unwrap();
        (reg, ns)
    }

    #[test]
    fn namespaces_are_remapped() {
        let (reg, ns) = loaded();
        assert_eq!(ns, 2);
        assert!(reg.contains(&NodeId::new(2, 3002)));
        assert!(!reg.contains(&NodeId::new(1, 3002)));
    }

    #[test]
    fn enumeration() {
        let (reg, ns) = loaded();
        let color = reg.resolve_enumeration(&NodeId::new(ns, 3001)).unwrap();
        assert_eq!(color.name, "Color");
        assert_eq!(color.member_by_value(4).map(|m| m.name.as_str()), Some("Blue"));
    }

    #[test]
    fn structures_and_encodings() {
        let (reg, ns) = loaded();
        let point = reg.resolve_structure(&NodeId::new(ns, 3002)).unwrap();
        assert_eq!(point.encoding_id(), &NodeId::new(ns, 5002));
        let colored = reg.resolve_structure(&NodeId::new(ns, 3003)).unwrap();
        // inherited X and Y are not repeated
        assert_eq!(colored.fields.len(), 2);
        assert_eq!(colored.encoding_id(), &NodeId::new(ns, 5003));
        let names: Vec<_> = reg
            .effective_fields(&NodeId::new(ns, 3003))
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["X", "Y", "Color", "Label"]);
        let label = &colored.fields[1];
        assert!(label.is_optional);
        assert_eq!(label.type_ref, TypeRef::BuiltIn(BuiltInType::String));
        assert!(reg.resolve_structure(&NodeId::new(ns, 3005)).unwrap().is_union());
        let polygon = reg.resolve_structure(&NodeId::new(ns, 3004)).unwrap();
        assert!(polygon.fields[0].is_array);
    }

    #[test]
    fn unsupported_types_are_skipped() {
        let (reg, ns) = loaded();
        assert!(!reg.contains(&NodeId::new(ns, 3006)));
        assert!(!reg.contains(&NodeId::new(ns, 3007)));
        assert_eq!(
            reg.simple_base(&NodeId::new(ns, 3010)),
            Some(BuiltInType::String)
        );
    }

    #[test]
    fn encode_loaded_type() {
        let (reg, ns) = loaded();
        let codec = BinaryCodec::new(&reg);
        let color = reg.resolve_enumeration(&NodeId::new(ns, 3001)).unwrap();
        let record = Record::new()
            .with("X", 1.0)
            .with("Y", 2.0)
            .with("Color", EnumValue::member(color, "Green").unwrap())
            .with("Label", "p1");
        let c = ExtensionContainer::wrap(record.clone(), NodeId::new(ns, 3003));
        let mut data = Vec::new();
        c.encode(&codec, &mut data).unwrap();
        let back = ExtensionContainer::decode(&codec, &data).unwrap();
        assert_eq!(back.unwrap(&codec).unwrap(), record);
        assert_eq!(
            record.get("Color").and_then(Value::as_enum).map(|e| e.value()),
            Some(1)
        );
    }

    #[test]
    fn loading_twice_skips_known_types() {
        let (mut reg, _) = loaded();
        let len = reg.len();
        assert_eq!(load_nodeset_str(NODESET, &mut reg).unwrap(), 0);
        assert_eq!(reg.len(), len);
    }

    #[test]
    fn malformed_documents() {
        let mut reg = TypeRegistry::new();
        assert!(matches!(
            load_nodeset_str("<UANodeSet>", &mut reg),
            Err(TypeError::InvalidSchema(_))
        ));
        assert!(matches!(
            load_nodeset_str("<Other/>", &mut reg),
            Err(TypeError::InvalidSchema(_))
        ));
        let undeclared = r#"<UANodeSet>
  <UADataType NodeId="ns=4;i=1" BrowseName="4:T" />
</UANodeSet>"#;
        assert!(matches!(
            load_nodeset_str(undeclared, &mut reg),
            Err(TypeError::InvalidSchema(_))
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn cyclic_definitions_leave_registry_untouched() {
        let cyclic = r#"<UANodeSet>
  <NamespaceUris><Uri>urn:cyclic</Uri></NamespaceUris>
  <UADataType NodeId="ns=1;i=1" BrowseName="1:A">
    <References><Reference ReferenceType="i=45" IsForward="false">ns=1;i=2</Reference></References>
  </UADataType>
  <UADataType NodeId="ns=1;i=2" BrowseName="1:B">
    <References><Reference ReferenceType="i=45" IsForward="false">ns=1;i=1</Reference></References>
  </UADataType>
</UANodeSet>"#;
        let mut reg = TypeRegistry::new();
        assert!(matches!(
            load_nodeset_str(cyclic, &mut reg),
            Err(TypeError::CyclicInheritance(_))
        ));
        assert!(reg.is_empty());
        assert_eq!(reg.namespaces().len(), 1);
    }
}
