// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use crate::builtin::BuiltInType;
use crate::constants::OPC_UA_NAMESPACE_URI;
use crate::descriptor::{EnumDescriptor, FieldDescriptor, StructureDescriptor, TypeDescriptor};
use crate::descriptor::TypeRef;
use crate::error::{Result, TypeError};
use log::{debug, error};
use opcua_types::NodeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An OPC UA encoding mask has one bit per optional field
pub const MAX_OPTIONAL_FIELDS: usize = 32;

/// Catalog of DataType descriptors.
/// Populate it once, call `validate`, then share it read only.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<NodeId, TypeDescriptor>,
    encodings: HashMap<NodeId, NodeId>,
    simple_types: HashMap<NodeId, BuiltInType>,
    namespaces: Vec<String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            encodings: HashMap::new(),
            simple_types: HashMap::new(),
            namespaces: vec![OPC_UA_NAMESPACE_URI.to_string()],
        }
    }

    /// Freezes the registry for concurrent readers
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Adds a descriptor, the parent of a structure may be registered later
    pub fn register<T: Into<TypeDescriptor>>(&mut self, descriptor: T) -> Result<()> {
        let descriptor = descriptor.into();
        let type_id = descriptor.type_id().clone();
        if self.types.contains_key(&type_id) {
            return Err(TypeError::DuplicateType(type_id));
        }
        if let TypeDescriptor::Structure(s) = &descriptor {
            if let Some(enc) = &s.binary_encoding_id {
                if self.encodings.contains_key(enc) || self.types.contains_key(enc) {
                    return Err(TypeError::DuplicateType(enc.clone()));
                }
                self.encodings.insert(enc.clone(), type_id.clone());
            }
        }
        debug!("Registered DataType {} ({})", descriptor.name(), type_id);
        self.types.insert(type_id, descriptor);
        Ok(())
    }

    pub fn register_all<T, I>(&mut self, descriptors: I) -> Result<()>
    where
        T: Into<TypeDescriptor>,
        I: IntoIterator<Item = T>,
    {
        for d in descriptors {
            self.register(d)?;
        }
        Ok(())
    }

    /// Records a DataType that is encoded like a built-in type, e.g. a subtype of String
    pub fn register_simple(&mut self, type_id: NodeId, base: BuiltInType) {
        debug!("Registered simple DataType {} as {}", type_id, base);
        self.simple_types.insert(type_id, base);
    }

    /// Built-in type that encodes `type_id`, if it is a built-in or a simple subtype of one
    pub fn simple_base(&self, type_id: &NodeId) -> Option<BuiltInType> {
        self.simple_types
            .get(type_id)
            .copied()
            .or_else(|| crate::standard::simple_type_base(type_id))
    }

    pub fn contains(&self, type_id: &NodeId) -> bool {
        self.types.contains_key(type_id)
    }

    pub fn resolve(&self, type_id: &NodeId) -> Result<&TypeDescriptor> {
        self.types
            .get(type_id)
            .ok_or_else(|| TypeError::UnknownType(type_id.clone()))
    }

    pub fn resolve_structure(&self, type_id: &NodeId) -> Result<&StructureDescriptor> {
        self.resolve(type_id)?
            .as_structure()
            .ok_or_else(|| TypeError::TypeMismatch {
                type_id: type_id.clone(),
                expected: "structure",
            })
    }

    pub fn resolve_enumeration(&self, type_id: &NodeId) -> Result<&EnumDescriptor> {
        self.resolve(type_id)?
            .as_enumeration()
            .ok_or_else(|| TypeError::TypeMismatch {
                type_id: type_id.clone(),
                expected: "enumeration",
            })
    }

    /// Looks up the type behind an ExtensionObject type id.
    /// Senders without encoding objects use the DataType id, so that is accepted too.
    pub fn resolve_encoding(&self, encoding_id: &NodeId) -> Result<&TypeDescriptor> {
        match self.encodings.get(encoding_id) {
            Some(type_id) => self.resolve(type_id),
            None => self.resolve(encoding_id),
        }
    }

    /// Chain of structures from the type itself up to its root
    pub fn ancestors(&self, type_id: &NodeId) -> Result<Vec<&StructureDescriptor>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_id.clone());
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                error!("Cyclic inheritance detected at {}", id);
                return Err(TypeError::CyclicInheritance(id));
            }
            let s = self.resolve_structure(&id)?;
            current = s.parent.clone();
            chain.push(s);
        }
        Ok(chain)
    }

    /// Inherited fields followed by own fields, in declaration order
    pub fn effective_fields(&self, type_id: &NodeId) -> Result<Vec<FieldDescriptor>> {
        let chain = self.ancestors(type_id)?;
        let mut names = HashSet::new();
        let mut fields = Vec::new();
        for s in chain.iter().rev() {
            for f in &s.fields {
                if !names.insert(f.name.as_str()) {
                    return Err(TypeError::DuplicateField {
                        type_id: type_id.clone(),
                        field: f.name.clone(),
                    });
                }
                fields.push(f.clone());
            }
        }
        Ok(fields)
    }

    /// True if `type_id` equals `ancestor` or extends it
    pub fn is_subtype_of(&self, type_id: &NodeId, ancestor: &NodeId) -> Result<bool> {
        Ok(self
            .ancestors(type_id)?
            .iter()
            .any(|s| &s.type_id == ancestor))
    }

    /// Checks every structure for a resolvable, acyclic ancestry, unique field names,
    /// resolvable field types and encodable layouts
    pub fn validate(&self) -> Result<()> {
        for descriptor in self.types.values() {
            let s = match descriptor {
                TypeDescriptor::Structure(s) => s,
                TypeDescriptor::Enumeration(e) => {
                    let mut names = HashSet::new();
                    for m in &e.members {
                        if !names.insert(m.name.as_str()) {
                            error!("Enumeration {} lists {} twice", e.type_id, m.name);
                            return Err(TypeError::DuplicateField {
                                type_id: e.type_id.clone(),
                                field: m.name.clone(),
                            });
                        }
                    }
                    continue;
                }
            };
            if let Some(parent) = &s.parent {
                if !self.contains(parent) {
                    error!("Parent {} of {} is not registered", parent, s.type_id);
                    return Err(TypeError::UnknownType(parent.clone()));
                }
            }
            let fields = self.effective_fields(&s.type_id)?;
            for f in &fields {
                if let TypeRef::Type(id) = &f.type_ref {
                    if !self.contains(id) {
                        error!("Field {} of {} references unknown type {}", f.name, s.type_id, id);
                        return Err(TypeError::UnknownType(id.clone()));
                    }
                }
            }
            let optional = fields.iter().filter(|f| f.is_optional).count();
            if s.is_union() && optional > 0 {
                return Err(TypeError::InvalidSchema(format!(
                    "union {} declares optional fields",
                    s.type_id
                )));
            }
            if optional > MAX_OPTIONAL_FIELDS {
                return Err(TypeError::InvalidSchema(format!(
                    "structure {} has {} optional fields, at most {} are encodable",
                    s.type_id, optional, MAX_OPTIONAL_FIELDS
                )));
            }
        }
        Ok(())
    }

    /// Index of a namespace uri
    pub fn namespace_index(&self, uri: &str) -> Option<u16> {
        self.namespaces
            .iter()
            .position(|n| n == uri)
            .map(|i| i as u16)
    }

    /// Adds a namespace uri if missing and returns its index
    pub fn add_namespace(&mut self, uri: &str) -> u16 {
        if let Some(idx) = self.namespace_index(uri) {
            idx
        } else {
            self.namespaces.push(uri.to_string());
            (self.namespaces.len() - 1) as u16
        }
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.types.keys()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
