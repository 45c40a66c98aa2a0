//! The imported model: resources, their properties and attributes, and the
//! named type definitions properties refer to.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Handle of a [`TypeDefinition`] inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeDefinitionId(pub usize);

/// Handle of a [`Resource`] inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

/// Types with dedicated handling downstream that are not plain JSON scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltInKind {
    /// `type: integer`.
    Integer,
    /// `type: string` with `format: date-time`.
    Timestamp,
}

/// The shape of a property value.
///
/// `Json` is the fallback for every schema shape that cannot be represented
/// precisely (untyped objects, unions of different types, and so on).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Array { element: Box<PropertyType> },
    Map { element: Box<PropertyType> },
    Ref { definition: TypeDefinitionId },
    BuiltIn { kind: BuiltInKind },
    Json,
}

impl PropertyType {
    pub fn array(element: PropertyType) -> Self {
        PropertyType::Array {
            element: Box::new(element),
        }
    }

    pub fn map(element: PropertyType) -> Self {
        PropertyType::Map {
            element: Box::new(element),
        }
    }

    /// Element type of a collection (array or map).
    pub fn element(&self) -> Option<&PropertyType> {
        match self {
            PropertyType::Array { element } | PropertyType::Map { element } => Some(element),
            _ => None,
        }
    }

    /// The definition this type points at, if it is a reference.
    pub fn definition(&self) -> Option<TypeDefinitionId> {
        match self {
            PropertyType::Ref { definition } => Some(*definition),
            _ => None,
        }
    }

    /// Rewrites every definition handle nested in this type.
    pub fn remap_definitions(&mut self, remap: &impl Fn(TypeDefinitionId) -> TypeDefinitionId) {
        match self {
            PropertyType::Array { element } | PropertyType::Map { element } => {
                element.remap_definitions(remap)
            }
            PropertyType::Ref { definition } => *definition = remap(*definition),
            _ => {}
        }
    }
}

/// Whether changing a property forces replacement of the resource.
///
/// `Unspecified` is distinct from `No`: the importer only ever sets `Yes`,
/// and consumers treat absence differently from an explicit `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Replacement {
    Yes,
    No,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub required: bool,
    pub causes_replacement: Replacement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: false,
            causes_replacement: Replacement::Unspecified,
            default_value: None,
            enum_values: Vec::new(),
            docs: None,
        }
    }
}

/// A read-only value exposed by a resource after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Dot-joined path, e.g. `Endpoint.Address`.
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// A named structured type shared by every property that refers to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    /// Type name of the resource whose import created this definition.
    pub resource: String,
    pub fields: BTreeMap<String, Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

impl TypeDefinition {
    /// An empty definition, populated after it has been registered.
    pub fn declare(
        name: impl Into<String>,
        resource: impl Into<String>,
        docs: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            fields: BTreeMap::new(),
            docs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Stable type name, e.g. `AWS::S3::Bucket`.
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    pub properties: BTreeMap<String, Property>,
    pub attributes: BTreeMap<String, Attribute>,
    /// Create-only paths that could not be attached to a single property,
    /// in input order and without duplicates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_replacement_properties: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_identifier: Vec<Vec<String>>,
    /// Name of the property holding the resource's tag collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_property: Option<String>,
}

impl Resource {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            docs: None,
            properties: BTreeMap::new(),
            attributes: BTreeMap::new(),
            additional_replacement_properties: Vec::new(),
            primary_identifier: Vec::new(),
            tag_property: None,
        }
    }

    /// Service part of the type name (`AWS::S3` for `AWS::S3::Bucket`).
    pub fn service(&self) -> &str {
        match self.type_name.rfind("::") {
            Some(idx) => &self.type_name[..idx],
            None => &self.type_name,
        }
    }

    pub(crate) fn add_replacement_path(&mut self, path: Vec<String>) {
        if !self.additional_replacement_properties.contains(&path) {
            self.additional_replacement_properties.push(path);
        }
    }

    pub(crate) fn remap_definitions(&mut self, remap: &impl Fn(TypeDefinitionId) -> TypeDefinitionId) {
        for property in self.properties.values_mut() {
            property.property_type.remap_definitions(remap);
        }
        for attribute in self.attributes.values_mut() {
            attribute.property_type.remap_definitions(remap);
        }
    }
}
