//! Conversion of schema nodes into property types.
//!
//! Only object-shaped nodes with at least one declared property become
//! [`TypeDefinition`]s. Definitions are keyed by schema location (the `$ref`
//! target or the inline node's pointer), so every occurrence of the same
//! location yields the same definition. A definition is registered before
//! its fields are built; a field that refers back to it resolves to the
//! already-issued handle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::error::ImportError;
use crate::model::{BuiltInKind, Property, PropertyType, TypeDefinition, TypeDefinitionId};
use crate::problems::{ProblemKind, ProblemSink};
use crate::refs::{escape, RefResolver, ResolvedRef};
use crate::required::{required_list, Requirements};
use crate::types::{json_type_name, BRANCH_KEYWORDS, ELEMENT_SUFFIX};

/// The entity a reference is made from, for `usesType` relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Owner {
    Resource,
    Definition(TypeDefinitionId),
}

/// A declared field of an object node, before its type is resolved.
#[derive(Debug)]
struct Field<'a> {
    name: String,
    node: &'a Value,
    location: String,
}

/// Fields and required set of an object node, branches folded in.
#[derive(Debug, Default)]
struct ObjectShape<'a> {
    fields: Vec<Field<'a>>,
    required: BTreeSet<String>,
}

impl<'a> ObjectShape<'a> {
    fn add_fields(&mut self, node: &'a Value, location: &str) {
        let Some(properties) = node.get("properties").and_then(Value::as_object) else {
            return;
        };
        for (name, schema) in properties {
            if self.fields.iter().any(|f| &f.name == name) {
                continue;
            }
            self.fields.push(Field {
                name: name.clone(),
                node: schema,
                location: format!("{}/properties/{}", location, escape(name)),
            });
        }
    }
}

/// Definition state to restore when a resolved subtree is discarded.
#[derive(Debug)]
struct Checkpoint {
    definitions: usize,
    uses: BTreeSet<(Owner, TypeDefinitionId)>,
    by_location: HashMap<String, TypeDefinitionId>,
    names: HashMap<String, String>,
}

/// Resolution state of one resource import.
///
/// Definition handles issued here index `definitions` and are only valid
/// until the import is committed to a store.
pub(crate) struct ImportContext<'a> {
    resource: String,
    refs: RefResolver<'a>,
    pub(crate) definitions: Vec<TypeDefinition>,
    pub(crate) uses: BTreeSet<(Owner, TypeDefinitionId)>,
    pub(crate) problems: ProblemSink,
    by_location: HashMap<String, TypeDefinitionId>,
    names: HashMap<String, String>,
    aliases: Vec<String>,
}

impl<'a> ImportContext<'a> {
    pub(crate) fn new(document: &'a Value, resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            refs: RefResolver::new(document),
            definitions: Vec::new(),
            uses: BTreeSet::new(),
            problems: ProblemSink::new(resource),
            by_location: HashMap::new(),
            names: reserved_names(document),
            aliases: Vec::new(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            definitions: self.definitions.len(),
            uses: self.uses.clone(),
            by_location: self.by_location.clone(),
            names: self.names.clone(),
        }
    }

    /// Forgets every definition declared since `checkpoint`.
    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.definitions.truncate(checkpoint.definitions);
        self.uses = checkpoint.uses;
        self.by_location = checkpoint.by_location;
        self.names = checkpoint.names;
    }

    /// Builds the properties of an object node (the resource root or a
    /// definition), with requiredness merged across branches.
    pub(crate) fn build_fields(
        &mut self,
        node: &'a Value,
        location: &str,
        owner: Owner,
    ) -> Result<BTreeMap<String, Property>, ImportError> {
        let shape = self.object_shape(node, location)?;
        self.fields_from_shape(shape, owner)
    }

    /// Maps a schema node to a property type, creating definitions for the
    /// object shapes it contains.
    pub(crate) fn type_from_schema_node(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        let Some(map) = node.as_object() else {
            self.problems.report(
                ProblemKind::UnsupportedShape,
                location,
                format!("expected a schema object, got {}", json_type_name(node)),
            );
            return Ok(PropertyType::Json);
        };

        if let Some(reference) = map.get("$ref") {
            let Some(reference) = reference.as_str() else {
                self.problems.report(
                    ProblemKind::UnsupportedShape,
                    location,
                    "$ref is not a string",
                );
                return Ok(PropertyType::Json);
            };
            return self.type_from_reference(reference, naming, owner);
        }

        match map.get("type") {
            Some(Value::String(tag)) => self.type_from_tag(tag, node, location, naming, owner),
            Some(Value::Array(tags)) => {
                let tags: Vec<&str> = tags.iter().filter_map(Value::as_str).collect();
                match tags.as_slice() {
                    [single] => self.type_from_tag(single, node, location, naming, owner),
                    _ => {
                        self.problems.report(
                            ProblemKind::UnsupportedShape,
                            location,
                            format!("type union [{}] is modeled as json", tags.join(", ")),
                        );
                        Ok(PropertyType::Json)
                    }
                }
            }
            Some(other) => {
                self.problems.report(
                    ProblemKind::UnsupportedShape,
                    location,
                    format!("type must be a string, got {}", json_type_name(other)),
                );
                Ok(PropertyType::Json)
            }
            None => self.untyped(node, location, naming, owner),
        }
    }

    fn type_from_tag(
        &mut self,
        tag: &str,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        match tag {
            "string" => {
                if node.get("format").and_then(Value::as_str) == Some("date-time") {
                    Ok(PropertyType::BuiltIn {
                        kind: BuiltInKind::Timestamp,
                    })
                } else {
                    Ok(PropertyType::String)
                }
            }
            "integer" => Ok(PropertyType::BuiltIn {
                kind: BuiltInKind::Integer,
            }),
            "number" => Ok(PropertyType::Number),
            "boolean" => Ok(PropertyType::Boolean),
            "array" => {
                let element = match node.get("items") {
                    Some(items) => self.type_from_schema_node(
                        items,
                        &format!("{}/items", location),
                        &element_name(naming),
                        owner,
                    )?,
                    None => PropertyType::Json,
                };
                Ok(PropertyType::array(element))
            }
            "object" => self.object_type(node, location, naming, owner),
            other => {
                self.problems.report(
                    ProblemKind::UnsupportedShape,
                    location,
                    format!("type \"{}\" is modeled as json", other),
                );
                Ok(PropertyType::Json)
            }
        }
    }

    fn untyped(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        if let Some(defined) = self.defined_type(node, location, naming, owner)? {
            return Ok(defined);
        }
        if node.get("oneOf").is_some() || node.get("anyOf").is_some() {
            return self.union_type(node, location, naming, owner);
        }
        if node.get("items").is_some() {
            return self.type_from_tag("array", node, location, naming, owner);
        }
        if node.get("additionalProperties").is_some() || node.get("patternProperties").is_some() {
            return self.map_type(node, location, naming, owner);
        }
        let string_enum = node
            .get("enum")
            .and_then(Value::as_array)
            .is_some_and(|values| !values.is_empty() && values.iter().all(Value::is_string));
        if string_enum {
            return Ok(PropertyType::String);
        }
        Ok(PropertyType::Json)
    }

    fn type_from_reference(
        &mut self,
        reference: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        let target = self.resolve_ref(reference)?;
        if target.pointer == "#" {
            self.problems.report(
                ProblemKind::UnsupportedShape,
                "#",
                "reference to the document root is modeled as json",
            );
            return Ok(PropertyType::Json);
        }

        if let Some(definition) = self.reuse(&target.pointer, owner) {
            return Ok(PropertyType::Ref { definition });
        }
        if let Some(shape) = self.definition_shape(target.node, &target.pointer)? {
            let definition = self.define(target.node, &target.pointer, &target.name, owner, shape)?;
            return Ok(PropertyType::Ref { definition });
        }

        // The target is not an object with fields (an aliased primitive,
        // array or map); resolve it in place, named after the definition.
        if self.aliases.contains(&target.pointer) {
            self.problems.report(
                ProblemKind::UnsupportedShape,
                target.pointer.as_str(),
                format!("{} refers to itself without an object in between", naming),
            );
            return Ok(PropertyType::Json);
        }
        self.aliases.push(target.pointer.clone());
        let resolved = self.type_from_schema_node(target.node, &target.pointer, &target.name, owner);
        self.aliases.pop();
        resolved
    }

    fn object_type(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        match self.defined_type(node, location, naming, owner)? {
            Some(defined) => Ok(defined),
            None => self.map_type(node, location, naming, owner),
        }
    }

    /// A reference to the definition for an inline object node, if the node
    /// qualifies as one.
    fn defined_type(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<Option<PropertyType>, ImportError> {
        if let Some(definition) = self.reuse(location, owner) {
            return Ok(Some(PropertyType::Ref { definition }));
        }
        let Some(shape) = self.definition_shape(node, location)? else {
            return Ok(None);
        };
        let definition = self.define(node, location, naming, owner, shape)?;
        Ok(Some(PropertyType::Ref { definition }))
    }

    /// Objects without declared properties: maps when the value schema is
    /// known, json otherwise.
    fn map_type(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        if let Some(additional) = node.get("additionalProperties").filter(|v| v.is_object()) {
            let element = self.type_from_schema_node(
                additional,
                &format!("{}/additionalProperties", location),
                &element_name(naming),
                owner,
            )?;
            return Ok(PropertyType::map(element));
        }

        let Some(patterns) = node
            .get("patternProperties")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty())
        else {
            return Ok(PropertyType::Json);
        };

        let mut element: Option<PropertyType> = None;
        for (pattern, schema) in patterns {
            let resolved = self.type_from_schema_node(
                schema,
                &format!("{}/patternProperties/{}", location, escape(pattern)),
                &element_name(naming),
                owner,
            )?;
            match &element {
                None => element = Some(resolved),
                Some(existing) if *existing == resolved => {}
                Some(_) => {
                    self.problems.report(
                        ProblemKind::UnsupportedShape,
                        location,
                        "patternProperties with differing value types is modeled as json",
                    );
                    return Ok(PropertyType::Json);
                }
            }
        }
        Ok(PropertyType::map(element.unwrap_or(PropertyType::Json)))
    }

    /// Property-level `oneOf`/`anyOf`: collapses when every alternative maps
    /// to the same type.
    fn union_type(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
    ) -> Result<PropertyType, ImportError> {
        let mut branches = Vec::new();
        for keyword in ["oneOf", "anyOf"] {
            if let Some(list) = node.get(keyword).and_then(Value::as_array) {
                for (idx, branch) in list.iter().enumerate() {
                    branches.push((branch, format!("{}/{}/{}", location, keyword, idx)));
                }
            }
        }

        let mut object_branches = 0;
        for (branch, branch_location) in &branches {
            if self.is_object_shaped(*branch, branch_location)? {
                object_branches += 1;
            }
        }
        if object_branches > 1 {
            self.problems.report(
                ProblemKind::UnsupportedShape,
                location,
                "alternatives over several object shapes are modeled as json",
            );
            return Ok(PropertyType::Json);
        }

        // Branches are resolved speculatively; a json fallback must not
        // leave behind definitions or usesType edges from earlier branches.
        let checkpoint = self.checkpoint();
        let mut result: Option<PropertyType> = None;
        for (branch, branch_location) in branches {
            let resolved = self.type_from_schema_node(branch, &branch_location, naming, owner)?;
            match &result {
                None => result = Some(resolved),
                Some(existing) if *existing == resolved => {}
                Some(_) => {
                    self.rollback(checkpoint);
                    self.problems.report(
                        ProblemKind::UnsupportedShape,
                        location,
                        "alternatives of different types are modeled as json",
                    );
                    return Ok(PropertyType::Json);
                }
            }
        }
        Ok(result.unwrap_or(PropertyType::Json))
    }

    fn is_object_shaped(&mut self, node: &'a Value, location: &str) -> Result<bool, ImportError> {
        match node.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                let target = self.resolve_ref(reference)?;
                Ok(self.definition_shape(target.node, &target.pointer)?.is_some())
            }
            None => Ok(self.definition_shape(node, location)?.is_some()),
        }
    }

    /// The shape of `node` if it becomes a definition: an object (declared
    /// or implied) with at least one field after folding branches.
    fn definition_shape(
        &mut self,
        node: &'a Value,
        location: &str,
    ) -> Result<Option<ObjectShape<'a>>, ImportError> {
        if node.get("$ref").is_some() {
            return Ok(None);
        }
        match node.get("type") {
            Some(Value::String(tag)) if tag == "object" => {}
            None if has_own_properties(node) || has_constraint_branches(node) => {}
            _ => return Ok(None),
        }
        let shape = self.object_shape(node, location)?;
        Ok((!shape.fields.is_empty()).then_some(shape))
    }

    fn object_shape(
        &mut self,
        node: &'a Value,
        location: &str,
    ) -> Result<ObjectShape<'a>, ImportError> {
        let mut shape = ObjectShape::default();
        let mut requirements = Requirements {
            own: required_list(node),
            ..Requirements::default()
        };
        shape.add_fields(node, location);

        for &keyword in BRANCH_KEYWORDS {
            let Some(branches) = node.get(keyword).and_then(Value::as_array) else {
                continue;
            };
            let mut group = Vec::new();
            for (idx, branch) in branches.iter().enumerate() {
                let (branch, branch_location) = match ref_only(branch) {
                    Some(reference) => {
                        let target = self.resolve_ref(reference)?;
                        (target.node, target.pointer)
                    }
                    None => (branch, format!("{}/{}/{}", location, keyword, idx)),
                };
                shape.add_fields(branch, &branch_location);
                if keyword == "allOf" {
                    requirements.all_of.push(required_list(branch));
                } else {
                    group.push(required_list(branch));
                }
            }
            if keyword != "allOf" {
                requirements.alternatives.push(group);
            }
        }

        shape.required = requirements.merge();
        Ok(shape)
    }

    fn fields_from_shape(
        &mut self,
        shape: ObjectShape<'a>,
        owner: Owner,
    ) -> Result<BTreeMap<String, Property>, ImportError> {
        let mut fields = BTreeMap::new();
        for field in shape.fields {
            let property_type =
                self.type_from_schema_node(field.node, &field.location, &field.name, owner)?;
            let mut property = Property::new(field.name.clone(), property_type);
            property.required = shape.required.contains(&field.name);
            property.docs = description(field.node);
            property.default_value = field.node.get("default").cloned();
            property.enum_values = field
                .node
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            fields.insert(field.name, property);
        }
        Ok(fields)
    }

    fn define(
        &mut self,
        node: &'a Value,
        location: &str,
        naming: &str,
        owner: Owner,
        shape: ObjectShape<'a>,
    ) -> Result<TypeDefinitionId, ImportError> {
        let name = self.claim_name(naming, location);
        let id = TypeDefinitionId(self.definitions.len());
        tracing::debug!(resource = %self.resource, definition = %name, location, "declaring type definition");

        self.definitions
            .push(TypeDefinition::declare(name, self.resource.as_str(), description(node)));
        self.by_location.insert(location.to_string(), id);
        self.uses.insert((owner, id));

        let fields = self.fields_from_shape(shape, Owner::Definition(id))?;
        self.definitions[id.0].fields = fields;
        Ok(id)
    }

    fn reuse(&mut self, location: &str, owner: Owner) -> Option<TypeDefinitionId> {
        let id = self.by_location.get(location).copied()?;
        self.uses.insert((owner, id));
        Some(id)
    }

    /// Reserves `base` for `location`, or the first free `base2`, `base3`, ...
    /// when another location already holds it.
    fn claim_name(&mut self, base: &str, location: &str) -> String {
        let holder = match self.names.get(base) {
            None => {
                self.names.insert(base.to_string(), location.to_string());
                return base.to_string();
            }
            Some(holder) if holder == location => return base.to_string(),
            Some(holder) => holder.clone(),
        };

        let mut n = 2;
        let candidate = loop {
            let candidate = format!("{}{}", base, n);
            if !self.names.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.problems.report(
            ProblemKind::NameCollision,
            location,
            format!(
                "type name {} is already used by {}; named {} instead",
                base, holder, candidate
            ),
        );
        self.names.insert(candidate.clone(), location.to_string());
        candidate
    }

    fn resolve_ref(&mut self, reference: &str) -> Result<ResolvedRef<'a>, ImportError> {
        self.refs
            .resolve(reference)
            .ok_or_else(|| ImportError::RefNotFound {
                reference: reference.to_string(),
                resource: self.resource.clone(),
            })
    }
}

/// Names of the document's own object definitions, held for their `$ref`
/// locations so inline objects never take them.
fn reserved_names(document: &Value) -> HashMap<String, String> {
    let mut names = HashMap::new();
    for section in ["definitions", "$defs"] {
        let Some(entries) = document.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, node) in entries {
            let object_like = match node.get("type") {
                Some(Value::String(tag)) => tag == "object",
                None => node.get("$ref").is_none(),
                Some(_) => false,
            };
            if object_like && (has_own_properties(node) || has_constraint_branches(node)) {
                names
                    .entry(name.clone())
                    .or_insert_with(|| format!("#/{}/{}", section, escape(name)));
            }
        }
    }
    names
}

fn element_name(naming: &str) -> String {
    format!("{}{}", naming, ELEMENT_SUFFIX)
}

fn description(node: &Value) -> Option<String> {
    node.get("description")
        .and_then(Value::as_str)
        .map(String::from)
}

fn has_own_properties(node: &Value) -> bool {
    node.get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
}

/// Branches that only add `required`/`properties` to the enclosing object,
/// as opposed to alternative types.
fn has_constraint_branches(node: &Value) -> bool {
    let mut branches = BRANCH_KEYWORDS
        .iter()
        .filter_map(|k| node.get(*k).and_then(Value::as_array))
        .flatten()
        .peekable();
    branches.peek().is_some()
        && branches.all(|b| b.get("type").is_none() && b.get("$ref").is_none())
}

fn ref_only(branch: &Value) -> Option<&str> {
    let map = branch.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("$ref").and_then(Value::as_str)
}
