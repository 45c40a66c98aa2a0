//! Entity/relation store the importer writes into.
//!
//! The importer only needs entity creation, field-equality lookup, relation
//! traversal and enumeration. [`MemoryDatabase`] is the in-process store used
//! by the CLI and tests; other stores implement [`Database`].

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use crate::model::{Resource, ResourceId, TypeDefinition, TypeDefinitionId};

/// Either side of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityRef {
    Resource(ResourceId),
    TypeDefinition(TypeDefinitionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// Resource or definition -> definition it references.
    UsesType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub from: EntityRef,
    pub to: TypeDefinitionId,
}

impl Relation {
    pub fn uses_type(from: EntityRef, to: TypeDefinitionId) -> Self {
        Self {
            kind: RelationKind::UsesType,
            from,
            to,
        }
    }
}

/// Resource fields that support equality lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    TypeName,
    Service,
}

pub trait Database {
    fn add_resource(&mut self, resource: Resource) -> ResourceId;

    fn add_type_definition(&mut self, definition: TypeDefinition) -> TypeDefinitionId;

    /// Records a relation. Recording the same relation twice has no effect.
    fn add_relation(&mut self, relation: Relation);

    fn resource(&self, id: ResourceId) -> Option<&Resource>;

    fn type_definition(&self, id: TypeDefinitionId) -> Option<&TypeDefinition>;

    fn type_definition_mut(&mut self, id: TypeDefinitionId) -> Option<&mut TypeDefinition>;

    /// Resources whose `field` equals `value`.
    fn lookup_resources(&self, field: ResourceField, value: &str) -> Vec<ResourceId>;

    /// Distinct targets of `kind` relations leaving `from`.
    fn follow(&self, kind: RelationKind, from: EntityRef) -> Vec<TypeDefinitionId>;

    fn all_resources(&self) -> Vec<ResourceId>;

    fn all_type_definitions(&self) -> Vec<TypeDefinitionId>;
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDatabase {
    resources: Vec<Resource>,
    type_definitions: Vec<TypeDefinition>,
    relations: BTreeSet<Relation>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// First resource with the given type name.
    pub fn resource_named(&self, type_name: &str) -> Option<(ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .find(|(_, r)| r.type_name == type_name)
            .map(|(idx, r)| (ResourceId(idx), r))
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

impl Database for MemoryDatabase {
    fn add_resource(&mut self, resource: Resource) -> ResourceId {
        self.resources.push(resource);
        ResourceId(self.resources.len() - 1)
    }

    fn add_type_definition(&mut self, definition: TypeDefinition) -> TypeDefinitionId {
        self.type_definitions.push(definition);
        TypeDefinitionId(self.type_definitions.len() - 1)
    }

    fn add_relation(&mut self, relation: Relation) {
        self.relations.insert(relation);
    }

    fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.0)
    }

    fn type_definition(&self, id: TypeDefinitionId) -> Option<&TypeDefinition> {
        self.type_definitions.get(id.0)
    }

    fn type_definition_mut(&mut self, id: TypeDefinitionId) -> Option<&mut TypeDefinition> {
        self.type_definitions.get_mut(id.0)
    }

    fn lookup_resources(&self, field: ResourceField, value: &str) -> Vec<ResourceId> {
        self.resources
            .iter()
            .enumerate()
            .filter(|(_, r)| match field {
                ResourceField::TypeName => r.type_name == value,
                ResourceField::Service => r.service() == value,
            })
            .map(|(idx, _)| ResourceId(idx))
            .collect()
    }

    fn follow(&self, kind: RelationKind, from: EntityRef) -> Vec<TypeDefinitionId> {
        // Relations are a set, so targets are already distinct.
        self.relations
            .iter()
            .filter(|r| r.kind == kind && r.from == from)
            .map(|r| r.to)
            .collect()
    }

    fn all_resources(&self) -> Vec<ResourceId> {
        (0..self.resources.len()).map(ResourceId).collect()
    }

    fn all_type_definitions(&self) -> Vec<TypeDefinitionId> {
        (0..self.type_definitions.len()).map(TypeDefinitionId).collect()
    }
}

/// Every definition a resource depends on, directly or transitively.
///
/// Each definition appears once, in breadth-first order; cycles are fine.
pub fn types_used_by(db: &dyn Database, resource: ResourceId) -> Vec<TypeDefinitionId> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<EntityRef> = VecDeque::from([EntityRef::Resource(resource)]);

    while let Some(from) = queue.pop_front() {
        for target in db.follow(RelationKind::UsesType, from) {
            if seen.insert(target) {
                order.push(target);
                queue.push_back(EntityRef::TypeDefinition(target));
            }
        }
    }
    order
}
