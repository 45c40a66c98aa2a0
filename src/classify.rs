//! Splits a resource's declared properties into settable properties and
//! read-only attributes.

use std::collections::BTreeSet;

use crate::model::{Attribute, PropertyType, Resource, TypeDefinition, TypeDefinitionId};
use crate::problems::{ProblemKind, ProblemSink};
use crate::refs::unescape;
use crate::types::WILDCARD;

/// Parses `/properties/A/B` into `["A", "B"]`.
///
/// Returns `None` for anything that is not a path below `/properties`.
pub fn parse_property_path(path: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix("/properties/")?;
    let segments: Vec<String> = rest.split('/').map(unescape).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments)
}

/// The type reached by following `segments` from `start`.
///
/// Named segments descend into definition fields, `*` into collection
/// elements.
pub(crate) fn walk_path<'t>(
    start: &'t PropertyType,
    segments: &[String],
    definitions: &'t [TypeDefinition],
) -> Option<&'t PropertyType> {
    let mut current = start;
    for segment in segments {
        current = if segment == WILDCARD {
            current.element()?
        } else {
            let id = current.definition()?;
            &definitions.get(id.0)?.fields.get(segment)?.property_type
        };
    }
    Some(current)
}

/// Moves read-only properties to attributes.
///
/// A path that is both read-only and create-only stays a property and does
/// not become an attribute. A read-only top-level property whose type is a
/// definition also yields one attribute per nested field.
pub(crate) fn classify_properties(
    resource: &mut Resource,
    definitions: &[TypeDefinition],
    read_only: &[Vec<String>],
    create_only: &[Vec<String>],
    problems: &mut ProblemSink,
) {
    let mut removed = Vec::new();

    for path in read_only {
        if create_only.contains(path) {
            continue;
        }
        let pointer = format!("/properties/{}", path.join("/"));
        let Some(top) = resource.properties.get(&path[0]) else {
            problems.report(
                ProblemKind::UnresolvedPath,
                pointer,
                "read-only path names no declared property",
            );
            continue;
        };
        let Some(property_type) = walk_path(&top.property_type, &path[1..], definitions) else {
            problems.report(
                ProblemKind::UnresolvedPath,
                pointer,
                "read-only path does not lead to a declared field",
            );
            continue;
        };

        let property_type = property_type.clone();
        let docs = if path.len() == 1 { top.docs.clone() } else { None };
        let name = attribute_name(path);

        if path.len() == 1 {
            removed.push(path[0].clone());
            if let Some(id) = property_type.definition() {
                let mut visited = BTreeSet::new();
                flatten(resource, definitions, id, &name, &mut visited);
            }
        }
        resource.attributes.insert(
            name.clone(),
            Attribute {
                name,
                property_type,
                docs,
            },
        );
    }

    for name in removed {
        resource.properties.remove(&name);
    }
}

/// Dot-joined property segments; `*` only selects elements and is left out.
fn attribute_name(path: &[String]) -> String {
    path.iter()
        .filter(|segment| segment.as_str() != WILDCARD)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(".")
}

/// Adds `prefix.Field` attributes for every field of `id`, recursing into
/// nested definitions once each.
fn flatten(
    resource: &mut Resource,
    definitions: &[TypeDefinition],
    id: TypeDefinitionId,
    prefix: &str,
    visited: &mut BTreeSet<TypeDefinitionId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Some(definition) = definitions.get(id.0) else {
        return;
    };
    for (field_name, field) in &definition.fields {
        let name = format!("{}.{}", prefix, field_name);
        if let Some(nested) = field.property_type.definition() {
            flatten(resource, definitions, nested, &name, visited);
        }
        resource
            .attributes
            .entry(name.clone())
            .or_insert_with(|| Attribute {
                name,
                property_type: field.property_type.clone(),
                docs: field.docs.clone(),
            });
    }
}
