//! Import of one resource document into a store.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::builder::{ImportContext, Owner};
use crate::classify::{classify_properties, parse_property_path};
use crate::db::{Database, EntityRef, Relation, ResourceField};
use crate::error::ImportError;
use crate::immutability::{is_tag_like, propagate_replacement};
use crate::model::{Resource, ResourceId, TypeDefinition, TypeDefinitionId};
use crate::problems::{ProblemKind, ProblemReport, ProblemSink};
use crate::types::ImportOptions;

/// Imports a parsed resource provider schema.
///
/// The whole document is resolved before anything is written, so a fatal
/// error leaves the store untouched. Problems found along the way are sent
/// to `report` whether or not the import succeeds.
///
/// # Errors
///
/// Returns `ImportError::RefNotFound` if a `$ref` does not resolve within
/// the document, and `MissingTypeName`/`InvalidDocument`/`DuplicateResource`
/// for documents that cannot be identified or are already in the store.
pub fn import_resource(
    db: &mut dyn Database,
    document: &Value,
    options: &ImportOptions,
    report: &mut dyn ProblemReport,
) -> Result<ResourceId, ImportError> {
    if !document.is_object() {
        return Err(ImportError::InvalidDocument {
            message: "document root is not an object".to_string(),
        });
    }
    let type_name = document
        .get("typeName")
        .and_then(Value::as_str)
        .ok_or(ImportError::MissingTypeName)?;
    if !db
        .lookup_resources(ResourceField::TypeName, type_name)
        .is_empty()
    {
        return Err(ImportError::DuplicateResource {
            type_name: type_name.to_string(),
        });
    }

    let mut ctx = ImportContext::new(document, type_name);
    let outcome = resolve_resource(&mut ctx, document, type_name, options);

    let ImportContext {
        definitions,
        uses,
        problems,
        ..
    } = ctx;
    let problem_count = problems.len();
    problems.flush(report);
    let resource = outcome?;

    let definition_count = definitions.len();
    let id = commit(db, resource, definitions, uses);
    tracing::debug!(
        resource = %type_name,
        definitions = definition_count,
        problems = problem_count,
        "imported resource"
    );
    Ok(id)
}

fn resolve_resource<'a>(
    ctx: &mut ImportContext<'a>,
    document: &'a Value,
    type_name: &str,
    options: &ImportOptions,
) -> Result<Resource, ImportError> {
    let mut resource = Resource::new(type_name);
    resource.docs = document
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);
    resource.properties = ctx.build_fields(document, "#", Owner::Resource)?;

    let read_only = path_list(document, "readOnlyProperties", &mut ctx.problems);
    let create_only = path_list(document, "createOnlyProperties", &mut ctx.problems);
    resource.primary_identifier = path_list(document, "primaryIdentifier", &mut ctx.problems);

    resource.tag_property = tag_property(document, &resource, &ctx.definitions, options);

    classify_properties(
        &mut resource,
        &ctx.definitions,
        &read_only,
        &create_only,
        &mut ctx.problems,
    );
    propagate_replacement(
        &mut resource,
        &mut ctx.definitions,
        &create_only,
        &mut ctx.problems,
    );
    Ok(resource)
}

/// Parses one of the document's pointer lists, reporting entries that are
/// not `/properties/...` paths.
fn path_list(document: &Value, key: &str, problems: &mut ProblemSink) -> Vec<Vec<String>> {
    let Some(entries) = document.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut paths = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match entry.as_str().and_then(parse_property_path) {
            Some(path) => paths.push(path),
            None => problems.report(
                ProblemKind::UnresolvedPath,
                format!("/{}/{}", key, idx),
                format!("{} is not a /properties/... path", entry),
            ),
        }
    }
    paths
}

/// The resource's tag collection property, if it has a tag-like one.
fn tag_property(
    document: &Value,
    resource: &Resource,
    definitions: &[TypeDefinition],
    options: &ImportOptions,
) -> Option<String> {
    let tagging = document.get("tagging");
    if tagging.and_then(|t| t.get("taggable")).and_then(Value::as_bool) == Some(false) {
        return None;
    }
    let name = tagging
        .and_then(|t| t.get("tagProperty"))
        .and_then(Value::as_str)
        .and_then(parse_property_path)
        .and_then(|path| path.into_iter().next())
        .unwrap_or_else(|| options.tag_property.clone());

    let property = resource.properties.get(&name)?;
    is_tag_like(&property.property_type, definitions).then_some(name)
}

/// Writes the staged definitions, resource and relations to the store.
///
/// Definitions are declared empty first, so cyclic references can be
/// rewritten to store handles before any fields are filled in.
fn commit(
    db: &mut dyn Database,
    mut resource: Resource,
    definitions: Vec<TypeDefinition>,
    uses: std::collections::BTreeSet<(Owner, TypeDefinitionId)>,
) -> ResourceId {
    let ids: Vec<TypeDefinitionId> = definitions
        .iter()
        .map(|d| {
            db.add_type_definition(TypeDefinition::declare(
                d.name.clone(),
                d.resource.clone(),
                d.docs.clone(),
            ))
        })
        .collect();
    let remap = |local: TypeDefinitionId| ids[local.0];

    for (local, definition) in definitions.into_iter().enumerate() {
        let mut fields: BTreeMap<_, _> = definition.fields;
        for field in fields.values_mut() {
            field.property_type.remap_definitions(&remap);
        }
        if let Some(stored) = db.type_definition_mut(ids[local]) {
            stored.fields = fields;
        }
    }

    resource.remap_definitions(&remap);
    let resource_id = db.add_resource(resource);

    for (owner, target) in uses {
        let from = match owner {
            Owner::Resource => EntityRef::Resource(resource_id),
            Owner::Definition(local) => EntityRef::TypeDefinition(ids[local.0]),
        };
        db.add_relation(Relation::uses_type(from, ids[target.0]));
    }
    resource_id
}
