//! Shape check of registry documents before import.
//!
//! This only covers what the importer relies on; it is not the full
//! provider definition meta-schema.

use serde_json::{json, Value};

use crate::error::{LoadError, SchemaError};

fn registry_meta_schema() -> Value {
    json!({
        "type": "object",
        "required": ["typeName", "properties"],
        "properties": {
            "typeName": {
                "type": "string",
                "pattern": "^[a-zA-Z0-9]+::[a-zA-Z0-9]+::[a-zA-Z0-9]+$"
            },
            "description": { "type": "string" },
            "properties": {
                "type": "object",
                "additionalProperties": { "type": "object" }
            },
            "definitions": {
                "type": "object",
                "additionalProperties": { "type": "object" }
            },
            "required": { "type": "array", "items": { "type": "string" } },
            "readOnlyProperties": { "$ref": "#/$defs/pathList" },
            "createOnlyProperties": { "$ref": "#/$defs/pathList" },
            "writeOnlyProperties": { "$ref": "#/$defs/pathList" },
            "primaryIdentifier": { "$ref": "#/$defs/pathList" },
            "tagging": {
                "type": "object",
                "properties": {
                    "taggable": { "type": "boolean" },
                    "tagProperty": { "type": "string", "pattern": "^/properties/" }
                }
            }
        },
        "$defs": {
            "pathList": {
                "type": "array",
                "items": { "type": "string", "pattern": "^/properties/" }
            }
        }
    })
}

/// Check a parsed document against the registry document shape.
///
/// # Errors
///
/// Returns `LoadError::MetaSchema` listing every violation.
pub fn validate_document(document: &Value) -> Result<(), LoadError> {
    let meta = registry_meta_schema();
    let validator = jsonschema::validator_for(&meta).map_err(|e| LoadError::MetaSchema {
        errors: vec![SchemaError {
            path: "/".to_string(),
            message: format!("registry meta-schema does not compile: {}", e),
        }],
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MetaSchema { errors })
    }
}
