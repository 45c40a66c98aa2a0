//! Registry Schema Importer
//!
//! Imports resource provider schemas (the JSON Schema dialect used by
//! resource registries) into a typed model of resources, properties,
//! attributes and shared type definitions.
//!
//! # Example
//!
//! ```
//! use registry_schema::{
//!     import_resource, Database, ImportOptions, MemoryDatabase, ProblemLog, PropertyType,
//! };
//! use serde_json::json;
//!
//! let document = json!({
//!     "typeName": "Example::Storage::Bucket",
//!     "properties": {
//!         "BucketName": { "type": "string" },
//!         "Arn": { "type": "string" },
//!         "Versioning": {
//!             "type": "object",
//!             "properties": { "Status": { "type": "string" } }
//!         }
//!     },
//!     "readOnlyProperties": ["/properties/Arn"],
//!     "createOnlyProperties": ["/properties/BucketName"]
//! });
//!
//! let mut db = MemoryDatabase::new();
//! let mut problems = ProblemLog::new();
//! let id = import_resource(&mut db, &document, &ImportOptions::new(), &mut problems).unwrap();
//!
//! let bucket = db.resource(id).unwrap();
//! assert!(bucket.attributes.contains_key("Arn"));
//! assert!(!bucket.properties.contains_key("Arn"));
//! assert!(matches!(
//!     bucket.properties["Versioning"].property_type,
//!     PropertyType::Ref { .. }
//! ));
//! assert!(problems.is_empty());
//! ```
//!
//! # Model Rules
//!
//! | Schema shape | Result |
//! |--------------|--------|
//! | object with `properties` (inline or `$ref`) | `TypeDefinition`, shared per location |
//! | `type: array` | `array{element}` |
//! | object with only `additionalProperties`/`patternProperties` | `map{element}` |
//! | object without properties, unmodelable unions | `json` |
//! | path in `readOnlyProperties` only | attribute, not a property |
//! | path in `createOnlyProperties` | `causesReplacement = yes` |

mod builder;
mod classify;
mod db;
mod error;
mod immutability;
mod import;
mod linter;
mod loader;
mod model;
mod problems;
mod refs;
mod required;
mod types;
mod validator;

pub use classify::parse_property_path;
pub use db::{
    types_used_by, Database, EntityRef, MemoryDatabase, Relation, RelationKind, ResourceField,
};
pub use error::{ImportError, LoadError, SchemaError};
pub use import::import_resource;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{collect_schema_files, is_url, load_schema, load_schema_auto, load_schema_str};
pub use model::{
    Attribute, BuiltInKind, Property, PropertyType, Replacement, Resource, ResourceId,
    TypeDefinition, TypeDefinitionId,
};
pub use problems::{Problem, ProblemKind, ProblemLog, ProblemReport};
pub use refs::{RefResolver, ResolvedRef};
pub use required::{intersect_branches, Requirements};
pub use types::{ImportOptions, WILDCARD};
pub use validator::validate_document;

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
