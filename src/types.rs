//! Import options and schema dialect constants.

use serde_json::Value;

/// Path segment meaning "every element of the collection".
pub const WILDCARD: &str = "*";

/// Suffix appended to the owning name for inline objects used as
/// collection elements (`Bananas` -> `BananasItems`).
pub const ELEMENT_SUFFIX: &str = "Items";

/// Branch keywords that may carry `required` and `properties`.
pub const BRANCH_KEYWORDS: &[&str] = &["allOf", "oneOf", "anyOf"];

/// Field names of a tag element.
pub const TAG_KEY_FIELD: &str = "Key";
pub const TAG_VALUE_FIELD: &str = "Value";

/// Returns the JSON type name for messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for importing resource documents.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Tag collection property used when the document does not name one
    /// through `tagging.tagProperty`.
    pub tag_property: String,
    /// Callers should treat any reported problem as a failure.
    pub strict: bool,
    /// Check documents against the registry shape before importing.
    pub validate: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportOptions {
    /// Options with `Tags` as the fallback tag property, strict mode off and
    /// shape validation on.
    pub fn new() -> Self {
        Self {
            tag_property: "Tags".to_string(),
            strict: false,
            validate: true,
        }
    }

    pub fn tag_property(mut self, name: impl Into<String>) -> Self {
        self.tag_property = name.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}
