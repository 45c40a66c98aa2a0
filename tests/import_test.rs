//! Import behavior through the public API.

use registry_schema::{
    import_resource, types_used_by, Database, ImportError, ImportOptions, MemoryDatabase,
    ProblemKind, ProblemLog, PropertyType, Replacement, Resource, ResourceId, TypeDefinition,
};
use serde_json::{json, Value};

fn import(document: Value) -> (MemoryDatabase, ResourceId, ProblemLog) {
    let mut db = MemoryDatabase::new();
    let mut problems = ProblemLog::new();
    let id = import_resource(&mut db, &document, &ImportOptions::new(), &mut problems).unwrap();
    (db, id, problems)
}

fn resource(db: &MemoryDatabase, id: ResourceId) -> &Resource {
    db.resource(id).unwrap()
}

fn definition_named<'d>(db: &'d MemoryDatabase, name: &str) -> &'d TypeDefinition {
    db.all_type_definitions()
        .into_iter()
        .filter_map(|id| db.type_definition(id))
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no definition named {}", name))
}

fn required_names(resource: &Resource) -> Vec<&str> {
    resource
        .properties
        .values()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect()
}

mod classification {
    use super::*;

    #[test]
    fn read_only_becomes_attribute() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Name": { "type": "string" },
                "Arn": { "type": "string", "description": "Resource ARN" }
            },
            "readOnlyProperties": ["/properties/Arn"]
        }));
        let thing = resource(&db, id);

        assert!(thing.properties.contains_key("Name"));
        assert!(!thing.properties.contains_key("Arn"));
        assert_eq!(thing.attributes["Arn"].property_type, PropertyType::String);
        assert_eq!(thing.attributes["Arn"].docs.as_deref(), Some("Resource ARN"));
        assert!(problems.is_empty());
    }

    #[test]
    fn read_only_and_create_only_stays_property() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": { "Id": { "type": "string" } },
            "readOnlyProperties": ["/properties/Id"],
            "createOnlyProperties": ["/properties/Id"]
        }));
        let thing = resource(&db, id);

        assert!(thing.attributes.is_empty());
        assert_eq!(thing.properties["Id"].causes_replacement, Replacement::Yes);
    }

    #[test]
    fn compound_read_only_property() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "CompoundProp": {
                    "type": "object",
                    "properties": {
                        "Id": { "type": "string" },
                        "Property": { "type": "string" }
                    }
                }
            },
            "readOnlyProperties": [
                "/properties/CompoundProp",
                "/properties/CompoundProp/Id",
                "/properties/CompoundProp/Property"
            ]
        }));
        let thing = resource(&db, id);

        let names: Vec<_> = thing.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["CompoundProp", "CompoundProp.Id", "CompoundProp.Property"]
        );
        assert!(thing.properties.is_empty());
        assert!(problems.is_empty());
    }
}

mod element_attributes {
    use super::*;

    #[test]
    fn wildcard_is_left_out_of_attribute_names() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "List": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "Id": { "type": "string" } }
                    }
                }
            },
            "readOnlyProperties": ["/properties/List/*/Id"]
        }));
        let thing = resource(&db, id);

        let names: Vec<_> = thing.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["List.Id"]);
        assert!(thing.properties.contains_key("List"));
        assert!(problems.is_empty());
    }
}

mod type_definitions {
    use super::*;

    #[test]
    fn inline_objects_named_after_property() {
        let object = json!({
            "type": "object",
            "properties": { "Ripe": { "type": "boolean" } }
        });
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Fruit",
            "properties": {
                "Banana": object.clone(),
                "Bananas": { "type": "array", "items": object }
            }
        }));

        let banana = definition_named(&db, "Banana");
        assert_eq!(banana.resource, "Test::Service::Fruit");
        assert!(banana.fields.contains_key("Ripe"));
        definition_named(&db, "BananasItems");
        assert_eq!(types_used_by(&db, id).len(), 2);
    }

    #[test]
    fn shared_reference_is_one_definition() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "definitions": {
                "Endpoint": {
                    "type": "object",
                    "properties": { "Address": { "type": "string" } }
                }
            },
            "properties": {
                "Primary": { "$ref": "#/definitions/Endpoint" },
                "Secondary": { "$ref": "#/definitions/Endpoint" }
            }
        }));

        let used = types_used_by(&db, id);
        assert_eq!(used.len(), 1);
        assert_eq!(db.type_definition(used[0]).unwrap().name, "Endpoint");
        assert_eq!(db.all_type_definitions().len(), 1);
    }

    #[test]
    fn primitive_arrays_and_bare_objects_have_no_definitions() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Names": { "type": "array", "items": { "type": "string" } },
                "Blob": { "type": "object" }
            }
        }));
        let thing = resource(&db, id);

        assert!(db.all_type_definitions().is_empty());
        assert_eq!(
            thing.properties["Names"].property_type,
            PropertyType::array(PropertyType::String)
        );
        assert_eq!(thing.properties["Blob"].property_type, PropertyType::Json);
    }

    #[test]
    fn recursive_definitions_are_traversed_once() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Tree",
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "Children": { "type": "array", "items": { "$ref": "#/definitions/Node" } },
                        "Leaf": {
                            "type": "object",
                            "properties": { "Value": { "type": "string" } }
                        }
                    }
                }
            },
            "properties": { "Root": { "$ref": "#/definitions/Node" } }
        }));

        let mut names: Vec<_> = types_used_by(&db, id)
            .into_iter()
            .map(|d| db.type_definition(d).unwrap().name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Leaf", "Node"]);
    }

    #[test]
    fn json_union_creates_no_definitions() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Either": {
                    "oneOf": [
                        { "type": "string" },
                        { "type": "object", "properties": { "A": { "type": "string" } } }
                    ]
                }
            }
        }));

        assert_eq!(
            resource(&db, id).properties["Either"].property_type,
            PropertyType::Json
        );
        assert!(db.all_type_definitions().is_empty());
        assert!(types_used_by(&db, id).is_empty());
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn referenced_definition_name_wins_in_either_order() {
        let config = json!({ "type": "object", "properties": { "Id": { "type": "string" } } });
        let inline = json!({ "type": "object", "properties": { "Other": { "type": "string" } } });
        let inline_first = json!({
            "typeName": "Test::Service::InlineFirst",
            "definitions": { "Config": config.clone() },
            "properties": {
                "Config": inline.clone(),
                "Settings": { "$ref": "#/definitions/Config" }
            }
        });
        let ref_first = json!({
            "typeName": "Test::Service::RefFirst",
            "definitions": { "Config": config },
            "properties": {
                "Settings": { "$ref": "#/definitions/Config" },
                "Config": inline
            }
        });

        for document in [inline_first, ref_first] {
            let (db, id, problems) = import(document);
            let thing = resource(&db, id);
            let name_of = |property: &str| {
                let definition = thing.properties[property].property_type.definition().unwrap();
                db.type_definition(definition).unwrap().name.clone()
            };
            assert_eq!(name_of("Settings"), "Config");
            assert_eq!(name_of("Config"), "Config2");
            let kinds: Vec<_> = problems.iter().map(|p| p.kind).collect();
            assert_eq!(kinds, vec![ProblemKind::NameCollision]);
        }
    }

    #[test]
    fn definitions_are_not_merged_across_resources() {
        let endpoint = json!({
            "Endpoint": {
                "type": "object",
                "properties": { "Address": { "type": "string" } }
            }
        });
        let mut db = MemoryDatabase::new();
        let mut problems = ProblemLog::new();
        let options = ImportOptions::new();
        for type_name in ["Test::Service::One", "Test::Service::Two"] {
            let document = json!({
                "typeName": type_name,
                "definitions": endpoint.clone(),
                "properties": { "Endpoint": { "$ref": "#/definitions/Endpoint" } }
            });
            import_resource(&mut db, &document, &options, &mut problems).unwrap();
        }

        let owners: Vec<_> = db
            .all_type_definitions()
            .into_iter()
            .map(|id| db.type_definition(id).unwrap().resource.clone())
            .collect();
        assert_eq!(owners, vec!["Test::Service::One", "Test::Service::Two"]);
    }
}

mod requiredness {
    use super::*;

    #[test]
    fn one_of_keeps_names_required_by_every_branch() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Mutex1": { "type": "string" },
                "Mutex2": { "type": "string" },
                "InBoth": { "type": "string" }
            },
            "oneOf": [
                { "required": ["Mutex1", "InBoth"] },
                { "required": ["Mutex2", "InBoth"] }
            ]
        }));

        assert_eq!(required_names(resource(&db, id)), vec!["InBoth"]);
    }

    #[test]
    fn any_of_without_own_required_is_empty() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "prop1": { "type": "string" },
                "prop2": { "type": "string" }
            },
            "anyOf": [
                { "required": ["prop1"] },
                { "required": ["prop2"] }
            ]
        }));

        assert!(required_names(resource(&db, id)).is_empty());
    }

    #[test]
    fn own_required_is_kept_alongside_branches() {
        let (db, id, _) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Name": { "type": "string" },
                "A": { "type": "string" },
                "B": { "type": "string" }
            },
            "required": ["Name"],
            "anyOf": [{ "required": ["A"] }, { "required": ["B"] }]
        }));

        assert_eq!(required_names(resource(&db, id)), vec!["Name"]);
    }
}

mod replacement {
    use super::*;

    fn immutable_holder() -> Value {
        json!({
            "type": "object",
            "properties": {
                "ImmutableField": { "type": "string" },
                "Other": { "type": "string" }
            }
        })
    }

    #[test]
    fn create_only_paths_mark_properties_and_fields() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Prop1": { "type": "string" },
                "Prop2": immutable_holder(),
                "Prop3": { "type": "array", "items": immutable_holder() }
            },
            "createOnlyProperties": [
                "/properties/Prop1",
                "/properties/Prop2/ImmutableField",
                "/properties/Prop3/*/ImmutableField"
            ]
        }));
        let thing = resource(&db, id);

        assert_eq!(thing.properties["Prop1"].causes_replacement, Replacement::Yes);
        assert_eq!(
            thing.properties["Prop2"].causes_replacement,
            Replacement::Unspecified
        );
        for name in ["Prop2", "Prop3Items"] {
            let definition = definition_named(&db, name);
            assert_eq!(
                definition.fields["ImmutableField"].causes_replacement,
                Replacement::Yes
            );
            assert_eq!(
                definition.fields["Other"].causes_replacement,
                Replacement::Unspecified
            );
        }
        assert!(thing.additional_replacement_properties.is_empty());
        assert!(problems.is_empty());
    }

    #[test]
    fn tag_paths_stay_on_the_resource() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "definitions": {
                "Tag": {
                    "type": "object",
                    "properties": {
                        "Key": { "type": "string" },
                        "Value": { "type": "string" }
                    }
                }
            },
            "properties": {
                "Tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
            },
            "createOnlyProperties": ["/properties/Tags/*/Key"]
        }));
        let thing = resource(&db, id);

        assert_eq!(thing.tag_property.as_deref(), Some("Tags"));
        assert_eq!(
            thing.additional_replacement_properties,
            vec![vec!["Tags".to_string(), "*".to_string(), "Key".to_string()]]
        );
        let tag = definition_named(&db, "Tag");
        assert_eq!(tag.fields["Key"].causes_replacement, Replacement::Unspecified);
        assert_eq!(
            thing.properties["Tags"].causes_replacement,
            Replacement::Unspecified
        );
        assert!(problems.is_empty());
    }
}

mod failures {
    use super::*;

    #[test]
    fn unresolved_ref_aborts_without_inserting() {
        let mut db = MemoryDatabase::new();
        let mut problems = ProblemLog::new();
        let document = json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Good": { "type": "object", "properties": { "A": { "type": "string" } } },
                "Bad": { "$ref": "#/definitions/Missing" }
            }
        });

        let err = import_resource(&mut db, &document, &ImportOptions::new(), &mut problems)
            .unwrap_err();
        assert!(matches!(err, ImportError::RefNotFound { ref reference, .. }
            if reference == "#/definitions/Missing"));
        assert!(db.all_resources().is_empty());
        assert!(db.all_type_definitions().is_empty());
        assert_eq!(db.relation_count(), 0);
    }

    #[test]
    fn irregularities_are_reported_not_fatal() {
        let (db, id, problems) = import(json!({
            "typeName": "Test::Service::Thing",
            "properties": {
                "Mixed": { "type": ["string", "number"] }
            },
            "readOnlyProperties": ["/properties/Missing"]
        }));

        assert_eq!(
            resource(&db, id).properties["Mixed"].property_type,
            PropertyType::Json
        );
        let kinds: Vec<_> = problems.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![ProblemKind::UnsupportedShape, ProblemKind::UnresolvedPath]
        );
        assert!(problems
            .for_resource("Test::Service::Thing")
            .all(|p| p.resource == "Test::Service::Thing"));
    }
}
