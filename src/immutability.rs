//! Marks create-only properties as causing replacement.
//!
//! Flags set on a definition's field are shared by every resource that uses
//! the definition. Paths into the resource's tag collection are recorded on
//! the resource instead, since tags are not modeled as ordinary structures
//! downstream.

use crate::model::{PropertyType, Replacement, Resource, TypeDefinition};
use crate::problems::{ProblemKind, ProblemSink};
use crate::types::{TAG_KEY_FIELD, TAG_VALUE_FIELD, WILDCARD};

pub(crate) fn propagate_replacement(
    resource: &mut Resource,
    definitions: &mut [TypeDefinition],
    create_only: &[Vec<String>],
    problems: &mut ProblemSink,
) {
    for path in create_only {
        let top = &path[0];
        let pointer = format!("/properties/{}", path.join("/"));

        if path.len() > 1 && resource.tag_property.as_deref() == Some(top.as_str()) {
            resource.add_replacement_path(path.clone());
            continue;
        }

        let Some(property) = resource.properties.get_mut(top) else {
            problems.report(
                ProblemKind::UnresolvedPath,
                pointer,
                "create-only path names no declared property",
            );
            continue;
        };

        // The last named segment after the top-level property, as
        // (definition, field). A trailing `*` leaves the holder marked.
        let mut target = None;
        let mut current = property.property_type.clone();
        let mut resolved = true;
        for segment in &path[1..] {
            if segment == WILDCARD {
                match current.element() {
                    Some(element) => current = element.clone(),
                    None => {
                        resolved = false;
                        break;
                    }
                }
                continue;
            }
            let field = current
                .definition()
                .and_then(|id| Some((id, definitions.get(id.0)?.fields.get(segment)?)));
            match field {
                Some((id, field)) => {
                    current = field.property_type.clone();
                    target = Some((id, segment));
                }
                None => {
                    resolved = false;
                    break;
                }
            }
        }

        if !resolved {
            problems.report(
                ProblemKind::UnresolvedPath,
                pointer,
                "create-only path does not lead to a declared field",
            );
            continue;
        }

        match target {
            None => property.causes_replacement = Replacement::Yes,
            Some((id, field_name)) => {
                if let Some(field) = definitions
                    .get_mut(id.0)
                    .and_then(|d| d.fields.get_mut(field_name))
                {
                    field.causes_replacement = Replacement::Yes;
                }
            }
        }
    }
}

/// Whether a property type looks like a tag collection: key/value elements
/// or a string map.
pub(crate) fn is_tag_like(property_type: &PropertyType, definitions: &[TypeDefinition]) -> bool {
    let Some(element) = property_type.element() else {
        return false;
    };
    match element {
        PropertyType::String => matches!(property_type, PropertyType::Map { .. }),
        PropertyType::Ref { definition } => definitions.get(definition.0).is_some_and(|d| {
            d.fields.contains_key(TAG_KEY_FIELD) && d.fields.contains_key(TAG_VALUE_FIELD)
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::parse_property_path;
    use crate::model::{Property, TypeDefinitionId};

    fn path(p: &str) -> Vec<String> {
        parse_property_path(p).unwrap()
    }

    fn fixture() -> (Resource, Vec<TypeDefinition>) {
        let mut nested = TypeDefinition::declare("Nested", "A::B::C", None);
        nested.fields.insert(
            "ImmutableField".into(),
            Property::new("ImmutableField", PropertyType::String),
        );
        nested
            .fields
            .insert("Other".into(), Property::new("Other", PropertyType::String));

        let mut tag = TypeDefinition::declare("Tag", "A::B::C", None);
        tag.fields
            .insert("Key".into(), Property::new("Key", PropertyType::String));
        tag.fields
            .insert("Value".into(), Property::new("Value", PropertyType::String));

        let nested_ref = PropertyType::Ref {
            definition: TypeDefinitionId(0),
        };
        let mut resource = Resource::new("A::B::C");
        for (name, ty) in [
            ("Prop1", PropertyType::String),
            ("Prop2", nested_ref.clone()),
            ("Prop3", PropertyType::array(nested_ref)),
            (
                "Tags",
                PropertyType::array(PropertyType::Ref {
                    definition: TypeDefinitionId(1),
                }),
            ),
        ] {
            resource.properties.insert(name.into(), Property::new(name, ty));
        }
        resource.tag_property = Some("Tags".into());
        (resource, vec![nested, tag])
    }

    #[test]
    fn marks_properties_and_shared_fields() {
        let (mut resource, mut definitions) = fixture();
        let create_only = vec![
            path("/properties/Prop1"),
            path("/properties/Prop2/ImmutableField"),
            path("/properties/Prop3/*/ImmutableField"),
        ];
        let mut problems = ProblemSink::new("A::B::C");
        propagate_replacement(&mut resource, &mut definitions, &create_only, &mut problems);

        assert_eq!(resource.properties["Prop1"].causes_replacement, Replacement::Yes);
        assert_eq!(
            resource.properties["Prop2"].causes_replacement,
            Replacement::Unspecified
        );
        assert_eq!(
            definitions[0].fields["ImmutableField"].causes_replacement,
            Replacement::Yes
        );
        assert_eq!(
            definitions[0].fields["Other"].causes_replacement,
            Replacement::Unspecified
        );
        assert_eq!(problems.len(), 0);
    }

    #[test]
    fn tag_paths_are_recorded_on_resource() {
        let (mut resource, mut definitions) = fixture();
        let create_only = vec![path("/properties/Tags/*/Key")];
        let mut problems = ProblemSink::new("A::B::C");
        propagate_replacement(&mut resource, &mut definitions, &create_only, &mut problems);

        assert_eq!(
            resource.additional_replacement_properties,
            vec![vec!["Tags".to_string(), "*".to_string(), "Key".to_string()]]
        );
        assert_eq!(
            definitions[1].fields["Key"].causes_replacement,
            Replacement::Unspecified
        );
    }

    #[test]
    fn trailing_wildcard_marks_collection() {
        let (mut resource, mut definitions) = fixture();
        let create_only = vec![path("/properties/Prop3/*")];
        let mut problems = ProblemSink::new("A::B::C");
        propagate_replacement(&mut resource, &mut definitions, &create_only, &mut problems);

        assert_eq!(resource.properties["Prop3"].causes_replacement, Replacement::Yes);
    }

    #[test]
    fn unresolvable_paths_are_reported() {
        let (mut resource, mut definitions) = fixture();
        let create_only = vec![
            path("/properties/Missing"),
            path("/properties/Prop1/Sub"),
            path("/properties/Prop2/*"),
        ];
        let mut problems = ProblemSink::new("A::B::C");
        propagate_replacement(&mut resource, &mut definitions, &create_only, &mut problems);

        assert_eq!(problems.len(), 3);
        assert_eq!(
            resource.properties["Prop1"].causes_replacement,
            Replacement::Unspecified
        );
    }

    #[test]
    fn tag_like_shapes() {
        let (resource, definitions) = fixture();
        assert!(is_tag_like(&resource.properties["Tags"].property_type, &definitions));
        assert!(!is_tag_like(&resource.properties["Prop3"].property_type, &definitions));
        assert!(is_tag_like(&PropertyType::map(PropertyType::String), &definitions));
        assert!(!is_tag_like(&PropertyType::array(PropertyType::String), &definitions));
    }
}
