//! Static validation of references between the fields of a form.
//!
//! Rendering evaluates fields strictly in definition order and tolerates bad
//! references (they resolve to empty strings). This check catches them up
//! front, when a form is saved.

use formwork_core::{Field, Form, ResolveError};
use formwork_parser::{scan_field_references, split_template};
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

type References = SmallVec<[String; 4]>;

/// Class names referenced by any templated string of a field, deduplicated,
/// in order of first appearance.
pub fn field_references(field: &Field) -> References {
    let mut references = References::new();
    for source in field.templated_strings() {
        let template = split_template(source);
        if !template.has_expression() {
            continue;
        }
        for reference in scan_field_references(template.body) {
            if !references.contains(&reference.class_name) {
                references.push(reference.class_name);
            }
        }
    }
    references
}

/// Validate the reference graph of a form.
///
/// Reports duplicate class names, self references, references to unknown or
/// later fields, and reference cycles. All problems are collected.
pub fn validate_form(form: &Form) -> Result<(), Vec<ResolveError>> {
    let mut errors = Vec::new();

    let mut seen = IndexSet::new();
    let mut duplicates = IndexSet::new();
    for field in &form.fields {
        if !seen.insert(field.class_name.as_str()) && duplicates.insert(field.class_name.as_str()) {
            errors.push(ResolveError::DuplicateClassName {
                class_name: field.class_name.clone(),
            });
        }
    }

    let mut graph: IndexMap<&str, References> = IndexMap::new();
    for (index, field) in form.fields.iter().enumerate() {
        let mut edges = References::new();
        for reference in field_references(field) {
            if reference == field.class_name {
                errors.push(ResolveError::SelfReference {
                    field: field.class_name.clone(),
                });
                continue;
            }
            match form.position(&reference) {
                None => errors.push(ResolveError::UnknownField {
                    field: field.class_name.clone(),
                    reference,
                }),
                Some(target) => {
                    if target > index {
                        errors.push(ResolveError::ForwardReference {
                            field: field.class_name.clone(),
                            reference: reference.clone(),
                        });
                    }
                    edges.push(reference);
                }
            }
        }
        graph.entry(field.class_name.as_str()).or_default().extend(edges);
    }

    errors.extend(find_cycles(&graph));

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(form = %form.title, count = errors.len(), "form failed reference validation");
        Err(errors)
    }
}

fn find_cycles(graph: &IndexMap<&str, References>) -> Vec<ResolveError> {
    let mut finder = CycleFinder {
        graph,
        resolution_stack: Vec::new(),
        finished: IndexSet::new(),
        cycles: Vec::new(),
    };
    for node in graph.keys() {
        finder.visit(*node);
    }
    finder.cycles
}

struct CycleFinder<'a> {
    graph: &'a IndexMap<&'a str, References>,
    /// Current path, for reporting the cycle when a node repeats.
    resolution_stack: Vec<&'a str>,
    finished: IndexSet<&'a str>,
    cycles: Vec<ResolveError>,
}

impl<'a> CycleFinder<'a> {
    fn visit(&mut self, node: &'a str) {
        if self.finished.contains(node) {
            return;
        }
        if let Some(start) = self.resolution_stack.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> = self.resolution_stack[start..]
                .iter()
                .map(|n| n.to_string())
                .collect();
            cycle.push(node.to_string());
            self.cycles.push(ResolveError::CircularReference { cycle });
            return;
        }

        let graph = self.graph;
        self.resolution_stack.push(node);
        if let Some(edges) = graph.get(node) {
            for next in edges {
                if let Some((key, _)) = graph.get_key_value(next.as_str()) {
                    self.visit(*key);
                }
            }
        }
        self.resolution_stack.pop();
        self.finished.insert(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::{DropdownOptions, Required};

    fn form(fields: Vec<Field>) -> Form {
        fields
            .into_iter()
            .fold(Form::new("Test", "tests/"), Form::with_field)
    }

    #[test]
    fn test_valid_form() {
        let form = form(vec![
            Field::text("Name", "field-name"),
            Field::text("Slug", "field-slug")
                .with_expression("{{$$.field-name.toLowerCase()}}")
                .with_hide_expression("{{$$.field-name === ''}}"),
        ]);
        assert!(validate_form(&form).is_ok());
    }

    #[test]
    fn test_duplicate_class_name_reported_once() {
        let form = form(vec![
            Field::text("A", "a"),
            Field::text("B", "a"),
            Field::text("C", "a"),
        ]);
        assert_eq!(
            validate_form(&form).unwrap_err(),
            vec![ResolveError::DuplicateClassName {
                class_name: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_self_and_unknown_references() {
        let form = form(vec![
            Field::text("A", "a").with_expression("{{$$.a + $$.ghost}}"),
        ]);
        let errors = validate_form(&form).unwrap_err();
        assert!(errors.contains(&ResolveError::SelfReference {
            field: "a".to_string()
        }));
        assert!(errors.contains(&ResolveError::UnknownField {
            field: "a".to_string(),
            reference: "ghost".to_string()
        }));
    }

    #[test]
    fn test_cycle_reported_with_path() {
        let form = form(vec![
            Field::text("A", "a").with_expression("{{$$.b}}"),
            Field::text("B", "b").with_required(Required::Expression("{{$$.a !== ''}}".to_string())),
        ]);
        let errors = validate_form(&form).unwrap_err();
        assert!(errors.contains(&ResolveError::ForwardReference {
            field: "a".to_string(),
            reference: "b".to_string()
        }));
        assert!(errors.contains(&ResolveError::CircularReference {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()]
        }));
    }

    #[test]
    fn test_dropdown_option_expressions_are_checked() {
        let form = form(vec![Field::dropdown(
            "Kind",
            "kind",
            DropdownOptions::expression("{{$$.later}}"),
        )]);
        assert!(matches!(
            validate_form(&form).unwrap_err()[0],
            ResolveError::UnknownField { .. }
        ));
    }

    #[test]
    fn test_bypassed_content_is_ignored() {
        let form = form(vec![Field::text("Doc", "doc")
            .with_expression("{{$$.anything}}")
            .bypassing_evaluation()]);
        assert!(validate_form(&form).is_ok());
    }

    #[test]
    fn test_field_references_dedupes() {
        let field = Field::text("A", "a").with_expression("{{$$.b + $$.c + $$.b}}");
        assert_eq!(field_references(&field).as_slice(), ["b", "c"]);
    }
}
