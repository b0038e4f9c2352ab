//! Promotion of a dependency's shared definitions into its dependent.
//!
//! Once content from a dependency is inlined, it may still point at named
//! types living in the dependency's own shared-definitions container. Those
//! pointers would dangle in the dependent document, so the named types are
//! copied across and the pointers rewritten to the local copies.
//!
//! A dependent without shared definitions gets the container of the
//! dependency's dialect on first promotion.

use serde_json::Value;
use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{Dialect, DocumentRef, trailing_name};
use crate::error::ResolveError;
use crate::reference::{REF_KEY, Reference, ReferenceKind};

pub(crate) struct Promoter<'a, S> {
    sink: &'a mut S,
    // pointers of the dependency being promoted, for self-referencing types
    in_progress: Vec<String>,
}

impl<'a, S> Promoter<'a, S>
where
    S: DiagnosticSink,
{
    pub(crate) fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            in_progress: Vec::new(),
        }
    }

    /// Rewrites every shared-definition reference found in `node`, which
    /// comes from `dependency` and is about to be merged into `document`.
    pub(crate) fn check_for_shared(
        &mut self,
        document: &DocumentRef,
        dependency: &DocumentRef,
        node: &mut Value,
    ) -> Result<(), ResolveError> {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.check_for_shared(document, dependency, item)?;
                }
            }
            Value::Object(map) => {
                if let Some(Value::String(raw)) = map.get(REF_KEY) {
                    let raw = raw.clone();
                    if let Some(local) = self.promote(document, dependency, &raw)? {
                        map.insert(REF_KEY.to_string(), Value::String(local));
                    }
                    return Ok(());
                }
                for value in map.values_mut() {
                    self.check_for_shared(document, dependency, value)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Makes sure `document` can receive shared definitions, creating the
    /// container of `dialect` when it has none.
    fn has_shared_definitions(&mut self, document: &DocumentRef, dialect: Dialect, raw: &str) -> bool {
        let mut document = document.borrow_mut();
        document.adopt_dialect(dialect);
        if document.dialect() == Dialect::Unknown {
            self.sink.report(Diagnostic::warning(
                document.locator(),
                raw,
                "document has no shared definitions container, reference cannot be promoted",
            ));
            return false;
        }
        true
    }

    /// Copies the shared definition targeted by `raw` into `document`,
    /// returning the local reference that replaces it.
    fn promote(
        &mut self,
        document: &DocumentRef,
        dependency: &DocumentRef,
        raw: &str,
    ) -> Result<Option<String>, ResolveError> {
        let reference = Reference::parse(raw);
        if reference.kind() != ReferenceKind::Internal {
            return Ok(None);
        }
        let pointer = reference.fragment();

        let (dependency_locator, dependency_dialect, shared) = {
            let dependency = dependency.borrow();
            if !dependency.is_shared_pointer(pointer) {
                let document = document.borrow();
                self.sink.report(Diagnostic::warning(
                    document.locator(),
                    raw,
                    format!(
                        "reference into '{}' is not a shared definition and cannot be promoted",
                        dependency.locator()
                    ),
                ));
                return Ok(None);
            }
            (
                dependency.locator().clone(),
                dependency.dialect(),
                dependency.find(pointer).cloned(),
            )
        };

        let Some(mut shared) = shared else {
            self.sink
                .report(Diagnostic::missing_reference(&dependency_locator, raw));
            return Ok(None);
        };

        if !self.has_shared_definitions(document, dependency_dialect, raw) {
            return Ok(None);
        }

        if self.in_progress.iter().any(|visiting| visiting == pointer) {
            debug!(%raw, "shared definition already being promoted");
            let local = document
                .borrow()
                .local_reference_for(&trailing_name(pointer));
            return Ok(Some(local));
        }

        self.in_progress.push(pointer.to_string());
        let result = self.check_for_shared(document, dependency, &mut shared);
        self.in_progress.pop();
        result?;

        let local = document
            .borrow_mut()
            .add_shared_definition(shared, pointer, &dependency_locator)?;
        info!(from = %dependency_locator, %raw, %local, "promoted shared definition");
        Ok(Some(local))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::document::Document;

    fn document(path: &str, tree: Value) -> DocumentRef {
        let locator = Url::parse(&format!("file:///schemas/{path}")).expect("valid url");
        Document::new(locator, tree).into_shared()
    }

    fn promote(
        root: &DocumentRef,
        dependency: &DocumentRef,
        mut node: Value,
    ) -> (Result<(), ResolveError>, Value, Vec<Diagnostic>) {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = Promoter::new(&mut sink).check_for_shared(root, dependency, &mut node);
        (result, node, sink)
    }

    #[test]
    fn should_promote_referenced_definition() {
        let root = document("root.yaml", json!({"definitions": {}}));
        let other = document(
            "other.yaml",
            json!({"definitions": {
                "Shape": {"corner": {"$ref": "#/definitions/Point"}},
                "Point": {"x": "number", "y": "number"}
            }}),
        );

        let (result, node, diagnostics) =
            promote(&root, &other, json!({"corner": {"$ref": "#/definitions/Point"}}));

        assert!(result.is_ok());
        assert!(diagnostics.is_empty());
        assert_eq!(node, json!({"corner": {"$ref": "#/definitions/Point"}}));
        assert_eq!(
            root.borrow().tree(),
            &json!({"definitions": {"Point": {"x": "number", "y": "number"}}})
        );
    }

    #[test]
    fn should_rewrite_to_dependent_dialect() {
        let root = document("root.yaml", json!({"components": {"schemas": {}}}));
        let other = document(
            "other.yaml",
            json!({"definitions": {"Point": {"type": "object"}}}),
        );

        let (result, node, _) = promote(
            &root,
            &other,
            json!({"items": [{"$ref": "#/definitions/Point"}]}),
        );

        assert!(result.is_ok());
        assert_eq!(
            node,
            json!({"items": [{"$ref": "#/components/schemas/Point"}]})
        );
        assert!(root.borrow().find("/components/schemas/Point").is_some());
    }

    #[test]
    fn should_promote_transitively() {
        let root = document("root.yaml", json!({"definitions": {}}));
        let other = document(
            "other.yaml",
            json!({"definitions": {
                "Line": {"start": {"$ref": "#/definitions/Point"}},
                "Point": {"x": {"$ref": "#/definitions/Coordinate"}},
                "Coordinate": {"type": "number"}
            }}),
        );

        let (result, _, _) = promote(&root, &other, json!({"$ref": "#/definitions/Line"}));

        assert!(result.is_ok());
        assert_eq!(
            root.borrow().tree(),
            &json!({"definitions": {
                "Coordinate": {"type": "number"},
                "Point": {"x": {"$ref": "#/definitions/Coordinate"}},
                "Line": {"start": {"$ref": "#/definitions/Point"}}
            }})
        );
    }

    #[test]
    fn should_promote_self_referencing_definition() {
        let root = document("root.yaml", json!({"definitions": {}}));
        let tree_node = json!({"children": {"items": {"$ref": "#/definitions/Node"}}});
        let other = document(
            "other.yaml",
            json!({"definitions": {"Node": tree_node.clone()}}),
        );

        let (result, node, _) = promote(&root, &other, json!({"$ref": "#/definitions/Node"}));

        assert!(result.is_ok());
        assert_eq!(node, json!({"$ref": "#/definitions/Node"}));
        assert_eq!(root.borrow().find("/definitions/Node"), Some(&tree_node));
    }

    #[test]
    fn should_report_missing_shared_definition() {
        let root = document("root.yaml", json!({"definitions": {}}));
        let other = document("other.yaml", json!({"definitions": {}}));
        let original = json!({"corner": {"$ref": "#/definitions/Point"}});

        let (result, node, diagnostics) = promote(&root, &other, original.clone());

        assert!(result.is_ok());
        assert_eq!(node, original);
        assert_eq!(diagnostics.len(), 1);
        insta::assert_snapshot!(diagnostics[0], @"error: missing reference '#/definitions/Point' in file:///schemas/other.yaml");
    }

    #[test]
    fn should_warn_on_non_shared_internal_reference() {
        let root = document("root.yaml", json!({"definitions": {}}));
        let other = document(
            "other.yaml",
            json!({"definitions": {}, "properties": {"x": {}}}),
        );

        let (result, _, diagnostics) =
            promote(&root, &other, json!({"$ref": "#/properties/x"}));

        assert!(result.is_ok());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, crate::Severity::Warning);
    }

    #[test]
    fn should_create_shared_definitions_in_dependency_dialect() {
        let root = document("root.yaml", json!({"type": "object"}));
        let other = document(
            "other.yaml",
            json!({"components": {"schemas": {"Point": {"type": "object"}}}}),
        );

        let (result, node, diagnostics) =
            promote(&root, &other, json!({"$ref": "#/components/schemas/Point"}));

        assert!(result.is_ok());
        assert!(diagnostics.is_empty());
        assert_eq!(node, json!({"$ref": "#/components/schemas/Point"}));
        assert_eq!(root.borrow().dialect(), Dialect::OpenApi);
        assert_eq!(
            root.borrow().tree(),
            &json!({
                "type": "object",
                "components": {"schemas": {"Point": {"type": "object"}}}
            })
        );
    }

    #[test]
    fn should_warn_when_shared_definitions_cannot_be_created() {
        let root = document("root.yaml", json!(["first"]));
        let other = document(
            "other.yaml",
            json!({"definitions": {"Point": {"type": "object"}}}),
        );
        let original = json!({"$ref": "#/definitions/Point"});

        let (result, node, diagnostics) = promote(&root, &other, original.clone());

        assert!(result.is_ok());
        assert_eq!(node, original);
        assert_eq!(root.borrow().tree(), &json!(["first"]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, crate::Severity::Warning);
    }

    #[test]
    fn should_fail_on_conflicting_definition() {
        let root = document(
            "root.yaml",
            json!({"definitions": {"Point": {"type": "string"}}}),
        );
        let other = document(
            "other.yaml",
            json!({"definitions": {"Point": {"type": "object"}}}),
        );

        let (result, _, _) = promote(&root, &other, json!({"$ref": "#/definitions/Point"}));

        assert!(matches!(
            result,
            Err(ResolveError::PromotionConflict { .. })
        ));
    }
}
