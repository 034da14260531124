//! Schema Visitor
//!
//! Post-order dispatch over a [`SchemaNode`] tree. Callers register a handler
//! per variant and, optionally, a generic fallback; children are visited
//! before their parent's handler runs and the parent receives their results.
//!
//! ```
//! use schema_visitor::{SchemaNode, SchemaVisitor};
//! use serde_json::json;
//!
//! let visitor = SchemaVisitor::new()
//!     .visit_string(|_| Some("String".to_string()))
//!     .visit_number(|_| Some("Number".to_string()))
//!     .visit_all_of(|_, results| Some(results.into_iter().flatten().collect::<Vec<_>>().join("&")));
//!
//! let node = SchemaNode::from_value(&json!({"allOf": ["string", "number"]})).unwrap();
//! assert_eq!(visitor.visit(&node).as_deref(), Some("String&Number"));
//! ```

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::schema::{
    AnySchema, ArraySchema, BooleanSchema, CompositeSchema, EnumSchema, NullSchema,
    NumberSchema, ObjectSchema, ParseOptions, RecordSchema, RefSchema, ResolveRefSchema,
    SchemaMap, SchemaNode, StringSchema,
};

/// Visited results keyed like the schema map they came from
pub type ResultMap<R> = IndexMap<String, Option<R>>;

/// Sub-results handed to an object handler
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectResult<R> {
    /// One entry per declared property, present when the schema declares `properties`
    pub properties: Option<ResultMap<R>>,
    /// One entry per pattern, present when the schema declares `patternProperties`
    pub pattern_properties: Option<ResultMap<R>>,
    /// Result for `additionalProperties`; `None` when absent or when the visit produced nothing
    pub additional_properties: Option<R>,
}

impl<R> Default for ObjectResult<R> {
    fn default() -> Self {
        Self {
            properties: None,
            pattern_properties: None,
            additional_properties: None,
        }
    }
}

/// Sub-results handed to a record handler
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult<R> {
    pub properties: ResultMap<R>,
}

impl<R> Default for RecordResult<R> {
    fn default() -> Self {
        Self {
            properties: IndexMap::new(),
        }
    }
}

/// Second argument of the generic fallback, shaped by the node's variant
#[derive(Debug, Clone, PartialEq)]
pub enum VisitContext<R> {
    /// Scalar and reference variants
    Leaf,
    /// `MaybeArrayOf` / `ArrayOf`
    Item(Option<R>),
    /// `AllOf` / `AnyOf`, in declared order
    Items(Vec<Option<R>>),
    Object(ObjectResult<R>),
    Record(RecordResult<R>),
}

type Leaf<'a, T, R> = Option<Box<dyn Fn(&T) -> Option<R> + 'a>>;
type WithItem<'a, R> = Option<Box<dyn Fn(&ArraySchema, Option<R>) -> Option<R> + 'a>>;
type WithItems<'a, R> = Option<Box<dyn Fn(&CompositeSchema, Vec<Option<R>>) -> Option<R> + 'a>>;
type Fallback<'a, R> = Box<dyn Fn(&SchemaNode, VisitContext<R>) -> Option<R> + 'a>;

/// Handler table for one visit.
///
/// Each variant has an optional handler; a variant without one goes to the
/// fallback, which returns `None` unless replaced with [`SchemaVisitor::fallback`].
pub struct SchemaVisitor<'a, R> {
    on_null: Leaf<'a, NullSchema, R>,
    on_string: Leaf<'a, StringSchema, R>,
    on_number: Leaf<'a, NumberSchema, R>,
    on_boolean: Leaf<'a, BooleanSchema, R>,
    on_any: Leaf<'a, AnySchema, R>,
    on_enum: Leaf<'a, EnumSchema, R>,
    on_ref: Leaf<'a, RefSchema, R>,
    on_resolve_ref: Leaf<'a, ResolveRefSchema, R>,
    on_maybe_array_of: WithItem<'a, R>,
    on_array_of: WithItem<'a, R>,
    on_all_of: WithItems<'a, R>,
    on_any_of: WithItems<'a, R>,
    on_object: Option<Box<dyn Fn(&ObjectSchema, ObjectResult<R>) -> Option<R> + 'a>>,
    on_record: Option<Box<dyn Fn(&RecordSchema, RecordResult<R>) -> Option<R> + 'a>>,
    fallback: Fallback<'a, R>,
}

impl<'a, R: 'a> Default for SchemaVisitor<'a, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R: 'a> SchemaVisitor<'a, R> {
    pub fn new() -> Self {
        Self {
            on_null: None,
            on_string: None,
            on_number: None,
            on_boolean: None,
            on_any: None,
            on_enum: None,
            on_ref: None,
            on_resolve_ref: None,
            on_maybe_array_of: None,
            on_array_of: None,
            on_all_of: None,
            on_any_of: None,
            on_object: None,
            on_record: None,
            fallback: Box::new(no_result),
        }
    }

    /// Generic handler for every variant without a specific one
    pub fn fallback(mut self, f: impl Fn(&SchemaNode, VisitContext<R>) -> Option<R> + 'a) -> Self {
        self.fallback = Box::new(f);
        self
    }

    pub fn visit_null(mut self, f: impl Fn(&NullSchema) -> Option<R> + 'a) -> Self {
        self.on_null = Some(Box::new(f));
        self
    }

    pub fn visit_string(mut self, f: impl Fn(&StringSchema) -> Option<R> + 'a) -> Self {
        self.on_string = Some(Box::new(f));
        self
    }

    pub fn visit_number(mut self, f: impl Fn(&NumberSchema) -> Option<R> + 'a) -> Self {
        self.on_number = Some(Box::new(f));
        self
    }

    pub fn visit_boolean(mut self, f: impl Fn(&BooleanSchema) -> Option<R> + 'a) -> Self {
        self.on_boolean = Some(Box::new(f));
        self
    }

    pub fn visit_any(mut self, f: impl Fn(&AnySchema) -> Option<R> + 'a) -> Self {
        self.on_any = Some(Box::new(f));
        self
    }

    pub fn visit_enum(mut self, f: impl Fn(&EnumSchema) -> Option<R> + 'a) -> Self {
        self.on_enum = Some(Box::new(f));
        self
    }

    pub fn visit_ref(mut self, f: impl Fn(&RefSchema) -> Option<R> + 'a) -> Self {
        self.on_ref = Some(Box::new(f));
        self
    }

    pub fn visit_resolve_ref(mut self, f: impl Fn(&ResolveRefSchema) -> Option<R> + 'a) -> Self {
        self.on_resolve_ref = Some(Box::new(f));
        self
    }

    pub fn visit_maybe_array_of(
        mut self,
        f: impl Fn(&ArraySchema, Option<R>) -> Option<R> + 'a,
    ) -> Self {
        self.on_maybe_array_of = Some(Box::new(f));
        self
    }

    pub fn visit_array_of(mut self, f: impl Fn(&ArraySchema, Option<R>) -> Option<R> + 'a) -> Self {
        self.on_array_of = Some(Box::new(f));
        self
    }

    pub fn visit_all_of(
        mut self,
        f: impl Fn(&CompositeSchema, Vec<Option<R>>) -> Option<R> + 'a,
    ) -> Self {
        self.on_all_of = Some(Box::new(f));
        self
    }

    pub fn visit_any_of(
        mut self,
        f: impl Fn(&CompositeSchema, Vec<Option<R>>) -> Option<R> + 'a,
    ) -> Self {
        self.on_any_of = Some(Box::new(f));
        self
    }

    pub fn visit_object(
        mut self,
        f: impl Fn(&ObjectSchema, ObjectResult<R>) -> Option<R> + 'a,
    ) -> Self {
        self.on_object = Some(Box::new(f));
        self
    }

    pub fn visit_record(
        mut self,
        f: impl Fn(&RecordSchema, RecordResult<R>) -> Option<R> + 'a,
    ) -> Self {
        self.on_record = Some(Box::new(f));
        self
    }

    /// Visit `node` and everything below it, children first
    pub fn visit(&self, node: &SchemaNode) -> Option<R> {
        match node {
            SchemaNode::Null(s) => self.leaf(&self.on_null, s, node),
            SchemaNode::String(s) => self.leaf(&self.on_string, s, node),
            SchemaNode::Number(s) => self.leaf(&self.on_number, s, node),
            SchemaNode::Boolean(s) => self.leaf(&self.on_boolean, s, node),
            SchemaNode::Any(s) => self.leaf(&self.on_any, s, node),
            SchemaNode::Enum(s) => self.leaf(&self.on_enum, s, node),
            SchemaNode::Ref(s) => self.leaf(&self.on_ref, s, node),
            SchemaNode::ResolveRef(s) => self.leaf(&self.on_resolve_ref, s, node),
            SchemaNode::MaybeArrayOf(s) => {
                let inner = self.visit(&s.items);
                match &self.on_maybe_array_of {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Item(inner)),
                }
            }
            SchemaNode::ArrayOf(s) => {
                let inner = self.visit(&s.items);
                match &self.on_array_of {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Item(inner)),
                }
            }
            SchemaNode::AllOf(s) => {
                let inner = self.visit_all(&s.schemas);
                match &self.on_all_of {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Items(inner)),
                }
            }
            SchemaNode::AnyOf(s) => {
                let inner = self.visit_all(&s.schemas);
                match &self.on_any_of {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Items(inner)),
                }
            }
            SchemaNode::Object(s) => {
                let inner = ObjectResult {
                    additional_properties: s
                        .additional_properties
                        .as_deref()
                        .and_then(|additional| self.visit(additional)),
                    properties: s.properties.as_ref().map(|m| self.visit_map(m)),
                    pattern_properties: s.pattern_properties.as_ref().map(|m| self.visit_map(m)),
                };
                match &self.on_object {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Object(inner)),
                }
            }
            SchemaNode::Record(s) => {
                let inner = RecordResult {
                    properties: self.visit_map(&s.properties),
                };
                match &self.on_record {
                    Some(f) => f(s, inner),
                    None => (self.fallback)(node, VisitContext::Record(inner)),
                }
            }
        }
    }

    /// Normalize a raw schema value with default [`ParseOptions`] and visit it.
    ///
    /// Fails with [`SchemaError::UnrecognizedShape`] for a node of unknown shape,
    /// or [`SchemaError::RecursionLimitExceeded`] for nesting deeper than the
    /// default limit. Use [`SchemaVisitor::visit_value_with`] to change the limit.
    ///
    /// [`SchemaError::UnrecognizedShape`]: crate::SchemaError::UnrecognizedShape
    /// [`SchemaError::RecursionLimitExceeded`]: crate::SchemaError::RecursionLimitExceeded
    pub fn visit_value(&self, value: &Value) -> Result<Option<R>> {
        self.visit_value_with(value, &ParseOptions::default())
    }

    pub fn visit_value_with(&self, value: &Value, options: &ParseOptions) -> Result<Option<R>> {
        let node = SchemaNode::from_value_with(value, options)?;
        Ok(self.visit(&node))
    }

    fn leaf<T>(&self, handler: &Leaf<'a, T, R>, payload: &T, node: &SchemaNode) -> Option<R> {
        match handler {
            Some(f) => f(payload),
            None => (self.fallback)(node, VisitContext::Leaf),
        }
    }

    fn visit_all(&self, schemas: &[SchemaNode]) -> Vec<Option<R>> {
        schemas.iter().map(|s| self.visit(s)).collect()
    }

    fn visit_map(&self, schemas: &SchemaMap) -> ResultMap<R> {
        schemas
            .iter()
            .map(|(key, s)| (key.clone(), self.visit(s)))
            .collect()
    }
}

fn no_result<R>(_: &SchemaNode, _: VisitContext<R>) -> Option<R> {
    None
}

/// Close over a handler table, yielding a reusable visiting function
pub fn build_visitor<'a, R: 'a>(
    config: SchemaVisitor<'a, R>,
) -> impl Fn(&SchemaNode) -> Option<R> + 'a {
    move |node| config.visit(node)
}

/// Like [`build_visitor`], but takes raw schema values. Errors are those of
/// [`SchemaVisitor::visit_value`].
pub fn build_value_visitor<'a, R: 'a>(
    config: SchemaVisitor<'a, R>,
) -> impl Fn(&Value) -> Result<Option<R>> + 'a {
    move |value| config.visit_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use serde_json::json;
    use std::cell::RefCell;

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value).unwrap()
    }

    #[test]
    fn test_string_handler() {
        let visitor = SchemaVisitor::new().visit_string(|_| Some("S"));
        assert_eq!(visitor.visit(&node(json!("string"))), Some("S"));
    }

    #[test]
    fn test_missing_handler_without_fallback_is_none() {
        let visitor: SchemaVisitor<'_, &str> = SchemaVisitor::new().visit_string(|_| Some("S"));
        assert_eq!(visitor.visit(&node(json!("number"))), None);
    }

    #[test]
    fn test_specific_handler_wins_over_fallback() {
        let visitor = SchemaVisitor::new()
            .visit_number(|_| Some("specific"))
            .fallback(|_, _| Some("fallback"));
        assert_eq!(visitor.visit(&node(json!("number"))), Some("specific"));
        assert_eq!(visitor.visit(&node(json!("boolean"))), Some("fallback"));
    }

    #[test]
    fn test_post_order() {
        let log = RefCell::new(Vec::new());
        let visitor = SchemaVisitor::new()
            .visit_string(|_| {
                log.borrow_mut().push("string");
                Some(1)
            })
            .visit_array_of(|_, inner| {
                log.borrow_mut().push("arrayOf");
                inner.map(|n| n + 1)
            });
        assert_eq!(visitor.visit(&node(json!({"arrayOf": "string"}))), Some(2));
        assert_eq!(*log.borrow(), vec!["string", "arrayOf"]);
    }

    #[test]
    fn test_object_literal_gets_empty_result() {
        let visitor = SchemaVisitor::new().visit_object(|_, result: ObjectResult<u8>| {
            assert_eq!(result, ObjectResult::default());
            Some(0)
        });
        assert_eq!(visitor.visit(&node(json!("object"))), Some(0));
    }

    #[test]
    fn test_visit_value_unrecognized() {
        let visitor: SchemaVisitor<'_, ()> = SchemaVisitor::new();
        let err = visitor.visit_value(&json!({"foo": "bar"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnrecognizedShape(ref s) if s == r#"{"foo":"bar"}"#));
    }

    #[test]
    fn test_visit_value_depth_limit() {
        let mut value = json!("number");
        for _ in 0..200 {
            value = json!({ "arrayOf": value });
        }
        let visitor = SchemaVisitor::new()
            .visit_number(|_| Some(0))
            .visit_array_of(|_, inner: Option<usize>| inner.map(|depth| depth + 1));

        let err = visitor.visit_value(&value).unwrap_err();
        assert!(matches!(err, SchemaError::RecursionLimitExceeded { limit: 128 }));

        let unbounded = ParseOptions::default().without_recursion_limit();
        assert_eq!(visitor.visit_value_with(&value, &unbounded).unwrap(), Some(200));

        let raised = ParseOptions::default().with_recursion_limit(256);
        assert_eq!(visitor.visit_value_with(&value, &raised).unwrap(), Some(200));
    }

    #[test]
    fn test_build_visitor_is_reusable() {
        let visit = build_visitor(SchemaVisitor::new().fallback(|n, _| Some(n.variant())));
        let tree = node(json!({"anyOf": ["string", {"ref": "x"}]}));
        assert_eq!(visit(&tree), visit(&tree));
    }
}
