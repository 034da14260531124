//! Schema Shape Classification
//!
//! Decides the variant of a raw schema value exactly once. Structured nodes are
//! classified by the first discriminant key, in [`Discriminant::PRECEDENCE`]
//! order, whose value is truthy. Nodes may carry several discriminant keys;
//! the order below is what decides between them and must not change.
//!
//! Only the children the visitor descends into are classified. Scalar payloads
//! and `ref`/`resolveRef` targets are kept raw.

use serde_json::{Map, Value};
use tracing::trace;

use super::{
    AnySchema, ArraySchema, BooleanSchema, CompositeSchema, EnumSchema, NullSchema,
    NumberSchema, ObjectSchema, RecordForm, RecordSchema, RefSchema, ResolveRefSchema,
    SchemaMap, SchemaNode, StringSchema,
};
use crate::error::{Result, SchemaError};

// =============================================================================
// Options
// =============================================================================

/// Limits applied while normalizing a raw schema value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting depth; `None` allows unbounded nesting and may overflow the stack.
    pub recursion_limit: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recursion_limit: Some(128),
        }
    }
}

impl ParseOptions {
    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = Some(recursion_limit);
        self
    }

    pub fn without_recursion_limit(mut self) -> Self {
        self.recursion_limit = None;
        self
    }
}

// =============================================================================
// Discriminants
// =============================================================================

/// Object key that selects the variant of a structured node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminant {
    Enum,
    Null,
    Schema,
    String,
    Path,
    Number,
    Boolean,
    ResolveRef,
    Ref,
    MaybeArrayOf,
    ArrayOf,
    AllOf,
    Schemas,
    AnyOf,
    Object,
    Record,
}

impl Discriminant {
    /// Check order for structured nodes
    pub const PRECEDENCE: [Discriminant; 16] = [
        Discriminant::Enum,
        Discriminant::Null,
        Discriminant::Schema,
        Discriminant::String,
        Discriminant::Path,
        Discriminant::Number,
        Discriminant::Boolean,
        Discriminant::ResolveRef,
        Discriminant::Ref,
        Discriminant::MaybeArrayOf,
        Discriminant::ArrayOf,
        Discriminant::AllOf,
        Discriminant::Schemas,
        Discriminant::AnyOf,
        Discriminant::Object,
        Discriminant::Record,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Discriminant::Enum => "enum",
            Discriminant::Null => "null",
            Discriminant::Schema => "schema",
            Discriminant::String => "string",
            Discriminant::Path => "path",
            Discriminant::Number => "number",
            Discriminant::Boolean => "boolean",
            Discriminant::ResolveRef => "resolveRef",
            Discriminant::Ref => "ref",
            Discriminant::MaybeArrayOf => "maybeArrayOf",
            Discriminant::ArrayOf => "arrayOf",
            Discriminant::AllOf => "allOf",
            Discriminant::Schemas => "schemas",
            Discriminant::AnyOf => "anyOf",
            Discriminant::Object => "object",
            Discriminant::Record => "record",
        }
    }
}

/// First discriminant key present with a truthy value, or `None` for
/// non-objects and objects without one
pub fn discriminant_of(value: &Value) -> Option<Discriminant> {
    value.as_object().and_then(first_discriminant)
}

fn first_discriminant(obj: &Map<String, Value>) -> Option<Discriminant> {
    Discriminant::PRECEDENCE
        .into_iter()
        .find(|d| is_truthy(obj.get(d.key())))
}

/// JavaScript truthiness; a missing key is falsy
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Normalize a raw value into a [`SchemaNode`] tree
pub fn classify(value: &Value, options: &ParseOptions) -> Result<SchemaNode> {
    Classifier { options }.node(value, 0)
}

struct Classifier<'a> {
    options: &'a ParseOptions,
}

impl<'a> Classifier<'a> {
    fn node(&self, value: &Value, depth: usize) -> Result<SchemaNode> {
        if let Some(limit) = self.options.recursion_limit {
            if depth > limit {
                return Err(SchemaError::RecursionLimitExceeded { limit });
            }
        }

        match value {
            Value::Null => Ok(SchemaNode::Null(NullSchema { raw: Value::Null })),
            Value::String(s) => self.literal(value, s),
            Value::Object(obj) => self.structured(value, obj, depth),
            _ => Err(SchemaError::unrecognized(value)),
        }
    }

    fn literal(&self, value: &Value, literal: &str) -> Result<SchemaNode> {
        let raw = value.clone();
        let node = match literal {
            "null" => SchemaNode::Null(NullSchema { raw }),
            "string" | "path" => SchemaNode::String(StringSchema { raw }),
            "number" => SchemaNode::Number(NumberSchema { raw }),
            "boolean" => SchemaNode::Boolean(BooleanSchema { raw }),
            "object" => SchemaNode::Object(ObjectSchema {
                raw,
                properties: None,
                pattern_properties: None,
                additional_properties: None,
            }),
            "any" => SchemaNode::Any(AnySchema { raw }),
            _ => return Err(SchemaError::unrecognized(value)),
        };
        Ok(node)
    }

    fn structured(
        &self,
        value: &Value,
        obj: &Map<String, Value>,
        depth: usize,
    ) -> Result<SchemaNode> {
        let Some(discriminant) = first_discriminant(obj) else {
            return Err(SchemaError::unrecognized(value));
        };
        let payload = obj.get(discriminant.key()).unwrap_or(&Value::Null);
        let raw = value.clone();

        let node = match discriminant {
            Discriminant::Enum => SchemaNode::Enum(EnumSchema { raw }),
            Discriminant::Null => SchemaNode::Null(NullSchema { raw }),
            Discriminant::Schema => {
                trace!("unwrapping schema wrapper");
                return self.node(payload, depth + 1);
            }
            Discriminant::String | Discriminant::Path => SchemaNode::String(StringSchema { raw }),
            Discriminant::Number => SchemaNode::Number(NumberSchema { raw }),
            Discriminant::Boolean => SchemaNode::Boolean(BooleanSchema { raw }),
            Discriminant::ResolveRef => SchemaNode::ResolveRef(ResolveRefSchema { raw }),
            Discriminant::Ref => SchemaNode::Ref(RefSchema { raw }),
            Discriminant::MaybeArrayOf => SchemaNode::MaybeArrayOf(ArraySchema {
                raw,
                items: Box::new(self.node(payload, depth + 1)?),
            }),
            Discriminant::ArrayOf => SchemaNode::ArrayOf(ArraySchema {
                raw,
                items: Box::new(self.node(payload, depth + 1)?),
            }),
            Discriminant::AllOf | Discriminant::Schemas => {
                let list = all_of_list(value, obj)?;
                SchemaNode::AllOf(CompositeSchema {
                    raw,
                    schemas: self.list(list, depth)?,
                })
            }
            Discriminant::AnyOf => {
                let list = schema_list(payload).ok_or_else(|| SchemaError::unrecognized(value))?;
                SchemaNode::AnyOf(CompositeSchema {
                    raw,
                    schemas: self.list(list, depth)?,
                })
            }
            Discriminant::Object => self.object(value, payload, depth)?,
            Discriminant::Record => self.record(value, payload, depth)?,
        };
        Ok(node)
    }

    fn list(&self, items: &[Value], depth: usize) -> Result<Vec<SchemaNode>> {
        items.iter().map(|item| self.node(item, depth + 1)).collect()
    }

    fn map(&self, node: &Value, entries: Option<&Value>, depth: usize) -> Result<SchemaMap> {
        let entries = entries
            .and_then(Value::as_object)
            .ok_or_else(|| SchemaError::unrecognized(node))?;
        entries
            .iter()
            .map(|(key, child)| Ok((key.clone(), self.node(child, depth + 1)?)))
            .collect()
    }

    fn object(&self, value: &Value, payload: &Value, depth: usize) -> Result<SchemaNode> {
        let mut object = ObjectSchema {
            raw: value.clone(),
            properties: None,
            pattern_properties: None,
            additional_properties: None,
        };
        let Some(payload) = payload.as_object() else {
            return Ok(SchemaNode::Object(object));
        };

        if let Some(additional) = payload
            .get("additionalProperties")
            .filter(|v| is_truthy(Some(*v)))
        {
            object.additional_properties = Some(Box::new(self.node(additional, depth + 1)?));
        }
        if is_truthy(payload.get("properties")) {
            object.properties = Some(self.map(value, payload.get("properties"), depth)?);
        }
        if is_truthy(payload.get("patternProperties")) {
            object.pattern_properties =
                Some(self.map(value, payload.get("patternProperties"), depth)?);
        }
        Ok(SchemaNode::Object(object))
    }

    fn record(&self, value: &Value, payload: &Value, depth: usize) -> Result<SchemaNode> {
        let raw = value.clone();
        let Some(record) = payload.as_object() else {
            return Ok(SchemaNode::Record(RecordSchema {
                raw,
                form: RecordForm::Implicit,
                properties: SchemaMap::new(),
            }));
        };

        let (form, properties) = if is_truthy(record.get("properties")) {
            (RecordForm::Explicit, self.map(value, record.get("properties"), depth)?)
        } else {
            trace!("record uses implicit property form");
            (RecordForm::Implicit, self.map(value, Some(payload), depth)?)
        };
        Ok(SchemaNode::Record(RecordSchema {
            raw,
            form,
            properties,
        }))
    }
}

/// Sub-schema list of an `allOf` node: `allOf: [..]`, then the legacy
/// `allOf: {schemas: [..]}`, then a sibling `schemas: [..]`
fn all_of_list<'v>(node: &'v Value, obj: &'v Map<String, Value>) -> Result<&'v [Value]> {
    obj.get("allOf")
        .filter(|v| is_truthy(Some(*v)))
        .and_then(schema_list)
        .or_else(|| obj.get("schemas").and_then(Value::as_array).map(Vec::as_slice))
        .ok_or_else(|| SchemaError::unrecognized(node))
}

fn schema_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get("schemas").and_then(Value::as_array).map(Vec::as_slice),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Variant;
    use serde_json::json;

    fn variant(value: Value) -> Variant {
        classify(&value, &ParseOptions::default()).unwrap().variant()
    }

    #[test]
    fn test_literals() {
        assert_eq!(variant(Value::Null), Variant::Null);
        assert_eq!(variant(json!("null")), Variant::Null);
        assert_eq!(variant(json!("string")), Variant::String);
        assert_eq!(variant(json!("path")), Variant::String);
        assert_eq!(variant(json!("number")), Variant::Number);
        assert_eq!(variant(json!("boolean")), Variant::Boolean);
        assert_eq!(variant(json!("object")), Variant::Object);
        assert_eq!(variant(json!("any")), Variant::Any);
    }

    #[test]
    fn test_unknown_literal_is_unrecognized() {
        for value in [json!("integer"), json!(42), json!(true), json!(["string"])] {
            let err = classify(&value, &ParseOptions::default()).unwrap_err();
            assert!(matches!(err, SchemaError::UnrecognizedShape(_)), "{:?}", value);
        }
    }

    #[test]
    fn test_precedence_enum_before_string() {
        let value = json!({"string": true, "enum": ["a"]});
        assert_eq!(discriminant_of(&value), Some(Discriminant::Enum));
        assert_eq!(variant(value), Variant::Enum);
    }

    #[test]
    fn test_precedence_ref_after_resolve_ref() {
        let value = json!({"ref": "a", "resolveRef": "b"});
        assert_eq!(variant(value), Variant::ResolveRef);
    }

    #[test]
    fn test_precedence_object_before_record() {
        let value = json!({"record": {"a": "string"}, "object": {"properties": {}}});
        assert_eq!(variant(value), Variant::Object);
    }

    #[test]
    fn test_falsy_discriminant_is_skipped() {
        // null: false does not select Null; the next truthy key wins
        let value = json!({"null": false, "number": {"description": "count"}});
        assert_eq!(variant(value), Variant::Number);

        let value = json!({"string": "", "boolean": 1});
        assert_eq!(variant(value), Variant::Boolean);
    }

    #[test]
    fn test_schema_wrapper_is_unwrapped() {
        let node = classify(&json!({"schema": {"schema": "number"}}), &ParseOptions::default()).unwrap();
        assert_eq!(node.variant(), Variant::Number);
        assert_eq!(node.raw(), &json!("number"));
    }

    #[test]
    fn test_ref_payload_not_descended() {
        // an unrecognizable payload under ref is never classified
        let node = classify(&json!({"ref": {"foo": "bar"}}), &ParseOptions::default()).unwrap();
        assert_eq!(node.variant(), Variant::Ref);
    }

    #[test]
    fn test_all_of_legacy_schemas() {
        let nested = classify(
            &json!({"allOf": {"schemas": ["string", "number"]}}),
            &ParseOptions::default(),
        )
        .unwrap();
        let sibling = classify(&json!({"schemas": ["string", "number"]}), &ParseOptions::default()).unwrap();
        for node in [nested, sibling] {
            match node {
                SchemaNode::AllOf(all) => assert_eq!(all.schemas.len(), 2),
                other => panic!("Expected AllOf, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_precedence_schemas_before_any_of() {
        let value = json!({"schemas": ["string", "number"], "anyOf": ["boolean"]});
        assert_eq!(discriminant_of(&value), Some(Discriminant::Schemas));
        match classify(&value, &ParseOptions::default()).unwrap() {
            SchemaNode::AllOf(all) => assert_eq!(all.schemas.len(), 2),
            other => panic!("Expected AllOf, got {:?}", other),
        }

        // an empty-string key is falsy, so anyOf wins
        let value = json!({"schemas": "", "anyOf": ["boolean"]});
        assert_eq!(variant(value), Variant::AnyOf);
    }

    #[test]
    fn test_any_of_requires_list() {
        let err = classify(&json!({"anyOf": "string"}), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnrecognizedShape(_)));
    }

    #[test]
    fn test_object_maps() {
        let node = classify(
            &json!({"object": {
                "properties": {"a": "string", "b": "number"},
                "patternProperties": {"^x": "boolean"},
                "additionalProperties": "any"
            }}),
            &ParseOptions::default(),
        )
        .unwrap();
        match node {
            SchemaNode::Object(obj) => {
                let props = obj.properties.unwrap();
                assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
                assert_eq!(obj.pattern_properties.unwrap().len(), 1);
                assert_eq!(obj.additional_properties.unwrap().variant(), Variant::Any);
            }
            other => panic!("Expected Object, got {:?}", other),
        }
    }

    #[test]
    fn test_object_false_additional_properties_ignored() {
        let node = classify(
            &json!({"object": {"additionalProperties": false, "closed": true}}),
            &ParseOptions::default(),
        )
        .unwrap();
        match node {
            SchemaNode::Object(obj) => {
                assert!(obj.additional_properties.is_none());
                assert!(obj.properties.is_none());
                assert!(obj.is_closed());
            }
            other => panic!("Expected Object, got {:?}", other),
        }
    }

    #[test]
    fn test_record_forms() {
        let explicit = classify(&json!({"record": {"properties": {"n": "string"}}}), &ParseOptions::default()).unwrap();
        let implicit = classify(&json!({"record": {"n": "string"}}), &ParseOptions::default()).unwrap();
        match (explicit, implicit) {
            (SchemaNode::Record(e), SchemaNode::Record(i)) => {
                assert_eq!(e.form, RecordForm::Explicit);
                assert_eq!(i.form, RecordForm::Implicit);
                assert_eq!(e.properties, i.properties);
            }
            other => panic!("Expected two records, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_unrecognized_reports_inner_node() {
        let err = classify(&json!({"arrayOf": {"foo": "bar"}}), &ParseOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), r#"Unimplemented: {"foo":"bar"}"#);
    }

    #[test]
    fn test_recursion_limit() {
        let mut value = json!("string");
        for _ in 0..10 {
            value = json!({ "arrayOf": value });
        }
        let options = ParseOptions::default().with_recursion_limit(5);
        let err = classify(&value, &options).unwrap_err();
        assert!(matches!(err, SchemaError::RecursionLimitExceeded { limit: 5 }));

        assert!(classify(&value, &ParseOptions::default().without_recursion_limit()).is_ok());
        assert!(classify(&value, &ParseOptions::default().with_recursion_limit(10)).is_ok());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!(-1.5))));
    }
}
