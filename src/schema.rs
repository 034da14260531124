//! Schema node types
//!
//! A schema description tree is authored as plain JSON/YAML values whose
//! variant is decided by literal sentinels (`"string"`, `"any"`, ...) or by a
//! discriminant key (`{arrayOf: ...}`, `{object: {...}}`, ...).
//! [`classify`] turns such a value into a [`SchemaNode`] once; the visitor then
//! matches on the enum instead of probing keys.

pub mod classify;

pub use classify::ParseOptions;

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Named or pattern-keyed child schemas, in declared order
pub type SchemaMap = IndexMap<String, SchemaNode>;

/// Kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Null,
    String,
    Number,
    Boolean,
    Any,
    Enum,
    Ref,
    ResolveRef,
    MaybeArrayOf,
    ArrayOf,
    AllOf,
    AnyOf,
    Object,
    Record,
}

impl Variant {
    pub const ALL: [Variant; 14] = [
        Variant::Null,
        Variant::String,
        Variant::Number,
        Variant::Boolean,
        Variant::Any,
        Variant::Enum,
        Variant::Ref,
        Variant::ResolveRef,
        Variant::MaybeArrayOf,
        Variant::ArrayOf,
        Variant::AllOf,
        Variant::AnyOf,
        Variant::Object,
        Variant::Record,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Null => "Null",
            Variant::String => "String",
            Variant::Number => "Number",
            Variant::Boolean => "Boolean",
            Variant::Any => "Any",
            Variant::Enum => "Enum",
            Variant::Ref => "Ref",
            Variant::ResolveRef => "ResolveRef",
            Variant::MaybeArrayOf => "MaybeArrayOf",
            Variant::ArrayOf => "ArrayOf",
            Variant::AllOf => "AllOf",
            Variant::AnyOf => "AnyOf",
            Variant::Object => "Object",
            Variant::Record => "Record",
        }
    }

    /// Whether nodes of this kind have child schemas the visitor descends into
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Variant::MaybeArrayOf
                | Variant::ArrayOf
                | Variant::AllOf
                | Variant::AnyOf
                | Variant::Object
                | Variant::Record
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Leaf payloads
// =============================================================================

/// `null`, `"null"` or `{null: ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct NullSchema {
    pub raw: Value,
}

/// `"string"`, `"path"`, `{string: ...}` or `{path: ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct StringSchema {
    pub raw: Value,
}

impl StringSchema {
    /// True for the `path` spelling of a string schema
    pub fn is_path(&self) -> bool {
        match &self.raw {
            Value::String(s) => s == "path",
            Value::Object(_) => self.selected_key() == Some("path"),
            _ => false,
        }
    }

    /// Regex pattern from `{string: {pattern}}` or `{path: {pattern}}`
    pub fn pattern(&self) -> Option<&str> {
        self.raw
            .get(self.selected_key()?)?
            .get("pattern")
            .and_then(Value::as_str)
    }

    /// The key that classified a structured string node; `string` outranks `path`
    fn selected_key(&self) -> Option<&'static str> {
        let obj = self.raw.as_object()?;
        ["string", "path"]
            .into_iter()
            .find(|key| classify::is_truthy(obj.get(*key)))
    }
}

/// `"number"` or `{number: ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct NumberSchema {
    pub raw: Value,
}

/// `"boolean"` or `{boolean: ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanSchema {
    pub raw: Value,
}

/// `"any"`
#[derive(Debug, Clone, PartialEq)]
pub struct AnySchema {
    pub raw: Value,
}

/// `{enum: [...]}` or `{enum: {values: [...]}}`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub raw: Value,
}

impl EnumSchema {
    /// Allowed values, in declared order
    pub fn values(&self) -> &[Value] {
        match self.raw.get("enum") {
            Some(Value::Array(values)) => values,
            Some(Value::Object(obj)) => obj
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &[],
        }
    }
}

/// `{ref: "name"}`. Never descended into.
#[derive(Debug, Clone, PartialEq)]
pub struct RefSchema {
    pub raw: Value,
}

impl RefSchema {
    pub fn target(&self) -> Option<&str> {
        self.raw.get("ref").and_then(Value::as_str)
    }
}

/// `{resolveRef: "name"}`. Never descended into.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRefSchema {
    pub raw: Value,
}

impl ResolveRefSchema {
    pub fn target(&self) -> Option<&str> {
        self.raw.get("resolveRef").and_then(Value::as_str)
    }
}

// =============================================================================
// Container payloads
// =============================================================================

/// `{arrayOf: S}` or `{maybeArrayOf: S}`
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub raw: Value,
    pub items: Box<SchemaNode>,
}

/// `{allOf: [...]}` or `{anyOf: [...]}`
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSchema {
    pub raw: Value,
    pub schemas: Vec<SchemaNode>,
}

/// `"object"` or `{object: {properties?, patternProperties?, additionalProperties?}}`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub raw: Value,
    pub properties: Option<SchemaMap>,
    pub pattern_properties: Option<SchemaMap>,
    pub additional_properties: Option<Box<SchemaNode>>,
}

impl ObjectSchema {
    /// Names listed under `object.required`, or every declared property for `required: all`
    pub fn required(&self) -> Vec<String> {
        match self.raw.get("object").and_then(|o| o.get("required")) {
            Some(Value::String(s)) if s == "all" => self
                .properties
                .as_ref()
                .map(|props| props.keys().cloned().collect())
                .unwrap_or_default(),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `object.closed: true`
    pub fn is_closed(&self) -> bool {
        self.raw
            .get("object")
            .and_then(|o| o.get("closed"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Which authoring form a record used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordForm {
    /// `{record: {properties: {name: schema}}}`
    Explicit,
    /// `{record: {name: schema}}`
    Implicit,
}

/// `{record: ...}` in either form; both normalize to the same `properties` map
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub raw: Value,
    pub form: RecordForm,
    pub properties: SchemaMap,
}

// =============================================================================
// Schema Node
// =============================================================================

/// One normalized schema type declaration.
///
/// `{schema: S}` wrappers never appear here; normalization replaces them with
/// the node for `S`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Null(NullSchema),
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
    Any(AnySchema),
    Enum(EnumSchema),
    Ref(RefSchema),
    ResolveRef(ResolveRefSchema),
    MaybeArrayOf(ArraySchema),
    ArrayOf(ArraySchema),
    AllOf(CompositeSchema),
    AnyOf(CompositeSchema),
    Object(ObjectSchema),
    Record(RecordSchema),
}

impl SchemaNode {
    pub fn variant(&self) -> Variant {
        match self {
            SchemaNode::Null(_) => Variant::Null,
            SchemaNode::String(_) => Variant::String,
            SchemaNode::Number(_) => Variant::Number,
            SchemaNode::Boolean(_) => Variant::Boolean,
            SchemaNode::Any(_) => Variant::Any,
            SchemaNode::Enum(_) => Variant::Enum,
            SchemaNode::Ref(_) => Variant::Ref,
            SchemaNode::ResolveRef(_) => Variant::ResolveRef,
            SchemaNode::MaybeArrayOf(_) => Variant::MaybeArrayOf,
            SchemaNode::ArrayOf(_) => Variant::ArrayOf,
            SchemaNode::AllOf(_) => Variant::AllOf,
            SchemaNode::AnyOf(_) => Variant::AnyOf,
            SchemaNode::Object(_) => Variant::Object,
            SchemaNode::Record(_) => Variant::Record,
        }
    }

    /// The node as it was authored
    pub fn raw(&self) -> &Value {
        match self {
            SchemaNode::Null(s) => &s.raw,
            SchemaNode::String(s) => &s.raw,
            SchemaNode::Number(s) => &s.raw,
            SchemaNode::Boolean(s) => &s.raw,
            SchemaNode::Any(s) => &s.raw,
            SchemaNode::Enum(s) => &s.raw,
            SchemaNode::Ref(s) => &s.raw,
            SchemaNode::ResolveRef(s) => &s.raw,
            SchemaNode::MaybeArrayOf(s) | SchemaNode::ArrayOf(s) => &s.raw,
            SchemaNode::AllOf(s) | SchemaNode::AnyOf(s) => &s.raw,
            SchemaNode::Object(s) => &s.raw,
            SchemaNode::Record(s) => &s.raw,
        }
    }

    /// `description` annotation, either top-level or on the discriminant payload.
    /// Long/short descriptions yield the short form.
    ///
    /// An implicit record's payload is its property map, so it carries no annotations.
    pub fn description(&self) -> Option<&str> {
        let obj = self.raw().as_object()?;
        let payload = match self {
            SchemaNode::Record(r) if r.form == RecordForm::Implicit => None,
            _ => classify::discriminant_of(self.raw())
                .and_then(|d| obj.get(d.key()))
                .and_then(Value::as_object),
        };
        let candidate = obj
            .get("description")
            .or_else(|| payload.and_then(|p| p.get("description")))?;
        match candidate {
            Value::String(s) => Some(s.as_str()),
            Value::Object(d) => d.get("short").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Parse a raw value with default [`ParseOptions`]
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        classify::classify(value, &ParseOptions::default())
    }

    pub fn from_value_with(value: &Value, options: &ParseOptions) -> crate::Result<Self> {
        classify::classify(value, options)
    }

    /// Number of nodes in the tree the visitor would reach, this one included
    pub fn node_count(&self) -> usize {
        1 + match self {
            SchemaNode::MaybeArrayOf(s) | SchemaNode::ArrayOf(s) => s.items.node_count(),
            SchemaNode::AllOf(s) | SchemaNode::AnyOf(s) => {
                s.schemas.iter().map(SchemaNode::node_count).sum()
            }
            SchemaNode::Object(s) => {
                let maps = [&s.properties, &s.pattern_properties];
                maps.iter()
                    .filter_map(|m| m.as_ref())
                    .flat_map(|m| m.values())
                    .map(SchemaNode::node_count)
                    .sum::<usize>()
                    + s.additional_properties.as_ref().map_or(0, |a| a.node_count())
            }
            SchemaNode::Record(s) => s.properties.values().map(SchemaNode::node_count).sum(),
            _ => 0,
        }
    }
}
