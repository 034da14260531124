//! Schema Visitor
//!
//! Walks a schema description tree and folds it into whatever the caller is
//! building (a validator, documentation, generated types, completion data) by
//! calling per-variant handlers bottom-up.
//!
//! ## Features
//!
//! - **Typed nodes**: raw JSON/YAML schema values are classified once into
//!   [`SchemaNode`], using a fixed discriminant-key precedence
//! - **Post-order dispatch**: children are visited before their parent's
//!   handler, which receives the child results
//! - **Fallback handler**: one generic handler covers every variant without a
//!   specific one
//! - **Cycle safety**: `ref` / `resolveRef` nodes are leaves and are never followed
//!
//! ## Architecture
//!
//! ```text
//! raw value ──classify──▶ SchemaNode ──SchemaVisitor::visit──▶ Option<R>
//!   (serde_json)            (schema)          (visitor)
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod schema;
pub mod visitor;

pub use config::VisitorConfig;
pub use error::{Result, SchemaError};
pub use schema::{ParseOptions, SchemaNode, Variant};
pub use visitor::{
    build_value_visitor, build_visitor, ObjectResult, RecordResult, SchemaVisitor, VisitContext,
};
