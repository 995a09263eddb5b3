//! # tcs-schema — Schema Composition & Validation
//!
//! Turns directories of small draft-04 fragment files into one composite
//! schema (and back), and validates instances against it with
//! hierarchical, schema-relative diagnostics.
//!
//! ## Responsibilities
//!
//! - **Repository:** Process-scoped name → schema registry with `$ref`
//!   resolution (`name`, `name#/pointer`, `name#anchor`).
//! - **Validation:** [`Validator`] delegates keyword evaluation to a
//!   [`ValidationEngine`] (the `jsonschema` crate in production), bootstraps
//!   the bundled draft-04 metaschema once, and turns engine failures into
//!   [`tcs_core::ValidationError`] trees.
//! - **Composition:** [`SchemaComposer`] builds a composite out of fragment
//!   files, enforcing that each fragment's `id` matches its file name;
//!   [`SchemaSplitter`] writes a composite back out as fragments.
//! - **Catalog & suite:** [`SchemaCatalog`] validates by type id;
//!   [`suite`] runs data-driven conformance fixtures.
//!
//! ## Design
//!
//! The repository is passed around as an `Arc`, never a global. Locks are
//! `parking_lot` and are never held across an `.await`; file reads fan out
//! over a tokio `JoinSet` and are reduced serially in file-name order.

pub mod catalog;
pub mod compose;
pub mod engine;
pub mod formats;
pub mod io;
pub mod repository;
pub mod resolver;
pub mod settings;
pub mod split;
pub mod store;
pub mod suite;
pub mod tree;
pub mod validator;

// Re-export primary types.
pub use catalog::SchemaCatalog;
pub use compose::{Fragment, FragmentListing, SchemaComposer};
pub use engine::{EngineOutcome, JsonSchemaEngine, RawError, ValidationEngine};
pub use formats::FormatRegistry;
pub use repository::SchemaRepository;
pub use resolver::PathResolver;
pub use settings::{default_schema_name, SchemaSettings, DEFAULT_SCHEMA_DIR};
pub use split::SchemaSplitter;
pub use store::SchemaFiles;
pub use suite::{run_suite, SuiteReport};
pub use tree::build_error_tree;
pub use validator::{Validator, METASCHEMA_URI};
