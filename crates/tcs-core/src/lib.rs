//! # tcs-core — Foundational Types for the Schema Toolkit
//!
//! Every other crate in the workspace depends on `tcs-core`; it depends on
//! nothing internal. It owns the vocabulary used to talk about failures:
//!
//! 1. **`SchemaError`**: the tagged error taxonomy (parse, id/filename
//!    mismatch, unknown reference, missing schemas, structural failure, io).
//!    Callers match on the variant instead of inspecting ad hoc fields.
//!
//! 2. **`ValidationError`**: the hierarchical, serializable diagnostic node.
//!    Engine failures, wrapped context and aggregated sibling failures all end
//!    up as a tree of these before they reach a human.
//!
//! 3. **`add_error`**: builds a parent node out of sibling failures,
//!    eliminating one level of incidental nesting.
//!
//! 4. **`simplify` / `render_report`**: collapses a tree into the compact
//!    form printed by the CLI.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tcs-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod names;
pub mod report;
pub mod simplify;

pub use error::{IdSuggestion, SchemaError};
pub use names::{has_ext, stripped_name};
pub use report::{add_error, ErrorItem, ValidationError};
pub use simplify::{render_report, simplify, simplify_sub_errors, to_pretty_json, Simplified};

/// Dialect URI stamped on every composite and written fragment.
pub const DRAFT_04_SCHEMA_URI: &str = "http://json-schema.org/draft-04/schema#";
