//! Handler schema engine - JSON-Schema-shaped descriptions of handler payload types.
//!
//! Given a web handler, the engine produces a schema for its request body and its
//! response. Type information comes from whichever source is available first:
//! the running program (via the [`reflect::Reflect`] trait), a pre-generated schema
//! file, or static analysis of the project's Rust sources. When none of them works
//! the engine still answers, with a placeholder explicitly marked as degraded.
//!
//! # Architecture
//!
//! 1. [`descriptor`] - strategy-agnostic type descriptors
//! 2. [`metadata`] - field attributes and tags (renames, optionality, constraints)
//! 3. [`reflect`] - descriptors from live types
//! 4. [`scanner`], [`parser`], [`locator`], [`type_resolver`] - descriptors from source
//! 5. [`schema_compiler`] - descriptors to [`schema::SchemaNode`]s, with cycle and depth guards
//! 6. [`cache`] - process-lifetime schema cache
//! 7. [`strategy`] - the resolution chain and the [`strategy::SchemaEngine`] entry point
//! 8. [`serializer`] - versioned schema files and the schema store
//!
//! # Example Usage
//!
//! ```no_run
//! use handler_schema::config::EngineConfig;
//! use handler_schema::strategy::{HandlerRef, SchemaEngine, SourceRef};
//!
//! let engine = SchemaEngine::new(EngineConfig::new("./my-service")).unwrap();
//! let handler = HandlerRef::new("create_user")
//!     .with_source(SourceRef::new("src/handlers.rs").with_request("CreateUser"));
//!
//! let schema = engine.compile_request_schema(&handler);
//! println!("{}", serde_json::to_string_pretty(&schema).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! The offline generator lives in the [`cli`] module.

pub mod cache;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod locator;
pub mod metadata;
pub mod parser;
pub mod reflect;
pub mod scanner;
pub mod schema;
pub mod schema_compiler;
pub mod serializer;
pub mod strategy;
pub mod type_resolver;
