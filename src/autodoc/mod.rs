//! Configuration-schema introspection.
//!
//! This module turns the source text of a configuration-defaults mapping
//! into structured `(name, default, comment)` entries and renders them
//! into reference documentation:
//!
//! - `extract`: tolerant scanner over declaration source text
//! - `Renderer` / `MarkdownRenderer`: formatting of extracted entries
//! - `SchemaSource` / `generate`: the fetch-extract-render pipeline

pub mod extract;
pub mod generate;
pub mod render;

pub use extract::{extract, Entry};
pub use generate::{generate, FileSource, SchemaSource, StaticSource};
pub use render::{MarkdownRenderer, Renderer};
