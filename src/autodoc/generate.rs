//! Documentation generation pipeline
//!
//! Thin orchestration over the scanner and a renderer: fetch declaration
//! text from a schema source, extract entries, render. Each call is a
//! fresh extraction/render cycle with no caching.

use std::path::{Path, PathBuf};

use crate::autodoc::extract::extract;
use crate::autodoc::render::Renderer;
use crate::error::{ConfdocError, Result};

/// Supplies the literal source text of a configuration-defaults
/// declaration. How the text was obtained (embedded constant, file,
/// build-time source map) is the implementor's concern.
pub trait SchemaSource {
    fn declaration_source(&self) -> Result<String>;
}

/// Schema source backed by an in-memory string.
#[derive(Debug, Clone)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SchemaSource for StaticSource {
    fn declaration_source(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Schema source backed by a file, read once per call.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchemaSource for FileSource {
    fn declaration_source(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            ConfdocError::MissingSource(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// Generates a documentation string for the declarations supplied by
/// `source`, using `renderer` for formatting.
///
/// The extractor is never invoked when the source fails; renderer output
/// is returned unchanged.
pub fn generate(
    source: &dyn SchemaSource,
    renderer: &dyn Renderer,
    subject: &str,
    version: Option<&str>,
) -> Result<String> {
    let text = source.declaration_source()?;
    let entries = extract(&text);

    tracing::debug!(subject, entries = entries.len(), "rendering schema documentation");

    renderer.render(subject, version, &entries)
}
