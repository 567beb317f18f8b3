//! Document renderers
//!
//! A renderer turns an ordered list of extracted entries into an output
//! document. The trait's provided `render` fails loudly, so a renderer
//! that forgets to supply formatting logic is distinguishable from one
//! that was handed no entries.

use crate::autodoc::extract::Entry;
use crate::error::{ConfdocError, Result};

/// Capability to format extracted entries into a document string.
///
/// Implementations must emit a top-level heading containing `subject`, a
/// version annotation right after it when `version` is given, and one
/// block per entry in input order: a sub-heading with the entry name, a
/// visually distinguished default, and the comment when present. A
/// well-formed entry slice, including an empty one, must never error.
pub trait Renderer {
    fn render(&self, subject: &str, version: Option<&str>, entries: &[Entry]) -> Result<String> {
        let _ = (subject, version, entries);
        Err(ConfdocError::RendererNotImplemented)
    }
}

/// Reference Markdown renderer. Blocks are separated by blank lines; the
/// document carries no trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, subject: &str, version: Option<&str>, entries: &[Entry]) -> Result<String> {
        let mut blocks = vec![heading(subject, 1)];

        if let Some(version) = version {
            blocks.push(format!("*Version: {}*", version));
        }

        for entry in entries {
            blocks.push(heading(&entry.name, 2));
            blocks.push(format!("Default: *{}*", entry.default));
            if let Some(comment) = &entry.comment {
                blocks.push(comment.clone());
            }
        }

        Ok(blocks.join("\n\n"))
    }
}

fn heading(text: &str, level: usize) -> String {
    format!("{} {}", "#".repeat(level), text)
}
