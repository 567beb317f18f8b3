pub mod autodoc;
pub mod error;
pub mod store;

pub use autodoc::{
    extract, generate, Entry, FileSource, MarkdownRenderer, Renderer, SchemaSource, StaticSource,
};
pub use error::{ConfdocError, Result};
pub use store::ConfigStore;
