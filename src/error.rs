use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfdocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Schema source unavailable: {0}")]
    MissingSource(String),

    #[error("Renderer has no formatting implementation")]
    RendererNotImplemented,

    #[error("Unsupported configuration variable: {0}")]
    UnsupportedVariable(String),

    #[error("Initialization error: {0}")]
    Initialization(String),
}

pub type Result<T> = std::result::Result<T, ConfdocError>;
