use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export worker is not running")]
    WorkerGone,

    #[error("Failed to render export: {0}")]
    Render(String),

    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize export payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
