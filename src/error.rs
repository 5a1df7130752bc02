use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildLensError {
    #[error("Invalid build data: {0}")]
    DataFormat(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildLensError {
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat(message.into())
    }
}

pub type Result<T> = std::result::Result<T, BuildLensError>;
