use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UcrError {
    // IO-related errors
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read from stdin")]
    StdinRead(#[from] std::io::Error),

    // Data processing errors
    #[error("Failed to parse JSON: {context}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse JSON from stdin")]
    StdinJsonParse(#[from] serde_json::Error),

    #[error("Failed to serialize report")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    // Configuration errors
    #[error("Failed to read config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing input: {what}")]
    MissingInput { what: String },

    // Runtime setup
    #[error("Failed to configure thread pool")]
    ThreadPoolInit(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to initialize logging: {message}")]
    LoggingInit { message: String },
}

pub type Result<T> = std::result::Result<T, UcrError>;
