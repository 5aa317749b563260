use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locators file {path}: {source}")]
    LocatorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locators file: {0}")]
    LocatorsFileParse(#[source] serde_yaml::Error),

    #[error("locator table validation failed: {0}")]
    Validation(String),
}
