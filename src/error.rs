use std::path::PathBuf;

/// Result type alias for the schema engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the schema engine
///
/// Only [`Error::InvalidConfig`] (and I/O failures while loading stored schemas at
/// start-up) ever reach a caller of the engine. Everything else is recoverable and
/// is absorbed by the resolution chain.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// A type, file or declaration does not exist
    NotFound(String),
    /// Source text could not be parsed
    ParseFailure { file: PathBuf, message: String },
    /// A language construct with no schema mapping
    UnsupportedShape(String),
    InvalidConfig(String),
    SerializationError(String),
}

impl Error {
    /// Whether the failure should make the caller fall through to the next strategy
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::ParseFailure { .. } | Error::UnsupportedShape(_)
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::NotFound(what) => write!(f, "not found: {}", what),
            Error::ParseFailure { file, message } => {
                write!(f, "failed to parse {}: {}", file.display(), message)
            }
            Error::UnsupportedShape(what) => write!(f, "unsupported type shape: {}", what),
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseFailure {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
