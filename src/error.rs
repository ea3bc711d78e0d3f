use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum LinkedNotesError {
    #[error("Circular reference to note '{0}'")]
    CircularReference(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal resolver error: {0}")]
    Internal(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("Failed to read note '{path}': {message}")]
    Read { path: String, message: String },
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl LinkedNotesError {
    pub fn read(path: impl fmt::Display, src: impl fmt::Display) -> Self {
        LinkedNotesError::Read {
            path: path.to_string(),
            message: src.to_string(),
        }
    }
}

impl From<toml::de::Error> for LinkedNotesError {
    fn from(src: toml::de::Error) -> LinkedNotesError {
        LinkedNotesError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for LinkedNotesError {
    fn from(src: toml::ser::Error) -> LinkedNotesError {
        LinkedNotesError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for LinkedNotesError {
    fn from(src: JsonError) -> LinkedNotesError {
        LinkedNotesError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for LinkedNotesError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => LinkedNotesError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => LinkedNotesError::PermissionDenied,
            _ => LinkedNotesError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for LinkedNotesError {
    fn from(x: walkdir::Error) -> Self {
        let path = x.path().map(|p| format!("{p:?}")).unwrap_or_default();
        match x.into_io_error() {
            Some(io_error) => LinkedNotesError::from(io_error),
            None => LinkedNotesError::Io(format!("Directory walk failed at {path}")),
        }
    }
}
