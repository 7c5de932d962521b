use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum MdAnkiError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("Invalid pattern: {0}")]
    Regex(String),
    #[error("Remote store error: {0}")]
    Remote(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<StripPrefixError> for MdAnkiError {
    fn from(src: StripPrefixError) -> MdAnkiError {
        MdAnkiError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for MdAnkiError {
    fn from(src: toml::de::Error) -> MdAnkiError {
        MdAnkiError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for MdAnkiError {
    fn from(src: toml::ser::Error) -> MdAnkiError {
        MdAnkiError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for MdAnkiError {
    fn from(src: JsonError) -> MdAnkiError {
        MdAnkiError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<serde_yaml::Error> for MdAnkiError {
    fn from(src: serde_yaml::Error) -> MdAnkiError {
        MdAnkiError::Serialization(format!("YAML deserialization error: {src}"))
    }
}

impl From<io::Error> for MdAnkiError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => MdAnkiError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => MdAnkiError::PermissionDenied,
            _ => MdAnkiError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for MdAnkiError {
    fn from(x: fmt::Error) -> Self {
        MdAnkiError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for MdAnkiError {
    fn from(x: RegexError) -> Self {
        MdAnkiError::Regex(format!("Regex parse failed: {x}"))
    }
}

impl From<globset::Error> for MdAnkiError {
    fn from(x: globset::Error) -> Self {
        MdAnkiError::Config(format!("Invalid ignore glob: {x}"))
    }
}

impl From<walkdir::Error> for MdAnkiError {
    fn from(x: walkdir::Error) -> Self {
        match x.into_io_error() {
            Some(io_error) => MdAnkiError::from(io_error),
            None => MdAnkiError::Io("directory walk hit a filesystem loop".to_string()),
        }
    }
}
