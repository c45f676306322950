//! Error types for the logging configuration surface.
//!
//! Only configuration can fail from the caller's point of view. Runtime I/O
//! problems on an output are handled where they happen (see
//! [`crate::output::LineWriter`]) and never reach a log call site.

use crate::selection::MAX_SELECTIONS;
use crate::tag::{Tag, MAX_TAGS_PER_SET};
use std::io;
use std::path::PathBuf;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors produced while parsing a selection expression.
///
/// Every variant carries the offending substring so the caller can fix the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Invalid tag '{0}' in log selection")]
    UnknownTag(String),

    #[error("Invalid level '{0}' in log selection")]
    UnknownLevel(String),

    #[error("Log selection '{selection}' contains duplicate tag '{tag}'")]
    DuplicateTag { selection: String, tag: String },

    #[error("Log selection '{0}' contains an empty tag")]
    EmptyTag(String),

    #[error("Too many tags in log selection '{0}' (can only have up to {} tags)", MAX_TAGS_PER_SET)]
    TooManyTags(String),

    #[error("Too many log selections in '{0}' (can only have up to {} selections)", MAX_SELECTIONS)]
    TooManySelections(String),

    #[error("Invalid log selection '{0}'")]
    Malformed(String),
}

/// Errors produced when a call site asks for an impossible tag combination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagSetError {
    #[error("A tag set needs at least one tag")]
    Empty,

    #[error("A tag set can have at most {} tags, got {0}", MAX_TAGS_PER_SET)]
    TooManyTags(usize),

    #[error("Tag '{0}' appears more than once in a tag set")]
    DuplicateTag(Tag),
}

/// Errors produced while parsing a decorator list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecoratorError {
    #[error("Invalid decorator '{0}'")]
    Unknown(String),

    #[error("Decorator 'none' cannot be combined with other decorators in '{0}'")]
    NoneCombined(String),
}

/// Errors produced while creating or initializing an output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Unsupported log output type '{0}'")]
    UnsupportedType(String),

    #[error("Output '{0}' does not accept any options")]
    OptionsNotSupported(String),

    #[error("Invalid option '{0}' for log file output")]
    UnknownOption(String),

    #[error("Invalid value '{value}' for option '{key}': {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unable to log to file {path:?} with log file rotation: not a regular file")]
    NotRegularFile { path: PathBuf },

    #[error("Error opening log file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Initialization of output '{name}' using options '{options}' failed: {source}")]
    Initialize {
        name: String,
        options: String,
        #[source]
        source: Box<OutputError>,
    },
}

/// Top-level configuration error.
///
/// A configuration command that fails with any of these leaves the previous
/// configuration untouched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Decorator(#[from] DecoratorError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    TagSet(#[from] TagSetError),

    #[error("No such log output: {0}")]
    NoSuchOutput(String),

    #[error("Output handle #{index} refers to an output that no longer exists")]
    StaleHandle { index: usize },

    #[error("Invalid -Xlog option '{0}'")]
    MalformedCommand(String),

    #[error("Async logging is already enabled")]
    AsyncAlreadyEnabled,

    #[error("Failed to start async log writer thread: {0}")]
    AsyncThread(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_offending_text() {
        let err = SelectionError::UnknownTag("hep".to_string());
        assert_eq!(err.to_string(), "Invalid tag 'hep' in log selection");

        let err = SelectionError::TooManyTags("a+b+c+d+e+f".to_string());
        assert!(err.to_string().contains("up to 5 tags"));

        let err: ConfigError = DecoratorError::Unknown("colour".to_string()).into();
        assert_eq!(err.to_string(), "Invalid decorator 'colour'");
    }

    #[test]
    fn test_initialize_error_includes_options() {
        let err = OutputError::Initialize {
            name: "file=gc.log".to_string(),
            options: "filecount=x".to_string(),
            source: Box::new(OutputError::InvalidOption {
                key: "filecount".to_string(),
                value: "x".to_string(),
                reason: "not a number".to_string(),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("file=gc.log"));
        assert!(text.contains("filecount=x"));
    }
}
