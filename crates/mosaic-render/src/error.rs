//! Error types for composition and rendering.
//!
//! There are two families, scoped differently:
//!
//! - [`BuildError`]: composing a template set failed. Scoped to one module (or to
//!   the layout set at startup). A module whose set fails to build is simply not
//!   published.
//! - [`RenderError`]: executing a composed set failed for one request.
//!
//! Both abstract over the underlying MiniJinja errors so callers never match on
//! engine internals.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while loading or composing a template set.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The layout directory has no template files at all.
    #[error("layout directory {} contains no templates", .dir.display())]
    EmptyLayout { dir: PathBuf },

    /// A template file or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template file failed to compile.
    #[error("{file} in {set} failed to parse: {message}")]
    Parse {
        /// Module id, or `layout` for the base set.
        set: String,
        /// Filename of the offending template.
        file: String,
        message: String,
    },

    /// Two files of the same set resolve to the same block name.
    #[error("{first} and {second} in {set} both define block \"{name}\"")]
    DuplicateBlock {
        set: String,
        name: String,
        first: String,
        second: String,
    },
}

impl BuildError {
    pub(crate) fn parse(set: &str, file: &str, err: minijinja::Error) -> Self {
        BuildError::Parse {
            set: set.to_string(),
            file: file.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error type for template execution.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template syntax error or runtime evaluation failure.
    #[error("template error: {0}")]
    TemplateError(String),

    /// A named block is not present in the set.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Data serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The composed set has no `page` block, neither from the module nor from the layout.
    #[error("module template missing: {module} has no `page` block")]
    MissingEntryBlock { module: String },

    /// The base set has no `layout` block, so no full document can be produced.
    #[error("layout template missing: no `layout` block in the base set")]
    MissingLayout,

    /// Other operational error.
    #[error("{0}")]
    OperationError(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod => RenderError::TemplateError(err.to_string()),
            ErrorKind::BadSerialization => RenderError::SerializationError(err.to_string()),
            _ => RenderError::OperationError(err.to_string()),
        }
    }
}
