//! Error types for mapper merging.

use thiserror::Error;

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, merging or rendering mapper files.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading an input (or writing the rendered output) failed.
    #[error("I/O error on {name}: {source}")]
    Io {
        /// Name of the file being read.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An input is not well-formed XML.
    #[error("XML parse error in {name}: {message}")]
    Parse {
        /// Name of the file being parsed.
        name: String,
        /// Description of the problem, including the byte position when known.
        message: String,
    },

    /// The doctype names of the two documents differ, or one is missing.
    #[error(
        "cannot merge {name}: existing doctype {} does not match generated doctype {}",
        describe_doctype(.existing),
        describe_doctype(.generated)
    )]
    DoctypeMismatch {
        /// Name of the existing file.
        name: String,
        /// Doctype name of the existing document.
        existing: Option<String>,
        /// Doctype name of the generated document.
        generated: Option<String>,
    },

    /// A non-whitespace child of the generated root carries no `id`.
    #[error("<{tag}> node in the generated document has no id attribute")]
    MissingId {
        /// Tag name (or node kind) of the offending child.
        tag: String,
    },

    /// A DOM mutation referenced a node that is not where it was expected.
    #[error("node error: {0}")]
    Node(String),
}

impl Error {
    pub(crate) fn io(name: &str, source: std::io::Error) -> Self {
        Error::Io {
            name: name.to_string(),
            source,
        }
    }

    pub(crate) fn parse(name: &str, message: impl Into<String>) -> Self {
        Error::Parse {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

fn describe_doctype(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("'{}'", name),
        None => "(none)".to_string(),
    }
}
