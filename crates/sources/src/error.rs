use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An error while locating or reading a source document.
#[derive(Error, Debug)]
pub enum Error {
    /// The document specifier names no known document.
    #[error("unknown document specifier: --doc={0}")]
    UnknownDocument(String),

    /// `table` was qualified with something that is not a microarchitecture.
    #[error("unknown microarchitecture in --doc={0}, expected one of: {1}")]
    UnknownMicroarchitecture(String, String),

    /// The document has not been downloaded to the working directory.
    #[error("file not found: {} (might be --dir missing or wrong)", .0.display())]
    NotFound(PathBuf),

    /// Reading a file failed.
    #[error("failed to read {}", path.display())]
    Io {
        #[allow(missing_docs)]
        path: PathBuf,
        #[allow(missing_docs)]
        #[source]
        source: io::Error,
    },

    /// A reference file is not well-formed XML.
    #[error("failed to parse {}", path.display())]
    Xml {
        #[allow(missing_docs)]
        path: PathBuf,
        #[allow(missing_docs)]
        #[source]
        source: roxmltree::Error,
    },

    /// Extracted pages are not in the expected JSON shape.
    #[error("failed to parse extracted pages {}", path.display())]
    Json {
        #[allow(missing_docs)]
        path: PathBuf,
        #[allow(missing_docs)]
        #[source]
        source: serde_json::Error,
    },
}

/// A convenient alias for a `Result` that uses [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
