use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Raised when a word has no vector in the loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the word '{0}' is not in the vocabulary")]
pub struct WordNotFound(pub String);

/// Problems found while parsing a vector file.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("line {line}: cannot parse '{value}' as a number")]
    InvalidNumber { line: usize, value: String },

    #[error("vector for '{word}' has dimension {found} which differs from initial dimension {expected}")]
    DimensionMismatch {
        word: String,
        found: usize,
        expected: usize,
    },

    #[error("first vector has zero dimensions")]
    ZeroDimensions,

    #[error("no word vectors found")]
    Empty,
}

/// Everything that can go wrong between a model id and a usable vector table.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

impl ModelLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ModelLoadError::Io {
            path: path.into(),
            source,
        }
    }
}
