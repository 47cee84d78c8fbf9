use std::io;

use thiserror::Error;

/// Errors raised while generating endpoint code.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Writing a generated unit failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The service model contains something that is not valid Rust syntax,
    /// for example an unparsable type path.
    #[error("invalid {what} `{input}`: {source}")]
    Syn {
        /// What was being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
        /// The underlying parse error.
        #[source]
        source: syn::Error,
    },

    /// A plugin parameter could not be understood.
    #[error("invalid parameter `{0}`")]
    Parameter(String),

    /// Neither `Config::out_dir` nor the `OUT_DIR` environment variable is
    /// set.
    #[error("output directory is not configured and OUT_DIR is not set")]
    MissingOutDir,

    /// The protoc plugin request is inconsistent.
    #[error("{0}")]
    Plugin(String),
}

impl GeneratorError {
    pub(crate) fn syn(what: &'static str, input: impl Into<String>, source: syn::Error) -> Self {
        GeneratorError::Syn {
            what,
            input: input.into(),
            source,
        }
    }
}

impl From<GeneratorError> for io::Error {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

/// Result type of the generator.
pub type GeneratorResult<T> = std::result::Result<T, GeneratorError>;
