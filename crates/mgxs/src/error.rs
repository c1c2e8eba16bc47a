//! Result and Error types for mgtools-mgxs

/// Type alias for `Result<T, mgxs::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `mgtools-mgxs` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed serde JSON operation")]
    JSONError(#[from] serde_json::Error),

    #[error("failed to move completed file into place")]
    PersistError(#[from] tempfile::PersistError),

    #[error("invalid values: {0}")]
    UtilsError(#[from] mgtools_utils::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unexpected number of {context} values (expected {expected:?}, found {found:?})")]
    UnexpectedLength {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("domain \"{domain}\" is missing a \"{reaction}\" cross section")]
    MissingData { domain: String, reaction: String },

    #[error("scattering order {requested} requested but only {available} available")]
    InsufficientLegendreOrder { requested: u32, available: u32 },

    #[error("unsupported scattering representation \"{0}\"")]
    UnsupportedFormat(String),

    #[error("parser failed: {0}")]
    Parse(String),
}

impl Error {
    /// Malformed inputs to construction of types, requests, or options
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::UnexpectedLength { .. } | Self::UtilsError(_)
        )
    }

    /// Mandatory data absent from a library or source
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            Self::MissingData { .. } | Self::InsufficientLegendreOrder { .. }
        )
    }

    /// Data that exists but cannot be flattened for export
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_))
    }
}

// this should really implement nom::error::ParseError<&str>, but the raw
// error text is only useful for debugging anyway
impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Self::Parse(mgtools_utils::f!("{err:?}"))
    }
}
