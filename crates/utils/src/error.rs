//! Result and Error types for the utils module

/// Type alias for `Result<T, utils::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
/// The error type for `mgtools_utils`
pub enum Error {
    /// The slice of float values contains things like NAN or INFINITY
    SliceContainsUndefinedValues,

    /// For when a slice has fewer than the minimum required values
    BelowMinimumSliceLength {
        length: usize,
        minimum_required: usize,
    },

    /// Neighbouring values are equal or change direction
    NotStrictlyMonotonic { index: usize },
}

// error boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// implement standard error trait to use with ? operator
impl std::error::Error for Error {}
