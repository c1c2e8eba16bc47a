use crate::error::{Error, Result};
use crate::value_ext::ValueExt;

use itertools::Itertools;

/// Direction of a strictly monotonic sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotonic {
    /// Every value is larger than the one before it
    Increasing,
    /// Every value is smaller than the one before it
    Decreasing,
}

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Direction of a strictly monotonic slice
    ///
    /// Needs at least two finite values. Any repeated value or change of
    /// direction is an error reporting the index of the offending value.
    ///
    /// ```rust
    /// # use mgtools_utils::{Error, Monotonic, SliceExt};
    /// assert_eq!([0.0_f64, 0.625, 2e7].monotonic(), Ok(Monotonic::Increasing));
    /// assert_eq!([2e7_f64, 0.625, 0.0].monotonic(), Ok(Monotonic::Decreasing));
    ///
    /// assert_eq!([0.0_f64, 1.0, 1.0].monotonic(), Err(Error::NotStrictlyMonotonic { index: 2 }));
    /// assert!([1.0_f64].monotonic().is_err());
    /// ```
    fn monotonic(&self) -> Result<Monotonic>;

    /// Check every value is within tolerance of `target`
    ///
    /// Follows the usual `|a - b| <= atol + rtol * |b|` definition. A `NaN`
    /// anywhere is never close, and an empty slice is trivially close.
    ///
    /// ```rust
    /// # use mgtools_utils::SliceExt;
    /// assert!([0.0_f64, 1e-17, -1e-16].all_close(0.0, 1e-16, 1e-16));
    /// assert!(![0.0_f64, 1e-15].all_close(0.0, 1e-16, 1e-16));
    /// assert!(![f64::NAN].all_close(0.0, 1e-16, 1e-16));
    /// ```
    fn all_close(&self, target: T, rtol: T, atol: T) -> bool;

    /// Space separated list of values using [ValueExt::repr]
    ///
    /// No leading or trailing whitespace.
    ///
    /// ```rust
    /// # use mgtools_utils::SliceExt;
    /// assert_eq!([1.0_f64, 0.5, 1e-5].to_spaced_string(), "1.0 0.5 1e-05");
    /// assert_eq!(Vec::<f64>::new().to_spaced_string(), "");
    /// ```
    fn to_spaced_string(&self) -> String;
}

impl SliceExt<f64> for [f64] {
    fn monotonic(&self) -> Result<Monotonic> {
        if self.len() < 2 {
            return Err(Error::BelowMinimumSliceLength {
                length: self.len(),
                minimum_required: 2,
            });
        }

        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        }

        // first pair decides the direction, everything else has to agree
        let direction = if self[1] > self[0] {
            Monotonic::Increasing
        } else {
            Monotonic::Decreasing
        };

        for (idx, (a, b)) in self.iter().tuple_windows().enumerate() {
            let ok = match direction {
                Monotonic::Increasing => b > a,
                Monotonic::Decreasing => b < a,
            };
            if !ok {
                return Err(Error::NotStrictlyMonotonic { index: idx + 1 });
            }
        }

        Ok(direction)
    }

    fn all_close(&self, target: f64, rtol: f64, atol: f64) -> bool {
        self.iter()
            .all(|v| (v - target).abs() <= atol + rtol * target.abs())
    }

    fn to_spaced_string(&self) -> String {
        self.iter().map(|v| v.repr()).join(" ")
    }
}
