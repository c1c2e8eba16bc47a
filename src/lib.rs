//! `mgtools` is a small toolkit for preparing multi-group cross sections for
//! deterministic transport solvers
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use mgtools_utils as utils;

#[cfg(feature = "mgxs")]
#[cfg_attr(docsrs, doc(cfg(feature = "mgxs")))]
#[doc(inline)]
pub use mgtools_mgxs as mgxs;
