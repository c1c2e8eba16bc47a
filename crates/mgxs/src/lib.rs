//! Multi-group cross-section libraries and solver XML export
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod condense;
mod document;
mod domain;
mod error;
mod export;
mod group;
mod library;
mod reaction;
mod reader;
mod request;
mod source;

// Inline anything important for a nice public API
#[doc(inline)]
pub use domain::{Domain, DomainKind};

#[doc(inline)]
pub use group::EnergyGroups;

#[doc(inline)]
pub use reaction::{
    ReactionRecord, ReactionType, ScatterFormat, ScatterKind, ScatterMatrix, XsData,
    ZERO_TOLERANCE,
};

#[doc(inline)]
pub use library::{read_json, DomainXs, MgxsLibrary, NuclideXs, DEFAULT_GENERATOR};

#[doc(inline)]
pub use source::XsSource;

#[doc(inline)]
pub use request::{Correction, MgxsRequest};

#[doc(inline)]
pub use document::{Element, ExportDocument, DEPLETION_ROOT, MACROSCOPIC_ROOT, XML_DECLARATION};

#[doc(inline)]
pub use export::{write_depletion_xml, write_document, write_macroscopic_xml, ExportOptions};

#[doc(inline)]
pub use reader::{read_xml, DocumentKind, DomainNode, NuclideNode, ReactionNode, XsDocument};

#[doc(inline)]
pub use error::{Error, Result};
