//! Data layer for a NIR spectral workbench.
//!
//! The GUI shell (windows, docks, menus, plotting) lives elsewhere and calls
//! into this crate: it imports files into a [`Workspace`], lists and reads
//! the open [`Spectrum`] documents, edits points through the workspace, and
//! exports them back out. No UI types cross this boundary, only data and
//! typed errors.

pub mod data;
pub mod error;
pub mod store;

pub use data::csv_io::{CsvOptions, ExtraColumns};
pub use data::model::{Metadata, MetadataValue, Spectrum};
pub use error::{DataError, Result};
pub use store::Workspace;
