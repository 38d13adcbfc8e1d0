//! `repairgrid-io`: reads the four reference sheets from disk.
//!
//! CSV/TSV files and spreadsheet workbooks are turned into cell grids; the
//! estimator crate does everything after that.

pub mod csv;
pub mod error;
pub mod source;
pub mod workbook;

pub use error::SourceError;
pub use source::{load_reference_tables, CachedSource, FileSource, SheetKind, TableSource};
