//! pdfgrid - table reconstruction from poppler's positioned text output.
//!
//! [`table::extract_table`] turns a page of positioned text fragments into
//! ordered rows of column-aligned entries. The [`converter`] module obtains
//! those fragments by running `pdftohtml -xml` and decoding its output.

pub mod converter;
pub mod error;
pub mod table;

pub use converter::{Page, PdfToHtml, PdfToText, PdfXml};
pub use error::{Error, Result, TableError};
pub use table::{PositionedText, TableEntry, TableExtractionConfig, extract_table};
