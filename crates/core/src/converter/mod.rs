//! Poppler converter clients.
//!
//! - [`PdfToHtml`]: runs `pdftohtml`, decodes its `-xml` envelope into
//!   [`PdfXml`] pages of positioned text
//! - [`PdfToText`]: runs `pdftotext`
//! - [`CommandRunner`]: process seam shared by both clients
//!
//! Both clients check the installed tool's version once, at construction.

pub mod base;
pub mod command;
pub mod html;
pub mod scratch;
pub mod text;
pub mod version;
pub mod xml;

pub use base::{ArgList, ToolClient};
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use html::{ConvertOutput, HtmlOptions, PDFTOHTML, PdfToHtml};
pub use scratch::{Converted, ScratchDir};
pub use text::{PDFTOTEXT, PdfToText, TextOptions};
pub use version::{ToolVersion, VersionRange};
pub use xml::{FontSpec, Page, PdfXml, parse_pdf_xml};
