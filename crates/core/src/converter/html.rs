//! Client for poppler's `pdftohtml`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::base::{ArgList, ToolClient};
use super::command::{CommandRunner, SystemRunner};
use super::scratch::{Converted, ScratchDir};
use super::version::VersionRange;
use super::xml::{PdfXml, parse_pdf_xml};
use crate::error::Result;

pub const PDFTOHTML: &str = "pdftohtml";

/// Command line options of `pdftohtml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlOptions {
    /// first page to convert
    pub first_page: Option<u32>,
    /// last page to convert
    pub last_page: Option<u32>,
    /// don't print any messages or errors
    pub quiet: bool,
    /// exchange .pdf links by .html
    pub exchange_links: bool,
    /// generate complex document
    pub complex: bool,
    /// generate single document that includes all pages
    pub single_doc: bool,
    pub ignore_images: bool,
    pub no_frames: bool,
    /// use standard output
    pub stdout: bool,
    /// zoom the pdf document (default 1.5)
    pub zoom: Option<f32>,
    /// output for XML post-processing
    pub xml: bool,
    /// do not round coordinates (with XML output only)
    pub no_round_coord: bool,
    /// output hidden text
    pub hidden: bool,
    /// do not merge paragraphs
    pub no_merge: bool,
    /// output text encoding name
    pub encoding: Option<String>,
    /// image file format for Splash output (png or jpg)
    pub image_format: Option<String>,
    pub owner_password: Option<String>,
    pub user_password: Option<String>,
    /// override document DRM settings
    pub no_drm: bool,
    /// word break threshold (default 10 percent)
    pub word_break_threshold: Option<u32>,
    /// outputs font full name
    pub font_full_name: bool,
}

impl HtmlOptions {
    pub fn pages(mut self, first: u32, last: u32) -> Self {
        self.first_page = Some(first);
        self.last_page = Some(last);
        self
    }

    /// Flags in the order `pdftohtml` documents them.
    pub fn to_args(&self) -> ArgList {
        let mut args = ArgList::new();
        args.value("-f", self.first_page)
            .value("-l", self.last_page)
            .flag("-q", self.quiet)
            .flag("-p", self.exchange_links)
            .flag("-c", self.complex)
            .flag("-s", self.single_doc)
            .flag("-i", self.ignore_images)
            .flag("-noframes", self.no_frames)
            .flag("-stdout", self.stdout)
            .float("-zoom", self.zoom)
            .flag("-xml", self.xml)
            .flag("-noroundcoord", self.no_round_coord)
            .flag("-hidden", self.hidden)
            .flag("-nomerge", self.no_merge)
            .value("-enc", self.encoding.as_deref())
            .value("-fmt", self.image_format.as_deref())
            .value("-opw", self.owner_password.as_deref())
            .value("-upw", self.user_password.as_deref())
            .flag("-nodrm", self.no_drm)
            .value("-wbt", self.word_break_threshold)
            .flag("-fontfullname", self.font_full_name);
        args
    }
}

/// Files a conversion wrote, plus whatever it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOutput {
    pub stdout: Option<String>,
    pub html_file: PathBuf,
    pub xml_file: PathBuf,
}

/// `pdftohtml` bound to a runner whose version has been checked.
#[derive(Debug, Clone)]
pub struct PdfToHtml<R = SystemRunner> {
    tool: ToolClient<R>,
}

impl PdfToHtml<SystemRunner> {
    /// Use the `pdftohtml` on `PATH`. Fails if its version is unsupported.
    pub fn new() -> Result<Self> {
        Self::with_runner(SystemRunner::default())
    }
}

impl<R: CommandRunner> PdfToHtml<R> {
    pub fn with_runner(runner: R) -> Result<Self> {
        Self::with_range(runner, &VersionRange::default())
    }

    pub fn with_range(runner: R, range: &VersionRange) -> Result<Self> {
        Ok(Self {
            tool: ToolClient::connect(PDFTOHTML, runner, range)?,
        })
    }

    pub fn version(&self) -> Result<String> {
        self.tool.version()
    }

    /// Convert `file`, writing output files next to `output_prefix`.
    pub fn convert(
        &self,
        file: &Path,
        output_prefix: &Path,
        options: &HtmlOptions,
    ) -> Result<ConvertOutput> {
        let mut args = options.to_args();
        args.push(file).push(output_prefix);
        let stdout = self.tool.convert(args.as_slice())?;
        Ok(ConvertOutput {
            stdout,
            html_file: with_suffix(output_prefix, "html"),
            xml_file: with_suffix(output_prefix, "xml"),
        })
    }

    /// Convert `file` to XML and decode it. `options.xml` is forced on.
    pub fn xml(&self, file: &Path, options: &HtmlOptions) -> Result<Converted<PdfXml>> {
        let options = HtmlOptions {
            xml: true,
            ..options.clone()
        };
        self.read_output(file, &options, |out| &out.xml_file, |content| {
            parse_pdf_xml(&content)
        })
    }

    /// Convert `file` to HTML. `options.xml` is forced off.
    pub fn html(&self, file: &Path, options: &HtmlOptions) -> Result<Converted<String>> {
        let options = HtmlOptions {
            xml: false,
            ..options.clone()
        };
        self.read_output(file, &options, |out| &out.html_file, Ok)
    }

    fn read_output<T>(
        &self,
        file: &Path,
        options: &HtmlOptions,
        pick: impl Fn(&ConvertOutput) -> &PathBuf,
        decode: impl FnOnce(String) -> Result<T>,
    ) -> Result<Converted<T>> {
        let scratch = ScratchDir::for_source(file)?;
        let output = self.convert(file, &scratch.output_prefix(), options)?;
        let content = fs::read_to_string(pick(&output))?;
        debug!(file = %file.display(), bytes = content.len(), "read converter output");
        let files = [output.xml_file.as_path(), output.html_file.as_path()];
        // Capture the payload first; cleanup failures ride along in `Converted`.
        let value = decode(content)?;
        Ok(scratch.finish(value, &files))
    }
}

fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = prefix.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
