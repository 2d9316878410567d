//! Client for poppler's `pdftotext`.

use std::ffi::OsString;
use std::path::Path;

use super::base::{ArgList, ToolClient};
use super::command::{CommandRunner, SystemRunner};
use super::version::VersionRange;
use crate::error::{Error, Result};

pub const PDFTOTEXT: &str = "pdftotext";

/// Command line options of `pdftotext`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOptions {
    pub first_page: Option<u32>,
    pub last_page: Option<u32>,
    /// resolution, in DPI (default is 72)
    pub resolution: Option<u32>,
    /// crop area top left corner
    pub crop_x: Option<u32>,
    pub crop_y: Option<u32>,
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    /// maintain original physical layout
    pub layout: bool,
    /// assume fixed-pitch (or tabular) text
    pub fixed: Option<String>,
    /// keep strings in content stream order
    pub raw: bool,
    /// discard diagonal text
    pub no_diag: bool,
    pub html_meta: bool,
    /// TSV with bounding boxes
    pub tsv: bool,
    pub encoding: Option<String>,
    /// end-of-line convention (unix, dos, or mac)
    pub eol: Option<String>,
    pub no_page_break: bool,
    pub bbox: bool,
    pub bbox_layout: bool,
    pub crop_box: bool,
    /// spacing after a word before adjacent text starts a new column,
    /// as a fraction of the font size
    pub col_spacing: Option<f32>,
    pub owner_password: Option<String>,
    pub user_password: Option<String>,
}

impl TextOptions {
    pub fn to_args(&self) -> ArgList {
        let mut args = ArgList::new();
        args.value("-f", self.first_page)
            .value("-l", self.last_page)
            .value("-r", self.resolution)
            .value("-x", self.crop_x)
            .value("-y", self.crop_y)
            .value("-W", self.crop_width)
            .value("-H", self.crop_height)
            .flag("-layout", self.layout)
            .value("-fixed", self.fixed.as_deref())
            .flag("-raw", self.raw)
            .flag("-nodiag", self.no_diag)
            .flag("-htmlmeta", self.html_meta)
            .flag("-tsv", self.tsv)
            .value("-enc", self.encoding.as_deref())
            .value("-eol", self.eol.as_deref())
            .flag("-nopgbrk", self.no_page_break)
            .flag("-bbox", self.bbox)
            .flag("-bbox-layout", self.bbox_layout)
            .flag("-cropbox", self.crop_box)
            .float("-colspacing", self.col_spacing)
            .value("-opw", self.owner_password.as_deref())
            .value("-upw", self.user_password.as_deref());
        args
    }
}

/// `pdftotext` bound to a runner whose version has been checked.
#[derive(Debug, Clone)]
pub struct PdfToText<R = SystemRunner> {
    tool: ToolClient<R>,
}

impl PdfToText<SystemRunner> {
    pub fn new() -> Result<Self> {
        Self::with_runner(SystemRunner::default())
    }
}

impl<R: CommandRunner> PdfToText<R> {
    pub fn with_runner(runner: R) -> Result<Self> {
        Self::with_range(runner, &VersionRange::default())
    }

    pub fn with_range(runner: R, range: &VersionRange) -> Result<Self> {
        Ok(Self {
            tool: ToolClient::connect(PDFTOTEXT, runner, range)?,
        })
    }

    pub fn version(&self) -> Result<String> {
        self.tool.version()
    }

    /// Encodings listed by `-listenc`, without the header line.
    pub fn encodings(&self) -> Result<Vec<String>> {
        let out = self.tool.run(&[OsString::from("-listenc")])?;
        let listing = out
            .stdout
            .ok_or_else(|| Error::MalformedOutput("empty encoding listing".into()))?;
        Ok(listing
            .trim()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect())
    }

    /// Extract the text of `file`. `None` when the document has no text.
    pub fn text(&self, file: &Path, options: &TextOptions) -> Result<Option<String>> {
        let mut args = options.to_args();
        args.push(file).push("-");
        self.tool.convert(args.as_slice())
    }
}
