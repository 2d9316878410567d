//! Converter clients driven by a scripted runner instead of poppler.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use pdfgrid_core::converter::{
    CommandOutput, CommandRunner, HtmlOptions, PdfToHtml, PdfToText, TextOptions, VersionRange,
};
use pdfgrid_core::error::{Error, Result};

type Response = Box<dyn Fn(&[String]) -> Result<CommandOutput>>;

/// Answers each call with the next queued response and records argv.
#[derive(Default)]
struct ScriptedRunner {
    calls: RefCell<Vec<Vec<String>>>,
    responses: RefCell<VecDeque<Response>>,
}

impl ScriptedRunner {
    fn then(self, response: impl Fn(&[String]) -> Result<CommandOutput> + 'static) -> Self {
        self.responses.borrow_mut().push_back(Box::new(response));
        self
    }

    fn then_version(self, tool: &'static str, version: &'static str) -> Self {
        self.then(move |_| Ok(CommandOutput::new("", banner(tool, version))))
    }

    fn push(&self, response: impl Fn(&[String]) -> Result<CommandOutput> + 'static) {
        self.responses.borrow_mut().push_back(Box::new(response));
    }

    fn last_call(&self) -> Vec<String> {
        self.calls.borrow().last().cloned().unwrap_or_default()
    }
}

impl fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.calls.borrow())
            .field("pending", &self.responses.borrow().len())
            .finish()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
        self.calls.borrow_mut().push(argv.clone());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Io(std::io::Error::other("GENERAL ERROR")))?;
        response(&argv)
    }
}

fn banner(tool: &str, version: &str) -> String {
    format!(
        "{tool} version {version}\n\
         Copyright 2005-2024 The Poppler Developers - http://poppler.freedesktop.org\n\
         Copyright 1996-2011, 2022 Glyph & Cog, LLC"
    )
}

const XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pdf2xml SYSTEM "pdf2xml.dtd">

<pdf2xml producer="poppler" version="24.11.0">
<page number="1" position="absolute" top="0" left="0" height="1262" width="892">
	<fontspec id="0" size="8" family="ArialMT" color="#000000"/>
	<text top="452" left="106" width="227" height="19" font="0"><b>Test Bold</b></text>
	<text top="471" left="106" width="188" height="19" font="0"><b>Test</b> mixed</text>
</page>
</pdf2xml>"##;

/// Response that writes `content` to `<prefix>.<ext>`, where the prefix is
/// the last argument, as pdftohtml does.
fn writes_output(ext: &'static str, content: &'static str) -> impl Fn(&[String]) -> Result<CommandOutput> {
    move |argv: &[String]| {
        let prefix = argv.last().cloned().unwrap_or_default();
        fs::write(format!("{prefix}.{ext}"), content)?;
        Ok(CommandOutput::new("Page-1\n", ""))
    }
}

fn scratch_dir_of(argv: &[String]) -> PathBuf {
    Path::new(argv.last().unwrap()).parent().unwrap().to_path_buf()
}

#[test]
fn test_client_checks_version_on_construction() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner);
    assert!(client.is_ok());
    assert_eq!(runner.last_call(), vec!["pdftohtml", "-v"]);
}

#[test]
fn test_client_without_version_fails() {
    let runner = ScriptedRunner::default();
    let err = PdfToHtml::with_runner(&runner).unwrap_err();
    assert_eq!(err.to_string(), "cannot check version of pdftohtml");
    assert_eq!(runner.last_call(), vec!["pdftohtml", "-v"]);
}

#[test]
fn test_client_rejects_out_of_range_versions() {
    let low = ScriptedRunner::default().then_version("pdftohtml", "24.10.1000");
    assert_eq!(
        PdfToHtml::with_runner(&low).unwrap_err().to_string(),
        "version 24.10.1000 does not pass the version constraint >= 24.11.0, < 25.0"
    );

    let high = ScriptedRunner::default().then_version("pdftohtml", "25.0.0");
    assert_eq!(
        PdfToHtml::with_runner(&high).unwrap_err().to_string(),
        "version 25.0.0 does not pass the version constraint >= 24.11.0, < 25.0"
    );

    let pre = ScriptedRunner::default().then_version("pdftohtml", "24.12.0-rc1");
    assert!(matches!(
        PdfToHtml::with_runner(&pre),
        Err(Error::UnsupportedVersion { .. })
    ));

    let junk = ScriptedRunner::default().then_version("pdftohtml", "not-a-version");
    assert!(matches!(
        PdfToHtml::with_runner(&junk),
        Err(Error::VersionParse(_))
    ));
}

#[test]
fn test_custom_version_range() {
    let range = VersionRange::new("1.0".parse().unwrap(), "2.0".parse().unwrap());
    let runner = ScriptedRunner::default().then_version("pdftotext", "1.5");
    assert!(PdfToText::with_range(&runner, &range).is_ok());
}

#[test]
fn test_version_reports_any_format() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();

    for version in ["24.11.0", "1.0", "2.5", "100.2.4", "50.0.4-meta"] {
        runner.push(move |_| Ok(CommandOutput::new("", banner("pdftohtml", version))));
        assert_eq!(client.version().unwrap(), version);
        assert_eq!(runner.last_call(), vec!["pdftohtml", "-v"]);
    }
}

#[test]
fn test_version_errors() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();

    // runner failure propagates
    assert!(matches!(client.version(), Err(Error::Io(_))));

    // banner without a version
    runner.push(|_| Ok(CommandOutput::new("", "invalidValue")));
    assert!(matches!(
        client.version(),
        Err(Error::VersionUnavailable(_))
    ));

    // banner on the wrong channel
    runner.push(|_| Ok(CommandOutput::new(banner("pdftohtml", "24.11.0"), "")));
    assert!(matches!(
        client.version(),
        Err(Error::VersionUnavailable(_))
    ));
}

#[test]
fn test_convert_passes_file_and_prefix_last() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(|_| Ok(CommandOutput::new("Page-1\n", "")));

    let options = HtmlOptions {
        quiet: true,
        ..HtmlOptions::default().pages(2, 2)
    };
    let out = client
        .convert(Path::new("doc.pdf"), Path::new("/tmp/prefix"), &options)
        .unwrap();
    assert_eq!(
        runner.last_call(),
        vec!["pdftohtml", "-f", "2", "-l", "2", "-q", "doc.pdf", "/tmp/prefix"]
    );
    assert_eq!(out.stdout.as_deref(), Some("Page-1\n"));
    assert_eq!(out.html_file, PathBuf::from("/tmp/prefix.html"));
    assert_eq!(out.xml_file, PathBuf::from("/tmp/prefix.xml"));
}

#[test]
fn test_convert_fails_on_diagnostic_channel() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(|_| Ok(CommandOutput::new("", "Syntax Error: broken xref")));

    let err = client
        .convert(Path::new("doc.pdf"), Path::new("/tmp/prefix"), &HtmlOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "channel: Syntax Error: broken xref");
}

#[test]
fn test_xml_reads_parses_and_cleans_up() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(writes_output("xml", XML));

    let converted = client
        .xml(Path::new("test/Test_PDF.pdf"), &HtmlOptions::default())
        .unwrap();
    assert!(converted.cleanup.is_none());

    let argv = runner.last_call();
    assert!(argv.contains(&"-xml".to_string()));
    assert_eq!(argv[argv.len() - 2], "test/Test_PDF.pdf");
    assert!(!scratch_dir_of(&argv).exists());

    let doc = converted.into_inner();
    assert_eq!(doc.producer.as_deref(), Some("poppler"));
    let page = doc.page(1).unwrap();
    assert_eq!(page.font_specs.len(), 1);
    assert_eq!(page.texts[1].text, " mixed");
    assert_eq!(page.texts[1].bold_text.as_deref(), Some("Test"));
}

#[test]
fn test_html_forces_xml_off() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(writes_output("html", "<html></html>"));

    let options = HtmlOptions {
        xml: true,
        ..Default::default()
    };
    let html = client
        .html(Path::new("doc.pdf"), &options)
        .unwrap()
        .strict()
        .unwrap();
    assert_eq!(html, "<html></html>");

    let argv = runner.last_call();
    assert!(!argv.contains(&"-xml".to_string()));
    assert!(!scratch_dir_of(&argv).exists());
}

#[test]
fn test_missing_output_file_still_removes_scratch() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(|_| Ok(CommandOutput::new("", "")));

    let err = client
        .xml(Path::new("doc.pdf"), &HtmlOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!scratch_dir_of(&runner.last_call()).exists());
}

#[test]
fn test_malformed_xml_is_reported() {
    let runner = ScriptedRunner::default().then_version("pdftohtml", "24.11.0");
    let client = PdfToHtml::with_runner(&runner).unwrap();
    runner.push(writes_output("xml", "<pdf2xml><page></pdf2xml>"));

    let err = client
        .xml(Path::new("doc.pdf"), &HtmlOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Xml(_)));
    assert!(!scratch_dir_of(&runner.last_call()).exists());
}

#[test]
fn test_pdftotext_encodings() {
    let runner = ScriptedRunner::default()
        .then_version("pdftotext", "24.11.0")
        .then(|_| {
            Ok(CommandOutput::new(
                "Available encodings are:\nUTF-8\nLatin1\nASCII7\n",
                "",
            ))
        });
    let client = PdfToText::with_runner(&runner).unwrap();
    assert_eq!(client.encodings().unwrap(), vec!["UTF-8", "Latin1", "ASCII7"]);
    assert_eq!(runner.last_call(), vec!["pdftotext", "-listenc"]);

    runner.push(|_| Ok(CommandOutput::default()));
    assert!(matches!(
        client.encodings(),
        Err(Error::MalformedOutput(_))
    ));
}

#[test]
fn test_pdftotext_writes_to_stdout() {
    let runner = ScriptedRunner::default()
        .then_version("pdftotext", "24.11.0")
        .then(|_| Ok(CommandOutput::new("Hello\n", "")));
    let client = PdfToText::with_runner(&runner).unwrap();

    let options = TextOptions {
        layout: true,
        ..Default::default()
    };
    let text = client.text(Path::new("doc.pdf"), &options).unwrap();
    assert_eq!(text.as_deref(), Some("Hello\n"));
    assert_eq!(
        runner.last_call(),
        vec!["pdftotext", "-layout", "doc.pdf", "-"]
    );

    runner.push(|_| Ok(CommandOutput::new("", "")));
    assert_eq!(client.text(Path::new("doc.pdf"), &options).unwrap(), None);
}
