//! Decoder for `pdftohtml -xml` output.
//!
//! The envelope looks like:
//!
//! ```text
//! <pdf2xml producer="poppler" version="24.11.0">
//! <page number="1" position="absolute" top="0" left="0" height="1262" width="892">
//!     <fontspec id="0" size="8" family="ArialMT" color="#000000"/>
//!     <text top="471" left="106" width="188" height="19" font="0"><b>Test</b> mixed</text>
//! </page>
//! </pdf2xml>
//! ```
//!
//! A `<text>` element's character data becomes [`PositionedText::text`] and
//! the content of its `<b>` children becomes [`PositionedText::bold_text`].

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::table::{PositionedText, TableEntry, TableExtractionConfig, extract_table};

/// A whole converted document.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PdfXml {
    pub producer: Option<String>,
    pub version: Option<String>,
    pub pages: Vec<Page>,
}

impl PdfXml {
    /// Page by its 1-based `number` attribute.
    pub fn page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == Some(number))
    }
}

/// One converted page and the text fragments placed on it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Page {
    pub number: Option<u32>,
    pub position: Option<String>,
    pub top: Option<i32>,
    pub left: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub font_specs: Vec<FontSpec>,
    pub texts: Vec<PositionedText>,
}

impl Page {
    /// Reconstruct a table from this page's fragments.
    pub fn extract_table(&self, config: &TableExtractionConfig) -> Vec<TableEntry> {
        extract_table(&self.texts, config)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FontSpec {
    pub id: Option<u32>,
    pub size: Option<i32>,
    pub family: Option<String>,
    pub color: Option<String>,
}

/// Parse the XML written by `pdftohtml -xml`.
pub fn parse_pdf_xml(input: &str) -> Result<PdfXml> {
    let mut reader = Reader::from_str(input);
    let mut doc = PdfXml::default();
    let mut page: Option<Page> = None;
    let mut text: Option<TextBuilder> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"pdf2xml" => read_document_attrs(&e, &mut doc)?,
                b"page" => page = Some(read_page(&e)?),
                b"fontspec" => push_font_spec(&mut page, read_font_spec(&e)?)?,
                b"text" => text = Some(TextBuilder::open(&e)?),
                b"b" => {
                    if let Some(t) = text.as_mut() {
                        t.bold_depth += 1;
                        t.bold.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"pdf2xml" => read_document_attrs(&e, &mut doc)?,
                b"page" => doc.pages.push(read_page(&e)?),
                b"fontspec" => push_font_spec(&mut page, read_font_spec(&e)?)?,
                b"text" => push_text(&mut page, TextBuilder::open(&e)?.finish())?,
                b"b" => {
                    if let Some(t) = text.as_mut() {
                        t.bold.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some(t) = text.as_mut() {
                    t.append(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(t) = text.as_mut() {
                    t.append(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"b" => {
                    if let Some(t) = text.as_mut() {
                        t.bold_depth = t.bold_depth.saturating_sub(1);
                    }
                }
                b"text" => {
                    if let Some(t) = text.take() {
                        push_text(&mut page, t.finish())?;
                    }
                }
                b"page" => {
                    if let Some(p) = page.take() {
                        doc.pages.push(p);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if page.is_some() || text.is_some() {
        return Err(Error::MalformedOutput("unterminated page or text element".into()));
    }
    Ok(doc)
}

struct TextBuilder {
    fragment: PositionedText,
    bold: Option<String>,
    bold_depth: usize,
}

impl TextBuilder {
    fn open(e: &BytesStart<'_>) -> Result<Self> {
        let mut top = None;
        let mut left = None;
        let mut fragment = PositionedText::default();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"top" => top = Some(parse_coord("top", &value)?),
                b"left" => left = Some(parse_coord("left", &value)?),
                b"width" => fragment.width = parse_coord("width", &value)?,
                b"height" => fragment.height = parse_coord("height", &value)?,
                b"font" => fragment.font = Some(parse_number("font", &value)?),
                _ => {}
            }
        }
        fragment.top = top.ok_or_else(|| missing("text", "top"))?;
        fragment.left = left.ok_or_else(|| missing("text", "left"))?;
        Ok(Self {
            fragment,
            bold: None,
            bold_depth: 0,
        })
    }

    fn append(&mut self, s: &str) {
        match self.bold.as_mut() {
            Some(bold) if self.bold_depth > 0 => bold.push_str(s),
            _ => self.fragment.text.push_str(s),
        }
    }

    fn finish(mut self) -> PositionedText {
        self.fragment.bold_text = self.bold;
        self.fragment
    }
}

fn read_document_attrs(e: &BytesStart<'_>, doc: &mut PdfXml) -> Result<()> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"producer" => doc.producer = Some(attr.unescape_value()?.into_owned()),
            b"version" => doc.version = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(())
}

fn read_page(e: &BytesStart<'_>) -> Result<Page> {
    let mut page = Page::default();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"number" => page.number = Some(parse_number("number", &value)?),
            b"position" => page.position = Some(value.into_owned()),
            b"top" => page.top = Some(parse_coord("top", &value)?),
            b"left" => page.left = Some(parse_coord("left", &value)?),
            b"width" => page.width = Some(parse_coord("width", &value)?),
            b"height" => page.height = Some(parse_coord("height", &value)?),
            _ => {}
        }
    }
    Ok(page)
}

fn read_font_spec(e: &BytesStart<'_>) -> Result<FontSpec> {
    let mut spec = FontSpec::default();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"id" => spec.id = Some(parse_number("id", &value)?),
            b"size" => spec.size = Some(parse_coord("size", &value)?),
            b"family" => spec.family = Some(value.into_owned()),
            b"color" => spec.color = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(spec)
}

fn push_font_spec(page: &mut Option<Page>, spec: FontSpec) -> Result<()> {
    page.as_mut()
        .ok_or_else(|| Error::MalformedOutput("fontspec outside of page".into()))?
        .font_specs
        .push(spec);
    Ok(())
}

fn push_text(page: &mut Option<Page>, fragment: PositionedText) -> Result<()> {
    page.as_mut()
        .ok_or_else(|| Error::MalformedOutput("text outside of page".into()))?
        .texts
        .push(fragment);
    Ok(())
}

fn missing(element: &str, attr: &str) -> Error {
    Error::MalformedOutput(format!("<{element}> without {attr} attribute"))
}

/// Integer coordinate; `-noroundcoord` output is rounded to the nearest integer.
fn parse_coord(name: &str, value: &Cow<'_, str>) -> Result<i32> {
    let v = value.trim();
    if let Ok(n) = v.parse::<i32>() {
        return Ok(n);
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i32::MAX as f64 => Ok(f.round() as i32),
        _ => Err(Error::MalformedOutput(format!("{name}={v:?} is not a coordinate"))),
    }
}

fn parse_number(name: &str, value: &Cow<'_, str>) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::MalformedOutput(format!("{name}={value:?} is not a number")))
}
