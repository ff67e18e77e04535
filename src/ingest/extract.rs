//! Presentation text extraction.
//!
//! PPTX is read with zip + quick-xml: every `ppt/slides/slideN.xml` part in
//! slide order, collecting `<a:t>` runs. PDF goes through lopdf behind the
//! `tool-pdf` feature. Legacy binary `.ppt` is recognised but not readable.

use std::io::{Cursor, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{NarratorError, Result};

/// Maximum presentation size accepted before extraction (100 MB).
pub const MAX_PRESENTATION_BYTES: u64 = 100 * 1024 * 1024;

static SLIDE_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Presentation file formats the catalog recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationFormat {
    Pdf,
    Pptx,
    /// Legacy binary PowerPoint. Listed, never extracted.
    Ppt,
}

impl PresentationFormat {
    /// Recognise a format from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Lowercase extension without the dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
            Self::Ppt => "ppt",
        }
    }
}

impl std::fmt::Display for PresentationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text pulled out of a presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub text: String,
    /// Slides (PPTX) or pages (PDF) visited.
    pub units: usize,
}

/// Extract text from the presentation at `path`, dispatching on extension.
pub fn extract_text(path: &Path) -> Result<Extracted> {
    let format = PresentationFormat::from_path(path).ok_or_else(|| {
        NarratorError::UnsupportedFormat(
            path.extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(no extension)".to_string()),
        )
    })?;

    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_PRESENTATION_BYTES {
        return Err(NarratorError::Extraction(format!(
            "{} too large: {} bytes (max {}MB)",
            path.display(),
            meta.len(),
            MAX_PRESENTATION_BYTES / 1024 / 1024
        )));
    }

    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), %format, bytes = bytes.len(), "Extracting presentation text");
    extract_from_bytes(format, &bytes)
}

/// Extract text from in-memory presentation bytes of a known format.
pub fn extract_from_bytes(format: PresentationFormat, bytes: &[u8]) -> Result<Extracted> {
    match format {
        PresentationFormat::Pptx => extract_pptx(bytes),
        PresentationFormat::Pdf => extract_pdf(bytes),
        PresentationFormat::Ppt => Err(NarratorError::UnsupportedFormat(
            ".ppt (legacy binary PowerPoint; convert to .pptx)".to_string(),
        )),
    }
}

/// Extract slide text from PPTX bytes.
///
/// Slides are visited in numeric order (`slide2` before `slide10`). Within a
/// slide, `<a:t>` runs are appended as-is, `</a:p>` and `<a:br/>` insert a
/// newline. Each slide's text ends with a newline.
pub fn extract_pptx(bytes: &[u8]) -> Result<Extracted> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| NarratorError::Extraction(format!("Failed to open PPTX as ZIP: {e}")))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = SLIDE_PART_RE.captures(name)?;
            let number = caps[1].parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut output = String::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| NarratorError::Extraction(format!("{name} not found in PPTX: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| NarratorError::Extraction(format!("Failed to read {name}: {e}")))?;
        slide_text_into(&xml, &mut output)?;
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
    }

    Ok(Extracted {
        text: output,
        units: slides.len(),
    })
}

fn slide_text_into(xml: &str, output: &mut String) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut in_t = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_t = true;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"br" {
                    output.push('\n');
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"p" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_t {
                    let text = e
                        .unescape()
                        .map_err(|e| NarratorError::Extraction(format!("XML unescape error: {e}")))?;
                    output.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NarratorError::Extraction(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Extract page text from PDF bytes. Pages that fail individually are skipped.
#[cfg(feature = "tool-pdf")]
pub fn extract_pdf(bytes: &[u8]) -> Result<Extracted> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| NarratorError::Extraction(format!("Failed to parse PDF: {e}")))?;

    let pages = doc.get_pages();
    let mut text = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(content) => {
                text.push_str(&content);
                text.push('\n');
            }
            Err(e) => debug!(page = page_num, "Skipping unreadable PDF page: {}", e),
        }
    }

    Ok(Extracted {
        text,
        units: pages.len(),
    })
}

#[cfg(not(feature = "tool-pdf"))]
pub fn extract_pdf(_bytes: &[u8]) -> Result<Extracted> {
    Err(NarratorError::Extraction(
        "PDF support not compiled. Rebuild with: cargo build --features tool-pdf".to_string(),
    ))
}
