//! Text extraction from uploaded documents.
//!
//! Extraction is best effort: a document that cannot be parsed in its declared
//! format is decoded as lossy UTF-8 instead of failing the upload.

use quick_xml::events::Event;
use quick_xml::Reader;
use ragdesk_core::{AppError, AppResult};
use std::io::Read;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Docx,
    Markdown,
    Html,
    PlainText,
}

impl ContentType {
    /// Detect content type from the file name's extension (case-insensitive).
    pub fn from_name(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            _ => Self::PlainText,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
        }
    }
}

/// Extract plain text from raw document bytes.
///
/// Never fails: parse errors are logged and the raw bytes are decoded as
/// lossy UTF-8. The result may be empty or whitespace-only; callers decide
/// whether that is acceptable.
pub fn extract_text(bytes: &[u8], file_name: &str) -> String {
    let content_type = ContentType::from_name(file_name);

    tracing::debug!(
        "Extracting {} bytes from {} as {}",
        bytes.len(),
        file_name,
        content_type.as_str()
    );

    match content_type {
        ContentType::Pdf => extract_pdf(bytes).unwrap_or_else(|e| {
            tracing::warn!("PDF parse failed for {}, falling back to raw: {}", file_name, e);
            lossy_text(bytes)
        }),
        ContentType::Docx => extract_docx(bytes).unwrap_or_else(|e| {
            tracing::warn!("DOCX parse failed for {}, falling back to raw: {}", file_name, e);
            lossy_text(bytes)
        }),
        ContentType::Markdown => clean_markdown(&lossy_text(bytes)),
        ContentType::Html => clean_html(&lossy_text(bytes)),
        ContentType::PlainText => lossy_text(bytes),
    }
}

fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Text of every page, in page order.
fn extract_pdf(bytes: &[u8]) -> AppResult<String> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| AppError::Other(format!("Failed to load PDF: {}", e)))?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }

    document
        .extract_text(&pages)
        .map_err(|e| AppError::Other(format!("Failed to extract PDF text: {}", e)))
}

/// Text runs of `word/document.xml`, one line per paragraph.
fn extract_docx(bytes: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| AppError::Other(format!("Failed to open DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| AppError::Other(format!("DOCX has no document part: {}", e)))?
        .read_to_string(&mut xml)?;

    docx_xml_to_text(&xml)
}

fn docx_xml_to_text(xml: &str) -> AppResult<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let run = e
                    .unescape()
                    .map_err(|e| AppError::Other(format!("Invalid DOCX text run: {}", e)))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::Other(format!("DOCX XML parse error: {}", e)));
            }
            _ => {}
        }
    }

    Ok(text.trim().to_string())
}

/// Clean markdown by removing header markers, fences and rules.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags and the bodies of script/style elements.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;

            let rest = text[i..].chars().take(8).collect::<String>().to_ascii_lowercase();
            if rest.starts_with("<script") {
                in_script = true;
            } else if rest.starts_with("</script") {
                in_script = false;
            } else if rest.starts_with("<style") {
                in_style = true;
            } else if rest.starts_with("</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            // Keep words on either side of a tag apart
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
