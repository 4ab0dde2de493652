//! Document-to-text conversion for uploaded resumes.
//!
//! The analysis core only ever sees plain text. Converters sit behind the
//! [`TextExtractor`] trait and are picked by [`DocumentFormat`].

use std::io::{Cursor, Read};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// Format from the upload's file extension, falling back to its content type.
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Result<Self, ExtractionError> {
        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => return Ok(DocumentFormat::Pdf),
            Some("docx") => return Ok(DocumentFormat::Docx),
            Some("txt") | Some("text") | Some("md") => return Ok(DocumentFormat::PlainText),
            _ => {}
        }

        match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
            Some("application/pdf") => Ok(DocumentFormat::Pdf),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                Ok(DocumentFormat::Docx)
            }
            Some(ct) if ct.starts_with("text/") => Ok(DocumentFormat::PlainText),
            other => Err(ExtractionError::UnsupportedFormat(
                extension
                    .or_else(|| other.map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }
}

/// Plain text plus the format it was converted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub text: String,
    pub format: DocumentFormat,
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn supports(&self, format: DocumentFormat) -> bool;

    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError>;
}

/// PDF text via `pdf-extract`. Parsing is CPU-bound and runs on the blocking pool.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pdf
    }

    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ExtractionError::CorruptDocument(format!("PDF parser aborted: {e}")))?
        .map_err(ExtractionError::CorruptDocument)
    }
}

/// Path of the main body part inside a DOCX package.
const DOCX_BODY: &str = "word/document.xml";

/// DOCX text: one line per `w:p` paragraph of the main document part. Tabs and line
/// breaks inside a paragraph are kept; headers, footers and comments are not read.
pub struct DocxTextExtractor;

#[async_trait]
impl TextExtractor for DocxTextExtractor {
    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Docx
    }

    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        tokio::task::spawn_blocking(move || docx_text(&bytes))
            .await
            .map_err(|e| ExtractionError::CorruptDocument(format!("DOCX parser aborted: {e}")))?
    }
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(corrupt_docx)?;
    let mut body = archive.by_name(DOCX_BODY).map_err(corrupt_docx)?;
    let mut xml = String::new();
    body.read_to_string(&mut xml).map_err(corrupt_docx)?;

    document_paragraphs(&xml).map_err(corrupt_docx)
}

fn corrupt_docx(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::CorruptDocument(format!("DOCX: {e}"))
}

/// Flattens WordprocessingML into newline-separated paragraphs.
fn document_paragraphs(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::PlainText
    }

    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractionError::CorruptDocument(format!("text is not valid UTF-8: {e}")))
    }
}

/// Ordered set of converters; the first one supporting a format handles it.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new(extractors: Vec<Arc<dyn TextExtractor>>) -> Self {
        Self { extractors }
    }

    pub async fn extract(&self, bytes: Bytes, format: DocumentFormat) -> Result<RawDocument, ExtractionError> {
        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports(format))
            .ok_or_else(|| {
                ExtractionError::UnsupportedFormat(format!("no converter for {format:?}"))
            })?;

        let size = bytes.len();
        let text = extractor.extract(bytes).await?;
        debug!(?format, bytes = size, chars = text.len(), "Document converted to text");

        Ok(RawDocument { text, format })
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(PdfTextExtractor),
            Arc::new(DocxTextExtractor),
            Arc::new(PlainTextExtractor),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension_then_content_type() {
        assert_eq!(
            DocumentFormat::detect(Some("CV.PDF"), None).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect(Some("resume"), Some("text/plain; charset=utf-8")).unwrap(),
            DocumentFormat::PlainText
        );
        assert_eq!(
            DocumentFormat::detect(Some("resume.docx"), Some("application/pdf")).unwrap(),
            DocumentFormat::Docx
        );
        assert!(matches!(
            DocumentFormat::detect(Some("photo.png"), Some("image/png")),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_plain_text_round_trip() {
        let registry = ExtractorRegistry::default();
        let doc = registry
            .extract(Bytes::from_static(b"Jane Roe\nSkills: Rust"), DocumentFormat::PlainText)
            .await
            .unwrap();
        assert_eq!(doc.text, "Jane Roe\nSkills: Rust");
        assert_eq!(doc.format, DocumentFormat::PlainText);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupt() {
        let result = PlainTextExtractor
            .extract(Bytes::from_static(&[0xff, 0xfe, 0x00]))
            .await;
        assert!(matches!(result, Err(ExtractionError::CorruptDocument(_))));
    }

    fn docx(document_xml: &str) -> Bytes {
        use std::io::Write;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCX_BODY, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    #[tokio::test]
    async fn test_docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Roe</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Skills: </w:t></w:r><w:r><w:t>Rust &amp; SQL</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Jan 2020</w:t><w:tab/><w:t>Dec 2022</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let doc = ExtractorRegistry::default()
            .extract(docx(xml), DocumentFormat::Docx)
            .await
            .unwrap();
        assert_eq!(doc.text, "Jane Roe\nSkills: Rust & SQL\n\nJan 2020\tDec 2022");
        assert_eq!(doc.format, DocumentFormat::Docx);
    }

    #[tokio::test]
    async fn test_docx_without_body_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::FileOptions::default())
            .unwrap();
        let bytes = Bytes::from(writer.finish().unwrap().into_inner());

        let result = DocxTextExtractor.extract(bytes).await;
        assert!(matches!(result, Err(ExtractionError::CorruptDocument(_))));
    }

    #[tokio::test]
    async fn test_non_zip_docx_is_corrupt() {
        let result = DocxTextExtractor
            .extract(Bytes::from_static(b"PK\x03\x04 truncated"))
            .await;
        assert!(matches!(result, Err(ExtractionError::CorruptDocument(_))));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_corrupt() {
        let result = PdfTextExtractor
            .extract(Bytes::from_static(b"definitely not a pdf"))
            .await;
        assert!(matches!(result, Err(ExtractionError::CorruptDocument(_))));
    }
}
