//! Per-format text extraction for source documents.
//!
//! Extraction is the first stage of the indexing pipeline: given a file path it returns the
//! document's plain text together with a page count. PDF text is read with `pdf-extract`,
//! DOCX documents are unpacked as OOXML archives (`zip` + `quick-xml`), and plain-text files
//! are read as UTF-8. Unknown extensions are rejected up front so callers can surface them
//! differently from transport failures.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised while extracting text from a source document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Source file does not exist at the supplied path.
    #[error("File not found: {0}")]
    NotFound(String),
    /// File extension is not one of the supported formats.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// Extraction itself failed for a recognized format.
    #[error("Failed to extract {format} text: {message}")]
    Failed {
        /// Format that was being extracted.
        format: &'static str,
        /// Underlying failure description.
        message: String,
    },
}

/// Extracted document text plus basic shape information.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Full plain text of the document.
    pub text: String,
    /// Number of pages (or logical units) the source document contains.
    pub page_count: usize,
}

/// Interface implemented by document text extractors.
pub trait TextExtractor: Send + Sync {
    /// Extract the plain text and page count for the document at `path`.
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractionError>;
}

/// Extractor dispatching on file extension: `.pdf`, `.docx`, and `.txt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl FileExtractor {
    /// Construct a new extractor instance.
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => extract_pdf(path),
            "docx" => extract_docx(path),
            "txt" => extract_txt(path),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

fn extract_pdf(path: &Path) -> Result<Extraction, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|err| ExtractionError::Failed {
        format: "pdf",
        message: err.to_string(),
    })?;
    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|err| ExtractionError::Failed {
        format: "pdf",
        message: err.to_string(),
    })?;
    // Extracted pages are separated by form feeds.
    let page_count = text.split('\u{c}').count();
    tracing::debug!(path = %path.display(), page_count, "Extracted PDF text");
    Ok(Extraction { text, page_count })
}

/// Cap on the decompressed size of `word/document.xml` to guard against zip bombs.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

fn extract_docx(path: &Path) -> Result<Extraction, ExtractionError> {
    let file = std::fs::File::open(path).map_err(|err| ExtractionError::Failed {
        format: "docx",
        message: err.to_string(),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|err| ExtractionError::Failed {
        format: "docx",
        message: err.to_string(),
    })?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|err| ExtractionError::Failed {
                format: "docx",
                message: err.to_string(),
            })?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|err| ExtractionError::Failed {
                format: "docx",
                message: err.to_string(),
            })?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(ExtractionError::Failed {
                format: "docx",
                message: "word/document.xml exceeds size limit".to_string(),
            });
        }
    }

    let text = collect_docx_text(&doc_xml)?;
    tracing::debug!(path = %path.display(), "Extracted DOCX text");
    // DOCX carries no page concept; treat the document as a single page.
    Ok(Extraction {
        text,
        page_count: 1,
    })
}

fn collect_docx_text(xml: &[u8]) -> Result<String, ExtractionError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(element)) => {
                let name = element.local_name();
                if name.as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(text)) =
                        reader.read_event_into(&mut buf)
                    {
                        out.push_str(text.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(element)) => {
                // Paragraph boundaries become line breaks so words never glue together.
                if element.local_name().as_ref() == b"p" && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => {
                return Err(ExtractionError::Failed {
                    format: "docx",
                    message: err.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn extract_txt(path: &Path) -> Result<Extraction, ExtractionError> {
    let text = std::fs::read_to_string(path).map_err(|err| ExtractionError::Failed {
        format: "txt",
        message: err.to_string(),
    })?;
    Ok(Extraction {
        text,
        page_count: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let error = FileExtractor::new()
            .extract(Path::new("/definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(error, ExtractionError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.xyz");
        std::fs::write(&path, b"payload").expect("write");

        let error = FileExtractor::new().extract(&path).unwrap_err();
        match error {
            ExtractionError::UnsupportedFormat(extension) => assert_eq!(extension, ".xyz"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn plain_text_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(file, "alpha beta gamma").expect("write");

        let extraction = FileExtractor::new().extract(&path).expect("extract");
        assert_eq!(extraction.text, "alpha beta gamma");
        assert_eq!(extraction.page_count, 1);
    }

    #[test]
    fn corrupt_docx_surfaces_extraction_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").expect("write");

        let error = FileExtractor::new().extract(&path).unwrap_err();
        assert!(matches!(error, ExtractionError::Failed { format: "docx", .. }));
    }

    #[test]
    fn docx_text_collects_runs_and_breaks_paragraphs() {
        let xml = br#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;

        let text = collect_docx_text(xml).expect("collect");
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
        assert!(text.contains('\n'));
    }
}
