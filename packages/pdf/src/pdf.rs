//! PDF-backed line source.
//!
//! Document identifiers are file paths. The document is loaded once and
//! each page is rendered separately through [`pdf_extract::output_doc_page`],
//! so a page that fails (or makes the extractor panic on a broken font or
//! content stream) becomes an `Err` page while the rest of the document
//! survives. Page text is split into lines with [`crate::lines_from_text`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use pdf_extract::{Document, OutputError, PlainTextOutput, output_doc_page};

use crate::{LineSource, LineSourceError, PageLines, SourceDocument, lines_from_text, open_error};

/// Reads pendency reports from PDF files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLineSource;

impl PdfLineSource {
    /// Creates a new `PdfLineSource`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extracts per-page lines from in-memory PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LineSourceError::Extraction`] if the bytes are not a PDF or
    /// the document cannot be decrypted. Failures confined to one page are
    /// reported in that page's slot instead.
    pub fn pages_from_bytes(bytes: &[u8]) -> Result<Vec<PageLines>, LineSourceError> {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| LineSourceError::Extraction(format!("failed to load PDF: {e}")))?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| {
                LineSourceError::Extraction(format!("failed to decrypt PDF: {e}"))
            })?;
        }

        Ok(doc
            .get_pages()
            .into_keys()
            .map(|page_num| extract_page(&doc, page_num))
            .collect())
    }
}

fn render_page(doc: &Document, page_num: u32) -> Result<String, OutputError> {
    let mut text = String::new();
    {
        let mut output = PlainTextOutput::new(&mut text);
        output_doc_page(doc, &mut output, page_num)?;
    }
    Ok(text)
}

fn extract_page(doc: &Document, page_num: u32) -> PageLines {
    match catch_unwind(AssertUnwindSafe(|| render_page(doc, page_num))) {
        Ok(Ok(text)) => Ok(lines_from_text(&text)),
        Ok(Err(e)) => {
            log::debug!("Failed to extract text from page {page_num}: {e}");
            Err(LineSourceError::Extraction(format!("page {page_num}: {e}")))
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_owned());
            log::warn!("PDF extractor panicked on page {page_num}: {reason}");
            Err(LineSourceError::Extraction(format!(
                "page {page_num}: extractor panicked: {reason}"
            )))
        }
    }
}

impl LineSource for PdfLineSource {
    fn open(&self, document: &str) -> Result<SourceDocument, LineSourceError> {
        let bytes = std::fs::read(Path::new(document)).map_err(|e| open_error(document, e))?;

        log::debug!("Read {} bytes from {document}", bytes.len());

        let pages = Self::pages_from_bytes(&bytes)?;

        log::debug!(
            "Extracted {} page(s) of text from {document} ({} failed)",
            pages.len(),
            pages.iter().filter(|page| page.is_err()).count()
        );

        Ok(SourceDocument {
            id: document.to_owned(),
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assembles a PDF from object bodies, numbering them from 1 and
    /// writing a matching cross-reference table.
    fn build_pdf(objects: &[String]) -> Vec<u8> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (idx, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", idx + 1).as_bytes());
        }
        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }

    fn stream(content: &str) -> String {
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len())
    }

    fn page(resources: &str, contents: u32) -> String {
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources {resources} /Contents {contents} 0 R >>"
        )
    }

    fn report_with_broken_second_page() -> Vec<u8> {
        build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>".to_owned(),
            page("<< /Font << /F1 5 0 R >> >>", 6),
            page("<< >>", 7),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_owned(),
            stream("BT /F1 12 Tf 72 720 Td (GROUP_ID: 101) Tj ET"),
            stream("BT /F9 12 Tf 72 700 Td (TASK_ID:10101) Tj ET"),
        ])
    }

    #[test]
    fn missing_pdf_is_not_found() {
        let path = std::env::temp_dir().join("epf_pdf_definitely_missing_report.pdf");
        let result = PdfLineSource::new().open(&path.to_string_lossy());
        assert!(matches!(result, Err(LineSourceError::NotFound { .. })));
    }

    #[test]
    fn garbage_bytes_fail_extraction() {
        let result = PdfLineSource::pages_from_bytes(b"this is not a pdf");
        assert!(matches!(result, Err(LineSourceError::Extraction(_))));
    }

    #[test]
    fn broken_page_fails_alone() {
        let pages = PdfLineSource::pages_from_bytes(&report_with_broken_second_page()).unwrap();
        assert_eq!(pages.len(), 2);

        let first = pages[0].as_ref().unwrap();
        assert!(first.iter().any(|line| line == "GROUP_ID: 101"));

        assert!(matches!(pages[1], Err(LineSourceError::Extraction(_))));
    }

    #[test]
    fn broken_page_is_kept_in_opened_document() {
        let path = std::env::temp_dir().join(format!(
            "epf_pdf_broken_second_page_{}.pdf",
            std::process::id()
        ));
        std::fs::write(&path, report_with_broken_second_page()).unwrap();

        let document = PdfLineSource::new().open(&path.to_string_lossy());
        std::fs::remove_file(&path).unwrap();

        let document = document.unwrap();
        assert_eq!(document.page_count(), 2);
        assert!(document.pages[0].is_ok());
        assert!(document.pages[1].is_err());
    }
}
