//! Text extraction for uploaded files. PDFs go through `pdf-extract`;
//! plain text files are decoded as UTF-8. Everything else is rejected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(#[from] pdf_extract::OutputError),

    #[error("File is not valid UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Unsupported file type '{0}': only .pdf and .txt are accepted")]
    UnsupportedType(String),
}

/// Extracts plain text from a file based on its extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String, ExtractError> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        extract_pdf_text(bytes)
    } else if lower.ends_with(".txt") {
        Ok(String::from_utf8(bytes.to_vec())?)
    } else {
        Err(ExtractError::UnsupportedType(filename.to_string()))
    }
}

/// Extracts the text content of a PDF held in memory.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    Ok(pdf_extract::extract_text_from_mem(bytes)?)
}

/// Checks for the PDF magic prefix. Upload validation accepts a file when
/// either the declared content type or the leading bytes say PDF.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_is_decoded_as_utf8() {
        let text = extract_text("hello world".as_bytes(), "rubric.txt").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_txt_invalid_utf8_is_rejected() {
        let err = extract_text(&[0xff, 0xfe, 0x00], "rubric.txt").unwrap_err();
        assert!(matches!(err, ExtractError::Utf8(_)));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = extract_text(b"data", "cv.docx").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(_)));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let text = extract_text("ok".as_bytes(), "NOTES.TXT").unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_pdf_magic_detection() {
        assert!(has_pdf_magic(b"%PDF-1.7\n..."));
        assert!(!has_pdf_magic(b"PK\x03\x04"));
        assert!(!has_pdf_magic(b""));
    }
}
