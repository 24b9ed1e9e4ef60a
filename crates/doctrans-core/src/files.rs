//! Upload hygiene for incoming documents.
//!
//! The service translates PDFs; anything else is rejected before it is
//! written to disk. Stored names embed the client-supplied filename, so the
//! name is sanitized first.

use crate::defaults::FILENAME_MAX_LENGTH;

/// PDF files start with `%PDF-`.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Result of upload validation.
#[derive(Debug, Clone)]
pub struct UploadCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl UploadCheck {
    fn allowed() -> Self {
        UploadCheck {
            allowed: true,
            reason: None,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        UploadCheck {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Validate an uploaded document: size cap, `.pdf` extension and PDF magic
/// bytes. The extension alone is never trusted.
pub fn validate_upload(filename: &str, data: &[u8], max_size_bytes: u64) -> UploadCheck {
    if data.len() as u64 > max_size_bytes {
        return UploadCheck::blocked(format!(
            "File exceeds maximum size of {max_size_bytes} bytes"
        ));
    }

    let has_pdf_extension = filename
        .rsplit('.')
        .next()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !has_pdf_extension {
        return UploadCheck::blocked("Only PDF files are supported");
    }

    if data.len() < PDF_MAGIC.len() || &data[..PDF_MAGIC.len()] != PDF_MAGIC {
        return UploadCheck::blocked("File content is not a PDF");
    }

    UploadCheck::allowed()
}

/// Sanitize a client-supplied filename for safe storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    // Replace dangerous characters
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed.pdf".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > FILENAME_MAX_LENGTH {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < FILENAME_MAX_LENGTH {
                let stem = truncate_to_boundary(sanitized, FILENAME_MAX_LENGTH - ext.len());
                return format!("{stem}{ext}");
            }
        }
        return truncate_to_boundary(sanitized, FILENAME_MAX_LENGTH).to_string();
    }

    sanitized.to_string()
}

/// Byte-bounded truncation that never splits a UTF-8 character.
fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pdf() {
        let check = validate_upload("paper.pdf", b"%PDF-1.7 content", 1024);
        assert!(check.allowed);
        assert!(check.reason.is_none());
    }

    #[test]
    fn test_rejects_non_pdf_extension() {
        let check = validate_upload("paper.docx", b"%PDF-1.7", 1024);
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("Only PDF"));
    }

    #[test]
    fn test_rejects_garbage_with_pdf_extension() {
        let check = validate_upload("paper.pdf", b"not a pdf at all", 1024);
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("not a PDF"));
    }

    #[test]
    fn test_rejects_oversized() {
        let data = vec![b'A'; 101];
        let check = validate_upload("paper.pdf", &data, 100);
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("exceeds maximum size"));
    }

    #[test]
    fn test_size_boundary_is_inclusive() {
        let mut data = b"%PDF-".to_vec();
        data.resize(100, 0);
        assert!(validate_upload("paper.pdf", &data, 100).allowed);
        data.push(0);
        assert!(!validate_upload("paper.pdf", &data, 100).allowed);
    }

    #[test]
    fn test_sanitize_removes_path() {
        assert_eq!(sanitize_filename("/etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("..\\..\\paper.pdf"), "paper.pdf");
    }

    #[test]
    fn test_sanitize_removes_dangerous_chars() {
        assert_eq!(sanitize_filename("file<>:test.pdf"), "file___test.pdf");
        assert_eq!(sanitize_filename("file|name?.pdf"), "file_name_.pdf");
    }

    #[test]
    fn test_sanitize_handles_empty() {
        assert_eq!(sanitize_filename(""), "unnamed.pdf");
        assert_eq!(sanitize_filename("   "), "unnamed.pdf");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long_name = format!("{}.pdf", "a".repeat(300));
        let sanitized = sanitize_filename(&long_name);
        assert!(sanitized.len() <= FILENAME_MAX_LENGTH);
        assert!(sanitized.ends_with(".pdf"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long_name = format!("{}.pdf", "ß".repeat(200));
        let sanitized = sanitize_filename(&long_name);
        assert!(sanitized.len() <= FILENAME_MAX_LENGTH);
        assert!(sanitized.ends_with(".pdf"));
    }
}
