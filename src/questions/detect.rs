use std::fmt;
use std::io::Cursor;

use zip::ZipArchive;

use super::QuestionsError;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const NUL_SCAN_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    NulByte,
    ZipArchive,
    ExcelWorkbook,
    WordDocument,
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NulByte => "null bytes found",
            Self::ZipArchive => "ZIP archive",
            Self::ExcelWorkbook => "Excel workbook",
            Self::WordDocument => "Word document",
        };
        f.write_str(label)
    }
}

/// Rejects input that is binary data pasted or uploaded as text.
pub fn ensure_text(raw: &str) -> Result<(), QuestionsError> {
    if raw.as_bytes().starts_with(ZIP_SIGNATURE) {
        return Err(QuestionsError::BinaryData {
            kind: classify_zip(raw.as_bytes()),
        });
    }
    if raw.chars().take(NUL_SCAN_CHARS).any(|c| c == '\0') {
        return Err(QuestionsError::BinaryData {
            kind: BinaryKind::NulByte,
        });
    }
    Ok(())
}

fn classify_zip(bytes: &[u8]) -> BinaryKind {
    let Ok(archive) = ZipArchive::new(Cursor::new(bytes)) else {
        return BinaryKind::ZipArchive;
    };
    for name in archive.file_names() {
        if name.starts_with("xl/") {
            return BinaryKind::ExcelWorkbook;
        }
        if name.starts_with("word/") {
            return BinaryKind::WordDocument;
        }
    }
    BinaryKind::ZipArchive
}
