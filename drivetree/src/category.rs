use std::path::Path;

use serde::{Deserialize, Serialize};

const GOOGLE_DOCUMENT: &str = "application/vnd.google-apps.document";
const GOOGLE_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
const GOOGLE_PRESENTATION: &str = "application/vnd.google-apps.presentation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Spreadsheet,
    Pdf,
    Presentation,
    Image,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Spreadsheet => "spreadsheet",
            Category::Pdf => "pdf",
            Category::Presentation => "presentation",
            Category::Image => "image",
            Category::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Category::Document),
            "spreadsheet" => Some(Category::Spreadsheet),
            "pdf" => Some(Category::Pdf),
            "presentation" => Some(Category::Presentation),
            "image" => Some(Category::Image),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

/// Classifies a file by its extension, ignoring case.
pub fn classify(filename: &str) -> Category {
    let Some(ext) = extension(filename) else {
        return Category::Other;
    };
    match ext.as_str() {
        "doc" | "docx" | "odt" | "txt" => Category::Document,
        "xls" | "xlsx" | "ods" | "csv" => Category::Spreadsheet,
        "pdf" => Category::Pdf,
        "ppt" | "pptx" => Category::Presentation,
        "jpg" | "jpeg" | "png" | "gif" | "webp" => Category::Image,
        _ => Category::Other,
    }
}

/// Native document type office files are converted into on upload.
pub fn native_mime_type(filename: &str) -> Option<&'static str> {
    match extension(filename)?.as_str() {
        "doc" | "docx" => Some(GOOGLE_DOCUMENT),
        "xls" | "xlsx" => Some(GOOGLE_SPREADSHEET),
        "ppt" | "pptx" => Some(GOOGLE_PRESENTATION),
        _ => None,
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        let cases = [
            ("notes.txt", Category::Document),
            ("letter.odt", Category::Document),
            ("budget.csv", Category::Spreadsheet),
            ("budget.xlsx", Category::Spreadsheet),
            ("report.pdf", Category::Pdf),
            ("deck.pptx", Category::Presentation),
            ("photo.jpeg", Category::Image),
            ("icon.webp", Category::Image),
        ];
        for (name, expected) in cases {
            assert_eq!(classify(name), expected, "{name}");
        }
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(classify("SCAN.PDF"), Category::Pdf);
        assert_eq!(classify("Image.PnG"), Category::Image);
    }

    #[test]
    fn unknown_or_missing_extension_is_other() {
        assert_eq!(classify("archive.zip"), Category::Other);
        assert_eq!(classify("Makefile"), Category::Other);
        assert_eq!(classify(".hidden"), Category::Other);
        assert_eq!(classify(""), Category::Other);
    }

    #[test]
    fn office_files_map_to_native_types() {
        assert_eq!(native_mime_type("a.DOCX"), Some(GOOGLE_DOCUMENT));
        assert_eq!(native_mime_type("a.xls"), Some(GOOGLE_SPREADSHEET));
        assert_eq!(native_mime_type("a.ppt"), Some(GOOGLE_PRESENTATION));
        assert_eq!(native_mime_type("a.pdf"), None);
        assert_eq!(native_mime_type("a.odt"), None);
    }

    #[test]
    fn storage_names_parse_back() {
        for category in [
            Category::Document,
            Category::Spreadsheet,
            Category::Pdf,
            Category::Presentation,
            Category::Image,
            Category::Other,
        ] {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("video"), None);
    }
}
