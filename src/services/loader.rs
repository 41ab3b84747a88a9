//! PDF document loading.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::LoadError;
use crate::models::Document;

/// Extracts the text of every page of a file, in page order.
pub trait PageExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError>;
}

/// Page extractor backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError> {
        let bytes = std::fs::read(path)?;
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| LoadError::ExtractError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// List the PDF files directly inside `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .follow_links(true)
    {
        let entry = entry.map_err(|e| LoadError::WalkError(e.to_string()))?;
        let path = entry.path();

        if path.is_file() && is_pdf(path) {
            files.push(path.to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(LoadError::NoDocuments(dir.display().to_string()));
    }

    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Read every file with `extractor`, keeping file order.
pub fn read_documents(
    extractor: &dyn PageExtractor,
    paths: &[PathBuf],
) -> Result<Vec<Document>, LoadError> {
    paths
        .iter()
        .map(|path| {
            let document = Document::new(path.clone(), extractor.extract_pages(path)?);
            tracing::debug!(
                file = %document.file_name(),
                pages = document.pages.len(),
                "extracted document"
            );
            Ok::<_, LoadError>(document)
        })
        .collect()
}

/// Concatenate the text of all pages of all files, in file then page order.
pub fn load_pdf_text(
    extractor: &dyn PageExtractor,
    paths: &[PathBuf],
) -> Result<String, LoadError> {
    let documents = read_documents(extractor, paths)?;
    Ok(documents.iter().map(Document::text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeExtractor(HashMap<PathBuf, Vec<String>>);

    impl PageExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::ExtractError {
                    path: path.display().to_string(),
                    message: "unreadable".to_string(),
                })
        }
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_text_follows_file_then_page_order() {
        let cv = PathBuf::from("a_cv.pdf");
        let reference = PathBuf::from("b_reference.pdf");
        let extractor = FakeExtractor(HashMap::from([
            (cv.clone(), pages(&["CV page 1. ", "CV page 2. "])),
            (reference.clone(), pages(&["Reference page 1."])),
        ]));

        let text = load_pdf_text(&extractor, &[cv, reference]).unwrap();
        assert_eq!(text, "CV page 1. CV page 2. Reference page 1.");
    }

    #[test]
    fn test_extraction_failure_propagates() {
        let extractor = FakeExtractor(HashMap::new());
        let result = load_pdf_text(&extractor, &[PathBuf::from("broken.pdf")]);
        assert!(matches!(result, Err(LoadError::ExtractError { .. })));
    }

    #[test]
    fn test_list_documents_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), b"%PDF").unwrap();

        let files = list_documents(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_list_documents_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_documents(dir.path()),
            Err(LoadError::NoDocuments(_))
        ));
    }
}
