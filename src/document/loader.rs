use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

use super::Document;
use crate::error::AutofillError;

/// Reads every supported file in a directory into page-level documents.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the corpus in file-name order.
    ///
    /// A missing or unreadable directory is fatal. A single file that fails to
    /// parse is logged and skipped.
    pub async fn load(&self) -> Result<Vec<Document>, AutofillError> {
        let unavailable = |source| AutofillError::CorpusUnavailable {
            path: self.dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.is_file() && is_supported(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            match read_pages(&path).await {
                Ok(pages) => documents.extend(into_documents(pages, &path)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        info!(
            "Loaded {} pages from {}",
            documents.len(),
            self.dir.display()
        );
        Ok(documents)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn is_supported(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("pdf" | "txt" | "md"))
}

/// The text of each page, in page order.
async fn read_pages(path: &Path) -> anyhow::Result<Vec<String>> {
    if extension(path).as_deref() == Some("pdf") {
        let owned = path.to_path_buf();
        // pdf-extract is synchronous and CPU bound
        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
            .await?
            .map_err(|e| anyhow::anyhow!("Failed to parse PDF: {}", e))?;
        Ok(pages)
    } else {
        let text = fs::read_to_string(path).await?;
        Ok(split_form_feeds(&text))
    }
}

/// Plain-text pages are separated by form feeds; text without any is one page.
fn split_form_feeds(text: &str) -> Vec<String> {
    text.split('\u{c}').map(str::to_string).collect()
}

/// Blank pages are dropped but still count towards the page number.
fn into_documents(pages: Vec<String>, source: &Path) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Document {
            text: page.trim().to_string(),
            source: source.to_path_buf(),
            page: i + 1,
        })
        .collect()
}
