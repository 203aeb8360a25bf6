//! Document Metadata - Per-Page Fan-Out
//!
//! The edition build emits `document_metadata.json` (sometimes wrapped as a
//! `.js` assignment). Each document lists its pages, each page its
//! transcripts, each transcript its facsimile image ids. Resolution works on
//! one image at a time, so the nested structure is flattened into one
//! `PageRecord` per image.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read document metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// One facsimile image of one page, joined with its document's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// Holding archive's id, the key into the rule store.
    pub repo: String,
    pub sigil: String,
    pub base: String,
    /// 1-based page number within the document.
    pub page: u32,
    /// Base path of the image family, relative to the image root.
    pub img: String,
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    metadata: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    sigil: String,
    sigils: SigilSet,
    base: String,
    #[serde(default)]
    page: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct SigilSet {
    repository: String,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    doc: Vec<Option<Transcript>>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    #[serde(default)]
    img: Vec<String>,
}

/// Load the metadata file and flatten it to one record per image.
pub fn load_pages(path: &Path) -> Result<Vec<PageRecord>, MetadataError> {
    let text = fs::read_to_string(path)?;
    let json = strip_js_wrapper(path, &text);
    parse_pages(json)
}

/// Flatten metadata JSON text to page records.
pub fn parse_pages(json: &str) -> Result<Vec<PageRecord>, MetadataError> {
    let file: MetadataFile = serde_json::from_str(json)?;
    let mut records = Vec::new();

    for document in &file.metadata {
        let base = strip_first_component(&document.base);
        for (index, page) in document.page.iter().enumerate() {
            let page_number = index as u32 + 1;
            if page.doc.len() > 1 {
                warn!(
                    sigil = document.sigil,
                    page = page_number,
                    transcripts = page.doc.len(),
                    "Page has multiple transcripts, using the first"
                );
            }
            let Some(Some(transcript)) = page.doc.first() else {
                continue;
            };
            for img in &transcript.img {
                records.push(PageRecord {
                    repo: document.sigils.repository.clone(),
                    sigil: document.sigil.clone(),
                    base: base.clone(),
                    page: page_number,
                    img: img.clone(),
                });
            }
        }
    }

    Ok(records)
}

/// A `.js` metadata file is the JSON document prefixed with a variable
/// assignment; everything up to the first `=` goes.
fn strip_js_wrapper<'a>(path: &Path, text: &'a str) -> &'a str {
    if path.extension().is_some_and(|ext| ext == "js") {
        match text.find('=') {
            Some(pos) => &text[pos + 1..],
            None => text,
        }
    } else {
        text
    }
}

fn strip_first_component(base: &str) -> String {
    let stripped: PathBuf = Path::new(base).components().skip(1).collect();
    stripped.to_string_lossy().into_owned()
}
