//! PDF loading: extract per-page text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations, preventing the
//! Tokio worker threads from stalling on large documents.
//!
//! ## Text, not pixels
//!
//! Born-digital business documents carry a reliable text layer, and the
//! classifier and extractor both consume text; extracting it directly is
//! orders of magnitude cheaper than rasterising pages for a vision model.
//! A page with no extractable text (a pure scan) yields an empty string —
//! never a missing page — so page numbering stays aligned with the
//! document.

use crate::error::DocPipeError;
use pdfium_render::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// One page of extracted text. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: usize,
    pub text: String,
}

/// Extract the text of every page of a PDF, in document order.
pub async fn load_pages(path: &Path, password: Option<&str>) -> Result<Vec<Page>, DocPipeError> {
    validate_pdf_file(path)?;

    let path_buf = path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || load_pages_blocking(&path_buf, pwd.as_deref()))
        .await
        .map_err(|e| DocPipeError::Internal(format!("load task panicked: {e}")))?
}

/// Cheap pre-flight: existence, readability, and the `%PDF` magic bytes.
/// Catching a mislabeled file here gives a precise error instead of a
/// pdfium parse failure.
fn validate_pdf_file(path: &Path) -> Result<(), DocPipeError> {
    if !path.exists() {
        return Err(DocPipeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(DocPipeError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(DocPipeError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(DocPipeError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Blocking implementation of page-text extraction.
fn load_pages_blocking(pdf_path: &Path, password: Option<&str>) -> Result<Vec<Page>, DocPipeError> {
    let pdfium = Pdfium::default();

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DocPipeError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DocPipeError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DocPipeError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pdf_pages = document.pages();
    info!("PDF loaded: {} pages", pdf_pages.len());

    let mut pages = Vec::with_capacity(pdf_pages.len() as usize);
    for (index, page) in pdf_pages.iter().enumerate() {
        let text = page.text().map(|t| t.all()).unwrap_or_default();
        if text.is_empty() {
            debug!("page {} has no extractable text", index + 1);
        }
        pages.push(Page {
            number: index + 1,
            text,
        });
    }

    Ok(pages)
}
