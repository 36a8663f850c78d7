//! Document ingestion.
//!
//! Turns a list of sources into calls to the RAG service's add-document operation.
//! URLs are forwarded as web pages; anything else is a local path that must exist
//! and is sent canonicalized, typed by its extension.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::rag::{DataType, RagError, RagService};

/// Reasons a single source could not be added.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A local source does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A local source exists but its absolute path cannot be resolved
    #[error("cannot resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service rejected the source
    #[error(transparent)]
    Service(#[from] RagError),
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    loaded: Vec<String>,
    failed: Vec<(String, String)>,
}

impl IngestReport {
    /// Sources the service accepted, in submission order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Sources that could not be added, with the reason.
    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Infers the service data type for a local file from its extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ragchat::ingest::infer_data_type;
/// use ragchat::rag::DataType;
///
/// assert_eq!(infer_data_type(Path::new("guide.PDF")), DataType::PdfFile);
/// assert_eq!(infer_data_type(Path::new("notes")), DataType::TextFile);
/// ```
pub fn infer_data_type(path: &Path) -> DataType {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => DataType::PdfFile,
        Some("docx") => DataType::Docx,
        Some("mdx") => DataType::Mdx,
        Some("csv") => DataType::Csv,
        Some("json") => DataType::Json,
        _ => DataType::TextFile,
    }
}

/// Returns true if the source should be fetched by the service as a web page.
pub fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves a source into the string sent to the service and its data type.
///
/// # Errors
///
/// Returns `IngestError::NotFound` if a local source does not exist and
/// `IngestError::Resolve` if it cannot be canonicalized.
pub fn resolve_source(source: &str) -> Result<(String, DataType), IngestError> {
    if is_url(source) {
        return Ok((source.to_string(), DataType::WebPage));
    }

    let path = Path::new(source);
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let canonical = path.canonicalize().map_err(|source| IngestError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;

    Ok((
        canonical.to_string_lossy().into_owned(),
        infer_data_type(&canonical),
    ))
}

/// Adds every source to the service, one call per source, in order.
///
/// Failures are recorded and do not stop the batch. Local sources that do not
/// exist are reported without calling the service.
pub fn ingest(service: &dyn RagService, sources: &[String]) -> IngestReport {
    let mut report = IngestReport::default();

    for source in sources {
        let result = resolve_source(source).and_then(|(resolved, data_type)| {
            service.add(&resolved, data_type)?;
            Ok(data_type)
        });

        match result {
            Ok(data_type) => {
                info!(%source, %data_type, "source added");
                report.loaded.push(source.clone());
            }
            Err(e) => {
                warn!(%source, error = %e, "failed to add source");
                report.failed.push((source.clone(), e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingService {
        added: Mutex<Vec<(String, DataType)>>,
        fail_on: Option<&'static str>,
    }

    impl RagService for RecordingService {
        fn query(&self, _question: &str) -> Result<String, RagError> {
            unreachable!("ingestion never queries")
        }

        fn add(&self, source: &str, data_type: DataType) -> Result<(), RagError> {
            self.added
                .lock()
                .unwrap()
                .push((source.to_string(), data_type));
            match self.fail_on {
                Some(needle) if source.contains(needle) => Err(RagError::Api {
                    message: "unsupported document".to_string(),
                }),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn infer_data_type_by_extension() {
        assert_eq!(infer_data_type(Path::new("a.pdf")), DataType::PdfFile);
        assert_eq!(infer_data_type(Path::new("a.docx")), DataType::Docx);
        assert_eq!(infer_data_type(Path::new("a.mdx")), DataType::Mdx);
        assert_eq!(infer_data_type(Path::new("a.CSV")), DataType::Csv);
        assert_eq!(infer_data_type(Path::new("a.json")), DataType::Json);
        assert_eq!(infer_data_type(Path::new("a.md")), DataType::TextFile);
        assert_eq!(infer_data_type(Path::new("Makefile")), DataType::TextFile);
    }

    #[test]
    fn urls_are_web_pages_without_filesystem_checks() {
        let (resolved, data_type) = resolve_source("HTTPS://example.com/faq").unwrap();
        assert_eq!(resolved, "HTTPS://example.com/faq");
        assert_eq!(data_type, DataType::WebPage);
        assert!(!is_url("ftp://example.com"));
    }

    #[test]
    fn resolve_source_canonicalizes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("handbook.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let (resolved, data_type) = resolve_source(file.to_str().unwrap()).unwrap();
        assert_eq!(Path::new(&resolved), file.canonicalize().unwrap());
        assert_eq!(data_type, DataType::PdfFile);
    }

    #[test]
    fn missing_files_are_reported_without_calling_service() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let service = RecordingService::default();

        let report = ingest(&service, &[missing.to_string_lossy().into_owned()]);

        assert!(!report.is_success());
        assert!(report.loaded().is_empty());
        assert!(report.failed()[0].1.contains("file not found"));
        assert!(service.added.lock().unwrap().is_empty());
    }

    #[test]
    fn resolve_source_reports_missing_file_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pdf");

        match resolve_source(missing.to_str().unwrap()) {
            Err(IngestError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn service_errors_keep_their_message() {
        let error = IngestError::from(RagError::Api {
            message: "unsupported document".to_string(),
        });
        assert!(matches!(error, IngestError::Service(_)));
        assert_eq!(
            error.to_string(),
            RagError::Api {
                message: "unsupported document".to_string()
            }
            .to_string()
        );
    }

    #[test]
    fn one_add_call_per_source_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.md");
        std::fs::write(&notes, "# Notes").unwrap();
        let service = RecordingService::default();

        let sources = vec![
            "https://example.com/a".to_string(),
            notes.to_string_lossy().into_owned(),
        ];
        let report = ingest(&service, &sources);

        assert!(report.is_success());
        assert_eq!(report.loaded(), sources.as_slice());

        let added = service.added.lock().unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0], ("https://example.com/a".to_string(), DataType::WebPage));
        assert_eq!(added[1].1, DataType::TextFile);
    }

    #[test]
    fn service_failures_do_not_stop_the_batch() {
        let service = RecordingService {
            fail_on: Some("bad"),
            ..Default::default()
        };
        let sources = vec![
            "https://example.com/bad".to_string(),
            "https://example.com/good".to_string(),
        ];

        let report = ingest(&service, &sources);

        assert_eq!(report.loaded(), &["https://example.com/good".to_string()]);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].0, "https://example.com/bad");
        assert!(report.failed()[0].1.contains("unsupported document"));
        assert_eq!(service.added.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_source_list_makes_no_calls() {
        let service = RecordingService::default();
        let report = ingest(&service, &[]);
        assert!(report.is_success());
        assert!(service.added.lock().unwrap().is_empty());
    }
}
