//! Report persistence.
//!
//! The [`ReportWriter`] is the single consumer of scan results: it renders
//! each result in the selected format, writes it to its own file and keeps
//! the running progress count.

pub mod html;
pub mod progress;
pub mod table;

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::error::{LseError, Result};
use crate::runtime::{LogSink, StatusMessage};
use crate::types::{ContainerRef, ScanResult};

pub use progress::ScanProgress;

/// Timestamp layout used in report file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Attempts at a free file name before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Turn raw script output into report bytes for `format`.
pub fn render(format: OutputFormat, raw: &[u8]) -> Vec<u8> {
    match format {
        OutputFormat::Html => html::render_page(raw),
        OutputFormat::Ansi | OutputFormat::Text => raw.to_vec(),
    }
}

/// `<pod>-<container>-<YYYY-MM-DD-HHMMSS>.<ext>`
pub fn report_file_name(
    container: &ContainerRef,
    captured_at: &DateTime<Local>,
    format: OutputFormat,
) -> String {
    format!(
        "{}-{}-{}.{}",
        container.pod,
        container.container,
        captured_at.format(TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Outcome counts of the report stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportTally {
    pub written: usize,
    pub failed: usize,
}

/// Writes one report file per scan result.
pub struct ReportWriter {
    directory: PathBuf,
    format: OutputFormat,
    sink: Arc<dyn LogSink>,
}

impl ReportWriter {
    pub fn new(directory: impl Into<PathBuf>, format: OutputFormat, sink: Arc<dyn LogSink>) -> Self {
        Self {
            directory: directory.into(),
            format,
            sink,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist one result. Reports are write-once: an existing file with the
    /// same name is never overwritten, a numeric suffix is added instead.
    pub fn write(&self, result: &ScanResult, captured_at: &DateTime<Local>) -> Result<PathBuf> {
        let report = render(self.format, &result.raw_output);
        let base = report_file_name(&result.container, captured_at, self.format);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.directory.join(with_suffix(&base, attempt, self.format));
            match create_report_file(&path) {
                Ok(mut file) => {
                    file.write_all(&report)
                        .map_err(|e| LseError::write_error(&path, e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(LseError::create_error(&path, e)),
            }
        }

        Err(LseError::create_error(
            self.directory.join(base),
            std::io::Error::new(ErrorKind::AlreadyExists, "no free report file name"),
        ))
    }

    /// Drain the scan result queue, writing each result as it arrives.
    ///
    /// A failed write is reported together with the raw output so the
    /// enumeration is not lost, and never stops the remaining reports.
    pub async fn consume(self, mut rx: mpsc::Receiver<ScanResult>) -> ReportTally {
        let mut tally = ReportTally::default();
        let mut progress = ScanProgress::new();

        while let Some(result) = rx.recv().await {
            match self.write(&result, &Local::now()) {
                Ok(path) => {
                    info!(container = %result.container, path = %path.display(), "report saved");
                    tally.written += 1;
                }
                Err(e) => {
                    warn!(container = %result.container, error = %e, "failed to save report");
                    tally.failed += 1;
                    self.sink.send(StatusMessage::warn(e.to_string())).await;
                    self.sink
                        .send(StatusMessage::Line(
                            String::from_utf8_lossy(&result.raw_output).into_owned(),
                        ))
                        .await;
                }
            }
            self.sink.send(progress.inc()).await;
        }

        if let Some(done) = progress.finish() {
            self.sink.send(done).await;
        }
        tally
    }
}

fn with_suffix(base: &str, attempt: usize, format: OutputFormat) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    let ext = format!(".{}", format.extension());
    let stem = base.strip_suffix(&ext).unwrap_or(base);
    format!("{stem}-{attempt}{ext}")
}

#[cfg(unix)]
fn create_report_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o666)
        .open(path)
}

#[cfg(not(unix))]
fn create_report_file(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemorySink;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    fn result(pod: &str, container: &str, raw: &[u8]) -> ScanResult {
        ScanResult {
            container: ContainerRef::new(pod, container),
            raw_output: raw.to_vec(),
        }
    }

    #[test]
    fn test_file_name_layout() {
        let name = report_file_name(
            &ContainerRef::new("web-0", "nginx"),
            &fixed_time(),
            OutputFormat::Html,
        );
        assert_eq!(name, "web-0-nginx-2024-03-09-070501.html");
    }

    #[test]
    fn test_render_ansi_and_text_verbatim() {
        let raw = b"\x1b[31mred\x1b[0m\r\n\xff";
        assert_eq!(render(OutputFormat::Ansi, raw), raw.to_vec());
        assert_eq!(render(OutputFormat::Text, raw), raw.to_vec());
    }

    #[test]
    fn test_render_html_wrapped() {
        let report = render(OutputFormat::Html, b"x");
        assert!(report.starts_with(html::HTML_HEADER.as_bytes()));
        assert!(report.ends_with(html::HTML_FOOTER.as_bytes()));
    }

    #[test]
    fn test_write_creates_report() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path(), OutputFormat::Ansi, Arc::new(MemorySink::new()));

        let path = writer
            .write(&result("p1", "c1", b"output"), &fixed_time())
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "p1-c1-2024-03-09-070501.ansi"
        );
        assert_eq!(fs::read(&path).unwrap(), b"output");
    }

    #[test]
    fn test_same_second_collision_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path(), OutputFormat::Text, Arc::new(MemorySink::new()));

        let first = writer.write(&result("p", "c", b"one"), &fixed_time()).unwrap();
        let second = writer.write(&result("p", "c", b"two"), &fixed_time()).unwrap();

        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "p-c-2024-03-09-070501-1.text"
        );
        assert_eq!(fs::read(&first).unwrap(), b"one");
        assert_eq!(fs::read(&second).unwrap(), b"two");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(
            dir.path().join("missing"),
            OutputFormat::Ansi,
            Arc::new(MemorySink::new()),
        );
        let err = writer
            .write(&result("p", "c", b"x"), &fixed_time())
            .unwrap_err();
        assert!(err.to_string().contains("create"));
    }

    #[tokio::test]
    async fn test_consume_writes_every_result_and_counts() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());
        let writer = ReportWriter::new(dir.path(), OutputFormat::Html, sink.clone());

        let (tx, rx) = mpsc::channel(4);
        tx.send(result("p1", "c1", b"a")).await.unwrap();
        tx.send(result("p2", "c1", b"b")).await.unwrap();
        drop(tx);

        let tally = writer.consume(rx).await;
        assert_eq!(tally, ReportTally { written: 2, failed: 0 });
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        assert!(sink.contains("Analyzed 2 containers"));
    }

    #[tokio::test]
    async fn test_consume_failed_write_dumps_output_and_continues() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::new());
        let writer = ReportWriter::new(dir.path().join("gone"), OutputFormat::Ansi, sink.clone());

        let (tx, rx) = mpsc::channel(4);
        tx.send(result("p1", "c1", b"first enumeration")).await.unwrap();
        tx.send(result("p2", "c2", b"second enumeration")).await.unwrap();
        drop(tx);

        let tally = writer.consume(rx).await;
        assert_eq!(tally, ReportTally { written: 0, failed: 2 });
        assert!(sink.contains("first enumeration"));
        assert!(sink.contains("second enumeration"));
        assert!(sink.contains("Analyzed 2 containers"));
    }
}
