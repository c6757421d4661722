//! Destinations for rendered documents.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identity of one rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentId {
    /// The front page listing every rendered table.
    Front,
    Table(String),
}

impl DocumentId {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(name.into())
    }

    /// Stable file name; also the target of every cross-document link.
    ///
    /// Table names are encoded with [`encode_name`], so the result never
    /// contains a path separator and needs no further URL escaping.
    pub fn file_name(&self) -> String {
        match self {
            Self::Front => "index.html".to_string(),
            Self::Table(name) => format!("table-{}.html", encode_name(name)),
        }
    }
}

/// Fragment identifier of a column row inside its table document.
pub fn column_anchor(column: &str) -> String {
    format!("col-{}", encode_name(column))
}

/// Maps a name onto URL-unreserved characters. ASCII letters, digits, `_`,
/// `-` and `.` pass through; every other byte becomes `~xx`.
pub fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-' | b'.' => out.push(byte as char),
            other => out.push_str(&format!("~{:02x}", other)),
        }
    }
    out
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

pub trait DocumentSink {
    fn write_document(&mut self, id: &DocumentId, content: &str) -> Result<(), SinkError>;
}

/// Writes each document as a file under a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSink for DirectorySink {
    fn write_document(&mut self, id: &DocumentId, content: &str) -> Result<(), SinkError> {
        let path = self.root.join(id.file_name());
        fs::write(&path, content).map_err(|source| SinkError::Io { path, source })
    }
}

/// Keeps documents in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: Vec<(DocumentId, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[(DocumentId, String)] {
        &self.documents
    }

    pub fn get(&self, id: &DocumentId) -> Option<&str> {
        self.documents
            .iter()
            .find(|(doc, _)| doc == id)
            .map(|(_, content)| content.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<(DocumentId, String)> {
        self.documents
    }
}

impl DocumentSink for MemorySink {
    fn write_document(&mut self, id: &DocumentId, content: &str) -> Result<(), SinkError> {
        self.documents.push((id.clone(), content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(DocumentId::Front.file_name(), "index.html");
        assert_eq!(DocumentId::table("orders").file_name(), "table-orders.html");
        assert_eq!(DocumentId::table("orders").to_string(), "table-orders.html");
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());

        sink.write_document(&DocumentId::table("orders"), "<html></html>").unwrap();
        sink.write_document(&DocumentId::Front, "front").unwrap();

        let written = fs::read_to_string(dir.path().join("table-orders.html")).unwrap();
        assert_eq!(written, "<html></html>");
        assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), "front");
    }

    #[test]
    fn test_unsafe_names_are_encoded() {
        assert_eq!(DocumentId::table("x/y").file_name(), "table-x~2fy.html");
        assert_eq!(DocumentId::table("../up").file_name(), "table-..~2fup.html");
        assert_eq!(DocumentId::table("a b#c?").file_name(), "table-a~20b~23c~3f.html");
        assert_eq!(DocumentId::table("caf\u{e9}").file_name(), "table-caf~c3~a9.html");
        assert_eq!(encode_name("a~b"), "a~7eb");
        assert_eq!(column_anchor("order id"), "col-order~20id");
    }

    #[test]
    fn test_directory_sink_keeps_unsafe_names_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());

        sink.write_document(&DocumentId::table("../escape"), "x").unwrap();
        sink.write_document(&DocumentId::table("x/y"), "y").unwrap();

        assert!(dir.path().join("table-..~2fescape.html").is_file());
        assert!(dir.path().join("table-x~2fy.html").is_file());
    }

    #[test]
    fn test_directory_sink_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("missing"));

        let err = sink.write_document(&DocumentId::Front, "x").unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.write_document(&DocumentId::table("b"), "B").unwrap();
        sink.write_document(&DocumentId::table("a"), "A").unwrap();

        let ids: Vec<String> = sink.documents().iter().map(|(id, _)| id.file_name()).collect();
        assert_eq!(ids, vec!["table-b.html", "table-a.html"]);
        assert_eq!(sink.get(&DocumentId::table("a")), Some("A"));
    }
}
