//! Ingestion sources: in-memory uploads or files on disk

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Raw bytes to ingest, identified by a name whose suffix hints at the format
#[derive(Debug, Clone)]
pub struct IngestionSource {
    name: String,
    data: SourceData,
}

#[derive(Debug, Clone)]
enum SourceData {
    Bytes(Arc<[u8]>),
    File(PathBuf),
}

impl IngestionSource {
    /// Source backed by an in-memory buffer (e.g. an upload)
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: SourceData::Bytes(Arc::from(bytes.into())),
        }
    }

    /// Source backed by a file, read lazily
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            data: SourceData::File(path),
        }
    }

    /// Display name of the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased file suffix, if any
    pub fn suffix(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Size of the source in bytes
    pub fn size_bytes(&self) -> Result<u64> {
        match &self.data {
            SourceData::Bytes(bytes) => Ok(bytes.len() as u64),
            SourceData::File(path) => std::fs::metadata(path)
                .map(|metadata| metadata.len())
                .map_err(|e| Error::io(format!("Failed to stat {}", path.display()), e)),
        }
    }

    /// Up to `limit` bytes from the start of the source
    pub fn read_prefix(&self, limit: usize) -> Result<Vec<u8>> {
        match &self.data {
            SourceData::Bytes(bytes) => Ok(bytes[..bytes.len().min(limit)].to_vec()),
            SourceData::File(_) => {
                let mut prefix = Vec::with_capacity(limit);
                self.open()?.take(limit as u64).read_to_end(&mut prefix)?;
                Ok(prefix)
            }
        }
    }

    /// Sequential reader over the whole source, from the beginning
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.data {
            SourceData::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            SourceData::File(path) => {
                let file = File::open(path)
                    .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Entire source materialized in memory
    pub fn read_all(&self) -> Result<Vec<u8>> {
        match &self.data {
            SourceData::Bytes(bytes) => Ok(bytes.to_vec()),
            SourceData::File(path) => std::fs::read(path)
                .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bytes_source() {
        let source = IngestionSource::from_bytes("Export.CSV", b"a,b\n1,2\n".to_vec());
        assert_eq!(source.name(), "Export.CSV");
        assert_eq!(source.suffix().as_deref(), Some("csv"));
        assert_eq!(source.size_bytes().unwrap(), 8);
        assert_eq!(source.read_prefix(3).unwrap(), b"a,b");

        let mut content = String::new();
        source.open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "a,b\n1,2\n");
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        write!(file, "x\ty\n").unwrap();

        let source = IngestionSource::from_path(file.path());
        assert_eq!(source.suffix().as_deref(), Some("tsv"));
        assert_eq!(source.size_bytes().unwrap(), 4);
        assert_eq!(source.read_prefix(100).unwrap(), b"x\ty\n");
        assert_eq!(source.read_all().unwrap(), b"x\ty\n");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = IngestionSource::from_path("/definitely/not/here.csv");
        assert!(matches!(source.size_bytes(), Err(Error::Io { .. })));
        assert!(matches!(source.open(), Err(Error::Io { .. })));
    }

    #[test]
    fn test_source_without_suffix() {
        let source = IngestionSource::from_bytes("upload", Vec::new());
        assert_eq!(source.suffix(), None);
        assert_eq!(source.read_prefix(10).unwrap(), Vec::<u8>::new());
    }
}
