//! Shareable handles to raw frame bytes.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::image_pipeline::common::error::{RenderError, Result};

/// Anything that can hand out independent byte streams over a raw frame.
///
/// Shared as [`SharedDataSource`]; the underlying resource lives as long as
/// any share is outstanding.
pub trait ImageDataSource: Send + Sync + fmt::Debug {
    /// Total size in bytes.
    fn size(&self) -> u64;

    /// Open a fresh stream positioned at the first byte.
    fn open_stream(&self) -> std::io::Result<Box<dyn Read + Send>>;
}

pub type SharedDataSource = Arc<dyn ImageDataSource>;

/// In-memory frame bytes.
#[derive(Clone)]
pub struct MemoryDataSource {
    bytes: Arc<[u8]>,
}

impl MemoryDataSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn shared(bytes: impl Into<Arc<[u8]>>) -> SharedDataSource {
        Arc::new(Self::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for MemoryDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDataSource").field("len", &self.bytes.len()).finish()
    }
}

impl ImageDataSource for MemoryDataSource {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn open_stream(&self) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }
}

/// Frame stored in a file. Each stream opens its own buffered handle.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    path: PathBuf,
    size: u64,
}

impl FileDataSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = std::fs::metadata(&path)
            .map_err(|e| RenderError::InputReadError(format!("{}: {}", path.display(), e)))?
            .len();
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageDataSource for FileDataSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn open_stream(&self) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_streams_are_independent() {
        let source = MemoryDataSource::shared(vec![1u8, 2, 3, 4]);
        let mut a = source.open_stream().unwrap();
        let mut first = [0u8; 2];
        a.read_exact(&mut first).unwrap();

        let mut b = source.open_stream().unwrap();
        let mut all = Vec::new();
        b.read_to_end(&mut all).unwrap();
        assert_eq!(first, [1, 2]);
        assert_eq!(all, vec![1, 2, 3, 4]);
        assert_eq!(source.size(), 4);
    }

    #[test]
    fn file_source_reports_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 33]).unwrap();
        file.flush().unwrap();

        let source = FileDataSource::open(file.path()).unwrap();
        assert_eq!(source.size(), 33);
        let mut data = Vec::new();
        source.open_stream().unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data.len(), 33);
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = FileDataSource::open("/definitely/not/here.raw").unwrap_err();
        assert!(matches!(err, RenderError::InputReadError(_)));
    }
}
