// Song file access - where raw notation bytes come from
// Kept behind a trait so the setlist never touches the disk directly

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, SetlistError};

#[cfg(test)]
pub(crate) use memory::MemoryRepository;

pub trait ContentReader {
    /// Read the whole file as raw bytes. Missing files are `NotFound`, anything
    /// else that goes wrong (permissions, a directory) is `Io`. No encoding is
    /// assumed here.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Reads songs straight from the file system
#[derive(Debug, Clone, Default)]
pub struct FileRepository;

impl FileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl ContentReader for FileRepository {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(SetlistError::NotFound(path.to_path_buf()));
        }

        fs::read(path).map_err(|source| io_error(path, source))
    }
}


/// Wrap an io error for a path that exists but could not be read.
pub(crate) fn io_error(path: &Path, source: io::Error) -> SetlistError {
    SetlistError::Io {
        path: path.to_path_buf(),
        source,
    }
}
