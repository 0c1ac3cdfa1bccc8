//! Lazily opened file handles with positioned reads and writes.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};

use crate::error::IoError;

/// Access mode of a [`FileWrapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    /// Create or truncate the file for writing
    Write,
}

/// Opens file handles for image data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHandleFactory;

impl FileHandleFactory {
    pub fn new() -> Self {
        Self
    }

    /// Open a file in the given mode. Write mode creates any missing parent
    /// directories first.
    pub fn create_file_handle(&self, path: &Path, mode: FileMode) -> Result<File, IoError> {
        match mode {
            FileMode::Read => File::open(path).map_err(|e| IoError::file(path, e)),
            FileMode::Write => {
                if let Some(folder) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(folder).map_err(|e| IoError::file(folder, e))?;
                }
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| IoError::file(path, e))
            }
        }
    }
}

/// A file that is opened on first access and can be closed and reopened.
#[derive(Debug)]
pub struct FileWrapper {
    path: PathBuf,
    mode: FileMode,
    factory: FileHandleFactory,
    handle: Option<File>,
}

impl FileWrapper {
    pub fn new(path: impl Into<PathBuf>, factory: FileHandleFactory, mode: FileMode) -> Self {
        Self {
            path: path.into(),
            mode,
            factory,
            handle: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The open handle, opening the file if necessary.
    pub fn handle(&mut self) -> Result<&mut File, IoError> {
        if self.handle.is_none() {
            let file = self.factory.create_file_handle(&self.path, self.mode)?;
            self.handle = Some(file);
        }
        match self.handle.as_mut() {
            Some(file) => Ok(file),
            None => Err(IoError::Closed(self.path.clone())),
        }
    }

    /// Read exactly `len` bytes starting at `offset`.
    pub fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let path = self.path.clone();
        let file = self.handle()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::file(&path, e))?;

        let mut buf = BytesMut::zeroed(len);
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                IoError::ShortRead {
                    path: path.clone(),
                    offset,
                    requested: len,
                }
            } else {
                IoError::file(&path, e)
            }
        })?;
        Ok(buf.freeze())
    }

    /// Write all of `data` starting at `offset`.
    pub fn write_all_at(&mut self, offset: u64, data: &[u8]) -> Result<(), IoError> {
        let path = self.path.clone();
        let file = self.handle()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::file(&path, e))?;
        file.write_all(data).map_err(|e| IoError::file(&path, e))
    }

    /// Close the file if open. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), IoError> {
        if let Some(mut file) = self.handle.take() {
            if self.mode == FileMode::Write {
                file.flush().map_err(|e| IoError::file(&self.path, e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("data.raw");

        let mut wrapper = FileWrapper::new(&path, FileHandleFactory::new(), FileMode::Write);
        assert!(!wrapper.is_open());
        wrapper.write_all_at(4, &[9, 8]).unwrap();
        assert!(wrapper.is_open());
        wrapper.close().unwrap();
        assert!(!wrapper.is_open());

        assert_eq!(std::fs::read(&path).unwrap(), vec![0, 0, 0, 0, 9, 8]);
    }

    #[test]
    fn test_read_exact_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.raw");
        std::fs::write(&path, [1u8, 2, 3, 4, 5, 6]).unwrap();

        let mut wrapper = FileWrapper::new(&path, FileHandleFactory::new(), FileMode::Read);
        assert_eq!(wrapper.read_exact_at(2, 3).unwrap().as_ref(), &[3, 4, 5]);
        assert_eq!(wrapper.read_exact_at(0, 1).unwrap().as_ref(), &[1]);
    }

    #[test]
    fn test_short_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.raw");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut wrapper = FileWrapper::new(&path, FileHandleFactory::new(), FileMode::Read);
        let result = wrapper.read_exact_at(2, 4);
        assert!(matches!(
            result,
            Err(IoError::ShortRead {
                offset: 2,
                requested: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut wrapper = FileWrapper::new(
            dir.path().join("missing.raw"),
            FileHandleFactory::new(),
            FileMode::Read,
        );
        assert!(matches!(wrapper.handle(), Err(IoError::File { .. })));
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.raw");
        let mut wrapper = FileWrapper::new(&path, FileHandleFactory::new(), FileMode::Write);
        wrapper.write_all_at(0, &[1]).unwrap();
        wrapper.close().unwrap();
        wrapper.close().unwrap();
    }
}
