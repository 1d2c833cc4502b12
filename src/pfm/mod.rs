/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Paged file manager: create/destroy/open/close files made of
//! fixed-size pages, and read/write/append those pages by number.

use crate::error::{EngineError, Result};
use crate::types::PAGE_SIZE;
use log::{debug, trace};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Process-wide table of open-handle reference counts, keyed by file
/// name. Cheaply `Clone`-able so every manager built on top of a
/// `PagedFileManager` shares the same table without a global/static.
#[derive(Clone, Default)]
pub struct PagedFileManager {
    open_counts: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl PagedFileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(EngineError::argument(format!(
                "file already exists: {}",
                path.display()
            )));
        }
        File::create(path).map_err(|e| EngineError::io_at(path, e))?;
        debug!("created paged file {}", path.display());
        Ok(())
    }

    pub fn destroy(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let counts = self.open_counts.lock().unwrap();
        if counts.get(path).copied().unwrap_or(0) > 0 {
            return Err(EngineError::state(format!(
                "cannot destroy {}: file is still open",
                path.display()
            )));
        }
        drop(counts);
        fs::remove_file(path).map_err(|e| EngineError::io_at(path, e))?;
        debug!("destroyed paged file {}", path.display());
        Ok(())
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<FileHandle> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| EngineError::io_at(&path, e))?;
        {
            let mut counts = self.open_counts.lock().unwrap();
            *counts.entry(path.clone()).or_insert(0) += 1;
        }
        trace!("opened paged file {}", path.display());
        Ok(FileHandle {
            manager: self.clone(),
            path,
            file,
            closed: false,
        })
    }
}

/// A handle to an open paged file. Decrements the manager's refcount
/// for this file's name when closed (explicitly, or on `Drop`).
pub struct FileHandle {
    manager: PagedFileManager,
    path: PathBuf,
    file: File,
    closed: bool,
}

impl FileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.file.flush().map_err(|e| EngineError::io_at(&self.path, e))?;
        let mut counts = self.manager.open_counts.lock().unwrap();
        if let Some(count) = counts.get_mut(&self.path) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&self.path);
            }
        }
        self.closed = true;
        trace!("closed paged file {}", self.path.display());
        Ok(())
    }

    pub fn page_count(&self) -> Result<u32> {
        let len = self
            .file
            .metadata()
            .map_err(|e| EngineError::io_at(&self.path, e))?
            .len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    pub fn read_page(&mut self, page_num: u32, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if page_num >= self.page_count()? {
            return Err(EngineError::argument(format!(
                "page {} does not exist in {}",
                page_num,
                self.path.display()
            )));
        }
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        self.file
            .read_exact(buf)
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        Ok(())
    }

    pub fn write_page(&mut self, page_num: u32, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        if page_num >= self.page_count()? {
            return Err(EngineError::argument(format!(
                "page {} does not exist in {}",
                page_num,
                self.path.display()
            )));
        }
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        self.file
            .write_all(buf)
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        Ok(())
    }

    /// Appends `buf` as a new page and returns its page number.
    pub fn append_page(&mut self, buf: &[u8; PAGE_SIZE]) -> Result<u32> {
        let page_num = self.page_count()?;
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        self.file
            .write_all(buf)
            .map_err(|e| EngineError::io_at(&self.path, e))?;
        Ok(page_num)
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        let _ = self.close_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_open_append_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tbl");
        let pfm = PagedFileManager::new();
        pfm.create(&path).unwrap();

        let mut handle = pfm.open(&path).unwrap();
        assert_eq!(handle.page_count().unwrap(), 0);

        let mut page = [0u8; PAGE_SIZE];
        page[0] = 42;
        let page_num = handle.append_page(&page).unwrap();
        assert_eq!(page_num, 0);
        assert_eq!(handle.page_count().unwrap(), 1);

        let mut read_buf = [0u8; PAGE_SIZE];
        handle.read_page(0, &mut read_buf).unwrap();
        assert_eq!(read_buf[0], 42);
    }

    #[test]
    fn destroy_fails_while_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tbl");
        let pfm = PagedFileManager::new();
        pfm.create(&path).unwrap();
        let handle = pfm.open(&path).unwrap();

        assert!(pfm.destroy(&path).is_err());
        handle.close().unwrap();
        assert!(pfm.destroy(&path).is_ok());
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tbl");
        let pfm = PagedFileManager::new();
        pfm.create(&path).unwrap();
        let mut handle = pfm.open(&path).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        assert!(handle.read_page(0, &mut buf).is_err());
    }
}
