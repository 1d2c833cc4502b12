/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Sidecar metafile holding the per-page free-byte vector for a data
//! file, persisted only at open/close time. While a file is open, the
//! in-memory vector returned by [`load`] is authoritative.

use crate::error::Result;
use crate::pfm::PagedFileManager;
use crate::types::PAGE_SIZE;
use std::path::{Path, PathBuf};

/// Entries per metafile page; page 0 reserves its first two bytes for
/// the total entry count, so it holds one fewer than later pages.
const ENTRIES_PER_PAGE: usize = 2000;

pub fn metafile_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let dir = data_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = data_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data");
    dir.join(format!("meta_{}", file_name))
}

pub fn create(pfm: &PagedFileManager, data_path: impl AsRef<Path>) -> Result<()> {
    let path = metafile_path(data_path);
    pfm.create(&path)?;
    let mut handle = pfm.open(&path)?;
    let mut page = [0u8; PAGE_SIZE];
    page[0..2].copy_from_slice(&0u16.to_le_bytes());
    handle.append_page(&page)?;
    handle.close()
}

pub fn destroy(pfm: &PagedFileManager, data_path: impl AsRef<Path>) -> Result<()> {
    pfm.destroy(metafile_path(data_path))
}

/// Loads the whole free-byte vector into memory.
pub fn load(pfm: &PagedFileManager, data_path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let path = metafile_path(data_path);
    let mut handle = pfm.open(&path)?;
    let page_count = handle.page_count()?;
    if page_count == 0 {
        return Ok(Vec::new());
    }

    let mut first = [0u8; PAGE_SIZE];
    handle.read_page(0, &mut first)?;
    let total = u16::from_le_bytes(first[0..2].try_into().unwrap()) as usize;

    let mut entries = Vec::with_capacity(total);
    let mut remaining = total;

    let take = remaining.min(ENTRIES_PER_PAGE);
    for i in 0..take {
        let off = 2 + i * 2;
        entries.push(u16::from_le_bytes(first[off..off + 2].try_into().unwrap()));
    }
    remaining -= take;

    let mut page_idx = 1u32;
    while remaining > 0 {
        let mut page = [0u8; PAGE_SIZE];
        handle.read_page(page_idx, &mut page)?;
        let take = remaining.min(ENTRIES_PER_PAGE);
        for i in 0..take {
            let off = i * 2;
            entries.push(u16::from_le_bytes(page[off..off + 2].try_into().unwrap()));
        }
        remaining -= take;
        page_idx += 1;
    }
    handle.close()?;
    Ok(entries)
}

/// Rewrites the metafile from scratch with the given free-byte vector.
pub fn save(pfm: &PagedFileManager, data_path: impl AsRef<Path>, entries: &[u16]) -> Result<()> {
    let path = metafile_path(data_path);
    pfm.destroy(&path).ok();
    pfm.create(&path)?;
    let mut handle = pfm.open(&path)?;

    let total = entries.len();
    let mut page = [0u8; PAGE_SIZE];
    page[0..2].copy_from_slice(&(total as u16).to_le_bytes());
    let first_take = total.min(ENTRIES_PER_PAGE);
    for (i, &value) in entries[..first_take].iter().enumerate() {
        let off = 2 + i * 2;
        page[off..off + 2].copy_from_slice(&value.to_le_bytes());
    }
    handle.append_page(&page)?;

    let mut remaining = &entries[first_take..];
    while !remaining.is_empty() {
        let take = remaining.len().min(ENTRIES_PER_PAGE);
        let mut page = [0u8; PAGE_SIZE];
        for (i, &value) in remaining[..take].iter().enumerate() {
            let off = i * 2;
            page[off..off + 2].copy_from_slice(&value.to_le_bytes());
        }
        handle.append_page(&page)?;
        remaining = &remaining[take..];
    }
    handle.close()
}
