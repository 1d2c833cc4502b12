/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Record-based file manager: slotted data pages plus a sidecar
//! free-space metafile, on top of [`crate::pfm`].

pub mod metafile;
pub mod page;
pub mod record;
pub mod scan;

use crate::error::{EngineError, Result};
use crate::pfm::{FileHandle, PagedFileManager};
use crate::types::{Attribute, Rid, Value, PAGE_SIZE};
use log::{debug, trace};
use page::{FOOTER_OVERHEAD, SLOT_OVERHEAD};
use std::path::{Path, PathBuf};

pub use scan::RbfmScan;

#[derive(Clone, Default)]
pub struct RecordBasedFileManager {
    pfm: PagedFileManager,
}

impl RecordBasedFileManager {
    pub fn new(pfm: PagedFileManager) -> Self {
        Self { pfm }
    }

    pub fn create_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pfm.create(&path)?;
        metafile::create(&self.pfm, &path)?;
        Ok(())
    }

    pub fn destroy_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pfm.destroy(&path)?;
        metafile::destroy(&self.pfm, &path)?;
        Ok(())
    }

    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<RbfmFileHandle> {
        let path = path.as_ref().to_path_buf();
        let handle = self.pfm.open(&path)?;
        let free_space = metafile::load(&self.pfm, &path)?;
        Ok(RbfmFileHandle {
            handle,
            path,
            free_space,
        })
    }

    pub fn close_file(&self, mut file: RbfmFileHandle) -> Result<()> {
        metafile::save(&self.pfm, &file.path, &file.free_space)?;
        file.handle.close()?;
        Ok(())
    }
}

pub struct RbfmFileHandle {
    handle: FileHandle,
    path: PathBuf,
    free_space: Vec<u16>,
}

/// Page capacity for a brand-new, empty data page.
fn empty_page_capacity() -> usize {
    PAGE_SIZE - FOOTER_OVERHEAD
}

impl RbfmFileHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert_record(&mut self, descriptor: &[Attribute], values: &[Value]) -> Result<Rid> {
        let record = record::encode_record(descriptor, values)?;
        self.insert_encoded(&record)
    }

    fn insert_encoded(&mut self, record: &[u8]) -> Result<Rid> {
        let len = record.len();
        if len + FOOTER_OVERHEAD + SLOT_OVERHEAD > PAGE_SIZE {
            return Err(EngineError::capacity_unavailable(len, PAGE_SIZE));
        }

        if let Some(page_num) = self.find_page_with_free(len) {
            let mut buf = [0u8; PAGE_SIZE];
            self.handle.read_page(page_num, &mut buf)?;

            if let Some(slot_num) = page::find_reusable_deleted_slot(&buf, len) {
                let capacity = page::read_slot(&buf, slot_num).reserved_capacity();
                page::reuse_deleted_slot_in_place(&mut buf, slot_num, record);
                self.handle.write_page(page_num, &buf)?;
                self.free_space[page_num as usize] -= capacity as u16;
                return Ok(Rid::new(page_num, slot_num));
            }

            if let Some(slot_num) = page::find_recycled_slot(&buf) {
                if page::free_bytes(&buf) >= len {
                    page::reuse_slot_at_tail(&mut buf, slot_num, record)?;
                    self.handle.write_page(page_num, &buf)?;
                    self.free_space[page_num as usize] -= len as u16;
                    return Ok(Rid::new(page_num, slot_num));
                }
            }

            if page::free_bytes(&buf) < len + SLOT_OVERHEAD {
                trace!("reorganizing page {} before insert", page_num);
                page::reorganize(&mut buf);
            }

            let slot_num = page::append_new_slot(&mut buf, record)?;
            self.handle.write_page(page_num, &buf)?;
            self.free_space[page_num as usize] -= (len + SLOT_OVERHEAD) as u16;
            return Ok(Rid::new(page_num, slot_num));
        }

        let mut buf = [0u8; PAGE_SIZE];
        page::init_page(&mut buf);
        let slot_num = page::append_new_slot(&mut buf, record)?;
        let page_num = self.handle.append_page(&buf)?;
        self.free_space
            .push((empty_page_capacity() - len - SLOT_OVERHEAD) as u16);
        debug!("appended page {} for new record", page_num);
        Ok(Rid::new(page_num, slot_num))
    }

    fn find_page_with_free(&self, len: usize) -> Option<u32> {
        self.free_space
            .iter()
            .position(|&free| free as usize >= len)
            .map(|i| i as u32)
    }

    /// Resolves tombstone chains (at most one hop, per invariant I8)
    /// and returns the final non-tombstone `(page, slot, bytes)`.
    fn resolve(&mut self, rid: Rid) -> Result<(u32, u32, Vec<u8>)> {
        let mut page_num = rid.page_num;
        let mut slot_num = rid.slot_num;
        for _ in 0..2 {
            let mut buf = [0u8; PAGE_SIZE];
            self.handle.read_page(page_num, &mut buf)?;
            let slot = page::read_slot(&buf, slot_num);
            if slot.is_deleted() {
                return Err(EngineError::state("record has been deleted"));
            }
            if slot.is_recycled() {
                return Err(EngineError::state("slot does not contain a record"));
            }
            let begin = slot.begin as usize;
            let end = slot.end as usize;
            let bytes = buf[begin..end].to_vec();
            if record::is_tombstone(&bytes) {
                let (fwd_page, fwd_slot) = record::decode_tombstone(&bytes)?;
                page_num = fwd_page;
                slot_num = fwd_slot;
                continue;
            }
            return Ok((page_num, slot_num, bytes));
        }
        Err(EngineError::state("tombstone chain exceeded one hop"))
    }

    pub fn read_record(&mut self, descriptor: &[Attribute], rid: Rid) -> Result<Vec<Value>> {
        let (_, _, bytes) = self.resolve(rid)?;
        record::decode_record(descriptor, &bytes)
    }

    pub fn read_attribute(
        &mut self,
        descriptor: &[Attribute],
        rid: Rid,
        attribute_name: &str,
    ) -> Result<Value> {
        let attr_index = descriptor
            .iter()
            .position(|a| a.name == attribute_name)
            .ok_or_else(|| EngineError::argument(format!("no such attribute: {}", attribute_name)))?;
        let (_, _, bytes) = self.resolve(rid)?;
        let raw = record::read_attribute_bytes(descriptor, &bytes, attr_index)?;
        let attr = &descriptor[attr_index];
        if raw.is_empty() && attr.attr_type != crate::types::AttrType::VarChar {
            Ok(Value::Null)
        } else {
            Value::decode(attr.attr_type, &raw)
        }
    }

    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let mut page_num = rid.page_num;
        let mut slot_num = rid.slot_num;
        loop {
            let mut buf = [0u8; PAGE_SIZE];
            self.handle.read_page(page_num, &mut buf)?;
            let slot = page::read_slot(&buf, slot_num);
            if slot.is_deleted() {
                return Err(EngineError::state("record has already been deleted"));
            }
            let begin = slot.begin as usize;
            let end = slot.end as usize;
            let bytes = buf[begin..end].to_vec();
            let capacity = slot.reserved_capacity();

            let mut new_slot = slot;
            new_slot.begin = -slot.begin.max(1);
            page::write_slot(&mut buf, slot_num, new_slot);
            self.handle.write_page(page_num, &buf)?;
            self.free_space[page_num as usize] += capacity as u16;

            if record::is_tombstone(&bytes) {
                let (fwd_page, fwd_slot) = record::decode_tombstone(&bytes)?;
                page_num = fwd_page;
                slot_num = fwd_slot;
                continue;
            }
            return Ok(());
        }
    }

    pub fn update_record(
        &mut self,
        descriptor: &[Attribute],
        rid: Rid,
        values: &[Value],
    ) -> Result<()> {
        let new_bytes = record::encode_record(descriptor, values)?;

        let orig_page = rid.page_num;
        let orig_slot = rid.slot_num;
        let mut page_num = orig_page;
        let mut slot_num = orig_slot;
        loop {
            let mut buf = [0u8; PAGE_SIZE];
            self.handle.read_page(page_num, &mut buf)?;
            let slot = page::read_slot(&buf, slot_num);
            if slot.is_deleted() {
                return Err(EngineError::state("record has been deleted"));
            }
            let begin = slot.begin as usize;
            let end = slot.end as usize;
            let old_bytes = buf[begin..end].to_vec();

            if record::is_tombstone(&old_bytes) {
                let (fwd_page, fwd_slot) = record::decode_tombstone(&old_bytes)?;
                page_num = fwd_page;
                slot_num = fwd_slot;
                continue;
            }

            let capacity = slot.reserved_capacity();
            let forwarded = page_num != orig_page || slot_num != orig_slot;

            if new_bytes.len() <= capacity && !forwarded {
                let freed = capacity - new_bytes.len();
                page::overwrite_in_place(&mut buf, slot_num, &new_bytes);
                self.handle.write_page(page_num, &buf)?;
                self.free_space[page_num as usize] += freed as u16;
                return Ok(());
            }

            if new_bytes.len() <= capacity {
                // Fits back in the record's own (forwarded-to) slot, but the
                // original slot's tombstone must still point somewhere live:
                // overwrite in place and repoint the original tombstone at it.
                page::overwrite_in_place(&mut buf, slot_num, &new_bytes);
                self.handle.write_page(page_num, &buf)?;
                self.free_space[page_num as usize] += (capacity - new_bytes.len()) as u16;

                let mut orig_buf = [0u8; PAGE_SIZE];
                self.handle.read_page(orig_page, &mut orig_buf)?;
                let orig_slot_entry = page::read_slot(&orig_buf, orig_slot);
                let orig_capacity = orig_slot_entry.reserved_capacity();
                let stub = record::encode_tombstone(page_num, slot_num);
                let freed = orig_capacity - stub.len();
                page::overwrite_in_place(&mut orig_buf, orig_slot, &stub);
                self.handle.write_page(orig_page, &orig_buf)?;
                self.free_space[orig_page as usize] += freed as u16;
                return Ok(());
            }

            let new_rid = self.insert_encoded(&new_bytes)?;
            // Re-read: insert_encoded may have touched this same page.
            self.handle.read_page(page_num, &mut buf)?;

            if forwarded {
                // The intermediate (forwarded-to) slot is no longer needed:
                // free it outright rather than chaining a second tombstone.
                let mut dead = page::read_slot(&buf, slot_num);
                dead.begin = -dead.begin.max(1);
                page::write_slot(&mut buf, slot_num, dead);
                self.handle.write_page(page_num, &buf)?;
                self.free_space[page_num as usize] += capacity as u16;

                let mut orig_buf = [0u8; PAGE_SIZE];
                self.handle.read_page(orig_page, &mut orig_buf)?;
                let orig_slot_entry = page::read_slot(&orig_buf, orig_slot);
                let orig_capacity = orig_slot_entry.reserved_capacity();
                let stub = record::encode_tombstone(new_rid.page_num, new_rid.slot_num);
                let freed = orig_capacity - stub.len();
                page::overwrite_in_place(&mut orig_buf, orig_slot, &stub);
                self.handle.write_page(orig_page, &orig_buf)?;
                self.free_space[orig_page as usize] += freed as u16;
                debug!(
                    "relocated record ({}, {}) -> ({}, {}), freed intermediate slot ({}, {})",
                    orig_page, orig_slot, new_rid.page_num, new_rid.slot_num, page_num, slot_num
                );
            } else {
                let stub = record::encode_tombstone(new_rid.page_num, new_rid.slot_num);
                let freed = capacity - stub.len();
                page::overwrite_in_place(&mut buf, slot_num, &stub);
                self.handle.write_page(page_num, &buf)?;
                self.free_space[page_num as usize] += freed as u16;
                debug!(
                    "relocated record ({}, {}) -> ({}, {})",
                    page_num, slot_num, new_rid.page_num, new_rid.slot_num
                );
            }
            return Ok(());
        }
    }

    pub fn reorganize_page(&mut self, page_num: u32) -> Result<()> {
        let mut buf = [0u8; PAGE_SIZE];
        self.handle.read_page(page_num, &mut buf)?;
        page::reorganize(&mut buf);
        self.handle.write_page(page_num, &buf)?;
        self.free_space[page_num as usize] = page::free_bytes(&buf) as u16;
        Ok(())
    }

    pub fn page_count(&mut self) -> Result<u32> {
        self.handle.page_count()
    }

    pub(crate) fn read_raw_page(&mut self, page_num: u32) -> Result<[u8; PAGE_SIZE]> {
        let mut buf = [0u8; PAGE_SIZE];
        self.handle.read_page(page_num, &mut buf)?;
        Ok(buf)
    }
}
