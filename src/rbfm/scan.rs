/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Full-file scan with tombstone-forwarding RID stability.

use super::{page, record, RbfmFileHandle};
use crate::error::Result;
use crate::types::{Attribute, CompOp, Rid, Value};
use std::collections::HashMap;

pub struct RbfmScan {
    handle: RbfmFileHandle,
    descriptor: Vec<Attribute>,
    condition_attr: Option<usize>,
    comp_op: CompOp,
    comp_value: Value,
    projection: Vec<usize>,
    page_num: u32,
    slot_num: u32,
    page_count: u32,
    /// Maps a forwarded target `(page, slot)` back to the original
    /// tombstone's RID, so the caller always sees a stable identity.
    forward_map: HashMap<(u32, u32), Rid>,
}

impl RbfmScan {
    pub fn new(
        handle: RbfmFileHandle,
        descriptor: Vec<Attribute>,
        condition_attribute: Option<&str>,
        comp_op: CompOp,
        comp_value: Value,
        projected_attributes: &[String],
    ) -> Result<Self> {
        let condition_attr = condition_attribute
            .map(|name| {
                descriptor
                    .iter()
                    .position(|a| a.name == name)
                    .ok_or_else(|| {
                        crate::error::EngineError::argument(format!(
                            "no such attribute: {}",
                            name
                        ))
                    })
            })
            .transpose()?;

        let mut projection = Vec::with_capacity(projected_attributes.len());
        for name in projected_attributes {
            let idx = descriptor
                .iter()
                .position(|a| &a.name == name)
                .ok_or_else(|| {
                    crate::error::EngineError::argument(format!("no such attribute: {}", name))
                })?;
            projection.push(idx);
        }

        let page_count = handle.page_count()?;
        Ok(Self {
            handle,
            descriptor,
            condition_attr,
            comp_op,
            comp_value,
            projection,
            page_num: 0,
            slot_num: 1,
            page_count,
            forward_map: HashMap::new(),
        })
    }

    pub fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        loop {
            if self.page_num >= self.page_count {
                return Ok(None);
            }

            let buf = self.handle.read_raw_page(self.page_num)?;
            let (_, slot_count, _) = page::read_footer(&buf);

            if self.slot_num > slot_count as u32 {
                self.page_num += 1;
                self.slot_num = 1;
                continue;
            }

            let slot_num = self.slot_num;
            self.slot_num += 1;
            let slot = page::read_slot(&buf, slot_num);
            if slot.is_deleted() || slot.is_recycled() {
                continue;
            }

            let begin = slot.begin as usize;
            let end = slot.end as usize;
            let bytes = &buf[begin..end];

            if record::is_tombstone(bytes) {
                let (fwd_page, fwd_slot) = record::decode_tombstone(bytes)?;
                self.forward_map
                    .insert((fwd_page, fwd_slot), Rid::new(self.page_num, slot_num));
                continue;
            }

            let effective_rid = self
                .forward_map
                .remove(&(self.page_num, slot_num))
                .unwrap_or_else(|| Rid::new(self.page_num, slot_num));

            let values = record::decode_record(&self.descriptor, bytes)?;

            if let Some(idx) = self.condition_attr {
                if !self.comp_op.matches(&values[idx], &self.comp_value) {
                    continue;
                }
            }

            let projected = self
                .projection
                .iter()
                .map(|&i| values[i].clone())
                .collect();
            return Ok(Some((effective_rid, projected)));
        }
    }

    /// Hands the underlying file handle back to the caller, who is
    /// responsible for closing it via
    /// [`crate::rbfm::RecordBasedFileManager::close_file`].
    pub fn into_handle(self) -> RbfmFileHandle {
        self.handle
    }
}
