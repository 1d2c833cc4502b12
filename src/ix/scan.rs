/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Bounded range scan over the leaf chain.

use super::page::{self, NO_PAGE};
use super::IxFileHandle;
use crate::error::Result;
use crate::types::{Rid, Value};

pub struct IxScan<'a> {
    handle: &'a mut IxFileHandle,
    current: Option<(u32, usize)>,
    stop: Option<(u32, usize)>,
}

impl<'a> IxScan<'a> {
    pub(super) fn new(
        handle: &'a mut IxFileHandle,
        low: Option<Value>,
        low_inclusive: bool,
        high: Option<Value>,
        high_inclusive: bool,
    ) -> Result<Self> {
        let start = match low {
            None => (handle.leftmost_leaf()?, 0usize),
            Some(ref key) => {
                let (page, pos, found) = handle.locate(key)?;
                if found && low_inclusive {
                    (page, pos)
                } else if found {
                    (page, pos + 1)
                } else {
                    (page, pos)
                }
            }
        };

        let stop = match high {
            None => None,
            Some(ref key) => {
                let (page, pos, found) = handle.locate(key)?;
                if found && high_inclusive {
                    Some((page, pos + 1))
                } else {
                    Some((page, pos))
                }
            }
        };

        Ok(Self {
            handle,
            current: Some(start),
            stop,
        })
    }

    pub fn next_entry(&mut self) -> Result<Option<(Value, Rid)>> {
        loop {
            let (page_num, idx) = match self.current {
                None => return Ok(None),
                Some(pos) => pos,
            };
            if self.stop == Some((page_num, idx)) {
                self.current = None;
                return Ok(None);
            }

            let buf = self.handle.read_page(page_num)?;
            let header = page::read_leaf_header(&buf);
            if idx >= header.num_records as usize {
                if header.next == NO_PAGE {
                    self.current = None;
                    return Ok(None);
                }
                self.current = Some((header.next, 0));
                continue;
            }

            let entries = page::read_leaf_entries(&buf);
            let entry = &entries[idx];
            let key = Value::decode(self.handle.key_type, &entry.key)?;
            let rid = entry.rid;
            self.current = Some((page_num, idx + 1));
            return Ok(Some((key, rid)));
        }
    }
}
