/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Slotted-page layout for data pages.
//!
//! Records grow upward from offset 0; the footer grows downward from
//! the page tail. Footer (6 bytes, ending exactly at [`PAGE_SIZE`]):
//! `[reorgCount: u16][slotCount: u16][freeSpaceOffset: u16]`. Each
//! slot is a 4-byte `(beginAddr: i16, endAddr: i16)` entry, slot 1
//! sitting immediately before the footer and slot numbers increasing
//! toward lower addresses.

use crate::error::{EngineError, Result};
use crate::types::PAGE_SIZE;

pub const FOOTER_OVERHEAD: usize = 6;
pub const SLOT_OVERHEAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    /// Negative when the slot has been deleted (magnitude preserved).
    pub begin: i16,
    pub end: i16,
}

impl SlotEntry {
    pub fn is_deleted(&self) -> bool {
        self.begin < 0
    }

    /// `(0, 0)` marks a recycled slot that currently holds no record.
    pub fn is_recycled(&self) -> bool {
        self.begin == 0 && self.end == 0
    }

    pub fn reserved_capacity(&self) -> usize {
        (self.end as i32 - self.begin.unsigned_abs() as i32).max(0) as usize
    }
}

fn footer_offset() -> usize {
    PAGE_SIZE - FOOTER_OVERHEAD
}

fn slot_offset(slot_num: u32) -> usize {
    footer_offset() - SLOT_OVERHEAD * slot_num as usize
}

pub fn read_footer(page: &[u8; PAGE_SIZE]) -> (u16, u16, u16) {
    let o = footer_offset();
    let reorg_count = u16::from_le_bytes(page[o..o + 2].try_into().unwrap());
    let slot_count = u16::from_le_bytes(page[o + 2..o + 4].try_into().unwrap());
    let free_space_offset = u16::from_le_bytes(page[o + 4..o + 6].try_into().unwrap());
    (reorg_count, slot_count, free_space_offset)
}

pub fn write_footer(page: &mut [u8; PAGE_SIZE], reorg_count: u16, slot_count: u16, free_space_offset: u16) {
    let o = footer_offset();
    page[o..o + 2].copy_from_slice(&reorg_count.to_le_bytes());
    page[o + 2..o + 4].copy_from_slice(&slot_count.to_le_bytes());
    page[o + 4..o + 6].copy_from_slice(&free_space_offset.to_le_bytes());
}

pub fn read_slot(page: &[u8; PAGE_SIZE], slot_num: u32) -> SlotEntry {
    let o = slot_offset(slot_num);
    let begin = i16::from_le_bytes(page[o..o + 2].try_into().unwrap());
    let end = i16::from_le_bytes(page[o + 2..o + 4].try_into().unwrap());
    SlotEntry { begin, end }
}

pub fn write_slot(page: &mut [u8; PAGE_SIZE], slot_num: u32, slot: SlotEntry) {
    let o = slot_offset(slot_num);
    page[o..o + 2].copy_from_slice(&slot.begin.to_le_bytes());
    page[o + 2..o + 4].copy_from_slice(&slot.end.to_le_bytes());
}

/// Initializes an empty page: zero slots, free space starting at 0.
pub fn init_page(page: &mut [u8; PAGE_SIZE]) {
    write_footer(page, 0, 0, 0);
}

/// Bytes free between the data area's high-water mark and the start
/// of the slot directory.
pub fn free_bytes(page: &[u8; PAGE_SIZE]) -> usize {
    let (_, slot_count, free_space_offset) = read_footer(page);
    let tail_start = footer_offset() - SLOT_OVERHEAD * slot_count as usize;
    tail_start.saturating_sub(free_space_offset as usize)
}

/// Copies `record` into the page at `free_space_offset`, creating a
/// brand-new slot `slot_count + 1`. Caller must have already verified
/// there is enough free space (record length + one slot entry).
pub fn append_new_slot(page: &mut [u8; PAGE_SIZE], record: &[u8]) -> Result<u32> {
    let (reorg_count, slot_count, free_space_offset) = read_footer(page);
    let begin = free_space_offset as usize;
    let end = begin + record.len();
    if end > footer_offset() - SLOT_OVERHEAD * (slot_count as usize + 1) {
        return Err(EngineError::capacity_unavailable(record.len(), free_bytes(page)));
    }
    page[begin..end].copy_from_slice(record);
    let new_slot_num = slot_count as u32 + 1;
    write_slot(
        page,
        new_slot_num,
        SlotEntry {
            begin: begin as i16,
            end: end as i16,
        },
    );
    write_footer(page, reorg_count, slot_count + 1, end as u16);
    Ok(new_slot_num)
}

/// Overwrites an existing (deleted or recycled) slot in place by
/// appending the record at the data high-water mark, matching the
/// original slot's reserved capacity bookkeeping to the new payload.
pub fn reuse_slot_at_tail(page: &mut [u8; PAGE_SIZE], slot_num: u32, record: &[u8]) -> Result<()> {
    let (reorg_count, slot_count, free_space_offset) = read_footer(page);
    let begin = free_space_offset as usize;
    let end = begin + record.len();
    if end > footer_offset() - SLOT_OVERHEAD * slot_count as usize {
        return Err(EngineError::capacity_unavailable(record.len(), free_bytes(page)));
    }
    page[begin..end].copy_from_slice(record);
    write_slot(
        page,
        slot_num,
        SlotEntry {
            begin: begin as i16,
            end: end as i16,
        },
    );
    write_footer(page, reorg_count, slot_count, end as u16);
    Ok(())
}

/// Overwrites the record in place within an existing slot's reserved
/// capacity, shrinking `end` to free the unused tail bytes.
pub fn overwrite_in_place(page: &mut [u8; PAGE_SIZE], slot_num: u32, record: &[u8]) {
    let slot = read_slot(page, slot_num);
    let begin = slot.begin.unsigned_abs() as usize;
    let end = begin + record.len();
    page[begin..end].copy_from_slice(record);
    write_slot(
        page,
        slot_num,
        SlotEntry {
            begin: slot.begin,
            end: end as i16,
        },
    );
}

/// Rewrites a deleted slot's payload in place, reusing its reserved
/// capacity (which must be `>= record.len()`) without shrinking it.
pub fn reuse_deleted_slot_in_place(page: &mut [u8; PAGE_SIZE], slot_num: u32, record: &[u8]) {
    let slot = read_slot(page, slot_num);
    let begin = slot.begin.unsigned_abs() as usize;
    page[begin..begin + record.len()].copy_from_slice(record);
    write_slot(
        page,
        slot_num,
        SlotEntry {
            begin: begin as i16,
            end: slot.end,
        },
    );
}

/// Compacts live records to the top of the page, preserving slot
/// numbers and order; deleted slots become recycled `(0, 0)` slots.
/// Bumps `reorgCount` and recomputes `freeSpaceOffset`.
pub fn reorganize(page: &mut [u8; PAGE_SIZE]) {
    let (reorg_count, slot_count, _) = read_footer(page);
    let mut scratch = [0u8; PAGE_SIZE];
    let mut cursor = 0usize;
    let mut new_slots = Vec::with_capacity(slot_count as usize);

    for s in 1..=slot_count as u32 {
        let slot = read_slot(page, s);
        if slot.is_deleted() || slot.is_recycled() {
            new_slots.push(SlotEntry { begin: 0, end: 0 });
            continue;
        }
        let begin = slot.begin as usize;
        let len = slot.reserved_capacity();
        scratch[cursor..cursor + len].copy_from_slice(&page[begin..begin + len]);
        new_slots.push(SlotEntry {
            begin: cursor as i16,
            end: (cursor + len) as i16,
        });
        cursor += len;
    }

    page[0..cursor].copy_from_slice(&scratch[0..cursor]);
    for (i, slot) in new_slots.into_iter().enumerate() {
        write_slot(page, i as u32 + 1, slot);
    }
    write_footer(page, reorg_count + 1, slot_count, cursor as u16);
}

/// Finds the first deleted slot whose reserved capacity is >= `len`,
/// if any.
pub fn find_reusable_deleted_slot(page: &[u8; PAGE_SIZE], len: usize) -> Option<u32> {
    let (_, slot_count, _) = read_footer(page);
    (1..=slot_count as u32).find(|&s| {
        let slot = read_slot(page, s);
        slot.is_deleted() && slot.reserved_capacity() >= len
    })
}

/// Finds the first recycled `(0, 0)` slot, if any.
pub fn find_recycled_slot(page: &[u8; PAGE_SIZE]) -> Option<u32> {
    let (_, slot_count, _) = read_footer(page);
    (1..=slot_count as u32).find(|&s| read_slot(page, s).is_recycled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_slot() {
        let mut page = [0u8; PAGE_SIZE];
        init_page(&mut page);
        let record = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let slot_num = append_new_slot(&mut page, &record).unwrap();
        assert_eq!(slot_num, 1);
        let slot = read_slot(&page, 1);
        assert_eq!(slot.reserved_capacity(), 10);
        assert_eq!(&page[0..10], &record[..]);
    }

    #[test]
    fn reorganize_compacts_deleted_slots() {
        let mut page = [0u8; PAGE_SIZE];
        init_page(&mut page);
        append_new_slot(&mut page, &[0u8; 10]).unwrap();
        append_new_slot(&mut page, &[1u8; 20]).unwrap();
        let mut slot1 = read_slot(&page, 1);
        slot1.begin = -slot1.begin.abs().max(1);
        write_slot(&mut page, 1, slot1);

        reorganize(&mut page);
        assert!(read_slot(&page, 1).is_recycled());
        let slot2 = read_slot(&page, 2);
        assert_eq!(slot2.begin, 0);
        assert_eq!(slot2.reserved_capacity(), 20);
    }
}
