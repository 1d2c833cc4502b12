/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Leaf and interior page layout for the B+-tree.
//!
//! Leaf header (19 bytes): `[pageType: u8][numRecords: u16][freeSpace:
//! u16][freeSpaceOffset: u16][overflow: u32][next: u32][prev: u32]`.
//! Interior header (11 bytes): `[pageType: u8][numRecords: u16]
//! [freeSpace: u16][freeSpaceOffset: u16][firstChild: u32]`.
//!
//! Both page kinds lay their slot directory out forward from the end
//! of the header and their key bytes backward from the page tail;
//! every mutation rewrites the page from a fully decoded, sorted
//! entry list rather than patching bytes in place.

use crate::error::{EngineError, Result};
use crate::types::{Rid, PAGE_SIZE};

pub const NO_PAGE: u32 = u32::MAX;

pub const LEAF_HEADER_LEN: usize = 19;
pub const INTERIOR_HEADER_LEN: usize = 11;
pub const LEAF_SLOT_OVERHEAD: usize = 12;
pub const INTERIOR_SLOT_OVERHEAD: usize = 8;

const PAGE_TYPE_LEAF: u8 = 0;
const PAGE_TYPE_INTERIOR: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Leaf,
    Interior,
}

pub fn page_type(page: &[u8; PAGE_SIZE]) -> Result<PageType> {
    match page[0] {
        PAGE_TYPE_LEAF => Ok(PageType::Leaf),
        PAGE_TYPE_INTERIOR => Ok(PageType::Interior),
        other => Err(EngineError::state(format!("unknown index page type {other}"))),
    }
}

#[derive(Debug, Clone)]
pub struct LeafEntry {
    pub key: Vec<u8>,
    pub rid: Rid,
}

#[derive(Debug, Clone, Copy)]
pub struct LeafHeader {
    pub num_records: u16,
    pub free_space: u16,
    pub free_space_offset: u16,
    pub overflow: u32,
    pub next: u32,
    pub prev: u32,
}

pub fn init_leaf(page: &mut [u8; PAGE_SIZE], prev: u32, next: u32) {
    page[0] = PAGE_TYPE_LEAF;
    write_leaf_header(
        page,
        LeafHeader {
            num_records: 0,
            free_space: (PAGE_SIZE - LEAF_HEADER_LEN) as u16,
            free_space_offset: PAGE_SIZE as u16,
            overflow: 0,
            next,
            prev,
        },
    );
}

pub fn read_leaf_header(page: &[u8; PAGE_SIZE]) -> LeafHeader {
    LeafHeader {
        num_records: u16::from_le_bytes(page[1..3].try_into().unwrap()),
        free_space: u16::from_le_bytes(page[3..5].try_into().unwrap()),
        free_space_offset: u16::from_le_bytes(page[5..7].try_into().unwrap()),
        overflow: u32::from_le_bytes(page[7..11].try_into().unwrap()),
        next: u32::from_le_bytes(page[11..15].try_into().unwrap()),
        prev: u32::from_le_bytes(page[15..19].try_into().unwrap()),
    }
}

pub fn write_leaf_header(page: &mut [u8; PAGE_SIZE], header: LeafHeader) {
    page[0] = PAGE_TYPE_LEAF;
    page[1..3].copy_from_slice(&header.num_records.to_le_bytes());
    page[3..5].copy_from_slice(&header.free_space.to_le_bytes());
    page[5..7].copy_from_slice(&header.free_space_offset.to_le_bytes());
    page[7..11].copy_from_slice(&header.overflow.to_le_bytes());
    page[11..15].copy_from_slice(&header.next.to_le_bytes());
    page[15..19].copy_from_slice(&header.prev.to_le_bytes());
}

pub fn read_leaf_entries(page: &[u8; PAGE_SIZE]) -> Vec<LeafEntry> {
    let header = read_leaf_header(page);
    let mut entries = Vec::with_capacity(header.num_records as usize);
    for i in 0..header.num_records as usize {
        let o = LEAF_HEADER_LEN + i * LEAF_SLOT_OVERHEAD;
        let offset = u16::from_le_bytes(page[o..o + 2].try_into().unwrap()) as usize;
        let length = u16::from_le_bytes(page[o + 2..o + 4].try_into().unwrap()) as usize;
        let page_num = u32::from_le_bytes(page[o + 4..o + 8].try_into().unwrap());
        let slot_num = u32::from_le_bytes(page[o + 8..o + 12].try_into().unwrap());
        let key = page[offset..offset + length].to_vec();
        entries.push(LeafEntry {
            key,
            rid: Rid::new(page_num, slot_num),
        });
    }
    entries
}

/// Rewrites the whole leaf page from a caller-sorted entry list.
pub fn write_leaf_entries(
    page: &mut [u8; PAGE_SIZE],
    entries: &[LeafEntry],
    prev: u32,
    next: u32,
) -> Result<()> {
    let key_bytes: usize = entries.iter().map(|e| e.key.len()).sum();
    let needed = LEAF_HEADER_LEN + entries.len() * LEAF_SLOT_OVERHEAD + key_bytes;
    if needed > PAGE_SIZE {
        return Err(EngineError::capacity_unavailable(needed, PAGE_SIZE));
    }

    let mut fresh = [0u8; PAGE_SIZE];
    let mut cursor = PAGE_SIZE;
    for (i, entry) in entries.iter().enumerate() {
        cursor -= entry.key.len();
        fresh[cursor..cursor + entry.key.len()].copy_from_slice(&entry.key);
        let o = LEAF_HEADER_LEN + i * LEAF_SLOT_OVERHEAD;
        fresh[o..o + 2].copy_from_slice(&(cursor as u16).to_le_bytes());
        fresh[o + 2..o + 4].copy_from_slice(&(entry.key.len() as u16).to_le_bytes());
        fresh[o + 4..o + 8].copy_from_slice(&entry.rid.page_num.to_le_bytes());
        fresh[o + 8..o + 12].copy_from_slice(&entry.rid.slot_num.to_le_bytes());
    }
    let dir_end = LEAF_HEADER_LEN + entries.len() * LEAF_SLOT_OVERHEAD;
    write_leaf_header(
        &mut fresh,
        LeafHeader {
            num_records: entries.len() as u16,
            free_space: (cursor - dir_end) as u16,
            free_space_offset: cursor as u16,
            overflow: 0,
            next,
            prev,
        },
    );
    *page = fresh;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct InteriorEntry {
    pub key: Vec<u8>,
    pub child: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct InteriorHeader {
    pub num_records: u16,
    pub free_space: u16,
    pub free_space_offset: u16,
    pub first_child: u32,
}

pub fn init_interior(page: &mut [u8; PAGE_SIZE], first_child: u32) {
    page[0] = PAGE_TYPE_INTERIOR;
    write_interior_header(
        page,
        InteriorHeader {
            num_records: 0,
            free_space: (PAGE_SIZE - INTERIOR_HEADER_LEN) as u16,
            free_space_offset: PAGE_SIZE as u16,
            first_child,
        },
    );
}

pub fn read_interior_header(page: &[u8; PAGE_SIZE]) -> InteriorHeader {
    InteriorHeader {
        num_records: u16::from_le_bytes(page[1..3].try_into().unwrap()),
        free_space: u16::from_le_bytes(page[3..5].try_into().unwrap()),
        free_space_offset: u16::from_le_bytes(page[5..7].try_into().unwrap()),
        first_child: u32::from_le_bytes(page[7..11].try_into().unwrap()),
    }
}

pub fn write_interior_header(page: &mut [u8; PAGE_SIZE], header: InteriorHeader) {
    page[0] = PAGE_TYPE_INTERIOR;
    page[1..3].copy_from_slice(&header.num_records.to_le_bytes());
    page[3..5].copy_from_slice(&header.free_space.to_le_bytes());
    page[5..7].copy_from_slice(&header.free_space_offset.to_le_bytes());
    page[7..11].copy_from_slice(&header.first_child.to_le_bytes());
}

pub fn read_interior_entries(page: &[u8; PAGE_SIZE]) -> Vec<InteriorEntry> {
    let header = read_interior_header(page);
    let mut entries = Vec::with_capacity(header.num_records as usize);
    for i in 0..header.num_records as usize {
        let o = INTERIOR_HEADER_LEN + i * INTERIOR_SLOT_OVERHEAD;
        let offset = u16::from_le_bytes(page[o..o + 2].try_into().unwrap()) as usize;
        let length = u16::from_le_bytes(page[o + 2..o + 4].try_into().unwrap()) as usize;
        let child = u32::from_le_bytes(page[o + 4..o + 8].try_into().unwrap());
        let key = page[offset..offset + length].to_vec();
        entries.push(InteriorEntry { key, child });
    }
    entries
}

pub fn write_interior_entries(
    page: &mut [u8; PAGE_SIZE],
    first_child: u32,
    entries: &[InteriorEntry],
) -> Result<()> {
    let key_bytes: usize = entries.iter().map(|e| e.key.len()).sum();
    let needed = INTERIOR_HEADER_LEN + entries.len() * INTERIOR_SLOT_OVERHEAD + key_bytes;
    if needed > PAGE_SIZE {
        return Err(EngineError::capacity_unavailable(needed, PAGE_SIZE));
    }

    let mut fresh = [0u8; PAGE_SIZE];
    let mut cursor = PAGE_SIZE;
    for (i, entry) in entries.iter().enumerate() {
        cursor -= entry.key.len();
        fresh[cursor..cursor + entry.key.len()].copy_from_slice(&entry.key);
        let o = INTERIOR_HEADER_LEN + i * INTERIOR_SLOT_OVERHEAD;
        fresh[o..o + 2].copy_from_slice(&(cursor as u16).to_le_bytes());
        fresh[o + 2..o + 4].copy_from_slice(&(entry.key.len() as u16).to_le_bytes());
        fresh[o + 4..o + 8].copy_from_slice(&entry.child.to_le_bytes());
    }
    let dir_end = INTERIOR_HEADER_LEN + entries.len() * INTERIOR_SLOT_OVERHEAD;
    write_interior_header(
        &mut fresh,
        InteriorHeader {
            num_records: entries.len() as u16,
            free_space: (cursor - dir_end) as u16,
            free_space_offset: cursor as u16,
            first_child,
        },
    );
    *page = fresh;
    Ok(())
}
