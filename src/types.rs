/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Shared value types used across the paged file, record, index, and
//! relation managers.

use crate::error::{EngineError, Result};

/// Fixed page size used by every file this crate manages.
pub const PAGE_SIZE: usize = 4096;

/// Record identifier: a page number paired with a one-based slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_num: u32,
    pub slot_num: u32,
}

impl Rid {
    pub fn new(page_num: u32, slot_num: u32) -> Self {
        Self { page_num, slot_num }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Int,
    Real,
    VarChar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attr_type: AttrType,
    /// Maximum byte length for `VarChar`; ignored for `Int`/`Real`.
    pub length: u32,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attr_type: AttrType, length: u32) -> Self {
        Self {
            name: name.into(),
            attr_type,
            length,
        }
    }
}

/// A decoded attribute value, either present or SQL-null.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i32),
    Real(f32),
    VarChar(String),
}

impl Value {
    pub fn attr_type(&self) -> Option<AttrType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(AttrType::Int),
            Value::Real(_) => Some(AttrType::Real),
            Value::VarChar(_) => Some(AttrType::VarChar),
        }
    }

    /// Encode in the crate's external record format: fixed 4 bytes for
    /// `Int`/`Real`, 4-byte length prefix + bytes for `VarChar`.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Int(v) => v.to_le_bytes().to_vec(),
            Value::Real(v) => v.to_le_bytes().to_vec(),
            Value::VarChar(s) => {
                let bytes = s.as_bytes();
                let mut out = Vec::with_capacity(4 + bytes.len());
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
                out
            }
        }
    }

    pub fn decode(attr_type: AttrType, bytes: &[u8]) -> Result<Self> {
        match attr_type {
            AttrType::Int => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| EngineError::state("truncated Int value"))?;
                Ok(Value::Int(i32::from_le_bytes(arr)))
            }
            AttrType::Real => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| EngineError::state("truncated Real value"))?;
                Ok(Value::Real(f32::from_le_bytes(arr)))
            }
            AttrType::VarChar => {
                if bytes.len() < 4 {
                    return Err(EngineError::state("truncated VarChar length prefix"));
                }
                let len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
                let s = std::str::from_utf8(&bytes[4..4 + len])
                    .map_err(|_| EngineError::state("VarChar is not valid utf-8"))?;
                Ok(Value::VarChar(s.to_string()))
            }
        }
    }

    /// Real equality is defined with an absolute tolerance of 1e-5;
    /// every other comparison is exact.
    pub fn approx_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => (a - b).abs() < 1e-5,
            (Value::VarChar(a), Value::VarChar(b)) => a == b,
            _ => false,
        }
    }

    fn partial_compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::VarChar(a), Value::VarChar(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Total ordering used for index keys: `Real` collapses to `Equal`
    /// within the 1e-5 tolerance, matching [`Value::approx_eq`].
    pub fn cmp_key(&self, other: &Value) -> std::cmp::Ordering {
        if self.approx_eq(other) {
            return std::cmp::Ordering::Equal;
        }
        self.partial_compare(other)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
    NoOp,
}

impl CompOp {
    /// Evaluate `lhs <op> rhs`. `NoOp` always matches; a `Null` on
    /// either side also always matches (mirrors the original project's
    /// "no condition value supplied" behavior).
    pub fn matches(self, lhs: &Value, rhs: &Value) -> bool {
        if self == CompOp::NoOp || matches!(lhs, Value::Null) || matches!(rhs, Value::Null) {
            return true;
        }
        match self {
            CompOp::Eq => lhs.approx_eq(rhs),
            CompOp::Ne => !lhs.approx_eq(rhs),
            CompOp::Lt => lhs.partial_compare(rhs) == Some(std::cmp::Ordering::Less),
            CompOp::Gt => lhs.partial_compare(rhs) == Some(std::cmp::Ordering::Greater),
            CompOp::Le => matches!(
                lhs.partial_compare(rhs),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ) || lhs.approx_eq(rhs),
            CompOp::Ge => matches!(
                lhs.partial_compare(rhs),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ) || lhs.approx_eq(rhs),
            CompOp::NoOp => true,
        }
    }
}
