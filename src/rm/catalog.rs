/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Fixed descriptors for the three system catalog tables.

use crate::types::{AttrType, Attribute};

pub const TABLES_TABLE: &str = "tables";
pub const COLUMNS_TABLE: &str = "columns";
pub const INDICES_TABLE: &str = "indices";

pub fn is_system_table(name: &str) -> bool {
    matches!(name, TABLES_TABLE | COLUMNS_TABLE | INDICES_TABLE)
}

pub fn tables_descriptor() -> Vec<Attribute> {
    vec![
        Attribute::new("TableId", AttrType::Int, 4),
        Attribute::new("TableName", AttrType::VarChar, 50),
        Attribute::new("TableType", AttrType::VarChar, 50),
        Attribute::new("FileName", AttrType::VarChar, 50),
        Attribute::new("NumOfColumns", AttrType::Int, 4),
    ]
}

pub fn columns_descriptor() -> Vec<Attribute> {
    vec![
        Attribute::new("TableId", AttrType::Int, 4),
        Attribute::new("TableName", AttrType::VarChar, 50),
        Attribute::new("ColumnName", AttrType::VarChar, 50),
        Attribute::new("ColumnType", AttrType::VarChar, 20),
        Attribute::new("ColumnPosition", AttrType::Int, 4),
        Attribute::new("MaxLength", AttrType::Int, 4),
    ]
}

pub fn indices_descriptor() -> Vec<Attribute> {
    vec![
        Attribute::new("TableId", AttrType::Int, 4),
        Attribute::new("TableName", AttrType::VarChar, 50),
        Attribute::new("ColumnPosition", AttrType::Int, 4),
        Attribute::new("ColumnName", AttrType::VarChar, 50),
    ]
}

pub fn attr_type_name(attr_type: AttrType) -> &'static str {
    match attr_type {
        AttrType::Int => "Int",
        AttrType::Real => "Real",
        AttrType::VarChar => "VarChar",
    }
}

pub fn attr_type_from_name(name: &str) -> Option<AttrType> {
    match name {
        "Int" => Some(AttrType::Int),
        "Real" => Some(AttrType::Real),
        "VarChar" => Some(AttrType::VarChar),
        _ => None,
    }
}
