/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Relation manager: three system catalogs (`tables`, `columns`,
//! `indices`) stored as ordinary RBFM tables, plus DDL/DML that
//! delegates to [`crate::rbfm`] and [`crate::ix`] and keeps
//! name/position -> RID caches so catalog lookups never rescan disk.

pub mod catalog;

use crate::error::{EngineError, Result};
use crate::ix::IndexManager;
use crate::pfm::PagedFileManager;
use crate::rbfm::{RbfmScan, RecordBasedFileManager};
use crate::types::{Attribute, CompOp, Rid, Value};
use catalog::{
    attr_type_name, columns_descriptor, indices_descriptor, is_system_table, tables_descriptor,
    COLUMNS_TABLE, INDICES_TABLE, TABLES_TABLE,
};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct ColumnEntry {
    attribute: Attribute,
    rid: Rid,
}

#[derive(Debug, Clone)]
struct TableEntry {
    table_id: i32,
    table_rid: Rid,
    columns: Vec<ColumnEntry>,
    /// Column position (1-based) -> that index's row RID in `indices`.
    indices: HashMap<u32, Rid>,
}

#[derive(Default)]
struct CatalogState {
    next_table_id: i32,
    tables: HashMap<String, TableEntry>,
}

/// Process-wide catalog and DDL/DML entry point, threaded explicitly
/// through an owning directory handle rather than a global singleton.
#[derive(Clone)]
pub struct RelationManager {
    rbfm: RecordBasedFileManager,
    ix: IndexManager,
    dir: PathBuf,
    state: Arc<Mutex<CatalogState>>,
}

/// A relation-manager scan: an RBFM scan plus the file handle needed
/// to close the underlying table file when the caller is done.
pub struct RmScan {
    rbfm: RecordBasedFileManager,
    inner: RbfmScan,
}

impl RmScan {
    pub fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        self.inner.next_tuple()
    }

    pub fn close(self) -> Result<()> {
        self.rbfm.close_file(self.inner.into_handle())
    }
}

fn all_attribute_names(descriptor: &[Attribute]) -> Vec<String> {
    descriptor.iter().map(|a| a.name.clone()).collect()
}

impl RelationManager {
    /// Opens (or bootstraps) the catalog rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let pfm = PagedFileManager::new();
        let rm = Self {
            rbfm: RecordBasedFileManager::new(pfm.clone()),
            ix: IndexManager::new(pfm),
            dir,
            state: Arc::new(Mutex::new(CatalogState {
                next_table_id: 1,
                tables: HashMap::new(),
            })),
        };
        if rm.table_path(TABLES_TABLE).exists() {
            rm.load_system()?;
        } else {
            rm.bootstrap_system()?;
        }
        Ok(rm)
    }

    fn table_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{}.tbl", table_name))
    }

    fn index_path(&self, table_name: &str, attr_name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.idx", table_name, attr_name))
    }

    fn guard_user_table(&self, table_name: &str) -> Result<()> {
        if is_system_table(table_name) {
            return Err(EngineError::argument(format!(
                "cannot mutate system table {} through the tuple API",
                table_name
            )));
        }
        Ok(())
    }

    fn table_meta(&self, table_name: &str) -> Result<(Vec<Attribute>, HashMap<u32, Rid>)> {
        let state = self.state.lock().unwrap();
        let entry = state
            .tables
            .get(table_name)
            .ok_or_else(|| EngineError::argument(format!("no such table: {}", table_name)))?;
        Ok((
            entry.columns.iter().map(|c| c.attribute.clone()).collect(),
            entry.indices.clone(),
        ))
    }

    fn bootstrap_system(&self) -> Result<()> {
        self.create_table_internal(TABLES_TABLE, &tables_descriptor(), "System")?;
        self.create_table_internal(COLUMNS_TABLE, &columns_descriptor(), "System")?;
        self.create_table_internal(INDICES_TABLE, &indices_descriptor(), "System")?;
        Ok(())
    }

    /// Rebuilds the in-memory catalog caches from the three system
    /// tables already on disk, and sets `next_table_id` to one past
    /// the largest TableId seen.
    fn load_system(&self) -> Result<()> {
        let mut tables_by_name: HashMap<String, TableEntry> = HashMap::new();
        let mut id_to_name: HashMap<i32, String> = HashMap::new();
        let mut max_id = 0i32;

        let tables_file = self.rbfm.open_file(self.table_path(TABLES_TABLE))?;
        let descriptor = tables_descriptor();
        let names = all_attribute_names(&descriptor);
        let mut scan = RbfmScan::new(tables_file, descriptor, None, CompOp::NoOp, Value::Null, &names)?;
        while let Some((rid, values)) = scan.next_tuple()? {
            let table_id = match values[0] {
                Value::Int(v) => v,
                _ => return Err(EngineError::state("tables.TableId is not an Int")),
            };
            let table_name = match &values[1] {
                Value::VarChar(s) => s.clone(),
                _ => return Err(EngineError::state("tables.TableName is not a VarChar")),
            };
            max_id = max_id.max(table_id);
            id_to_name.insert(table_id, table_name.clone());
            tables_by_name.insert(
                table_name,
                TableEntry {
                    table_id,
                    table_rid: rid,
                    columns: Vec::new(),
                    indices: HashMap::new(),
                },
            );
        }
        self.rbfm.close_file(scan.into_handle())?;

        let mut columns_by_id: HashMap<i32, Vec<(i32, ColumnEntry)>> = HashMap::new();
        let columns_file = self.rbfm.open_file(self.table_path(COLUMNS_TABLE))?;
        let descriptor = columns_descriptor();
        let names = all_attribute_names(&descriptor);
        let mut scan = RbfmScan::new(columns_file, descriptor, None, CompOp::NoOp, Value::Null, &names)?;
        while let Some((rid, values)) = scan.next_tuple()? {
            let table_id = match values[0] {
                Value::Int(v) => v,
                _ => return Err(EngineError::state("columns.TableId is not an Int")),
            };
            let column_name = match &values[2] {
                Value::VarChar(s) => s.clone(),
                _ => return Err(EngineError::state("columns.ColumnName is not a VarChar")),
            };
            let column_type = match &values[3] {
                Value::VarChar(s) => catalog::attr_type_from_name(s)
                    .ok_or_else(|| EngineError::state(format!("unknown column type {}", s)))?,
                _ => return Err(EngineError::state("columns.ColumnType is not a VarChar")),
            };
            let position = match values[4] {
                Value::Int(v) => v,
                _ => return Err(EngineError::state("columns.ColumnPosition is not an Int")),
            };
            let max_length = match values[5] {
                Value::Int(v) => v as u32,
                _ => return Err(EngineError::state("columns.MaxLength is not an Int")),
            };
            columns_by_id.entry(table_id).or_default().push((
                position,
                ColumnEntry {
                    attribute: Attribute::new(column_name, column_type, max_length),
                    rid,
                },
            ));
        }
        self.rbfm.close_file(scan.into_handle())?;

        for (table_id, mut cols) in columns_by_id {
            cols.sort_by_key(|(pos, _)| *pos);
            if let Some(name) = id_to_name.get(&table_id) {
                if let Some(entry) = tables_by_name.get_mut(name) {
                    entry.columns = cols.into_iter().map(|(_, c)| c).collect();
                }
            }
        }

        let indices_file = self.rbfm.open_file(self.table_path(INDICES_TABLE))?;
        let descriptor = indices_descriptor();
        let names = all_attribute_names(&descriptor);
        let mut scan = RbfmScan::new(indices_file, descriptor, None, CompOp::NoOp, Value::Null, &names)?;
        while let Some((rid, values)) = scan.next_tuple()? {
            let table_id = match values[0] {
                Value::Int(v) => v,
                _ => return Err(EngineError::state("indices.TableId is not an Int")),
            };
            let position = match values[2] {
                Value::Int(v) => v as u32,
                _ => return Err(EngineError::state("indices.ColumnPosition is not an Int")),
            };
            if let Some(name) = id_to_name.get(&table_id) {
                if let Some(entry) = tables_by_name.get_mut(name) {
                    entry.indices.insert(position, rid);
                }
            }
        }
        self.rbfm.close_file(scan.into_handle())?;

        let mut state = self.state.lock().unwrap();
        state.next_table_id = max_id + 1;
        state.tables = tables_by_name;
        debug!(
            "loaded catalog: {} tables, next_table_id={}",
            state.tables.len(),
            state.next_table_id
        );
        Ok(())
    }

    /// Shared by [`Self::bootstrap_system`] (for the three system
    /// tables) and [`Self::create_table`] (for user tables). Mirrors
    /// the original project's `createTableHelper` special-casing:
    /// creating `tables` also creates the (not-yet-populated)
    /// `columns` file, since every table's column rows -- including
    /// `columns`'s own -- must land somewhere.
    fn create_table_internal(&self, name: &str, attrs: &[Attribute], table_type: &str) -> Result<()> {
        let file_name = format!("{}.tbl", name);
        if name != COLUMNS_TABLE {
            self.rbfm.create_file(self.dir.join(&file_name))?;
        }
        if name == TABLES_TABLE {
            self.rbfm
                .create_file(self.dir.join(format!("{}.tbl", COLUMNS_TABLE)))?;
        }

        let table_id = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_table_id;
            state.next_table_id += 1;
            id
        };

        let mut tables_file = self.rbfm.open_file(self.table_path(TABLES_TABLE))?;
        let table_row = vec![
            Value::Int(table_id),
            Value::VarChar(name.to_string()),
            Value::VarChar(table_type.to_string()),
            Value::VarChar(file_name.clone()),
            Value::Int(attrs.len() as i32),
        ];
        let table_rid = tables_file.insert_record(&tables_descriptor(), &table_row)?;
        self.rbfm.close_file(tables_file)?;

        let mut columns_file = self.rbfm.open_file(self.table_path(COLUMNS_TABLE))?;
        let mut columns = Vec::with_capacity(attrs.len());
        for (i, attr) in attrs.iter().enumerate() {
            let position = (i + 1) as i32;
            let row = vec![
                Value::Int(table_id),
                Value::VarChar(name.to_string()),
                Value::VarChar(attr.name.clone()),
                Value::VarChar(attr_type_name(attr.attr_type).to_string()),
                Value::Int(position),
                Value::Int(attr.length as i32),
            ];
            let rid = columns_file.insert_record(&columns_descriptor(), &row)?;
            columns.push(ColumnEntry {
                attribute: attr.clone(),
                rid,
            });
        }
        self.rbfm.close_file(columns_file)?;

        debug!("created table {} (id={})", name, table_id);
        let mut state = self.state.lock().unwrap();
        state.tables.insert(
            name.to_string(),
            TableEntry {
                table_id,
                table_rid,
                columns,
                indices: HashMap::new(),
            },
        );
        Ok(())
    }

    pub fn create_table(&self, name: &str, attrs: &[Attribute]) -> Result<()> {
        if is_system_table(name) {
            return Err(EngineError::argument(format!(
                "cannot create reserved system table {}",
                name
            )));
        }
        {
            let state = self.state.lock().unwrap();
            if state.tables.contains_key(name) {
                return Err(EngineError::argument(format!("table {} already exists", name)));
            }
        }
        self.create_table_internal(name, attrs, "User")
    }

    pub fn delete_table(&self, name: &str) -> Result<()> {
        if is_system_table(name) {
            return Err(EngineError::argument(format!(
                "cannot delete system table {}",
                name
            )));
        }
        let entry = {
            let mut state = self.state.lock().unwrap();
            state
                .tables
                .remove(name)
                .ok_or_else(|| EngineError::argument(format!("no such table: {}", name)))?
        };

        for (&position, &index_rid) in entry.indices.iter() {
            let attr = &entry.columns[position as usize - 1].attribute;
            self.ix.destroy_file(self.index_path(name, &attr.name))?;
            let mut indices_file = self.rbfm.open_file(self.table_path(INDICES_TABLE))?;
            indices_file.delete_record(index_rid)?;
            self.rbfm.close_file(indices_file)?;
        }

        let mut columns_file = self.rbfm.open_file(self.table_path(COLUMNS_TABLE))?;
        for col in &entry.columns {
            columns_file.delete_record(col.rid)?;
        }
        self.rbfm.close_file(columns_file)?;

        let mut tables_file = self.rbfm.open_file(self.table_path(TABLES_TABLE))?;
        tables_file.delete_record(entry.table_rid)?;
        self.rbfm.close_file(tables_file)?;

        self.rbfm.destroy_file(self.table_path(name))?;
        debug!("deleted table {}", name);
        Ok(())
    }

    pub fn get_attributes(&self, table_name: &str) -> Result<Vec<Attribute>> {
        let state = self.state.lock().unwrap();
        let entry = state
            .tables
            .get(table_name)
            .ok_or_else(|| EngineError::argument(format!("no such table: {}", table_name)))?;
        Ok(entry.columns.iter().map(|c| c.attribute.clone()).collect())
    }

    pub fn insert_tuple(&self, table_name: &str, values: &[Value]) -> Result<Rid> {
        self.guard_user_table(table_name)?;
        let (descriptor, indices) = self.table_meta(table_name)?;

        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        let rid = file.insert_record(&descriptor, values)?;
        self.rbfm.close_file(file)?;

        for (&position, _) in indices.iter() {
            let attr = &descriptor[position as usize - 1];
            let mut idx = self
                .ix
                .open_file(self.index_path(table_name, &attr.name), attr.attr_type)?;
            idx.insert_entry(&values[position as usize - 1], rid)?;
            self.ix.close_file(idx)?;
        }
        Ok(rid)
    }

    pub fn delete_tuple(&self, table_name: &str, rid: Rid) -> Result<()> {
        self.guard_user_table(table_name)?;
        let (descriptor, indices) = self.table_meta(table_name)?;

        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        let old_values = if indices.is_empty() {
            None
        } else {
            Some(file.read_record(&descriptor, rid)?)
        };
        file.delete_record(rid)?;
        self.rbfm.close_file(file)?;

        if let Some(old_values) = old_values {
            for (&position, _) in indices.iter() {
                let attr = &descriptor[position as usize - 1];
                let mut idx = self
                    .ix
                    .open_file(self.index_path(table_name, &attr.name), attr.attr_type)?;
                idx.delete_entry(&old_values[position as usize - 1], rid)?;
                self.ix.close_file(idx)?;
            }
        }
        Ok(())
    }

    pub fn update_tuple(&self, table_name: &str, rid: Rid, values: &[Value]) -> Result<()> {
        self.guard_user_table(table_name)?;
        let (descriptor, indices) = self.table_meta(table_name)?;

        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        let old_values = if indices.is_empty() {
            None
        } else {
            Some(file.read_record(&descriptor, rid)?)
        };
        file.update_record(&descriptor, rid, values)?;
        self.rbfm.close_file(file)?;

        if let Some(old_values) = old_values {
            for (&position, _) in indices.iter() {
                let idx_pos = position as usize - 1;
                if !old_values[idx_pos].approx_eq(&values[idx_pos]) {
                    let attr = &descriptor[idx_pos];
                    let mut idx = self
                        .ix
                        .open_file(self.index_path(table_name, &attr.name), attr.attr_type)?;
                    idx.delete_entry(&old_values[idx_pos], rid)?;
                    idx.insert_entry(&values[idx_pos], rid)?;
                    self.ix.close_file(idx)?;
                }
            }
        }
        Ok(())
    }

    pub fn read_tuple(&self, table_name: &str, rid: Rid) -> Result<Vec<Value>> {
        let descriptor = self.get_attributes(table_name)?;
        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        let values = file.read_record(&descriptor, rid)?;
        self.rbfm.close_file(file)?;
        Ok(values)
    }

    pub fn read_attribute(&self, table_name: &str, rid: Rid, attribute_name: &str) -> Result<Value> {
        let descriptor = self.get_attributes(table_name)?;
        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        let value = file.read_attribute(&descriptor, rid, attribute_name)?;
        self.rbfm.close_file(file)?;
        Ok(value)
    }

    pub fn reorganize_page(&self, table_name: &str, page_num: u32) -> Result<()> {
        let mut file = self.rbfm.open_file(self.table_path(table_name))?;
        file.reorganize_page(page_num)?;
        self.rbfm.close_file(file)?;
        Ok(())
    }

    pub fn scan(
        &self,
        table_name: &str,
        condition_attribute: Option<&str>,
        comp_op: CompOp,
        comp_value: Value,
        projected_attributes: &[String],
    ) -> Result<RmScan> {
        let descriptor = self.get_attributes(table_name)?;
        let handle = self.rbfm.open_file(self.table_path(table_name))?;
        let inner = RbfmScan::new(
            handle,
            descriptor,
            condition_attribute,
            comp_op,
            comp_value,
            projected_attributes,
        )?;
        Ok(RmScan {
            rbfm: self.rbfm.clone(),
            inner,
        })
    }

    pub fn create_index(&self, table_name: &str, attribute_name: &str) -> Result<()> {
        let (table_id, descriptor, position, already_indexed) = {
            let state = self.state.lock().unwrap();
            let entry = state
                .tables
                .get(table_name)
                .ok_or_else(|| EngineError::argument(format!("no such table: {}", table_name)))?;
            let position = entry
                .columns
                .iter()
                .position(|c| c.attribute.name == attribute_name)
                .ok_or_else(|| {
                    EngineError::argument(format!(
                        "no such attribute {} on {}",
                        attribute_name, table_name
                    ))
                })? as u32
                + 1;
            (
                entry.table_id,
                entry.columns.iter().map(|c| c.attribute.clone()).collect::<Vec<_>>(),
                position,
                entry.indices.contains_key(&position),
            )
        };
        if already_indexed {
            return Err(EngineError::argument(format!(
                "index already exists on {}.{}",
                table_name, attribute_name
            )));
        }
        let attr = descriptor[position as usize - 1].clone();

        self.ix.create_file(self.index_path(table_name, attribute_name))?;

        let mut indices_file = self.rbfm.open_file(self.table_path(INDICES_TABLE))?;
        let row = vec![
            Value::Int(table_id),
            Value::VarChar(table_name.to_string()),
            Value::Int(position as i32),
            Value::VarChar(attribute_name.to_string()),
        ];
        let index_rid = indices_file.insert_record(&indices_descriptor(), &row)?;
        self.rbfm.close_file(indices_file)?;

        {
            let mut state = self.state.lock().unwrap();
            state
                .tables
                .get_mut(table_name)
                .unwrap()
                .indices
                .insert(position, index_rid);
        }

        let data_file = self.rbfm.open_file(self.table_path(table_name))?;
        let mut scan = RbfmScan::new(
            data_file,
            descriptor,
            None,
            CompOp::NoOp,
            Value::Null,
            &[attribute_name.to_string()],
        )?;
        let mut entries = Vec::new();
        while let Some((rid, mut values)) = scan.next_tuple()? {
            entries.push((rid, values.remove(0)));
        }
        self.rbfm.close_file(scan.into_handle())?;

        let mut idx = self
            .ix
            .open_file(self.index_path(table_name, attribute_name), attr.attr_type)?;
        for (rid, key) in entries {
            idx.insert_entry(&key, rid)?;
        }
        self.ix.close_file(idx)?;

        debug!("created index {}.{}", table_name, attribute_name);
        Ok(())
    }

    pub fn destroy_index(&self, table_name: &str, attribute_name: &str) -> Result<()> {
        let (position, index_rid) = {
            let state = self.state.lock().unwrap();
            let entry = state
                .tables
                .get(table_name)
                .ok_or_else(|| EngineError::argument(format!("no such table: {}", table_name)))?;
            let position = entry
                .columns
                .iter()
                .position(|c| c.attribute.name == attribute_name)
                .map(|p| p as u32 + 1)
                .ok_or_else(|| {
                    EngineError::argument(format!(
                        "no such attribute {} on {}",
                        attribute_name, table_name
                    ))
                })?;
            let rid = *entry.indices.get(&position).ok_or_else(|| {
                EngineError::argument(format!("no index on {}.{}", table_name, attribute_name))
            })?;
            (position, rid)
        };

        self.ix.destroy_file(self.index_path(table_name, attribute_name))?;

        let mut indices_file = self.rbfm.open_file(self.table_path(INDICES_TABLE))?;
        indices_file.delete_record(index_rid)?;
        self.rbfm.close_file(indices_file)?;

        let mut state = self.state.lock().unwrap();
        state.tables.get_mut(table_name).unwrap().indices.remove(&position);
        debug!("destroyed index {}.{}", table_name, attribute_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttrType;

    fn descriptor() -> Vec<Attribute> {
        vec![
            Attribute::new("a", AttrType::Int, 4),
            Attribute::new("b", AttrType::VarChar, 8),
        ]
    }

    #[test]
    fn create_table_insert_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("t", &descriptor()).unwrap();

        let rid = rm
            .insert_tuple("t", &[Value::Int(1), Value::VarChar("hi".to_string())])
            .unwrap();
        let values = rm.read_tuple("t", rid).unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::VarChar("hi".to_string())]);

        assert_eq!(rm.read_attribute("t", rid, "a").unwrap(), Value::Int(1));
        assert_eq!(
            rm.read_attribute("t", rid, "b").unwrap(),
            Value::VarChar("hi".to_string())
        );
    }

    #[test]
    fn system_table_mutation_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        let err = rm.insert_tuple("tables", &[]);
        assert!(err.is_err());
    }

    #[test]
    fn create_table_with_reserved_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        assert!(rm.create_table("columns", &descriptor()).is_err());
    }

    #[test]
    fn scan_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("t", &descriptor()).unwrap();
        rm.insert_tuple("t", &[Value::Int(1), Value::VarChar("a".to_string())])
            .unwrap();
        rm.insert_tuple("t", &[Value::Int(2), Value::VarChar("b".to_string())])
            .unwrap();

        let mut scan = rm
            .scan("t", None, CompOp::NoOp, Value::Null, &["a".to_string(), "b".to_string()])
            .unwrap();
        let mut seen = Vec::new();
        while let Some((rid, values)) = scan.next_tuple().unwrap() {
            seen.push((rid, values));
        }
        scan.close().unwrap();
        assert_eq!(seen.len(), 2);

        rm.delete_tuple("t", seen[0].0).unwrap();
        assert!(rm.read_tuple("t", seen[0].0).is_err());
    }

    #[test]
    fn index_insert_and_lookup_via_scan_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("t", &descriptor()).unwrap();
        let rid1 = rm
            .insert_tuple("t", &[Value::Int(10), Value::VarChar("x".to_string())])
            .unwrap();
        rm.create_index("t", "a").unwrap();

        let rid2 = rm
            .insert_tuple("t", &[Value::Int(20), Value::VarChar("y".to_string())])
            .unwrap();

        rm.update_tuple("t", rid1, &[Value::Int(11), Value::VarChar("x".to_string())])
            .unwrap();
        rm.delete_tuple("t", rid2).unwrap();

        rm.destroy_index("t", "a").unwrap();
    }

    #[test]
    fn reload_catalog_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let rm = RelationManager::new(dir.path()).unwrap();
            rm.create_table("t", &descriptor()).unwrap();
            rm.insert_tuple("t", &[Value::Int(1), Value::VarChar("a".to_string())])
                .unwrap();
            rm.insert_tuple("t", &[Value::Int(2), Value::VarChar("b".to_string())])
                .unwrap();
            rm.insert_tuple("t", &[Value::Int(3), Value::VarChar("c".to_string())])
                .unwrap();
        }

        let rm = RelationManager::new(dir.path()).unwrap();
        assert_eq!(rm.get_attributes("t").unwrap(), descriptor());

        let mut scan = rm
            .scan("t", None, CompOp::NoOp, Value::Null, &["a".to_string()])
            .unwrap();
        let mut count = 0;
        while scan.next_tuple().unwrap().is_some() {
            count += 1;
        }
        scan.close().unwrap();
        assert_eq!(count, 3);
    }
}
