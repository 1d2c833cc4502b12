/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Minimal query-executor surface layered directly on the RBFM/RM scan
//! contract: `Filter` and `Project`. No joins, no aggregation, no
//! optimizer -- those remain out of scope.

use crate::error::{EngineError, Result};
use crate::rbfm::RbfmScan;
use crate::rm::RmScan;
use crate::types::{Attribute, CompOp, Rid, Value};

/// Anything that yields `(Rid, Vec<Value>)` tuples one at a time,
/// exhausting to `None`. Implemented by [`RbfmScan`] and [`RmScan`].
pub trait TupleIterator {
    fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>>;
}

impl TupleIterator for RbfmScan {
    fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        RbfmScan::next_tuple(self)
    }
}

impl TupleIterator for RmScan {
    fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        RmScan::next_tuple(self)
    }
}

fn attr_index(descriptor: &[Attribute], name: &str) -> Result<usize> {
    descriptor
        .iter()
        .position(|a| a.name == name)
        .ok_or_else(|| EngineError::argument(format!("no such attribute: {}", name)))
}

/// Wraps any [`TupleIterator`] with a condition attribute, comparison
/// operator, and literal value, re-using [`CompOp::matches`] so the
/// same 1e-5 `Real` tolerance as RBFM's own scan applies here too.
pub struct Filter<I> {
    inner: I,
    condition_attr: usize,
    comp_op: CompOp,
    comp_value: Value,
}

impl<I: TupleIterator> Filter<I> {
    pub fn new(
        inner: I,
        descriptor: &[Attribute],
        condition_attribute: &str,
        comp_op: CompOp,
        comp_value: Value,
    ) -> Result<Self> {
        let condition_attr = attr_index(descriptor, condition_attribute)?;
        Ok(Self {
            inner,
            condition_attr,
            comp_op,
            comp_value,
        })
    }

    pub fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        loop {
            match self.inner.next_tuple()? {
                None => return Ok(None),
                Some((rid, values)) => {
                    if self.comp_op.matches(&values[self.condition_attr], &self.comp_value) {
                        return Ok(Some((rid, values)));
                    }
                }
            }
        }
    }
}

/// Re-orders/narrows a tuple's attributes according to a list of
/// names, reusing the descriptor-driven lookups RBFM already does for
/// read-attribute and scan projection.
pub struct Project<I> {
    inner: I,
    projection: Vec<usize>,
}

impl<I: TupleIterator> Project<I> {
    pub fn new(inner: I, descriptor: &[Attribute], projected_attributes: &[String]) -> Result<Self> {
        let projection = projected_attributes
            .iter()
            .map(|name| attr_index(descriptor, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { inner, projection })
    }

    pub fn next_tuple(&mut self) -> Result<Option<(Rid, Vec<Value>)>> {
        match self.inner.next_tuple()? {
            None => Ok(None),
            Some((rid, values)) => {
                let projected = self.projection.iter().map(|&i| values[i].clone()).collect();
                Ok(Some((rid, projected)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rm::RelationManager;
    use crate::types::AttrType;

    fn descriptor() -> Vec<Attribute> {
        vec![
            Attribute::new("id", AttrType::Int, 4),
            Attribute::new("name", AttrType::VarChar, 16),
        ]
    }

    #[test]
    fn filter_then_project() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("t", &descriptor()).unwrap();
        rm.insert_tuple("t", &[Value::Int(1), Value::VarChar("alice".into())])
            .unwrap();
        rm.insert_tuple("t", &[Value::Int(2), Value::VarChar("bob".into())])
            .unwrap();

        let scan = rm
            .scan(
                "t",
                None,
                CompOp::NoOp,
                Value::Null,
                &["id".to_string(), "name".to_string()],
            )
            .unwrap();
        let mut filtered = Filter::new(scan, &descriptor(), "id", CompOp::Ge, Value::Int(2)).unwrap();

        let mut rows = Vec::new();
        while let Some((_, values)) = filtered.next_tuple().unwrap() {
            rows.push(values);
        }
        assert_eq!(rows, vec![vec![Value::Int(2), Value::VarChar("bob".into())]]);
    }

    #[test]
    fn project_narrows_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("t", &descriptor()).unwrap();
        rm.insert_tuple("t", &[Value::Int(5), Value::VarChar("carol".into())])
            .unwrap();

        let scan = rm
            .scan(
                "t",
                None,
                CompOp::NoOp,
                Value::Null,
                &["id".to_string(), "name".to_string()],
            )
            .unwrap();
        let mut projected = Project::new(scan, &descriptor(), &["name".to_string()]).unwrap();

        let (_, values) = projected.next_tuple().unwrap().unwrap();
        assert_eq!(values, vec![Value::VarChar("carol".into())]);
    }
}
