//! End-to-end scenarios spanning multiple managers (PFM+RBFM, IX, and
//! RM layered on both), mirroring the scenario list of the storage
//! engine's design spec.

use ledgerbase::ix::IndexManager;
use ledgerbase::pfm::PagedFileManager;
use ledgerbase::rbfm::RecordBasedFileManager;
use ledgerbase::rm::RelationManager;
use ledgerbase::{AttrType, Attribute, CompOp, Rid, Value};

/// `RUST_LOG=debug cargo test -- --nocapture` surfaces the `log::debug!`/
/// `trace!` instrumentation at split/reorg/tombstone-chase sites.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn basic_descriptor() -> Vec<Attribute> {
    vec![
        Attribute::new("id", AttrType::Int, 4),
        Attribute::new("name", AttrType::VarChar, 20),
    ]
}

/// Scenario A -- RBFM basic insert/read/delete.
#[test]
fn scenario_a_rbfm_basic() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.tbl");
    let pfm = PagedFileManager::new();
    let rbfm = RecordBasedFileManager::new(pfm);
    rbfm.create_file(&path).unwrap();
    let mut file = rbfm.open_file(&path).unwrap();

    let descriptor = basic_descriptor();
    let values = vec![Value::Int(1), Value::VarChar("alice".to_string())];
    let rid = file.insert_record(&descriptor, &values).unwrap();
    assert_eq!(rid, Rid::new(0, 1));

    let read_back = file.read_record(&descriptor, rid).unwrap();
    assert_eq!(read_back, values);

    file.delete_record(rid).unwrap();
    assert!(file.read_record(&descriptor, rid).is_err());

    rbfm.close_file(file).unwrap();
}

/// Scenario B -- update that outgrows its slot relocates via a
/// tombstone, and the original RID still resolves to the new value.
#[test]
fn scenario_b_update_relocation() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("b.tbl");
    let pfm = PagedFileManager::new();
    let rbfm = RecordBasedFileManager::new(pfm);
    rbfm.create_file(&path).unwrap();
    let mut file = rbfm.open_file(&path).unwrap();

    let descriptor = vec![
        Attribute::new("id", AttrType::Int, 4),
        Attribute::new("note", AttrType::VarChar, 10),
    ];
    let rid = file
        .insert_record(&descriptor, &[Value::Int(1), Value::VarChar("a".to_string())])
        .unwrap();
    assert_eq!(rid, Rid::new(0, 1));

    file.update_record(
        &descriptor,
        rid,
        &[Value::Int(1), Value::VarChar("aaaaaaaaaa".to_string())],
    )
    .unwrap();

    let values = file.read_record(&descriptor, rid).unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::VarChar("aaaaaaaaaa".to_string())]);

    rbfm.close_file(file).unwrap();
}

/// Scenario C -- delete, reorganize, and reuse freed capacity while
/// keeping other RIDs stable.
#[test]
fn scenario_c_page_reorganization() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.tbl");
    let pfm = PagedFileManager::new();
    let rbfm = RecordBasedFileManager::new(pfm);
    rbfm.create_file(&path).unwrap();
    let mut file = rbfm.open_file(&path).unwrap();

    let descriptor = vec![
        Attribute::new("id", AttrType::Int, 4),
        Attribute::new("note", AttrType::VarChar, 16),
    ];
    let mut rids = Vec::new();
    for i in 0..5 {
        let rid = file
            .insert_record(&descriptor, &[Value::Int(i), Value::VarChar(format!("n{i}"))])
            .unwrap();
        rids.push(rid);
    }

    file.delete_record(rids[0]).unwrap();
    assert!(file.read_record(&descriptor, rids[0]).is_err());

    file.reorganize_page(0).unwrap();
    assert!(file.read_record(&descriptor, rids[0]).is_err());

    // Surviving RIDs are unaffected by the reorganization.
    for (i, &rid) in rids.iter().enumerate().skip(1) {
        let values = file.read_record(&descriptor, rid).unwrap();
        assert_eq!(values, vec![Value::Int(i as i32), Value::VarChar(format!("n{i}"))]);
    }

    let new_rid = file
        .insert_record(&descriptor, &[Value::Int(99), Value::VarChar("fresh".to_string())])
        .unwrap();
    assert_eq!(file.page_count().unwrap(), 1);
    let values = file.read_record(&descriptor, new_rid).unwrap();
    assert_eq!(values, vec![Value::Int(99), Value::VarChar("fresh".to_string())]);

    rbfm.close_file(file).unwrap();
}

/// Scenario D -- enough inserts to force the B+-tree root to split,
/// with every key remaining findable afterwards.
#[test]
fn scenario_d_btree_split() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d.idx");
    let pfm = PagedFileManager::new();
    let ix = IndexManager::new(pfm);
    ix.create_file(&path).unwrap();
    let mut handle = ix.open_file(&path, AttrType::Int).unwrap();

    for k in 1..275 {
        handle.insert_entry(&Value::Int(k), Rid::new(0, k as u32)).unwrap();
    }

    for k in 1..275 {
        assert_eq!(handle.lookup(&Value::Int(k)).unwrap(), Some(Rid::new(0, k as u32)));
    }
    assert_eq!(handle.lookup(&Value::Int(0)).unwrap(), None);
    assert_eq!(handle.lookup(&Value::Int(276)).unwrap(), None);

    ix.close_file(handle).unwrap();
}

/// Scenario E -- bounded range scan over a tree that has split
/// several times.
#[test]
fn scenario_e_scan_range() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("e.idx");
    let pfm = PagedFileManager::new();
    let ix = IndexManager::new(pfm);
    ix.create_file(&path).unwrap();
    let mut handle = ix.open_file(&path, AttrType::Int).unwrap();

    for k in 1..275 {
        handle.insert_entry(&Value::Int(k), Rid::new(0, k as u32)).unwrap();
    }

    let mut scan = handle.scan(Some(Value::Int(100)), true, Some(Value::Int(200)), false).unwrap();
    let mut keys = Vec::new();
    while let Some((key, _rid)) = scan.next_entry().unwrap() {
        keys.push(key);
    }
    drop(scan);

    assert_eq!(keys.len(), 100);
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(*key, Value::Int(100 + i as i32));
    }

    ix.close_file(handle).unwrap();
}

/// Scenario F -- the catalog survives a close/reopen cycle.
#[test]
fn scenario_f_catalog_reload() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let descriptor = vec![
        Attribute::new("a", AttrType::Int, 4),
        Attribute::new("b", AttrType::VarChar, 8),
    ];
    {
        let rm = RelationManager::new(dir.path()).unwrap();
        rm.create_table("T", &descriptor).unwrap();
        rm.insert_tuple("T", &[Value::Int(1), Value::VarChar("x".to_string())])
            .unwrap();
        rm.insert_tuple("T", &[Value::Int(2), Value::VarChar("y".to_string())])
            .unwrap();
        rm.insert_tuple("T", &[Value::Int(3), Value::VarChar("z".to_string())])
            .unwrap();
    }

    let rm = RelationManager::new(dir.path()).unwrap();
    assert_eq!(rm.get_attributes("T").unwrap(), descriptor);

    let mut scan = rm
        .scan("T", None, CompOp::NoOp, Value::Null, &["a".to_string(), "b".to_string()])
        .unwrap();
    let mut rows = Vec::new();
    while let Some((_, values)) = scan.next_tuple().unwrap() {
        rows.push(values);
    }
    scan.close().unwrap();
    assert_eq!(rows.len(), 3);

    // Creating one more table advances TABLE_ID_COUNTER strictly past
    // whatever the largest TableId seen in `tables` was.
    rm.create_table("U", &descriptor).unwrap();
    let rid = rm
        .insert_tuple("U", &[Value::Int(10), Value::VarChar("w".to_string())])
        .unwrap();
    assert_eq!(rm.read_tuple("U", rid).unwrap(), vec![Value::Int(10), Value::VarChar("w".to_string())]);
}

/// A table with an index stays consistent across insert/update/delete
/// and after an index is destroyed and recreated.
#[test]
fn index_tracks_tuple_mutations() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let descriptor = vec![
        Attribute::new("k", AttrType::Int, 4),
        Attribute::new("v", AttrType::VarChar, 8),
    ];
    let rm = RelationManager::new(dir.path()).unwrap();
    rm.create_table("T", &descriptor).unwrap();
    let rid = rm
        .insert_tuple("T", &[Value::Int(1), Value::VarChar("a".to_string())])
        .unwrap();
    rm.create_index("T", "k").unwrap();

    rm.update_tuple("T", rid, &[Value::Int(2), Value::VarChar("a".to_string())])
        .unwrap();
    rm.delete_tuple("T", rid).unwrap();

    rm.destroy_index("T", "k").unwrap();
    rm.create_index("T", "k").unwrap();
}
