// Query Processing Integration Tests
//
// Record pages, table scans, the catalog and the planner working together.

use std::sync::Arc;
use anyhow::Result;

use amberdb::query::executor::operators::{ProductScan, Scan, TableScan, UpdateScan};
use amberdb::query::planner::{Plan, TablePlan};
use amberdb::query::{Constant, ExecutionResult, QueryError, QueryResultSet};
use amberdb::record::{Layout, RecordError, RecordPage, Schema};
use amberdb::{Database, DatabaseError};

#[path = "../common/mod.rs"]
mod common;

use common::{create_test_db, insert_students, student_names, student_schema};

const STUDENTS: [(i32, &str, i32, i32); 9] = [
    (1, "joe", 10, 2021),
    (2, "amy", 20, 2020),
    (3, "max", 10, 2022),
    (4, "sue", 20, 2022),
    (5, "bob", 30, 2020),
    (6, "kim", 20, 2020),
    (7, "art", 30, 2021),
    (8, "pat", 20, 2019),
    (9, "lee", 10, 2021),
];

const EXAMS: [(i32, &str); 6] = [(1, "A"), (2, "B"), (3, "A"), (4, "C"), (5, "A"), (9, "B")];

fn load_university(db: &Database) -> Result<()> {
    db.execute("create table student (id int, name varchar(10), majorid int, gradyear int)")?;
    db.execute("create table exam (stuid int, grade varchar(2))")?;
    let planner = db.planner();
    db.run(|tx| {
        for (id, name, major, year) in STUDENTS {
            planner.execute_update(
                &format!(
                    "insert into student (id, name, majorid, gradyear) values ({}, '{}', {}, {})",
                    id, name, major, year
                ),
                tx,
            )?;
        }
        for (stuid, grade) in EXAMS {
            planner.execute_update(
                &format!("insert into exam (stuid, grade) values ({}, '{}')", stuid, grade),
                tx,
            )?;
        }
        Ok(())
    })?;
    Ok(())
}

fn query(db: &Database, sql: &str) -> Result<QueryResultSet> {
    match db.execute(sql)? {
        ExecutionResult::Rows(rows) => Ok(rows),
        ExecutionResult::Affected(n) => anyhow::bail!("expected rows, got {} affected", n),
    }
}

fn affected(db: &Database, sql: &str) -> Result<usize> {
    match db.execute(sql)? {
        ExecutionResult::Affected(n) => Ok(n),
        ExecutionResult::Rows(_) => anyhow::bail!("expected an update count"),
    }
}

fn column(rows: &QueryResultSet, index: usize) -> Vec<Constant> {
    rows.rows().iter().map(|row| row[index].clone()).collect()
}

#[test]
fn test_record_page_reuses_deleted_slots() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 8);
    let layout = Arc::new(Layout::new(schema));
    assert_eq!(layout.slot_size(), 20);

    let tx = db.new_tx()?;
    let block = tx.append("slots.tbl")?;
    let page = RecordPage::new(tx.clone(), block, layout.clone())?;
    page.format()?;
    assert_eq!(page.slots_per_block(), 20);
    assert_eq!(page.next_after(None)?, None);

    for i in 0..3 {
        let slot = page.insert()?;
        assert_eq!(slot, i as usize);
        page.set_int(slot, "a", i * 10)?;
        page.set_string(slot, "b", &format!("rec{}", i))?;
    }
    page.delete(1)?;
    assert_eq!(page.next_after(None)?, Some(0));
    assert_eq!(page.next_after(Some(0))?, Some(2));
    assert_eq!(page.next_after(Some(2))?, None);

    assert_eq!(page.insert()?, 1);
    assert_eq!(page.get_int(2, "a")?, 20);
    assert_eq!(page.get_string(2, "b")?, "rec2");

    for _ in 3..20 {
        page.insert()?;
    }
    assert!(matches!(page.insert(), Err(RecordError::PageFull(_))));
    assert!(matches!(page.get_int(0, "missing"), Err(RecordError::FieldNotFound(_))));
    assert!(matches!(page.get_int(20, "a"), Err(RecordError::InvalidSlot { .. })));

    page.close()?;
    tx.commit()?;
    Ok(())
}

#[test]
fn test_string_longer_than_field_is_rejected() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let mut schema = Schema::new();
    schema.add_string_field("name", 3);
    schema.add_int_field("id");
    let layout = Arc::new(Layout::new(schema));

    let tx = db.new_tx()?;
    let block = tx.append("short.tbl")?;
    let page = RecordPage::new(tx.clone(), block, layout.clone())?;
    page.format()?;
    let slot = page.insert()?;
    page.set_int(slot, "id", 7)?;
    page.set_string(slot, "name", "abc")?;

    assert!(matches!(
        page.set_string(slot, "name", "abcdefgh"),
        Err(RecordError::StringTooLong { len: 8, max: 3, .. })
    ));
    assert_eq!(page.get_string(slot, "name")?, "abc");
    assert_eq!(page.get_int(slot, "id")?, 7);
    page.close()?;

    // The typed scan path goes through the same check
    let mut scan = TableScan::new(tx.clone(), "short", layout)?;
    assert!(scan.next()?);
    assert!(matches!(
        scan.set_string("name", "abcd"),
        Err(QueryError::RecordError(RecordError::StringTooLong { .. }))
    ));
    assert_eq!(scan.get_int("id")?, 7);
    scan.close()?;
    tx.commit()?;
    Ok(())
}

#[test]
fn test_record_larger_than_block_is_rejected() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    assert!(matches!(
        db.execute("create table big (s varchar(500))"),
        Err(DatabaseError::QueryError(QueryError::RecordTooLarge { slot_size: 508, block_size: 400, .. }))
    ));
    assert!(matches!(
        db.execute("insert into big (s) values ('x')"),
        Err(DatabaseError::QueryError(QueryError::TableNotFound(_)))
    ));

    // A slot that exactly fills the block is still usable
    db.execute("create table snug (s varchar(392))")?;
    assert_eq!(affected(&db, "insert into snug (s) values ('x')")?, 1);
    assert_eq!(affected(&db, "insert into snug (s) values ('y')")?, 1);
    assert_eq!(query(&db, "select s from snug")?.row_count(), 2);

    // A scan over a layout that bypassed the catalog fails instead of appending forever
    let mut schema = Schema::new();
    schema.add_string_field("s", 500);
    let tx = db.new_tx()?;
    let mut scan = TableScan::new(tx.clone(), "wide", Arc::new(Layout::new(schema)))?;
    assert!(matches!(
        scan.insert(),
        Err(QueryError::RecordError(RecordError::SlotTooLarge { slot_size: 508, block_size: 400 }))
    ));
    scan.close()?;
    assert_eq!(tx.size("wide.tbl")?, 1);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_table_scan_grows_and_reuses_blocks() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let layout = Arc::new(Layout::new(student_schema()));
    let rows: Vec<(i32, String, i32)> = (0..50).map(|i| (i, format!("s{}", i), 2000 + i)).collect();
    let borrowed: Vec<(i32, &str, i32)> = rows.iter().map(|(i, n, y)| (*i, n.as_str(), *y)).collect();

    let tx = db.new_tx()?;
    insert_students(&tx, &layout, &borrowed)?;
    let per_block = tx.block_size() / layout.slot_size();
    let blocks = tx.size("student.tbl")?;
    assert_eq!(blocks, 50_u64.div_ceil(per_block as u64));
    assert_eq!(student_names(&tx, &layout)?.len(), 50);

    let mut scan = TableScan::new(tx.clone(), "student", layout.clone())?;
    while scan.next()? {
        if scan.get_int("id")? % 2 == 0 {
            scan.delete()?;
        }
    }
    scan.close()?;
    assert_eq!(student_names(&tx, &layout)?.len(), 25);

    insert_students(&tx, &layout, &borrowed[..25])?;
    assert_eq!(tx.size("student.tbl")?, blocks);
    assert_eq!(student_names(&tx, &layout)?.len(), 50);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_table_scan_moves_to_rid() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let layout = Arc::new(Layout::new(student_schema()));
    let tx = db.new_tx()?;
    insert_students(&tx, &layout, &[(1, "ann", 2020), (2, "ben", 2021), (3, "cat", 2022)])?;

    let mut scan = TableScan::new(tx.clone(), "student", layout.clone())?;
    let mut target = None;
    while scan.next()? {
        if scan.get_string("name")? == "ben" {
            target = Some(scan.rid()?);
        }
    }
    let rid = target.expect("ben was inserted");
    scan.move_to_rid(rid)?;
    assert_eq!(scan.get_int("gradyear")?, 2021);
    scan.set_val("gradyear", &Constant::Int(2030))?;
    assert_eq!(scan.get_val("gradyear")?, Constant::Int(2030));
    assert!(matches!(scan.set_val("gradyear", &Constant::from("x")), Err(QueryError::TypeError(_))));
    assert!(matches!(
        scan.set_val("name", &Constant::from("much too long")),
        Err(QueryError::RecordError(RecordError::StringTooLong { max: 10, .. }))
    ));
    assert_eq!(scan.get_string("name")?, "ben");
    scan.close()?;
    tx.commit()?;
    Ok(())
}

#[test]
fn test_product_scan_pairs_every_record() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let mut left_schema = Schema::new();
    left_schema.add_int_field("a");
    let mut right_schema = Schema::new();
    right_schema.add_string_field("b", 4);
    let left_layout = Arc::new(Layout::new(left_schema));
    let right_layout = Arc::new(Layout::new(right_schema));

    let tx = db.new_tx()?;
    let mut left = TableScan::new(tx.clone(), "lhs", left_layout.clone())?;
    for a in [1, 2] {
        left.insert()?;
        left.set_int("a", a)?;
    }
    left.close()?;
    let mut right = TableScan::new(tx.clone(), "rhs", right_layout.clone())?;
    for b in ["x", "y", "z"] {
        right.insert()?;
        right.set_string("b", b)?;
    }
    right.close()?;

    let mut product = ProductScan::new(
        Box::new(TableScan::new(tx.clone(), "lhs", left_layout)?),
        Box::new(TableScan::new(tx.clone(), "rhs", right_layout)?),
    )?;
    assert!(product.has_field("a") && product.has_field("b"));
    let mut pairs = Vec::new();
    while product.next()? {
        pairs.push((product.get_int("a")?, product.get_string("b")?));
    }
    let expected: Vec<(i32, String)> = [1, 2]
        .into_iter()
        .flat_map(|a| ["x", "y", "z"].into_iter().map(move |b| (a, b.to_string())))
        .collect();
    assert_eq!(pairs, expected);

    // Rewinding replays the same pairs
    product.before_first()?;
    let mut count = 0;
    while product.next()? {
        count += 1;
    }
    assert_eq!(count, 6);
    product.close()?;
    tx.commit()?;
    Ok(())
}

#[test]
fn test_catalog_round_trip() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let schema = student_schema();
    {
        let db = Database::open(common::test_config(dir.path(), 8))?;
        let metadata = db.metadata();
        db.run(|tx| {
            metadata.create_table("student", &schema, tx)?;
            assert_eq!(metadata.layout("student", tx)?, Layout::new(schema.clone()));
            Ok(())
        })?;

        let duplicate = db.run(|tx| Ok(metadata.create_table("student", &schema, tx)?));
        assert!(matches!(
            duplicate,
            Err(DatabaseError::QueryError(QueryError::TableAlreadyExists(_)))
        ));
        let too_long = db.run(|tx| Ok(metadata.create_table("a_table_name_over_limit", &schema, tx)?));
        assert!(matches!(
            too_long,
            Err(DatabaseError::QueryError(QueryError::NameTooLong { max: 16, .. }))
        ));
        let missing = db.run(|tx| Ok(metadata.layout("nowhere", tx)?));
        assert!(matches!(missing, Err(DatabaseError::QueryError(QueryError::TableNotFound(_)))));
    }

    let db = Database::open(common::test_config(dir.path(), 8))?;
    let metadata = db.metadata();
    db.run(|tx| {
        assert_eq!(metadata.layout("student", tx)?, Layout::new(schema.clone()));
        assert_eq!(metadata.table_names(tx)?, vec!["tblcat", "fldcat", "student"]);
        Ok(())
    })?;
    Ok(())
}

#[test]
fn test_join_query() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    load_university(&db)?;

    let rows = query(&db, "select name from student, exam where id = stuid and grade = 'A'")?;
    assert_eq!(rows.columns(), ["name"]);
    assert_eq!(
        column(&rows, 0),
        vec![Constant::from("joe"), Constant::from("max"), Constant::from("bob")]
    );

    let rows = query(&db, "SELECT Name, Grade FROM student, exam WHERE stuid = id AND majorid = 10")?;
    assert_eq!(rows.row_count(), 3);
    assert_eq!(column(&rows, 1), vec![Constant::from("A"), Constant::from("A"), Constant::from("B")]);
    Ok(())
}

#[test]
fn test_select_star_returns_every_field() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    load_university(&db)?;

    let rows = query(&db, "select * from exam")?;
    assert_eq!(rows.columns(), ["stuid", "grade"]);
    assert_eq!(rows.row_count(), EXAMS.len());
    assert_eq!(rows.rows()[0], vec![Constant::Int(1), Constant::from("A")]);
    Ok(())
}

#[test]
fn test_update_and_delete_counts() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    load_university(&db)?;

    assert_eq!(affected(&db, "update student set gradyear = 2025 where majorid = 20")?, 4);
    assert_eq!(affected(&db, "delete from student where gradyear = 2020")?, 1);
    assert_eq!(affected(&db, "update exam set grade = 'B' where stuid = 1")?, 1);
    assert_eq!(affected(&db, "update student set majorid = id where id = 7")?, 1);

    let rows = query(&db, "select name from student where gradyear = 2025")?;
    assert_eq!(
        column(&rows, 0),
        vec![
            Constant::from("amy"),
            Constant::from("sue"),
            Constant::from("kim"),
            Constant::from("pat")
        ]
    );
    assert_eq!(query(&db, "select id from student")?.row_count(), 8);
    assert_eq!(query(&db, "select majorid from student where name = 'art'")?.rows()[0][0], Constant::Int(7));
    assert_eq!(query(&db, "select stuid from exam where grade = 'A'")?.row_count(), 2);

    assert_eq!(affected(&db, "delete from exam")?, EXAMS.len());
    assert_eq!(query(&db, "select * from exam")?.row_count(), 0);
    Ok(())
}

#[test]
fn test_failed_statement_leaves_no_trace() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    load_university(&db)?;

    assert!(matches!(
        db.execute("select name from nowhere"),
        Err(DatabaseError::QueryError(QueryError::TableNotFound(_)))
    ));
    assert!(matches!(
        db.execute("select shoe_size from student"),
        Err(DatabaseError::QueryError(QueryError::ColumnNotFound(_)))
    ));
    assert!(matches!(
        db.execute("select name from student where shoe_size = 3"),
        Err(DatabaseError::QueryError(QueryError::ColumnNotFound(_)))
    ));
    assert!(matches!(
        db.execute("insert into exam (stuid, grade) values ('x', 'A')"),
        Err(DatabaseError::QueryError(QueryError::TypeError(_)))
    ));
    assert!(matches!(
        db.execute("select from student"),
        Err(DatabaseError::QueryError(QueryError::ParseError(_)))
    ));
    assert!(matches!(
        db.execute("create table exam (x int)"),
        Err(DatabaseError::QueryError(QueryError::TableAlreadyExists(_)))
    ));
    assert_eq!(query(&db, "select * from exam")?.row_count(), EXAMS.len());
    assert_eq!(db.buffer_pool().available(), db.config().buffer_pool_size);
    Ok(())
}

#[test]
fn test_plan_estimates_follow_statistics() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    load_university(&db)?;
    let metadata = db.metadata();
    let planner = db.planner();

    db.run(|tx| {
        metadata.refresh_statistics(tx)?;
        let student = TablePlan::new(tx.clone(), "student", &metadata)?;
        assert_eq!(student.records_output(), 9);
        assert_eq!(student.blocks_accessed(), 1);
        assert_eq!(student.distinct_values("majorid"), 4);

        let plan = planner.create_query_plan("select name from student where majorid = 10", tx)?;
        assert_eq!(plan.records_output(), 2);
        assert_eq!(plan.schema().fields(), ["name"]);

        let join = planner.create_query_plan("select name from student, exam", tx)?;
        assert_eq!(join.records_output(), 54);
        assert_eq!(join.blocks_accessed(), 1 + 9);
        Ok(())
    })?;
    Ok(())
}
