// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use lobbygrid_app::{
    LobbyList, PrefsStore, Row, SharedPrefs, SortDirection, SortOrder, SortableRowTable,
};
use lobbygrid_store::{Store, validate_prefs_path};
use lobbygrid_testkit::temp_prefs_path;
use std::rc::Rc;

#[test]
fn validate_prefs_path_rejects_uri_forms() {
    assert!(validate_prefs_path("file:prefs.db").is_err());
    assert!(validate_prefs_path("sqlite://prefs.db").is_err());
    assert!(validate_prefs_path("/tmp/lobbygrid/prefs.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.set_int("UserList", "SortCol", 2)?;
    store.bootstrap()?;
    assert_eq!(store.get_int("UserList", "SortCol")?, Some(2));
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE prefs (namespace TEXT, key TEXT, value TEXT);")?;

    let error = store
        .bootstrap()
        .expect_err("table without updated_at must be rejected");
    assert!(error.to_string().contains("updated_at"), "{error:#}");
    Ok(())
}

#[test]
fn set_int_upserts_and_namespaces_stay_apart() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.set_int("UserList", "ColWidth0", 120)?;
    store.set_int("UserList", "ColWidth0", 140)?;
    store.set_int("BattleList", "ColWidth0", 90)?;

    assert_eq!(store.get_int("UserList", "ColWidth0")?, Some(140));
    assert_eq!(store.get_int("BattleList", "ColWidth0")?, Some(90));
    assert_eq!(store.get_int("UserList", "ColWidth1")?, None);
    assert_eq!(store.namespaces()?, vec!["BattleList", "UserList"]);

    let listed = store.list_prefs("UserList")?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key, "ColWidth0");
    assert_eq!(listed[0].value, 140);
    Ok(())
}

#[test]
fn corrupt_value_reports_how_to_recover() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.raw_connection().execute(
        "INSERT INTO prefs (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)",
        ["UserList", "SortCol", "wide", "2026-01-01T00:00:00Z"],
    )?;

    let error = store
        .get_int("UserList", "SortCol")
        .expect_err("non-numeric value must fail");
    assert!(error.to_string().contains("--reset-prefs UserList"), "{error:#}");

    assert_eq!(store.reset_namespace("UserList")?, 1);
    assert_eq!(store.get_int("UserList", "SortCol")?, None);
    Ok(())
}

#[test]
fn table_layout_survives_reopen() -> Result<()> {
    let (_dir, path) = temp_prefs_path()?;

    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        let prefs: SharedPrefs = Rc::new(store);
        let mut table = SortableRowTable::new(
            LobbyList::Users.table_options().with_size(500, 300),
            prefs,
        );
        table.add_row(Row::new("u1", ["zed", "DE", "3", "idle", "0"]))?;
        table.resize_column(0, 180)?;
        table.sort(2, SortDirection::Desc)?;
        assert!(table.save_prefs());
    }

    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.get_int("UserList", "SortReverse")?, Some(1));

    let restored = SortableRowTable::new(
        LobbyList::Users.table_options().with_size(500, 300),
        Rc::new(store),
    );
    assert_eq!(restored.column_widths()[0], 180);
    assert_eq!(restored.column_widths()[1], 100);
    assert_eq!(restored.sort_order(), Some(SortOrder::descending(2)));
    Ok(())
}

#[test]
fn unreadable_prefs_fall_back_to_defaults() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.raw_connection().execute(
        "INSERT INTO prefs (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)",
        ["BattleList", "ColWidth0", "lots", "2026-01-01T00:00:00Z"],
    )?;

    let table = SortableRowTable::new(
        LobbyList::Battles.table_options().with_size(500, 300),
        Rc::new(store),
    );
    assert_eq!(table.column_widths(), &[100, 100, 100, 100, 100]);
    assert_eq!(table.sort_order(), Some(SortOrder::ascending(0)));
    Ok(())
}
