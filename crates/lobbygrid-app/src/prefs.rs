// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub const PREF_COL_WIDTH: &str = "ColWidth";
pub const PREF_SORT_COL: &str = "SortCol";
pub const PREF_SORT_REVERSE: &str = "SortReverse";

/// Integer preferences keyed by `(namespace, key)`. Tables use their name as
/// the namespace.
pub trait PrefsStore {
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>>;
    fn set_int(&self, namespace: &str, key: &str, value: i64) -> Result<()>;
}

pub type SharedPrefs = Rc<dyn PrefsStore>;

pub fn col_width_key(column: usize) -> String {
    format!("{PREF_COL_WIDTH}{column}")
}

/// Reads a preference, falling back to `default` when it is missing or the
/// store fails. Failures are logged, never returned.
pub fn read_int_or(prefs: &dyn PrefsStore, namespace: &str, key: &str, default: i64) -> i64 {
    match prefs.get_int(namespace, key) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(error) => {
            log::warn!("read pref {namespace}/{key} failed, using {default}: {error:#}");
            default
        }
    }
}

pub fn write_int_logged(prefs: &dyn PrefsStore, namespace: &str, key: &str, value: i64) -> bool {
    match prefs.set_int(namespace, key, value) {
        Ok(()) => true,
        Err(error) => {
            log::warn!("write pref {namespace}/{key}={value} failed: {error:#}");
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: RefCell<BTreeMap<(String, String), i64>>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    pub fn entries(&self, namespace: &str) -> Vec<(String, i64)> {
        self.values
            .borrow()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((_, key), value)| (key.clone(), *value))
            .collect()
    }
}

impl PrefsStore for MemoryPrefs {
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>> {
        Ok(self
            .values
            .borrow()
            .get(&(namespace.to_owned(), key.to_owned()))
            .copied())
    }

    fn set_int(&self, namespace: &str, key: &str, value: i64) -> Result<()> {
        self.values
            .borrow_mut()
            .insert((namespace.to_owned(), key.to_owned()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryPrefs, PrefsStore, col_width_key, read_int_or, write_int_logged};
    use anyhow::{Result, bail};

    struct BrokenPrefs;

    impl PrefsStore for BrokenPrefs {
        fn get_int(&self, _namespace: &str, _key: &str) -> Result<Option<i64>> {
            bail!("disk on fire")
        }

        fn set_int(&self, _namespace: &str, _key: &str, _value: i64) -> Result<()> {
            bail!("disk on fire")
        }
    }

    #[test]
    fn col_width_keys_are_indexed() {
        assert_eq!(col_width_key(0), "ColWidth0");
        assert_eq!(col_width_key(12), "ColWidth12");
    }

    #[test]
    fn memory_prefs_are_namespaced() -> Result<()> {
        let prefs = MemoryPrefs::new();
        prefs.set_int("UserList", "SortCol", 2)?;
        prefs.set_int("BattleList", "SortCol", 4)?;

        assert_eq!(prefs.get_int("UserList", "SortCol")?, Some(2));
        assert_eq!(prefs.get_int("BattleList", "SortCol")?, Some(4));
        assert_eq!(prefs.get_int("UserList", "SortReverse")?, None);
        assert_eq!(prefs.entries("UserList"), vec![("SortCol".to_owned(), 2)]);
        assert_eq!(prefs.len(), 2);
        Ok(())
    }

    #[test]
    fn missing_or_failing_prefs_fall_back_to_default() {
        let prefs = MemoryPrefs::new();
        assert_eq!(read_int_or(&prefs, "UserList", "ColWidth0", 80), 80);
        assert_eq!(read_int_or(&BrokenPrefs, "UserList", "ColWidth0", 80), 80);
        assert!(!write_int_logged(&BrokenPrefs, "UserList", "ColWidth0", 80));
    }
}
