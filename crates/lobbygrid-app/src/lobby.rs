// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::ids::RowId;
use crate::model::{Column, Row};
use crate::table::{SortableRowTable, TableOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LobbyList {
    Users,
    Battles,
}

impl LobbyList {
    pub const ALL: [Self; 2] = [Self::Users, Self::Battles];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Battles => "battles",
        }
    }

    /// Preferences namespace of the list's table.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Users => "UserList",
            Self::Battles => "BattleList",
        }
    }

    pub const fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Users => &["name", "country", "rank", "status", "color"],
            Self::Battles => &["title", "host", "map", "players", "game"],
        }
    }

    pub fn columns(self) -> Vec<Column> {
        Column::from_headers(self.headers().iter().copied())
    }

    pub fn table_options(self) -> TableOptions {
        TableOptions::new(self.table_name(), self.columns())
    }
}

/// A change announced by a lobby feed. Feeds produce these on their own
/// threads; they are applied on the UI thread only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    Upsert(Row),
    Remove(RowId),
    Clear,
}

impl RowChange {
    pub fn id(&self) -> Option<&RowId> {
        match self {
            Self::Upsert(row) => Some(&row.id),
            Self::Remove(id) => Some(id),
            Self::Clear => None,
        }
    }
}

pub fn apply_row_change(table: &mut SortableRowTable, change: RowChange) -> Result<(), TableError> {
    match change {
        RowChange::Upsert(row) => table.upsert_row(row),
        RowChange::Remove(id) => table.remove_row(id.as_str()).map(|_| ()),
        RowChange::Clear => {
            table.clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LobbyList, RowChange, apply_row_change};
    use crate::{ColumnKind, MemoryPrefs, Row, RowId, SortableRowTable, TableError};

    #[test]
    fn user_list_has_color_swatch_column() {
        let columns = LobbyList::Users.columns();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[4].kind, ColumnKind::Color);
        assert!(
            LobbyList::Battles
                .columns()
                .iter()
                .all(|column| column.kind == ColumnKind::Text)
        );
    }

    #[test]
    fn row_changes_drive_the_table() -> Result<(), TableError> {
        let list = LobbyList::Battles;
        let mut table = SortableRowTable::new(list.table_options(), MemoryPrefs::shared());

        apply_row_change(
            &mut table,
            RowChange::Upsert(Row::new("b1", ["4v4", "host", "Comet", "8", "BA"])),
        )?;
        apply_row_change(
            &mut table,
            RowChange::Upsert(Row::new("b1", ["4v4 noobs", "host", "Comet", "7", "BA"])),
        )?;
        assert_eq!(table.row(0)?.cells[0], "4v4 noobs");

        let missing = RowChange::Remove(RowId::new("b9"));
        assert_eq!(missing.id().map(RowId::as_str), Some("b9"));
        assert_eq!(
            apply_row_change(&mut table, missing),
            Err(TableError::NotFound { id: "b9".into() })
        );

        apply_row_change(&mut table, RowChange::Clear)?;
        assert!(table.is_empty());
        Ok(())
    }
}
