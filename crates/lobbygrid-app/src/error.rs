// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::ids::RowId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("row already exists: {id}")]
    Duplicate { id: RowId },

    #[error("row not found: {id}")]
    NotFound { id: RowId },

    #[error("row index {index} out of range for {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("row {id} has {actual} cells but the table has {expected} columns")]
    Arity {
        id: RowId,
        expected: usize,
        actual: usize,
    },

    #[error("column {column} out of range for {len} columns")]
    ColumnOutOfRange { column: usize, len: usize },

    #[error("row {id} column {column} holds {value:?}, which is not a packed color")]
    DataIntegrity {
        id: RowId,
        column: usize,
        value: String,
    },
}
