// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::MouseButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Interactions a surface binding forwards to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableInput {
    HeaderRelease {
        column: usize,
        button: MouseButton,
    },
    CellPush {
        row: usize,
        button: MouseButton,
        double: bool,
    },
    /// Push on the empty area below the last row.
    BackgroundPush {
        button: MouseButton,
    },
    Key(NavKey),
    Wheel {
        delta: i32,
        shift: bool,
    },
    ColumnResize {
        column: usize,
        width: u32,
    },
    /// Mouse release anywhere else on the table.
    Release,
}

impl TableInput {
    pub const fn is_release(self) -> bool {
        matches!(
            self,
            Self::HeaderRelease { .. } | Self::ColumnResize { .. } | Self::Release
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    RowClicked { row: usize, button: MouseButton },
    RowDoubleClicked { row: usize, button: MouseButton },
    SelectionChanged(Option<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputOutcome {
    pub consumed: bool,
    pub events: Vec<TableEvent>,
}
