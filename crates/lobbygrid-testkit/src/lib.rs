// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use lobbygrid_app::{
    BodyCell, CellContent, CellRect, HeaderCell, Rgb, SortDirection, TableRenderSurface,
};
use std::path::PathBuf;

pub use lobbygrid_app::LobbyFaker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedContent {
    Text(String),
    Swatch(Rgb),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Header {
        column: usize,
        label: String,
        sort: Option<SortDirection>,
        rect: CellRect,
    },
    Cell {
        row: usize,
        column: usize,
        content: RecordedContent,
        selected: bool,
        rect: CellRect,
    },
    Separator {
        row: usize,
        rect: CellRect,
    },
}

/// Surface that remembers every draw call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub height: u32,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(height: u32) -> Self {
        Self {
            height,
            ops: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn headers(&self) -> Vec<(String, Option<SortDirection>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Header { label, sort, .. } => Some((label.clone(), *sort)),
                _ => None,
            })
            .collect()
    }

    /// Row indices that were drawn, in draw order.
    pub fn drawn_rows(&self) -> Vec<usize> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Separator { row, .. } => Some(*row),
                _ => None,
            })
            .collect()
    }

    pub fn cells(&self, row: usize) -> Vec<RecordedContent> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Cell {
                    row: drawn, content, ..
                } if *drawn == row => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        let mut rows = self
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Cell { row, selected, .. } if *selected => Some(*row),
                _ => None,
            })
            .collect::<Vec<_>>();
        rows.dedup();
        rows
    }
}

impl TableRenderSurface for RecordingSurface {
    fn viewport_height(&self) -> u32 {
        self.height
    }

    fn draw_header(&mut self, cell: HeaderCell<'_>) {
        self.ops.push(DrawOp::Header {
            column: cell.column,
            label: cell.label.to_owned(),
            sort: cell.sort,
            rect: cell.rect,
        });
    }

    fn draw_cell(&mut self, cell: BodyCell<'_>) {
        let content = match cell.content {
            CellContent::Text(text) => RecordedContent::Text(text.to_owned()),
            CellContent::Swatch(color) => RecordedContent::Swatch(color),
        };
        self.ops.push(DrawOp::Cell {
            row: cell.row,
            column: cell.column,
            content,
            selected: cell.selected,
            rect: cell.rect,
        });
    }

    fn draw_row_separator(&mut self, row: usize, rect: CellRect) {
        self.ops.push(DrawOp::Separator { row, rect });
    }
}

pub fn temp_prefs_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("prefs.db");
    Ok((dir, path))
}

pub fn text(value: &str) -> RecordedContent {
    RecordedContent::Text(value.to_owned())
}
