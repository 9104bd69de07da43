// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Rgb, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContent<'a> {
    Text(&'a str),
    Swatch(Rgb),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCell<'a> {
    pub column: usize,
    pub label: &'a str,
    /// Set only on the active sort column.
    pub sort: Option<SortDirection>,
    pub rect: CellRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyCell<'a> {
    pub row: usize,
    pub column: usize,
    pub content: CellContent<'a>,
    pub selected: bool,
    pub rect: CellRect,
}

/// Drawing target for a `SortableRowTable`. Units are whatever the surface
/// measures in: pixels on a GUI toolkit, character cells on a terminal.
pub trait TableRenderSurface {
    /// Total height available to the table, header included.
    fn viewport_height(&self) -> u32;

    fn draw_header(&mut self, cell: HeaderCell<'_>);

    fn draw_cell(&mut self, cell: BodyCell<'_>);

    fn draw_row_separator(&mut self, _row: usize, _rect: CellRect) {}
}
