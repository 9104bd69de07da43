// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::TableError;
use crate::input::{InputOutcome, NavKey, TableEvent, TableInput};
use crate::model::{Column, ColumnKind, MouseButton, Row, SortDirection, SortOrder, decode_color};
use crate::prefs::{
    PREF_SORT_COL, PREF_SORT_REVERSE, SharedPrefs, col_width_key, read_int_or, write_int_logged,
};
use crate::surface::{BodyCell, CellContent, CellRect, HeaderCell, TableRenderSurface};
use crate::ids::RowId;

pub const DEFAULT_HEADER_HEIGHT: u32 = 22;
pub const DEFAULT_ROW_HEIGHT: u32 = DEFAULT_HEADER_HEIGHT + 2;
pub const DEFAULT_MIN_COLUMN_WIDTH: u32 = 10;
/// Widths above this are treated as corrupt.
pub const MAX_COLUMN_WIDTH: u32 = u16::MAX as u32;
const WHEEL_LINES: i32 = 3;
const WHEEL_SHIFT_FACTOR: i32 = 3;
const NO_SORT_COLUMN: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Preferences namespace.
    pub name: String,
    pub columns: Vec<Column>,
    pub width: u32,
    pub height: u32,
    pub header_height: u32,
    pub row_height: u32,
    pub min_column_width: u32,
    pub save_prefs: bool,
}

impl TableOptions {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            width: 0,
            height: 0,
            header_height: DEFAULT_HEADER_HEIGHT,
            row_height: DEFAULT_ROW_HEIGHT,
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            save_prefs: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_row_metrics(mut self, header_height: u32, row_height: u32) -> Self {
        self.header_height = header_height;
        self.row_height = row_height.max(1);
        self
    }

    pub fn with_min_column_width(mut self, width: u32) -> Self {
        self.min_column_width = width;
        self
    }

    pub fn persist(mut self, save_prefs: bool) -> Self {
        self.save_prefs = save_prefs;
        self
    }
}

/// Rows waiting to be redrawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Damage {
    pub full: bool,
    pub rows: BTreeSet<usize>,
}

impl Damage {
    pub fn is_empty(&self) -> bool {
        !self.full && self.rows.is_empty()
    }
}

/// What lies under a point in table coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    Header { column: usize },
    /// Last unit of a header cell; dragging it resizes the column.
    HeaderBorder { column: usize },
    Cell { row: usize, column: usize },
    Background,
}

type Listener = Box<dyn FnMut(&TableEvent)>;

/// Sorted, identity-keyed rows with one selection, persisted column widths
/// and sort order.
pub struct SortableRowTable {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    widths: Vec<u32>,
    sort: Option<SortOrder>,
    selected: Option<usize>,
    top_row: usize,
    height: u32,
    header_height: u32,
    row_height: u32,
    min_column_width: u32,
    save_prefs: bool,
    prefs: SharedPrefs,
    damage: Damage,
    pending: Vec<TableEvent>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for SortableRowTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableRowTable")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("widths", &self.widths)
            .field("sort", &self.sort)
            .field("selected", &self.selected)
            .field("top_row", &self.top_row)
            .finish_non_exhaustive()
    }
}

impl SortableRowTable {
    pub fn new(options: TableOptions, prefs: SharedPrefs) -> Self {
        let column_count = options.columns.len();
        let default_width = options
            .width
            .checked_div(column_count as u32)
            .unwrap_or(0)
            .min(MAX_COLUMN_WIDTH);

        let widths = (0..column_count)
            .map(|column| {
                let stored = read_int_or(
                    prefs.as_ref(),
                    &options.name,
                    &col_width_key(column),
                    i64::from(default_width),
                );
                u32::try_from(stored)
                    .ok()
                    .filter(|width| (1..=MAX_COLUMN_WIDTH).contains(width))
                    .unwrap_or_else(|| {
                        if stored != i64::from(default_width) {
                            log::warn!(
                                "table {} ignores stored width {stored} for column {column}",
                                options.name
                            );
                        }
                        default_width
                    })
            })
            .collect();

        let sort_col = read_int_or(prefs.as_ref(), &options.name, PREF_SORT_COL, 0);
        let sort_reverse = read_int_or(prefs.as_ref(), &options.name, PREF_SORT_REVERSE, 0);
        let sort = usize::try_from(sort_col)
            .ok()
            .filter(|column| *column < column_count)
            .map(|column| SortOrder {
                column,
                direction: SortDirection::from_reverse(sort_reverse != 0),
            });

        log::debug!(
            "table {} created with {} columns, sort {:?}",
            options.name,
            column_count,
            sort
        );

        Self {
            name: options.name,
            columns: options.columns,
            rows: Vec::new(),
            widths,
            sort,
            selected: None,
            top_row: 0,
            height: options.height,
            header_height: options.header_height,
            row_height: options.row_height.max(1),
            min_column_width: options.min_column_width,
            save_prefs: options.save_prefs,
            prefs,
            damage: Damage {
                full: true,
                rows: BTreeSet::new(),
            },
            pending: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_widths(&self) -> &[u32] {
        &self.widths
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_id(&self) -> Option<&RowId> {
        self.selected
            .and_then(|index| self.rows.get(index))
            .map(|row| &row.id)
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn damage(&self) -> &Damage {
        &self.damage
    }

    pub fn needs_redraw(&self) -> bool {
        !self.damage.is_empty()
    }

    pub fn saves_prefs(&self) -> bool {
        self.save_prefs
    }

    pub fn header_height(&self) -> u32 {
        self.header_height
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Left edge of a column.
    pub fn column_x(&self, column: usize) -> u32 {
        self.widths
            .iter()
            .take(column)
            .fold(0u32, |left, width| left.saturating_add(*width))
    }

    pub fn hit_test(&self, x: u32, y: u32) -> HitRegion {
        let mut left: u32 = 0;
        let mut hit_column = None;
        for (column, width) in self.widths.iter().enumerate() {
            let right = left.saturating_add(*width);
            if x < right {
                hit_column = Some((column, x.saturating_add(1) == right));
                break;
            }
            left = right;
        }
        let Some((column, on_border)) = hit_column else {
            return HitRegion::Background;
        };

        if y < self.header_height {
            return if on_border {
                HitRegion::HeaderBorder { column }
            } else {
                HitRegion::Header { column }
            };
        }

        let offset = ((y - self.header_height) / self.row_height) as usize;
        let row = self.top_row + offset;
        if offset < self.page_rows() && row < self.rows.len() {
            HitRegion::Cell { row, column }
        } else {
            HitRegion::Background
        }
    }

    /// Body rows that fit below the header; never less than one.
    pub fn page_rows(&self) -> usize {
        let body = self.height.saturating_sub(self.header_height);
        ((body / self.row_height) as usize).max(1)
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if self.height != height {
            self.height = height;
            self.clamp_top_row();
            self.damage.full = true;
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TableEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drains notifications emitted outside of `handle`.
    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn row(&self, index: usize) -> Result<&Row, TableError> {
        self.rows.get(index).ok_or(TableError::IndexOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    pub fn row_exists(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id.as_str() == id)
    }

    pub fn add_row(&mut self, row: Row) -> Result<(), TableError> {
        self.check_arity(&row)?;
        if self.row_exists(row.id.as_str()) {
            return Err(TableError::Duplicate { id: row.id });
        }

        self.rows.push(row);
        self.resort();
        self.damage.full = true;
        Ok(())
    }

    /// Replaces the cells of an existing row. Returns `false` without
    /// re-sorting or redrawing when nothing changed.
    pub fn update_row(&mut self, row: Row) -> Result<bool, TableError> {
        self.check_arity(&row)?;
        let Some(index) = self.position(row.id.as_str()) else {
            return Err(TableError::NotFound { id: row.id });
        };
        if self.rows[index].cells == row.cells {
            return Ok(false);
        }

        self.rows[index].cells = row.cells;
        self.resort();
        self.damage.full = true;
        Ok(true)
    }

    pub fn upsert_row(&mut self, row: Row) -> Result<(), TableError> {
        if self.row_exists(row.id.as_str()) {
            self.update_row(row).map(|_| ())
        } else {
            self.add_row(row)
        }
    }

    pub fn remove_row(&mut self, id: &str) -> Result<Row, TableError> {
        let Some(index) = self.position(id) else {
            return Err(TableError::NotFound { id: RowId::new(id) });
        };

        match self.selected {
            Some(selected) if selected == index => self.selected = None,
            Some(selected) if selected > index => self.selected = Some(selected - 1),
            _ => {}
        }

        let removed = self.rows.remove(index);
        self.clamp_top_row();
        self.damage.full = true;
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.selected = None;
        self.top_row = 0;
        self.damage.full = true;
    }

    /// Stable, case-insensitive sort. The selection follows its row.
    pub fn sort(&mut self, column: usize, direction: SortDirection) -> Result<(), TableError> {
        if column >= self.columns.len() {
            return Err(TableError::ColumnOutOfRange {
                column,
                len: self.columns.len(),
            });
        }

        let order = SortOrder { column, direction };
        self.sort = Some(order);
        self.apply_sort(order);
        Ok(())
    }

    /// Clamps into `[0, row_count - 1]`; an empty table ends up with no
    /// selection. Notifies only when the selection actually moves.
    pub fn select_row(&mut self, index: isize) -> Option<usize> {
        let target = match self.rows.len() {
            0 => None,
            len => Some(index.clamp(0, len as isize - 1) as usize),
        };
        self.set_selection(target, true);
        self.selected
    }

    /// Unknown ids clear the selection without a notification.
    pub fn select_row_by_id(&mut self, id: &str) -> Option<usize> {
        match self.position(id) {
            Some(index) => self.select_row(index as isize),
            None => {
                self.set_selection(None, false);
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None, true);
    }

    pub fn resize_column(&mut self, column: usize, width: u32) -> Result<(), TableError> {
        let len = self.columns.len();
        let Some(slot) = self.widths.get_mut(column) else {
            return Err(TableError::ColumnOutOfRange { column, len });
        };
        *slot = width.max(self.min_column_width).min(MAX_COLUMN_WIDTH);
        self.damage.full = true;
        Ok(())
    }

    pub fn handle(&mut self, input: TableInput) -> InputOutcome {
        let mark = self.pending.len();
        let consumed = match input {
            TableInput::HeaderRelease { column, button } => self.header_released(column, button),
            TableInput::CellPush {
                row,
                button,
                double,
            } => self.cell_pushed(row, button, double),
            TableInput::BackgroundPush { button } => {
                if button == MouseButton::Left {
                    self.clear_selection();
                }
                true
            }
            TableInput::Key(key) => self.navigate(key),
            TableInput::Wheel { delta, shift } => self.wheel(delta, shift),
            TableInput::ColumnResize { column, width } => {
                self.resize_column(column, width).is_ok()
            }
            TableInput::Release => false,
        };

        if self.save_prefs && input.is_release() {
            self.save_prefs();
        }

        InputOutcome {
            consumed,
            events: self.pending.split_off(mark),
        }
    }

    pub fn navigate(&mut self, key: NavKey) -> bool {
        let current = self.selected.map_or(-1, |index| index as isize);
        let page = self.page_rows() as isize;
        let target = match key {
            NavKey::Up => current - 1,
            NavKey::Down => current + 1,
            NavKey::PageUp => current - page,
            NavKey::PageDown => current + page,
            NavKey::Home => 0,
            NavKey::End => self.rows.len() as isize,
        };

        if let Some(selected) = self.select_row(target) {
            self.scroll_into_view(selected);
        }
        true
    }

    /// Wheel deltas scroll three lines per notch, nine with shift held.
    pub fn wheel(&mut self, delta: i32, shift: bool) -> bool {
        let mut lines = delta.saturating_mul(WHEEL_LINES);
        if shift {
            lines = lines.saturating_mul(WHEEL_SHIFT_FACTOR);
        }
        self.scroll_by(lines);
        true
    }

    pub fn scroll_by(&mut self, lines: i32) {
        let next = (self.top_row as i64 + i64::from(lines)).clamp(0, self.max_top_row() as i64);
        self.set_top_row(next as usize);
    }

    pub fn scroll_into_view(&mut self, row: usize) {
        let page = self.page_rows();
        if row < self.top_row {
            self.set_top_row(row);
        } else if row >= self.top_row + page {
            self.set_top_row(row + 1 - page);
        }
    }

    /// Writes widths and sort order. Returns `false` if any write failed.
    pub fn save_prefs(&self) -> bool {
        let prefs = self.prefs.as_ref();
        let mut ok = true;
        for (column, width) in self.widths.iter().enumerate() {
            ok &= write_int_logged(prefs, &self.name, &col_width_key(column), i64::from(*width));
        }

        let (column, reverse) = match self.sort {
            Some(order) => (order.column as i64, order.direction.is_reverse()),
            None => (NO_SORT_COLUMN, false),
        };
        ok &= write_int_logged(prefs, &self.name, PREF_SORT_COL, column);
        ok &= write_int_logged(prefs, &self.name, PREF_SORT_REVERSE, i64::from(reverse));
        log::trace!("table {} saved prefs (ok={ok})", self.name);
        ok
    }

    pub fn render<S>(&mut self, surface: &mut S) -> Result<(), TableError>
    where
        S: TableRenderSurface + ?Sized,
    {
        self.height = surface.viewport_height();
        self.clamp_top_row();

        let mut x: u32 = 0;
        for (column, def) in self.columns.iter().enumerate() {
            let width = self.widths[column];
            surface.draw_header(HeaderCell {
                column,
                label: &def.label,
                sort: self
                    .sort
                    .filter(|order| order.column == column)
                    .map(|order| order.direction),
                rect: CellRect {
                    x,
                    y: 0,
                    width,
                    height: self.header_height,
                },
            });
            x = x.saturating_add(width);
        }
        let total_width = x;

        let end = (self.top_row + self.page_rows()).min(self.rows.len());
        for (offset, index) in (self.top_row..end).enumerate() {
            let row = &self.rows[index];
            let y = self.header_height + offset as u32 * self.row_height;
            let selected = self.selected == Some(index);

            let mut x: u32 = 0;
            for (column, def) in self.columns.iter().enumerate() {
                let width = self.widths[column];
                let raw = row.cells[column].as_str();
                let content = match def.kind {
                    ColumnKind::Text => CellContent::Text(raw),
                    ColumnKind::Color => CellContent::Swatch(decode_color(&row.id, column, raw)?),
                };
                surface.draw_cell(BodyCell {
                    row: index,
                    column,
                    content,
                    selected,
                    rect: CellRect {
                        x,
                        y,
                        width,
                        height: self.row_height,
                    },
                });
                x = x.saturating_add(width);
            }

            surface.draw_row_separator(
                index,
                CellRect {
                    x: 0,
                    y: y + self.row_height - 1,
                    width: total_width,
                    height: 1,
                },
            );
        }

        self.damage = Damage::default();
        Ok(())
    }

    fn header_released(&mut self, column: usize, button: MouseButton) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let direction = match self.sort {
            Some(order) if order.column == column => order.direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.sort(column, direction).is_ok()
    }

    fn cell_pushed(&mut self, row: usize, button: MouseButton, double: bool) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        if double {
            // the first push of the pair already selected the row
            self.emit(TableEvent::RowDoubleClicked { row, button });
        } else {
            self.select_row(row as isize);
            self.emit(TableEvent::RowClicked { row, button });
        }
        true
    }

    fn check_arity(&self, row: &Row) -> Result<(), TableError> {
        if row.cells.len() != self.columns.len() {
            return Err(TableError::Arity {
                id: row.id.clone(),
                expected: self.columns.len(),
                actual: row.cells.len(),
            });
        }
        Ok(())
    }

    fn resort(&mut self) {
        if let Some(order) = self.sort {
            self.apply_sort(order);
        }
    }

    fn apply_sort(&mut self, order: SortOrder) {
        let selected_id = self.selected_id().cloned();
        let column = order.column;
        match order.direction {
            SortDirection::Asc => self
                .rows
                .sort_by_cached_key(|row| row.cells[column].to_uppercase()),
            SortDirection::Desc => self
                .rows
                .sort_by_cached_key(|row| Reverse(row.cells[column].to_uppercase())),
        }

        if let Some(id) = selected_id {
            self.selected = self.position(id.as_str());
        }
        self.damage.full = true;
        log::trace!(
            "table {} sorted by column {} {}",
            self.name,
            column,
            order.direction.as_str()
        );
    }

    fn set_selection(&mut self, target: Option<usize>, notify: bool) {
        if target == self.selected {
            return;
        }
        if let Some(old) = self.selected {
            self.damage.rows.insert(old);
        }
        if let Some(new) = target {
            self.damage.rows.insert(new);
        }
        self.selected = target;
        if notify {
            self.emit(TableEvent::SelectionChanged(target));
        }
    }

    fn emit(&mut self, event: TableEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.pending.push(event);
    }

    fn max_top_row(&self) -> usize {
        self.rows.len().saturating_sub(self.page_rows())
    }

    fn clamp_top_row(&mut self) {
        let max = self.max_top_row();
        if self.top_row > max {
            self.set_top_row(max);
        }
    }

    fn set_top_row(&mut self, top_row: usize) {
        if self.top_row != top_row {
            self.top_row = top_row;
            self.damage.full = true;
        }
    }
}
