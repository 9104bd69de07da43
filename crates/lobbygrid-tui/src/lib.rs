// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton as TermButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use lobbygrid_app::{
    BodyCell, CellContent, HeaderCell, HitRegion, LobbyCommand, LobbyEvent, LobbyList,
    LobbyState, MouseButton, NavKey, Rgb, Row as GridRow, RowChange, SharedPrefs, SortDirection,
    SortableRowTable, TableError, TableEvent, TableInput, TableRenderSurface, apply_row_change,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

const SORT_ARROW_ASC: &str = "↑";
const SORT_ARROW_DESC: &str = "↓";
const SWATCH_GLYPH: &str = "█";
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
const STATUS_TTL: Duration = Duration::from_secs(4);
/// One terminal line per header and per row.
const TERMINAL_LINE: u32 = 1;
const TERMINAL_MIN_COLUMN_WIDTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub width: u32,
    pub height: u32,
    pub save_prefs: bool,
}

/// The user and battle tables, sharing one preferences store.
#[derive(Debug)]
pub struct LobbyTables {
    users: SortableRowTable,
    battles: SortableRowTable,
}

impl LobbyTables {
    pub fn new(prefs: SharedPrefs, layout: TableLayout) -> Self {
        let build = |list: LobbyList| {
            let options = list
                .table_options()
                .with_size(layout.width, layout.height)
                .with_row_metrics(TERMINAL_LINE, TERMINAL_LINE)
                .with_min_column_width(TERMINAL_MIN_COLUMN_WIDTH)
                .persist(layout.save_prefs);
            SortableRowTable::new(options, SharedPrefs::clone(&prefs))
        };
        Self {
            users: build(LobbyList::Users),
            battles: build(LobbyList::Battles),
        }
    }

    pub fn get(&self, list: LobbyList) -> &SortableRowTable {
        match list {
            LobbyList::Users => &self.users,
            LobbyList::Battles => &self.battles,
        }
    }

    pub fn get_mut(&mut self, list: LobbyList) -> &mut SortableRowTable {
        match list {
            LobbyList::Users => &mut self.users,
            LobbyList::Battles => &mut self.battles,
        }
    }

    pub fn apply(&mut self, list: LobbyList, change: RowChange) -> Result<(), TableError> {
        apply_row_change(self.get_mut(list), change)
    }

    /// Saves every table configured to persist. `false` if any write failed.
    pub fn save_all(&self) -> bool {
        LobbyList::ALL
            .iter()
            .map(|list| self.get(*list))
            .filter(|table| table.saves_prefs())
            .fold(true, |ok, table| table.save_prefs() && ok)
    }
}

/// Source of lobby rows. Updates arrive on a background thread and are
/// applied on the UI thread.
pub trait LobbyFeed {
    fn snapshot(&mut self, list: LobbyList) -> Result<Vec<GridRow>>;
    fn spawn_updates(&mut self, tx: Sender<InternalEvent>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    Change { list: LobbyList, change: RowChange },
    FeedStatus(String),
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceContent {
    Text(String),
    Swatch(Rgb),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHeader {
    pub label: String,
    pub sort: Option<SortDirection>,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCell {
    pub content: SurfaceContent,
    pub selected: bool,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRow {
    pub index: usize,
    pub cells: Vec<SurfaceCell>,
}

/// Collects a table's draw calls for one frame and turns them into a
/// ratatui `Table`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalSurface {
    height: u32,
    headers: Vec<SurfaceHeader>,
    rows: Vec<SurfaceRow>,
}

impl TerminalSurface {
    pub fn new(height: u16) -> Self {
        Self {
            height: u32::from(height),
            ..Self::default()
        }
    }

    pub fn begin_frame(&mut self, height: u16) {
        self.height = u32::from(height);
        self.headers.clear();
        self.rows.clear();
    }

    pub fn headers(&self) -> &[SurfaceHeader] {
        &self.headers
    }

    pub fn rows(&self) -> &[SurfaceRow] {
        &self.rows
    }

    /// Builds the widget for an area `area_width` cells wide. Columns keep
    /// the table's widths; the ones past the right edge are clipped rather
    /// than squeezed, so clicks hit-test against the drawn positions.
    pub fn widget(&self, area_width: u16) -> Table<'static> {
        let widths = visible_widths(self.headers.iter().map(|header| header.width), area_width);

        let header = Row::new(self.headers.iter().take(widths.len()).map(|header| {
            Cell::from(header_label(&header.label, header.sort)).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        }));

        let rows = self
            .rows
            .iter()
            .map(|row| {
                Row::new(
                    row.cells
                        .iter()
                        .zip(&widths)
                        .map(|(cell, width)| body_cell(cell, *width)),
                )
            })
            .collect::<Vec<_>>();

        let constraints = widths
            .iter()
            .map(|width| Constraint::Length(*width))
            .collect::<Vec<_>>();
        Table::new(rows, constraints).header(header).column_spacing(0)
    }
}

impl TableRenderSurface for TerminalSurface {
    fn viewport_height(&self) -> u32 {
        self.height
    }

    fn draw_header(&mut self, cell: HeaderCell<'_>) {
        self.headers.push(SurfaceHeader {
            label: cell.label.to_owned(),
            sort: cell.sort,
            width: cell.rect.width,
        });
    }

    fn draw_cell(&mut self, cell: BodyCell<'_>) {
        let content = match cell.content {
            CellContent::Text(text) => SurfaceContent::Text(text.to_owned()),
            CellContent::Swatch(color) => SurfaceContent::Swatch(color),
        };
        let drawn = SurfaceCell {
            content,
            selected: cell.selected,
            width: cell.rect.width,
        };
        match self.rows.last_mut() {
            Some(row) if row.index == cell.row => row.cells.push(drawn),
            _ => self.rows.push(SurfaceRow {
                index: cell.row,
                cells: vec![drawn],
            }),
        }
    }
}

fn header_label(label: &str, sort: Option<SortDirection>) -> String {
    match sort {
        Some(SortDirection::Asc) => format!("{label} {SORT_ARROW_ASC}"),
        Some(SortDirection::Desc) => format!("{label} {SORT_ARROW_DESC}"),
        None => label.to_owned(),
    }
}

/// Column widths that fit in `area_width`, the last one cut at the edge.
fn visible_widths(widths: impl IntoIterator<Item = u32>, area_width: u16) -> Vec<u16> {
    let mut left = 0u16;
    let mut visible = Vec::new();
    for width in widths {
        let remaining = area_width.saturating_sub(left);
        if remaining == 0 {
            break;
        }
        let width = clamp_u16(width).min(remaining);
        visible.push(width);
        left = left.saturating_add(width);
    }
    visible
}

fn body_cell(cell: &SurfaceCell, width: u16) -> Cell<'static> {
    let mut style = Style::default();
    if cell.selected {
        style = style.bg(Color::DarkGray);
    }
    match &cell.content {
        SurfaceContent::Text(text) => Cell::from(text.clone()).style(style),
        SurfaceContent::Swatch(color) => Cell::from(swatch_text(u32::from(width)))
            .style(style.fg(Color::Rgb(color.r, color.g, color.b))),
    }
}

/// Solid block with a one-column margin on each side when there is room.
fn swatch_text(width: u32) -> String {
    let width = width as usize;
    if width <= 2 {
        return SWATCH_GLYPH.repeat(width);
    }
    format!(" {} ", SWATCH_GLYPH.repeat(width - 2))
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LastClick {
    row: usize,
    button: MouseButton,
    at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct MouseTracker {
    header_press: Option<usize>,
    resizing: Option<usize>,
    last_click: Option<LastClick>,
}

impl MouseTracker {
    fn register_click(&mut self, row: usize, button: MouseButton, now: Instant) -> bool {
        let double = self.last_click.is_some_and(|last| {
            last.row == row
                && last.button == button
                && now.duration_since(last.at) <= DOUBLE_CLICK_WINDOW
        });
        // a third click starts a new pair
        self.last_click = if double {
            None
        } else {
            Some(LastClick {
                row,
                button,
                at: now,
            })
        };
        double
    }
}

fn table_button(button: TermButton) -> MouseButton {
    match button {
        TermButton::Left => MouseButton::Left,
        TermButton::Right => MouseButton::Right,
        TermButton::Middle => MouseButton::Middle,
    }
}

fn local_point(area: Rect, column: u16, row: u16) -> Option<(u32, u32)> {
    let inside = column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height);
    inside.then(|| (u32::from(column - area.x), u32::from(row - area.y)))
}

fn table_input_for_mouse(
    mouse: MouseEvent,
    area: Rect,
    table: &SortableRowTable,
    tracker: &mut MouseTracker,
    now: Instant,
) -> Option<TableInput> {
    let point = local_point(area, mouse.column, mouse.row);
    let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);

    match mouse.kind {
        MouseEventKind::ScrollUp => point.map(|_| TableInput::Wheel { delta: -1, shift }),
        MouseEventKind::ScrollDown => point.map(|_| TableInput::Wheel { delta: 1, shift }),
        MouseEventKind::Down(button) => {
            let (x, y) = point?;
            let button = table_button(button);
            match table.hit_test(x, y) {
                HitRegion::HeaderBorder { column } if button == MouseButton::Left => {
                    tracker.resizing = Some(column);
                    None
                }
                HitRegion::Header { column } | HitRegion::HeaderBorder { column } => {
                    tracker.header_press = Some(column);
                    None
                }
                HitRegion::Cell { row, .. } => {
                    let double = tracker.register_click(row, button, now);
                    Some(TableInput::CellPush {
                        row,
                        button,
                        double,
                    })
                }
                HitRegion::Background => {
                    tracker.last_click = None;
                    Some(TableInput::BackgroundPush { button })
                }
            }
        }
        MouseEventKind::Drag(TermButton::Left) => {
            let column = tracker.resizing?;
            let x = u32::from(mouse.column.saturating_sub(area.x));
            let width = (x + 1).saturating_sub(table.column_x(column));
            Some(TableInput::ColumnResize { column, width })
        }
        MouseEventKind::Up(button) => {
            if tracker.resizing.take().is_some() {
                return Some(TableInput::Release);
            }
            let pressed = tracker.header_press.take();
            let released = point.map(|(x, y)| table.hit_test(x, y));
            match (pressed, released) {
                (
                    Some(pressed),
                    Some(HitRegion::Header { column } | HitRegion::HeaderBorder { column }),
                ) if pressed == column => Some(TableInput::HeaderRelease {
                    column,
                    button: table_button(button),
                }),
                _ => Some(TableInput::Release),
            }
        }
        _ => None,
    }
}

fn nav_key_for(key: KeyEvent) -> Option<NavKey> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(NavKey::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(NavKey::Down),
        KeyCode::PageUp => Some(NavKey::PageUp),
        KeyCode::PageDown => Some(NavKey::PageDown),
        KeyCode::Home | KeyCode::Char('g') => Some(NavKey::Home),
        KeyCode::End | KeyCode::Char('G') => Some(NavKey::End),
        _ => None,
    }
}

fn lobby_command_for_key(key: KeyEvent) -> Option<LobbyCommand> {
    match key.code {
        KeyCode::Tab => Some(LobbyCommand::NextList),
        KeyCode::BackTab => Some(LobbyCommand::PrevList),
        KeyCode::Char('1') => Some(LobbyCommand::ShowList(LobbyList::Users)),
        KeyCode::Char('2') => Some(LobbyCommand::ShowList(LobbyList::Battles)),
        _ => None,
    }
}

fn is_quit_key(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    surface: TerminalSurface,
    table_area: Rect,
    mouse: MouseTracker,
    status_token: u64,
    render_error: Option<String>,
}

pub fn run_app<F: LobbyFeed>(
    state: &mut LobbyState,
    tables: &mut LobbyTables,
    feed: &mut F,
) -> Result<()> {
    load_snapshots(tables, feed)?;
    let (internal_tx, internal_rx) = mpsc::channel();
    feed.spawn_updates(internal_tx.clone())
        .context("start lobby feed")?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let mut view_data = ViewData::default();

    let mut result = Ok(());
    loop {
        process_internal_events(state, tables, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) =
            terminal.draw(|frame| render(frame, state, tables, &mut view_data))
        {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, tables, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, tables, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    if !tables.save_all() {
        log::warn!("some table preferences were not saved");
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn load_snapshots<F: LobbyFeed>(tables: &mut LobbyTables, feed: &mut F) -> Result<()> {
    for list in LobbyList::ALL {
        let rows = feed
            .snapshot(list)
            .with_context(|| format!("load {} snapshot", list.label()))?;
        let count = rows.len();
        for row in rows {
            tables
                .apply(list, RowChange::Upsert(row))
                .with_context(|| format!("load {} snapshot", list.label()))?;
        }
        log::info!("loaded {count} {}", list.label());
    }
    Ok(())
}

fn process_internal_events(
    state: &mut LobbyState,
    tables: &mut LobbyTables,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::Change { list, change } => {
                let id = change.id().map(|id| id.to_string());
                if let Err(error) = tables.apply(list, change) {
                    log::warn!("dropped {} change for {id:?}: {error}", list.label());
                    emit_status(state, view_data, tx, format!("{} feed: {error}", list.label()));
                }
                // changes outside of input handling can still move the selection
                let events = tables.get_mut(list).take_events();
                if list == state.active_list {
                    report_table_events(state, tables, view_data, tx, list, &events);
                }
            }
            InternalEvent::FeedStatus(message) => {
                emit_status(state, view_data, tx, message);
            }
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(LobbyCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut LobbyState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(LobbyCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Returns `true` when the app should quit.
fn handle_key_event(
    state: &mut LobbyState,
    tables: &mut LobbyTables,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if is_quit_key(key) {
        return true;
    }

    if let Some(command) = lobby_command_for_key(key) {
        for event in state.dispatch(command) {
            if let LobbyEvent::ListChanged(list) = event {
                view_data.mouse = MouseTracker::default();
                log::debug!("switched to {}", list.label());
            }
        }
        return false;
    }

    let list = state.active_list;
    if let Some(nav) = nav_key_for(key) {
        let outcome = tables.get_mut(list).handle(TableInput::Key(nav));
        report_table_events(state, tables, view_data, internal_tx, list, &outcome.events);
        return false;
    }

    match key.code {
        KeyCode::Char('r') => {
            let table = tables.get_mut(list);
            if let Some(order) = table.sort_order()
                && table.sort(order.column, order.direction.toggled()).is_ok()
            {
                let label = table.columns()[order.column].label.clone();
                let direction = order.direction.toggled().as_str();
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("sorted by {label} {direction}"),
                );
            }
        }
        KeyCode::Char('s') => {
            let message = if tables.get(list).save_prefs() {
                format!("saved {} layout", list.label())
            } else {
                format!("saving {} layout failed; see log", list.label())
            };
            emit_status(state, view_data, internal_tx, message);
        }
        _ => {}
    }
    false
}

fn handle_mouse_event(
    state: &mut LobbyState,
    tables: &mut LobbyTables,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    let list = state.active_list;
    let table = tables.get_mut(list);
    let Some(input) = table_input_for_mouse(
        mouse,
        view_data.table_area,
        table,
        &mut view_data.mouse,
        Instant::now(),
    ) else {
        return;
    };
    let outcome = table.handle(input);
    if !outcome.consumed {
        log::trace!("{input:?} not consumed by {}", list.label());
    }
    report_table_events(state, tables, view_data, internal_tx, list, &outcome.events);
}

fn report_table_events(
    state: &mut LobbyState,
    tables: &LobbyTables,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    list: LobbyList,
    events: &[TableEvent],
) {
    let table = tables.get(list);
    for event in events {
        match *event {
            TableEvent::RowDoubleClicked { row, .. } => {
                if let Ok(row) = table.row(row) {
                    emit_status(state, view_data, internal_tx, activation_status(list, row));
                }
            }
            TableEvent::RowClicked {
                row,
                button: MouseButton::Right,
            } => {
                if let Ok(row) = table.row(row) {
                    log::debug!("context request for {}", row.id);
                }
            }
            TableEvent::SelectionChanged(selected) => {
                log::trace!("{} selection {selected:?}", list.label());
            }
            TableEvent::RowClicked { .. } => {}
        }
    }
}

fn activation_status(list: LobbyList, row: &GridRow) -> String {
    let name = row.cell(0).unwrap_or(row.id.as_str());
    match list {
        LobbyList::Users => format!("open chat with {name}"),
        LobbyList::Battles => format!("join battle {name}"),
    }
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    state: &LobbyState,
    tables: &mut LobbyTables,
    view_data: &mut ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(2),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = LobbyList::ALL
        .iter()
        .position(|list| *list == state.active_list)
        .unwrap_or(0);
    let tab_titles = LobbyList::ALL
        .iter()
        .map(|list| format!("{} ({})", list.label(), tables.get(*list).row_count()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("lobbygrid").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let body = Block::default()
        .borders(Borders::ALL)
        .title(state.active_list.label());
    let inner = layout[1].inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    frame.render_widget(body, layout[1]);
    view_data.table_area = inner;

    let table = tables.get_mut(state.active_list);
    view_data.surface.begin_frame(inner.height);
    match table.render(&mut view_data.surface) {
        Ok(()) => {
            view_data.render_error = None;
            frame.render_widget(view_data.surface.widget(inner.width), inner);
        }
        Err(error) => {
            if view_data.render_error.as_deref() != Some(&error.to_string()) {
                log::error!("render {}: {error}", table.name());
            }
            view_data.render_error = Some(error.to_string());
            let message = Paragraph::new(format!("cannot draw table: {error}"))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(message, inner);
        }
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn status_text(state: &LobbyState) -> String {
    match &state.status_line {
        Some(message) => message.clone(),
        None => "tab list  ↑/↓ move  click header sort  r reverse  s save  q quit".to_owned(),
    }
}
