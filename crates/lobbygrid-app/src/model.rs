// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::ids::RowId;

/// Header label that marks a packed-color column when columns are built from
/// plain header strings.
pub const COLOR_HEADER: &str = "color";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new<I, S>(id: impl Into<RowId>, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn color(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ColumnKind::Color,
        }
    }

    /// Builds a column from a bare header. `"color"` becomes a swatch column.
    pub fn from_header(label: impl Into<String>) -> Self {
        let label = label.into();
        if label == COLOR_HEADER {
            Self::color(label)
        } else {
            Self::text(label)
        }
    }

    pub fn from_headers<I, S>(headers: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        headers.into_iter().map(Self::from_header).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::Desc)
    }

    pub const fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::Desc } else { Self::Asc }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortOrder {
    pub const fn ascending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn descending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a `0xBBGGRR` value: red in the low byte.
    pub const fn from_packed_bgr(value: i64) -> Self {
        Self {
            r: (value & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: ((value >> 16) & 0xff) as u8,
        }
    }

    pub const fn to_packed_bgr(self) -> i64 {
        (self.r as i64) | ((self.g as i64) << 8) | ((self.b as i64) << 16)
    }
}

/// Decodes the stored text of a color cell. Anything but a non-negative
/// 32-bit integer means the producer handed the table corrupt data.
pub fn decode_color(row: &RowId, column: usize, raw: &str) -> Result<Rgb, TableError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|value| *value >= 0)
        .map(|value| Rgb::from_packed_bgr(i64::from(value)))
        .ok_or_else(|| TableError::DataIntegrity {
            id: row.clone(),
            column,
            value: raw.to_owned(),
        })
}
