//! Tabular column widths.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Narrowest width any column can be dragged to, in pixels.
pub const MIN_COLUMN_WIDTH: u32 = 50;

/// The fixed set of columns in the request table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    /// HTTP method.
    Method,
    /// Response status.
    Status,
    /// Host.
    Domain,
    /// Path.
    Path,
    /// Response content type.
    ContentType,
    /// Round-trip duration.
    Duration,
}

impl ColumnKey {
    /// Every column, in display order.
    pub const ALL: [Self; 6] = [
        Self::Method,
        Self::Status,
        Self::Domain,
        Self::Path,
        Self::ContentType,
        Self::Duration,
    ];

    /// Width a column starts with.
    #[must_use]
    pub const fn default_width(self) -> u32 {
        match self {
            Self::Method | Self::Status => 80,
            Self::Domain => 200,
            Self::Path => 320,
            Self::ContentType => 160,
            Self::Duration => 100,
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Status => "status",
            Self::Domain => "domain",
            Self::Path => "path",
            Self::ContentType => "content_type",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of every column. Always holds one entry per `ColumnKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnWidths(BTreeMap<ColumnKey, u32>);

impl ColumnWidths {
    /// Returns the width of a column.
    #[must_use]
    pub fn get(&self, column: ColumnKey) -> u32 {
        self.0
            .get(&column)
            .copied()
            .unwrap_or_else(|| column.default_width())
    }

    /// Sets a column's width, raising it to `MIN_COLUMN_WIDTH` if needed.
    pub fn set(&mut self, column: ColumnKey, width: u32) {
        self.0.insert(column, width.max(MIN_COLUMN_WIDTH));
    }

    /// Iterates over `(column, width)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnKey, u32)> + '_ {
        self.0.iter().map(|(key, width)| (*key, *width))
    }
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self(
            ColumnKey::ALL
                .into_iter()
                .map(|key| (key, key.default_width()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_column() {
        let widths = ColumnWidths::default();
        assert_eq!(widths.iter().count(), ColumnKey::ALL.len());
        assert!(widths.iter().all(|(_, w)| w >= MIN_COLUMN_WIDTH));
    }

    #[test]
    fn set_clamps_to_floor() {
        let mut widths = ColumnWidths::default();
        widths.set(ColumnKey::Path, 10);
        assert_eq!(widths.get(ColumnKey::Path), MIN_COLUMN_WIDTH);
    }
}
