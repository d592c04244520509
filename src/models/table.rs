use serde::{Deserialize, Serialize};

/// A single cell of an ad-hoc table. Content is plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: u32,
    #[serde(default)]
    pub content: String,
}

/// A table row. The editor keeps `cells.len()` equal to the owning table's `column_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: u32,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// An ad-hoc table attached to a group, subgroup or category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Gradient spec for the table title band. Inherits the enclosing band when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<String>,
    /// Number of columns; equal to the cell count of every row.
    pub column_count: usize,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table with no rows.
    pub fn empty(id: u32, name: impl Into<String>, column_count: usize) -> Self {
        Table {
            id,
            name: name.into(),
            color_scale: None,
            column_count,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string rows; row and cell ids are assigned sequentially from 1.
    pub fn from_rows<R, C>(id: u32, name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows: Vec<Row> = rows
            .into_iter()
            .enumerate()
            .map(|(row_idx, cells)| Row {
                id: row_idx as u32 + 1,
                cells: cells
                    .into_iter()
                    .enumerate()
                    .map(|(cell_idx, content)| Cell {
                        id: cell_idx as u32 + 1,
                        content: content.into(),
                    })
                    .collect(),
            })
            .collect();
        let column_count = rows.first().map_or(0, |r| r.cells.len());
        Table {
            id,
            name: name.into(),
            color_scale: None,
            column_count,
            rows,
        }
    }

    /// Total number of cell slots (`rows × columns`).
    pub fn cell_slots(&self) -> usize {
        self.rows.len() * self.column_count
    }
}
