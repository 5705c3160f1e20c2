//! Persisted board layout shape.

use serde::{Deserialize, Serialize};

use crate::{BoardError, BoardSize};

/// Persisted board layout: `cells[x][y]`.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Outer sequence indexed by `x`, inner sequence indexed by `y`.
    pub cells: Vec<Vec<CellSnapshot>>,
}

/// Persisted stack of surfaces at one cell.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Surfaces in insertion order.
    pub surfaces: Vec<SurfaceSnapshot>,
}

/// Persisted boundaries of one surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    /// Upper boundary of the slab.
    pub top: i32,
    /// Lower boundary of the slab.
    pub bottom: i32,
}

impl BoardSnapshot {
    /// Parses the persisted JSON layout.
    ///
    /// Syntax errors, missing fields and ragged rows are all reported as
    /// [`BoardError::MalformedSnapshot`].
    pub fn from_json(text: &str) -> Result<Self, BoardError> {
        let snapshot: Self =
            serde_json::from_str(text).map_err(|error| BoardError::MalformedSnapshot {
                reason: error.to_string(),
            })?;
        let _ = snapshot.size()?;
        Ok(snapshot)
    }

    /// Extent described by the snapshot.
    ///
    /// Every inner column must have the same length; an empty outer sequence
    /// describes a `0 x 0` board.
    pub fn size(&self) -> Result<BoardSize, BoardError> {
        let columns = self.cells.first().map_or(0, Vec::len);
        if let Some((x, column)) = self
            .cells
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != columns)
        {
            return Err(BoardError::MalformedSnapshot {
                reason: format!(
                    "row {x} holds {} cells, expected {columns}",
                    column.len()
                ),
            });
        }

        let x = u32::try_from(self.cells.len()).map_err(|_| BoardError::MalformedSnapshot {
            reason: "too many rows".to_owned(),
        })?;
        let y = u32::try_from(columns).map_err(|_| BoardError::MalformedSnapshot {
            reason: "too many columns".to_owned(),
        })?;
        Ok(BoardSize::new(x, y))
    }
}
