use std::num::NonZeroU32;

use serde::{Serialize, Deserialize};

use crate::error::EditError;
use super::mapper::Cell;
use super::piece::PieceHandle;

/// Row-major 2D store of optional piece handles, one slot per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStore {
    columns: u32,
    rows: u32,
    slots: Vec<Option<PieceHandle>>,
}

/// Result of planning a resize: the new store plus every piece that fell
/// outside the new bounds. Nothing is destroyed until the plan is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizePlan {
    pub store: GridStore,
    pub destroyed: Vec<PieceHandle>,
}

impl GridStore {
    pub fn new(columns: u32, rows: u32) -> Result<Self, EditError> {
        match (NonZeroU32::new(columns), NonZeroU32::new(rows)) {
            (Some(columns), Some(rows)) => Ok(Self::blank(columns, rows)),
            _ => Err(EditError::InvalidDimensions { cols: columns, rows }),
        }
    }

    /// Empty store of a size that is known to be valid.
    pub fn blank(columns: NonZeroU32, rows: NonZeroU32) -> Self {
        let (columns, rows) = (columns.get(), rows.get());
        Self {
            columns,
            rows,
            slots: vec![None; columns as usize * rows as usize],
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    fn index(&self, cell: Cell) -> Result<usize, EditError> {
        if cell.col < 0 || cell.row < 0 || cell.col as u32 >= self.columns || cell.row as u32 >= self.rows {
            return Err(EditError::OutOfBounds { col: cell.col, row: cell.row });
        }
        Ok(cell.col as usize + cell.row as usize * self.columns as usize)
    }

    pub fn get(&self, cell: Cell) -> Result<Option<PieceHandle>, EditError> {
        let i = self.index(cell)?;
        Ok(self.slots[i])
    }

    /// Store `piece` in `cell`, returning the previous occupant.
    pub fn set(&mut self, cell: Cell, piece: Option<PieceHandle>) -> Result<Option<PieceHandle>, EditError> {
        let i = self.index(cell)?;
        Ok(std::mem::replace(&mut self.slots[i], piece))
    }

    pub fn take(&mut self, cell: Cell) -> Result<Option<PieceHandle>, EditError> {
        self.set(cell, None)
    }

    /// Cell currently holding `piece`, if any.
    pub fn find(&self, piece: PieceHandle) -> Option<Cell> {
        self.occupied().find(|&(_, h)| h == piece).map(|(cell, _)| cell)
    }

    /// All occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, PieceHandle)> + '_ {
        let columns = self.columns as usize;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.map(|h| (Cell::new((i % columns) as i32, (i / columns) as i32), h))
        })
    }

    /// Slot count matches the dimensions. Only deserialized stores can fail this.
    pub fn is_well_formed(&self) -> bool {
        self.columns > 0 && self.rows > 0 && self.slots.len() == self.columns as usize * self.rows as usize
    }

    pub fn len_occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Plan a resize. Pieces inside the intersection of old and new bounds
    /// keep their cell; all others are listed for destruction.
    pub fn resized(&self, columns: u32, rows: u32) -> Result<ResizePlan, EditError> {
        let mut store = GridStore::new(columns, rows)?;
        let mut destroyed = Vec::new();
        for (cell, piece) in self.occupied() {
            if (cell.col as u32) < columns && (cell.row as u32) < rows {
                store.set(cell, Some(piece))?;
            } else {
                destroyed.push(piece);
            }
        }
        Ok(ResizePlan { store, destroyed })
    }
}
