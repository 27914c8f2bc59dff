use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::error::EditError;
use crate::level::{Level, PieceWorld};
use crate::settings::GridSettings;

/// Everything saved in a level file: the grid and the pieces placed on it.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub level: Level,
    pub pieces: PieceWorld,
}

impl Scene {
    /// A fresh level scene: empty grid at the world origin.
    pub fn new_level(grid: &GridSettings) -> Result<Self, EditError> {
        Ok(Self {
            level: Level::new(grid.columns, grid.rows, grid.cell_size, glam::Vec2::ZERO)?,
            pieces: PieceWorld::new(),
        })
    }

    /// Every grid slot must point at a live piece and every piece must sit in
    /// exactly one slot.
    pub fn validate(&self) -> Result<(), String> {
        self.level.check()?;
        self.pieces.check()?;
        let mut placed = BTreeSet::new();
        for (cell, piece) in self.level.grid().occupied() {
            if self.pieces.get(piece).is_none() {
                return Err(format!("Cell {cell} refers to a missing piece"));
            }
            if !placed.insert(piece) {
                return Err(format!("Cell {cell} repeats a piece placed in another cell"));
            }
        }
        let unplaced = self.pieces.iter().filter(|(h, _)| !placed.contains(h)).count();
        if unplaced > 0 {
            return Err(format!("{unplaced} pieces are not on the grid"));
        }
        Ok(())
    }

    /// Template ids used by placed pieces that `known` does not recognise.
    pub fn unresolved_templates(&self, known: impl Fn(&str) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = self
            .pieces
            .iter()
            .map(|(_, p)| p.template_id.as_str())
            .filter(|id| !known(id))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
