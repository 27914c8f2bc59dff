pub mod grid;
pub mod mapper;
pub mod piece;

use std::num::NonZeroU32;

use glam::Vec2;
use serde::{Serialize, Deserialize};

use crate::error::EditError;
pub use grid::{GridStore, ResizePlan};
pub use mapper::{Cell, GridMapper};
pub use piece::{PieceHandle, PieceHost, PieceInstance, PieceWorld};

/// Default cell size: a 128px sprite at 100 pixels per unit.
pub const DEFAULT_CELL_SIZE: f32 = 1.28;
pub const DEFAULT_COLUMNS: u32 = DEFAULT_SIZE.0.get();
pub const DEFAULT_ROWS: u32 = DEFAULT_SIZE.1.get();
const DEFAULT_SIZE: (NonZeroU32, NonZeroU32) = (NonZeroU32::MIN.saturating_add(19), NonZeroU32::MIN.saturating_add(9));

/// The editable grid: coordinate mapping plus the slot array. Dimensions in
/// the mapper and the store always change together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    mapper: GridMapper,
    grid: GridStore,
}

impl Level {
    pub fn new(columns: u32, rows: u32, cell_size: f32, origin: Vec2) -> Result<Self, EditError> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(EditError::InvalidDimensions { cols: columns, rows });
        }
        Ok(Self {
            mapper: GridMapper::new(origin, cell_size, columns, rows),
            grid: GridStore::new(columns, rows)?,
        })
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    /// (columns, rows)
    pub fn grid_size(&self) -> (u32, u32) {
        (self.grid.columns(), self.grid.rows())
    }

    /// Occupant of `cell`; out-of-bounds cells read as empty.
    pub fn piece_at(&self, cell: Cell) -> Option<PieceHandle> {
        self.grid.get(cell).ok().flatten()
    }

    /// Structural check for levels read from disk.
    pub fn check(&self) -> Result<(), String> {
        if !self.grid.is_well_formed() {
            return Err("Grid data does not match its dimensions".to_string());
        }
        if (self.mapper.columns, self.mapper.rows) != self.grid_size() {
            return Err("Grid mapper and store disagree on size".to_string());
        }
        if self.mapper.cell_size <= 0.0 || !self.mapper.cell_size.is_finite() {
            return Err(format!("Invalid cell size {}", self.mapper.cell_size));
        }
        Ok(())
    }

    pub(crate) fn grid_mut(&mut self) -> &mut GridStore {
        &mut self.grid
    }

    pub fn plan_resize(&self, columns: u32, rows: u32) -> Result<ResizePlan, EditError> {
        self.grid.resized(columns, rows)
    }

    /// Commit a resize plan: swap in the new store and dimensions, then
    /// destroy every piece that fell outside. Not undoable.
    pub fn apply_resize(&mut self, plan: ResizePlan, host: &mut dyn PieceHost) -> Vec<PieceHandle> {
        self.mapper.columns = plan.store.columns();
        self.mapper.rows = plan.store.rows();
        self.grid = plan.store;
        for &piece in &plan.destroyed {
            host.destroy(piece);
        }
        log::info!(
            "Resized level to {}x{} ({} pieces destroyed)",
            self.mapper.columns,
            self.mapper.rows,
            plan.destroyed.len()
        );
        plan.destroyed
    }
}

impl Default for Level {
    fn default() -> Self {
        Self {
            mapper: GridMapper::new(Vec2::ZERO, DEFAULT_CELL_SIZE, DEFAULT_COLUMNS, DEFAULT_ROWS),
            grid: GridStore::blank(DEFAULT_SIZE.0, DEFAULT_SIZE.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::template::{Category, PieceTemplate};

    fn template() -> PieceTemplate {
        PieceTemplate {
            id: "rock".into(),
            name: "Rock".into(),
            category: Category::Terrain,
            sprite: None,
            color: [90, 90, 90, 255],
            properties: Default::default(),
        }
    }

    #[test]
    fn test_default_level() {
        let level = Level::default();
        assert_eq!(level.grid_size(), (20, 10));
        assert_eq!(level.mapper().cell_size, DEFAULT_CELL_SIZE);
    }

    #[test]
    fn test_invalid_cell_size() {
        assert!(Level::new(4, 4, 0.0, Vec2::ZERO).is_err());
        assert!(Level::new(4, 4, -1.0, Vec2::ZERO).is_err());
        assert!(Level::new(0, 4, 1.0, Vec2::ZERO).is_err());
    }

    #[test]
    fn test_apply_resize_updates_dimensions_and_destroys() {
        let mut level = Level::new(4, 4, 2.0, Vec2::ZERO).unwrap();
        let mut world = PieceWorld::new();
        let kept = world.instantiate(&template(), "kept".into(), Vec2::new(3.0, 3.0)).unwrap();
        let lost = world.instantiate(&template(), "lost".into(), Vec2::new(7.0, 7.0)).unwrap();
        level.grid_mut().set(Cell::new(1, 1), Some(kept)).unwrap();
        level.grid_mut().set(Cell::new(3, 3), Some(lost)).unwrap();

        let plan = level.plan_resize(2, 2).unwrap();
        let destroyed = level.apply_resize(plan, &mut world);

        assert_eq!(destroyed, vec![lost]);
        assert_eq!(level.grid_size(), (2, 2));
        assert_eq!(level.mapper().columns, 2);
        assert_eq!(level.piece_at(Cell::new(1, 1)), Some(kept));
        assert!(world.get(lost).is_none());
        assert!(world.get(kept).is_some());
        assert_eq!(level.piece_at(Cell::new(3, 3)), None);
        assert!(level.check().is_ok());
    }

    #[test]
    fn test_check_rejects_mismatched_mapper() {
        let mut level = Level::new(4, 4, 1.0, Vec2::ZERO).unwrap();
        assert!(level.check().is_ok());
        level.mapper.columns = 5;
        assert!(level.check().is_err());
    }
}
