use glam::Vec2;
use serde::{Serialize, Deserialize};

/// A grid location. Signed so that cells left of / below the origin are
/// representable and can be rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.col, self.row)
    }
}

/// Converts between world positions and grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMapper {
    pub origin: Vec2,
    pub cell_size: f32,
    pub columns: u32,
    pub rows: u32,
}

impl GridMapper {
    pub fn new(origin: Vec2, cell_size: f32, columns: u32, rows: u32) -> Self {
        Self { origin, cell_size, columns, rows }
    }

    /// Cell containing `point`. Uses floor so that points left of or below
    /// the origin land in negative cells instead of folding into column/row 0.
    pub fn world_to_grid(&self, point: Vec2) -> Cell {
        let local = (point - self.origin) / self.cell_size;
        Cell::new(local.x.floor() as i32, local.y.floor() as i32)
    }

    /// Centre of the cell in world space.
    pub fn grid_to_world(&self, cell: Cell) -> Vec2 {
        let half = self.cell_size / 2.0;
        self.origin + Vec2::new(
            cell.col as f32 * self.cell_size + half,
            cell.row as f32 * self.cell_size + half,
        )
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.col >= 0
            && (cell.col as i64) < self.columns as i64
            && cell.row >= 0
            && (cell.row as i64) < self.rows as i64
    }

    /// Whether `point` lies on the grid area. Both edges are inclusive, so a
    /// point on the far edge is inside even though `world_to_grid` maps it to
    /// a cell one past the last column/row.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let max = self.origin + self.world_size();
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.columns as f32, self.rows as f32) * self.cell_size
    }

    /// Min and max corners of a cell.
    pub fn cell_rect(&self, cell: Cell) -> (Vec2, Vec2) {
        let min = self.origin + Vec2::new(cell.col as f32, cell.row as f32) * self.cell_size;
        (min, min + Vec2::splat(self.cell_size))
    }
}
