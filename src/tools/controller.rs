use std::rc::Rc;

use glam::Vec2;
use image::RgbaImage;

use crate::error::EditError;
use crate::level::{Cell, Level, PieceHandle, PieceHost};
use crate::palette::{PieceTemplate, SelectionObserver};
use super::EditMode;

/// Phase of a pointer gesture in the scene view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Drag,
    Up,
    /// The gesture ended without a release (cursor left the window, focus lost).
    Cancel,
}

/// A pointer event already projected into world space by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub world: Vec2,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, world: Vec2) -> Self {
        Self { phase, world }
    }
}

/// What the controller did in response to an event. The host redraws and
/// shows messages; it never needs to inspect controller internals.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEffect {
    /// The event was not used; the host may apply default navigation.
    PassThrough,
    Redraw,
    Painted { cell: Cell, piece: PieceHandle },
    Erased { cell: Cell, piece: PieceHandle },
    Moved { from: Cell, to: Cell, piece: PieceHandle },
    MoveRejected { cell: Cell, piece: PieceHandle },
    InspectChanged(Option<PieceHandle>),
    /// User-visible message (e.g. a piece could not be placed).
    Message(String),
}

/// The piece under edit and where its move started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inspected {
    pub piece: PieceHandle,
    pub origin: Cell,
    /// Pointer position relative to the piece when it was grabbed.
    grab_offset: Vec2,
}

/// Grid-editing state machine. Owns no pieces: it holds handles and cells
/// and mutates the level and host it is handed.
#[derive(Default)]
pub struct EditModeController {
    mode: EditMode,
    selected: Option<Rc<PieceTemplate>>,
    selected_preview: Option<Rc<RgbaImage>>,
    inspected: Option<Inspected>,
    /// A pointer gesture that grabbed the inspected piece is in progress.
    dragging: bool,
    /// Last cell painted during the current gesture.
    last_painted: Option<Cell>,
}

impl EditModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn selected_template(&self) -> Option<&Rc<PieceTemplate>> {
        self.selected.as_ref()
    }

    pub fn selected_preview(&self) -> Option<&Rc<RgbaImage>> {
        self.selected_preview.as_ref()
    }

    pub fn inspected_piece(&self) -> Option<PieceHandle> {
        self.inspected.map(|i| i.piece)
    }

    pub fn inspected(&self) -> Option<&Inspected> {
        self.inspected.as_ref()
    }

    /// The free-drag handle of the inspected piece: its handle and live position.
    pub fn drag_handle(&self, host: &dyn PieceHost) -> Option<(PieceHandle, Vec2)> {
        let inspected = self.inspected?;
        host.position(inspected.piece).map(|p| (inspected.piece, p))
    }

    pub fn set_mode(&mut self, mode: EditMode, level: &Level, host: &mut dyn PieceHost) -> Vec<EditEffect> {
        if mode == self.mode {
            return Vec::new();
        }
        log::debug!("Mode {:?} -> {:?}", self.mode, mode);
        let mut effects = Vec::new();
        if self.dragging {
            // Abandoned drag: put the piece back where it was.
            if let Some(inspected) = self.inspected {
                host.set_position(inspected.piece, level.mapper().grid_to_world(inspected.origin));
            }
        }
        if self.inspected.take().is_some() {
            effects.push(EditEffect::InspectChanged(None));
        }
        self.mode = mode;
        self.dragging = false;
        self.last_painted = None;
        effects.push(EditEffect::Redraw);
        effects
    }

    /// Forget per-level session state (used when the level is replaced).
    pub fn reset(&mut self) {
        self.inspected = None;
        self.dragging = false;
        self.last_painted = None;
    }

    pub fn on_pointer_event(
        &mut self,
        event: PointerEvent,
        level: &mut Level,
        host: &mut dyn PieceHost,
    ) -> Vec<EditEffect> {
        let mut effects = Vec::new();
        match self.mode {
            EditMode::View => effects.push(EditEffect::PassThrough),
            EditMode::Paint => match event.phase {
                PointerPhase::Down => {
                    self.last_painted = None;
                    self.paint(event.world, level, host, &mut effects);
                }
                PointerPhase::Drag => self.paint(event.world, level, host, &mut effects),
                PointerPhase::Up | PointerPhase::Cancel => self.last_painted = None,
            },
            EditMode::Erase => match event.phase {
                PointerPhase::Down | PointerPhase::Drag => self.erase(event.world, level, host, &mut effects),
                PointerPhase::Up | PointerPhase::Cancel => {}
            },
            EditMode::Edit => match event.phase {
                PointerPhase::Down => self.inspect(event.world, level, host, &mut effects),
                PointerPhase::Drag => {
                    if self.dragging
                        && let Some(inspected) = self.inspected
                    {
                        host.set_position(inspected.piece, event.world - inspected.grab_offset);
                        effects.push(EditEffect::Redraw);
                    }
                }
                PointerPhase::Up | PointerPhase::Cancel => {
                    if self.dragging {
                        self.dragging = false;
                        self.commit_move(level, host, &mut effects);
                    }
                }
            },
        }
        effects
    }

    fn paint(&mut self, world: Vec2, level: &mut Level, host: &mut dyn PieceHost, effects: &mut Vec<EditEffect>) {
        let cell = level.mapper().world_to_grid(world);
        if !level.mapper().contains_cell(cell) {
            return;
        }
        let Some(template) = self.selected.clone() else {
            log::debug!("Paint at {cell} ignored: {}", EditError::NoTemplateSelected);
            return;
        };
        if self.last_painted == Some(cell) && level.piece_at(cell).is_some() {
            return;
        }

        let position = level.mapper().grid_to_world(cell);
        let name = format!("{cell}[{}]", template.name);
        let piece = match host.instantiate(&template, name, position) {
            Ok(piece) => piece,
            Err(e) => {
                log::warn!("Paint at {cell} failed: {e}");
                effects.push(EditEffect::Message(e.to_string()));
                return;
            }
        };
        match level.grid_mut().set(cell, Some(piece)) {
            Ok(Some(previous)) => {
                self.forget_if_inspected(previous, effects);
                host.destroy(previous);
                effects.push(EditEffect::Erased { cell, piece: previous });
            }
            Ok(None) => {}
            Err(e) => {
                // Bounds were checked above; keep the host consistent anyway.
                log::error!("Paint at {cell}: {e}");
                host.destroy(piece);
                return;
            }
        }
        self.last_painted = Some(cell);
        effects.push(EditEffect::Painted { cell, piece });
        effects.push(EditEffect::Redraw);
    }

    fn erase(&mut self, world: Vec2, level: &mut Level, host: &mut dyn PieceHost, effects: &mut Vec<EditEffect>) {
        let cell = level.mapper().world_to_grid(world);
        let Ok(Some(piece)) = level.grid_mut().take(cell) else {
            return;
        };
        self.forget_if_inspected(piece, effects);
        host.destroy(piece);
        effects.push(EditEffect::Erased { cell, piece });
        effects.push(EditEffect::Redraw);
    }

    fn inspect(&mut self, world: Vec2, level: &Level, host: &dyn PieceHost, effects: &mut Vec<EditEffect>) {
        let cell = level.mapper().world_to_grid(world);
        let previous = self.inspected_piece();
        match level.piece_at(cell) {
            Some(piece) => {
                let position = host
                    .position(piece)
                    .unwrap_or_else(|| level.mapper().grid_to_world(cell));
                self.inspected = Some(Inspected { piece, origin: cell, grab_offset: world - position });
                self.dragging = true;
            }
            None => {
                self.inspected = None;
                self.dragging = false;
            }
        }
        if self.inspected_piece() != previous {
            effects.push(EditEffect::InspectChanged(self.inspected_piece()));
        }
        effects.push(EditEffect::Redraw);
    }

    /// Settle the inspected piece into the cell under its dragged position,
    /// or back into its origin cell if that cell is unavailable.
    fn commit_move(&mut self, level: &mut Level, host: &mut dyn PieceHost, effects: &mut Vec<EditEffect>) {
        let Some(inspected) = self.inspected else { return };
        let piece = inspected.piece;
        let origin = inspected.origin;
        if level.piece_at(origin) != Some(piece) {
            log::debug!("Inspected piece {piece:?} no longer at {origin}");
            self.forget_if_inspected(piece, effects);
            return;
        }

        let mapper = *level.mapper();
        let current = host.position(piece).unwrap_or_else(|| mapper.grid_to_world(origin));
        let dest = mapper.world_to_grid(current);

        if dest == origin {
            host.set_position(piece, mapper.grid_to_world(origin));
        } else if !mapper.contains_cell(dest) || level.piece_at(dest).is_some() {
            log::debug!("Move of {piece:?} to {dest} rejected");
            host.set_position(piece, mapper.grid_to_world(origin));
            effects.push(EditEffect::MoveRejected { cell: origin, piece });
        } else {
            let grid = level.grid_mut();
            if let Err(e) = grid.take(origin).and_then(|_| grid.set(dest, Some(piece))) {
                log::error!("Move of {piece:?} failed: {e}");
                return;
            }
            host.set_position(piece, mapper.grid_to_world(dest));
            self.inspected = Some(Inspected { origin: dest, ..inspected });
            effects.push(EditEffect::Moved { from: origin, to: dest, piece });
        }
        effects.push(EditEffect::Redraw);
    }

    fn forget_if_inspected(&mut self, piece: PieceHandle, effects: &mut Vec<EditEffect>) {
        if self.inspected_piece() == Some(piece) {
            self.inspected = None;
            self.dragging = false;
            effects.push(EditEffect::InspectChanged(None));
        }
    }

    /// Resize the level. Destroys pieces outside the new bounds, so it is
    /// refused unless the caller has confirmed with the user.
    pub fn request_resize(
        &mut self,
        level: &mut Level,
        host: &mut dyn PieceHost,
        columns: u32,
        rows: u32,
        confirmed: bool,
    ) -> Result<Vec<PieceHandle>, EditError> {
        if !confirmed {
            return Err(EditError::DestructiveActionUnconfirmed);
        }
        let plan = level.plan_resize(columns, rows)?;
        let destroyed = level.apply_resize(plan, host);
        if let Some(piece) = self.inspected_piece()
            && destroyed.contains(&piece)
        {
            self.inspected = None;
            self.dragging = false;
        }
        Ok(destroyed)
    }
}

impl SelectionObserver for EditModeController {
    fn on_template_selected(&mut self, template: Rc<PieceTemplate>, preview: Option<Rc<RgbaImage>>) {
        log::debug!("Paint template is now '{}'", template.name);
        self.selected = Some(template);
        self.selected_preview = preview;
        self.last_painted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{PieceWorld, PieceInstance};
    use crate::palette::Category;

    fn template(id: &str) -> Rc<PieceTemplate> {
        Rc::new(PieceTemplate {
            id: id.into(),
            name: id.to_uppercase(),
            category: Category::Terrain,
            sprite: None,
            color: [0, 128, 0, 255],
            properties: Default::default(),
        })
    }

    /// 4x4 grid, cell size 2, origin at zero.
    fn setup(mode: EditMode) -> (EditModeController, Level, PieceWorld) {
        let level = Level::new(4, 4, 2.0, Vec2::ZERO).unwrap();
        let mut world = PieceWorld::new();
        let mut ctrl = EditModeController::new();
        ctrl.on_template_selected(template("t"), None);
        ctrl.set_mode(mode, &level, &mut world);
        (ctrl, level, world)
    }

    fn centre(level: &Level, col: i32, row: i32) -> Vec2 {
        level.mapper().grid_to_world(Cell::new(col, row))
    }

    fn down(p: Vec2) -> PointerEvent {
        PointerEvent::new(PointerPhase::Down, p)
    }

    fn drag(p: Vec2) -> PointerEvent {
        PointerEvent::new(PointerPhase::Drag, p)
    }

    fn up(p: Vec2) -> PointerEvent {
        PointerEvent::new(PointerPhase::Up, p)
    }

    fn instance(world: &PieceWorld, level: &Level, col: i32, row: i32) -> PieceInstance {
        let piece = level.piece_at(Cell::new(col, row)).expect("cell occupied");
        world.get(piece).expect("instance alive").clone()
    }

    fn assert_one_piece_per_cell(level: &Level, world: &PieceWorld) {
        let handles: Vec<PieceHandle> = level.grid().occupied().map(|(_, h)| h).collect();
        let mut unique = handles.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), handles.len());
        assert_eq!(handles.len(), world.len());
    }

    #[test]
    fn test_selection_keeps_delivered_preview() {
        let mut ctrl = EditModeController::new();
        let preview = Rc::new(RgbaImage::new(2, 2));
        ctrl.on_template_selected(template("a"), Some(preview.clone()));
        assert!(ctrl.selected_preview().is_some_and(|p| Rc::ptr_eq(p, &preview)));

        ctrl.on_template_selected(template("b"), None);
        assert_eq!(ctrl.selected_template().map(|t| t.id.as_str()), Some("b"));
        assert!(ctrl.selected_preview().is_none());
    }

    #[test]
    fn test_paint_places_piece_at_cell_centre() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        let effects = ctrl.on_pointer_event(down(Vec2::new(2.5, 3.9)), &mut level, &mut world);

        let inst = instance(&world, &level, 1, 1);
        assert_eq!(inst.template_id, "t");
        assert_eq!(inst.position, Vec2::new(3.0, 3.0));
        assert_eq!(inst.name, "[1,1][T]");
        assert!(effects.iter().any(|e| matches!(e, EditEffect::Painted { cell, .. } if *cell == Cell::new(1, 1))));
    }

    #[test]
    fn test_paint_without_template_is_noop() {
        let mut level = Level::new(4, 4, 2.0, Vec2::ZERO).unwrap();
        let mut world = PieceWorld::new();
        let mut ctrl = EditModeController::new();
        ctrl.set_mode(EditMode::Paint, &level, &mut world);

        let effects = ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        assert!(effects.is_empty());
        assert!(world.is_empty());
    }

    #[test]
    fn test_paint_out_of_bounds_is_noop() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        for p in [Vec2::new(-0.5, 1.0), Vec2::new(9.0, 1.0), Vec2::new(1.0, 8.0)] {
            assert!(ctrl.on_pointer_event(down(p), &mut level, &mut world).is_empty());
        }
        assert!(world.is_empty());
    }

    #[test]
    fn test_paint_overwrites_occupant() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        let p = centre(&level, 2, 0);
        ctrl.on_pointer_event(down(p), &mut level, &mut world);
        ctrl.on_pointer_event(up(p), &mut level, &mut world);
        let first = level.piece_at(Cell::new(2, 0)).unwrap();

        ctrl.on_template_selected(template("u"), None);
        ctrl.on_pointer_event(down(p), &mut level, &mut world);

        let second = level.piece_at(Cell::new(2, 0)).unwrap();
        assert_ne!(first, second);
        assert!(world.get(first).is_none());
        assert_eq!(world.get(second).unwrap().template_id, "u");
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_drag_paint_covers_cells_once() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        ctrl.on_pointer_event(down(Vec2::new(0.5, 0.5)), &mut level, &mut world);
        let first = level.piece_at(Cell::new(0, 0)).unwrap();
        ctrl.on_pointer_event(drag(Vec2::new(1.5, 0.5)), &mut level, &mut world);
        assert_eq!(level.piece_at(Cell::new(0, 0)), Some(first));
        ctrl.on_pointer_event(drag(Vec2::new(2.5, 0.5)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(Vec2::new(4.5, 0.5)), &mut level, &mut world);
        ctrl.on_pointer_event(up(Vec2::new(4.5, 0.5)), &mut level, &mut world);

        assert_eq!(level.grid().len_occupied(), 3);
        assert_eq!(world.len(), 3);
    }

    #[test]
    fn test_erase_empty_cell_changes_nothing() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Erase);
        let effects = ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        assert!(effects.is_empty());
        assert_eq!(level.grid().len_occupied(), 0);
    }

    #[test]
    fn test_erase_destroys_occupant() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.set_mode(EditMode::Erase, &level, &mut world);
        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        assert_eq!(level.piece_at(Cell::new(1, 1)), None);
        assert!(world.is_empty());
    }

    fn painted_at(cells: &[(i32, i32)]) -> (EditModeController, Level, PieceWorld) {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        for &(c, r) in cells {
            let p = centre(&level, c, r);
            ctrl.on_pointer_event(down(p), &mut level, &mut world);
            ctrl.on_pointer_event(up(p), &mut level, &mut world);
        }
        ctrl.set_mode(EditMode::Edit, &level, &mut world);
        (ctrl, level, world)
    }

    #[test]
    fn test_edit_select_and_free_drag() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        let piece = level.piece_at(Cell::new(1, 1)).unwrap();

        let effects = ctrl.on_pointer_event(down(Vec2::new(3.5, 2.5)), &mut level, &mut world);
        assert!(effects.contains(&EditEffect::InspectChanged(Some(piece))));
        assert_eq!(ctrl.inspected_piece(), Some(piece));

        // Grab offset is kept: the piece follows the pointer without snapping.
        ctrl.on_pointer_event(drag(Vec2::new(4.0, 3.0)), &mut level, &mut world);
        assert_eq!(ctrl.drag_handle(&world), Some((piece, Vec2::new(3.5, 3.5))));
    }

    #[test]
    fn test_edit_move_to_empty_cell() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        let piece = level.piece_at(Cell::new(1, 1)).unwrap();

        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(Vec2::new(6.7, 1.2)), &mut level, &mut world);
        let effects = ctrl.on_pointer_event(up(Vec2::new(6.7, 1.2)), &mut level, &mut world);

        assert!(effects.contains(&EditEffect::Moved { from: Cell::new(1, 1), to: Cell::new(3, 0), piece }));
        assert_eq!(level.piece_at(Cell::new(1, 1)), None);
        assert_eq!(level.piece_at(Cell::new(3, 0)), Some(piece));
        assert_eq!(world.position(piece), Some(Vec2::new(7.0, 1.0)));
        assert_eq!(ctrl.inspected().map(|i| i.origin), Some(Cell::new(3, 0)));
    }

    #[test]
    fn test_edit_move_out_of_bounds_snaps_back() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        let piece = level.piece_at(Cell::new(1, 1)).unwrap();
        let far = centre(&level, 5, 5);

        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(far), &mut level, &mut world);
        let effects = ctrl.on_pointer_event(up(far), &mut level, &mut world);

        assert!(effects.contains(&EditEffect::MoveRejected { cell: Cell::new(1, 1), piece }));
        assert_eq!(world.position(piece), Some(Vec2::new(3.0, 3.0)));
        assert_eq!(level.piece_at(Cell::new(1, 1)), Some(piece));
    }

    #[test]
    fn test_edit_move_onto_occupied_is_rejected() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(0, 0), (2, 2)]);
        let a = level.piece_at(Cell::new(0, 0)).unwrap();
        let b = level.piece_at(Cell::new(2, 2)).unwrap();

        ctrl.on_pointer_event(down(centre(&level, 0, 0)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(centre(&level, 2, 2)), &mut level, &mut world);
        ctrl.on_pointer_event(PointerEvent::new(PointerPhase::Cancel, centre(&level, 2, 2)), &mut level, &mut world);

        assert_eq!(level.piece_at(Cell::new(0, 0)), Some(a));
        assert_eq!(level.piece_at(Cell::new(2, 2)), Some(b));
        assert_eq!(world.position(a), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(world.position(b), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_edit_release_in_same_cell_recentres() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        let piece = level.piece_at(Cell::new(1, 1)).unwrap();
        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(Vec2::new(3.8, 2.2)), &mut level, &mut world);
        let effects = ctrl.on_pointer_event(up(Vec2::new(3.8, 2.2)), &mut level, &mut world);

        assert!(!effects.iter().any(|e| matches!(e, EditEffect::Moved { .. } | EditEffect::MoveRejected { .. })));
        assert_eq!(world.position(piece), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_edit_down_on_empty_clears_inspected() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.on_pointer_event(up(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        assert!(ctrl.inspected_piece().is_some());

        let effects = ctrl.on_pointer_event(down(Vec2::new(7.0, 7.0)), &mut level, &mut world);
        assert!(effects.contains(&EditEffect::InspectChanged(None)));
        assert!(ctrl.inspected_piece().is_none());
        // A drag without a grabbed piece moves nothing.
        ctrl.on_pointer_event(drag(Vec2::new(1.0, 1.0)), &mut level, &mut world);
        assert_eq!(instance(&world, &level, 1, 1).position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_mode_change_clears_inspected() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1)]);
        ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        ctrl.on_pointer_event(drag(Vec2::new(6.0, 6.0)), &mut level, &mut world);

        let effects = ctrl.set_mode(EditMode::View, &level, &mut world);
        assert_eq!(effects, vec![EditEffect::InspectChanged(None), EditEffect::Redraw]);
        assert!(ctrl.inspected_piece().is_none());
        // The abandoned drag was put back.
        assert_eq!(instance(&world, &level, 1, 1).position, Vec2::new(3.0, 3.0));
        assert!(ctrl.set_mode(EditMode::View, &level, &mut world).is_empty());
    }

    #[test]
    fn test_view_mode_passes_through() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::View);
        let effects = ctrl.on_pointer_event(down(Vec2::new(3.0, 3.0)), &mut level, &mut world);
        assert_eq!(effects, vec![EditEffect::PassThrough]);
        assert!(world.is_empty());
    }

    #[test]
    fn test_resize_requires_confirmation() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(3, 3)]);
        assert_eq!(
            ctrl.request_resize(&mut level, &mut world, 2, 2, false),
            Err(EditError::DestructiveActionUnconfirmed)
        );
        assert_eq!(level.grid_size(), (4, 4));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_resize_scenario() {
        let (mut ctrl, mut level, mut world) = painted_at(&[(1, 1), (3, 3)]);
        let kept = level.piece_at(Cell::new(1, 1)).unwrap();
        let lost = level.piece_at(Cell::new(3, 3)).unwrap();
        ctrl.on_pointer_event(down(centre(&level, 3, 3)), &mut level, &mut world);
        ctrl.on_pointer_event(up(centre(&level, 3, 3)), &mut level, &mut world);

        let destroyed = ctrl.request_resize(&mut level, &mut world, 2, 2, true).unwrap();
        assert_eq!(destroyed, vec![lost]);
        assert_eq!(level.grid_size(), (2, 2));
        assert_eq!(level.piece_at(Cell::new(1, 1)), Some(kept));
        assert!(world.get(lost).is_none());
        assert!(ctrl.inspected_piece().is_none());
    }

    #[test]
    fn test_resize_invalid_dimensions() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        assert!(matches!(
            ctrl.request_resize(&mut level, &mut world, 0, 3, true),
            Err(EditError::InvalidDimensions { .. })
        ));
        assert_eq!(level.grid_size(), (4, 4));
    }

    #[test]
    fn test_one_piece_per_cell_after_mixed_edits() {
        let (mut ctrl, mut level, mut world) = setup(EditMode::Paint);
        let points: Vec<Vec2> = (0..40)
            .map(|i| Vec2::new((i * 7 % 9) as f32 - 0.5, (i * 5 % 9) as f32 - 0.5))
            .collect();
        for (i, &p) in points.iter().enumerate() {
            let mode = EditMode::ALL[1 + i % 3];
            ctrl.set_mode(mode, &level, &mut world);
            ctrl.on_pointer_event(down(p), &mut level, &mut world);
            let to = points[(i + 3) % points.len()];
            ctrl.on_pointer_event(drag(to), &mut level, &mut world);
            ctrl.on_pointer_event(up(to), &mut level, &mut world);
            assert_one_piece_per_cell(&level, &world);
        }
        for (cell, piece) in level.grid().occupied() {
            assert_eq!(world.position(piece), Some(level.mapper().grid_to_world(cell)));
        }
    }

    struct FailingHost;

    impl PieceHost for FailingHost {
        fn instantiate(&mut self, template: &PieceTemplate, _: String, _: Vec2) -> Result<PieceHandle, EditError> {
            Err(EditError::Instantiate(format!("no prototype for {}", template.id)))
        }
        fn destroy(&mut self, _: PieceHandle) {}
        fn position(&self, _: PieceHandle) -> Option<Vec2> {
            None
        }
        fn set_position(&mut self, _: PieceHandle, _: Vec2) {}
    }

    #[test]
    fn test_instantiate_failure_is_reported() {
        let mut level = Level::new(4, 4, 2.0, Vec2::ZERO).unwrap();
        let mut host = FailingHost;
        let mut ctrl = EditModeController::new();
        ctrl.on_template_selected(template("t"), None);
        ctrl.set_mode(EditMode::Paint, &level, &mut host);

        let effects = ctrl.on_pointer_event(down(Vec2::new(1.0, 1.0)), &mut level, &mut host);
        assert!(matches!(effects.as_slice(), [EditEffect::Message(m)] if m.contains("no prototype")));
        assert_eq!(level.grid().len_occupied(), 0);
    }
}
