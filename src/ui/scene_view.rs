use glam::Vec2;

use crate::level::PieceHost;
use crate::palette::PaletteCatalog;
use crate::render::Camera2d;
use crate::scene::Scene;
use crate::settings::{Settings, color32};
use crate::tools::{EditMode, EditModeController};
use super::palette_window::PreviewTextures;

/// Fraction of a cell a placed piece covers.
const PIECE_FILL: f32 = 0.9;
const MISSING_TEMPLATE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 0, 255);

/// Screen rectangle (egui points) covering a world-space box.
pub fn world_rect_to_screen(camera: &Camera2d, min: Vec2, max: Vec2) -> egui::Rect {
    let a = camera.world_to_screen(min);
    let b = camera.world_to_screen(max);
    egui::Rect::from_two_pos(egui::pos2(a.x, a.y), egui::pos2(b.x, b.y))
}

/// Paint the level into the background layer, clipped to `viewport`.
#[allow(clippy::too_many_arguments)]
pub fn draw_scene_view(
    ctx: &egui::Context,
    viewport: egui::Rect,
    camera: &Camera2d,
    scene: &Scene,
    controller: &EditModeController,
    catalog: &PaletteCatalog,
    textures: &PreviewTextures,
    settings: &Settings,
    hover_world: Option<Vec2>,
) {
    let painter = ctx.layer_painter(egui::LayerId::background()).with_clip_rect(viewport);
    let mapper = scene.level.mapper();
    let display = &settings.display;

    // Grid lines
    let grid_stroke = egui::Stroke::new(1.0, color32(display.grid_color).gamma_multiply(0.5));
    let size = mapper.world_size();
    for c in 0..=mapper.columns {
        let x = mapper.origin.x + c as f32 * mapper.cell_size;
        let a = camera.world_to_screen(Vec2::new(x, mapper.origin.y));
        let b = camera.world_to_screen(Vec2::new(x, mapper.origin.y + size.y));
        painter.line_segment([egui::pos2(a.x, a.y), egui::pos2(b.x, b.y)], grid_stroke);
    }
    for r in 0..=mapper.rows {
        let y = mapper.origin.y + r as f32 * mapper.cell_size;
        let a = camera.world_to_screen(Vec2::new(mapper.origin.x, y));
        let b = camera.world_to_screen(Vec2::new(mapper.origin.x + size.x, y));
        painter.line_segment([egui::pos2(a.x, a.y), egui::pos2(b.x, b.y)], grid_stroke);
    }

    // Frame
    let frame = world_rect_to_screen(camera, mapper.origin, mapper.origin + size);
    painter.rect_stroke(
        frame,
        0.0,
        egui::Stroke::new(2.0, color32(display.frame_color)),
        egui::StrokeKind::Outside,
    );

    // Pieces, drawn at their live positions so a dragged piece follows the pointer.
    let piece_extent = Vec2::splat(mapper.cell_size * PIECE_FILL * 0.5);
    let font = egui::FontId::proportional((camera.zoom * mapper.cell_size * 0.18).clamp(8.0, 16.0));
    for (_, handle) in scene.level.grid().occupied() {
        let Some(instance) = scene.pieces.get(handle) else { continue };
        let rect = world_rect_to_screen(camera, instance.position - piece_extent, instance.position + piece_extent);
        let template = catalog.find(&instance.template_id);
        match (textures.get(&instance.template_id), template) {
            (Some(tex), _) => {
                painter.image(
                    tex.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            (None, Some(t)) => {
                let [r, g, b, a] = t.color;
                painter.rect_filled(rect, 2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, a));
            }
            (None, None) => {
                painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.5, MISSING_TEMPLATE_COLOR), egui::StrokeKind::Inside);
            }
        }
        let label = template.map(|t| t.name.as_str()).unwrap_or(instance.template_id.as_str());
        painter.text(rect.center_bottom(), egui::Align2::CENTER_BOTTOM, label, font.clone(), egui::Color32::WHITE);
    }

    let selected = color32(display.selected_color);

    // Hover cell
    if let Some(world) = hover_world
        && controller.mode() != EditMode::View
        && mapper.contains_point(world)
    {
        let cell = mapper.world_to_grid(world);
        if mapper.contains_cell(cell) {
            let (min, max) = mapper.cell_rect(cell);
            let stroke_color = if controller.mode() == EditMode::Erase {
                egui::Color32::from_rgb(230, 80, 80)
            } else {
                selected.gamma_multiply(0.6)
            };
            painter.rect_stroke(
                world_rect_to_screen(camera, min, max),
                0.0,
                egui::Stroke::new(1.5, stroke_color),
                egui::StrokeKind::Inside,
            );
        }
    }

    // Drag handle of the inspected piece
    if let Some((_, pos)) = controller.drag_handle(&scene.pieces as &dyn PieceHost) {
        let half = Vec2::splat(mapper.cell_size * 0.25);
        let rect = world_rect_to_screen(camera, pos - half, pos + half);
        painter.rect(
            rect,
            0.0,
            selected.gamma_multiply(0.25),
            egui::Stroke::new(2.0, selected),
            egui::StrokeKind::Outside,
        );
    }
}
