use crate::palette::PropertyValue;
use crate::scene::Scene;
use crate::tools::{EditMode, EditModeController};
use super::palette_window::PreviewTextures;
use super::{UiAction, UiState};

const MAX_GRID_DIMENSION: u32 = 1000;

/// Draw the inspector as a right side panel.
pub fn draw_inspector_panel(
    ctx: &egui::Context,
    scene: &mut Scene,
    controller: &EditModeController,
    textures: &PreviewTextures,
    ui_state: &mut UiState,
) -> UiAction {
    let mut action = UiAction::None;

    egui::SidePanel::right("inspector_panel").default_width(240.0).show(ctx, |ui| {
        ui.heading("Level Creator");
        ui.separator();

        egui::CollapsingHeader::new("Grid Data").default_open(true).show(ui, |ui| {
            if let Some(a) = draw_grid_data(ui, scene, ui_state) {
                action = a;
            }
        });

        egui::CollapsingHeader::new("Piece Selected").default_open(true).show(ui, |ui| {
            draw_piece_selected(ui, controller, textures);
        });

        if controller.mode() == EditMode::Edit {
            egui::CollapsingHeader::new("Piece Edited").default_open(true).show(ui, |ui| {
                if draw_piece_edited(ui, scene, controller) {
                    action = UiAction::PieceEdited;
                }
            });
        }
    });

    action
}

fn draw_grid_data(ui: &mut egui::Ui, scene: &Scene, ui_state: &mut UiState) -> Option<UiAction> {
    let (columns, rows) = scene.level.grid_size();
    ui.horizontal(|ui| {
        ui.label("Columns:");
        ui.add(egui::DragValue::new(&mut ui_state.new_columns).range(1..=MAX_GRID_DIMENSION));
    });
    ui.horizontal(|ui| {
        ui.label("Rows:");
        ui.add(egui::DragValue::new(&mut ui_state.new_rows).range(1..=MAX_GRID_DIMENSION));
    });
    ui.label(format!("Cell size: {}", scene.level.mapper().cell_size));

    let differs = (ui_state.new_columns, ui_state.new_rows) != (columns, rows);
    let mut action = None;
    ui.horizontal(|ui| {
        if ui.add_enabled(differs, egui::Button::new("Resize")).clicked() {
            action = Some(UiAction::RequestResize {
                columns: ui_state.new_columns,
                rows: ui_state.new_rows,
            });
        }
        if ui.add_enabled(differs, egui::Button::new("Reset")).clicked() {
            ui_state.reset_resize_values(scene);
        }
    });
    action
}

fn draw_piece_selected(ui: &mut egui::Ui, controller: &EditModeController, textures: &PreviewTextures) {
    let Some(template) = controller.selected_template() else {
        ui.label("No piece selected!");
        return;
    };
    if let Some(tex) = textures.selected() {
        ui.add(egui::Image::new((tex.id(), egui::vec2(64.0, 64.0))));
    }
    ui.label(&template.name);
    ui.weak(format!("{} / {}", template.category.label(), template.id));
}

/// Returns true if any property was changed.
fn draw_piece_edited(ui: &mut egui::Ui, scene: &mut Scene, controller: &EditModeController) -> bool {
    let Some(inspected) = controller.inspected() else {
        ui.label("No piece to edit!");
        return false;
    };
    let cell = scene.level.grid().find(inspected.piece);
    let Some(instance) = scene.pieces.get_mut(inspected.piece) else {
        ui.label("No piece to edit!");
        return false;
    };

    ui.label(format!("Name: {}", instance.name));
    if let Some(cell) = cell {
        ui.label(format!("Cell: {cell}"));
    }
    ui.label(format!("Position: ({:.2}, {:.2})", instance.position.x, instance.position.y));

    if instance.properties.is_empty() {
        return false;
    }
    ui.separator();

    let mut changed = false;
    egui::Grid::new("piece_properties").num_columns(2).striped(true).show(ui, |ui| {
        for (key, value) in instance.properties.iter_mut() {
            ui.label(key);
            changed |= match value {
                PropertyValue::Bool(b) => ui.checkbox(b, "").changed(),
                PropertyValue::Int(i) => ui.add(egui::DragValue::new(i).speed(1)).changed(),
                PropertyValue::Float(f) => ui.add(egui::DragValue::new(f).speed(0.05)).changed(),
                PropertyValue::Text(s) => ui.text_edit_singleline(s).changed(),
            };
            ui.end_row();
        }
    });
    changed
}
