mod inspector_panel;
mod mode_toolbar;
pub mod palette_window;
pub mod scene_view;

use crate::palette::{Category, PaletteCatalog};
use crate::scene::Scene;
use crate::tools::{EditMode, EditModeController};
use crate::settings::Settings;
use palette_window::PreviewTextures;

/// Actions the UI wants the app to execute (can't borrow mutably inside egui closures).
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    None,
    NewLevelScene,
    ConfirmNewLevelScene,
    OpenPalette,
    OpenLevel,
    SaveLevel,
    SaveLevelAs,
    Quit,
    SetMode(EditMode),
    SelectPiece(Category, usize),
    /// Inspector asked for a resize; the app confirms before applying.
    RequestResize { columns: u32, rows: u32 },
    /// A property of the inspected piece was edited in place.
    PieceEdited,
    ChoosePaletteSource,
    ReloadPalette,
    FrameLevel,
}

/// UI state that lives across frames but isn't part of the level.
pub struct UiState {
    pub palette_open: bool,
    pub palette_category: Category,
    /// Pending grid size in the inspector; applied only through Resize.
    pub new_columns: u32,
    pub new_rows: u32,
    pub status: Option<(String, std::time::Instant)>,
}

impl UiState {
    pub fn new(scene: &Scene) -> Self {
        let (new_columns, new_rows) = scene.level.grid_size();
        Self {
            palette_open: false,
            palette_category: Category::Misc,
            new_columns,
            new_rows,
            status: None,
        }
    }

    /// Put the resize fields back to the level's current size.
    pub fn reset_resize_values(&mut self, scene: &Scene) {
        (self.new_columns, self.new_rows) = scene.level.grid_size();
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), std::time::Instant::now()));
    }
}

/// Draw all egui UI panels. Called each frame within egui context.
#[allow(clippy::too_many_arguments)]
pub fn draw_ui(
    ctx: &egui::Context,
    scene: &mut Scene,
    controller: &EditModeController,
    catalog: &PaletteCatalog,
    textures: &PreviewTextures,
    ui_state: &mut UiState,
    settings: &Settings,
    has_unsaved_changes: bool,
) -> UiAction {
    let mut action = UiAction::None;

    // Menu bar
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Level...").clicked() {
                    action = UiAction::OpenLevel;
                    ui.close();
                }
                if ui.button("Save Level").clicked() {
                    action = UiAction::SaveLevel;
                    ui.close();
                }
                if ui.button("Save Level As...").clicked() {
                    action = UiAction::SaveLevelAs;
                    ui.close();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    action = UiAction::Quit;
                    ui.close();
                }
            });
            ui.menu_button("Tools", |ui| {
                ui.menu_button("Level Creator", |ui| {
                    if ui.button("New Level Scene").clicked() {
                        action = if has_unsaved_changes {
                            UiAction::ConfirmNewLevelScene
                        } else {
                            UiAction::NewLevelScene
                        };
                        ui.close();
                    }
                    if ui.button("Level Palette").clicked() {
                        action = UiAction::OpenPalette;
                        ui.close();
                    }
                });
            });
            ui.menu_button("View", |ui| {
                if ui.button("Frame Level  F").clicked() {
                    action = UiAction::FrameLevel;
                    ui.close();
                }
            });
        });
    });

    // Status bar
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Mode: {}", controller.mode().label()));
            ui.separator();
            let (cols, rows) = scene.level.grid_size();
            ui.label(format!("Grid: {cols}x{rows} @ {}", scene.level.mapper().cell_size));
            ui.separator();
            ui.label(format!("Pieces: {}", scene.level.grid().len_occupied()));
            if let Some((message, _)) = &ui_state.status {
                ui.separator();
                ui.label(message);
            }
        });
    });

    // Inspector (right)
    let inspector_action = inspector_panel::draw_inspector_panel(ctx, scene, controller, textures, ui_state);
    if inspector_action != UiAction::None {
        action = inspector_action;
    }

    // Palette window (floating)
    if ui_state.palette_open {
        let palette_action = palette_window::draw_palette_window(ctx, catalog, controller, textures, ui_state, settings);
        if palette_action != UiAction::None {
            action = palette_action;
        }
    }

    // Mode toolbar over the scene view
    if let Some(mode) = mode_toolbar::draw_mode_toolbar(ctx, controller.mode()) {
        action = UiAction::SetMode(mode);
    }

    action
}
