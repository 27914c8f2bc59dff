use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;

use crate::palette::{Category, PaletteCatalog, PieceTemplate};
use crate::settings::Settings;
use crate::tools::EditModeController;
use super::{UiAction, UiState};

/// egui textures for the catalog's preview images, keyed by template id.
/// Rebuilt whenever the catalog generation moves.
#[derive(Default)]
pub struct PreviewTextures {
    textures: HashMap<String, egui::TextureHandle>,
    generation: Option<u64>,
    /// Texture of the preview delivered with the current palette selection.
    selected: Option<(Rc<RgbaImage>, egui::TextureHandle)>,
}

fn color_image(preview: &RgbaImage) -> egui::ColorImage {
    let size = [preview.width() as usize, preview.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, preview.as_raw())
}

impl PreviewTextures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload previews that changed since the last sync.
    pub fn sync(&mut self, ctx: &egui::Context, catalog: &PaletteCatalog) {
        if self.generation == Some(catalog.generation()) {
            return;
        }
        self.textures.clear();
        for template in catalog.templates() {
            let Some(preview) = catalog.preview(&template.id) else { continue };
            let handle = ctx.load_texture(
                format!("preview:{}", template.id),
                color_image(preview),
                egui::TextureOptions::NEAREST,
            );
            self.textures.insert(template.id.clone(), handle);
        }
        self.generation = Some(catalog.generation());
        log::debug!("Uploaded {} preview textures", self.textures.len());
    }

    pub fn get(&self, template_id: &str) -> Option<&egui::TextureHandle> {
        self.textures.get(template_id)
    }

    /// Track the preview that came with the current selection. Uploads only
    /// when a different image arrives.
    pub fn sync_selected(&mut self, ctx: &egui::Context, preview: Option<&Rc<RgbaImage>>) {
        let Some(preview) = preview else {
            self.selected = None;
            return;
        };
        if self.selected.as_ref().is_some_and(|(current, _)| Rc::ptr_eq(current, preview)) {
            return;
        }
        let handle = ctx.load_texture("selected_preview", color_image(preview), egui::TextureOptions::NEAREST);
        self.selected = Some((preview.clone(), handle));
    }

    pub fn selected(&self) -> Option<&egui::TextureHandle> {
        self.selected.as_ref().map(|(_, handle)| handle)
    }
}

/// Draw the floating "Level Palette" window.
pub fn draw_palette_window(
    ctx: &egui::Context,
    catalog: &PaletteCatalog,
    controller: &EditModeController,
    textures: &PreviewTextures,
    ui_state: &mut UiState,
    settings: &Settings,
) -> UiAction {
    let mut action = UiAction::None;
    let mut open = true;

    egui::Window::new("Level Palette")
        .id(egui::Id::new("level_palette"))
        .open(&mut open)
        .resizable(true)
        .collapsible(true)
        .default_size([420.0, 360.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Source:");
                ui.monospace(catalog.source().display().to_string());
                if ui.small_button("Change...").clicked() {
                    action = UiAction::ChoosePaletteSource;
                }
                if ui.small_button("Reload").clicked() {
                    action = UiAction::ReloadPalette;
                }
            });

            ui.separator();

            // Category tabs
            ui.horizontal_wrapped(|ui| {
                for category in Category::ALL {
                    let count = catalog.in_category(category).len();
                    let label = format!("{} ({count})", category.label());
                    if ui.selectable_label(ui_state.palette_category == category, label).clicked() {
                        ui_state.palette_category = category;
                    }
                }
            });

            ui.separator();

            let category = ui_state.palette_category;
            let templates = catalog.in_category(category);
            if templates.is_empty() {
                ui.label("This category is empty!");
                return;
            }

            let selected_id = controller.selected_template().map(|t| t.id.as_str());
            let button_size = egui::vec2(settings.palette.button_width, settings.palette.button_height);
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (index, template) in templates.iter().enumerate() {
                        let selected = selected_id == Some(template.id.as_str());
                        let response = piece_button(ui, template, textures.get(&template.id), button_size, selected);
                        if response.on_hover_text(template.id.as_str()).clicked() {
                            action = UiAction::SelectPiece(category, index);
                        }
                    }
                });
            });
        });

    if !open {
        ui_state.palette_open = false;
    }

    action
}

/// A fixed-size button with the preview above the piece name. Falls back to
/// the template colour when there is no preview texture.
fn piece_button(
    ui: &mut egui::Ui,
    template: &PieceTemplate,
    texture: Option<&egui::TextureHandle>,
    size: egui::Vec2,
    selected: bool,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    if !ui.is_rect_visible(rect) {
        return response;
    }

    let visuals = ui.style().interact_selectable(&response, selected);
    let painter = ui.painter();
    painter.rect(
        rect,
        4.0,
        visuals.weak_bg_fill,
        visuals.bg_stroke,
        egui::StrokeKind::Inside,
    );

    let text_height = 18.0;
    let image_side = (rect.width().min(rect.height() - text_height) - 8.0).max(1.0);
    let image_rect = egui::Rect::from_center_size(
        egui::pos2(rect.center().x, rect.top() + 4.0 + image_side * 0.5),
        egui::vec2(image_side, image_side),
    );
    match texture {
        Some(tex) => {
            painter.image(
                tex.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            let [r, g, b, a] = template.color;
            painter.rect_filled(image_rect.shrink(image_side * 0.2), 2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, a));
        }
    }

    let text_pos = egui::pos2(rect.center().x, rect.bottom() - text_height * 0.5 - 2.0);
    painter.text(
        text_pos,
        egui::Align2::CENTER_CENTER,
        &template.name,
        egui::FontId::proportional(12.0),
        visuals.text_color(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_preview_uploads_once_per_image() {
        let ctx = egui::Context::default();
        let mut textures = PreviewTextures::new();
        assert!(textures.selected().is_none());

        let first = Rc::new(RgbaImage::new(4, 4));
        textures.sync_selected(&ctx, Some(&first));
        let id = textures.selected().map(|t| t.id());
        assert!(id.is_some());

        textures.sync_selected(&ctx, Some(&first));
        assert_eq!(textures.selected().map(|t| t.id()), id);

        let second = Rc::new(RgbaImage::new(4, 4));
        textures.sync_selected(&ctx, Some(&second));
        assert_ne!(textures.selected().map(|t| t.id()), id);

        textures.sync_selected(&ctx, None);
        assert!(textures.selected().is_none());
    }
}
