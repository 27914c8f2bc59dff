use crate::tools::EditMode;

/// Draw the View/Paint/Edit/Erase toolbar in the top-left corner of the
/// scene view. Returns the mode the user picked, if it differs.
pub fn draw_mode_toolbar(ctx: &egui::Context, current: EditMode) -> Option<EditMode> {
    let mut requested = None;
    let origin = ctx.available_rect().min + egui::vec2(10.0, 10.0);
    egui::Area::new(egui::Id::new("mode_toolbar"))
        .fixed_pos(origin)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    for (i, mode) in EditMode::ALL.iter().enumerate() {
                        let response = ui
                            .selectable_label(current == *mode, mode.label())
                            .on_hover_text(format!("Key {}", i + 1));
                        if response.clicked() && current != *mode {
                            requested = Some(*mode);
                        }
                    }
                });
            });
        });
    requested
}
