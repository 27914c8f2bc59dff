use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::input::InputState;
use crate::palette::PaletteCatalog;
use crate::render::{Camera2d, Renderer};
use crate::scene::Scene;
use crate::settings::Settings;
use crate::tools::{EditEffect, EditMode, EditModeController, PointerEvent, PointerPhase};
use crate::ui::palette_window::PreviewTextures;
use crate::ui::{UiAction, UiState};

const TITLE: &str = "Level Creator";
/// How often the palette source directory is checked for changes.
const CATALOG_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const STATUS_DURATION: Duration = Duration::from_secs(5);

/// Pending confirmation dialog.
enum ConfirmDialog {
    NewLevelScene,
    Resize { columns: u32, rows: u32 },
    Quit,
}

impl ConfirmDialog {
    fn title(&self) -> &'static str {
        match self {
            ConfirmDialog::NewLevelScene => "New Level Scene",
            ConfirmDialog::Resize { .. } => "Resize Level",
            ConfirmDialog::Quit => "Quit",
        }
    }

    fn message(&self) -> String {
        match self {
            ConfirmDialog::NewLevelScene | ConfirmDialog::Quit => "You have unsaved changes. Continue?".to_string(),
            ConfirmDialog::Resize { columns, rows } => format!(
                "Are you sure you want to resize the level to {columns}x{rows}?\nPieces outside the new grid are destroyed. This action cannot be undone."
            ),
        }
    }
}

/// Top-level application state.
pub struct App {
    gpu: Option<GpuState>,
    scene: Scene,
    controller: Rc<RefCell<EditModeController>>,
    catalog: PaletteCatalog,
    textures: PreviewTextures,
    camera: Camera2d,
    input: InputState,
    settings: Settings,
    ui_state: UiState,
    /// Keyboard-triggered action to run on the next frame.
    pending_action: Option<UiAction>,
    confirm_dialog: Option<ConfirmDialog>,
    /// Last save path for quick-save (Save without dialog after first save)
    last_save_path: Option<PathBuf>,
    has_unsaved_changes: bool,
    last_catalog_refresh: Instant,
    /// Scene-view rectangle (egui points) from the last frame.
    viewport: egui::Rect,
    /// A left-button gesture started in the scene view and has not ended.
    pointer_down: bool,
    hover_world: Option<Vec2>,
    /// Frame the level once the first viewport is known.
    frame_pending: bool,
    exit_requested: bool,
}

/// Everything that requires the window to exist.
struct GpuState {
    window: Arc<Window>,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub fn new() -> Self {
        let settings = Settings::load();
        let scene = Scene::new_level(&settings.grid).unwrap_or_else(|e| {
            log::warn!("Grid settings rejected ({e}); using defaults");
            Scene::default()
        });
        let mut catalog = PaletteCatalog::new(settings.palette.source_dir.clone(), settings.palette.preview_size);
        let controller = Rc::new(RefCell::new(EditModeController::new()));
        catalog.bridge_mut().subscribe(&controller);

        Self {
            gpu: None,
            ui_state: UiState::new(&scene),
            scene,
            controller,
            catalog,
            textures: PreviewTextures::new(),
            camera: Camera2d::new(),
            input: InputState::new(),
            settings,
            pending_action: None,
            confirm_dialog: None,
            last_save_path: None,
            has_unsaved_changes: false,
            last_catalog_refresh: Instant::now(),
            viewport: egui::Rect::NOTHING,
            pointer_down: false,
            hover_world: None,
            frame_pending: true,
            exit_requested: false,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("failed to initialise GPU: {e}");
                event_loop.exit();
                return;
            }
        };

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &renderer.device,
            renderer.surface_format,
            None,
            1,
            false,
        );

        self.gpu = Some(GpuState {
            window,
            renderer,
            egui_state,
            egui_renderer,
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gpu) = &mut self.gpu else { return };

        // Let egui process the event first
        let egui_response = gpu.egui_state.on_window_event(&gpu.window, &event);
        let egui_consumed = egui_response.consumed;

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.renderer.resize(new_size.width, new_size.height);
                gpu.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        // Gestures that started in the scene view must see their end even
        // when it happens over a panel.
        let ends_gesture = matches!(
            event,
            WindowEvent::MouseInput { state: ElementState::Released, .. }
                | WindowEvent::CursorMoved { .. }
                | WindowEvent::CursorLeft { .. }
                | WindowEvent::Focused(false)
        );
        if !egui_consumed || ends_gesture {
            self.input.handle_event(&event);
        }

        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Always request redraw to keep the render loop going
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

impl App {
    fn pixels_per_point(&self) -> f32 {
        self.gpu
            .as_ref()
            .map(|gpu| gpu.egui_state.egui_ctx().pixels_per_point())
            .unwrap_or(1.0)
    }

    fn process_input(&mut self) {
        let ppp = self.pixels_per_point();
        let pointer = self.input.mouse_pos / ppp;
        let pointer_delta = self.input.mouse_delta / ppp;
        let over_view = self.viewport.contains(egui::pos2(pointer.x, pointer.y));
        let world = self.camera.screen_to_world(pointer);
        self.hover_world = over_view.then_some(world);

        // Navigation available in every mode
        if self.input.middle_pressed && pointer_delta != Vec2::ZERO {
            self.camera.pan(pointer_delta);
        }
        if self.input.scroll_delta != 0.0 && over_view {
            self.camera.zoom_at(pointer, self.input.scroll_delta);
        }

        for (key, mode) in [
            (KeyCode::Digit1, EditMode::View),
            (KeyCode::Digit2, EditMode::Paint),
            (KeyCode::Digit3, EditMode::Edit),
            (KeyCode::Digit4, EditMode::Erase),
        ] {
            if self.input.key_just_pressed(key) {
                self.pending_action = Some(UiAction::SetMode(mode));
            }
        }
        if self.input.key_just_pressed(KeyCode::KeyF) {
            self.pending_action = Some(UiAction::FrameLevel);
        }

        // Left-button gesture -> pointer events
        let mut phases = Vec::new();
        if self.input.pointer_lost && self.pointer_down {
            phases.push(PointerPhase::Cancel);
            self.pointer_down = false;
        } else {
            if self.input.left_just_clicked && over_view {
                phases.push(PointerPhase::Down);
                self.pointer_down = true;
            } else if self.pointer_down && self.input.left_pressed && pointer_delta != Vec2::ZERO {
                phases.push(PointerPhase::Drag);
            }
            if self.input.left_just_released && self.pointer_down {
                phases.push(PointerPhase::Up);
                self.pointer_down = false;
            }
        }

        for phase in phases {
            let effects = self.controller.borrow_mut().on_pointer_event(
                PointerEvent::new(phase, world),
                &mut self.scene.level,
                &mut self.scene.pieces,
            );
            self.apply_effects(effects, pointer_delta);
        }

        self.input.end_frame();
    }

    fn apply_effects(&mut self, effects: Vec<EditEffect>, pointer_delta: Vec2) {
        for effect in effects {
            match effect {
                EditEffect::PassThrough => {
                    if self.pointer_down {
                        self.camera.pan(pointer_delta);
                    }
                }
                EditEffect::Painted { .. } | EditEffect::Erased { .. } | EditEffect::Moved { .. } => {
                    self.has_unsaved_changes = true;
                }
                EditEffect::MoveRejected { cell, .. } => {
                    self.ui_state.set_status(format!("Move rejected, piece returned to {cell}"));
                }
                EditEffect::Message(message) => {
                    log::warn!("{message}");
                    self.ui_state.set_status(message);
                }
                EditEffect::Redraw | EditEffect::InspectChanged(_) => {}
            }
        }
    }

    fn refresh_catalog(&mut self) {
        if self.last_catalog_refresh.elapsed() < CATALOG_REFRESH_INTERVAL {
            return;
        }
        self.last_catalog_refresh = Instant::now();
        if self.catalog.refresh_if_stale() {
            log::debug!("Palette refreshed ({} pieces)", self.catalog.templates().len());
        }
    }

    fn frame_level(&mut self) {
        let mapper = self.scene.level.mapper();
        self.camera.frame(mapper.origin, mapper.origin + mapper.world_size());
    }

    fn redraw(&mut self) {
        self.process_input();
        self.refresh_catalog();
        if let Some((_, since)) = &self.ui_state.status
            && since.elapsed() > STATUS_DURATION
        {
            self.ui_state.status = None;
        }

        let Some(gpu) = &mut self.gpu else { return };

        let output = match gpu.renderer.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.window.inner_size();
                gpu.renderer.resize(size.width, size.height);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e}");
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Update window title with unsaved changes indicator
        let file_name = self
            .last_save_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| format!(" - {}", n.to_string_lossy()))
            .unwrap_or_default();
        let dirty = if self.has_unsaved_changes { " *" } else { "" };
        gpu.window.set_title(&format!("{TITLE}{file_name}{dirty}"));

        // Run egui
        let raw_input = gpu.egui_state.take_egui_input(&gpu.window);
        let egui_ctx = gpu.egui_state.egui_ctx().clone();
        self.textures.sync(&egui_ctx, &self.catalog);
        self.textures.sync_selected(&egui_ctx, self.controller.borrow().selected_preview());

        let mut ui_action = UiAction::None;
        let mut dialog_outcome = None;
        let mut viewport = self.viewport;
        let controller = self.controller.borrow();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            ui_action = crate::ui::draw_ui(
                ctx,
                &mut self.scene,
                &controller,
                &self.catalog,
                &self.textures,
                &mut self.ui_state,
                &self.settings,
                self.has_unsaved_changes,
            );

            // Whatever the panels left over is the scene view.
            viewport = ctx.available_rect();
            self.camera.set_viewport(
                Vec2::new(viewport.min.x, viewport.min.y),
                Vec2::new(viewport.width(), viewport.height()),
            );
            if self.frame_pending {
                let mapper = self.scene.level.mapper();
                self.camera.frame(mapper.origin, mapper.origin + mapper.world_size());
                self.frame_pending = false;
            }
            crate::ui::scene_view::draw_scene_view(
                ctx,
                viewport,
                &self.camera,
                &self.scene,
                &controller,
                &self.catalog,
                &self.textures,
                &self.settings,
                self.hover_world,
            );

            // Confirm dialog (destructive actions)
            if let Some(dialog) = &self.confirm_dialog {
                egui::Window::new(dialog.title())
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label(dialog.message());
                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            if ui.button("Yes").clicked() { dialog_outcome = Some(true); }
                            if ui.button("Cancel").clicked() { dialog_outcome = Some(false); }
                        });
                    });
            }
        });
        drop(controller);
        self.viewport = viewport;

        gpu.egui_state.handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                gpu.renderer.config.width,
                gpu.renderer.config.height,
            ],
            pixels_per_point: full_output.pixels_per_point,
        };

        // Update egui textures
        for (id, delta) in &full_output.textures_delta.set {
            gpu.egui_renderer.update_texture(&gpu.renderer.device, &gpu.renderer.queue, *id, delta);
        }

        {
            let mut encoder = gpu.renderer.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("egui_encoder") },
            );

            gpu.egui_renderer.update_buffers(
                &gpu.renderer.device,
                &gpu.renderer.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            {
                let bg = self.settings.display.bg_color;
                let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: bg[0] as f64,
                                g: bg[1] as f64,
                                b: bg[2] as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });
                gpu.egui_renderer.render(&mut pass.forget_lifetime(), &paint_jobs, &screen_descriptor);
            }

            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        match dialog_outcome {
            Some(true) => {
                if let Some(dialog) = self.confirm_dialog.take() {
                    self.confirm_accepted(dialog);
                }
            }
            Some(false) => self.confirm_dialog = None,
            None => {}
        }

        // Keyboard-triggered actions take precedence over UI clicks
        let action = self.pending_action.take().unwrap_or(ui_action);
        self.handle_action(action);
    }

    fn confirm_accepted(&mut self, dialog: ConfirmDialog) {
        match dialog {
            ConfirmDialog::NewLevelScene => self.new_level_scene(),
            ConfirmDialog::Resize { columns, rows } => self.resize_level(columns, rows),
            ConfirmDialog::Quit => self.exit_requested = true,
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::None => {}
            UiAction::NewLevelScene => self.new_level_scene(),
            UiAction::ConfirmNewLevelScene => {
                self.confirm_dialog = Some(ConfirmDialog::NewLevelScene);
            }
            UiAction::OpenPalette => {
                self.ui_state.palette_open = true;
            }
            UiAction::OpenLevel => self.open_level(),
            UiAction::SaveLevel => match self.last_save_path.clone() {
                Some(path) => self.save_level_to(path),
                None => self.save_level_as(),
            },
            UiAction::SaveLevelAs => self.save_level_as(),
            UiAction::Quit => {
                if self.has_unsaved_changes {
                    self.confirm_dialog = Some(ConfirmDialog::Quit);
                } else {
                    self.exit_requested = true;
                }
            }
            UiAction::SetMode(mode) => {
                let effects = self.controller.borrow_mut().set_mode(mode, &self.scene.level, &mut self.scene.pieces);
                self.pointer_down = false;
                self.apply_effects(effects, Vec2::ZERO);
            }
            UiAction::SelectPiece(category, index) => {
                if let Some(template) = self.catalog.select(category, index) {
                    self.ui_state.set_status(format!("Selected {}", template.name));
                }
            }
            UiAction::RequestResize { columns, rows } => {
                self.confirm_dialog = Some(ConfirmDialog::Resize { columns, rows });
            }
            UiAction::PieceEdited => {
                self.has_unsaved_changes = true;
            }
            UiAction::ChoosePaletteSource => {
                let folder = rfd::FileDialog::new()
                    .set_title("Palette Source")
                    .set_directory(self.catalog.source())
                    .pick_folder();
                if let Some(path) = folder {
                    self.catalog.set_source(path.clone());
                    self.settings.palette.source_dir = path;
                    self.settings.save();
                }
            }
            UiAction::ReloadPalette => {
                self.catalog.reload();
                self.ui_state.set_status(format!("Loaded {} pieces", self.catalog.templates().len()));
            }
            UiAction::FrameLevel => self.frame_level(),
        }
    }

    fn new_level_scene(&mut self) {
        match Scene::new_level(&self.settings.grid) {
            Ok(scene) => {
                self.scene = scene;
                self.controller.borrow_mut().reset();
                self.ui_state.reset_resize_values(&self.scene);
                self.last_save_path = None;
                self.has_unsaved_changes = false;
                self.pointer_down = false;
                self.frame_pending = true;
                log::info!("New level scene");
            }
            Err(e) => {
                log::error!("Could not create level: {e}");
                self.ui_state.set_status(format!("Could not create level: {e}"));
            }
        }
    }

    fn resize_level(&mut self, columns: u32, rows: u32) {
        let result = self.controller.borrow_mut().request_resize(
            &mut self.scene.level,
            &mut self.scene.pieces,
            columns,
            rows,
            true,
        );
        match result {
            Ok(destroyed) => {
                self.has_unsaved_changes = true;
                self.ui_state.set_status(format!(
                    "Resized to {columns}x{rows}, {} pieces removed",
                    destroyed.len()
                ));
            }
            Err(e) => {
                log::error!("Resize failed: {e}");
                self.ui_state.set_status(format!("Resize failed: {e}"));
            }
        }
        self.ui_state.reset_resize_values(&self.scene);
    }

    fn save_level_as(&mut self) {
        let file = rfd::FileDialog::new()
            .add_filter("Level", &[crate::io::LEVEL_EXTENSION])
            .set_title("Save Level")
            .save_file();
        if let Some(path) = file {
            self.save_level_to(path);
        }
    }

    fn save_level_to(&mut self, path: PathBuf) {
        match crate::io::save_scene(&self.scene, &path) {
            Ok(()) => {
                self.ui_state.set_status(format!("Saved {}", path.display()));
                self.last_save_path = Some(path);
                self.has_unsaved_changes = false;
            }
            Err(e) => {
                log::error!("Failed to save: {e}");
                self.ui_state.set_status(format!("Failed to save: {e}"));
            }
        }
    }

    fn open_level(&mut self) {
        let file = rfd::FileDialog::new()
            .add_filter("Level", &[crate::io::LEVEL_EXTENSION])
            .set_title("Open Level")
            .pick_file();
        let Some(path) = file else { return };

        match crate::io::load_scene(&path) {
            Ok(loaded) => {
                self.scene = loaded;
                self.controller.borrow_mut().reset();
                self.ui_state.reset_resize_values(&self.scene);
                self.last_save_path = Some(path);
                self.has_unsaved_changes = false;
                self.pointer_down = false;
                self.frame_pending = true;

                let missing = self.scene.unresolved_templates(|id| self.catalog.find(id).is_some());
                if missing.is_empty() {
                    self.ui_state.set_status("Level opened");
                } else {
                    log::warn!("Level uses pieces missing from the palette: {}", missing.join(", "));
                    self.ui_state.set_status(format!("Missing pieces: {}", missing.join(", ")));
                }
            }
            Err(e) => {
                log::error!("Failed to open: {e}");
                self.ui_state.set_status(format!("Failed to open: {e}"));
            }
        }
    }
}
