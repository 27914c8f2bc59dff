use glam::Vec2;

const MIN_ZOOM: f32 = 4.0;
const MAX_ZOOM: f32 = 512.0;

/// Orthographic 2D scene-view camera. World +Y is up; screen +Y is down.
/// Screen coordinates are egui points.
#[derive(Debug, Clone)]
pub struct Camera2d {
    /// World position shown at the centre of the viewport.
    pub center: Vec2,
    /// Screen points per world unit.
    pub zoom: f32,
    viewport_min: Vec2,
    viewport_size: Vec2,
}

impl Camera2d {
    pub fn new() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 48.0,
            viewport_min: Vec2::ZERO,
            viewport_size: Vec2::new(1280.0, 720.0),
        }
    }

    /// Set the screen rectangle the scene is drawn into.
    pub fn set_viewport(&mut self, min: Vec2, size: Vec2) {
        self.viewport_min = min;
        self.viewport_size = size.max(Vec2::ONE);
    }

    fn viewport_center(&self) -> Vec2 {
        self.viewport_min + self.viewport_size * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let d = screen - self.viewport_center();
        self.center + Vec2::new(d.x, -d.y) / self.zoom
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let d = (world - self.center) * self.zoom;
        self.viewport_center() + Vec2::new(d.x, -d.y)
    }

    /// Drag the view by a screen-space delta.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.center -= Vec2::new(screen_delta.x, -screen_delta.y) / self.zoom;
    }

    /// Zoom by `steps` wheel notches, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, steps: f32) {
        let before = self.screen_to_world(anchor);
        self.zoom = (self.zoom * 1.15_f32.powf(steps)).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.screen_to_world(anchor);
        self.center += before - after;
    }

    /// Centre and zoom so the world rectangle fills most of the viewport.
    pub fn frame(&mut self, min: Vec2, max: Vec2) {
        let size = (max - min).max(Vec2::splat(0.01));
        self.center = (min + max) * 0.5;
        let fit = self.viewport_size * 0.85 / size;
        self.zoom = fit.x.min(fit.y).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}
