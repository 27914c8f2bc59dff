use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks current input state (buttons held, mouse position, etc.)
pub struct InputState {
    /// Cursor position in physical pixels.
    pub mouse_pos: Vec2,
    pub mouse_delta: Vec2,
    pub left_pressed: bool,
    pub middle_pressed: bool,
    /// True for one frame when the button is first pressed / released.
    pub left_just_clicked: bool,
    pub left_just_released: bool,
    /// Cursor left the window or focus was lost this frame.
    pub pointer_lost: bool,
    pub scroll_delta: f32,
    pub keys_just_pressed: std::collections::HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_pos: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            left_pressed: false,
            middle_pressed: false,
            left_just_clicked: false,
            left_just_released: false,
            pointer_lost: false,
            scroll_delta: 0.0,
            keys_just_pressed: std::collections::HashSet::new(),
        }
    }

    /// Call at the end of each frame to clear per-frame state.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
        self.left_just_clicked = false;
        self.left_just_released = false;
        self.pointer_lost = false;
        self.keys_just_pressed.clear();
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_pos;
                self.mouse_pos = new_pos;
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                if self.left_pressed {
                    self.pointer_lost = true;
                }
                self.left_pressed = false;
                self.middle_pressed = false;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => {
                        if pressed && !self.left_pressed {
                            self.left_just_clicked = true;
                        }
                        if !pressed && self.left_pressed {
                            self.left_just_released = true;
                        }
                        self.left_pressed = pressed;
                    }
                    MouseButton::Middle => self.middle_pressed = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(p) => p.y as f32 / 120.0,
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key
                    && event.state == ElementState::Pressed
                    && !event.repeat
                {
                    self.keys_just_pressed.insert(key);
                }
            }
            _ => {}
        }
    }

    pub fn key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }
}
