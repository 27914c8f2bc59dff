mod renderer;
pub mod camera;

pub use renderer::Renderer;
pub use camera::Camera2d;
