mod app;
mod error;
mod input;
mod io;
mod level;
mod palette;
mod render;
mod scene;
mod settings;
mod tools;
mod ui;

use app::App;

fn main() {
    env_logger::init();
    log::info!("Starting Level Creator");

    let event_loop = match winit::event_loop::EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
