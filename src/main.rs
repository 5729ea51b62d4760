//! Application entry point.

use log::{error, info};
use winit::event_loop::{ControlFlow, EventLoop};

use newgine::engine::log_capture;
use newgine::game::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    log_capture::install()?;
    info!("Logger initialized");

    let event_loop = EventLoop::new().map_err(|e| {
        error!("Failed to create event loop: {:?}", e);
        e
    })?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // Start the main app loop
    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Application error: {:?}", e);
        return Err(Box::new(e));
    }

    if app.failed() {
        return Err("the engine stopped with an error".into());
    }
    Ok(())
}
