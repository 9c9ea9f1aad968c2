//! Platform layer: windowing & event loop.
//!
//! Owns the window, feeds keyboard events into the input controller and drives
//! one update + render per redraw.

use std::sync::Arc;

use anyhow::{Context, Result};
use corelib::{
    config::ViewerConfig,
    input::{Action, InputController, Key},
    scene::Scene,
};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Map a physical key onto the viewer's key set.
pub fn map_key_code(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyS => Key::S,
        KeyCode::NumpadAdd => Key::NumpadAdd,
        KeyCode::NumpadSubtract => Key::NumpadSubtract,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

struct Viewer {
    config: ViewerConfig,
    backends: wgpu::Backends,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    scene: Scene,
    input: InputController,
    fatal: Option<anyhow::Error>,
}

impl Viewer {
    fn new(config: ViewerConfig, backends: wgpu::Backends) -> Self {
        let input = InputController::new(config.motion.scale_factor);
        Self {
            config,
            backends,
            window: None,
            gpu: None,
            scene: Scene::new(),
            input,
            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let mut gpu = pollster::block_on(GpuState::new(window.clone(), self.backends))
            .context("Failed to initialize renderer")?;

        // A missing or broken mesh leaves the scene empty; the window stays up.
        self.scene = match asset::obj::load_obj_from_path(&self.config.mesh_path) {
            Ok(mesh) => {
                let handle = gpu.upload_mesh(&mesh);
                Scene::generate(self.config.object_count, self.config.spacing, handle)
            }
            Err(err) => {
                log::error!("Mesh not loaded, nothing to draw: {err:#}");
                Scene::new()
            }
        };
        log::info!("Scene ready with {} objects", self.scene.len());

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_key_code(code) else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        match self.input.key_event(key, pressed, event.repeat) {
            Some(Action::Quit) => {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            Some(action) => log::debug!("{key:?} -> {action:?}"),
            None => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let frame = self.input.frame_state();
        self.scene.update(&frame, &self.config.motion);

        match gpu.render(&self.scene) {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated, reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory. Exiting.");
                event_loop.exit();
            }
            Err(e) => log::warn!("Frame skipped: {e:?}"),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fatal = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

/// Open the viewer window and run until it is closed.
pub fn run(config: ViewerConfig, backends: wgpu::Backends) -> Result<()> {
    config.validate()?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(config, backends);
    event_loop
        .run_app(&mut viewer)
        .context("Event loop error")?;

    if let Some(err) = viewer.fatal.take() {
        return Err(err);
    }
    // Drop GPU state before the window it renders into.
    viewer.gpu = None;
    viewer.window = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::input::KEY_BINDINGS;

    #[test]
    fn every_bound_key_has_a_key_code() {
        let codes = [
            KeyCode::KeyX,
            KeyCode::KeyY,
            KeyCode::KeyZ,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::NumpadAdd,
            KeyCode::NumpadSubtract,
            KeyCode::Escape,
        ];
        let mapped: Vec<Key> = codes.iter().filter_map(|c| map_key_code(*c)).collect();
        for (key, _) in KEY_BINDINGS {
            assert!(mapped.contains(key), "{key:?} unreachable from keyboard");
        }
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        assert_eq!(map_key_code(KeyCode::KeyQ), None);
        assert_eq!(map_key_code(KeyCode::Space), None);
        assert_eq!(map_key_code(KeyCode::Equal), None);
    }
}
