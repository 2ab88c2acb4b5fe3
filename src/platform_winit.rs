//! winit application shell: window/event plumbing around the game loop.
//!
//! Each redraw applies pending input to the game, runs the physics catch-up
//! loop, and submits the scene to the renderer. Raw mouse deltas arrive as
//! device events so camera look keeps working while buttons are held.

use std::time::Instant;

use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::core::data::loader;
use crate::game::{Game, GameMode};
use crate::gfx::Renderer;

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    game: Option<Game>,
    last_frame: Instant,
}

impl Default for App {
    fn default() -> Self {
        Self {
            window: None,
            renderer: None,
            game: None,
            last_frame: Instant::now(),
        }
    }
}

impl App {
    fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        let (Some(renderer), Some(game)) = (&mut self.renderer, &mut self.game) else {
            return;
        };
        match code {
            KeyCode::KeyW => game.input.forward = pressed,
            KeyCode::KeyS => game.input.backward = pressed,
            KeyCode::KeyA => game.input.left = pressed,
            KeyCode::KeyD => game.input.right = pressed,
            KeyCode::Space => game.input.jump = pressed,
            KeyCode::Enter if pressed => game.start(),
            KeyCode::KeyR if pressed && game.mode() == GameMode::GameOver => game.reset(),
            KeyCode::KeyP if pressed => game.toggle_health_decay(),
            KeyCode::KeyG if pressed => game.toggle_debug_draw(),
            KeyCode::KeyT if pressed => renderer.toggle_taa(),
            KeyCode::KeyF if pressed => renderer.toggle_pcf(),
            KeyCode::KeyB if pressed => renderer.cycle_blit_source(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = event_loop
                .create_window(WindowAttributes::default().with_title("Lamp Crusher"))
                .expect("create window");
            let tuning = loader::load_tuning();
            let mut renderer =
                pollster::block_on(Renderer::new(&window, &tuning)).expect("wgpu init");
            let game = Game::new(&mut renderer, tuning);
            self.window = Some(window);
            self.renderer = Some(renderer);
            self.game = Some(game);
            self.last_frame = Instant::now();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = &self.window else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(game) = &mut self.game {
                    let amount = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y * 20.0,
                        MouseScrollDelta::PixelDelta(p) => p.y as f32,
                    };
                    game.input.apply_scroll(amount);
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(renderer), Some(game)) = (&mut self.renderer, &mut self.game) else {
                    return;
                };
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32().min(0.1);
                self.last_frame = now;

                game.update(dt, renderer);
                if let Err(err) = renderer.submit(&mut game.scene) {
                    match err {
                        SurfaceError::Lost | SurfaceError::Outdated => {
                            let size = self.window.as_ref().map(|w| w.inner_size());
                            if let Some(size) = size {
                                renderer.resize(size);
                            }
                        }
                        SurfaceError::OutOfMemory => event_loop.exit(),
                        e => log::error!("render error: {e:?}"),
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event
            && let Some(game) = &mut self.game
            && game.mode() != GameMode::Intro
        {
            game.input.apply_mouse_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::default();
    event_loop.run_app(&mut app)?;
    Ok(())
}
