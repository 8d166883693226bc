//! Sprite sheet demo: entry point and winit application handler.
//!
//! winit drives the event loop via `ApplicationHandler`. Window and GPU state
//! are created lazily in `resumed`, input events are forwarded to the shell as
//! they arrive, and every `RedrawRequested` advances and draws one frame.
//!
//! Usage: `sprite_demo [config.json]` (default `assets/config/demo.json`).

mod config;
mod panel;
mod shell;

use std::path::PathBuf;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use config::{load_config_or_default, DemoConfig, DEFAULT_CONFIG_PATH};
use shell::RendererShell;
use sprite_core::Key;

struct App {
    config: DemoConfig,
    state: Option<RendererShell>,
}

impl App {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match sprite_platform::window::create_window(event_loop, &self.config.window)
        {
            Ok(window) => window,
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        log::info!(
            "Window created: {}x{}",
            self.config.window.width,
            self.config.window.height
        );
        match RendererShell::new(window, &self.config) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Failed to initialise renderer: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size.width, physical_size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed if !event.repeat => {
                                if state.key_down(key) {
                                    log::info!("{:?} pressed, exiting.", key);
                                    self.shutdown(event_loop);
                                }
                            }
                            ElementState::Pressed => {}
                            ElementState::Released => state.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.pointer_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                state.pointer_pressed();
            }

            WindowEvent::Touch(touch) if touch.phase == TouchPhase::Started => {
                state.pointer_moved(Vec2::new(touch.location.x as f32, touch.location.y as f32));
                state.pointer_pressed();
            }

            WindowEvent::RedrawRequested => {
                state.frame();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Backspace | KeyCode::BrowserBack => Some(Key::Back),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Sprite sheet demo starting...");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match load_config_or_default(&config_path) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_key_covers_exit_keys() {
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::Backspace), Some(Key::Back));
        assert_eq!(map_key(KeyCode::BrowserBack), Some(Key::Back));
    }

    #[test]
    fn map_key_ignores_unbound_keys() {
        assert_eq!(map_key(KeyCode::KeyQ), None);
        assert_eq!(map_key(KeyCode::F3), None);
    }
}
