//! Window host over winit's pump-events loop
//!
//! The frame loop owns the thread, so instead of handing control to
//! `run_app` the host drains pending OS events once per tick with a zero
//! timeout. Closing the window, Escape or Alt+F4 request a quit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ringpace_core::config::VideoConfig;
use ringpace_core::{HostWindow, PixelFrame, PresentError, PumpStatus};
use tracing::{info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus as WinitPumpStatus};
use winit::window::{Window, WindowId};

use crate::input::SharedKeyboard;
use crate::present::BlitPresenter;

/// Event pumps allowed for the window to appear before giving up
const WINDOW_CREATE_ATTEMPTS: u32 = 100;

/// Whether a key press asks the application to quit.
pub fn is_quit_key(key: KeyCode, alt_held: bool) -> bool {
    key == KeyCode::Escape || (key == KeyCode::F4 && alt_held)
}

/// winit-side state touched from event callbacks.
struct WindowApp {
    title: String,
    size: LogicalSize<u32>,
    window: Option<Arc<Window>>,
    keyboard: SharedKeyboard,
    alt_held: bool,
    quit: bool,
    create_failed: bool,
    resized: Option<PhysicalSize<u32>>,
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size);

        match event_loop.create_window(window_attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                self.create_failed = true;
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                self.quit = true;
            }
            WindowEvent::Resized(size) => self.resized = Some(size),
            WindowEvent::Focused(false) => self.keyboard.borrow_mut().clear(),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.alt_held = modifiers.state().alt_key();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    self.keyboard.borrow_mut().update(code, pressed);
                    if pressed && is_quit_key(code, self.alt_held) {
                        info!("Quit key pressed");
                        self.quit = true;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Desktop window presenting frames through the GPU.
///
/// When no GPU presenter could be created the window still pumps events and
/// frames are dropped.
pub struct WindowHost {
    // Field order is drop order: surface, then window, then the event loop.
    presenter: Option<BlitPresenter>,
    app: WindowApp,
    event_loop: EventLoop<()>,
    max_frames: Option<u64>,
    presented: u64,
}

impl WindowHost {
    /// Opens the window and waits until the platform has created it.
    pub fn open(
        video: &VideoConfig,
        keyboard: SharedKeyboard,
        max_frames: Option<u64>,
    ) -> Result<Self> {
        let mut event_loop = EventLoop::new().context("Failed to create event loop")?;
        let mut app = WindowApp {
            title: video.title.clone(),
            size: LogicalSize::new(video.width, video.height),
            window: None,
            keyboard,
            alt_held: false,
            quit: false,
            create_failed: false,
            resized: None,
        };

        for _ in 0..WINDOW_CREATE_ATTEMPTS {
            if let WinitPumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app)
            {
                bail!("Event loop exited with code {} before the window opened", code);
            }
            if app.window.is_some() || app.create_failed {
                break;
            }
        }
        let window = app.window.clone().context("Window was not created")?;

        let presenter = match BlitPresenter::new(window, video.width, video.height, video.vsync) {
            Ok(presenter) => Some(presenter),
            Err(e) => {
                warn!("GPU presentation unavailable, frames will not be shown: {:#}", e);
                None
            }
        };

        info!("Window opened: {}x{}", video.width, video.height);
        Ok(Self {
            presenter,
            app,
            event_loop,
            max_frames,
            presented: 0,
        })
    }
}

impl HostWindow for WindowHost {
    fn pump_events(&mut self) -> PumpStatus {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app);

        if let Some(size) = self.app.resized.take()
            && let Some(presenter) = self.presenter.as_mut()
        {
            presenter.resize(size.width, size.height);
        }

        let limit_reached = self.max_frames.is_some_and(|max| self.presented >= max);
        if self.app.quit || limit_reached || matches!(status, WinitPumpStatus::Exit(_)) {
            PumpStatus::Quit
        } else {
            PumpStatus::Continue
        }
    }

    fn present(&mut self, frame: &PixelFrame) -> Result<(), PresentError> {
        self.presented += 1;
        match self.presenter.as_mut() {
            Some(presenter) => presenter.present(frame),
            None => Ok(()),
        }
    }
}
