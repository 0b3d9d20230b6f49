//! ringpace desktop player
//!
//! Real device implementations for the core's boundary traits:
//!
//! - [`CpalSoundDevice`] - circular sound ring played through cpal
//! - [`InputManager`] - gilrs gamepads plus keyboard on slot 0
//! - [`WindowHost`] - winit window pumped once per tick, wgpu blit presentation

pub mod audio;
pub mod input;
pub mod player;
pub mod present;
pub mod window;

pub use audio::CpalSoundDevice;
pub use input::{InputManager, KeyboardState, SharedKeyboard};
pub use player::{HostMode, PlayerConfig, run};
pub use present::BlitPresenter;
pub use window::WindowHost;
