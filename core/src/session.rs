//! Session context owning every device capability
//!
//! Built once at startup with real or null implementations, borrowed by the
//! scheduler for the life of the loop, and released on drop from any exit
//! path.

use tracing::info;

use crate::audio::SoundDevice;
use crate::host::HostWindow;
use crate::input::InputSource;
use crate::timing::Clock;

pub struct Session<H: HostWindow> {
    host: H,
    sound: Box<dyn SoundDevice>,
    input: Box<dyn InputSource>,
    clock: Box<dyn Clock>,
}

impl<H: HostWindow> Session<H> {
    pub fn new(
        host: H,
        sound: Box<dyn SoundDevice>,
        input: Box<dyn InputSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        info!(
            "Session started (audio device {})",
            if sound.is_present() { "present" } else { "absent" }
        );
        Self {
            host,
            sound,
            input,
            clock,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn sound(&self) -> &dyn SoundDevice {
        self.sound.as_ref()
    }

    pub fn sound_mut(&mut self) -> &mut dyn SoundDevice {
        self.sound.as_mut()
    }

    pub fn input(&self) -> &dyn InputSource {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> &mut dyn InputSource {
        self.input.as_mut()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        self.clock.as_mut()
    }
}

impl<H: HostWindow> Drop for Session<H> {
    fn drop(&mut self) {
        info!("Session closed, releasing devices");
    }
}
