//! OS key-injection capability.
//!
//! The shortcut executor talks to the keyboard only through [`KeyInjector`],
//! so tests substitute a recording mock and the platform backends stay thin.

use std::sync::Arc;

use anyhow::Result;

/// Injects individual key events into the host's input stream.
pub trait KeyInjector: Send + Sync {
    fn press(&self, code: u16) -> Result<()>;
    fn release(&self, code: u16) -> Result<()>;
}

/// Default injector for the current platform.
pub fn default_injector() -> Arc<dyn KeyInjector> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(CgKeyInjector)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(UnavailableKeyInjector)
    }
}

/// CoreGraphics-backed injector posting keyboard events at the HID tap.
/// Requires the Accessibility permission.
#[cfg(target_os = "macos")]
pub struct CgKeyInjector;

#[cfg(target_os = "macos")]
impl CgKeyInjector {
    fn post(&self, code: u16, down: bool) -> Result<()> {
        use anyhow::anyhow;
        use core_graphics::event::{CGEvent, CGEventTapLocation, CGKeyCode};
        use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| anyhow!("Failed to create CGEventSource"))?;
        let event = CGEvent::new_keyboard_event(source, code as CGKeyCode, down)
            .map_err(|_| anyhow!("Failed to create keyboard event for code {}", code))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

#[cfg(target_os = "macos")]
impl KeyInjector for CgKeyInjector {
    fn press(&self, code: u16) -> Result<()> {
        self.post(code, true)
    }

    fn release(&self, code: u16) -> Result<()> {
        self.post(code, false)
    }
}

/// Placeholder injector for hosts without a key-injection backend.
#[cfg(not(target_os = "macos"))]
pub struct UnavailableKeyInjector;

#[cfg(not(target_os = "macos"))]
impl KeyInjector for UnavailableKeyInjector {
    fn press(&self, _code: u16) -> Result<()> {
        anyhow::bail!("key injection is not available on this platform")
    }

    fn release(&self, _code: u16) -> Result<()> {
        anyhow::bail!("key injection is not available on this platform")
    }
}
