//! Builder-style configuration for a capture [`Session`].
//!
//! For a default configuration, `Builder::new().build(devices)` is all you need!

use crate::caps::DeviceEntry;
use crate::stroke::DEFAULT_POINT_CEILING;
use crate::wire::DeviceDimensions;
use crate::{Control, Session};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// The given window handle isn't one the raw input backend can register with.
    /// This includes cases where the platform is otherwise supported but the feature was disabled at compile-time.
    #[error("handle doesn't contain a supported window type")]
    Unsupported,
    /// The OS refused to list devices or register for input.
    #[error("{0}")]
    Os(String),
    /// Failed to acquire a window handle
    #[cfg(raw_input)]
    #[error("{:?}", .0)]
    HandleError(raw_window_handle::HandleError),
}
// #[from] thiserror attribute breaks horribly D:
#[cfg(raw_input)]
impl From<raw_window_handle::HandleError> for BuildError {
    fn from(value: raw_window_handle::HandleError) -> Self {
        Self::HandleError(value)
    }
}

/// Virtual-key codes that trigger each [`Control`].
/// See [virtual key codes](https://learn.microsoft.com/en-us/windows/win32/inputdev/virtual-key-codes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyBindings {
    pub suspend: u16,
    pub resume: u16,
    pub clear_canvas: u16,
}
impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            // VK_ESCAPE
            suspend: 0x1B,
            // VK_F3
            resume: 0x72,
            // 'C'
            clear_canvas: 0x43,
        }
    }
}
impl KeyBindings {
    /// Which control, if any, `key` is bound to. If several share a key, suspend wins, then resume.
    #[must_use]
    pub fn control_for(&self, key: u16) -> Option<Control> {
        if key == self.suspend {
            Some(Control::Suspend)
        } else if key == self.resume {
            Some(Control::Resume)
        } else if key == self.clear_canvas {
            Some(Control::ClearCanvas)
        } else {
            None
        }
    }
}

/// Pre-construction configuration for a [`Session`].
#[derive(Clone, Debug)]
pub struct Builder {
    pub(crate) capture_on_start: bool,
    pub(crate) key_bindings: KeyBindings,
    pub(crate) fallback_dimensions: DeviceDimensions,
    pub(crate) point_ceiling: usize,
}
impl Default for Builder {
    fn default() -> Self {
        Self {
            capture_on_start: false,
            key_bindings: KeyBindings::default(),
            fallback_dimensions: DeviceDimensions {
                width: 720,
                height: 480,
            },
            point_ceiling: DEFAULT_POINT_CEILING,
        }
    }
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Start capturing immediately rather than waiting for [`Control::Resume`]. Default `false`.
    #[must_use]
    pub fn capture_on_start(self, capture: bool) -> Self {
        Self {
            capture_on_start: capture,
            ..self
        }
    }
    #[must_use]
    pub fn key_bindings(self, key_bindings: KeyBindings) -> Self {
        Self {
            key_bindings,
            ..self
        }
    }
    /// Dimensions reported by [`Session::dimensions`] when no touchpad was found. Default 720x480.
    #[must_use]
    pub fn fallback_dimensions(self, fallback_dimensions: DeviceDimensions) -> Self {
        Self {
            fallback_dimensions,
            ..self
        }
    }
    /// Total stroke points the session may hold before giving up. Default is a gigabyte's worth.
    #[must_use]
    pub fn point_ceiling(self, point_ceiling: usize) -> Self {
        Self {
            point_ceiling,
            ..self
        }
    }
}
/// # Finishing
impl Builder {
    /// Run discovery over `devices` and arm the session. Devices that aren't usable touchpads are
    /// skipped, so this can't fail. It may however end up with no touchpads at all!
    #[must_use]
    pub fn build(self, devices: impl IntoIterator<Item = DeviceEntry>) -> Session {
        let discovery = crate::caps::discover(devices);
        Session::new(self, discovery)
    }
    /// Discover through Windows raw input. The returned devices provide the per-device report readers
    /// that [`Session::handle_frame`] needs.
    /// # Errors
    /// If the OS refuses to list devices at all. Individual device failures are skipped.
    #[cfg(raw_input)]
    pub fn build_raw_input(
        self,
    ) -> Result<(Session, crate::platform::raw_input::RawInputDevices), BuildError> {
        let devices = crate::platform::raw_input::RawInputDevices::enumerate()?;
        let session = self.build(devices.entries());
        Ok((session, devices))
    }
}
