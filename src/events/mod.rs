//! # Touch events
//!
//! Touchpads don't report "down" or "up". Every report is just a snapshot of which contacts exist, where they
//! are, and whether their tip switch is set. Events are recovered by comparing each snapshot against the
//! last one seen for the same contact, see [`TouchEventClassifier`].

mod classify;

pub use classify::{PreviousTouchState, TouchEventClassifier};

/// One physical contact in one report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContactSample {
    /// Hardware-assigned contact id. Stable from touch to lift, may be reused afterwards.
    pub touch_id: u32,
    /// Absolute position in device units.
    pub x: u32,
    pub y: u32,
    /// Tip switch state: the contact is touching the surface.
    pub on_surface: bool,
}
impl ContactSample {
    #[must_use]
    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumCount)]
pub enum EventKind {
    /// The contact started touching the surface.
    Down,
    /// Still touching, at a new position.
    Move,
    /// Still touching, exactly where it was last report. Touchpads repeat themselves a lot.
    MoveUnchanged,
    /// The contact left the surface.
    Up,
}

/// A sample along with what it means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedContact {
    pub sample: ContactSample,
    pub kind: EventKind,
}
