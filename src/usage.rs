//! # HID usages
//!
//! The small corner of the HID usage tables that precision touchpads speak. See
//! [Supporting usages in multitouch digitizer drivers](https://learn.microsoft.com/en-us/windows-hardware/design/component-guidelines/supporting-usages-in-multitouch-digitizer-drivers)
//! for where these come from.
//!
//! Everything here is plain `u16` on the wire, the enums only exist to keep magic numbers out of the parser.

/// Usage pages this crate cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::FromRepr)]
#[repr(u16)]
pub enum UsagePage {
    GenericDesktop = 0x01,
    Digitizer = 0x0D,
}
impl UsagePage {
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Usages on the [`UsagePage::GenericDesktop`] page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::FromRepr)]
#[repr(u16)]
pub enum GenericUsage {
    X = 0x30,
    Y = 0x31,
}

/// Usages on the [`UsagePage::Digitizer`] page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::FromRepr)]
#[repr(u16)]
pub enum DigitizerUsage {
    /// Top-level collection usage of a precision touchpad. Used to register for raw input.
    TouchPad = 0x05,
    /// Shares its code with generic X, but lives on another page.
    TipPressure = 0x30,
    /// Button usage: the contact is physically touching the surface.
    TipSwitch = 0x42,
    Confidence = 0x47,
    Width = 0x48,
    Height = 0x49,
    ContactId = 0x51,
    /// Number of valid contacts in this report. Lives in exactly one collection per device.
    ContactCount = 0x54,
    ContactCountMaximum = 0x55,
}

/// A (page, usage) pair, resolved to something we understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Usage {
    Generic(GenericUsage),
    Digitizer(DigitizerUsage),
}
impl Usage {
    /// Interpret a raw page + usage. `None` for anything we don't care about.
    #[must_use]
    pub fn resolve(page: u16, usage: u16) -> Option<Self> {
        match UsagePage::from_repr(page)? {
            UsagePage::GenericDesktop => GenericUsage::from_repr(usage).map(Self::Generic),
            UsagePage::Digitizer => DigitizerUsage::from_repr(usage).map(Self::Digitizer),
        }
    }
    #[must_use]
    pub const fn page(self) -> UsagePage {
        match self {
            Self::Generic(_) => UsagePage::GenericDesktop,
            Self::Digitizer(_) => UsagePage::Digitizer,
        }
    }
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Generic(u) => u as u16,
            Self::Digitizer(u) => u as u16,
        }
    }
}
impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic(u) => write!(f, "{}/{}", self.page().as_ref(), u.as_ref()),
            Self::Digitizer(u) => write!(f, "{}/{}", self.page().as_ref(), u.as_ref()),
        }
    }
}
