//! # Device dimension hand-off
//!
//! The touchpad's size is sent once, at session start, to whatever process draws the strokes. The format is
//! fixed at four bytes, little endian: `[width lo, width hi, height lo, height hi]`.

use std::io::{Read, Write};

use crate::touchpad::TouchpadDescriptor;

/// Size of an encoded [`DeviceDimensions`].
pub const ENCODED_LEN: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("expected 4 bytes, got {0}")]
    Length(usize),
    /// The device is bigger than the format can describe.
    #[error("dimension {0} does not fit in 16 bits")]
    Overflow(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceDimensions {
    pub width: u16,
    pub height: u16,
}
impl DeviceDimensions {
    #[must_use]
    pub fn to_bytes(self) -> [u8; ENCODED_LEN] {
        let [w0, w1] = self.width.to_le_bytes();
        let [h0, h1] = self.height.to_le_bytes();
        [w0, w1, h0, h1]
    }
    /// # Errors
    /// [`WireError::Length`] unless `bytes` is exactly [`ENCODED_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let &[w0, w1, h0, h1] = bytes else {
            return Err(WireError::Length(bytes.len()));
        };
        Ok(Self {
            width: u16::from_le_bytes([w0, w1]),
            height: u16::from_le_bytes([h0, h1]),
        })
    }
    /// # Errors
    /// Whatever the writer fails with.
    pub fn write_to(self, mut to: impl Write) -> Result<(), WireError> {
        to.write_all(&self.to_bytes())?;
        Ok(())
    }
    /// # Errors
    /// Whatever the reader fails with, including running dry before four bytes.
    pub fn read_from(mut from: impl Read) -> Result<Self, WireError> {
        let mut bytes = [0; ENCODED_LEN];
        from.read_exact(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}
impl TryFrom<&TouchpadDescriptor> for DeviceDimensions {
    type Error = WireError;
    fn try_from(pad: &TouchpadDescriptor) -> Result<Self, Self::Error> {
        let fit = |v: u32| u16::try_from(v).map_err(|_| WireError::Overflow(v));
        Ok(Self {
            width: fit(pad.width)?,
            height: fit(pad.height)?,
        })
    }
}
