//! # Precision touchpad stroke capture ✍️
//!
//! Turns a Windows precision touchpad into a drawing surface. Devices are discovered from their HID
//! capability tables, each raw report is decoded into finger contacts, contacts are classified into
//! down/move/up events, and the first finger down draws a stroke until it lifts.
//!
//! Everything above the OS boundary is platform independent and works on already-decoded capability tables
//! and a [`ReportReader`](report::ReportReader) over raw report bytes, so it can be driven from recorded or
//! synthetic data just as well as from live hardware. With the `windows-raw-input` feature on Windows,
//! [`platform::raw_input`] supplies both from the real thing.
//!
//! To get started, create a [`Builder`].
//!
//! ## Hardware support
//! Any touchpad reporting through the standard precision touchpad HID collections: a contact count, plus one
//! link collection per finger carrying X, Y, a contact id and a tip switch. Vendor-specific touchpad
//! protocols are not supported.
//!
//! **Note:** Touchpads are quirky. Values are reported as-is in device units, with no attempt to correct
//! for per-device weirdness. **Guarantees are made only when explicitly stated so!**

#![warn(clippy::pedantic)]
#![forbid(unsafe_op_in_unsafe_fn)]

pub mod builder;
pub mod caps;
pub mod catalog;
pub mod decode;
pub mod events;
#[cfg(raw_input)]
pub mod platform;
pub mod report;
pub mod stroke;
pub mod touchpad;
pub mod usage;
pub mod wire;

use std::collections::BTreeMap;

use smallvec::SmallVec;

pub use builder::Builder;
use builder::KeyBindings;
use caps::Discovery;
use catalog::CatalogError;
use decode::DecodeError;
use events::{ClassifiedContact, TouchEventClassifier};
use report::ReportReader;
use stroke::{Stroke, StrokeAccumulator, StrokeError, StrokeUpdate};
use touchpad::TouchpadDescriptor;
use wire::{DeviceDimensions, WireError};

/// Errors that may occur while capturing.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Stroke(#[from] StrokeError),
    #[error(transparent)]
    Wire(#[from] WireError),
}
impl CaptureError {
    /// Whether the session's state can no longer be trusted. Fatal errors should end the capture,
    /// the rest only fail the operation that raised them.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Catalog(_) | Self::Decode(_) | Self::Stroke(_) => true,
            Self::Wire(_) => false,
        }
    }
}

/// Session-level signals, usually bound to keys. See [`KeyBindings`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumIter)]
pub enum Control {
    /// Stop accepting frames. Nothing drawn so far is lost.
    Suspend,
    /// Accept frames again.
    Resume,
    /// Throw away every stroke and everything known about contacts.
    ClearCanvas,
}

/// One contact of a frame and what it did to the strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameEvent {
    pub contact: ClassifiedContact,
    pub stroke: StrokeUpdate,
}
/// Everything that came out of one report, in the report's contact order.
pub type FrameEvents = SmallVec<[FrameEvent; 5]>;

/// Drawing state. Replaced wholesale on clear, so the classifier history, the tracked contact, and the
/// strokes can never disagree with one another.
#[derive(Clone, Debug)]
struct Canvas {
    classifier: TouchEventClassifier,
    accumulator: StrokeAccumulator,
}
impl Canvas {
    fn new(point_ceiling: usize) -> Self {
        Self {
            classifier: TouchEventClassifier::new(),
            accumulator: StrokeAccumulator::with_point_ceiling(point_ceiling),
        }
    }
}

/// A set of discovered touchpads, and the strokes drawn on them. This is the main entry point for
/// feeding reports and reading back strokes.
#[derive(Clone, Debug)]
pub struct Session {
    touchpads: BTreeMap<String, TouchpadDescriptor>,
    primary: Option<String>,
    fallback_dimensions: DeviceDimensions,
    key_bindings: KeyBindings,
    point_ceiling: usize,
    capturing: bool,
    canvas: Canvas,
}
impl Session {
    pub(crate) fn new(builder: Builder, discovery: Discovery) -> Self {
        let Builder {
            capture_on_start,
            key_bindings,
            fallback_dimensions,
            point_ceiling,
        } = builder;
        Self {
            touchpads: discovery.touchpads,
            primary: discovery.primary,
            fallback_dimensions,
            key_bindings,
            point_ceiling,
            capturing: capture_on_start,
            canvas: Canvas::new(point_ceiling),
        }
    }
    /// Every usable touchpad found during discovery, by device name.
    #[must_use]
    pub fn touchpads(&self) -> &BTreeMap<String, TouchpadDescriptor> {
        &self.touchpads
    }
    #[must_use]
    pub fn touchpad(&self, name: &str) -> Option<&TouchpadDescriptor> {
        self.touchpads.get(name)
    }
    /// The first touchpad discovery accepted. This is the one whose size is reported to the renderer.
    #[must_use]
    pub fn primary(&self) -> Option<&TouchpadDescriptor> {
        self.primary.as_deref().and_then(|name| self.touchpads.get(name))
    }
    /// Size of the drawing surface: the primary touchpad's, or the configured fallback if there is none.
    /// # Errors
    /// [`WireError::Overflow`] if the primary touchpad is too big for the wire format.
    pub fn dimensions(&self) -> Result<DeviceDimensions, WireError> {
        self.primary()
            .map_or(Ok(self.fallback_dimensions), DeviceDimensions::try_from)
    }
    /// Write [`Self::dimensions`] to the renderer.
    /// # Errors
    /// See [`Self::dimensions`], plus anything the writer fails with. Neither is fatal.
    pub fn send_dimensions(&self, to: impl std::io::Write) -> Result<DeviceDimensions, CaptureError> {
        let dimensions = self.dimensions()?;
        dimensions.write_to(to)?;
        Ok(dimensions)
    }
    /// All strokes, oldest first. The last one may still be growing, see [`Self::tracked`].
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        self.canvas.accumulator.strokes()
    }
    /// Contact id currently drawing, if any.
    #[must_use]
    pub fn tracked(&self) -> Option<u32> {
        self.canvas.accumulator.tracked()
    }
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }
    #[must_use]
    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }
    /// Feed one raw report from `device`. Reports are ignored while suspended, and reports from
    /// devices discovery didn't accept are ignored always.
    /// # Errors
    /// Every error returned here is [fatal](CaptureError::is_fatal).
    pub fn handle_frame<R: ReportReader + ?Sized>(
        &mut self,
        reader: &R,
        device: &str,
        report: &[u8],
    ) -> Result<FrameEvents, CaptureError> {
        let mut events = FrameEvents::new();
        if !self.capturing {
            return Ok(events);
        }
        let Some(touchpad) = self.touchpads.get(device) else {
            tracing::debug!(device, "report from unknown device");
            return Ok(events);
        };
        let frame = decode::decode_frame(reader, touchpad, report).map_err(|err| {
            tracing::error!(device, %err, "failed to decode frame");
            CaptureError::from(err)
        })?;
        for sample in frame {
            let contact = self.canvas.classifier.classify(sample);
            let stroke = self.canvas.accumulator.accept(contact).map_err(|err| {
                tracing::error!(device, %err, "failed to accumulate contact");
                CaptureError::from(err)
            })?;
            tracing::trace!(
                touch_id = sample.touch_id,
                x = sample.x,
                y = sample.y,
                tip = sample.on_surface,
                kind = contact.kind.as_ref(),
                ?stroke,
            );
            events.push(FrameEvent { contact, stroke });
        }
        Ok(events)
    }
    pub fn apply(&mut self, control: Control) {
        tracing::debug!(control = control.as_ref(), "control");
        match control {
            Control::Suspend => self.capturing = false,
            Control::Resume => self.capturing = true,
            Control::ClearCanvas => self.clear_canvas(),
        }
    }
    /// Apply whichever control `key` is bound to, if any.
    pub fn handle_key(&mut self, key: u16) -> Option<Control> {
        let control = self.key_bindings.control_for(key)?;
        self.apply(control);
        Some(control)
    }
    /// Forget every stroke and every contact. Capture state is unchanged.
    pub fn clear_canvas(&mut self) {
        self.canvas = Canvas::new(self.point_ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{tests::touchpad_tables, DeviceEntry, DeviceKind};
    use crate::decode::tests::{FakeFrame, FakeReader};
    use crate::events::EventKind;

    fn session(capture: bool) -> Session {
        Builder::new()
            .capture_on_start(capture)
            .build([DeviceEntry {
                name: "pad".into(),
                kind: DeviceKind::Hid,
                capabilities: Ok(touchpad_tables(2, 1228, 928)),
            }])
    }

    #[test]
    fn suspended_session_ignores_frames() {
        let reader = FakeReader {
            frames: vec![FakeFrame::new(&[(1, 1, 1, 1, true)])],
        };
        let mut session = session(false);
        assert!(session.handle_frame(&reader, "pad", &[0]).unwrap().is_empty());
        assert!(session.strokes().is_empty());
        // Not even the classifier saw it.
        assert!(session.canvas.classifier.previous().is_empty());
    }

    #[test]
    fn unknown_device_is_ignored() {
        let mut session = session(true);
        // Reader would fail, proving it's never consulted.
        let events = session
            .handle_frame(&FakeReader::default(), "mouse", &[0])
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn frame_events_follow_contact_order() {
        let reader = FakeReader {
            frames: vec![FakeFrame::new(&[(1, 5, 5, 9, true), (2, 7, 7, 4, true)])],
        };
        let mut session = session(true);
        let events = session.handle_frame(&reader, "pad", &[0]).unwrap();
        let summary: Vec<_> = events
            .iter()
            .map(|e| (e.contact.sample.touch_id, e.contact.kind, e.stroke))
            .collect();
        assert_eq!(
            summary,
            [
                (9, EventKind::Down, StrokeUpdate::Started),
                (4, EventKind::Down, StrokeUpdate::Ignored),
            ]
        );
        assert_eq!(session.tracked(), Some(9));
    }

    #[test]
    fn decode_failure_is_fatal() {
        let mut session = session(true);
        let err = session
            .handle_frame(&FakeReader::default(), "pad", &[0])
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, CaptureError::Decode(_)));
    }

    #[test]
    fn dimensions_fall_back_without_touchpad() {
        let session = Builder::new().build([]);
        assert!(session.primary().is_none());
        assert_eq!(
            session.dimensions().unwrap(),
            DeviceDimensions {
                width: 720,
                height: 480
            }
        );
        let mut pipe = Vec::new();
        session.send_dimensions(&mut pipe).unwrap();
        assert_eq!(pipe, [0xD0, 0x02, 0xE0, 0x01]);
    }

    #[test]
    fn wire_errors_are_not_fatal() {
        assert!(!CaptureError::Wire(WireError::Length(3)).is_fatal());
    }
}
