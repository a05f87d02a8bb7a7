//! # Strokes
//!
//! A stroke is the polyline left by one contact between touching down and lifting off. Only one stroke is
//! built at a time, even on hardware that tracks five fingers: the first contact to touch down while nothing
//! is tracked owns the pen until it lifts.

use crate::events::{ClassifiedContact, EventKind};

/// A point in device units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Ordered, append-only list of points.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Stroke {
    points: Vec<Point>,
}
impl Stroke {
    fn starting_at(point: Point) -> Self {
        Self {
            points: vec![point],
        }
    }
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    /// A single point has nothing to draw.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
    /// Consecutive point pairs, ready to be drawn as line segments.
    pub fn segments(&self) -> impl Iterator<Item = [Point; 2]> + '_ {
        self.points.windows(2).map(|pair| [pair[0], pair[1]])
    }
}

pub type StrokeList = Vec<Stroke>;

/// What [`StrokeAccumulator::accept`] did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeUpdate {
    /// A new stroke was started with the event's point.
    Started,
    /// The current stroke grew by one point. `segment` is the newest line to draw.
    Extended { segment: [Point; 2] },
    /// The tracked contact lifted. Its stroke is complete.
    Ended,
    /// Nothing changed.
    Ignored,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeError {
    /// A contact is tracked, but there's no stroke to extend. Internal state is broken.
    #[error("move for tracked contact {touch_id} with no stroke in progress")]
    NoActiveStroke { touch_id: u32 },
    #[error("stroke point ceiling of {ceiling} reached")]
    PointCeiling { ceiling: usize },
}

/// Largest amount of point storage to hand out before declaring something has gone terribly wrong.
const POINT_STORAGE_CEILING_BYTES: usize = 1024 * 1024 * 1024;
/// Default for [`StrokeAccumulator::with_point_ceiling`].
pub const DEFAULT_POINT_CEILING: usize = POINT_STORAGE_CEILING_BYTES / std::mem::size_of::<Point>();

/// Turns classified contacts into strokes. See [module level docs](`crate::stroke`).
#[derive(Clone, Debug)]
pub struct StrokeAccumulator {
    tracked: Option<u32>,
    strokes: StrokeList,
    total_points: usize,
    point_ceiling: usize,
}
impl Default for StrokeAccumulator {
    fn default() -> Self {
        Self::with_point_ceiling(DEFAULT_POINT_CEILING)
    }
}
impl StrokeAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Refuse to store more than `point_ceiling` points in total.
    #[must_use]
    pub fn with_point_ceiling(point_ceiling: usize) -> Self {
        Self {
            tracked: None,
            strokes: StrokeList::new(),
            total_points: 0,
            point_ceiling,
        }
    }
    /// Contact id currently drawing, if any.
    #[must_use]
    pub fn tracked(&self) -> Option<u32> {
        self.tracked
    }
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
    #[must_use]
    pub fn point_ceiling(&self) -> usize {
        self.point_ceiling
    }
    fn reserve_point(&mut self) -> Result<(), StrokeError> {
        if self.total_points >= self.point_ceiling {
            return Err(StrokeError::PointCeiling {
                ceiling: self.point_ceiling,
            });
        }
        self.total_points += 1;
        Ok(())
    }
    /// Feed one classified contact.
    /// # Errors
    /// Both [`StrokeError`]s are unrecoverable for the session.
    pub fn accept(&mut self, event: ClassifiedContact) -> Result<StrokeUpdate, StrokeError> {
        let ClassifiedContact { sample, kind } = event;
        let point = Point {
            x: sample.x,
            y: sample.y,
        };
        let Some(tracked) = self.tracked else {
            // Waiting for a touch down to start something.
            if kind == EventKind::Down {
                self.reserve_point()?;
                self.tracked = Some(sample.touch_id);
                self.strokes.push(Stroke::starting_at(point));
                return Ok(StrokeUpdate::Started);
            }
            return Ok(StrokeUpdate::Ignored);
        };
        if tracked != sample.touch_id {
            return Ok(StrokeUpdate::Ignored);
        }
        match kind {
            EventKind::Move => {
                if self.strokes.is_empty() {
                    return Err(StrokeError::NoActiveStroke { touch_id: tracked });
                }
                self.reserve_point()?;
                let stroke = self
                    .strokes
                    .last_mut()
                    .ok_or(StrokeError::NoActiveStroke { touch_id: tracked })?;
                let from = stroke.points.last().copied().unwrap_or(point);
                stroke.points.push(point);
                Ok(StrokeUpdate::Extended {
                    segment: [from, point],
                })
            }
            EventKind::Up => {
                self.tracked = None;
                Ok(StrokeUpdate::Ended)
            }
            // Duplicates aren't worth a point, and a second down for the same contact means nothing new.
            EventKind::MoveUnchanged | EventKind::Down => Ok(StrokeUpdate::Ignored),
        }
    }
}
