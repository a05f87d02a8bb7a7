use std::collections::BTreeMap;

use super::{ClassifiedContact, ContactSample, EventKind};

/// Last sample seen for every contact id this session. Only ever grows, as entries are overwritten
/// rather than removed on lift off.
pub type PreviousTouchState = BTreeMap<u32, ContactSample>;

/// Recovers [`EventKind`]s by diffing each sample against the previous one for the same contact.
#[derive(Clone, Debug, Default)]
pub struct TouchEventClassifier {
    previous: PreviousTouchState,
}
impl TouchEventClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Everything seen so far, by contact id.
    #[must_use]
    pub fn previous(&self) -> &PreviousTouchState {
        &self.previous
    }
    /// Classify `sample`, then remember it as the latest state of its contact.
    pub fn classify(&mut self, sample: ContactSample) -> ClassifiedContact {
        let kind = match self.previous.insert(sample.touch_id, sample) {
            None if sample.on_surface => EventKind::Down,
            None => {
                tracing::debug!(touch_id = sample.touch_id, "lift off from a contact never seen touching");
                EventKind::Up
            }
            Some(prev) => match (prev.on_surface, sample.on_surface) {
                (true, true) if prev.position() == sample.position() => EventKind::MoveUnchanged,
                (true, true) => EventKind::Move,
                (true, false) => EventKind::Up,
                (false, true) => EventKind::Down,
                (false, false) => {
                    // Only broken hardware or drivers keep reporting a contact that's already up.
                    tracing::debug!(touch_id = sample.touch_id, "contact reported up twice");
                    EventKind::Up
                }
            },
        };
        ClassifiedContact { sample, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(touch_id: u32, x: u32, y: u32, on_surface: bool) -> ContactSample {
        ContactSample {
            touch_id,
            x,
            y,
            on_surface,
        }
    }

    /// Classify `cur`, optionally after priming the state with `prev` for the same id.
    fn classify_after(prev: Option<ContactSample>, cur: ContactSample) -> EventKind {
        let mut classifier = TouchEventClassifier::new();
        if let Some(prev) = prev {
            classifier.classify(prev);
        }
        let kind = classifier.classify(cur).kind;
        assert_eq!(classifier.previous().get(&cur.touch_id), Some(&cur));
        kind
    }

    #[test]
    fn full_transition_table() {
        let on = |x, y| sample(1, x, y, true);
        let off = |x, y| sample(1, x, y, false);
        let cases = [
            (None, on(1, 1), EventKind::Down),
            (None, off(1, 1), EventKind::Up),
            (Some(on(1, 1)), on(1, 1), EventKind::MoveUnchanged),
            (Some(on(1, 1)), on(2, 1), EventKind::Move),
            (Some(on(1, 1)), on(1, 2), EventKind::Move),
            (Some(on(1, 1)), off(1, 1), EventKind::Up),
            (Some(off(1, 1)), on(1, 1), EventKind::Down),
            (Some(off(1, 1)), off(5, 5), EventKind::Up),
        ];
        for (prev, cur, expected) in cases {
            assert_eq!(classify_after(prev, cur), expected, "{prev:?} -> {cur:?}");
        }
    }

    #[test]
    fn contacts_are_tracked_independently() {
        let mut classifier = TouchEventClassifier::new();
        assert_eq!(classifier.classify(sample(1, 0, 0, true)).kind, EventKind::Down);
        assert_eq!(classifier.classify(sample(2, 9, 9, true)).kind, EventKind::Down);
        assert_eq!(classifier.classify(sample(1, 1, 0, true)).kind, EventKind::Move);
        assert_eq!(
            classifier.classify(sample(2, 9, 9, true)).kind,
            EventKind::MoveUnchanged
        );
        assert_eq!(classifier.previous().len(), 2);
    }

    #[test]
    fn state_is_kept_after_lift_off() {
        let mut classifier = TouchEventClassifier::new();
        classifier.classify(sample(4, 0, 0, true));
        classifier.classify(sample(4, 0, 0, false));
        assert_eq!(
            classifier.previous().get(&4),
            Some(&sample(4, 0, 0, false))
        );
        // Reused id comes back down.
        assert_eq!(classifier.classify(sample(4, 3, 3, true)).kind, EventKind::Down);
    }
}
