//! # Frame decoding
//!
//! Pulls the active contacts out of one raw report. The report says how many contacts are valid, and the
//! n-th contact is found in the n-th contact collection of the [`TouchpadDescriptor`].

use smallvec::SmallVec;

use crate::events::ContactSample;
use crate::report::{HidpStatus, ReportReader};
use crate::touchpad::TouchpadDescriptor;
use crate::usage::{DigitizerUsage, GenericUsage, Usage, UsagePage};

/// Contacts of one report, in collection order (*not* sorted by contact id!).
/// Precision touchpads are required to track at least five fingers, hence the inline size.
pub type Frame = SmallVec<[ContactSample; 5]>;

/// Per-contact field that failed to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr)]
pub enum ContactField {
    X,
    Y,
    ContactId,
    TipSwitch,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("device has no contact count collection")]
    NoContactCountCollection,
    #[error("failed to read the number of contacts: {0}")]
    ContactCount(HidpStatus),
    /// More contacts than collections to read them from. There's no sane way to pick which to drop.
    #[error("report claims {reported} contacts but the device only describes {available}")]
    TooManyContacts { reported: u32, available: usize },
    #[error("failed to read {} of link collection {link_collection}: {status}", .field.as_ref())]
    Usage {
        field: ContactField,
        link_collection: u16,
        status: HidpStatus,
    },
}

/// Decode every active contact from `report`.
/// # Errors
/// Any [`DecodeError`]. None of them leave a sensible frame behind, so the whole frame is rejected.
pub fn decode_frame<R: ReportReader + ?Sized>(
    reader: &R,
    touchpad: &TouchpadDescriptor,
    report: &[u8],
) -> Result<Frame, DecodeError> {
    let count_collection = touchpad
        .contact_count_collection
        .ok_or(DecodeError::NoContactCountCollection)?;
    let reported = reader
        .usage_value(
            Usage::Digitizer(DigitizerUsage::ContactCount),
            count_collection,
            report,
        )
        .map_err(DecodeError::ContactCount)?;

    let available = touchpad.contact_collections.len();
    let count = usize::try_from(reported)
        .ok()
        .filter(|&count| count <= available)
        .ok_or(DecodeError::TooManyContacts {
            reported,
            available,
        })?;

    let max_usages = reader.max_usage_list_length(UsagePage::Digitizer);

    touchpad.contact_collections[..count]
        .iter()
        .map(|collection| -> Result<ContactSample, DecodeError> {
            let link_collection = collection.id;
            let read = |usage: Usage, field: ContactField| {
                reader
                    .usage_value(usage, link_collection, report)
                    .map_err(|status| DecodeError::Usage {
                        field,
                        link_collection,
                        status,
                    })
            };
            let x = read(Usage::Generic(GenericUsage::X), ContactField::X)?;
            let y = read(Usage::Generic(GenericUsage::Y), ContactField::Y)?;
            let touch_id = read(
                Usage::Digitizer(DigitizerUsage::ContactId),
                ContactField::ContactId,
            )?;
            let on_surface = reader
                .usages(UsagePage::Digitizer, link_collection, report, max_usages)
                .map_err(|status| DecodeError::Usage {
                    field: ContactField::TipSwitch,
                    link_collection,
                    status,
                })?
                .contains(&(DigitizerUsage::TipSwitch as u16));
            Ok(ContactSample {
                touch_id,
                x,
                y,
                on_surface,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::caps::{describe_device, tests::touchpad_tables};
    use crate::report::UsageList;

    /// In-memory HID parser. `report[0]` selects which canned frame a read sees.
    #[derive(Default)]
    pub(crate) struct FakeReader {
        pub frames: Vec<FakeFrame>,
    }
    #[derive(Default, Clone)]
    pub(crate) struct FakeFrame {
        pub contact_count: Option<u32>,
        /// link collection -> (x, y, id, tip)
        pub contacts: HashMap<u16, (u32, u32, u32, bool)>,
    }
    impl FakeFrame {
        pub(crate) fn new(contacts: &[(u16, u32, u32, u32, bool)]) -> Self {
            Self {
                contact_count: Some(u32::try_from(contacts.len()).unwrap()),
                contacts: contacts
                    .iter()
                    .map(|&(link, x, y, id, tip)| (link, (x, y, id, tip)))
                    .collect(),
            }
        }
    }
    impl FakeReader {
        fn frame(&self, report: &[u8]) -> Result<&FakeFrame, HidpStatus> {
            report
                .first()
                .and_then(|&i| self.frames.get(usize::from(i)))
                .ok_or(HidpStatus::InvalidReportLength)
        }
    }
    impl ReportReader for FakeReader {
        fn usage_value(
            &self,
            usage: Usage,
            link_collection: u16,
            report: &[u8],
        ) -> Result<u32, HidpStatus> {
            let frame = self.frame(report)?;
            if usage == Usage::Digitizer(DigitizerUsage::ContactCount) {
                return frame.contact_count.ok_or(HidpStatus::UsageNotFound);
            }
            let &(x, y, id, _) = frame
                .contacts
                .get(&link_collection)
                .ok_or(HidpStatus::UsageNotFound)?;
            match usage {
                Usage::Generic(GenericUsage::X) => Ok(x),
                Usage::Generic(GenericUsage::Y) => Ok(y),
                Usage::Digitizer(DigitizerUsage::ContactId) => Ok(id),
                _ => Err(HidpStatus::UsageNotFound),
            }
        }
        fn max_usage_list_length(&self, _: UsagePage) -> usize {
            4
        }
        fn usages(
            &self,
            _: UsagePage,
            link_collection: u16,
            report: &[u8],
            _: usize,
        ) -> Result<UsageList, HidpStatus> {
            let frame = self.frame(report)?;
            let &(_, _, _, tip) = frame
                .contacts
                .get(&link_collection)
                .ok_or(HidpStatus::UsageNotFound)?;
            let mut list = UsageList::new();
            // Confidence is always set, it must not be mistaken for the tip.
            list.push(DigitizerUsage::Confidence as u16);
            if tip {
                list.push(DigitizerUsage::TipSwitch as u16);
            }
            Ok(list)
        }
    }

    fn pad(contacts: u16) -> TouchpadDescriptor {
        describe_device("pad".into(), &touchpad_tables(contacts, 1228, 928)).unwrap()
    }

    #[test]
    fn decodes_contacts_in_collection_order() {
        let reader = FakeReader {
            frames: vec![FakeFrame::new(&[
                (1, 100, 200, 7, true),
                (2, 300, 400, 3, false),
            ])],
        };
        let frame = decode_frame(&reader, &pad(5), &[0]).unwrap();
        assert_eq!(
            frame.as_slice(),
            [
                ContactSample {
                    touch_id: 7,
                    x: 100,
                    y: 200,
                    on_surface: true
                },
                ContactSample {
                    touch_id: 3,
                    x: 300,
                    y: 400,
                    on_surface: false
                },
            ]
        );
    }

    #[test]
    fn empty_report_is_empty_frame() {
        let reader = FakeReader {
            frames: vec![FakeFrame::new(&[])],
        };
        assert!(decode_frame(&reader, &pad(2), &[0]).unwrap().is_empty());
    }

    #[test]
    fn unreadable_count_is_fatal() {
        let reader = FakeReader {
            frames: vec![FakeFrame::default()],
        };
        assert_eq!(
            decode_frame(&reader, &pad(2), &[0]),
            Err(DecodeError::ContactCount(HidpStatus::UsageNotFound))
        );
    }

    #[test]
    fn more_contacts_than_collections_is_fatal() {
        let mut frame = FakeFrame::new(&[(1, 0, 0, 1, true)]);
        frame.contact_count = Some(3);
        let reader = FakeReader {
            frames: vec![frame],
        };
        assert_eq!(
            decode_frame(&reader, &pad(2), &[0]),
            Err(DecodeError::TooManyContacts {
                reported: 3,
                available: 2
            })
        );
    }

    #[test]
    fn missing_field_names_the_collection() {
        // Count says two, but only the first collection has data.
        let mut frame = FakeFrame::new(&[(1, 0, 0, 1, true)]);
        frame.contact_count = Some(2);
        let reader = FakeReader {
            frames: vec![frame],
        };
        assert_eq!(
            decode_frame(&reader, &pad(2), &[0]),
            Err(DecodeError::Usage {
                field: ContactField::X,
                link_collection: 2,
                status: HidpStatus::UsageNotFound
            })
        );
    }

    #[test]
    fn descriptor_without_count_collection_is_rejected() {
        let mut pad = pad(1);
        pad.contact_count_collection = None;
        assert_eq!(
            decode_frame(&FakeReader::default(), &pad, &[0]),
            Err(DecodeError::NoContactCountCollection)
        );
    }
}
