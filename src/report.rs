//! # Report reading
//!
//! Raw reports are opaque bytes. Only the device's HID parser knows where each field lives in them, so
//! everything here goes through [`ReportReader`], implemented by whichever backend owns that knowledge
//! (`HidP_*` on Windows, a fake in tests).

use smallvec::SmallVec;

use crate::usage::{Usage, UsagePage};

/// Failure codes of the HID parser. Mirrors the `HIDP_STATUS_*` family that matters in practice.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidpStatus {
    #[error("the report length is not valid")]
    InvalidReportLength,
    #[error("the specified report type is not valid")]
    InvalidReportType,
    #[error("the usage exists, but not in a report of this id")]
    IncompatibleReportId,
    #[error("the preparsed data is not valid")]
    InvalidPreparsedData,
    #[error("the collection does not contain the usage in any report")]
    UsageNotFound,
    #[error("the usage list buffer is too small")]
    BufferTooSmall,
    #[error("HID parser failed with status {0:#010x}")]
    Other(u32),
}
impl HidpStatus {
    /// `HIDP_STATUS_SUCCESS`.
    pub const SUCCESS: u32 = 0x0011_0000;

    /// Interpret a raw `NTSTATUS` from the HID parser. `Ok` on success.
    /// # Errors
    /// Any non-success status, mapped to the matching variant.
    pub fn check(status: u32) -> Result<(), Self> {
        match status {
            Self::SUCCESS => Ok(()),
            0xC011_0001 => Err(Self::InvalidPreparsedData),
            0xC011_0002 => Err(Self::InvalidReportType),
            0xC011_0003 => Err(Self::InvalidReportLength),
            0xC011_0004 => Err(Self::UsageNotFound),
            0xC011_0007 => Err(Self::BufferTooSmall),
            0xC011_000A => Err(Self::IncompatibleReportId),
            other => Err(Self::Other(other)),
        }
    }
}

/// Active usages of a collection. Touchpads report a handful at most.
pub type UsageList = SmallVec<[u16; 8]>;

/// The primitives a device's HID parser must provide to decode its input reports.
pub trait ReportReader {
    /// Read one value usage from `link_collection` in `report`.
    /// # Errors
    /// The parser's status if the usage can't be read from this report.
    fn usage_value(&self, usage: Usage, link_collection: u16, report: &[u8])
        -> Result<u32, HidpStatus>;
    /// Upper bound on how many button usages of `page` can be active at once.
    #[must_use]
    fn max_usage_list_length(&self, page: UsagePage) -> usize;
    /// Button usages of `page` currently set in `link_collection`. Never more than `max` of them.
    /// # Errors
    /// The parser's status if the list can't be read from this report.
    fn usages(
        &self,
        page: UsagePage,
        link_collection: u16,
        report: &[u8],
        max: usize,
    ) -> Result<UsageList, HidpStatus>;
}

impl<R: ReportReader + ?Sized> ReportReader for &R {
    fn usage_value(
        &self,
        usage: Usage,
        link_collection: u16,
        report: &[u8],
    ) -> Result<u32, HidpStatus> {
        (**self).usage_value(usage, link_collection, report)
    }
    fn max_usage_list_length(&self, page: UsagePage) -> usize {
        (**self).max_usage_list_length(page)
    }
    fn usages(
        &self,
        page: UsagePage,
        link_collection: u16,
        report: &[u8],
        max: usize,
    ) -> Result<UsageList, HidpStatus> {
        (**self).usages(page, link_collection, report, max)
    }
}
