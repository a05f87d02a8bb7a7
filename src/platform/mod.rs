//! OS backends. Each one fills [`DeviceEntry`](crate::caps::DeviceEntry)s and provides a
//! [`ReportReader`](crate::report::ReportReader) over live reports.

pub mod raw_input;
