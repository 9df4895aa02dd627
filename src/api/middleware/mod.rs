//! API middleware

mod logging;

pub use logging::{RequestId, RequestLogging, REQUEST_ID_HEADER};
