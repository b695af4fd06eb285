// Shared helpers that do not belong to a single feature area.
pub mod http_helpers;
pub mod log_throttle;
pub mod logger;
pub mod redact;

pub use http_helpers::*;
pub use log_throttle::*;
pub use logger::*;
pub use redact::*;
