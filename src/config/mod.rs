// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod logging;
pub mod settings;
pub mod validation;

pub use logging::*;
pub use settings::*;
pub use validation::*;
