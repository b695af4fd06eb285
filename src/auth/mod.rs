pub mod guard;
pub mod provider;
pub mod session;

// Re-export so handlers can do "use crate::auth::*;"
pub use guard::*;
pub use provider::*;
pub use session::*;
