pub mod base;
pub mod offline;
pub mod supabase;

// Re-export the primary pieces so code outside can do
// "use crate::backend::{SessionBackend, create_backend};"
pub use base::*;
