//! Knowledge provider adapters.

pub mod librarian;

pub use librarian::{sheets_for_role, Librarian};
