//! Run artifact persistence.

pub mod run_writer;

pub use run_writer::RunWriter;
