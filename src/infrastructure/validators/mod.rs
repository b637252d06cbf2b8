//! Output validation for agent and critic responses.

pub mod output_validator;

pub use output_validator::{extract_json_payload, parse_artifact};
