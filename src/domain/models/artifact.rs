//! Typed artifact boundary.
//!
//! Every stage output is a concrete record type that knows its field list (for
//! the prompt) and its business rules (checked after deserialization).

use serde::de::DeserializeOwned;
use serde::Serialize;

/// One entry of an artifact's field-description list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dotted path, `[]` marks list elements (e.g. `pain_points[].confidence`)
    pub name: &'static str,
    /// JSON type shown to the model (`string`, `number`, `array<object>`, ...)
    pub type_name: &'static str,
    /// Whether the field must be present
    pub required: bool,
    /// One-line meaning of the field
    pub description: &'static str,
}

impl FieldSpec {
    /// A field the model must always emit.
    pub const fn required(name: &'static str, type_name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            type_name,
            required: true,
            description,
        }
    }

    /// A field the model may omit.
    pub const fn optional(name: &'static str, type_name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            type_name,
            required: false,
            description,
        }
    }
}

/// A validated structured output of one pipeline stage.
pub trait Artifact: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Type name shown to the critic and used in logs.
    const KIND: &'static str;

    /// Field-description list rendered into the agent's prompt.
    fn schema() -> &'static [FieldSpec];

    /// Business rules serde cannot express (ranges, minimum lengths, arithmetic).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Render the schema as the `# OUTPUT FORMAT` block.
    fn describe_schema() -> String {
        let mut out = format!("Respond with a single JSON object of type {}:\n", Self::KIND);
        for field in Self::schema() {
            out.push_str(&format!(
                "- {} ({}, {}): {}\n",
                field.name,
                field.type_name,
                if field.required { "required" } else { "optional" },
                field.description
            ));
        }
        out
    }
}

/// Fail with `message` unless `condition` holds.
pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

/// Whether `actual` is within `tolerance` of `expected`.
pub(crate) fn close_to(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Reading {
        value: f64,
    }

    impl Artifact for Reading {
        const KIND: &'static str = "Reading";

        fn schema() -> &'static [FieldSpec] {
            const FIELDS: &[FieldSpec] = &[
                FieldSpec::required("value", "number", "A measured value"),
                FieldSpec::optional("note", "string", "Free text"),
            ];
            FIELDS
        }
    }

    #[test]
    fn test_describe_schema_lists_fields() {
        let rendered = Reading::describe_schema();
        assert!(rendered.contains("type Reading"));
        assert!(rendered.contains("- value (number, required): A measured value"));
        assert!(rendered.contains("- note (string, optional): Free text"));
    }

    #[test]
    fn test_close_to() {
        assert!(close_to(13.0, 13.004, 0.01));
        assert!(!close_to(13.0, 13.2, 0.1));
    }
}
