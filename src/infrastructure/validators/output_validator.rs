//! Parse-and-validate boundary for LLM output.
//!
//! Models often wrap JSON in markdown fences even when told not to, or lead
//! with a sentence of prose. The payload is pulled out of the first fenced
//! block, or else the outermost brace span, before decoding.

use crate::domain::models::artifact::Artifact;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Extract the JSON payload from raw model text.
///
/// Handles these forms:
/// - ```` ```json\n{...}\n``` ````
/// - ```` ```\n{...}\n``` ````
/// - bare JSON with surrounding whitespace
/// - prose around an unfenced object (first `{` to last `}`)
///
/// An unterminated fence yields everything after the opening marker.
pub fn extract_json_payload(text: &str) -> &str {
    let text = text.trim();

    let (start, marker_len) = if let Some(pos) = text.find(JSON_FENCE) {
        (pos, JSON_FENCE.len())
    } else if let Some(pos) = text.find(FENCE) {
        (pos, FENCE.len())
    } else {
        return brace_span(text);
    };

    let body = &text[start + marker_len..];
    let end = body.find(FENCE).unwrap_or(body.len());
    body[..end].trim()
}

/// Outermost `{...}` span of `text`, or `text` itself when there is none.
fn brace_span(text: &str) -> &str {
    if text.starts_with('{') && text.ends_with('}') {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Decode `raw` into `A` and run its business rules.
///
/// The error string is fed back to the model on retry, so it names the
/// problem rather than the call site.
pub fn parse_artifact<A: Artifact>(raw: &str) -> Result<A, String> {
    let payload = extract_json_payload(raw);
    if payload.is_empty() {
        return Err(format!("empty response, expected a {} JSON object", A::KIND));
    }

    let artifact: A =
        serde_json::from_str(payload).map_err(|e| format!("invalid {} JSON: {e}", A::KIND))?;
    artifact
        .validate()
        .map_err(|e| format!("{} failed validation: {e}", A::KIND))?;
    Ok(artifact)
}
