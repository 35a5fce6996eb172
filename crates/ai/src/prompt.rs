use serde::Serialize;

use crate::result::AiError;

/// Instruction line that precedes the appointment listing.
pub const SUMMARY_PROMPT_PREFIX: &str = "Generate a helpful summary for these appointments:";

/// Build the prompt for a batch of appointment records.
///
/// The listing is pretty-printed JSON (two-space indent) on the line after
/// [`SUMMARY_PROMPT_PREFIX`].
pub fn summary_prompt<T: Serialize>(appointments: &[T]) -> Result<String, AiError> {
    let listing = serde_json::to_string_pretty(appointments)
        .map_err(|e| AiError::InvalidInput(e.to_string()))?;
    Ok(format!("{SUMMARY_PROMPT_PREFIX}\n{listing}"))
}
