use blobdeck_core::executor::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use blobdeck_core::format::parse_number_input;
use blobdeck_core::page::{MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("{field} is required")]
    EmptyInput { field: String },
    #[error("confirmation did not match \"{expected}\"; nothing was changed")]
    ConfirmationMismatch { expected: String },
}

/// Trimmed answer, or [`PromptError::EmptyInput`] when nothing was typed.
pub fn require_input(field: &str, raw: &str) -> Result<String, PromptError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(PromptError::EmptyInput {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Exact match of the trimmed input against `token`.
pub fn check_confirmation(input: &str, token: &str) -> Result<(), PromptError> {
    if input.trim() == token {
        Ok(())
    } else {
        Err(PromptError::ConfirmationMismatch {
            expected: token.to_string(),
        })
    }
}

pub fn page_size_from_input(raw: &str, fallback: usize) -> usize {
    parse_number_input(raw, fallback, MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

pub fn concurrency_from_input(raw: &str, fallback: usize) -> usize {
    parse_number_input(raw, fallback, MIN_CONCURRENCY, MAX_CONCURRENCY)
}
