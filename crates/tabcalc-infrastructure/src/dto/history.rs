//! History item DTO.

use super::value::{ScopeDto, decode_value, encode_value};
use serde::{Deserialize, Serialize};
use tabcalc_core::evaluation::EvaluationResult;

/// Prefix of persisted error messages.
const ERROR_PREFIX: &str = "Error: ";

/// The `error` field: `false` for successes, the message for failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorFlagDto {
    Flag(bool),
    Message(String),
}

impl Default for ErrorFlagDto {
    fn default() -> Self {
        ErrorFlagDto::Flag(false)
    }
}

/// One persisted history entry.
///
/// Entries written by the very first widget only carry `expression` and
/// `result`; every other field is optional on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItemDto {
    #[serde(default)]
    pub error: ErrorFlagDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default)]
    pub expression: String,
    #[serde(rename = "TeX", default)]
    pub tex: String,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default, skip_serializing_if = "ScopeDto::is_empty")]
    pub assignments: ScopeDto,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<&EvaluationResult> for HistoryItemDto {
    fn from(entry: &EvaluationResult) -> Self {
        match entry.result() {
            Some(value) => HistoryItemDto {
                error: ErrorFlagDto::Flag(false),
                original: Some(entry.original().to_string()),
                expression: entry.normalized_expression().to_string(),
                tex: entry.display_form().to_string(),
                result: encode_value(value),
                assignments: entry
                    .assignments()
                    .iter()
                    .map(|(name, value)| (name.clone(), encode_value(value)))
                    .collect(),
            },
            None => HistoryItemDto {
                error: ErrorFlagDto::Message(format!(
                    "{}{}",
                    ERROR_PREFIX,
                    entry.error_message().unwrap_or_default()
                )),
                original: Some(entry.original().to_string()),
                expression: String::new(),
                tex: String::new(),
                result: serde_json::Value::String(String::new()),
                assignments: ScopeDto::new(),
            },
        }
    }
}

impl From<HistoryItemDto> for EvaluationResult {
    fn from(dto: HistoryItemDto) -> Self {
        let is_oldest_format = dto.original.is_none();
        let original = dto.original.unwrap_or_else(|| dto.expression.clone());

        let failure_message = match (&dto.error, &dto.result) {
            (ErrorFlagDto::Message(message), _) => Some(strip_error_prefix(message)),
            (ErrorFlagDto::Flag(true), serde_json::Value::String(message)) => {
                Some(strip_error_prefix(message))
            }
            (ErrorFlagDto::Flag(true), _) => Some("Error".to_string()),
            // The first widget stored failures as the result text.
            (ErrorFlagDto::Flag(false), serde_json::Value::String(message))
                if is_oldest_format && message.starts_with(ERROR_PREFIX) =>
            {
                Some(strip_error_prefix(message))
            }
            _ => None,
        };

        if let Some(message) = failure_message {
            return EvaluationResult::failure(original, message);
        }

        let assignments = dto
            .assignments
            .into_iter()
            .map(|(name, json)| (name, decode_value(json)))
            .collect();
        EvaluationResult::success(original, dto.expression, dto.tex, decode_value(dto.result))
            .with_assignments(assignments)
    }
}

fn strip_error_prefix(message: &str) -> String {
    message
        .strip_prefix(ERROR_PREFIX)
        .unwrap_or(message)
        .to_string()
}
