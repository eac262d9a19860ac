//! Shared HTTP response handling: error-body parsing, credit-exhaustion
//! heuristics, and canonical status messages.

#[cfg(feature = "client")]
use crate::errors::{ApiError, Error};

/// Keywords that mark a 403 message as usage-quota exhaustion rather than an
/// authorization failure.
const CREDIT_KEYWORDS: &[&str] = &[
    "credit",
    "credits",
    "remaining",
    "exhausted",
    "usage",
    "limit",
    "subscription",
    "upgrade",
    "plan",
];

/// Fallback message for a 403 whose body could not be parsed. The service
/// most commonly returns opaque 403s when credits run out.
#[cfg(feature = "client")]
pub(crate) const FORBIDDEN_CREDIT_MESSAGE: &str =
    "Access forbidden - this may be due to insufficient credits.";

/// Maximum length of the body preview attached to payload errors.
const PREVIEW_LEN: usize = 200;

/// Whether an error message indicates credit exhaustion.
pub fn is_credit_message(message: &str) -> bool {
    if message.is_empty() {
        return false;
    }
    let lower = message.to_lowercase();
    CREDIT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Format a credit error message for display.
pub fn credit_display_message(message: &str) -> String {
    if message.is_empty() {
        return "No credits remaining to execute this workflow.".to_string();
    }
    if message.contains("This request requires") || message.contains("You have used") {
        return message.to_string();
    }
    format!("Credit limit reached: {message}")
}

/// Canonical human-readable message for a non-2xx status.
#[cfg(feature = "client")]
pub(crate) fn canonical_status_message(status: u16) -> String {
    match status {
        401 => "authentication failed - check your API key".to_string(),
        403 => "access forbidden - check your API key permissions".to_string(),
        404 => "workflow not found".to_string(),
        429 => "rate limited - try again later".to_string(),
        500..=599 => format!("runchat server error (HTTP {status})"),
        _ => format!("request failed (HTTP {status})"),
    }
}

/// Truncate a response body to a short preview for error reporting.
pub(crate) fn body_preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= PREVIEW_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(PREVIEW_LEN).collect();
    format!("{cut}...")
}

/// Extract a message from an `{"error": "..."}` or `{"message": "..."}` body.
#[cfg(feature = "client")]
fn message_from_body(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("message").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

/// Map a non-2xx response to an [`ApiError`].
///
/// 403 bodies are inspected for credit-exhaustion semantics: a parseable
/// error message is classified by keyword, while an opaque body is treated
/// as a credit-flavored forbidden error.
#[cfg(feature = "client")]
pub(crate) fn parse_api_error(status: u16, body: String) -> Error {
    let extracted = message_from_body(&body);

    if status == 403 && extracted.is_none() {
        let mut err = ApiError {
            status,
            message: FORBIDDEN_CREDIT_MESSAGE.to_string(),
            is_credit_error: true,
            raw_body: None,
        };
        if !body.is_empty() {
            err.raw_body = Some(body);
        }
        return err.into();
    }

    let message = extracted.unwrap_or_else(|| canonical_status_message(status));
    let mut err = ApiError::new(status, message);
    if !body.is_empty() {
        err = err.with_raw_body(body);
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_keywords_match_case_insensitively() {
        assert!(is_credit_message("You have used all available credits"));
        assert!(is_credit_message("Upgrade your PLAN to continue"));
        assert!(!is_credit_message("forbidden"));
        assert!(!is_credit_message(""));
    }

    #[test]
    fn credit_display_passes_known_phrasings_through() {
        assert_eq!(
            credit_display_message(""),
            "No credits remaining to execute this workflow."
        );
        assert_eq!(
            credit_display_message("You have used 100 of 100 credits"),
            "You have used 100 of 100 credits"
        );
        assert_eq!(
            credit_display_message("quota exceeded"),
            "Credit limit reached: quota exceeded"
        );
    }

    #[cfg(feature = "client")]
    #[test]
    fn canonical_messages_cover_the_taxonomy() {
        assert_eq!(
            canonical_status_message(401),
            "authentication failed - check your API key"
        );
        assert_eq!(canonical_status_message(404), "workflow not found");
        assert_eq!(
            canonical_status_message(503),
            "runchat server error (HTTP 503)"
        );
        assert_eq!(canonical_status_message(418), "request failed (HTTP 418)");
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let preview = body_preview(&long);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
        assert_eq!(body_preview("short"), "short");
    }

    #[cfg(feature = "client")]
    #[test]
    fn parse_403_with_credit_message() {
        let err = parse_api_error(
            403,
            "{\"error\":\"You have used all available credits\"}".to_string(),
        );
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 403);
                assert!(api.is_credit_error);
                assert_eq!(api.message, "You have used all available credits");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[cfg(feature = "client")]
    #[test]
    fn parse_403_without_credit_keyword() {
        let err = parse_api_error(403, "{\"error\":\"forbidden\"}".to_string());
        match err {
            Error::Api(api) => {
                assert!(!api.is_credit_error);
                assert_eq!(api.message, "forbidden");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[cfg(feature = "client")]
    #[test]
    fn parse_403_with_opaque_body_defaults_to_credit() {
        let err = parse_api_error(403, "<html>forbidden</html>".to_string());
        match err {
            Error::Api(api) => {
                assert!(api.is_credit_error);
                assert_eq!(api.message, FORBIDDEN_CREDIT_MESSAGE);
                assert!(api.raw_body.is_some());
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[cfg(feature = "client")]
    #[test]
    fn parse_error_prefers_body_message_over_canonical() {
        let err = parse_api_error(500, "{\"message\":\"db down\"}".to_string());
        match err {
            Error::Api(api) => assert_eq!(api.message, "db down"),
            other => panic!("expected api error, got {other:?}"),
        }

        let err = parse_api_error(500, String::new());
        match err {
            Error::Api(api) => {
                assert_eq!(api.message, "runchat server error (HTTP 500)");
                assert!(api.raw_body.is_none());
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
