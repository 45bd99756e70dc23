//! Pure classification of provider errors into retry/fatal buckets.

use crate::providers::hetzner::client::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Locked,
    RateLimit,
    Temporary,
    InvalidParameter,
    /// Outside any recognized bucket; the caller decides what to do.
    Opaque,
}

#[must_use]
pub fn is_retryable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Locked | ErrorKind::RateLimit | ErrorKind::Temporary)
}

const LOCKED_MARKERS: [&str; 3] = ["locked", "conflict", "is busy"];
const RATE_LIMIT_MARKERS: [&str; 2] = ["rate limit", "too many requests"];
const TEMPORARY_MARKERS: [&str; 4] = ["temporary", "timeout", "503", "502"];
const INVALID_PARAMETER_MARKERS: [&str; 3] = ["invalid", "not found", "does not exist"];

#[must_use]
pub fn classify(err: &ProviderError) -> ErrorKind {
    match err {
        ProviderError::Api {
            status,
            code,
            message,
        } => {
            let lower = message.to_lowercase();
            if LOCKED_MARKERS.iter().any(|m| lower.contains(m)) {
                return ErrorKind::Locked;
            }
            if code.as_deref() == Some("rate_limit_exceeded")
                || *status == 429
                || RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
            {
                return ErrorKind::RateLimit;
            }
            if TEMPORARY_MARKERS.iter().any(|m| lower.contains(m)) {
                return ErrorKind::Temporary;
            }
            if INVALID_PARAMETER_MARKERS.iter().any(|m| lower.contains(m)) {
                return ErrorKind::InvalidParameter;
            }
            ErrorKind::Opaque
        }
        ProviderError::Timeout(_) => ErrorKind::Temporary,
        ProviderError::NotFound(_) => ErrorKind::InvalidParameter,
        ProviderError::Http(_) | ProviderError::ActionFailed { .. } | ProviderError::Serialization(_) => {
            ErrorKind::Opaque
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>, message: &str) -> ProviderError {
        ProviderError::Api {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn locked_messages_are_locked_and_retryable() {
        for msg in ["resource is locked", "update conflict", "server is busy"] {
            let kind = classify(&api(409, None, msg));
            assert_eq!(kind, ErrorKind::Locked, "{msg}");
            assert!(is_retryable(kind));
        }
    }

    #[test]
    fn rate_limit_by_code_status_or_message() {
        assert_eq!(
            classify(&api(403, Some("rate_limit_exceeded"), "slow down")),
            ErrorKind::RateLimit
        );
        assert_eq!(classify(&api(429, None, "slow down")), ErrorKind::RateLimit);
        assert_eq!(
            classify(&api(400, None, "too many requests")),
            ErrorKind::RateLimit
        );
        assert!(is_retryable(ErrorKind::RateLimit));
    }

    #[test]
    fn temporary_messages_are_retryable() {
        for msg in ["temporary failure", "read timeout", "503 Service Unavailable", "502 Bad Gateway"] {
            assert_eq!(classify(&api(500, None, msg)), ErrorKind::Temporary, "{msg}");
        }
    }

    #[test]
    fn invalid_parameter_is_fatal() {
        for msg in ["invalid server type", "resource not found", "does not exist"] {
            let kind = classify(&api(400, None, msg));
            assert_eq!(kind, ErrorKind::InvalidParameter, "{msg}");
            assert!(!is_retryable(kind));
        }
    }

    #[test]
    fn unmatched_message_is_opaque() {
        assert_eq!(classify(&api(418, None, "teapot")), ErrorKind::Opaque);
    }
}
