//! Error taxonomies for the REST envelope and the gateway connection engine.

use custom_error::custom_error;
use serde::Deserialize;

custom_error! {
    /// Everything that can go wrong calling the REST surface or using the library
    /// outside of an active gateway connection.
    #[derive(PartialEq)]
    pub FluxError

    NoResponse = "did not receive a response from the server",
    RequestFailed{url: String, error: String} = "failed to send a request to {url}: {error}",
    InvalidResponse{error: String} = "could not deserialize the response body: {error}",
    RateLimited{retry_after: f64} = "rate limited, retry after {retry_after}s",
    BadRequest{message: String} = "bad request: {message}",
    Unauthorized{message: String} = "unauthorized: {message}",
    Forbidden{message: String} = "forbidden: {message}",
    NotFound{message: String} = "not found: {message}",
    MethodNotAllowed{message: String} = "method not allowed: {message}",
    BadGateway{message: String} = "bad gateway: {message}",
    ServiceUnavailable{message: String} = "service unavailable: {message}",
    UnknownUser{message: String} = "unknown user: {message}",
    UnknownGuild{message: String} = "unknown guild: {message}",
    UnknownChannel{message: String} = "unknown channel: {message}",
    UnknownMessage{message: String} = "unknown message: {message}",
    UnknownRole{message: String} = "unknown role: {message}",
    MissingPermissions{message: String} = "missing permissions: {message}",
    ValidationError{message: String} = "validation error: {message}",
    ContentBlocked{message: String} = "content blocked: {message}",
    SlowmodeRateLimited{retry_after: f64} = "slowmode rate limited, retry after {retry_after}s",
    /// Catch-all for any `code` the mapper does not special-case; `code` is kept
    /// so callers can still match on it even though we have no dedicated variant.
    Api{code: String, message: String} = "api error {code}: {message}",
    MultipartCreation{error: String} = "failed to build a multipart request body: {error}",
    InvalidArguments{message: String} = "invalid arguments: {message}",
    /// Surfaced from `Bot::start` when the gateway connection's reconnect
    /// loop gives up after a fatal close code (see `GatewayError`).
    Gateway{error: String} = "gateway connection failed: {error}",
}

impl From<reqwest::Error> for FluxError {
    fn from(error: reqwest::Error) -> Self {
        FluxError::RequestFailed {
            url: error
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            error: error.to_string(),
        }
    }
}

impl From<GatewayError> for FluxError {
    fn from(error: GatewayError) -> Self {
        FluxError::Gateway {
            error: error.to_string(),
        }
    }
}

custom_error! {
    /// Failures arising from an active gateway connection: decode failures,
    /// protocol violations, and the fatal/resumable close-code classification.
    #[derive(PartialEq)]
    pub GatewayError

    Unknown = "an unknown gateway error occurred",
    Decode{error: String} = "failed to decode a gateway message: {error}",
    CannotConnect{error: String} = "failed to open the gateway websocket: {error}",
    NonHelloOnInitiate{opcode: u8} = "expected a HELLO frame first, got opcode {opcode}",
    AuthenticationFailed = "authentication failed (close code 4004)",
    InvalidShard = "invalid shard (close code 4010)",
    ShardingRequired = "sharding is required (close code 4011)",
    InvalidApiVersion = "invalid gateway api version (close code 4012)",
    SessionTimedOut = "the session timed out and could not be resumed",
    Reconnecting = "the connection was asked to reconnect",
}

impl GatewayError {
    /// Close codes the remote explicitly classifies as unrecoverable; any other
    /// close condition is always worth a reconnect attempt.
    pub const FATAL_CLOSE_CODES: [u16; 4] = [4004, 4010, 4011, 4012];

    /// Maps a fatal close code to its typed error. Returns `None` for any
    /// resumable close code.
    pub fn from_close_code(code: u16) -> Option<Self> {
        match code {
            4004 => Some(GatewayError::AuthenticationFailed),
            4010 => Some(GatewayError::InvalidShard),
            4011 => Some(GatewayError::ShardingRequired),
            4012 => Some(GatewayError::InvalidApiVersion),
            _ => None,
        }
    }

    pub fn is_fatal_close_code(code: u16) -> bool {
        Self::FATAL_CLOSE_CODES.contains(&code)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EmbedError {
    #[error("embed field name must not be empty")]
    EmptyFieldName,
    #[error("embed field value must not be empty")]
    EmptyFieldValue,
    #[error("embed exceeds the maximum of 25 fields")]
    TooManyFields,
}

pub type FluxResult<T> = Result<T, FluxError>;

/// The flat error envelope the REST API returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    pub retry_after: Option<f64>,
}

/// Maps a decoded error envelope and HTTP status to the most specific
/// [`FluxError`] variant available, preferring the `code` string, falling
/// back to the HTTP status, and finally collapsing into the generic
/// [`FluxError::Api`] catch-all.
///
/// Mirrors the reference implementation's `try_raise_error`: try a specific
/// code match first, then a status-based fallback, then pass the code
/// through unmodified.
pub fn map_error_body(body: ErrorResponse, status: u16) -> FluxError {
    let message = body.message.clone();
    if let Some(code) = body.code.as_deref() {
        match code {
            "UNKNOWN_USER" => return FluxError::UnknownUser { message },
            "UNKNOWN_GUILD" => return FluxError::UnknownGuild { message },
            "UNKNOWN_CHANNEL" => return FluxError::UnknownChannel { message },
            "UNKNOWN_MESSAGE" => return FluxError::UnknownMessage { message },
            "UNKNOWN_ROLE" => return FluxError::UnknownRole { message },
            "MISSING_PERMISSIONS" => return FluxError::MissingPermissions { message },
            "VALIDATION_ERROR" => return FluxError::ValidationError { message },
            "CONTENT_BLOCKED" => return FluxError::ContentBlocked { message },
            "SLOWMODE_RATE_LIMITED" => {
                return FluxError::SlowmodeRateLimited {
                    retry_after: body.retry_after.unwrap_or(1.0),
                }
            }
            "RATE_LIMITED" => {
                return FluxError::RateLimited {
                    retry_after: body.retry_after.unwrap_or(1.0),
                }
            }
            _ => {}
        }
    }
    match status {
        400 => FluxError::BadRequest { message },
        401 => FluxError::Unauthorized { message },
        403 => FluxError::Forbidden { message },
        404 => FluxError::NotFound { message },
        405 => FluxError::MethodNotAllowed { message },
        429 => FluxError::RateLimited {
            retry_after: body.retry_after.unwrap_or(1.0),
        },
        502 => FluxError::BadGateway { message },
        503 => FluxError::ServiceUnavailable { message },
        _ => FluxError::Api {
            code: body.code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_specific_code_over_status() {
        let body = ErrorResponse {
            code: Some("UNKNOWN_CHANNEL".to_string()),
            message: "404: Not Found".to_string(),
            retry_after: None,
        };
        assert_eq!(
            map_error_body(body, 404),
            FluxError::UnknownChannel {
                message: "404: Not Found".to_string()
            }
        );
    }

    #[test]
    fn falls_back_to_status_when_code_unrecognized() {
        let body = ErrorResponse {
            code: Some("SOME_FUTURE_CODE".to_string()),
            message: "nope".to_string(),
            retry_after: None,
        };
        assert_eq!(
            map_error_body(body, 403),
            FluxError::Forbidden {
                message: "nope".to_string()
            }
        );
    }

    #[test]
    fn collapses_to_generic_api_error_when_nothing_matches() {
        let body = ErrorResponse {
            code: Some("SOME_FUTURE_CODE".to_string()),
            message: "still nope".to_string(),
            retry_after: None,
        };
        assert_eq!(
            map_error_body(body, 418),
            FluxError::Api {
                code: "SOME_FUTURE_CODE".to_string(),
                message: "still nope".to_string()
            }
        );
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let body = ErrorResponse {
            code: None,
            message: String::new(),
            retry_after: Some(0.75),
        };
        assert_eq!(
            map_error_body(body, 429),
            FluxError::RateLimited { retry_after: 0.75 }
        );
    }

    #[test]
    fn fatal_close_codes_classified() {
        assert_eq!(
            GatewayError::from_close_code(4004),
            Some(GatewayError::AuthenticationFailed)
        );
        assert_eq!(GatewayError::from_close_code(4000), None);
        assert!(GatewayError::is_fatal_close_code(4011));
        assert!(!GatewayError::is_fatal_close_code(1000));
    }
}
