//! Error types for the voice command controller.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) available
//! via [`CommandError::code()`]. Once the loop is running only
//! [`CommandError::CredentialAcquisition`] may halt it and
//! [`CommandError::CaptureClosed`] ends it cleanly; every other kind is
//! absorbed by the fallback path and the device returns to listening.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The credential provider did not issue a usable bearer token.
    pub const CREDENTIAL_FAILED: &str = "CREDENTIAL_FAILED";

    /// The recognition request did not complete.
    pub const TRANSPORT_FAILED: &str = "TRANSPORT_FAILED";

    /// A response body could not be parsed.
    pub const PARSE_FAILED: &str = "PARSE_FAILED";

    /// An outbound request exceeded its deadline.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// The backend rejected the bearer token.
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

    /// A device platform call failed.
    pub const PLATFORM_ERROR: &str = "PLATFORM_ERROR";

    /// Captured audio does not match the linear PCM contract.
    pub const AUDIO_INVALID: &str = "AUDIO_INVALID";

    /// The platform has no further captures to deliver.
    pub const CAPTURE_CLOSED: &str = "CAPTURE_CLOSED";

    /// Local I/O failure.
    pub const IO_ERROR: &str = "IO_ERROR";
}

/// Top-level error type for the controller.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Configuration error.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// Credential acquisition failed. The system cannot recognize speech.
    #[error("[{}] {}", error_codes::CREDENTIAL_FAILED, .0)]
    CredentialAcquisition(String),

    /// Recognition request failed to complete (network or HTTP status).
    #[error("[{}] {}", error_codes::TRANSPORT_FAILED, .0)]
    Transport(String),

    /// Malformed response body.
    #[error("[{}] {}", error_codes::PARSE_FAILED, .0)]
    Parse(String),

    /// Request timed out.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Backend answered 401 for the current credential.
    #[error("[{}] {}", error_codes::UNAUTHORIZED, .0)]
    Unauthorized(String),

    /// Device platform call failed.
    #[error("[{}] {}", error_codes::PLATFORM_ERROR, .0)]
    Platform(String),

    /// Captured audio is empty or in the wrong format.
    #[error("[{}] {}", error_codes::AUDIO_INVALID, .0)]
    Audio(String),

    /// The capture source ended (for example stdin reached EOF). The loop
    /// stops cleanly.
    #[error("[{}] {}", error_codes::CAPTURE_CLOSED, .0)]
    CaptureClosed(String),

    /// I/O error.
    #[error("[{}] {}", error_codes::IO_ERROR, .0)]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::CredentialAcquisition(_) => error_codes::CREDENTIAL_FAILED,
            Self::Transport(_) => error_codes::TRANSPORT_FAILED,
            Self::Parse(_) => error_codes::PARSE_FAILED,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Unauthorized(_) => error_codes::UNAUTHORIZED,
            Self::Platform(_) => error_codes::PLATFORM_ERROR,
            Self::Audio(_) => error_codes::AUDIO_INVALID,
            Self::CaptureClosed(_) => error_codes::CAPTURE_CLOSED,
            Self::Io(_) => error_codes::IO_ERROR,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CommandError>;
