//! Error taxonomy for the request pipeline.
//!
//! Every failure a request can end in is an [`ApiError`]: transport
//! failures, unacceptable HTTP statuses, bodies that are not JSON, and
//! application errors decoded from the body. All of them expose a numeric
//! [`code`](ApiError::code) and a human-readable
//! [`description`](ApiError::description), so one failure handler covers
//! every case.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Application error codes carried in the `errorCode` response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Not an error. Never stored in an [`ApiError`].
    Success,
    InvalidAccessToken,
    ErrorData,
    /// Any code outside this enumeration.
    Unknown,
    /// The response lacked `errorCode`/`errorDescription`. Synthesized
    /// locally, never sent by the server.
    ServerResultParseError,
}

impl ErrorCode {
    pub const fn raw(self) -> i64 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::InvalidAccessToken => 2,
            ErrorCode::ErrorData => 3,
            ErrorCode::Unknown => -99,
            ErrorCode::ServerResultParseError => -999,
        }
    }

    /// Exact mapping; `None` for codes outside the enumeration.
    pub fn try_from_raw(code: i64) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Success),
            2 => Some(ErrorCode::InvalidAccessToken),
            3 => Some(ErrorCode::ErrorData),
            -99 => Some(ErrorCode::Unknown),
            -999 => Some(ErrorCode::ServerResultParseError),
            _ => None,
        }
    }

    /// Lenient mapping used for server responses: unrecognized codes become
    /// [`ErrorCode::Unknown`].
    pub fn from_raw(code: i64) -> Self {
        Self::try_from_raw(code).unwrap_or(ErrorCode::Unknown)
    }

    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }
}

/// Codes for [`ApiError::Transport`] and [`ApiError::Malformed`].
///
/// They are negative and below -999 so they never collide with
/// [`ErrorCode`] values or HTTP statuses.
pub mod transport_code {
    pub const TRANSPORT_FAILED: i64 = -1000;
    pub const TIMED_OUT: i64 = -1001;
    pub const CANCELLED: i64 = -1002;
    pub const CANNOT_CONNECT: i64 = -1004;
    pub const NOT_AVAILABLE: i64 = -1005;
    pub const IO_FAILED: i64 = -1006;
    pub const RESPONSE_SERIALIZATION_FAILED: i64 = -1007;
}

pub(crate) const PARSE_ERROR_DESCRIPTION: &str = "ServerResultCodeParseError";

/// Terminal error of a request.
///
/// `Display` renders the description alone, which is what alerts show.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The transport failed before a response arrived.
    #[error("{description}")]
    Transport { code: i64, description: String },

    /// The server answered with a status outside 200..300.
    #[error("{description}")]
    Status { status: u16, description: String },

    /// A 2xx response whose body is not JSON.
    #[error("{description}")]
    Malformed { description: String },

    /// The body carried a non-success `errorCode`, or was missing the
    /// error fields altogether.
    #[error("{description}")]
    Application {
        code: ErrorCode,
        description: String,
    },
}

impl ApiError {
    /// Application error for `code`, or `None` for the success sentinel.
    pub fn application(code: ErrorCode, description: impl Into<String>) -> Option<Self> {
        if code.is_success() {
            return None;
        }
        Some(ApiError::Application {
            code,
            description: description.into(),
        })
    }

    /// The error reported when a response lacks `errorCode` or
    /// `errorDescription`.
    pub fn parse_error() -> Self {
        ApiError::Application {
            code: ErrorCode::ServerResultParseError,
            description: PARSE_ERROR_DESCRIPTION.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        ApiError::Status {
            status,
            description: format!("Response status code was unacceptable: {}.", status),
        }
    }

    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        ApiError::Malformed {
            description: format!("Response could not be serialized as JSON: {}", reason),
        }
    }

    /// Numeric code: the transport code, the HTTP status, or the raw
    /// application code.
    pub fn code(&self) -> i64 {
        match self {
            ApiError::Transport { code, .. } => *code,
            ApiError::Status { status, .. } => i64::from(*status),
            ApiError::Malformed { .. } => transport_code::RESPONSE_SERIALIZATION_FAILED,
            ApiError::Application { code, .. } => code.raw(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ApiError::Transport { description, .. }
            | ApiError::Status { description, .. }
            | ApiError::Malformed { description }
            | ApiError::Application { description, .. } => description,
        }
    }

    /// The application code, for errors decoded from a response body.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ApiError::Application { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error came from below the application protocol.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Application { .. })
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        let code = match &err {
            BridgeError::Timeout => transport_code::TIMED_OUT,
            BridgeError::Connection(_) => transport_code::CANNOT_CONNECT,
            BridgeError::Cancelled => transport_code::CANCELLED,
            BridgeError::NotAvailable(_) => transport_code::NOT_AVAILABLE,
            BridgeError::Io(_) => transport_code::IO_FAILED,
            BridgeError::OperationFailed(_) => transport_code::TRANSPORT_FAILED,
        };
        ApiError::Transport {
            code,
            description: err.to_string(),
        }
    }
}

/// Failures while persisting or restoring the access token.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Token storage failed: {0}")]
    Storage(#[from] BridgeError),

    #[error("Stored access token is not valid UTF-8")]
    InvalidStoredToken,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
