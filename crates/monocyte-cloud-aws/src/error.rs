//! AWS error classification
//!
//! SDK errors are classified by HTTP status and error code (`.code()`), never by
//! matching on their Debug output.

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use monocyte_cloud::SweepError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsError {
    /// A dry-run request that would have succeeded (`DryRunOperation`, HTTP 412)
    #[error("Request would have succeeded, but DryRun flag is set: {message}")]
    DryRunOperation { message: String },

    /// HTTP 400 without a more specific classification
    #[error("Bad request ({}): {message}", code.as_deref().unwrap_or("unknown"))]
    BadRequest {
        code: Option<String>,
        message: String,
    },

    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    #[error("Not authorized ({code}): {message}")]
    Unauthorized { code: String, message: String },

    #[error("Rate limit exceeded")]
    Throttled,

    /// The request never produced a response (dispatch failure, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("AWS error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Sdk {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// The dry-run check confirmed the action would be attempted
    pub fn is_dry_run_success(&self) -> bool {
        matches!(self, AwsError::DryRunOperation { .. })
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, AwsError::BadRequest { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AwsError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;

impl From<AwsError> for SweepError {
    fn from(e: AwsError) -> Self {
        match e {
            AwsError::Unauthorized { .. } => SweepError::AuthenticationFailed(e.to_string()),
            other => SweepError::ApiError(other.to_string()),
        }
    }
}

const PRECONDITION_FAILED: u16 = 412;
const BAD_REQUEST: u16 = 400;

const DRY_RUN_CODES: &[&str] = &["DryRunOperation"];

const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "NoSuchBucket",
    "NoSuchKey",
];

const UNAUTHORIZED_CODES: &[&str] = &[
    "UnauthorizedOperation",
    "AuthFailure",
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];

const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an AWS service error from its HTTP status, code and message.
pub fn classify_aws_error(
    status: Option<u16>,
    code: Option<&str>,
    message: Option<&str>,
) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if DRY_RUN_CODES.contains(&c) => return AwsError::DryRunOperation { message },
        Some(c) if NOT_FOUND_CODES.contains(&c) => {
            return AwsError::NotFound {
                code: c.to_string(),
                message,
            };
        }
        Some(c) if UNAUTHORIZED_CODES.contains(&c) => {
            return AwsError::Unauthorized {
                code: c.to_string(),
                message,
            };
        }
        Some(c) if THROTTLING_CODES.contains(&c) => return AwsError::Throttled,
        _ => {}
    }

    match status {
        Some(PRECONDITION_FAILED) => AwsError::DryRunOperation { message },
        Some(BAD_REQUEST) => AwsError::BadRequest {
            code: code.map(str::to_string),
            message,
        },
        _ => AwsError::Sdk {
            status,
            code: code.map(str::to_string),
            message,
        },
    }
}

/// Classify an SDK error returned by any EC2 or S3 operation.
pub fn classify_sdk_error<E>(err: &SdkError<E>) -> AwsError
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            AwsError::Transport(err.to_string())
        }
        _ => {
            let status = err.raw_response().map(|r| r.status().as_u16());
            classify_aws_error(status, err.code(), err.message())
        }
    }
}
