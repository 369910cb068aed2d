//! Error types for the AWS layer

use thiserror::Error;

/// Maximum length of an error message shown to the user
const MAX_MESSAGE_LENGTH: usize = 120;

/// Errors raised while talking to AWS
#[derive(Error, Debug)]
pub enum AwsError {
    /// The service rejected the request
    #[error("{service}:{operation} failed [{code}]: {message}")]
    Api {
        service: String,
        operation: String,
        code: String,
        message: String,
    },

    /// A dispatch call was made without a parameter it needs
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// No SDK call is mapped to this operation
    #[error("Unknown {service} operation: {operation}")]
    UnknownOperation { service: String, operation: String },

    /// Credentials could not be resolved or were rejected
    #[error("Credentials error: {0}")]
    Credentials(String),
}

impl AwsError {
    /// The AWS error code, if this is a service error
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Format an AWS error for display
/// Security: keeps raw service messages out of the common cases
pub fn format_aws_error(error: &anyhow::Error) -> String {
    if let Some(aws) = error.downcast_ref::<AwsError>() {
        match aws.code() {
            Some(
                "AccessDenied"
                | "AccessDeniedException"
                | "UnauthorizedOperation"
                | "Forbidden",
            ) => {
                return "Permission denied. Check your IAM permissions.".to_string();
            }
            Some(
                "AuthFailure"
                | "ExpiredToken"
                | "ExpiredTokenException"
                | "InvalidClientTokenId"
                | "UnrecognizedClientException"
                | "SignatureDoesNotMatch",
            ) => {
                return "Authentication failed. Run 'aws configure' or refresh your session."
                    .to_string();
            }
            Some("OptInRequired" | "InvalidRegion") => {
                return "Region is not enabled for this account.".to_string();
            }
            Some(
                "Throttling"
                | "ThrottlingException"
                | "RequestLimitExceeded"
                | "TooManyRequestsException",
            ) => {
                return "Rate limit exceeded. Please try again later.".to_string();
            }
            Some(code) if code.ends_with("NotFound") || code.ends_with("NotFoundException") => {
                return "Resource not found.".to_string();
            }
            _ => {}
        }
        if let AwsError::Credentials(_) = aws {
            return "No usable AWS credentials found.".to_string();
        }
    }

    let error_str = error.to_string();
    let mut printable = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ');
    let sanitized = printable.by_ref().take(MAX_MESSAGE_LENGTH).collect::<String>();

    if printable.next().is_some() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> anyhow::Error {
        AwsError::Api {
            service: "ec2".to_string(),
            operation: "describe_instances".to_string(),
            code: code.to_string(),
            message: "boom".to_string(),
        }
        .into()
    }

    #[test]
    fn test_permission_errors_are_mapped() {
        assert_eq!(
            format_aws_error(&api("UnauthorizedOperation")),
            "Permission denied. Check your IAM permissions."
        );
        assert_eq!(
            format_aws_error(&api("AccessDeniedException")),
            "Permission denied. Check your IAM permissions."
        );
    }

    #[test]
    fn test_auth_and_region_errors_are_mapped() {
        assert!(format_aws_error(&api("AuthFailure")).starts_with("Authentication failed"));
        assert_eq!(
            format_aws_error(&api("OptInRequired")),
            "Region is not enabled for this account."
        );
        assert_eq!(
            format_aws_error(&api("ClusterNotFoundException")),
            "Resource not found."
        );
    }

    #[test]
    fn test_unknown_code_keeps_message() {
        let formatted = format_aws_error(&api("WeirdThing"));
        assert!(formatted.contains("WeirdThing"));
        assert!(formatted.contains("describe_instances"));
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let err = anyhow::anyhow!("{}", "x".repeat(500));
        let formatted = format_aws_error(&err);
        assert!(formatted.ends_with("..."));
        assert_eq!(formatted.len(), MAX_MESSAGE_LENGTH + 3);
    }

    #[test]
    fn test_filtered_characters_do_not_mark_truncation() {
        let err = anyhow::anyhow!("line one\nline two \u{00e9}");
        assert_eq!(format_aws_error(&err), "line oneline two ");

        let exact = anyhow::anyhow!("{}\n", "y".repeat(MAX_MESSAGE_LENGTH));
        assert_eq!(format_aws_error(&exact), "y".repeat(MAX_MESSAGE_LENGTH));
    }
}
