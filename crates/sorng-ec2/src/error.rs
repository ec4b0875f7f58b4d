//! Error types for EC2 operations.
//!
//! Two kinds of failure reach callers: the provider sent something that is
//! not a well-formed response (`MalformedInput`), or the provider/transport
//! rejected the request (`Service`). The first is produced locally by the
//! decoder and is never retried; the second is produced by the transport and
//! has already been through the retry policy by the time a caller sees it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decoders::{ErrorBody, ErrorDecoder};
use crate::xml;

/// Top-level error type for all EC2 operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Ec2Error {
    /// The response body is not well-formed XML, or its elements arrived in
    /// an order no decoder state accepts.
    #[error("malformed response: {0}")]
    MalformedInput(String),
    /// The service rejected the request or the HTTP exchange failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Ec2Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MalformedInput(_) => false,
            Self::Service(err) => err.retryable,
        }
    }

    /// The service error code, if this is a service error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::MalformedInput(_) => None,
            Self::Service(err) => Some(&err.code),
        }
    }
}

impl From<quick_xml::Error> for Ec2Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Ec2Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<reqwest::Error> for Ec2Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(ServiceError::from(err))
    }
}

/// Error reported by the EC2 endpoint or by the HTTP layer underneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    /// The error code (e.g., "InvalidKeyPair.NotFound", "AuthFailure").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The HTTP status code, or 0 if no response was received.
    pub status_code: u16,
    /// Request ID echoed by the service.
    pub request_id: Option<String>,
    /// The API action that failed.
    pub action: Option<String>,
    /// Whether this error is retryable.
    pub retryable: bool,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EC2 error [{}]: {} (HTTP {})",
            self.code, self.message, self.status_code
        )?;
        if let Some(ref action) = self.action {
            write!(f, " during {}", action)?;
        }
        if let Some(ref req_id) = self.request_id {
            write!(f, " [RequestId: {}]", req_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn new(code: &str, message: &str, status_code: u16) -> Self {
        let retryable = Self::is_retryable_code(code, status_code);
        Self {
            code: code.to_string(),
            message: message.to_string(),
            status_code,
            request_id: None,
            action: None,
            retryable,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    /// Transient codes and statuses that the retry policy may repeat.
    fn is_retryable_code(code: &str, status_code: u16) -> bool {
        if matches!(status_code, 429 | 500 | 502 | 503 | 504) {
            return true;
        }
        matches!(
            code,
            "Throttling"
                | "RequestLimitExceeded"
                | "EC2ThrottledException"
                | "BandwidthLimitExceeded"
                | "InternalError"
                | "ServiceUnavailable"
                | "Unavailable"
                | "InsufficientAddressCapacity"
                | "RequestTimeout"
        )
    }

    /// Parse an EC2 XML error response.
    ///
    /// ```xml
    /// <Response>
    ///   <Errors>
    ///     <Error>
    ///       <Code>InvalidKeyPair.NotFound</Code>
    ///       <Message>The key pair 'x' does not exist</Message>
    ///     </Error>
    ///   </Errors>
    ///   <RequestID>abc-123</RequestID>
    /// </Response>
    /// ```
    ///
    /// A body that is not XML (a proxy's plain-text page, an empty body)
    /// yields `UnknownError` with the HTTP status in the message.
    pub fn parse_xml_error(status_code: u16, body: &str) -> Self {
        let parsed = match xml::decode(body.as_bytes(), ErrorDecoder::default()) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("HTTP {} error body is not XML: {}", status_code, e);
                ErrorBody::default()
            }
        };
        let code = parsed.code.unwrap_or_else(|| "UnknownError".to_string());
        let message = parsed
            .message
            .unwrap_or_else(|| format!("HTTP {} from ec2", status_code));

        let mut err = Self::new(&code, &message, status_code);
        err.request_id = parsed.request_id;
        err
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            code: "HttpError".to_string(),
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()).unwrap_or(0),
            request_id: None,
            action: None,
            retryable: err.is_timeout() || err.is_connect(),
        }
    }
}

/// Convenience result type for EC2 operations.
pub type Ec2Result<T> = Result<T, Ec2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ServiceError::new("InvalidKeyPair.NotFound", "Key not found", 400)
            .with_action("DeleteKeyPair");
        let s = err.to_string();
        assert!(s.contains("InvalidKeyPair.NotFound"));
        assert!(s.contains("400"));
        assert!(s.contains("DeleteKeyPair"));
    }

    #[test]
    fn parse_xml_error_basic() {
        let xml = "<Response><Errors><Error><Code>AuthFailure</Code>\
                   <Message>Not authorized</Message></Error></Errors>\
                   <RequestID>req-1</RequestID></Response>";
        let err = ServiceError::parse_xml_error(401, xml);
        assert_eq!(err.code, "AuthFailure");
        assert_eq!(err.message, "Not authorized");
        assert_eq!(err.request_id.as_deref(), Some("req-1"));
        assert!(!err.retryable);
    }

    #[test]
    fn parse_xml_error_without_code() {
        let err = ServiceError::parse_xml_error(502, "<html>bad gateway</html>");
        assert_eq!(err.code, "UnknownError");
        assert!(err.message.contains("502"));
        assert!(err.retryable);
    }

    #[test]
    fn parse_xml_error_unescapes_message() {
        let xml = "<Response><Errors><Error><Code>InvalidKeyPair.NotFound</Code>\
                   <Message>The key pair &apos;deploy&apos; does not exist</Message>\
                   </Error></Errors><RequestID>req-4</RequestID></Response>";
        let err = ServiceError::parse_xml_error(400, xml);
        assert_eq!(err.message, "The key pair 'deploy' does not exist");
        assert_eq!(err.request_id.as_deref(), Some("req-4"));
    }

    #[test]
    fn parse_xml_error_with_namespace_and_attributes() {
        let xml = r#"<Response xmlns="http://ec2.amazonaws.com/doc/2008-12-01/">
            <Errors><Error><Code type="Sender">InvalidParameterValue</Code>
            <Message>bad &lt;port&gt;</Message></Error></Errors>
            <RequestId>req-5</RequestId></Response>"#;
        let err = ServiceError::parse_xml_error(400, xml);
        assert_eq!(err.code, "InvalidParameterValue");
        assert_eq!(err.message, "bad <port>");
        assert_eq!(err.request_id.as_deref(), Some("req-5"));
    }

    #[test]
    fn parse_xml_error_plain_text_body() {
        let err = ServiceError::parse_xml_error(503, "Service Unavailable");
        assert_eq!(err.code, "UnknownError");
        assert_eq!(err.message, "HTTP 503 from ec2");
        assert_eq!(err.request_id, None);
        assert!(err.retryable);

        let err = ServiceError::parse_xml_error(500, "");
        assert_eq!(err.code, "UnknownError");
    }

    #[test]
    fn retryable_throttling() {
        assert!(ServiceError::new("RequestLimitExceeded", "slow down", 400).retryable);
        assert!(!ServiceError::new("InvalidParameterValue", "bad", 400).retryable);
    }

    #[test]
    fn malformed_is_distinct_from_service() {
        let malformed = Ec2Error::malformed("unexpected end of input");
        let service = Ec2Error::from(ServiceError::new("Unavailable", "down", 503));
        assert!(malformed.is_malformed());
        assert!(!malformed.is_retryable());
        assert_eq!(malformed.code(), None);
        assert!(!service.is_malformed());
        assert!(service.is_retryable());
        assert_eq!(service.code(), Some("Unavailable"));
    }
}
