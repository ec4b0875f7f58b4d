use crate::error::Ec2Result;
use crate::xml::{Decoder, PathContext};

/// Fields of a provider error body. Each is `None` when the element is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

/// Error responses: `Response/Errors/Error/{Code,Message}` plus the
/// `RequestID` sibling of `Errors`.
///
/// Only the first `Error` is kept; the provider never sends more than one
/// for a Query API call.
#[derive(Debug, Default)]
pub struct ErrorDecoder {
    body: ErrorBody,
}

impl Decoder for ErrorDecoder {
    type Output = ErrorBody;

    fn reset(&mut self) {
        self.body = ErrorBody::default();
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        let slot = match name {
            "Code" if path.ends_with(&["Error", "Code"]) => &mut self.body.code,
            "Message" if path.ends_with(&["Error", "Message"]) => &mut self.body.message,
            "RequestID" | "RequestId" => &mut self.body.request_id,
            _ => return Ok(()),
        };
        if slot.is_none() {
            *slot = Some(text.trim().to_string());
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<ErrorBody> {
        Ok(self.body)
    }
}
