//! Streaming XML decoding.
//!
//! [`decode`] walks a response body once with `quick-xml`'s event reader,
//! keeps the [`PathContext`] and per-element text, and forwards open/close
//! events to a schema-specific [`Decoder`]. Nothing but the open-element
//! stack and the current text is held in memory.

mod engine;
mod path;

pub use engine::decode;
pub use path::PathContext;

use crate::error::Ec2Result;

/// An attribute of an opening tag, entity references already expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Turns open/close events into one result value.
///
/// `path` includes the element the event is about. Returning an error from
/// any callback aborts the decode; nothing the decoder built so far is
/// returned.
pub trait Decoder {
    type Output;

    /// Drop any state from a previous document.
    fn reset(&mut self);

    fn on_open(
        &mut self,
        _path: &PathContext,
        _name: &str,
        _attributes: &[Attribute],
    ) -> Ec2Result<()> {
        Ok(())
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()>;

    /// Hand over the result once the document has ended cleanly.
    fn finish(self) -> Ec2Result<Self::Output>;
}
