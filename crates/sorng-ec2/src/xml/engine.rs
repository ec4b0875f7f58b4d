use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::str;

use super::{Attribute, Decoder, PathContext};
use crate::error::{Ec2Error, Ec2Result};

/// Drive `decoder` over `bytes` and return its result.
///
/// The document must hold exactly one root element; only whitespace,
/// comments and processing instructions may surround it.
///
/// The text buffer is cleared when an element opens and again after it
/// closes, so a close event only ever carries the element's own character
/// data that followed its last child.
pub fn decode<D: Decoder>(bytes: &[u8], mut decoder: D) -> Ec2Result<D::Output> {
    let mut reader = Reader::from_reader(bytes);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = false;
        config.check_end_names = true;
    }

    let mut path = PathContext::new();
    let mut text = String::new();
    let mut root = RootState::Pending;

    decoder.reset();

    loop {
        let event = reader.read_event().map_err(|e| {
            Ec2Error::malformed(format!(
                "XML error at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) => {
                let name = local_name(e.name())?;
                if path.is_empty() {
                    root = root.open(name)?;
                }
                let attributes = collect_attributes(e)?;
                text.clear();
                path.push(name);
                decoder.on_open(&path, name, &attributes)?;
            }
            Event::Empty(ref e) => {
                let name = local_name(e.name())?;
                if path.is_empty() {
                    root = root.open(name)?;
                }
                let attributes = collect_attributes(e)?;
                text.clear();
                path.push(name);
                decoder.on_open(&path, name, &attributes)?;
                decoder.on_close(&path, name, "")?;
                path.pop();
                if path.is_empty() {
                    root = RootState::Closed;
                }
            }
            Event::End(ref e) => {
                let name = local_name(e.name())?;
                if path.current() != Some(name) {
                    return Err(Ec2Error::malformed(format!(
                        "closing tag </{}> does not match open path '{}'",
                        name, path
                    )));
                }
                decoder.on_close(&path, name, &text)?;
                path.pop();
                text.clear();
                if path.is_empty() {
                    root = RootState::Closed;
                }
            }
            Event::Text(ref e) => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| Ec2Error::malformed(format!("bad character data: {}", err)))?;
                if path.is_empty() {
                    if !unescaped.trim().is_empty() {
                        return Err(Ec2Error::malformed(format!(
                            "character data outside the root element: '{}'",
                            unescaped.trim()
                        )));
                    }
                    continue;
                }
                text.push_str(&unescaped);
            }
            Event::CData(e) => {
                if path.is_empty() {
                    return Err(Ec2Error::malformed("CDATA section outside the root element"));
                }
                let raw = e.into_inner();
                let chunk = str::from_utf8(&raw)
                    .map_err(|_| Ec2Error::malformed("invalid UTF-8 in CDATA section"))?;
                text.push_str(chunk);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(Ec2Error::malformed(format!(
            "unexpected end of input inside '{}'",
            path
        )));
    }
    if root == RootState::Pending {
        return Err(Ec2Error::malformed("document has no root element"));
    }

    decoder.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    Pending,
    Open,
    Closed,
}

impl RootState {
    /// A top-level element is opening.
    fn open(self, name: &str) -> Ec2Result<Self> {
        match self {
            Self::Closed => Err(Ec2Error::malformed(format!(
                "second root element <{}>",
                name
            ))),
            _ => Ok(Self::Open),
        }
    }
}

fn local_name(name: QName<'_>) -> Ec2Result<&str> {
    str::from_utf8(name.local_name().into_inner())
        .map_err(|_| Ec2Error::malformed("invalid UTF-8 in tag name"))
}

fn collect_attributes(start: &BytesStart<'_>) -> Ec2Result<Vec<Attribute>> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let name = local_name(attr.key)?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push(Attribute { name, value });
    }
    Ok(attributes)
}
