use crate::error::Ec2Result;
use crate::xml::{Decoder, PathContext};

/// `true` iff the `<return>` element reads exactly `true`.
///
/// Used by every action whose response is a bare acknowledgement
/// (DeleteKeyPair, ReleaseAddress, AuthorizeSecurityGroupIngress, …).
#[derive(Debug)]
pub struct AckDecoder {
    element: &'static str,
    result: bool,
}

impl AckDecoder {
    pub fn new() -> Self {
        Self::for_element("return")
    }

    pub fn for_element(element: &'static str) -> Self {
        Self {
            element,
            result: false,
        }
    }
}

impl Default for AckDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AckDecoder {
    type Output = bool;

    fn reset(&mut self) {
        self.result = false;
    }

    fn on_close(&mut self, _path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == self.element {
            self.result = text == "true";
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<bool> {
        Ok(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::decode;

    fn ack(xml: &str) -> bool {
        decode(xml.as_bytes(), AckDecoder::new()).unwrap()
    }

    #[test]
    fn exact_true_only() {
        assert!(ack("<Response><return>true</return></Response>"));
        assert!(!ack("<DeleteKeyPairResponse><return>false</return></DeleteKeyPairResponse>"));
        assert!(!ack("<Response><return>TRUE</return></Response>"));
        assert!(!ack("<Response><return> true</return></Response>"));
    }

    #[test]
    fn any_enclosing_tag() {
        assert!(ack("<return>true</return>"));
        assert!(ack(
            r#"<ReleaseAddressResponse xmlns="http://ec2.amazonaws.com/doc/2008-12-01/">
                 <requestId>r-1</requestId>
                 <return>true</return>
               </ReleaseAddressResponse>"#
        ));
    }

    #[test]
    fn missing_element_is_false() {
        assert!(!ack("<Response><requestId>r-1</requestId></Response>"));
        assert!(!ack("<Response><return/></Response>"));
    }

    #[test]
    fn custom_element() {
        let ok = decode(b"<R><ok>true</ok></R>".as_slice(), AckDecoder::for_element("ok")).unwrap();
        assert!(ok);
    }
}
