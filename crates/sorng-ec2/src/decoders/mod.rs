//! One [`Decoder`](crate::xml::Decoder) per response shape.
//!
//! Element names such as `item` and `groupName` occur at several depths with
//! unrelated meanings, so every rule is keyed on the tag name *and* the
//! innermost part of the path. Elements no rule mentions are ignored.

mod ack;
mod addresses;
mod errors;
mod key_pairs;
mod regions;
mod security_groups;
mod zones;

pub use ack::AckDecoder;
pub use addresses::{AddressesDecoder, AllocateAddressDecoder};
pub use errors::{ErrorBody, ErrorDecoder};
pub use key_pairs::{KeyPairsDecoder, NewKeyPairDecoder};
pub use regions::RegionsDecoder;
pub use security_groups::SecurityGroupsDecoder;
pub use zones::ZonesDecoder;

use crate::error::{Ec2Error, Ec2Result};

/// Parse an optional integer element; empty text means "not set".
pub(crate) fn parse_port(name: &str, text: &str) -> Ec2Result<Option<i32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| Ec2Error::malformed(format!("<{}> is not an integer: '{}'", name, text)))
}
