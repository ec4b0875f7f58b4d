use crate::error::{Ec2Error, Ec2Result};
use crate::types::{Address, Field};
use crate::xml::{Attribute, Decoder, PathContext};

const ITEM: &[&str] = &["addressesSet", "item"];

/// DescribeAddresses: `addressesSet/item` → [`Address`].
#[derive(Debug, Default)]
pub struct AddressesDecoder {
    result: Vec<Address>,
    current: Option<Address>,
}

impl Decoder for AddressesDecoder {
    type Output = Vec<Address>;

    fn reset(&mut self) {
        self.result.clear();
        self.current = None;
    }

    fn on_open(&mut self, path: &PathContext, name: &str, _attrs: &[Attribute]) -> Ec2Result<()> {
        if name == "item" && path.ends_with(ITEM) {
            self.current = Some(Address::default());
        }
        Ok(())
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == "item" && path.ends_with(ITEM) {
            if let Some(address) = self.current.take() {
                self.result.push(address);
            }
            return Ok(());
        }
        // Only direct children of the item carry address fields.
        if !path.ends_with(&["addressesSet", "item", name]) {
            return Ok(());
        }
        let Some(address) = self.current.as_mut() else {
            return Ok(());
        };
        match name {
            "publicIp" => address.public_ip = text.to_string(),
            "instanceId" => address.instance_id = Field::from_text(text),
            "allocationId" => address.allocation_id = Field::from_text(text),
            "associationId" => address.association_id = Field::from_text(text),
            "domain" => address.domain = Field::from_text(text),
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<Vec<Address>> {
        Ok(self.result)
    }
}

/// AllocateAddress: the text of `publicIp`.
#[derive(Debug, Default)]
pub struct AllocateAddressDecoder {
    public_ip: Option<String>,
}

impl Decoder for AllocateAddressDecoder {
    type Output = String;

    fn reset(&mut self) {
        self.public_ip = None;
    }

    fn on_close(&mut self, _path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == "publicIp" {
            self.public_ip = Some(text.to_string());
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<String> {
        self.public_ip
            .ok_or_else(|| Ec2Error::malformed("AllocateAddress response has no <publicIp>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::decode;

    const ADDRESSES: &str = r#"<DescribeAddressesResponse xmlns="http://ec2.amazonaws.com/doc/2008-12-01/">
        <requestId>r-1</requestId>
        <addressesSet>
          <item><publicIp>67.202.55.255</publicIp><instanceId>i-f15ebb98</instanceId></item>
          <item><publicIp>67.202.55.233</publicIp><instanceId/></item>
          <item><publicIp>67.202.55.200</publicIp></item>
          <item><publicIp>67.202.55.201</publicIp><instanceId></instanceId><domain>standard</domain></item>
        </addressesSet>
      </DescribeAddressesResponse>"#;

    #[test]
    fn absent_instance_is_not_empty_string() {
        let addrs = decode(ADDRESSES.as_bytes(), AddressesDecoder::default()).unwrap();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs[0].instance_id, Field::Value("i-f15ebb98".to_string()));
        assert_eq!(addrs[1].instance_id, Field::Empty);
        assert_eq!(addrs[2].instance_id, Field::Omitted);
        assert_eq!(addrs[3].instance_id, Field::Empty);
        assert_ne!(addrs[1].instance_id, addrs[2].instance_id);
        assert!(addrs[1].instance_id.value().is_none());
        assert_eq!(addrs[3].domain.value().map(String::as_str), Some("standard"));
    }

    #[test]
    fn public_ips_in_order() {
        let addrs = decode(ADDRESSES.as_bytes(), AddressesDecoder::default()).unwrap();
        let ips: Vec<&str> = addrs.iter().map(|a| a.public_ip.as_str()).collect();
        assert_eq!(ips, ["67.202.55.255", "67.202.55.233", "67.202.55.200", "67.202.55.201"]);
    }

    #[test]
    fn nested_instance_id_does_not_leak() {
        let xml = "<R><addressesSet><item><publicIp>1.2.3.4</publicIp>\
                   <association><instanceId>i-nested</instanceId></association>\
                   </item></addressesSet></R>";
        let addrs = decode(xml.as_bytes(), AddressesDecoder::default()).unwrap();
        assert!(addrs[0].instance_id.is_omitted());
    }

    #[test]
    fn allocate_address_scalar() {
        let xml = "<AllocateAddressResponse><requestId>r</requestId>\
                   <publicIp>67.202.55.255</publicIp></AllocateAddressResponse>";
        let ip = decode(xml.as_bytes(), AllocateAddressDecoder::default()).unwrap();
        assert_eq!(ip, "67.202.55.255");
    }

    #[test]
    fn allocate_address_last_write_wins() {
        let xml = "<R><publicIp>1.1.1.1</publicIp><publicIp>2.2.2.2</publicIp></R>";
        let ip = decode(xml.as_bytes(), AllocateAddressDecoder::default()).unwrap();
        assert_eq!(ip, "2.2.2.2");
    }

    #[test]
    fn allocate_address_missing_ip() {
        let err = decode(b"<R><return>true</return></R>".as_slice(), AllocateAddressDecoder::default())
            .unwrap_err();
        assert!(err.is_malformed());
    }
}
