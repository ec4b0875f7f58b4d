use crate::error::Ec2Result;
use crate::types::AvailabilityZone;
use crate::xml::{Attribute, Decoder, PathContext};

const ZONE: &[&str] = &["availabilityZoneInfo", "item"];
const MESSAGE: &[&str] = &["availabilityZoneInfo", "item", "messageSet", "item", "message"];

/// DescribeAvailabilityZones: `availabilityZoneInfo/item` → [`AvailabilityZone`].
///
/// Zone items may contain a `messageSet` with its own `item` elements; those
/// are collected into `messages` and never close the zone.
#[derive(Debug, Default)]
pub struct ZonesDecoder {
    result: Vec<AvailabilityZone>,
    current: Option<AvailabilityZone>,
}

impl Decoder for ZonesDecoder {
    type Output = Vec<AvailabilityZone>;

    fn reset(&mut self) {
        self.result.clear();
        self.current = None;
    }

    fn on_open(&mut self, path: &PathContext, name: &str, _attrs: &[Attribute]) -> Ec2Result<()> {
        if name == "item" && path.ends_with(ZONE) {
            self.current = Some(AvailabilityZone::default());
        }
        Ok(())
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == "item" && path.ends_with(ZONE) {
            if let Some(zone) = self.current.take() {
                self.result.push(zone);
            }
            return Ok(());
        }
        let Some(zone) = self.current.as_mut() else {
            return Ok(());
        };
        if name == "message" && path.ends_with(MESSAGE) {
            zone.messages.push(text.to_string());
            return Ok(());
        }
        if !path.ends_with(&["availabilityZoneInfo", "item", name]) {
            return Ok(());
        }
        match name {
            "zoneName" => zone.zone_name = text.to_string(),
            "zoneState" => zone.zone_state = text.to_string(),
            "regionName" => zone.region_name = text.to_string(),
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<Vec<AvailabilityZone>> {
        Ok(self.result)
    }
}
