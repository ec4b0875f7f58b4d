use crate::error::Ec2Result;
use crate::xml::{Decoder, PathContext};

/// DescribeRegions: every `regionInfo/item/regionName`, in order.
#[derive(Debug, Default)]
pub struct RegionsDecoder {
    result: Vec<String>,
}

impl Decoder for RegionsDecoder {
    type Output = Vec<String>;

    fn reset(&mut self) {
        self.result.clear();
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == "regionName" && path.ends_with(&["regionInfo", "item", "regionName"]) {
            self.result.push(text.to_string());
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<Vec<String>> {
        Ok(self.result)
    }
}
