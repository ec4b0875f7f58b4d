//! EC2 client: one method per Query API action.
//!
//! Each method builds the action's parameters, fetches the raw body through
//! the [`Transport`], and decodes it with the matching decoder. Describe
//! calls without narrowing arguments go through the handle's
//! [`ResponseCache`] keyed by action name.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{CacheStats, ResponseCache};
use crate::client::{self, HttpTransport, Transport};
use crate::config::Ec2Config;
use crate::decoders::{
    AckDecoder, AddressesDecoder, AllocateAddressDecoder, KeyPairsDecoder, NewKeyPairDecoder,
    RegionsDecoder, SecurityGroupsDecoder, ZonesDecoder,
};
use crate::error::Ec2Result;
use crate::types::{Address, AvailabilityZone, KeyPair, NewKeyPair, Permission, SecurityGroup};
use crate::xml::{self, Decoder};

/// EC2 client handle. Cheap to share behind an `Arc`; the cache is per
/// handle.
#[derive(Debug)]
pub struct Ec2Client<T: Transport = HttpTransport> {
    transport: T,
    cache: ResponseCache,
}

impl Ec2Client<HttpTransport> {
    pub fn from_config(config: &Ec2Config) -> Ec2Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Client for the endpoint named by `EC2_URL` / `EC2_REGION`.
    pub fn from_environment() -> Ec2Result<Self> {
        Self::from_config(&Ec2Config::from_environment())
    }
}

impl<T: Transport> Ec2Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ── Key pairs ───────────────────────────────────────────────────────

    /// DescribeKeyPairs. Cached when `key_names` is empty.
    pub async fn describe_key_pairs(&self, key_names: &[String]) -> Ec2Result<Arc<Vec<KeyPair>>> {
        let mut params = BTreeMap::new();
        client::add_indexed_params(&mut params, "KeyName", key_names);
        self.describe("DescribeKeyPairs", params, key_names.is_empty(), KeyPairsDecoder::default)
            .await
    }

    /// CreateKeyPair. The returned record is the only place the private key
    /// material is ever available.
    pub async fn create_key_pair(&self, key_name: &str) -> Ec2Result<NewKeyPair> {
        let mut params = BTreeMap::new();
        params.insert("KeyName".to_string(), key_name.to_string());
        self.invoke("CreateKeyPair", params, NewKeyPairDecoder::default())
            .await
    }

    pub async fn delete_key_pair(&self, key_name: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("KeyName".to_string(), key_name.to_string());
        self.invoke("DeleteKeyPair", params, AckDecoder::new()).await
    }

    // ── Security groups ─────────────────────────────────────────────────

    /// DescribeSecurityGroups. Cached when `group_names` is empty.
    pub async fn describe_security_groups(
        &self,
        group_names: &[String],
    ) -> Ec2Result<Arc<Vec<SecurityGroup>>> {
        let mut params = BTreeMap::new();
        client::add_indexed_params(&mut params, "GroupName", group_names);
        self.describe(
            "DescribeSecurityGroups",
            params,
            group_names.is_empty(),
            SecurityGroupsDecoder::default,
        )
        .await
    }

    pub async fn create_security_group(&self, group_name: &str, description: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("GroupName".to_string(), group_name.to_string());
        params.insert("GroupDescription".to_string(), description.to_string());
        self.invoke("CreateSecurityGroup", params, AckDecoder::new())
            .await
    }

    pub async fn delete_security_group(&self, group_name: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("GroupName".to_string(), group_name.to_string());
        self.invoke("DeleteSecurityGroup", params, AckDecoder::new())
            .await
    }

    /// Grant `permission` on `group_name`.
    pub async fn authorize_security_group_ingress(
        &self,
        group_name: &str,
        permission: &Permission,
    ) -> Ec2Result<bool> {
        let params = ingress_params(group_name, permission);
        self.invoke("AuthorizeSecurityGroupIngress", params, AckDecoder::new())
            .await
    }

    /// Remove a grant previously made with
    /// [`authorize_security_group_ingress`](Self::authorize_security_group_ingress).
    pub async fn revoke_security_group_ingress(
        &self,
        group_name: &str,
        permission: &Permission,
    ) -> Ec2Result<bool> {
        let params = ingress_params(group_name, permission);
        self.invoke("RevokeSecurityGroupIngress", params, AckDecoder::new())
            .await
    }

    // ── Elastic IPs ─────────────────────────────────────────────────────

    /// DescribeAddresses. Cached when `public_ips` is empty.
    pub async fn describe_addresses(&self, public_ips: &[String]) -> Ec2Result<Arc<Vec<Address>>> {
        let mut params = BTreeMap::new();
        client::add_indexed_params(&mut params, "PublicIp", public_ips);
        self.describe("DescribeAddresses", params, public_ips.is_empty(), AddressesDecoder::default)
            .await
    }

    /// AllocateAddress; returns the new public IP.
    pub async fn allocate_address(&self) -> Ec2Result<String> {
        self.invoke("AllocateAddress", BTreeMap::new(), AllocateAddressDecoder::default())
            .await
    }

    pub async fn release_address(&self, public_ip: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("PublicIp".to_string(), public_ip.to_string());
        self.invoke("ReleaseAddress", params, AckDecoder::new()).await
    }

    pub async fn associate_address(&self, instance_id: &str, public_ip: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("InstanceId".to_string(), instance_id.to_string());
        params.insert("PublicIp".to_string(), public_ip.to_string());
        self.invoke("AssociateAddress", params, AckDecoder::new())
            .await
    }

    pub async fn disassociate_address(&self, public_ip: &str) -> Ec2Result<bool> {
        let mut params = BTreeMap::new();
        params.insert("PublicIp".to_string(), public_ip.to_string());
        self.invoke("DisassociateAddress", params, AckDecoder::new())
            .await
    }

    // ── Zones & regions ─────────────────────────────────────────────────

    /// DescribeAvailabilityZones. Cached when `zone_names` is empty.
    pub async fn describe_availability_zones(
        &self,
        zone_names: &[String],
    ) -> Ec2Result<Arc<Vec<AvailabilityZone>>> {
        let mut params = BTreeMap::new();
        client::add_indexed_params(&mut params, "ZoneName", zone_names);
        self.describe(
            "DescribeAvailabilityZones",
            params,
            zone_names.is_empty(),
            ZonesDecoder::default,
        )
        .await
    }

    /// DescribeRegions. Cached when `region_names` is empty.
    pub async fn describe_regions(&self, region_names: &[String]) -> Ec2Result<Arc<Vec<String>>> {
        let mut params = BTreeMap::new();
        client::add_indexed_params(&mut params, "RegionName", region_names);
        self.describe("DescribeRegions", params, region_names.is_empty(), RegionsDecoder::default)
            .await
    }

    // ── Plumbing ────────────────────────────────────────────────────────

    async fn fetch_raw(&self, action: &str, params: &BTreeMap<String, String>) -> Ec2Result<Bytes> {
        self.transport.call(action, params).await
    }

    async fn describe<D, F>(
        &self,
        action: &str,
        params: BTreeMap<String, String>,
        cacheable: bool,
        make_decoder: F,
    ) -> Ec2Result<Arc<D::Output>>
    where
        D: Decoder,
        D::Output: Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        let raw = self.fetch_raw(action, &params).await?;
        self.cache.fetch(action, cacheable, &raw, make_decoder)
    }

    async fn invoke<D: Decoder>(
        &self,
        action: &str,
        params: BTreeMap<String, String>,
        decoder: D,
    ) -> Ec2Result<D::Output> {
        let raw = self.fetch_raw(action, &params).await?;
        let value = xml::decode(&raw, decoder)?;
        log::debug!("EC2 {} decoded {} bytes", action, raw.len());
        Ok(value)
    }
}

fn ingress_params(group_name: &str, permission: &Permission) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("GroupName".to_string(), group_name.to_string());
    match permission {
        Permission::Group { owner, group } => {
            params.insert("SourceSecurityGroupName".to_string(), group.clone());
            params.insert("SourceSecurityGroupOwnerId".to_string(), owner.clone());
        }
        Permission::Cidr {
            protocol,
            from_port,
            to_port,
            cidr_ip,
        } => {
            params.insert("IpProtocol".to_string(), protocol.clone());
            if let Some(port) = from_port {
                params.insert("FromPort".to_string(), port.to_string());
            }
            if let Some(port) = to_port {
                params.insert("ToPort".to_string(), port.to_string());
            }
            params.insert("CidrIp".to_string(), cidr_ip.clone());
        }
    }
    params
}
