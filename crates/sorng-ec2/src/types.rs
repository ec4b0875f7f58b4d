//! Records produced by the response decoders.
//!
//! Field names follow the provider's element names in `snake_case`.

use serde::{Deserialize, Serialize};

/// An optional response field.
///
/// Keeps apart an element the provider did not send (`Omitted`) and one it
/// sent with no content (`Empty`), e.g. the `instanceId` of an unattached
/// elastic IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field<T> {
    #[default]
    Omitted,
    Empty,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Omitted | Field::Empty => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Omitted | Field::Empty => None,
        }
    }

    pub fn is_omitted(&self) -> bool {
        matches!(self, Field::Omitted)
    }

    pub fn is_absent(&self) -> bool {
        !matches!(self, Field::Value(_))
    }
}

impl Field<String> {
    /// Empty text becomes [`Field::Empty`], never an empty string.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Field::Empty
        } else {
            Field::Value(text.to_string())
        }
    }
}

/// Key pair as returned by DescribeKeyPairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub key_name: String,
    pub key_fingerprint: String,
}

/// Key pair as returned by CreateKeyPair; the private key is only ever
/// returned here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKeyPair {
    pub key_name: String,
    pub key_fingerprint: String,
    pub key_material: String,
}

/// Elastic IP address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub public_ip: String,
    pub instance_id: Field<String>,
    pub allocation_id: Field<String>,
    pub association_id: Field<String>,
    pub domain: Field<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub zone_name: String,
    pub zone_state: String,
    pub region_name: String,
    /// Status messages attached to the zone, in document order.
    pub messages: Vec<String>,
}

/// Security group with both the rule structure as sent and the merged,
/// de-duplicated view of what it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub owner_id: String,
    pub group_name: String,
    pub group_description: String,
    pub ip_permissions: Vec<IpPermission>,
    pub permissions: Vec<Permission>,
}

/// One `ipPermissions` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPermission {
    pub ip_protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub cidr_ips: Vec<String>,
    pub groups: Vec<UserIdGroupPair>,
}

/// Reference to another (possibly cross-account) security group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdGroupPair {
    pub user_id: String,
    pub group_name: String,
}

/// A single grant: either to another group or to a CIDR range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Group {
        owner: String,
        group: String,
    },
    Cidr {
        protocol: String,
        from_port: Option<i32>,
        to_port: Option<i32>,
        cidr_ip: String,
    },
}

impl IpPermission {
    /// Grants in this entry: group references first, then CIDR ranges.
    pub fn grants(&self) -> impl Iterator<Item = Permission> + '_ {
        let groups = self.groups.iter().map(|pair| Permission::Group {
            owner: pair.user_id.clone(),
            group: pair.group_name.clone(),
        });
        let cidrs = self.cidr_ips.iter().map(move |cidr| Permission::Cidr {
            protocol: self.ip_protocol.clone(),
            from_port: self.from_port,
            to_port: self.to_port,
            cidr_ip: cidr.clone(),
        });
        groups.chain(cidrs)
    }
}

/// Flatten `ip_permissions` into one list, keeping the first copy of each
/// structurally equal grant.
pub fn merge_permissions(ip_permissions: &[IpPermission]) -> Vec<Permission> {
    let mut merged: Vec<Permission> = Vec::new();
    for grant in ip_permissions.iter().flat_map(IpPermission::grants) {
        if !merged.contains(&grant) {
            merged.push(grant);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_from_text() {
        assert_eq!(Field::from_text(""), Field::Empty);
        assert_eq!(Field::from_text("i-1"), Field::Value("i-1".to_string()));
        assert!(Field::<String>::Omitted.is_absent());
        assert!(Field::<String>::Empty.is_absent());
        assert_ne!(Field::<String>::Omitted, Field::Empty);
        assert_eq!(Field::from_text("i-1").into_option().as_deref(), Some("i-1"));
    }

    #[test]
    fn merge_keeps_first_of_duplicates() {
        let web = IpPermission {
            ip_protocol: "tcp".into(),
            from_port: Some(80),
            to_port: Some(80),
            cidr_ips: vec!["0.0.0.0/0".into(), "10.0.0.0/8".into(), "0.0.0.0/0".into()],
            groups: vec![
                UserIdGroupPair { user_id: "111".into(), group_name: "lb".into() },
                UserIdGroupPair { user_id: "111".into(), group_name: "lb".into() },
            ],
        };
        let merged = merge_permissions(&[web.clone(), web]);
        assert_eq!(
            merged,
            vec![
                Permission::Group { owner: "111".into(), group: "lb".into() },
                Permission::Cidr {
                    protocol: "tcp".into(),
                    from_port: Some(80),
                    to_port: Some(80),
                    cidr_ip: "0.0.0.0/0".into(),
                },
                Permission::Cidr {
                    protocol: "tcp".into(),
                    from_port: Some(80),
                    to_port: Some(80),
                    cidr_ip: "10.0.0.0/8".into(),
                },
            ]
        );
    }

    #[test]
    fn same_cidr_on_other_ports_is_kept() {
        let perms = vec![
            IpPermission {
                ip_protocol: "tcp".into(),
                from_port: Some(22),
                to_port: Some(22),
                cidr_ips: vec!["0.0.0.0/0".into()],
                groups: vec![],
            },
            IpPermission {
                ip_protocol: "tcp".into(),
                from_port: Some(443),
                to_port: Some(443),
                cidr_ips: vec!["0.0.0.0/0".into()],
                groups: vec![],
            },
        ];
        assert_eq!(merge_permissions(&perms).len(), 2);
    }

    #[test]
    fn address_serde() {
        let addr = Address {
            public_ip: "203.0.113.7".into(),
            instance_id: Field::Empty,
            ..Default::default()
        };
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(back.domain.is_omitted());
    }
}
