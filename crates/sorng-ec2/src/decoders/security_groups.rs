use super::parse_port;
use crate::error::{Ec2Error, Ec2Result};
use crate::types::{merge_permissions, IpPermission, SecurityGroup, UserIdGroupPair};
use crate::xml::{Attribute, Decoder, PathContext};

const GROUP: &[&str] = &["securityGroupInfo", "item"];
const PERMISSION: &[&str] = &["securityGroupInfo", "item", "ipPermissions", "item"];
const GROUP_REF: &[&str] = &[
    "securityGroupInfo",
    "item",
    "ipPermissions",
    "item",
    "groups",
    "item",
];

/// Which slots are open. Each variant implies all the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Idle,
    Group,
    Permission,
    GroupRef,
}

/// DescribeSecurityGroups.
///
/// ```text
/// securityGroupInfo/item                      group
///   ipPermissions/item                        permission
///     ipRanges/item/cidrIp                    CIDR string
///     groups/item                             group reference
/// ```
///
/// When a group closes its permissions are merged into
/// [`SecurityGroup::permissions`] with duplicates removed.
#[derive(Debug)]
pub struct SecurityGroupsDecoder {
    scope: Scope,
    result: Vec<SecurityGroup>,
    group: Option<SecurityGroup>,
    permission: Option<IpPermission>,
    group_ref: Option<UserIdGroupPair>,
}

impl Default for SecurityGroupsDecoder {
    fn default() -> Self {
        Self {
            scope: Scope::Idle,
            result: Vec::new(),
            group: None,
            permission: None,
            group_ref: None,
        }
    }
}

impl SecurityGroupsDecoder {
    fn expect_scope(&self, expected: Scope, event: &str, path: &PathContext) -> Ec2Result<()> {
        if self.scope == expected {
            Ok(())
        } else {
            Err(Ec2Error::malformed(format!(
                "{} at '{}' while in {:?} scope (expected {:?})",
                event, path, self.scope, expected
            )))
        }
    }

    fn open_item(&mut self, path: &PathContext) -> Ec2Result<()> {
        if path.ends_with(GROUP) {
            self.expect_scope(Scope::Idle, "group open", path)?;
            self.group = Some(SecurityGroup::default());
            self.scope = Scope::Group;
        } else if path.ends_with(PERMISSION) {
            self.expect_scope(Scope::Group, "permission open", path)?;
            self.permission = Some(IpPermission::default());
            self.scope = Scope::Permission;
        } else if path.ends_with(GROUP_REF) {
            self.expect_scope(Scope::Permission, "group reference open", path)?;
            self.group_ref = Some(UserIdGroupPair::default());
            self.scope = Scope::GroupRef;
        }
        Ok(())
    }

    fn close_item(&mut self, path: &PathContext) -> Ec2Result<()> {
        if path.ends_with(GROUP_REF) {
            self.expect_scope(Scope::GroupRef, "group reference close", path)?;
            if let (Some(pair), Some(permission)) = (self.group_ref.take(), self.permission.as_mut())
            {
                permission.groups.push(pair);
            }
            self.scope = Scope::Permission;
        } else if path.ends_with(PERMISSION) {
            self.expect_scope(Scope::Permission, "permission close", path)?;
            if let (Some(permission), Some(group)) = (self.permission.take(), self.group.as_mut()) {
                group.ip_permissions.push(permission);
            }
            self.scope = Scope::Group;
        } else if path.ends_with(GROUP) {
            self.expect_scope(Scope::Group, "group close", path)?;
            if let Some(mut group) = self.group.take() {
                group.permissions = merge_permissions(&group.ip_permissions);
                self.result.push(group);
            }
            self.scope = Scope::Idle;
        }
        Ok(())
    }
}

impl Decoder for SecurityGroupsDecoder {
    type Output = Vec<SecurityGroup>;

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn on_open(&mut self, path: &PathContext, name: &str, _attrs: &[Attribute]) -> Ec2Result<()> {
        if name == "item" {
            self.open_item(path)?;
        }
        Ok(())
    }

    fn on_close(&mut self, path: &PathContext, name: &str, text: &str) -> Ec2Result<()> {
        if name == "item" {
            return self.close_item(path);
        }

        match self.scope {
            Scope::Idle => {}
            Scope::Group => {
                if !path.ends_with(&["securityGroupInfo", "item", name]) {
                    return Ok(());
                }
                if let Some(group) = self.group.as_mut() {
                    match name {
                        "ownerId" => group.owner_id = text.to_string(),
                        "groupName" => group.group_name = text.to_string(),
                        "groupDescription" => group.group_description = text.to_string(),
                        _ => {}
                    }
                }
            }
            Scope::Permission => {
                let Some(permission) = self.permission.as_mut() else {
                    return Ok(());
                };
                if name == "cidrIp" && path.ends_with(&["ipPermissions", "item", "ipRanges", "item", "cidrIp"]) {
                    permission.cidr_ips.push(text.to_string());
                    return Ok(());
                }
                if !path.ends_with(&["ipPermissions", "item", name]) {
                    return Ok(());
                }
                match name {
                    "ipProtocol" => permission.ip_protocol = text.to_string(),
                    "fromPort" => permission.from_port = parse_port(name, text)?,
                    "toPort" => permission.to_port = parse_port(name, text)?,
                    _ => {}
                }
            }
            Scope::GroupRef => {
                if !path.ends_with(&["groups", "item", name]) {
                    return Ok(());
                }
                if let Some(pair) = self.group_ref.as_mut() {
                    match name {
                        "userId" => pair.user_id = text.to_string(),
                        "groupName" => pair.group_name = text.to_string(),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Ec2Result<Vec<SecurityGroup>> {
        if self.scope != Scope::Idle {
            return Err(Ec2Error::malformed(format!(
                "security group response ended in {:?} scope",
                self.scope
            )));
        }
        Ok(self.result)
    }
}
