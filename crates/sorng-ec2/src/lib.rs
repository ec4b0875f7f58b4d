//! # sorng-ec2 – EC2 provisioning client
//!
//! Query API client for key pairs, security groups, elastic IPs,
//! availability zones and regions. Responses are decoded by a streaming,
//! path-aware XML engine and, for unfiltered describe calls, cached per
//! operation until the provider's body changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  Ec2Client  (ec2.rs)                             │
//! │  └── one method per action, params → decoder     │
//! ├──────────────────────────────────────────────────┤
//! │  ResponseCache  (cache.rs)                       │
//! │  └── per-key (raw body, decoded value)           │
//! ├──────────────────────────────────────────────────┤
//! │  Decoders  (decoders/)                           │
//! │  ├── key pairs · addresses · zones · regions     │
//! │  ├── security groups (nested permissions)        │
//! │  └── boolean acknowledgement                     │
//! ├──────────────────────────────────────────────────┤
//! │  XML engine  (xml/)                              │
//! │  └── quick-xml events → PathContext → Decoder    │
//! ├──────────────────────────────────────────────────┤
//! │  Transport  (client.rs)                          │
//! │  └── form POST, retry with backoff               │
//! └──────────────────────────────────────────────────┘
//! ```

// ── Sub-modules ─────────────────────────────────────────────────────────

pub mod error;
pub mod config;
pub mod types;
pub mod xml;
pub mod decoders;
pub mod cache;
pub mod client;
pub mod ec2;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use cache::{CacheStats, ResponseCache};
pub use client::{HttpTransport, Transport};
pub use config::{Ec2Config, Ec2Region, RetryConfig, RetryMode};
pub use ec2::Ec2Client;
pub use error::{Ec2Error, Ec2Result, ServiceError};
pub use types::{
    merge_permissions, Address, AvailabilityZone, Field, IpPermission, KeyPair, NewKeyPair,
    Permission, SecurityGroup, UserIdGroupPair,
};
