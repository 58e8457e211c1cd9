//! Provider compute model and capability trait
//!
//! The data model mirrors what the provider's REST API returns: elastic IPs
//! with their current attachment, instances with a lifecycle status, and
//! network interfaces with their subnet and any elastic IP they hold.
//!
//! The [`ComputeApi`] trait is the narrow surface the selection and
//! transition logic is written against, so the whole decision path can be
//! exercised with an in-memory fake instead of a live account. The HTTP
//! implementation lives in [`crate::client`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::error::Result;

/// Provider status identifier for a running instance
pub const INSTANCE_STATUS_RUNNING: u64 = 1;

/// An elastic IP as listed by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ElasticIp {
    /// Provider identifier
    pub id: u64,

    /// Public address
    pub public_ip: IpAddr,

    /// Private address of the interface currently holding the IP.
    /// `None` while unattached.
    #[serde(default)]
    pub private_ip: Option<IpAddr>,

    /// Current attachment. `None` while unattached.
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

impl ElasticIp {
    /// Whether the IP currently sits on an instance
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }
}

/// The instance an elastic IP is currently attached to
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Instance identifier
    pub id: u64,

    /// Instance display name
    pub name: String,
}

/// A compute instance
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    /// Instance identifier
    pub id: u64,

    /// Instance display name
    pub name: String,

    /// Lifecycle status
    pub status: InstanceStatus,
}

impl Instance {
    /// Only running instances are eligible failover targets
    pub fn is_running(&self) -> bool {
        self.status.id == INSTANCE_STATUS_RUNNING
    }
}

/// Provider-enumerated instance lifecycle status
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceStatus {
    /// Status identifier
    pub id: u64,

    /// Human-readable status name
    pub name: String,
}

/// A network interface of an instance
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInterface {
    /// Interface identifier
    pub id: u64,

    /// Private address of the interface
    pub private_ip: IpAddr,

    /// The network this interface belongs to
    pub network: NetworkRef,

    /// Elastic IP currently held by this interface, if any. An interface
    /// holds at most one elastic IP.
    #[serde(default)]
    pub attached_elastic_ip: Option<AttachedIp>,
}

/// The network an interface belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkRef {
    /// Network identifier
    pub id: u64,

    /// Subnet in CIDR notation, e.g. `10.0.0.0/24`
    pub cidr: String,
}

/// Minimal view of an elastic IP occupying an interface
#[derive(Debug, Clone, Deserialize)]
pub struct AttachedIp {
    /// Provider identifier of the occupying elastic IP
    pub id: u64,

    /// Public address of the occupying elastic IP
    pub public_ip: IpAddr,
}

/// Request body for attaching an elastic IP to a network interface
#[derive(Debug, Clone, Serialize)]
pub struct ElasticIpAttach {
    /// The elastic IP to attach
    pub elastic_ip_id: u64,

    /// The interface to attach it to
    pub network_interface_id: u64,
}

/// The provider surface consumed by the failover logic
///
/// Listing calls return the full unfiltered collection. Nothing here is
/// retried; transport policy belongs to the HTTP layer.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// List every elastic IP managed under the account
    async fn list_elastic_ips(&self) -> Result<Vec<ElasticIp>>;

    /// List every instance under the account
    async fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Fetch a single instance by identifier
    async fn get_instance(&self, id: u64) -> Result<Instance>;

    /// List the network interfaces of an instance
    async fn list_network_interfaces(&self, instance_id: u64) -> Result<Vec<NetworkInterface>>;

    /// Detach an elastic IP from an instance
    async fn detach_elastic_ip(&self, instance_id: u64, elastic_ip_id: u64) -> Result<()>;

    /// Attach an elastic IP to one of an instance's network interfaces
    async fn attach_elastic_ip(
        &self,
        instance_id: u64,
        attach: ElasticIpAttach,
    ) -> Result<ElasticIp>;
}
