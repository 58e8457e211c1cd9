//! Failover target selection
//!
//! Given the elastic IP's previous attachment and a candidate pool, pick
//! exactly one healthy replacement. Three pool shapes are supported behind
//! one interface, so the orchestration never branches on the active policy:
//!
//! - **Instance list**: candidates are iterated in caller-supplied order;
//!   the first running instance wins outright, and among its interfaces the
//!   one whose subnet contains the previously attached private address is
//!   chosen.
//! - **Peer addresses**: the failed address is removed from the pool, then
//!   instances are iterated in provider listing order and the first
//!   interface whose private address exactly matches a remaining peer wins.
//! - **Subnet membership**: instances are iterated in provider listing
//!   order and the first interface whose subnet contains the anchor
//!   address wins.
//!
//! The instance-list policy honors caller order while the other two honor
//! provider listing order; callers that care about priority among peers
//! should use the instance-list form.

use ipnet::IpNet;
use std::net::IpAddr;
use tracing::debug;

use crate::compute::{AttachedIp, ComputeApi, ElasticIp, NetworkInterface};
use crate::error::{Error, Result};

/// The pool an elastic IP may fail over to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePolicy {
    /// Ordered explicit instance identifiers; list order is the tie-break
    Instances(Vec<u64>),

    /// Explicit peer private addresses, matched exactly against interface
    /// addresses in provider listing order
    Peers(Vec<IpAddr>),

    /// Every running instance with an interface in the same subnet as the
    /// anchor address
    Subnet {
        /// Private address whose subnet defines the pool
        anchor: IpAddr,
    },
}

impl CandidatePolicy {
    /// Build the policy from the mutually exclusive CLI inputs
    pub fn from_flags(
        instances: Vec<u64>,
        peers: Vec<IpAddr>,
        subnet_of: Option<IpAddr>,
    ) -> Result<Self> {
        match (instances.is_empty(), peers.is_empty(), subnet_of) {
            (false, true, None) => Ok(Self::Instances(instances)),
            (true, false, None) => Ok(Self::Peers(peers)),
            (true, true, Some(anchor)) => Ok(Self::Subnet { anchor }),
            (true, true, None) => Err(Error::config(
                "one of --instances, --peers or --subnet-of is required",
            )),
            _ => Err(Error::config(
                "--instances, --peers and --subnet-of are mutually exclusive",
            )),
        }
    }
}

/// Resolved output of selection: where the elastic IP goes next
#[derive(Debug, Clone)]
pub struct FailoverTarget {
    /// Target instance identifier
    pub instance_id: u64,

    /// Target instance display name
    pub instance_name: String,

    /// The interface the elastic IP will be attached to
    pub network_interface_id: u64,

    /// Private address of the target interface
    pub private_ip: IpAddr,

    /// Elastic IP presently occupying the target interface, if any
    pub attached_elastic_ip: Option<AttachedIp>,
}

impl FailoverTarget {
    fn from_interface(instance_id: u64, instance_name: &str, iface: &NetworkInterface) -> Self {
        Self {
            instance_id,
            instance_name: instance_name.to_string(),
            network_interface_id: iface.id,
            private_ip: iface.private_ip,
            attached_elastic_ip: iface.attached_elastic_ip.clone(),
        }
    }
}

/// Picks a single failover target according to the configured policy
pub struct TargetSelector<'a> {
    api: &'a dyn ComputeApi,
    policy: &'a CandidatePolicy,
}

impl<'a> TargetSelector<'a> {
    /// Create a selector over the given provider surface
    pub fn new(api: &'a dyn ComputeApi, policy: &'a CandidatePolicy) -> Self {
        Self { api, policy }
    }

    /// Resolve the current holder as a target if it already satisfies the
    /// policy: holder running, and a pool member under the active policy.
    ///
    /// This is the pre-mutation idempotency probe. `None` means a
    /// transition is required.
    pub async fn retained_target(&self, elastic_ip: &ElasticIp) -> Result<Option<FailoverTarget>> {
        let (Some(attachment), Some(private_ip)) = (&elastic_ip.attachment, elastic_ip.private_ip)
        else {
            return Ok(None);
        };

        let in_pool = match self.policy {
            CandidatePolicy::Instances(ids) => ids.contains(&attachment.id),
            CandidatePolicy::Peers(peers) => peers.contains(&private_ip),
            // The holder's own interface trivially shares its subnet.
            CandidatePolicy::Subnet { .. } => true,
        };
        if !in_pool {
            return Ok(None);
        }

        let holder = self.api.get_instance(attachment.id).await?;
        if !holder.is_running() {
            debug!(instance_id = holder.id, "current holder is not running");
            return Ok(None);
        }

        let interfaces = self.api.list_network_interfaces(holder.id).await?;
        Ok(interfaces
            .iter()
            .find(|iface| iface.private_ip == private_ip)
            .map(|iface| FailoverTarget::from_interface(holder.id, &holder.name, iface)))
    }

    /// Pick the replacement target, excluding the failed attachment
    pub async fn select(&self, elastic_ip: &ElasticIp) -> Result<FailoverTarget> {
        let failed_instance = elastic_ip.attachment.as_ref().map(|a| a.id);
        let previous_ip = elastic_ip.private_ip;

        match self.policy {
            CandidatePolicy::Instances(ids) => {
                self.select_from_instance_list(ids, failed_instance, previous_ip)
                    .await
            }
            CandidatePolicy::Peers(peers) => self.select_from_peers(peers, previous_ip).await,
            CandidatePolicy::Subnet { anchor } => {
                self.select_from_subnet(previous_ip.unwrap_or(*anchor)).await
            }
        }
    }

    /// Iterate the caller-supplied ID list in order. The first running
    /// candidate wins outright: if none of its interfaces sits in the
    /// subnet of the failed address, selection fails rather than falling
    /// through to later list entries.
    async fn select_from_instance_list(
        &self,
        ids: &[u64],
        failed_instance: Option<u64>,
        previous_ip: Option<IpAddr>,
    ) -> Result<FailoverTarget> {
        for &id in ids {
            if Some(id) == failed_instance {
                continue;
            }

            let instance = self.api.get_instance(id).await?;
            if !instance.is_running() {
                debug!(instance_id = id, status = %instance.status.name, "skipping candidate");
                continue;
            }

            let interfaces = self.api.list_network_interfaces(id).await?;
            let iface = match previous_ip {
                Some(addr) => first_in_subnet_of(&interfaces, addr)?,
                // Unattached recovery: no subnet to match against.
                None => interfaces.first(),
            };

            return match iface {
                Some(iface) => Ok(FailoverTarget::from_interface(
                    instance.id,
                    &instance.name,
                    iface,
                )),
                None => Err(Error::no_target(format!(
                    "instance '{}' has no interface in the subnet of the failed address",
                    instance.name
                ))),
            };
        }

        Err(Error::no_target("no running candidate instance"))
    }

    /// Remove the failed address from the peer pool, then scan instances in
    /// provider listing order for an exact private-address match.
    async fn select_from_peers(
        &self,
        peers: &[IpAddr],
        previous_ip: Option<IpAddr>,
    ) -> Result<FailoverTarget> {
        let candidates: Vec<IpAddr> = peers
            .iter()
            .copied()
            .filter(|ip| Some(*ip) != previous_ip)
            .collect();
        if candidates.is_empty() {
            return Err(Error::no_target(
                "peer list is empty after removing the failed address",
            ));
        }

        for instance in self.api.list_instances().await? {
            if !instance.is_running() {
                continue;
            }
            for iface in self.api.list_network_interfaces(instance.id).await? {
                if candidates.contains(&iface.private_ip) {
                    return Ok(FailoverTarget::from_interface(
                        instance.id,
                        &instance.name,
                        &iface,
                    ));
                }
            }
        }

        Err(Error::no_target("no running instance holds a peer address"))
    }

    /// Scan instances in provider listing order for an interface whose
    /// subnet contains the anchor address.
    async fn select_from_subnet(&self, anchor: IpAddr) -> Result<FailoverTarget> {
        for instance in self.api.list_instances().await? {
            if !instance.is_running() {
                continue;
            }
            for iface in self.api.list_network_interfaces(instance.id).await? {
                if subnet_of(&iface)?.contains(&anchor) {
                    return Ok(FailoverTarget::from_interface(
                        instance.id,
                        &instance.name,
                        &iface,
                    ));
                }
            }
        }

        Err(Error::no_target(format!(
            "no running instance with an interface in the subnet of {anchor}"
        )))
    }
}

fn first_in_subnet_of(
    interfaces: &[NetworkInterface],
    addr: IpAddr,
) -> Result<Option<&NetworkInterface>> {
    for iface in interfaces {
        if subnet_of(iface)?.contains(&addr) {
            return Ok(Some(iface));
        }
    }
    Ok(None)
}

/// Parse an interface's subnet. Malformed provider data is fatal.
fn subnet_of(iface: &NetworkInterface) -> Result<IpNet> {
    iface.network.cidr.parse().map_err(|_| {
        Error::provider(format!(
            "network interface {} has malformed subnet '{}'",
            iface.id, iface.network.cidr
        ))
    })
}
