//! Elastic IP attachment transitions
//!
//! The mutation steps of a failover run, kept separate so the orchestration
//! composes them explicitly and each is observable on its own:
//!
//! ```text
//! Attached(old) --detach--> Unattached --attach--> Attached(new)
//!       └────────── noop when already on the target ──────────┘
//! ```
//!
//! `prepare` clears a stale elastic IP from the target interface and must
//! run strictly between the main detach and the attach, because an
//! interface holds at most one elastic IP.

use std::net::IpAddr;
use tracing::info;

use crate::compute::{ComputeApi, ElasticIp, ElasticIpAttach};
use crate::error::{Error, Result};
use crate::select::FailoverTarget;

/// Executes the detach/attach transitions of a failover run
pub struct AttachmentManager<'a> {
    api: &'a dyn ComputeApi,
}

impl<'a> AttachmentManager<'a> {
    /// Create a manager over the given provider surface
    pub fn new(api: &'a dyn ComputeApi) -> Self {
        Self { api }
    }

    /// True exactly when the elastic IP already sits on the target address.
    /// The orchestration stops with success, and zero detach/attach calls,
    /// when this holds for the retained target.
    pub fn already_attached(elastic_ip: &ElasticIp, target_private_ip: IpAddr) -> bool {
        elastic_ip.private_ip == Some(target_private_ip)
    }

    /// Detach the elastic IP from its current holder
    pub async fn detach_current(&self, elastic_ip: &ElasticIp) -> Result<()> {
        let attachment = elastic_ip
            .attachment
            .as_ref()
            .ok_or_else(|| Error::provider("detach requested for an unattached elastic ip"))?;

        self.api
            .detach_elastic_ip(attachment.id, elastic_ip.id)
            .await?;
        info!(
            public_ip = %elastic_ip.public_ip,
            instance = %attachment.name,
            instance_id = attachment.id,
            "detached elastic ip from failed instance"
        );
        Ok(())
    }

    /// Clear a stale elastic IP occupying the target interface, if any
    pub async fn prepare(&self, target: &FailoverTarget, elastic_ip_id: u64) -> Result<()> {
        let Some(occupant) = &target.attached_elastic_ip else {
            return Ok(());
        };
        if occupant.id == elastic_ip_id {
            return Ok(());
        }

        self.api
            .detach_elastic_ip(target.instance_id, occupant.id)
            .await?;
        info!(
            public_ip = %occupant.public_ip,
            instance = %target.instance_name,
            instance_id = target.instance_id,
            "detached stale elastic ip from target interface"
        );
        Ok(())
    }

    /// Attach the elastic IP to the selected target interface
    pub async fn attach(
        &self,
        elastic_ip: &ElasticIp,
        target: &FailoverTarget,
    ) -> Result<ElasticIp> {
        let attached = self
            .api
            .attach_elastic_ip(
                target.instance_id,
                ElasticIpAttach {
                    elastic_ip_id: elastic_ip.id,
                    network_interface_id: target.network_interface_id,
                },
            )
            .await?;
        info!(
            public_ip = %elastic_ip.public_ip,
            instance = %target.instance_name,
            instance_id = target.instance_id,
            network_interface_id = target.network_interface_id,
            "attached elastic ip to target interface"
        );
        Ok(attached)
    }
}
