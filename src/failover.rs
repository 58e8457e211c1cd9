//! Failover orchestration
//!
//! Drives one run end to end:
//!
//! ```text
//! locate elastic ip
//!     │
//!     ├── holder already an eligible candidate? ── yes ──▶ no-op success
//!     │
//!     ├── detach from failed instance
//!     │
//!     ├── select replacement target
//!     │
//!     ├── clear stale elastic ip on target interface
//!     │
//!     └── attach to target interface
//! ```
//!
//! Every step runs sequentially under one wall-clock deadline. Any error
//! aborts the run at first occurrence with no rollback: a run killed
//! between detach and attach leaves the IP unattached, and the next
//! invocation recovers by selecting and attaching without a detach.

use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::info;

use crate::attach::AttachmentManager;
use crate::compute::{ComputeApi, ElasticIp};
use crate::error::{Error, Result};
use crate::select::{CandidatePolicy, FailoverTarget, TargetSelector};

/// Default overall deadline for one run, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Immutable configuration for one failover run
#[derive(Debug, Clone)]
pub struct FailoverConfig {
    /// Public address of the elastic IP to move
    pub public_ip: IpAddr,

    /// Candidate pool the replacement is chosen from
    pub policy: CandidatePolicy,

    /// Overall wall-clock deadline for the run
    pub timeout: Duration,
}

impl FailoverConfig {
    /// Create a configuration with the default deadline
    pub fn new(public_ip: IpAddr, policy: CandidatePolicy) -> Self {
        Self {
            public_ip,
            policy,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the overall deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum FailoverOutcome {
    /// The elastic IP already sat on an eligible candidate; no detach or
    /// attach call was made
    AlreadyAttached {
        /// The current holder, resolved as a target
        target: FailoverTarget,
    },

    /// The elastic IP was moved to a freshly selected target
    Completed {
        /// The new holder
        target: FailoverTarget,

        /// Wall-clock duration of the run
        elapsed: Duration,
    },
}

/// Find the elastic IP with the given public address
///
/// Scans the full unfiltered listing; public addresses are unique under an
/// account, so the first match is the only one.
pub async fn locate_elastic_ip(api: &dyn ComputeApi, public_ip: IpAddr) -> Result<ElasticIp> {
    let ips = api.list_elastic_ips().await?;
    ips.into_iter()
        .find(|ip| ip.public_ip == public_ip)
        .ok_or(Error::NotFound(public_ip))
}

/// Drives one failover run end to end
pub struct FailoverManager<'a> {
    api: &'a dyn ComputeApi,
    config: FailoverConfig,
}

impl<'a> FailoverManager<'a> {
    /// Create a manager for one run
    pub fn new(api: &'a dyn ComputeApi, config: FailoverConfig) -> Self {
        Self { api, config }
    }

    /// Get the run configuration
    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Run the failover, bounded by the configured deadline
    pub async fn run(&self) -> Result<FailoverOutcome> {
        tokio::time::timeout(self.config.timeout, self.run_inner())
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
    }

    async fn run_inner(&self) -> Result<FailoverOutcome> {
        let start = Instant::now();

        let elastic_ip = locate_elastic_ip(self.api, self.config.public_ip).await?;
        match &elastic_ip.attachment {
            Some(attachment) => info!(
                public_ip = %elastic_ip.public_ip,
                instance = %attachment.name,
                instance_id = attachment.id,
                "found elastic ip attached to instance"
            ),
            None => info!(
                public_ip = %elastic_ip.public_ip,
                "found elastic ip, currently unattached"
            ),
        }

        let selector = TargetSelector::new(self.api, &self.config.policy);
        let attachments = AttachmentManager::new(self.api);

        if let Some(held) = selector.retained_target(&elastic_ip).await? {
            if AttachmentManager::already_attached(&elastic_ip, held.private_ip) {
                info!(
                    public_ip = %elastic_ip.public_ip,
                    instance = %held.instance_name,
                    instance_id = held.instance_id,
                    "elastic ip already attached to an eligible instance, nothing to do"
                );
                return Ok(FailoverOutcome::AlreadyAttached { target: held });
            }
        }

        if elastic_ip.is_attached() {
            attachments.detach_current(&elastic_ip).await?;
        }

        let target = selector.select(&elastic_ip).await?;
        info!(
            instance = %target.instance_name,
            instance_id = target.instance_id,
            network_interface_id = target.network_interface_id,
            "picked failover target"
        );

        attachments.prepare(&target, elastic_ip.id).await?;
        attachments.attach(&elastic_ip, &target).await?;

        Ok(FailoverOutcome::Completed {
            target,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failover_config_default_deadline() {
        let config = FailoverConfig::new(
            "203.0.113.9".parse().unwrap(),
            CandidatePolicy::Instances(vec![1, 2]),
        );
        assert_eq!(config.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_failover_config_builder() {
        let config = FailoverConfig::new(
            "203.0.113.9".parse().unwrap(),
            CandidatePolicy::Subnet {
                anchor: "10.0.0.1".parse().unwrap(),
            },
        )
        .with_timeout(Duration::from_secs(15));
        assert_eq!(config.timeout.as_secs(), 15);
    }
}
