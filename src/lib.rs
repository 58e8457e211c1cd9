//! # eip-failover
//!
//! Floating (elastic) IP failover between compute instances, driven by an
//! external health-monitoring agent such as a VRRP daemon's notify script.
//!
//! ## Flow
//!
//! ```text
//! locate ──▶ holder still eligible? ──▶ no-op success
//!    │
//!    ├── detach from failed instance
//!    ├── select replacement (instance list | peer addresses | subnet)
//!    ├── clear stale elastic ip on target interface
//!    └── attach to target interface
//! ```
//!
//! All decision logic lives in the library and is written against the
//! narrow [`compute::ComputeApi`] trait, so it runs unchanged against an
//! in-memory provider fake in tests. The binary only parses flags, sets up
//! logging, builds the HTTP client, and maps the outcome to an exit code.
//!
//! The run is single-shot and sequential, bounded by one overall deadline.
//! Redundant invocation is safe: when the IP already sits on an eligible
//! running candidate, the run succeeds without any detach/attach call.
//! Coordination between peers invoking the tool concurrently is the
//! health-monitoring layer's job, not ours.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attach;
pub mod client;
pub mod compute;
pub mod error;
pub mod failover;
pub mod select;

// Attachment transitions
pub use attach::AttachmentManager;

// HTTP provider client
pub use client::{ComputeClient, DEFAULT_API_URL};

// Provider model and capability trait
pub use compute::{
    AttachedIp, Attachment, ComputeApi, ElasticIp, ElasticIpAttach, Instance, InstanceStatus,
    NetworkInterface, NetworkRef, INSTANCE_STATUS_RUNNING,
};

// Error handling
pub use error::{Error, Result};

// Orchestration
pub use failover::{
    locate_elastic_ip, FailoverConfig, FailoverManager, FailoverOutcome, DEFAULT_TIMEOUT_SECS,
};

// Target selection
pub use select::{CandidatePolicy, FailoverTarget, TargetSelector};
