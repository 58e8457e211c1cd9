//! In-memory provider fake shared by the integration tests
//!
//! Mirrors the provider's observable behavior closely enough to drive the
//! full failover flow: listings come back in insertion order, detach and
//! attach mutate the stored state, and every mutation is recorded so tests
//! can assert on the exact call sequence.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;

use eip_failover::{
    AttachedIp, Attachment, ComputeApi, ElasticIp, ElasticIpAttach, Error, Instance,
    InstanceStatus, NetworkInterface, NetworkRef, Result, INSTANCE_STATUS_RUNNING,
};

/// Mutation calls observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Detach {
        instance_id: u64,
        elastic_ip_id: u64,
    },
    Attach {
        instance_id: u64,
        elastic_ip_id: u64,
        network_interface_id: u64,
    },
}

#[derive(Default)]
struct State {
    elastic_ips: Vec<ElasticIp>,
    instances: Vec<Instance>,
    interfaces: Vec<(u64, Vec<NetworkInterface>)>,
    calls: Vec<Call>,
}

/// In-memory [`ComputeApi`] implementation
#[derive(Default)]
pub struct FakeCompute {
    state: Mutex<State>,
    stall: Option<Duration>,
}

impl FakeCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every listing call; used with a paused clock to exercise the
    /// overall run deadline.
    pub fn stalled(delay: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            stall: Some(delay),
        }
    }

    pub fn add_elastic_ip(&self, elastic_ip: ElasticIp) {
        self.state.lock().unwrap().elastic_ips.push(elastic_ip);
    }

    pub fn add_instance(&self, instance: Instance, interfaces: Vec<NetworkInterface>) {
        let mut state = self.state.lock().unwrap();
        state.interfaces.push((instance.id, interfaces));
        state.instances.push(instance);
    }

    /// Every mutation call observed so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    async fn maybe_stall(&self) {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ComputeApi for FakeCompute {
    async fn list_elastic_ips(&self) -> Result<Vec<ElasticIp>> {
        self.maybe_stall().await;
        Ok(self.state.lock().unwrap().elastic_ips.clone())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>> {
        self.maybe_stall().await;
        Ok(self.state.lock().unwrap().instances.clone())
    }

    async fn get_instance(&self, id: u64) -> Result<Instance> {
        self.state
            .lock()
            .unwrap()
            .instances
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Error::provider(format!("instance {id} not found")))
    }

    async fn list_network_interfaces(&self, instance_id: u64) -> Result<Vec<NetworkInterface>> {
        self.state
            .lock()
            .unwrap()
            .interfaces
            .iter()
            .find(|(id, _)| *id == instance_id)
            .map(|(_, ifaces)| ifaces.clone())
            .ok_or_else(|| Error::provider(format!("instance {instance_id} not found")))
    }

    async fn detach_elastic_ip(&self, instance_id: u64, elastic_ip_id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Detach {
            instance_id,
            elastic_ip_id,
        });

        let elastic_ip = state
            .elastic_ips
            .iter_mut()
            .find(|ip| ip.id == elastic_ip_id)
            .ok_or_else(|| Error::provider(format!("elastic ip {elastic_ip_id} not found")))?;
        elastic_ip.private_ip = None;
        elastic_ip.attachment = None;

        for (_, interfaces) in state.interfaces.iter_mut() {
            for iface in interfaces.iter_mut() {
                if iface
                    .attached_elastic_ip
                    .as_ref()
                    .is_some_and(|held| held.id == elastic_ip_id)
                {
                    iface.attached_elastic_ip = None;
                }
            }
        }
        Ok(())
    }

    async fn attach_elastic_ip(
        &self,
        instance_id: u64,
        attach: ElasticIpAttach,
    ) -> Result<ElasticIp> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Attach {
            instance_id,
            elastic_ip_id: attach.elastic_ip_id,
            network_interface_id: attach.network_interface_id,
        });

        let instance_name = state
            .instances
            .iter()
            .find(|i| i.id == instance_id)
            .map(|i| i.name.clone())
            .ok_or_else(|| Error::provider(format!("instance {instance_id} not found")))?;

        let (private_ip, public_ip, elastic_ip_id) = {
            let iface = state
                .interfaces
                .iter()
                .find(|(id, _)| *id == instance_id)
                .and_then(|(_, ifaces)| {
                    ifaces.iter().find(|i| i.id == attach.network_interface_id)
                })
                .ok_or_else(|| {
                    Error::provider(format!(
                        "network interface {} not found",
                        attach.network_interface_id
                    ))
                })?;

            let elastic_ip = state
                .elastic_ips
                .iter()
                .find(|ip| ip.id == attach.elastic_ip_id)
                .ok_or_else(|| {
                    Error::provider(format!("elastic ip {} not found", attach.elastic_ip_id))
                })?;

            (iface.private_ip, elastic_ip.public_ip, elastic_ip.id)
        };

        for (_, interfaces) in state.interfaces.iter_mut() {
            for iface in interfaces.iter_mut() {
                if iface.id == attach.network_interface_id {
                    iface.attached_elastic_ip = Some(AttachedIp {
                        id: elastic_ip_id,
                        public_ip,
                    });
                }
            }
        }

        let elastic_ip = state
            .elastic_ips
            .iter_mut()
            .find(|ip| ip.id == attach.elastic_ip_id)
            .expect("looked up above");
        elastic_ip.private_ip = Some(private_ip);
        elastic_ip.attachment = Some(Attachment {
            id: instance_id,
            name: instance_name,
        });

        Ok(elastic_ip.clone())
    }
}

pub fn running_instance(id: u64, name: &str) -> Instance {
    Instance {
        id,
        name: name.to_string(),
        status: InstanceStatus {
            id: INSTANCE_STATUS_RUNNING,
            name: "running".to_string(),
        },
    }
}

pub fn stopped_instance(id: u64, name: &str) -> Instance {
    Instance {
        id,
        name: name.to_string(),
        status: InstanceStatus {
            id: 3,
            name: "stopped".to_string(),
        },
    }
}

pub fn interface(id: u64, private_ip: &str, cidr: &str) -> NetworkInterface {
    NetworkInterface {
        id,
        private_ip: private_ip.parse().unwrap(),
        network: NetworkRef {
            id: 1,
            cidr: cidr.to_string(),
        },
        attached_elastic_ip: None,
    }
}

pub fn occupied_interface(
    id: u64,
    private_ip: &str,
    cidr: &str,
    occupant_id: u64,
    occupant_public_ip: &str,
) -> NetworkInterface {
    NetworkInterface {
        attached_elastic_ip: Some(AttachedIp {
            id: occupant_id,
            public_ip: occupant_public_ip.parse().unwrap(),
        }),
        ..interface(id, private_ip, cidr)
    }
}

pub fn attached_eip(
    id: u64,
    public_ip: &str,
    private_ip: &str,
    instance_id: u64,
    instance_name: &str,
) -> ElasticIp {
    ElasticIp {
        id,
        public_ip: public_ip.parse().unwrap(),
        private_ip: Some(private_ip.parse().unwrap()),
        attachment: Some(Attachment {
            id: instance_id,
            name: instance_name.to_string(),
        }),
    }
}

pub fn detached_eip(id: u64, public_ip: &str) -> ElasticIp {
    ElasticIp {
        id,
        public_ip: public_ip.parse().unwrap(),
        private_ip: None,
        attachment: None,
    }
}

pub fn private(addr: &str) -> IpAddr {
    addr.parse().unwrap()
}
