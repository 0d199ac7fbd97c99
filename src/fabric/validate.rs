//! 不变式检查
//!
//! 在每次 resolve 之后确认 fabric 状态在物理上可实现，且与期望状态一致。

use thiserror::Error;

use super::id::{EgressId, IngressId, InputId, PortId, SpineId};
use super::state::AllocationState;
use super::trunks::Trunk;

/// 第一个被违反的不变式
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("trunk owner {input} is not a valid input")]
    OwnerOutOfRange { input: InputId },

    #[error("ingress trunk ({ingress:?}, {spine:?}) held by input {input} of another ingress switch")]
    ForeignIngressTrunk {
        ingress: IngressId,
        spine: SpineId,
        input: InputId,
    },

    #[error("egress trunk ({spine:?}, {egress:?}) held by input {input} without its ingress trunk")]
    EgressWithoutIngress {
        spine: SpineId,
        egress: EgressId,
        input: InputId,
    },

    #[error("ingress trunk ({ingress:?}, {spine:?}) held by input {input} feeds no egress trunk")]
    LeakedIngressTrunk {
        ingress: IngressId,
        spine: SpineId,
        input: InputId,
    },

    #[error("egress trunk ({spine:?}, {egress:?}) held by input {input} feeds no output port")]
    LeakedEgressTrunk {
        spine: SpineId,
        egress: EgressId,
        input: InputId,
    },

    #[error("output port {port} is free but still selects a spine")]
    DanglingSpine { port: PortId },

    #[error("output port {port} owned by input {input} has no valid spine")]
    MissingSpine { port: PortId, input: InputId },

    #[error("output port {port} owned by input {input} selects {spine:?} but that trunk is held by {holder:?}")]
    TrunkMismatch {
        port: PortId,
        input: InputId,
        spine: SpineId,
        holder: Option<InputId>,
    },

    #[error("output port {port} desired by {desired:?} but realized for {realized:?}")]
    Unsettled {
        port: PortId,
        desired: Option<InputId>,
        realized: Option<InputId>,
    },
}

impl AllocationState {
    /// 检查全部容量与一致性不变式，返回第一个违反项
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let topo = *self.topology();
        let trunks = self.trunks();

        for spine in topo.spines() {
            for egress in topo.egress_blocks() {
                let Some(input) = trunks.owner(Trunk::Egress(spine, egress)) else {
                    continue;
                };
                if !topo.is_valid_input(input) {
                    return Err(InvariantViolation::OwnerOutOfRange { input });
                }
                let ingress = topo.ingress_switch_of(input);
                if trunks.owner(Trunk::Ingress(ingress, spine)) != Some(input) {
                    return Err(InvariantViolation::EgressWithoutIngress { spine, egress, input });
                }
                let feeds_port = topo
                    .egress_ports(egress)
                    .any(|p| self.port_owner(p) == Some(input) && self.port_spine(p) == Some(spine));
                if !feeds_port {
                    return Err(InvariantViolation::LeakedEgressTrunk { spine, egress, input });
                }
            }
        }

        for ingress in topo.ingress_switches() {
            for spine in topo.spines() {
                let Some(input) = trunks.owner(Trunk::Ingress(ingress, spine)) else {
                    continue;
                };
                if !topo.is_valid_input(input) {
                    return Err(InvariantViolation::OwnerOutOfRange { input });
                }
                if !topo.inputs_of(ingress).any(|i| i == input) {
                    return Err(InvariantViolation::ForeignIngressTrunk { ingress, spine, input });
                }
                let used = topo
                    .egress_blocks()
                    .any(|e| trunks.owner(Trunk::Egress(spine, e)) == Some(input));
                if !used {
                    return Err(InvariantViolation::LeakedIngressTrunk { ingress, spine, input });
                }
            }
        }

        for port in topo.ports() {
            let raw_spine = self.port_spine_raw()[port.0 as usize];
            let Some(input) = self.port_owner(port) else {
                if raw_spine != -1 {
                    return Err(InvariantViolation::DanglingSpine { port });
                }
                continue;
            };
            let spine = match self.port_spine(port) {
                Some(s) if s.0 < topo.n() && topo.is_valid_input(input) => s,
                _ => return Err(InvariantViolation::MissingSpine { port, input }),
            };
            let holder = trunks.owner(Trunk::Egress(spine, topo.egress_block_of(port)));
            if holder != Some(input) {
                return Err(InvariantViolation::TrunkMismatch {
                    port,
                    input,
                    spine,
                    holder,
                });
            }
        }

        for port in topo.ports() {
            let desired = self.desired_owner(port);
            let realized = self.port_owner(port);
            if desired != realized {
                return Err(InvariantViolation::Unsettled {
                    port,
                    desired,
                    realized,
                });
            }
        }

        Ok(())
    }
}
