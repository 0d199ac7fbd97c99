//! 增量修复
//!
//! 只为本次指令新出现的 (输入, egress block) 需求选择 spine，其它连接的绑定一律不动。
//! 输入在某个 block 已有分支时，新端口直接挂到该分支的 spine 上。

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::trail::Trail;
use super::{Attempt, Delta, Outcome, Resolver};
use crate::fabric::{AllocationState, EgressId, IngressId, InputId, PortId, SpineId, Trunks};

#[derive(Debug, Default)]
pub struct RepairEngine {
    trail: Trail,
}

impl RepairEngine {
    fn release(&mut self, state: &mut AllocationState, input: InputId) -> Attempt {
        let released = state.realized_ports_of(input);
        for &port in &released {
            state.release_port(port);
        }
        let ingress = state.topology().ingress_switch_of(input);
        state.trunks_mut().release_input(input, ingress);
        debug!(input = input.0, ports = released.len(), "🧹 释放输入的全部绑定");
        Attempt {
            nodes: 0,
            outcome: Outcome::Settled,
        }
    }

    fn place(&mut self, state: &mut AllocationState, input: InputId, added: &[PortId]) -> Attempt {
        let topo = *state.topology();
        let ingress = topo.ingress_switch_of(input);

        let mut by_block: BTreeMap<EgressId, Vec<PortId>> = BTreeMap::new();
        for &port in added {
            by_block.entry(topo.egress_block_of(port)).or_default().push(port);
        }

        let mut branches: BTreeMap<EgressId, SpineId> = BTreeMap::new();
        let mut open = Vec::new();
        for &egress in by_block.keys() {
            match state.branch_spine(input, egress) {
                Some(spine) => {
                    branches.insert(egress, spine);
                }
                None => open.push(egress),
            }
        }

        let (nodes, chosen) = Self::choose(state.trunks(), input, ingress, &open);
        let Some(chosen) = chosen else {
            debug!(input = input.0, nodes, open = open.len(), "局部修复失败");
            return Attempt {
                nodes,
                outcome: Outcome::Unresolved,
            };
        };

        for (&egress, &spine) in open.iter().zip(&chosen) {
            trace!(egress = egress.0, spine = spine.0, "选择 spine");
            self.trail.claim(state.trunks_mut(), input, ingress, spine, egress);
        }
        if !self.trail.is_empty() {
            debug!(input = input.0, claimed = self.trail.len(), "占用新的级间链路");
        }
        self.trail.commit();
        branches.extend(open.into_iter().zip(chosen));

        for (egress, ports) in by_block {
            let spine = branches[&egress];
            for port in ports {
                state.bind_port(port, input, spine);
            }
        }
        debug!(input = input.0, nodes, "🔧 局部修复成功");
        Attempt {
            nodes,
            outcome: Outcome::Settled,
        }
    }

    /// 为 `open` 中每个 block 取编号最小的可用 spine。
    ///
    /// 同一输入在不同 block 上的选择互不影响（占用的 ingress 链路本就可被它自己复用），
    /// 因此无需回溯：任一 block 没有候选即失败。成功时节点数为 0，失败时为检查过的
    /// block 数。
    fn choose(
        trunks: &Trunks,
        input: InputId,
        ingress: IngressId,
        open: &[EgressId],
    ) -> (u64, Option<Vec<SpineId>>) {
        let mut chosen = Vec::with_capacity(open.len());
        for (idx, &egress) in open.iter().enumerate() {
            match trunks.candidates(input, ingress, egress).next() {
                Some(spine) => chosen.push(spine),
                None => return (idx as u64 + 1, None),
            }
        }
        (0, Some(chosen))
    }
}

impl Resolver for RepairEngine {
    fn name(&self) -> &'static str {
        "repair"
    }

    fn resolve(&mut self, state: &mut AllocationState, delta: &Delta) -> Attempt {
        match delta {
            Delta::Clear { input, .. } => self.release(state, *input),
            Delta::Route { input, added } => self.place(state, *input, added),
        }
    }
}
