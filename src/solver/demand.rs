//! 需求推导与容量诊断
//!
//! 每个 (输入, egress block) 组合是一个需求：为它选定一个 spine，就同时占用
//! (ingress, spine) 与 (spine, egress) 两条链路，该输入在此 block 内的全部输出端口
//! 都由这个 spine 馈入。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::fabric::{AllocationState, EgressId, IngressId, InputId};
use crate::topo::clos::ClosTopology;

/// 需要一个 spine 的 (输入, egress block) 组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Demand {
    pub input: InputId,
    pub ingress: IngressId,
    pub egress: EgressId,
}

/// 由期望状态推导全部需求，按输入 id 升序、同一输入内按 egress 升序排列
pub fn build_demands(state: &AllocationState) -> Vec<Demand> {
    let topo = state.topology();
    let demands: BTreeSet<Demand> = topo
        .ports()
        .filter_map(|port| {
            state.desired_owner(port).map(|input| Demand {
                input,
                ingress: topo.ingress_switch_of(input),
                egress: topo.egress_block_of(port),
            })
        })
        .collect();
    demands.into_iter().collect()
}

/// 需求相对于链路容量的分布，用于不可满足时的诊断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatReport {
    /// 每个 ingress 交换机 / egress block 的链路数（= N）
    pub capacity: usize,
    /// egress block -> 需要到达它的不同输入数
    pub egress_load: BTreeMap<EgressId, usize>,
    /// ingress 交换机 -> 活跃输入数
    pub ingress_load: BTreeMap<IngressId, usize>,
}

impl UnsatReport {
    pub fn from_demands(topo: &ClosTopology, demands: &[Demand]) -> Self {
        let mut egress_load = BTreeMap::new();
        let mut active: BTreeSet<InputId> = BTreeSet::new();
        let mut ingress_load = BTreeMap::new();
        for d in demands {
            *egress_load.entry(d.egress).or_insert(0) += 1;
            if active.insert(d.input) {
                *ingress_load.entry(d.ingress).or_insert(0) += 1;
            }
        }
        Self {
            capacity: topo.n(),
            egress_load,
            ingress_load,
        }
    }

    /// 快速容量检查：任一 egress block 或 ingress 交换机的负载超过 N 时必然无解
    pub fn overloaded(&self) -> bool {
        self.egress_load
            .values()
            .chain(self.ingress_load.values())
            .any(|&load| load > self.capacity)
    }
}

impl fmt::Display for UnsatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (egress, load) in &self.egress_load {
            write!(
                f,
                "{sep}egress block {} needs {load} distinct inputs (capacity {})",
                egress.0 + 1,
                self.capacity
            )?;
            sep = "; ";
        }
        for (ingress, load) in &self.ingress_load {
            write!(
                f,
                "{sep}ingress block {} has {load} active inputs (capacity {} spines)",
                ingress.0 + 1,
                self.capacity
            )?;
            sep = "; ";
        }
        Ok(())
    }
}
