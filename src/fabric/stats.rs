//! 统计信息
//!
//! 求解计数器（可被后台进度线程无锁读取）以及由已实现状态推导出的 fabric 统计。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::id::{InputId, SpineId};
use super::state::AllocationState;
use super::trunks::Trunk;

/// 求解计数器
#[derive(Debug, Default)]
pub struct Metrics {
    repack_count: AtomicU64,
    repair_count: AtomicU64,
    solve_nodes_total: AtomicU64,
    repair_nodes_total: AtomicU64,
}

impl Metrics {
    /// 一次成功的全局重排
    pub fn record_repack(&self) {
        self.repack_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 一次成功的增量修复
    pub fn record_repair(&self) {
        self.repair_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_solve_nodes(&self, nodes: u64) {
        self.solve_nodes_total.fetch_add(nodes, Ordering::Relaxed);
    }

    pub fn add_repair_nodes(&self, nodes: u64) {
        self.repair_nodes_total.fetch_add(nodes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            repack_count: self.repack_count.load(Ordering::Relaxed),
            repair_count: self.repair_count.load(Ordering::Relaxed),
            solve_nodes_total: self.solve_nodes_total.load(Ordering::Relaxed),
            repair_nodes_total: self.repair_nodes_total.load(Ordering::Relaxed),
        }
    }
}

/// 计数器在某一时刻的取值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub repack_count: u64,
    pub repair_count: u64,
    pub solve_nodes_total: u64,
    pub repair_nodes_total: u64,
}

impl MetricsSnapshot {
    /// 已完成的 resolve 次数（repack + repair）
    pub fn resolves(&self) -> u64 {
        self.repack_count + self.repair_count
    }

    pub fn nodes_total(&self) -> u64 {
        self.solve_nodes_total + self.repair_nodes_total
    }
}

/// Fabric 利用率统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricStats {
    /// 已实现的输出端口数
    pub routes_active: u64,
    /// 拥有 2 个及以上输出端口的输入数
    pub inputs_with_mult: u64,
    /// 使用 2 个及以上 spine 的输入数
    pub inputs_multi_spine: u64,
    /// 被 2 个及以上输入占用的 egress block 数
    pub egress_with_mult: u64,
    /// 单个 egress block 上的最大输入数
    pub max_egress_load: u64,
    /// 负载最大的 egress block（从 1 开始，0 表示没有）
    pub max_egress_block: u64,
    /// 至少承载一条路由的 spine 数
    pub active_spines: u64,
    /// 各输入使用的 spine 数之和
    pub total_branches: u64,
}

impl FabricStats {
    pub fn compute(state: &AllocationState) -> Self {
        let topo = state.topology();
        let trunks = state.trunks();
        let mut stats = FabricStats::default();

        let mut outputs: BTreeMap<InputId, u64> = BTreeMap::new();
        let mut spines: BTreeMap<InputId, BTreeSet<SpineId>> = BTreeMap::new();
        for port in topo.ports() {
            let (Some(owner), Some(spine)) = (state.port_owner(port), state.port_spine(port)) else {
                continue;
            };
            stats.routes_active += 1;
            *outputs.entry(owner).or_default() += 1;
            spines.entry(owner).or_default().insert(spine);
        }

        stats.inputs_with_mult = outputs.values().filter(|&&c| c >= 2).count() as u64;
        stats.inputs_multi_spine = spines.values().filter(|s| s.len() >= 2).count() as u64;
        stats.total_branches = spines.values().map(|s| s.len() as u64).sum();

        for egress in topo.egress_blocks() {
            let load = topo
                .spines()
                .filter(|&s| trunks.owner(Trunk::Egress(s, egress)).is_some())
                .count() as u64;
            if load >= 2 {
                stats.egress_with_mult += 1;
            }
            if load > stats.max_egress_load {
                stats.max_egress_load = load;
                stats.max_egress_block = egress.0 as u64 + 1;
            }
        }

        stats.active_spines = topo
            .spines()
            .filter(|&s| {
                topo.egress_blocks()
                    .any(|e| trunks.owner(Trunk::Egress(s, e)).is_some())
            })
            .count() as u64;

        stats
    }
}
