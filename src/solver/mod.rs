//! 求解模块
//!
//! 增量修复（只为本次变更的连接选择 spine）与全局重排（回溯搜索全部连接）。
//! 两者都实现 [`Resolver`]，由 `Router` 依次调用。

mod demand;
mod repack;
mod repair;
mod trail;

pub use demand::{Demand, UnsatReport, build_demands};
pub use repack::RepackSolver;
pub use repair::RepairEngine;
pub use trail::Trail;

use crate::fabric::{AllocationState, InputId, PortId};

/// 一条指令对期望状态造成的变化（期望状态已经更新）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// `input` 新增期望的输出端口
    Route { input: InputId, added: Vec<PortId> },
    /// `input` 被清除，`released` 为其之前期望的全部输出端口
    Clear { input: InputId, released: Vec<PortId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 实现状态已与期望状态一致
    Settled,
    /// 局部搜索放弃，状态未改动
    Unresolved,
    /// 全局搜索证明无解，状态未改动
    Infeasible(UnsatReport),
}

/// 一次求解尝试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 搜索访问的节点数
    pub nodes: u64,
    pub outcome: Outcome,
}

/// 把实现状态调和到期望状态的求解器
pub trait Resolver {
    fn name(&self) -> &'static str;

    /// 成功时提交新的绑定；失败时 `state` 保持不变
    fn resolve(&mut self, state: &mut AllocationState, delta: &Delta) -> Attempt;
}
