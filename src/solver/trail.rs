//! 撤销轨迹
//!
//! 搜索时对链路表的每次写入都记录旧值，回溯时按 O(1)/步 恢复，避免复制整张表。

use crate::fabric::{EgressId, IngressId, InputId, SpineId, Trunk, Trunks};

#[derive(Debug, Clone, Copy)]
struct Step {
    trunk: Trunk,
    prev: Option<InputId>,
}

#[derive(Debug, Default)]
pub struct Trail {
    steps: Vec<Step>,
}

impl Trail {
    /// 当前位置，可传给 `undo_to`
    pub fn mark(&self) -> usize {
        self.steps.len()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 为 `input` 占用 ingress -> spine -> egress 两条链路；已属于 `input` 的链路不记录
    pub fn claim(
        &mut self,
        trunks: &mut Trunks,
        input: InputId,
        ingress: IngressId,
        spine: SpineId,
        egress: EgressId,
    ) {
        for trunk in [Trunk::Ingress(ingress, spine), Trunk::Egress(spine, egress)] {
            if trunks.owner(trunk) != Some(input) {
                let prev = trunks.set(trunk, Some(input));
                self.steps.push(Step { trunk, prev });
            }
        }
    }

    /// 撤销 `mark` 之后的全部写入
    pub fn undo_to(&mut self, trunks: &mut Trunks, mark: usize) {
        while self.steps.len() > mark {
            if let Some(step) = self.steps.pop() {
                trunks.set(step.trunk, step.prev);
            }
        }
    }

    /// 接受当前写入，丢弃撤销记录
    pub fn commit(&mut self) {
        self.steps.clear();
    }
}
