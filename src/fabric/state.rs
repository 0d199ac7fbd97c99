//! 分配状态
//!
//! 保存期望连接（`desired_owner`）与已实现的 fabric 绑定（trunk 归属、输出端口
//! 的 owner / spine）。所有数组按端口号下标，下标 0 保留不用，与快照布局一致。

use super::id::{EgressId, InputId, PortId, SpineId};
use super::trunks::Trunks;
use crate::topo::clos::ClosTopology;

/// Fabric 的期望状态与实现状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationState {
    topo: ClosTopology,
    trunks: Trunks,
    /// 输出端口 -> 已实现的输入 id（0 为空闲）
    port_owner: Vec<u32>,
    /// 输出端口 -> 馈入该端口的 spine（-1 为未连接）
    port_spine: Vec<i32>,
    /// 输出端口 -> 期望的输入 id（0 为未请求）
    desired: Vec<u32>,
}

fn to_input(raw: u32) -> Option<InputId> {
    match raw {
        0 => None,
        id => Some(InputId(id)),
    }
}

impl AllocationState {
    pub fn new(topo: ClosTopology) -> Self {
        let slots = topo.max_port() as usize + 1;
        Self {
            trunks: Trunks::new(topo.n()),
            port_owner: vec![0; slots],
            port_spine: vec![-1; slots],
            desired: vec![0; slots],
            topo,
        }
    }

    pub fn topology(&self) -> &ClosTopology {
        &self.topo
    }

    pub fn trunks(&self) -> &Trunks {
        &self.trunks
    }

    pub(crate) fn trunks_mut(&mut self) -> &mut Trunks {
        &mut self.trunks
    }

    pub fn desired_owner(&self, port: PortId) -> Option<InputId> {
        to_input(self.desired[port.0 as usize])
    }

    /// 修改期望归属，返回之前的值
    pub(crate) fn set_desired(&mut self, port: PortId, owner: Option<InputId>) -> Option<InputId> {
        let slot = &mut self.desired[port.0 as usize];
        let prev = *slot;
        *slot = owner.map_or(0, |id| id.0);
        to_input(prev)
    }

    pub fn port_owner(&self, port: PortId) -> Option<InputId> {
        to_input(self.port_owner[port.0 as usize])
    }

    pub fn port_spine(&self, port: PortId) -> Option<SpineId> {
        usize::try_from(self.port_spine[port.0 as usize]).ok().map(SpineId)
    }

    pub(crate) fn bind_port(&mut self, port: PortId, input: InputId, spine: SpineId) {
        self.port_owner[port.0 as usize] = input.0;
        self.port_spine[port.0 as usize] = spine.0 as i32;
    }

    pub(crate) fn release_port(&mut self, port: PortId) {
        self.port_owner[port.0 as usize] = 0;
        self.port_spine[port.0 as usize] = -1;
    }

    /// `input` 期望拥有的全部输出端口（升序）
    pub fn desired_ports_of(&self, input: InputId) -> Vec<PortId> {
        self.topo
            .ports()
            .filter(|&p| self.desired[p.0 as usize] == input.0)
            .collect()
    }

    /// `input` 已实现的全部输出端口（升序）
    pub fn realized_ports_of(&self, input: InputId) -> Vec<PortId> {
        self.topo
            .ports()
            .filter(|&p| self.port_owner[p.0 as usize] == input.0)
            .collect()
    }

    /// `input` 在 `egress` 内已选定的 spine（同一 block 内的端口共用一个 spine）
    pub fn branch_spine(&self, input: InputId, egress: EgressId) -> Option<SpineId> {
        self.topo
            .egress_ports(egress)
            .find(|p| self.port_owner[p.0 as usize] == input.0)
            .and_then(|p| self.port_spine(p))
    }

    /// 已实现状态是否与期望状态完全一致
    pub fn is_settled(&self) -> bool {
        self.port_owner == self.desired
    }

    /// 用一组全新的绑定替换当前的实现状态
    pub(crate) fn install(&mut self, trunks: Trunks, bindings: &[(PortId, InputId, SpineId)]) {
        self.trunks = trunks;
        self.port_owner.fill(0);
        self.port_spine.fill(-1);
        for &(port, input, spine) in bindings {
            self.bind_port(port, input, spine);
        }
    }

    pub fn desired_owner_raw(&self) -> &[u32] {
        &self.desired
    }

    pub fn port_owner_raw(&self) -> &[u32] {
        &self.port_owner
    }

    pub fn port_spine_raw(&self) -> &[i32] {
        &self.port_spine
    }
}
