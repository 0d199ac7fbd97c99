//! 三级 Clos 拓扑
//!
//! 对称 C(N, N, N) 网络：N 个 ingress 交换机、N 个 spine、N 个 egress block，
//! 每个 ingress / egress 交换机各带 N 个外部端口。拓扑完全由 N 决定，无可变状态。
//!
//! 编号约定：
//! - 输入端口与输出端口都是 `1..=N²`
//! - ingress / spine / egress 的下标从 0 开始（输入 `id` 属于 ingress `⌈id/N⌉ - 1`）

use crate::fabric::{EgressId, IngressId, InputId, PortId, SpineId};

#[derive(Debug, Clone)]
pub struct ClosOpts {
    /// 每级交换机数量，同时也是每个交换机的外部端口数
    pub n: usize,
}

impl Default for ClosOpts {
    fn default() -> Self {
        Self { n: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosTopology {
    n: usize,
}

impl ClosTopology {
    pub fn n(&self) -> usize {
        self.n
    }

    /// 最大端口号（N²），输入与输出共用同一编号范围
    pub fn max_port(&self) -> u32 {
        (self.n * self.n) as u32
    }

    pub fn spines(&self) -> impl DoubleEndedIterator<Item = SpineId> + Clone + use<> {
        (0..self.n).map(SpineId)
    }

    pub fn ingress_switches(&self) -> impl Iterator<Item = IngressId> + use<> {
        (0..self.n).map(IngressId)
    }

    pub fn egress_blocks(&self) -> impl Iterator<Item = EgressId> + use<> {
        (0..self.n).map(EgressId)
    }

    pub fn is_valid_input(&self, input: InputId) -> bool {
        input.0 >= 1 && input.0 <= self.max_port()
    }

    pub fn is_valid_port(&self, port: PortId) -> bool {
        port.0 >= 1 && port.0 <= self.max_port()
    }

    pub fn ingress_switch_of(&self, input: InputId) -> IngressId {
        debug_assert!(self.is_valid_input(input), "input {input:?} out of range");
        IngressId((input.0 as usize - 1) / self.n)
    }

    pub fn egress_block_of(&self, port: PortId) -> EgressId {
        debug_assert!(self.is_valid_port(port), "port {port:?} out of range");
        EgressId((port.0 as usize - 1) / self.n)
    }

    pub fn egress_offset_of(&self, port: PortId) -> usize {
        debug_assert!(self.is_valid_port(port), "port {port:?} out of range");
        (port.0 as usize - 1) % self.n
    }

    /// `egress` 中第 `offset` 个输出端口
    pub fn port_at(&self, egress: EgressId, offset: usize) -> PortId {
        PortId((egress.0 * self.n + offset + 1) as u32)
    }

    /// 某个 egress block 的全部输出端口（升序）
    pub fn egress_ports(&self, egress: EgressId) -> impl Iterator<Item = PortId> + use<> {
        let topo = *self;
        (0..self.n).map(move |offset| topo.port_at(egress, offset))
    }

    /// 全部输出端口（升序）
    pub fn ports(&self) -> impl Iterator<Item = PortId> + use<> {
        (1..=self.max_port()).map(PortId)
    }

    /// 挂在某个 ingress 交换机上的全部输入（升序）
    pub fn inputs_of(&self, ingress: IngressId) -> impl Iterator<Item = InputId> + use<> {
        let first = ingress.0 * self.n + 1;
        (first..first + self.n).map(|i| InputId(i as u32))
    }
}

pub fn build_clos(opts: &ClosOpts) -> ClosTopology {
    let n = opts.n;
    assert!(n >= 1, "clos size n must be >= 1");
    assert!(
        n.checked_mul(n).is_some_and(|sq| sq <= u32::MAX as usize),
        "clos size n={n} overflows the port numbering"
    );
    ClosTopology { n }
}
