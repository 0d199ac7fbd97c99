//! 级间中继链路（trunk）占用表
//!
//! 每个 (ingress, spine) 对之间、每个 (spine, egress) 对之间各只有一条链路。
//! 一条链路同一时刻最多归属一个输入；同一输入的多个分支可以共用自己的链路。

use super::id::{EgressId, IngressId, InputId, SpineId};

/// 一条级间链路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trunk {
    /// ingress 交换机 -> spine
    Ingress(IngressId, SpineId),
    /// spine -> egress block
    Egress(SpineId, EgressId),
}

/// 链路归属表，`0` 表示空闲，否则为占用该链路的输入 id。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trunks {
    n: usize,
    /// `s1[ingress * n + spine]`
    s1: Vec<u32>,
    /// `s2[spine * n + egress]`
    s2: Vec<u32>,
}

impl Trunks {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            s1: vec![0; n * n],
            s2: vec![0; n * n],
        }
    }

    fn slot(&self, trunk: Trunk) -> u32 {
        match trunk {
            Trunk::Ingress(i, s) => self.s1[i.0 * self.n + s.0],
            Trunk::Egress(s, e) => self.s2[s.0 * self.n + e.0],
        }
    }

    fn slot_mut(&mut self, trunk: Trunk) -> &mut u32 {
        match trunk {
            Trunk::Ingress(i, s) => &mut self.s1[i.0 * self.n + s.0],
            Trunk::Egress(s, e) => &mut self.s2[s.0 * self.n + e.0],
        }
    }

    pub fn owner(&self, trunk: Trunk) -> Option<InputId> {
        match self.slot(trunk) {
            0 => None,
            id => Some(InputId(id)),
        }
    }

    /// 设置链路归属，返回之前的归属
    pub(crate) fn set(&mut self, trunk: Trunk, owner: Option<InputId>) -> Option<InputId> {
        let slot = self.slot_mut(trunk);
        let prev = *slot;
        *slot = owner.map_or(0, |id| id.0);
        match prev {
            0 => None,
            id => Some(InputId(id)),
        }
    }

    fn usable_by(&self, trunk: Trunk, input: InputId) -> bool {
        let owner = self.slot(trunk);
        owner == 0 || owner == input.0
    }

    /// `spine` 能否为 `input` 提供 ingress -> spine -> egress 的通路
    pub fn can_carry(&self, input: InputId, ingress: IngressId, spine: SpineId, egress: EgressId) -> bool {
        self.usable_by(Trunk::Egress(spine, egress), input)
            && self.usable_by(Trunk::Ingress(ingress, spine), input)
    }

    /// 两侧链路均可用的 spine（升序）
    pub fn candidates(
        &self,
        input: InputId,
        ingress: IngressId,
        egress: EgressId,
    ) -> impl Iterator<Item = SpineId> + '_ {
        (0..self.n)
            .map(SpineId)
            .filter(move |&s| self.can_carry(input, ingress, s, egress))
    }

    pub fn has_candidate(&self, input: InputId, ingress: IngressId, egress: EgressId) -> bool {
        self.candidates(input, ingress, egress).next().is_some()
    }

    /// 释放 `input` 在全部链路上的占用
    pub(crate) fn release_input(&mut self, input: InputId, ingress: IngressId) {
        let row = ingress.0 * self.n;
        for slot in &mut self.s1[row..row + self.n] {
            if *slot == input.0 {
                *slot = 0;
            }
        }
        for slot in &mut self.s2 {
            if *slot == input.0 {
                *slot = 0;
            }
        }
    }

    /// `s1_to_s2` 矩阵，行为 ingress，列为 spine
    pub fn s1_rows(&self) -> Vec<Vec<u32>> {
        self.s1.chunks(self.n.max(1)).map(<[u32]>::to_vec).collect()
    }

    /// `s2_to_s3` 矩阵，行为 spine，列为 egress
    pub fn s2_rows(&self) -> Vec<Vec<u32>> {
        self.s2.chunks(self.n.max(1)).map(<[u32]>::to_vec).collect()
    }
}
