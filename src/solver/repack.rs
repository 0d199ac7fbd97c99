//! 全局重排
//!
//! 丢弃现有绑定，按固定顺序（输入 id 升序、egress 升序）对全部需求做回溯搜索，
//! 每个决策点按 spine 下标升序尝试候选。候选顺序只依赖下标，同样的命令序列总是
//! 得到同样的结果。
//!
//! 每次选择之后做前向检查：若某个与之竞争链路的后续需求已经没有候选，立即换下一个
//! 候选。被剪掉的分支本来就无解，因此找到的第一个解与不剪枝时相同。

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use super::demand::{Demand, UnsatReport, build_demands};
use super::trail::Trail;
use super::{Attempt, Delta, Outcome, Resolver};
use crate::fabric::{AllocationState, EgressId, InputId, SpineId, Trunks};
use crate::topo::clos::ClosTopology;

#[derive(Debug, Default)]
pub struct RepackSolver {
    trail: Trail,
}

/// 搜索结果：访问的节点数，以及找到的链路表和每个需求选中的 spine
pub type SearchResult = (u64, Option<(Trunks, Vec<SpineId>)>);

impl RepackSolver {
    /// 对 `demands` 做完整回溯搜索
    pub fn search(&mut self, topo: &ClosTopology, demands: &[Demand]) -> SearchResult {
        let mut trunks = Trunks::new(topo.n());
        self.trail.commit();
        if demands.is_empty() {
            return (0, Some((trunks, Vec::new())));
        }

        // 与某个需求竞争同一条 egress / ingress 链路的需求下标
        let mut by_egress: Vec<Vec<usize>> = vec![Vec::new(); topo.n()];
        let mut by_ingress: Vec<Vec<usize>> = vec![Vec::new(); topo.n()];
        for (i, d) in demands.iter().enumerate() {
            by_egress[d.egress.0].push(i);
            by_ingress[d.ingress.0].push(i);
        }

        let total = demands.len();
        let mut chosen: Vec<SpineId> = Vec::with_capacity(total);
        let mut next = vec![0usize; total];
        let mut marks = vec![0usize; total];
        let mut nodes = 1u64;
        let mut depth = 0;

        loop {
            if depth == total {
                self.trail.commit();
                return (nodes, Some((trunks, chosen)));
            }

            let d = demands[depth];
            let pick = trunks
                .candidates(d.input, d.ingress, d.egress)
                .find(|s| s.0 >= next[depth]);
            match pick {
                Some(spine) => {
                    next[depth] = spine.0 + 1;
                    marks[depth] = self.trail.mark();
                    self.trail.claim(&mut trunks, d.input, d.ingress, spine, d.egress);

                    let peers = by_egress[d.egress.0].iter().chain(&by_ingress[d.ingress.0]);
                    let viable = peers.filter(|&&j| j > depth).all(|&j| {
                        let p = demands[j];
                        trunks.has_candidate(p.input, p.ingress, p.egress)
                    });
                    if !viable {
                        trace!(depth, spine = spine.0, "前向检查失败");
                        self.trail.undo_to(&mut trunks, marks[depth]);
                        continue;
                    }

                    chosen.push(spine);
                    depth += 1;
                    if depth < total {
                        next[depth] = 0;
                        nodes += 1;
                    }
                }
                None => {
                    if depth == 0 {
                        self.trail.commit();
                        return (nodes, None);
                    }
                    depth -= 1;
                    chosen.pop();
                    self.trail.undo_to(&mut trunks, marks[depth]);
                }
            }
        }
    }
}

impl Resolver for RepackSolver {
    fn name(&self) -> &'static str {
        "repack"
    }

    #[tracing::instrument(skip_all, fields(solver = "repack"))]
    fn resolve(&mut self, state: &mut AllocationState, _delta: &Delta) -> Attempt {
        let topo = *state.topology();
        let demands = build_demands(state);
        let report = UnsatReport::from_demands(&topo, &demands);
        if report.overloaded() {
            warn!(%report, "❌ 超出 Clos 链路容量，无需搜索即可判定无解");
            return Attempt {
                nodes: 0,
                outcome: Outcome::Infeasible(report),
            };
        }

        let (nodes, found) = self.search(&topo, &demands);
        let Some((trunks, spines)) = found else {
            warn!(nodes, %report, "❌ 回溯搜索穷尽，无可行分配");
            return Attempt {
                nodes,
                outcome: Outcome::Infeasible(report),
            };
        };

        let branch: BTreeMap<(InputId, EgressId), SpineId> = demands
            .iter()
            .zip(spines)
            .map(|(d, s)| ((d.input, d.egress), s))
            .collect();
        let bindings: Vec<_> = topo
            .ports()
            .filter_map(|port| {
                let input = state.desired_owner(port)?;
                let spine = branch.get(&(input, topo.egress_block_of(port)))?;
                Some((port, input, *spine))
            })
            .collect();
        state.install(trunks, &bindings);

        debug!(demands = demands.len(), nodes, "重排搜索完成");
        info!(
            branches = demands.len(),
            nodes,
            "✅ REPACK OK"
        );
        Attempt {
            nodes,
            outcome: Outcome::Settled,
        }
    }
}
