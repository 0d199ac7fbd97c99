//! 命令处理
//!
//! `Router` 拥有分配状态与计数器，按顺序应用每条指令：先更新期望状态，再（增量模式下）
//! 尝试局部修复，失败时回退到全局重排。每条指令是一个事务：被拒绝或无解时期望状态
//! 回滚，实现状态保持上一条指令结束时的样子。

use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cmd::{Command, parse_line};
use crate::error::{Result, RouterError};
use crate::fabric::{AllocationState, InputId, Metrics, PortId};
use crate::snapshot::StateSnapshot;
use crate::solver::{Delta, Outcome, RepackSolver, RepairEngine, Resolver, UnsatReport, build_demands};
use crate::topo::clos::{ClosOpts, build_clos};

/// 被拒绝的行（解析错误、越界、冲突）如何处理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// 停止整个命令流
    #[default]
    Halt,
    /// 记录后跳过该行，继续后续命令
    Skip,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Clos 规模 N
    pub size: usize,
    /// 每条指令先尝试增量修复
    pub incremental: bool,
    pub conflict_policy: ConflictPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            size: ClosOpts::default().n,
            incremental: false,
            conflict_policy: ConflictPolicy::Halt,
        }
    }
}

/// 一次 `run` 的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines: usize,
    /// 成功完成 resolve 的指令数
    pub resolves: u64,
    /// 被跳过的行数（仅 `ConflictPolicy::Skip`）
    pub rejected: u64,
}

pub struct Router {
    config: RouterConfig,
    state: AllocationState,
    metrics: Arc<Metrics>,
    repair: RepairEngine,
    repack: RepackSolver,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        let topo = build_clos(&ClosOpts { n: config.size });
        Self {
            state: AllocationState::new(topo),
            metrics: Arc::new(Metrics::default()),
            repair: RepairEngine::default(),
            repack: RepackSolver::default(),
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    /// 计数器句柄，可交给后台进度线程
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.state, &self.metrics.snapshot())
    }

    /// 应用一条指令（一次 resolve）
    #[tracing::instrument(skip_all, fields(cmd = %cmd, input = cmd.input().0))]
    pub fn apply(&mut self, cmd: &Command) -> Result<()> {
        match cmd {
            Command::Route { input, outputs } => self.route(*input, outputs),
            Command::Clear { input } => self.clear(*input),
        }
    }

    /// 解析并应用一行，返回该行的指令数
    pub fn apply_line(&mut self, line_no: usize, line: &str) -> Result<usize> {
        let cmds = parse_line(line).map_err(|source| RouterError::Parse {
            line: line_no,
            source,
        })?;
        for cmd in &cmds {
            self.apply(cmd)?;
        }
        Ok(cmds.len())
    }

    /// 逐行处理命令流
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<RunSummary> {
        let before = self.metrics.snapshot().resolves();
        let mut summary = RunSummary::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            summary.lines += 1;
            match self.apply_line(line_no, &line) {
                Ok(_) => {}
                Err(e) if e.is_rejection() && self.config.conflict_policy == ConflictPolicy::Skip => {
                    warn!(line = line_no, error = %e, "⚠️ 跳过被拒绝的行");
                    summary.rejected += 1;
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "⛔ 命令流中止");
                    return Err(e);
                }
            }
        }

        summary.resolves = self.metrics.snapshot().resolves() - before;
        info!(
            lines = summary.lines,
            resolves = summary.resolves,
            rejected = summary.rejected,
            "✅ 命令流处理完成"
        );
        Ok(summary)
    }

    fn check_input(&self, input: InputId) -> Result<()> {
        let topo = self.state.topology();
        if topo.is_valid_input(input) {
            Ok(())
        } else {
            Err(RouterError::OutOfRange {
                what: "input",
                id: input.0,
                max: topo.max_port(),
            })
        }
    }

    fn check_port(&self, port: PortId) -> Result<()> {
        let topo = self.state.topology();
        if topo.is_valid_port(port) {
            Ok(())
        } else {
            Err(RouterError::OutOfRange {
                what: "output port",
                id: port.0,
                max: topo.max_port(),
            })
        }
    }

    fn route(&mut self, input: InputId, outputs: &[PortId]) -> Result<()> {
        self.check_input(input)?;
        for &port in outputs {
            self.check_port(port)?;
            if let Some(owner) = self.state.desired_owner(port) {
                if owner != input {
                    return Err(RouterError::Conflict {
                        port,
                        owner,
                        requested: input,
                    });
                }
            }
        }

        let mut added = Vec::new();
        for &port in outputs {
            if self.state.desired_owner(port) != Some(input) {
                self.state.set_desired(port, Some(input));
                added.push(port);
            }
        }
        info!(input = input.0, targets = outputs.len(), new = added.len(), ">> ROUTE");

        self.resolve_or_rollback(Delta::Route { input, added })
    }

    fn clear(&mut self, input: InputId) -> Result<()> {
        self.check_input(input)?;

        let released = self.state.desired_ports_of(input);
        for &port in &released {
            self.state.set_desired(port, None);
        }
        info!(input = input.0, released = released.len(), ">> CLEAR");

        self.resolve_or_rollback(Delta::Clear { input, released })
    }

    /// 无解时撤销本条指令对期望状态的修改（实现状态此时未被改动）
    fn resolve_or_rollback(&mut self, delta: Delta) -> Result<()> {
        let result = self.resolve(&delta);
        if matches!(result, Err(RouterError::Infeasible(_))) {
            match delta {
                Delta::Route { input, added } => {
                    for port in added {
                        self.state.set_desired(port, None);
                    }
                    warn!(input = input.0, "ROLLBACK: route could not be realized");
                }
                Delta::Clear { input, released } => {
                    for port in released {
                        self.state.set_desired(port, Some(input));
                    }
                    warn!(input = input.0, "ROLLBACK: unexpected failure after clear");
                }
            }
        }
        result
    }

    fn resolve(&mut self, delta: &Delta) -> Result<()> {
        if self.config.incremental {
            let attempt = self.repair.resolve(&mut self.state, delta);
            self.metrics.add_repair_nodes(attempt.nodes);
            if attempt.outcome == Outcome::Settled {
                self.metrics.record_repair();
                return self.settle(self.repair.name(), attempt.nodes);
            }
            debug!(nodes = attempt.nodes, "增量修复失败，回退到全局重排");
        }

        let attempt = self.repack.resolve(&mut self.state, delta);
        self.metrics.add_solve_nodes(attempt.nodes);
        match attempt.outcome {
            Outcome::Settled => {
                self.metrics.record_repack();
                self.settle(self.repack.name(), attempt.nodes)
            }
            Outcome::Infeasible(report) => Err(RouterError::Infeasible(report)),
            Outcome::Unresolved => {
                let report = UnsatReport::from_demands(self.state.topology(), &build_demands(&self.state));
                Err(RouterError::Infeasible(report))
            }
        }
    }

    fn settle(&self, solver: &'static str, nodes: u64) -> Result<()> {
        self.state.validate()?;
        debug!(solver, nodes, "状态已调和");
        Ok(())
    }
}
