//! 文本报告
//!
//! spine→egress 占用热力图、输出端口选择列表与 fabric 汇总，供 CLI 的 `--summary` 使用。

use std::fmt::Write;

use crate::fabric::{AllocationState, FabricStats, Trunk};

/// 端口列表最多展示的行数
const PORT_MAP_LIMIT: usize = 40;

pub fn render_heatmap(state: &AllocationState) -> String {
    let topo = state.topology();
    let mut out = String::new();
    let _ = writeln!(out, "--- SPINE-TO-EGRESS UTILIZATION HEATMAP (s2_to_s3) ---");
    let _ = write!(out, "       ");
    for spine in topo.spines() {
        let _ = write!(out, " S{:02}", spine.0 + 1);
    }
    out.push('\n');
    for egress in topo.egress_blocks() {
        let _ = write!(out, "Egr {:2}:", egress.0 + 1);
        for spine in topo.spines() {
            match state.trunks().owner(Trunk::Egress(spine, egress)) {
                Some(input) => {
                    let _ = write!(out, " [{:02}]", input.0);
                }
                None => out.push_str(" [  ]"),
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_port_map(state: &AllocationState) -> String {
    let topo = state.topology();
    let mut out = String::new();
    let _ = writeln!(out, "--- OUTPUT PORT SELECTIONS (Stage3) ---");

    let owned: Vec<_> = topo
        .ports()
        .filter_map(|p| Some((p, state.port_owner(p)?, state.port_spine(p)?)))
        .collect();
    if owned.is_empty() {
        let _ = writeln!(out, "(none)");
        return out;
    }
    for &(port, input, spine) in owned.iter().take(PORT_MAP_LIMIT) {
        let _ = writeln!(
            out,
            "Out {:3} -> Input {:3} via Spine {:2} (EgrBlock {:2})",
            port.0,
            input.0,
            spine.0 + 1,
            topo.egress_block_of(port).0 + 1
        );
    }
    if owned.len() > PORT_MAP_LIMIT {
        let _ = writeln!(out, "... ({} more)", owned.len() - PORT_MAP_LIMIT);
    }
    out
}

pub fn render_summary(stats: &FabricStats, n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Fabric Summary ===");
    let _ = writeln!(out, "Routes: {} active", stats.routes_active);
    let _ = writeln!(out);
    let _ = writeln!(out, "Multicast:");
    let _ = writeln!(out, "  Inputs with mult fanout: {} (inputs using 2+ outputs)", stats.inputs_with_mult);
    let _ = writeln!(out, "  Inputs using 2+ spines: {} (branching in middle layer)", stats.inputs_multi_spine);
    let _ = writeln!(out, "  Egress blocks with 2+ inputs: {} (mult in egress)", stats.egress_with_mult);
    let _ = writeln!(out);
    let _ = writeln!(out, "Capacity:");
    if stats.max_egress_load > 0 {
        let _ = writeln!(
            out,
            "  Most loaded egress block: {}/{n} inputs (block {})",
            stats.max_egress_load, stats.max_egress_block
        );
    } else {
        let _ = writeln!(out, "  Most loaded egress block: 0/{n} inputs");
    }
    let _ = writeln!(out, "  Active spines: {}/{n}", stats.active_spines);
    let _ = writeln!(out, "  Total branches: {}", stats.total_branches);
    out
}
