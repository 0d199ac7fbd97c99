use std::io::Cursor;

use super::{apply_all, router};
use crate::RouterError;
use crate::cmd::Command;
use crate::fabric::{InputId, PortId};
use crate::router::{ConflictPolicy, Router, RouterConfig};

/// Checks the capacity and ownership properties on a settled state.
fn assert_settled(r: &Router) {
    let state = r.state();
    let topo = *state.topology();
    assert_eq!(state.validate(), Ok(()));
    for port in topo.ports() {
        assert_eq!(state.port_owner(port), state.desired_owner(port));
        assert_eq!(state.port_owner(port).is_some(), state.port_spine(port).is_some());
    }
}

/// Small deterministic generator for command streams.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn next_command(rng: &mut Lcg, r: &Router) -> Command {
    let topo = *r.state().topology();
    let n = topo.n() as u64;
    let input = InputId(rng.next(n * n) as u32 + 1);
    if rng.next(10) < 7 {
        let block = crate::fabric::EgressId(rng.next(n) as usize);
        let free: Vec<PortId> = topo
            .egress_ports(block)
            .filter(|&p| r.state().desired_owner(p).is_none())
            .collect();
        if !free.is_empty() {
            let take = 1 + rng.next(2) as usize;
            let start = rng.next(free.len() as u64) as usize;
            let outputs = free.iter().cycle().skip(start).take(take.min(free.len())).copied().collect();
            return Command::Route { input, outputs };
        }
    }
    Command::Clear { input }
}

#[test]
fn scenario_route_route_clear_route() {
    for incremental in [false, true] {
        let mut r = router(2, incremental);
        for line in ["1.1.2", "3.3.4", "!1", "2.1.2"] {
            r.apply_line(1, line).expect("command succeeds");
            assert_settled(&r);
        }

        let snap = r.snapshot();
        assert_eq!(snap.s1_to_s2, vec![vec![2, 0], vec![3, 0]]);
        assert_eq!(snap.s2_to_s3, vec![vec![2, 3], vec![0, 0]]);
        assert_eq!(snap.s3_port_owner, vec![0, 2, 2, 3, 3]);
        assert_eq!(snap.s3_port_spine, vec![-1, 0, 0, 0, 0]);
        assert_eq!(snap.desired_owner, vec![0, 2, 2, 3, 3]);
        assert_eq!(snap.metrics.resolves(), 4);
        if incremental {
            assert_eq!(snap.metrics.repair_count, 4);
        } else {
            assert_eq!(snap.metrics.repack_count, 4);
            assert_eq!(snap.metrics.solve_nodes_total, 6);
        }
    }
}

#[test]
fn conflicting_route_is_rejected_without_side_effects() {
    let mut r = router(2, false);
    apply_all(&mut r, &["1.1.2"]);
    let before = r.snapshot().to_canonical_json().expect("serialize");

    let err = r.apply_line(2, "2.2").expect_err("port 2 belongs to input 1");
    match &err {
        RouterError::Conflict {
            port,
            owner,
            requested,
        } => {
            assert_eq!(*port, PortId(2));
            assert_eq!(*owner, InputId(1));
            assert_eq!(*requested, InputId(2));
        }
        other => panic!("expected conflict, got {other}"),
    }
    assert!(err.is_rejection());

    let after = r.snapshot().to_canonical_json().expect("serialize");
    assert_eq!(before, after);
}

#[test]
fn out_of_range_ids_are_rejected() {
    let mut r = router(2, false);
    for line in ["5.1", "1.5", "0.1", "!0", "!5"] {
        let err = r.apply_line(1, line).expect_err("out of range");
        assert!(matches!(err, RouterError::OutOfRange { .. }), "{line}: {err}");
    }
    assert_eq!(r.metrics().snapshot().resolves(), 0);
}

#[test]
fn every_valid_directive_is_one_resolve() {
    for incremental in [false, true] {
        let mut r = router(3, incremental);
        // No-op clear, re-route of an owned port, and a two-directive line all count.
        apply_all(&mut r, &["1.1.4", "!9", "1.1", "2.2, 3.3.9", "# comment", "!1"]);
        assert_eq!(r.metrics().snapshot().resolves(), 6);
        assert_settled(&r);
    }
}

#[test]
fn clear_releases_everything_for_reuse() {
    let mut r = router(3, false);
    apply_all(&mut r, &["1.1.4.7", "5.2.8", "!1"]);
    let snap = r.snapshot();
    assert!(snap.s1_to_s2.iter().flatten().all(|&o| o != 1));
    assert!(snap.s2_to_s3.iter().flatten().all(|&o| o != 1));
    assert!(snap.s3_port_owner.iter().all(|&o| o != 1));
    assert!(snap.desired_owner.iter().all(|&o| o != 1));

    apply_all(&mut r, &["2.1.4.7"]);
    assert_eq!(r.state().port_owner(PortId(7)), Some(InputId(2)));
    assert_settled(&r);
}

#[test]
fn infeasible_route_rolls_back_and_halts() {
    for incremental in [false, true] {
        let mut r = router(3, incremental);
        apply_all(&mut r, &["1.1", "2.4", "3.7", "5.3", "6.6"]);
        let before = r.snapshot();

        let err = r.apply_line(6, "4.2.5.8").expect_err("no spine left for input 4");
        assert!(matches!(err, RouterError::Infeasible(_)));
        assert!(!err.is_rejection());

        let after = r.snapshot();
        assert_eq!(
            before.canonical_state().expect("serialize"),
            after.canonical_state().expect("serialize")
        );
        assert_eq!(after.metrics.resolves(), 5);
        assert_settled(&r);
    }
}

#[test]
fn run_halts_on_first_rejected_line_by_default() {
    let mut r = router(2, false);
    let script = "1.1\n2.1\n3.3\n";
    let err = r.run(Cursor::new(script)).expect_err("conflict halts");
    assert!(matches!(err, RouterError::Conflict { .. }));
    assert_eq!(r.metrics().snapshot().resolves(), 1);
    assert_eq!(r.state().desired_owner(PortId(3)), None);
}

#[test]
fn run_skips_rejected_lines_when_configured() {
    let mut r = Router::new(RouterConfig {
        size: 2,
        incremental: true,
        conflict_policy: ConflictPolicy::Skip,
    });
    let script = "1.1\n2.1\nnot a command\n\n3.3\n";
    let summary = r.run(Cursor::new(script)).expect("skip policy continues");
    assert_eq!(summary.lines, 5);
    assert_eq!(summary.rejected, 3);
    assert_eq!(summary.resolves, 2);
    assert_eq!(r.state().port_owner(PortId(3)), Some(InputId(3)));
}

#[test]
fn parse_errors_carry_line_numbers() {
    let mut r = router(2, false);
    let err = r.run(Cursor::new("1.1\n1.x\n")).expect_err("parse error");
    match err {
        RouterError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn identical_streams_give_identical_snapshots() {
    let script = "1.1.5.9\n6.2.6\n11.13.14\n16.3.10.15\n!6\n7.2.6.16\n4.4.8\n!11\n12.11.12\n";
    for incremental in [false, true] {
        let mut a = router(4, incremental);
        let mut b = router(4, incremental);
        a.run(Cursor::new(script)).expect("run a");
        b.run(Cursor::new(script)).expect("run b");
        assert_eq!(
            a.snapshot().to_canonical_json().expect("serialize"),
            b.snapshot().to_canonical_json().expect("serialize")
        );
    }
}

#[test]
fn incremental_mode_settles_whenever_full_repack_does() {
    let mut full = router(4, false);
    let mut inc = router(4, true);
    let mut rng = Lcg(7);

    for step in 0..300 {
        let cmd = next_command(&mut rng, &full);
        let a = full.apply(&cmd);
        let b = inc.apply(&cmd);
        assert_eq!(a.is_ok(), b.is_ok(), "step {step} `{cmd}`: {a:?} vs {b:?}");
        if let Err(e) = &a {
            assert!(matches!(e, RouterError::Infeasible(_)), "step {step}: {e}");
        }
        assert_eq!(
            full.state().desired_owner_raw(),
            inc.state().desired_owner_raw(),
            "step {step}"
        );
        assert_settled(&full);
        assert_settled(&inc);
    }

    let m = inc.metrics().snapshot();
    assert!(m.repair_count > 0);
    assert_eq!(m.resolves(), full.metrics().snapshot().resolves());
}
