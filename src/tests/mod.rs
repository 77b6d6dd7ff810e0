//
// trailcp is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License  v3
// as published by the Free Software Foundation.
//
// mini-cp is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY.
// See the GNU Lesser General Public License  for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with mini-cp. If not, see http://www.gnu.org/licenses/lgpl-3.0.en.html
//
// Copyright (c)  2022 by X. Gillard
//

//! Scenarios that exercise the trail, the domains, the monitors and the
//! engine together.

use crate::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn snapshots(cp: &DefaultCpModel) -> Vec<DomainSnapshot> {
    (0..cp.nb_vars()).map(|v| cp.snapshot(Variable(v))).collect()
}

/// A model with one graph of `n` nodes channeled to `n` successor sets
fn channeled(n: usize) -> (DefaultCpModel, GraphVar, Vec<SetVar>, PropagatorId) {
    let mut cp = DefaultCpModel::default();
    let graph = cp.new_graph_var(n);
    let sets = (0..n).map(|_| cp.new_set_var(n)).collect::<Vec<_>>();
    let p = cp.post(Box::new(GraphChannel::new(graph, sets.clone())));
    (cp, graph, sets, p)
}

#[test]
fn rollback_restores_every_domain_exactly() {
    init();
    let (mut cp, graph, sets, _) = channeled(3);
    let x = cp.new_int_var(-2, 5);
    cp.fixpoint().unwrap();

    let root = snapshots(&cp);
    let outer = cp.checkpoint();

    cp.remove(x, 0, Cause::Decision).unwrap();
    cp.enforce_arc(graph, 0, 2, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    let middle = snapshots(&cp);

    let inner = cp.checkpoint();
    cp.remove_below(x, 3, Cause::Decision).unwrap();
    cp.remove_from_envelope(sets[1], 0, Cause::Decision).unwrap();
    cp.remove_node(graph, 1, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    assert_ne!(middle, snapshots(&cp));

    cp.rollback(inner);
    assert_eq!(middle, snapshots(&cp));
    cp.rollback(outer);
    assert_eq!(root, snapshots(&cp));
    assert_eq!(0, cp.depth());
}

#[test]
fn variables_created_after_a_checkpoint_disappear_on_rollback() {
    init();
    let mut cp = DefaultCpModel::default();
    let _ = cp.new_set_var(4);
    let mark = cp.checkpoint();
    let _ = cp.new_graph_var(2);
    let _ = cp.new_int_var(0, 3);
    assert_eq!(3, cp.nb_vars());

    cp.rollback(mark);
    assert_eq!(1, cp.nb_vars());

    // the slots are reused
    let g = cp.new_graph_var(2);
    assert_eq!(1, Variable::from(g).id());
    assert_eq!(2, cp.nb_nodes(g));
}

#[test]
fn narrowing_is_monotonic() {
    init();
    let mut cp = DefaultCpModel::default();
    let s = cp.new_set_var(5);
    let g = cp.new_graph_var(3);

    let mut kernel = cp.kernel_values(s);
    let mut envelope = cp.envelope_values(s);
    let ops: [(bool, usize); 6] = [(true, 1), (false, 4), (true, 3), (false, 0), (true, 1), (false, 4)];
    for (enforce, v) in ops {
        if enforce {
            cp.add_to_kernel(s, v, Cause::Decision).unwrap();
        } else {
            cp.remove_from_envelope(s, v, Cause::Decision).unwrap();
        }
        let k = cp.kernel_values(s);
        let e = cp.envelope_values(s);
        assert!(kernel.iter().all(|v| k.contains(v)));
        assert!(e.iter().all(|v| envelope.contains(v)));
        kernel = k;
        envelope = e;
    }

    // a failed narrowing changes nothing
    let before = cp.snapshot(s.into());
    assert!(cp.add_to_kernel(s, 4, Cause::Decision).is_err());
    assert!(cp.remove_from_envelope(s, 3, Cause::Decision).is_err());
    assert_eq!(before, cp.snapshot(s.into()));

    let before = cp.snapshot(g.into());
    cp.enforce_arc(g, 0, 1, Cause::Decision).unwrap();
    assert!(cp.remove_node(g, 1, Cause::Decision).is_err());
    assert!(cp.remove_arc(g, 0, 1, Cause::Decision).is_err());
    assert_ne!(before, cp.snapshot(g.into()));
    assert!(cp.arc_in_kernel(g, 0, 1));
}

#[test]
fn the_kernel_always_is_a_subset_of_the_envelope() {
    init();
    let (mut cp, graph, sets, _) = channeled(4);
    cp.fixpoint().unwrap();

    let moves: [(usize, usize, bool); 5] = [(0, 1, true), (1, 1, false), (2, 3, true), (3, 0, false), (1, 2, true)];
    for (i, j, enforce) in moves {
        if enforce {
            cp.enforce_arc(graph, i, j, Cause::Decision).unwrap();
        } else {
            cp.remove_arc(graph, i, j, Cause::Decision).unwrap();
        }
        cp.fixpoint().unwrap();

        for set in sets.iter().copied() {
            let envelope = cp.envelope_values(set);
            assert!(cp.kernel_values(set).iter().all(|v| envelope.contains(v)));
            assert!(cp.kernel_size(set) <= cp.envelope_size(set));
        }
        let nodes = cp.envelope_nodes(graph);
        assert!(cp.kernel_nodes(graph).iter().all(|n| nodes.contains(n)));
        for i in 0..4 {
            let succs = cp.envelope_successors(graph, i);
            for j in cp.kernel_successors(graph, i) {
                assert!(succs.contains(&j));
                assert!(cp.node_in_kernel(graph, i));
                assert!(cp.node_in_kernel(graph, j));
            }
        }
    }
}

#[test]
fn the_delta_log_records_every_change_in_order() {
    init();
    let mut cp = DefaultCpModel::default();
    let s = cp.new_set_var(6);
    let observer = PropagatorId(0);
    let mut monitor = DeltaMonitor::new(s.into(), observer);

    cp.add_to_kernel(s, 4, Cause::Decision).unwrap();
    cp.remove_from_envelope(s, 1, Cause::Decision).unwrap();
    cp.add_to_kernel(s, 0, Cause::Decision).unwrap();
    cp.remove_from_envelope(s, 5, Cause::Decision).unwrap();
    // no-ops are not recorded
    cp.add_to_kernel(s, 4, Cause::Decision).unwrap();
    cp.remove_from_envelope(s, 1, Cause::Decision).unwrap();

    monitor.freeze(&cp);
    let mut forced = vec![];
    let mut removed = vec![];
    monitor
        .for_each_element(&mut cp, DomainEvent::AddToKernel, |_, v| {
            forced.push(v);
            Ok(())
        })
        .unwrap();
    monitor
        .for_each_element(&mut cp, DomainEvent::RemoveFromEnvelope, |_, v| {
            removed.push(v);
            Ok(())
        })
        .unwrap();
    monitor.unfreeze();

    assert_eq!(vec![4, 0], forced);
    assert_eq!(vec![1, 5], removed);

    // draining again yields nothing new
    monitor.freeze(&cp);
    let mut count = 0;
    monitor
        .for_each_element(&mut cp, DomainEvent::AddToKernel, |_, _| {
            count += 1;
            Ok(())
        })
        .unwrap();
    monitor.unfreeze();
    assert_eq!(0, count);
}

#[test]
fn a_second_sweep_changes_nothing() {
    init();
    let (mut cp, graph, sets, p) = channeled(4);
    cp.add_to_kernel(sets[3], 0, Cause::Decision).unwrap();
    cp.remove_from_envelope(sets[0], 2, Cause::Decision).unwrap();
    cp.enforce_arc(graph, 1, 1, Cause::Decision).unwrap();
    cp.remove_arc(graph, 2, 3, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    let reached = snapshots(&cp);

    // a complete filtering is scheduled again by enabling the propagator
    cp.disable(p);
    cp.enable(p);
    assert_eq!(PropagatorState::Scheduled, cp.state(p));
    cp.fixpoint().unwrap();
    assert_eq!(reached, snapshots(&cp));
    assert_eq!(PropagatorState::Idle, cp.state(p));
}

#[test]
fn graph_and_sets_stay_channeled_until_instantiation() {
    init();
    let (mut cp, graph, sets, p) = channeled(3);
    assert!(cp.fixpoint().is_ok());
    assert_eq!(Entailment::Undefined, cp.is_entailed(p));

    cp.enforce_arc(graph, 0, 1, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    assert!(cp.kernel_contains(sets[0], 1));

    cp.remove_from_envelope(sets[1], 2, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    assert!(!cp.arc_in_envelope(graph, 1, 2));

    // decide everything that is left on the set side
    for i in 0..3 {
        for j in cp.envelope_values(sets[i]) {
            if cp.kernel_contains(sets[i], j) {
                continue;
            }
            if (i + j) % 2 == 0 {
                cp.add_to_kernel(sets[i], j, Cause::Decision).unwrap();
            } else {
                cp.remove_from_envelope(sets[i], j, Cause::Decision).unwrap();
            }
            cp.fixpoint().unwrap();
        }
    }
    for i in 0..3 {
        assert_eq!(cp.kernel_values(sets[i]), cp.kernel_successors(graph, i));
        assert_eq!(cp.envelope_values(sets[i]), cp.envelope_successors(graph, i));
    }
    // the nodes without forced arcs are still undecided
    for node in cp.envelope_nodes(graph) {
        if !cp.node_in_kernel(graph, node) {
            cp.remove_node(graph, node, Cause::Decision).unwrap();
        }
    }
    cp.fixpoint().unwrap();
    assert!(cp.is_instantiated(graph.into()));
    assert_eq!(Entailment::True, cp.is_entailed(p));
}

#[test]
fn a_contradiction_is_undone_by_the_rollback() {
    init();
    let (mut cp, graph, sets, p) = channeled(3);
    cp.fixpoint().unwrap();

    let mark = cp.checkpoint();
    cp.remove_from_envelope(sets[0], 1, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    assert!(!cp.arc_in_envelope(graph, 0, 1));

    let err = cp.enforce_arc(graph, 0, 1, Cause::Decision).unwrap_err();
    assert_eq!(Some(Variable::from(graph)), err.variable);
    assert_eq!(Cause::Decision, err.cause);

    cp.rollback(mark);
    assert!(cp.is_active(p));
    assert!(cp.enforce_arc(graph, 0, 1, Cause::Decision).is_ok());
    assert!(cp.fixpoint().is_ok());
    assert!(cp.kernel_contains(sets[0], 1));
}

#[test]
fn a_contradiction_found_by_a_propagator_names_it() {
    init();
    let (mut cp, graph, sets, p) = channeled(2);
    cp.fixpoint().unwrap();

    let mark = cp.checkpoint();
    cp.add_to_kernel(sets[1], 0, Cause::Decision).unwrap();
    cp.remove_node(graph, 0, Cause::Decision).unwrap();
    let err = cp.fixpoint().unwrap_err();
    assert_eq!(Cause::Propagator(p), err.cause);
    assert_eq!(PropagatorState::Idle, cp.state(p));

    cp.rollback(mark);
    assert!(cp.fixpoint().is_ok());
    assert_eq!(vec![0, 1], cp.envelope_nodes(graph));
}

#[test]
fn channel_and_not_equal_live_together() {
    init();
    let mut cp = DefaultCpModel::default();
    let x = cp.new_int_var(0, 2);
    let y = cp.new_int_var(0, 2);
    cp.post(Box::new(NotEqualVar::new(x, y)));
    let graph = cp.new_graph_var(3);
    let sets = (0..3).map(|_| cp.new_set_var(3)).collect::<Vec<_>>();
    cp.post(Box::new(GraphChannel::new(graph, sets.clone())));
    assert_eq!(2, cp.nb_propagators());
    cp.fixpoint().unwrap();

    let mark = cp.checkpoint();
    cp.fix(x, 1, Cause::Decision).unwrap();
    cp.enforce_arc(graph, 2, 0, Cause::Decision).unwrap();
    cp.fixpoint().unwrap();
    assert!(!cp.contains(y, 1));
    assert!(cp.kernel_contains(sets[2], 0));

    cp.rollback(mark);
    assert!(cp.contains(y, 1));
    assert!(!cp.kernel_contains(sets[2], 0));
}

#[test]
fn a_propagator_posted_before_the_checkpoint_still_runs_after_the_rollback() {
    init();
    let mut cp = DefaultCpModel::default();
    let graph = cp.new_graph_var(3);
    let sets = (0..3).map(|_| cp.new_set_var(3)).collect::<Vec<_>>();
    cp.add_to_kernel(sets[0], 1, Cause::Decision).unwrap();
    let p = cp.post(Box::new(GraphChannel::new(graph, sets.clone())));

    let mark = cp.checkpoint();
    cp.rollback(mark);
    assert_eq!(PropagatorState::Scheduled, cp.state(p));
    assert!(cp.fixpoint().is_ok());
    assert!(cp.arc_in_kernel(graph, 0, 1));
}

#[test]
fn a_decision_made_before_the_checkpoint_is_propagated_after_the_rollback() {
    init();
    let (mut cp, graph, sets, _) = channeled(3);
    cp.fixpoint().unwrap();

    cp.add_to_kernel(sets[0], 2, Cause::Decision).unwrap();
    let mark = cp.checkpoint();
    cp.rollback(mark);
    assert!(cp.fixpoint().is_ok());
    assert_eq!(vec![2], cp.kernel_values(sets[0]));
    assert!(cp.arc_in_kernel(graph, 0, 2));
}
