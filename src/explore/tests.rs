// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::{
    Completion, DeepDiveTicket, ExpansionState, ExplorationTree, NodePath, ToggleOutcome, TreeError,
};
use crate::generate::{DeepDiveProvider, DemoBackend, GenerationError};
use crate::model::fixtures::{deep_dive_result, dns_result, DNS_TOPIC};
use crate::model::{Persona, TopicResult};

fn path(orders: &[u32]) -> NodePath {
    NodePath::from_orders(orders)
}

fn sub_plan(ticket: &DeepDiveTicket) -> TopicResult {
    let request = ticket.request();
    deep_dive_result(request.step_title(), request.enclosing_topic()).expect("fixture")
}

fn expect_ticket(outcome: ToggleOutcome) -> DeepDiveTicket {
    match outcome {
        ToggleOutcome::FetchStarted(ticket) => ticket,
        other => panic!("expected a fetch, got {other:?}"),
    }
}

#[fixture]
fn tree() -> ExplorationTree {
    let provider: Arc<dyn DeepDiveProvider> = Arc::new(DemoBackend::new());
    let mut tree = ExplorationTree::new(Some(provider), Persona::Neutral);
    tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));
    tree
}

#[rstest]
fn root_steps_become_top_level_nodes(tree: ExplorationTree) {
    let listed = tree
        .visible_nodes()
        .map(|visible| (visible.path.to_string(), visible.depth(), visible.node.enclosing_topic().to_owned()))
        .collect::<Vec<_>>();
    assert_eq!(
        listed,
        [1, 2, 3].map(|order| (order.to_string(), 0, DNS_TOPIC.to_owned())).to_vec()
    );
    assert!(tree.visible_nodes().all(|visible| visible.node.expansion() == ExpansionState::Collapsed));
}

#[rstest]
fn deep_dive_fetches_once_and_reuses_the_cache(mut tree: ExplorationTree) {
    let resolver = path(&[3]);
    let ticket = expect_ticket(tree.toggle_expansion(&resolver).expect("toggle"));
    assert_eq!(ticket.request().step_title(), "DNS Резолвер");
    assert_eq!(ticket.request().enclosing_topic(), DNS_TOPIC);
    assert_eq!(tree.node(&resolver).expect("node").expansion(), ExpansionState::Loading);

    assert!(matches!(tree.toggle_expansion(&resolver), Ok(ToggleOutcome::Ignored)));

    let child = sub_plan(&ticket);
    assert_eq!(tree.complete_deep_dive(ticket.resolve(Ok(child))), Completion::Expanded);
    assert_eq!(tree.node(&resolver).expect("node").expansion(), ExpansionState::Expanded);
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.node(&path(&[3, 2])).expect("child").enclosing_topic(), "DNS Резолвер");

    assert!(matches!(tree.toggle_expansion(&resolver), Ok(ToggleOutcome::Collapsed)));
    assert_eq!(tree.len(), 3, "descendants discarded");
    assert!(tree.node(&resolver).expect("node").cached_child().is_some(), "cache retained");

    assert!(matches!(tree.toggle_expansion(&resolver), Ok(ToggleOutcome::Expanded)));
    assert_eq!(tree.len(), 6);
    assert!(tree.is_consistent());
}

#[tokio::test]
async fn fetch_runs_the_provider() {
    let backend = Arc::new(DemoBackend::new());
    let provider: Arc<dyn DeepDiveProvider> = backend.clone();
    let mut tree = ExplorationTree::new(Some(provider), Persona::Engineer);
    tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));

    let resolver = path(&[3]);
    for _ in 0..3 {
        match tree.toggle_expansion(&resolver).expect("toggle") {
            ToggleOutcome::FetchStarted(ticket) => {
                let fetched = ticket.fetch().await;
                assert_eq!(tree.complete_deep_dive(fetched), Completion::Expanded);
            }
            ToggleOutcome::Collapsed | ToggleOutcome::Expanded => {}
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(backend.calls(), 1);
    assert_eq!(tree.node(&resolver).expect("node").expansion(), ExpansionState::Expanded);
}

#[rstest]
fn failure_collapses_and_allows_retry(mut tree: ExplorationTree) {
    let first = path(&[1]);
    let ticket = expect_ticket(tree.toggle_expansion(&first).expect("toggle"));
    let err = GenerationError::Timeout(std::time::Duration::from_secs(60));

    assert_eq!(tree.complete_deep_dive(ticket.resolve(Err(err.clone()))), Completion::Failed(err));
    let node = tree.node(&first).expect("node");
    assert_eq!(node.expansion(), ExpansionState::Collapsed);
    assert!(node.cached_child().is_none());
    assert_eq!(tree.len(), 3, "siblings untouched");

    expect_ticket(tree.toggle_expansion(&first).expect("retry"));
}

#[rstest]
fn results_for_torn_down_nodes_are_discarded(mut tree: ExplorationTree) {
    let parent = path(&[2]);
    let ticket = expect_ticket(tree.toggle_expansion(&parent).expect("toggle"));
    let child = sub_plan(&ticket);
    tree.complete_deep_dive(ticket.resolve(Ok(child)));

    let nested = path(&[2, 1]);
    let nested_ticket = expect_ticket(tree.toggle_expansion(&nested).expect("toggle nested"));
    tree.toggle_expansion(&parent).expect("collapse parent");
    tree.toggle_expansion(&parent).expect("re-expand parent");
    assert_eq!(tree.node(&nested).expect("fresh node").expansion(), ExpansionState::Collapsed);

    let late = sub_plan(&nested_ticket);
    assert_eq!(tree.complete_deep_dive(nested_ticket.resolve(Ok(late))), Completion::Discarded);
    assert_eq!(tree.node(&nested).expect("fresh node").expansion(), ExpansionState::Collapsed);
    assert!(tree.is_consistent());
}

#[rstest]
fn re_rooting_discards_outstanding_fetches(mut tree: ExplorationTree) {
    let ticket = expect_ticket(tree.toggle_expansion(&path(&[1])).expect("toggle"));
    let child = sub_plan(&ticket);

    tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));
    assert_eq!(tree.complete_deep_dive(ticket.resolve(Ok(child))), Completion::Discarded);
    assert_eq!(tree.node(&path(&[1])).expect("node").expansion(), ExpansionState::Collapsed);
}

#[rstest]
fn completion_is_independent_of_expansion(mut tree: ExplorationTree) {
    let first = path(&[1]);
    let _ticket = expect_ticket(tree.toggle_expansion(&first).expect("toggle"));

    assert!(tree.toggle_completed(&first).expect("complete"));
    assert!(tree.node(&first).expect("node").is_loading());
    assert!(!tree.toggle_completed(&first).expect("uncomplete"));
}

#[test]
fn without_a_provider_expansion_is_unavailable() {
    let mut tree = ExplorationTree::new(None, Persona::Neutral);
    tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));

    assert!(matches!(tree.toggle_expansion(&path(&[1])), Ok(ToggleOutcome::Unavailable)));
    assert_eq!(tree.node(&path(&[1])).expect("node").expansion(), ExpansionState::Collapsed);
}

#[rstest]
fn unknown_paths_are_errors(mut tree: ExplorationTree) {
    let missing = path(&[9, 1]);
    assert_eq!(tree.toggle_expansion(&missing).unwrap_err(), TreeError::UnknownPath { path: missing.clone() });
    assert!(tree.toggle_completed(&missing).is_err());
    assert_eq!(missing.to_string(), "9.1");
}

#[rstest]
fn visible_nodes_are_listed_in_pre_order(mut tree: ExplorationTree) {
    for target in [path(&[1]), path(&[1, 3])] {
        let ticket = expect_ticket(tree.toggle_expansion(&target).expect("toggle"));
        let child = sub_plan(&ticket);
        tree.complete_deep_dive(ticket.resolve(Ok(child)));
    }

    let listed = tree.visible_nodes().map(|visible| visible.path.to_string()).collect::<Vec<_>>();
    assert_eq!(
        listed,
        ["1", "1.1", "1.2", "1.3", "1.3.1", "1.3.2", "1.3.3", "2", "3"].map(str::to_owned).to_vec()
    );
    let depths = tree.visible_nodes().map(|visible| visible.depth()).max();
    assert_eq!(depths, Some(2));
}

#[derive(Debug, Clone)]
enum Op {
    Toggle(usize),
    Resolve { pending: usize, succeed: bool },
    Complete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..32).prop_map(Op::Toggle),
        3 => ((0usize..8), any::<bool>()).prop_map(|(pending, succeed)| Op::Resolve { pending, succeed }),
        1 => (0usize..32).prop_map(Op::Complete),
    ]
}

proptest! {
    #[test]
    fn random_interactions_keep_the_tree_consistent(ops in prop::collection::vec(op(), 0..60)) {
        let provider: Arc<dyn DeepDiveProvider> = Arc::new(DemoBackend::new());
        let mut tree = ExplorationTree::new(Some(provider), Persona::Neutral);
        tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));

        let mut pending = Vec::<DeepDiveTicket>::new();

        for op in ops {
            let visible = tree.visible_nodes().map(|v| v.path.clone()).collect::<Vec<_>>();
            match op {
                Op::Toggle(idx) => {
                    let target = &visible[idx % visible.len()];
                    if let ToggleOutcome::FetchStarted(ticket) = tree.toggle_expansion(target).expect("visible") {
                        prop_assert!(pending.iter().all(|other| other.key() != ticket.key()), "one fetch per node");
                        pending.push(ticket);
                    }
                }
                Op::Resolve { pending: idx, succeed } if !pending.is_empty() => {
                    let ticket = pending.remove(idx % pending.len());
                    let outcome = if succeed {
                        Ok(sub_plan(&ticket))
                    } else {
                        Err(GenerationError::Transport("offline".to_owned()))
                    };
                    tree.complete_deep_dive(ticket.resolve(outcome));
                }
                Op::Resolve { .. } => {}
                Op::Complete(idx) => {
                    let target = &visible[idx % visible.len()];
                    tree.toggle_completed(target).expect("visible");
                }
            }

            prop_assert!(tree.is_consistent());
            for visible in tree.visible_nodes() {
                let node = visible.node;
                prop_assert!(node.expansion() != ExpansionState::Expanded || node.cached_child().is_some());
            }
        }
    }

    #[test]
    fn cached_nodes_never_fetch_again(toggles in 1usize..20) {
        let provider: Arc<dyn DeepDiveProvider> = Arc::new(DemoBackend::new());
        let mut tree = ExplorationTree::new(Some(provider), Persona::Neutral);
        tree.set_root(Some(Arc::new(dns_result().expect("fixture"))));
        let target = NodePath::root(2);

        let mut fetches = 0;
        for _ in 0..toggles {
            if let ToggleOutcome::FetchStarted(ticket) = tree.toggle_expansion(&target).expect("toggle") {
                fetches += 1;
                let child = sub_plan(&ticket);
                tree.complete_deep_dive(ticket.resolve(Ok(child)));
            }
        }
        prop_assert_eq!(fetches, 1);
    }
}
